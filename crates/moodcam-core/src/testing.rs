//! In-memory frame used by unit tests.

use crate::frame::{Color, FrameError, Point, VideoFrame};
use image::{Rgb, RgbImage};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Rect(Point, Point),
    Text(String, Point),
}

/// RGB frame that records every draw call. Text is recorded, not rasterized.
#[derive(Debug, Clone)]
pub struct TestFrame {
    pub pixels: RgbImage,
    pub ops: Vec<DrawOp>,
    pub corrupt: bool,
}

impl TestFrame {
    /// A frame with a non-black gradient so fills are detectable.
    pub fn patterned(width: u32, height: u32) -> Self {
        let pixels = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 200) as u8 + 20, (y % 200) as u8 + 20, 128])
        });
        Self { pixels, ops: Vec::new(), corrupt: false }
    }

    /// A frame whose pixel data cannot be read back.
    pub fn corrupt(width: u32, height: u32) -> Self {
        Self { corrupt: true, ..Self::patterned(width, height) }
    }
}

impl VideoFrame for TestFrame {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn to_rgb(&self) -> Result<RgbImage, FrameError> {
        if self.corrupt {
            return Err(FrameError::Invalid("corrupt test frame".into()));
        }
        Ok(self.pixels.clone())
    }

    fn fill_rect(&mut self, top_left: Point, bottom_right: Point, color: Color) -> Result<(), FrameError> {
        self.ops.push(DrawOp::Rect(top_left, bottom_right));
        let max_x = bottom_right.x.min(self.pixels.width() as i32 - 1);
        let max_y = bottom_right.y.min(self.pixels.height() as i32 - 1);
        for y in top_left.y.max(0)..=max_y {
            for x in top_left.x.max(0)..=max_x {
                self.pixels.put_pixel(x as u32, y as u32, Rgb([color.r, color.g, color.b]));
            }
        }
        Ok(())
    }

    fn put_text(&mut self, text: &str, origin: Point, _color: Color) -> Result<(), FrameError> {
        self.ops.push(DrawOp::Text(text.to_string(), origin));
        Ok(())
    }
}
