//! Drawing surface abstraction over a captured video frame.

use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("invalid frame: {0}")]
    Invalid(String),
    #[error("drawing failed: {0}")]
    Draw(String),
}

/// Pixel coordinate, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
}

/// A color frame owned by the capture loop for one iteration.
///
/// Backends decide the pixel layout; analysis always goes through
/// [`VideoFrame::to_rgb`].
pub trait VideoFrame {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Copy the frame out as packed RGB.
    fn to_rgb(&self) -> Result<RgbImage, FrameError>;

    /// Fill the axis-aligned rectangle spanning `top_left..=bottom_right`.
    fn fill_rect(&mut self, top_left: Point, bottom_right: Point, color: Color) -> Result<(), FrameError>;

    /// Draw one line of text with its baseline starting at `origin`.
    fn put_text(&mut self, text: &str, origin: Point, color: Color) -> Result<(), FrameError>;
}
