//! BGR frame backed by an OpenCV `Mat`, drawn on with `imgproc`.

use image::RgbImage;
use moodcam_core::{Color, FrameError, Point, VideoFrame};
use opencv::core::{self, Mat, Scalar};
use opencv::imgproc;
use opencv::prelude::*;

const FONT_FACE: i32 = imgproc::FONT_HERSHEY_SIMPLEX;
const FONT_SCALE: f64 = 0.5;
const TEXT_THICKNESS: i32 = 1;

/// A captured 8-bit BGR frame.
pub struct Frame {
    mat: Mat,
}

impl Frame {
    pub fn new(mat: Mat) -> Self {
        Self { mat }
    }

    pub fn mat(&self) -> &Mat {
        &self.mat
    }
}

fn scalar(color: Color) -> Scalar {
    Scalar::new(color.b as f64, color.g as f64, color.r as f64, 0.0)
}

fn cv_point(p: Point) -> core::Point {
    core::Point::new(p.x, p.y)
}

fn draw_err(e: opencv::Error) -> FrameError {
    FrameError::Draw(e.to_string())
}

impl VideoFrame for Frame {
    fn width(&self) -> u32 {
        self.mat.cols().max(0) as u32
    }

    fn height(&self) -> u32 {
        self.mat.rows().max(0) as u32
    }

    fn to_rgb(&self) -> Result<RgbImage, FrameError> {
        if self.mat.empty() {
            return Err(FrameError::Invalid("empty frame".into()));
        }
        if self.mat.typ() != core::CV_8UC3 {
            return Err(FrameError::Invalid(format!("unsupported Mat type {}", self.mat.typ())));
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&self.mat, &mut rgb, imgproc::COLOR_BGR2RGB)
            .map_err(|e| FrameError::Invalid(format!("BGR→RGB conversion: {e}")))?;

        let data = rgb
            .data_bytes()
            .map_err(|e| FrameError::Invalid(format!("frame data: {e}")))?
            .to_vec();

        RgbImage::from_vec(self.width(), self.height(), data)
            .ok_or_else(|| FrameError::Invalid("pixel buffer size mismatch".into()))
    }

    fn fill_rect(&mut self, top_left: Point, bottom_right: Point, color: Color) -> Result<(), FrameError> {
        imgproc::rectangle_points(
            &mut self.mat,
            cv_point(top_left),
            cv_point(bottom_right),
            scalar(color),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .map_err(draw_err)
    }

    fn put_text(&mut self, text: &str, origin: Point, color: Color) -> Result<(), FrameError> {
        imgproc::put_text(
            &mut self.mat,
            text,
            cv_point(origin),
            FONT_FACE,
            FONT_SCALE,
            scalar(color),
            TEXT_THICKNESS,
            imgproc::LINE_8,
            false,
        )
        .map_err(draw_err)
    }
}
