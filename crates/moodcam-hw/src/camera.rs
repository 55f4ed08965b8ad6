//! Video capture via OpenCV `videoio`: camera index or video file.

use crate::frame::Frame;
use moodcam_core::capture::{FrameSource, SourceError, SourceSpec};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use std::path::Path;

/// An opened capture device or video file.
pub struct VideoSource {
    capture: VideoCapture,
    spec: SourceSpec,
    frames_read: u64,
    released: bool,
}

impl VideoSource {
    pub fn open(spec: &SourceSpec) -> Result<Self, SourceError> {
        let capture = match spec {
            SourceSpec::Device(index) => VideoCapture::new(*index, videoio::CAP_ANY),
            SourceSpec::File(path) => {
                let path_str = path.to_string_lossy();
                // Stream URLs go straight to the backend.
                if !path_str.contains("://") && !Path::new(path).exists() {
                    return Err(SourceError::Open(format!("{spec}: no such file")));
                }
                VideoCapture::from_file(&path_str, videoio::CAP_ANY)
            }
        }
        .map_err(|e| SourceError::Open(format!("{spec}: {e}")))?;

        let opened = capture
            .is_opened()
            .map_err(|e| SourceError::Open(format!("{spec}: {e}")))?;
        if !opened {
            return Err(SourceError::Open(spec.to_string()));
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0);
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0);
        let fps = capture.get(videoio::CAP_PROP_FPS).unwrap_or(0.0);
        tracing::info!(source = %spec, width, height, fps, "opened video source");

        Ok(Self {
            capture,
            spec: spec.clone(),
            frames_read: 0,
            released: false,
        })
    }
}

impl FrameSource for VideoSource {
    type Frame = Frame;

    fn read_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let mut mat = Mat::default();
        let grabbed = self
            .capture
            .read(&mut mat)
            .map_err(|e| SourceError::Read(e.to_string()))?;

        if !grabbed || mat.empty() {
            tracing::debug!(source = %self.spec, frames = self.frames_read, "end of stream");
            return Ok(None);
        }

        self.frames_read += 1;
        Ok(Some(Frame::new(mat)))
    }

    fn release(&mut self) -> Result<(), SourceError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.capture
            .release()
            .map_err(|e| SourceError::Release(e.to_string()))
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.capture.release();
        }
    }
}
