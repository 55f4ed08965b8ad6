//! moodcam-hw — OpenCV-backed video capture and display.
//!
//! Provides the [`VideoBackend`] used by the capture loop: a `videoio`
//! source for camera indices and video files, and a `highgui` window.

pub mod camera;
pub mod frame;
pub mod window;

pub use camera::VideoSource;
pub use frame::Frame;
pub use window::Window;

use moodcam_core::capture::{DisplayError, SourceError, SourceSpec, VideoBackend};

/// Opens OpenCV capture sources and HighGUI windows.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvBackend;

impl VideoBackend for OpenCvBackend {
    type Source = VideoSource;
    type Sink = Window;

    fn open_source(&mut self, spec: &SourceSpec) -> Result<VideoSource, SourceError> {
        VideoSource::open(spec)
    }

    fn open_sink(&mut self, title: &str) -> Result<Window, DisplayError> {
        Window::open(title)
    }
}
