//! moodcam-core — Facial emotion analysis over a live video stream.
//!
//! Faces are located with SCRFD and classified by a 48×48 emotion model,
//! both via ONNX Runtime. Every third frame is analyzed; results feed a
//! 30-sample rolling history that is plotted when the session ends.

pub mod analyzer;
pub mod capture;
pub mod classifier;
pub mod detector;
pub mod fps;
pub mod frame;
pub mod history;
pub mod overlay;
pub mod plot;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use analyzer::{AnalyzeError, AnalyzerConfig, DetectorBackend, EmotionAnalyzer, FaceEmotionAnalyzer};
pub use capture::{CaptureError, CaptureLoop, SessionReport, SourceSpec};
pub use frame::{Color, FrameError, Point, VideoFrame};
pub use history::{EmotionHistory, HISTORY_WINDOW};
pub use plot::{HistoryPlotter, SummaryPlotter};
pub use types::{BoundingBox, Emotion, EmotionScores};

use std::path::PathBuf;

/// Default location of the ONNX models: `$XDG_DATA_HOME/moodcam/models`,
/// falling back to `~/.local/share/moodcam/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("moodcam")
        .join("models")
}
