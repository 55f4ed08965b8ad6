use moodcam_core::{AnalyzerConfig, DetectorBackend};
use std::path::PathBuf;

/// Model settings, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// SCRFD export file name inside `model_dir`.
    pub detector_model: String,
    /// Emotion classifier file name inside `model_dir`.
    pub emotion_model: String,
    /// ONNX Runtime intra-op threads per session.
    pub intra_threads: usize,
}

impl Config {
    /// Load configuration from `MOODCAM_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("MOODCAM_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| moodcam_core::default_model_dir());

        Self {
            model_dir,
            detector_model: std::env::var("MOODCAM_DETECTOR_MODEL")
                .unwrap_or_else(|_| "det_500m.onnx".to_string()),
            emotion_model: std::env::var("MOODCAM_EMOTION_MODEL")
                .unwrap_or_else(|_| "emotion.onnx".to_string()),
            intra_threads: env_usize("MOODCAM_INTRA_THREADS", 1).max(1),
        }
    }

    /// Replace the model directory when one was given on the command line.
    pub fn with_model_dir(mut self, model_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = model_dir {
            self.model_dir = dir;
        }
        self
    }

    pub fn analyzer_config(&self, backend: DetectorBackend, enforce_detection: bool) -> AnalyzerConfig {
        AnalyzerConfig {
            detector_model: self.model_dir.join(&self.detector_model),
            emotion_model: self.model_dir.join(&self.emotion_model),
            backend,
            enforce_detection,
            intra_threads: self.intra_threads,
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
