//! Face crop → emotion scores, via SCRFD and a 48×48 mini-Xception ONNX model.
//!
//! The emotion model takes a single grayscale face in NHWC layout
//! (`1×48×48×1`, pixels scaled to [0, 1]) and returns seven softmax
//! probabilities in [`Emotion::ALL`](crate::Emotion::ALL) order.

use crate::detector::{DetectorError, FaceDetector};
use crate::frame::FrameError;
use crate::types::EmotionScores;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const EMOTION_INPUT_SIZE: u32 = 48;
const EMOTION_CLASSES: usize = 7;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("emotion models are not loaded")]
    NotLoaded,
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("no face detected")]
    NoFaceDetected,
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("frame: {0}")]
    Frame(#[from] FrameError),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Coarse failure category, used for counting dropped results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NoFace,
    InvalidFrame,
    Model,
}

impl AnalyzeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AnalyzeError::NoFaceDetected => FailureKind::NoFace,
            AnalyzeError::InvalidFrame(_) | AnalyzeError::Frame(_) => FailureKind::InvalidFrame,
            AnalyzeError::ModelNotFound(_)
            | AnalyzeError::NotLoaded
            | AnalyzeError::InferenceFailed(_)
            | AnalyzeError::Detector(_)
            | AnalyzeError::Ort(_) => FailureKind::Model,
        }
    }
}

/// Something that turns an RGB frame into emotion scores.
pub trait EmotionAnalyzer {
    fn analyze(&mut self, frame: &RgbImage) -> Result<EmotionScores, AnalyzeError>;
}

/// An analyzer that failed to start rejects every frame.
impl<A: EmotionAnalyzer> EmotionAnalyzer for Option<A> {
    fn analyze(&mut self, frame: &RgbImage) -> Result<EmotionScores, AnalyzeError> {
        match self {
            Some(analyzer) => analyzer.analyze(frame),
            None => Err(AnalyzeError::NotLoaded),
        }
    }
}

/// How faces are located before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorBackend {
    /// SCRFD face detection; the best face is cropped.
    #[default]
    Scrfd,
    /// No detection; the whole frame is classified as one face.
    Skip,
}

impl FromStr for DetectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scrfd" => Ok(DetectorBackend::Scrfd),
            "skip" => Ok(DetectorBackend::Skip),
            other => Err(format!("unknown detector backend '{other}' (expected scrfd or skip)")),
        }
    }
}

/// Settings for [`FaceEmotionAnalyzer::load`].
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub detector_model: PathBuf,
    pub emotion_model: PathBuf,
    pub backend: DetectorBackend,
    /// When false, a frame with no detected face is classified as a whole.
    pub enforce_detection: bool,
    pub intra_threads: usize,
}

/// Emotion classifier over 48×48 grayscale faces.
pub struct EmotionModel {
    session: Session,
}

impl EmotionModel {
    pub fn load(model_path: &Path, intra_threads: usize) -> Result<Self, AnalyzeError> {
        if !model_path.exists() {
            return Err(AnalyzeError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = %model_path.display(),
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded emotion model"
        );

        Ok(Self { session })
    }

    /// Classify a face crop.
    pub fn predict(&mut self, face: &RgbImage) -> Result<EmotionScores, AnalyzeError> {
        let input = preprocess_face(face);

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, probabilities) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AnalyzeError::InferenceFailed(format!("emotion output: {e}")))?;

        if probabilities.len() < EMOTION_CLASSES {
            return Err(AnalyzeError::InferenceFailed(format!(
                "expected {EMOTION_CLASSES} emotion scores, got {}",
                probabilities.len()
            )));
        }

        Ok(EmotionScores::from_probabilities(&probabilities[..EMOTION_CLASSES]))
    }
}

/// Grayscale, resize to 48×48 and scale to [0, 1] in NHWC layout.
fn preprocess_face(face: &RgbImage) -> Array4<f32> {
    let gray = imageops::grayscale(face);
    let resized = imageops::resize(&gray, EMOTION_INPUT_SIZE, EMOTION_INPUT_SIZE, FilterType::Triangle);

    let size = EMOTION_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, size, size, 1));
    for (x, y, pixel) in resized.enumerate_pixels() {
        tensor[[0, y as usize, x as usize, 0]] = pixel[0] as f32 / 255.0;
    }
    tensor
}

/// Detector + emotion model, the production [`EmotionAnalyzer`].
pub struct FaceEmotionAnalyzer {
    detector: Option<FaceDetector>,
    model: EmotionModel,
    enforce_detection: bool,
}

impl FaceEmotionAnalyzer {
    /// Load both models up front so missing files fail at startup.
    pub fn load(config: &AnalyzerConfig) -> Result<Self, AnalyzeError> {
        let detector = match config.backend {
            DetectorBackend::Scrfd => Some(FaceDetector::load(
                &config.detector_model.to_string_lossy(),
                config.intra_threads,
            )?),
            DetectorBackend::Skip => None,
        };
        let model = EmotionModel::load(&config.emotion_model, config.intra_threads)?;

        Ok(Self {
            detector,
            model,
            enforce_detection: config.enforce_detection,
        })
    }
}

impl EmotionAnalyzer for FaceEmotionAnalyzer {
    fn analyze(&mut self, frame: &RgbImage) -> Result<EmotionScores, AnalyzeError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(AnalyzeError::InvalidFrame(format!("empty frame {width}x{height}")));
        }

        let Some(detector) = self.detector.as_mut() else {
            return self.model.predict(frame);
        };

        let region = detector
            .detect(frame)?
            .first()
            .and_then(|face| face.clamp_to(width, height));

        match region {
            Some((x, y, w, h)) => {
                tracing::trace!(x, y, w, h, "classifying face crop");
                let crop = imageops::crop_imm(frame, x, y, w, h).to_image();
                self.model.predict(&crop)
            }
            None if self.enforce_detection => Err(AnalyzeError::NoFaceDetected),
            None => {
                tracing::trace!("no face found, classifying whole frame");
                self.model.predict(frame)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_face_shape_and_range() {
        let face = RgbImage::from_pixel(120, 90, image::Rgb([255, 255, 255]));
        let tensor = preprocess_face(&face);
        assert_eq!(tensor.shape(), &[1, 48, 48, 1]);
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_preprocess_face_black() {
        let face = RgbImage::new(48, 48);
        let tensor = preprocess_face(&face);
        assert!(tensor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_detector_backend_parse() {
        assert_eq!("scrfd".parse::<DetectorBackend>(), Ok(DetectorBackend::Scrfd));
        assert_eq!("SKIP".parse::<DetectorBackend>(), Ok(DetectorBackend::Skip));
        assert!("haar".parse::<DetectorBackend>().is_err());
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(AnalyzeError::NoFaceDetected.kind(), FailureKind::NoFace);
        assert_eq!(AnalyzeError::InvalidFrame("x".into()).kind(), FailureKind::InvalidFrame);
        assert_eq!(AnalyzeError::InferenceFailed("x".into()).kind(), FailureKind::Model);
        assert_eq!(AnalyzeError::NotLoaded.kind(), FailureKind::Model);
    }

    #[test]
    fn test_absent_analyzer_rejects_frames() {
        let mut analyzer: Option<FaceEmotionAnalyzer> = None;
        let err = analyzer.analyze(&RgbImage::new(4, 4)).unwrap_err();
        assert!(matches!(err, AnalyzeError::NotLoaded));
    }

    #[test]
    fn test_load_missing_model() {
        let config = AnalyzerConfig {
            detector_model: PathBuf::from("/nonexistent/det_500m.onnx"),
            emotion_model: PathBuf::from("/nonexistent/emotion.onnx"),
            backend: DetectorBackend::Skip,
            enforce_detection: false,
            intra_threads: 1,
        };
        let err = FaceEmotionAnalyzer::load(&config).err().unwrap();
        assert!(matches!(err, AnalyzeError::ModelNotFound(_)), "{err}");
    }
}
