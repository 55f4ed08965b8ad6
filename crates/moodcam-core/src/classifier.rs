//! Fallible analyzer call → optional result.

use crate::analyzer::{AnalyzeError, EmotionAnalyzer, FailureKind};
use crate::frame::VideoFrame;
use crate::types::EmotionScores;
use serde::Serialize;

/// Dropped results, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureCounts {
    pub no_face: u64,
    pub invalid_frame: u64,
    pub model: u64,
}

impl FailureCounts {
    pub fn total(&self) -> u64 {
        self.no_face + self.invalid_frame + self.model
    }

    fn record(&mut self, kind: FailureKind) {
        match kind {
            FailureKind::NoFace => self.no_face += 1,
            FailureKind::InvalidFrame => self.invalid_frame += 1,
            FailureKind::Model => self.model += 1,
        }
    }
}

/// Wraps an [`EmotionAnalyzer`] so that every failure becomes `None`.
///
/// Callers cannot tell "no face" from a model error; the reason is only
/// logged at debug level and tallied in [`FrameClassifier::failures`].
pub struct FrameClassifier<A> {
    analyzer: A,
    failures: FailureCounts,
}

impl<A: EmotionAnalyzer> FrameClassifier<A> {
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            failures: FailureCounts::default(),
        }
    }

    pub fn classify<F: VideoFrame>(&mut self, frame: &F) -> Option<EmotionScores> {
        match self.try_classify(frame) {
            Ok(scores) => Some(scores),
            Err(e) => {
                tracing::debug!(error = %e, kind = ?e.kind(), "frame classification dropped");
                self.failures.record(e.kind());
                None
            }
        }
    }

    fn try_classify<F: VideoFrame>(&mut self, frame: &F) -> Result<EmotionScores, AnalyzeError> {
        let rgb = frame.to_rgb()?;
        self.analyzer.analyze(&rgb)
    }

    pub fn failures(&self) -> FailureCounts {
        self.failures
    }
}
