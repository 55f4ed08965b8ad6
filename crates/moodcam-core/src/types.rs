use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Facial affect categories produced by the emotion model, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    /// Every label, in canonical order.
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }

    /// Position in [`Emotion::ALL`] (and in the model's output vector).
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-label confidence for one analyzed frame, as percentages in [0, 100].
///
/// Labels may be missing; iteration is always in canonical label order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmotionScores(BTreeMap<Emotion, f32>);

impl EmotionScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build scores from raw model outputs ordered like [`Emotion::ALL`].
    ///
    /// Values are rescaled so they sum to 100. Extra outputs are ignored; an
    /// all-zero (or non-finite) vector yields zeros rather than NaN.
    pub fn from_probabilities(probabilities: &[f32]) -> Self {
        let total: f32 = probabilities.iter().take(Emotion::ALL.len()).sum();
        let scale = if total.is_finite() && total > 0.0 {
            100.0 / total
        } else {
            0.0
        };

        Emotion::ALL
            .iter()
            .zip(probabilities)
            .map(|(&emotion, &p)| (emotion, p * scale))
            .collect()
    }

    pub fn insert(&mut self, emotion: Emotion, score: f32) -> Option<f32> {
        self.0.insert(emotion, score)
    }

    pub fn get(&self, emotion: Emotion) -> Option<f32> {
        self.0.get(&emotion).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        self.0.iter().map(|(&e, &s)| (e, s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label with the highest score, if any.
    pub fn dominant(&self) -> Option<(Emotion, f32)> {
        self.iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

impl FromIterator<(Emotion, f32)> for EmotionScores {
    fn from_iter<I: IntoIterator<Item = (Emotion, f32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Bounding box for a detected face, in frame pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection-over-Union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - inter;

        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }

    /// Integer pixel region `(x, y, width, height)` clamped to a `width × height` frame.
    ///
    /// Returns `None` when nothing of the box lies inside the frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.floor().clamp(0.0, width as f32) as u32;
        let y0 = self.y.floor().clamp(0.0, height as f32) as u32;
        let x1 = (self.x + self.width).ceil().clamp(0.0, width as f32) as u32;
        let y1 = (self.y + self.height).ceil().clamp(0.0, height as f32) as u32;

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bbox(x: f32, y: f32, w: f32, h: f32) -> BoundingBox {
        BoundingBox { x, y, width: w, height: h, confidence: 1.0 }
    }

    #[test]
    fn test_emotion_order_matches_index() {
        for (i, e) in Emotion::ALL.iter().enumerate() {
            assert_eq!(e.index(), i);
        }
        assert_eq!(Emotion::Surprise.to_string(), "surprise");
    }

    #[test]
    fn test_scores_iterate_in_label_order() {
        let mut scores = EmotionScores::new();
        scores.insert(Emotion::Neutral, 1.0);
        scores.insert(Emotion::Angry, 2.0);
        scores.insert(Emotion::Happy, 3.0);
        let labels: Vec<_> = scores.iter().map(|(e, _)| e).collect();
        assert_eq!(labels, vec![Emotion::Angry, Emotion::Happy, Emotion::Neutral]);
    }

    #[test]
    fn test_from_probabilities_scales_to_percent() {
        let scores = EmotionScores::from_probabilities(&[0.1, 0.0, 0.0, 0.6, 0.1, 0.0, 0.2]);
        assert_eq!(scores.len(), 7);
        assert!((scores.get(Emotion::Happy).unwrap() - 60.0).abs() < 1e-4);
        let total: f32 = scores.iter().map(|(_, s)| s).sum();
        assert!((total - 100.0).abs() < 1e-3);
        assert_eq!(scores.dominant().map(|(e, _)| e), Some(Emotion::Happy));
    }

    #[test]
    fn test_from_probabilities_all_zero() {
        let scores = EmotionScores::from_probabilities(&[0.0; 7]);
        assert!(scores.iter().all(|(_, s)| s == 0.0));
    }

    #[test]
    fn test_scores_serialize_as_label_map() {
        let scores: EmotionScores = [(Emotion::Happy, 87.5), (Emotion::Sad, 2.0)].into_iter().collect();
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"happy":87.5,"sad":2.0}"#);
    }

    #[test]
    fn test_iou_partial() {
        let a = make_bbox(0.0, 0.0, 10.0, 10.0);
        let b = make_bbox(5.0, 0.0, 10.0, 10.0);
        // Overlap: 5x10 = 50, union: 100+100-50 = 150
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert!(a.iou(&make_bbox(20.0, 20.0, 5.0, 5.0)).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_to_frame() {
        let b = make_bbox(-5.5, 10.2, 50.0, 500.0);
        assert_eq!(b.clamp_to(40, 100), Some((0, 10, 40, 90)));
        assert_eq!(make_bbox(200.0, 0.0, 10.0, 10.0).clamp_to(100, 100), None);
    }
}
