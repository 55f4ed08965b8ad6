//! Rolling per-emotion score history.

use crate::types::{Emotion, EmotionScores};
use serde::Serialize;
use std::collections::VecDeque;

/// Number of analyzed samples retained per label.
pub const HISTORY_WINDOW: usize = 30;

/// Fixed-capacity FIFO of recent scores, one sequence per [`Emotion`].
///
/// Every update appends to all seven sequences, so they always share the
/// same length (at most [`HISTORY_WINDOW`]).
#[derive(Debug, Clone)]
pub struct EmotionHistory {
    series: [VecDeque<f32>; Emotion::ALL.len()],
}

impl Default for EmotionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionHistory {
    pub fn new() -> Self {
        Self {
            series: std::array::from_fn(|_| VecDeque::with_capacity(HISTORY_WINDOW + 1)),
        }
    }

    /// Append one sample per label, using 0 for labels missing from `scores`,
    /// and evict the oldest sample once the window is exceeded.
    pub fn update(&mut self, scores: &EmotionScores) {
        for emotion in Emotion::ALL {
            let values = &mut self.series[emotion.index()];
            values.push_back(scores.get(emotion).unwrap_or(0.0));
            if values.len() > HISTORY_WINDOW {
                values.pop_front();
            }
        }
    }

    /// Samples for one label, oldest first.
    pub fn series(&self, emotion: Emotion) -> &VecDeque<f32> {
        &self.series[emotion.index()]
    }

    /// Number of samples currently held (identical for every label).
    pub fn len(&self) -> usize {
        self.series[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, &VecDeque<f32>)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.series(e)))
    }

    /// Largest value across all labels, or `None` when empty.
    pub fn peak(&self) -> Option<f32> {
        self.series
            .iter()
            .flatten()
            .copied()
            .fold(None, |acc: Option<f32>, v| Some(acc.map_or(v, |m| m.max(v))))
    }
}

impl Serialize for EmotionHistory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(Emotion::ALL.len()))?;
        for (emotion, values) in self.iter() {
            map.serialize_entry(emotion.as_str(), values)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(emotion: Emotion, value: f32) -> EmotionScores {
        [(emotion, value)].into_iter().collect()
    }

    #[test]
    fn test_missing_labels_default_to_zero() {
        let mut history = EmotionHistory::new();
        let scores: EmotionScores =
            [(Emotion::Happy, 87.5), (Emotion::Sad, 2.1)].into_iter().collect();
        history.update(&scores);

        assert_eq!(history.series(Emotion::Angry).iter().copied().collect::<Vec<_>>(), vec![0.0]);
        assert_eq!(history.series(Emotion::Happy)[0], 87.5);
        assert_eq!(history.series(Emotion::Sad)[0], 2.1);
    }

    #[test]
    fn test_length_is_min_of_updates_and_window() {
        let mut history = EmotionHistory::new();
        for n in 1..=75usize {
            let emotion = Emotion::ALL[n % Emotion::ALL.len()];
            history.update(&single(emotion, n as f32));
            for (_, values) in history.iter() {
                assert_eq!(values.len(), n.min(HISTORY_WINDOW));
            }
        }
    }

    #[test]
    fn test_fifo_keeps_most_recent_window() {
        let mut history = EmotionHistory::new();
        for n in 0..45 {
            history.update(&single(Emotion::Fear, n as f32));
        }

        let kept: Vec<f32> = history.series(Emotion::Fear).iter().copied().collect();
        let expected: Vec<f32> = (15..45).map(|n| n as f32).collect();
        assert_eq!(kept, expected);
        assert!(history.series(Emotion::Neutral).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_history() {
        let history = EmotionHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.peak(), None);
        assert_eq!(history.iter().count(), 7);
    }

    #[test]
    fn test_serializes_in_label_order() {
        let mut history = EmotionHistory::new();
        history.update(&single(Emotion::Happy, 50.0));
        let json = serde_json::to_string(&history).unwrap();
        assert!(json.starts_with(r#"{"angry":[0.0],"disgust":[0.0]"#), "{json}");
        assert!(json.contains(r#""happy":[50.0]"#));
        assert_eq!(history.peak(), Some(50.0));
    }
}
