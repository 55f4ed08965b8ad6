//! End-of-session chart of the rolling emotion history.

use crate::history::EmotionHistory;
use chrono::{DateTime, Local, TimeZone};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CHART_SIZE: (u32, u32) = (1200, 600);
const CHART_TITLE: &str = "Emotion Analysis Over Time";
const X_LABEL: &str = "Frames";
const Y_LABEL: &str = "Confidence Score (%)";

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("failed to render {path}: {reason}")]
    Render { path: String, reason: String },
}

/// Consumes the final history when the capture loop closes.
pub trait SummaryPlotter {
    /// Render `history` and return the written file.
    fn save(&mut self, history: &EmotionHistory) -> Result<PathBuf, PlotError>;
}

/// `emotion_analysis_<YYYYMMDD_HHMMSS>.png` for the given instant.
pub fn plot_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("emotion_analysis_{}.png", at.format("%Y%m%d_%H%M%S"))
}

/// Line chart writer using the plotters bitmap backend.
#[derive(Debug, Clone)]
pub struct HistoryPlotter {
    output_dir: PathBuf,
}

impl HistoryPlotter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }
}

impl SummaryPlotter for HistoryPlotter {
    fn save(&mut self, history: &EmotionHistory) -> Result<PathBuf, PlotError> {
        let path = self.output_dir.join(plot_file_name(&Local::now()));

        if let Err(e) = draw_chart(&path, history, true) {
            tracing::warn!(error = %e, "labelled chart failed, retrying without text");
            draw_chart(&path, history, false).map_err(|e| PlotError::Render {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        tracing::info!(path = %path.display(), samples = history.len(), "saved emotion history plot");
        Ok(path)
    }
}

/// Draw one line per label. With `labelled` unset no text is rendered, so
/// the chart can still be written on hosts without usable fonts.
fn draw_chart(path: &Path, history: &EmotionHistory, labelled: bool) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = history.len().saturating_sub(1).max(1) as f32;
    let y_max = history.peak().unwrap_or(0.0).max(100.0);

    let mut builder = ChartBuilder::on(&root);
    builder.margin(20);
    if labelled {
        builder
            .caption(CHART_TITLE, ("sans-serif", 28))
            .x_label_area_size(45)
            .y_label_area_size(60);
    }
    let mut chart = builder.build_cartesian_2d(0f32..x_max, 0f32..y_max)?;

    if labelled {
        chart
            .configure_mesh()
            .x_desc(X_LABEL)
            .y_desc(Y_LABEL)
            .draw()?;
    }

    for (i, (emotion, values)) in history.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let points = values.iter().enumerate().map(|(x, &y)| (x as f32, y));

        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(emotion.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    if labelled {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Emotion, EmotionScores};
    use chrono::{NaiveDate, Utc};

    #[test]
    fn test_plot_file_name_embeds_timestamp() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap()
            .and_utc();
        assert_eq!(plot_file_name::<Utc>(&at), "emotion_analysis_20240307_090501.png");
    }

    #[test]
    fn test_save_writes_timestamped_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = EmotionHistory::new();
        for i in 0..45 {
            let happy = (i % 10) as f32 * 10.0;
            let scores: EmotionScores = [(Emotion::Happy, happy), (Emotion::Neutral, 100.0 - happy)]
                .into_iter()
                .collect();
            history.update(&scores);
        }

        let path = HistoryPlotter::new(dir.path()).save(&history).unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_str().unwrap();
        let stamp = name
            .strip_prefix("emotion_analysis_")
            .and_then(|rest| rest.strip_suffix(".png"))
            .unwrap();
        let (date, time) = stamp.split_once('_').unwrap();
        assert_eq!(date.len(), 8);
        assert_eq!(time.len(), 6);
        assert!(date.chars().chain(time.chars()).all(|c| c.is_ascii_digit()), "{name}");
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut plotter = HistoryPlotter::new(dir.path().join("missing").join("dir"));

        let result = plotter.save(&EmotionHistory::new());

        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
