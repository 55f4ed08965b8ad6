//! Score panel and FPS readout drawn on top of the live video.

use crate::frame::{Color, FrameError, Point, VideoFrame};
use crate::types::EmotionScores;

// Panel layout, in frame pixels.
const PANEL_TOP_LEFT: Point = Point::new(10, 10);
const PANEL_BOTTOM_RIGHT: Point = Point::new(200, 150);
const TEXT_X: i32 = 20;
const FIRST_LINE_Y: i32 = 30;
const LINE_SPACING: i32 = 20;
const FPS_ORIGIN: Point = Point::new(10, 170);

/// Draw the emotion panel: an opaque black box with one `label: score%` line
/// per present label.
///
/// With `scores == None` the frame is left untouched.
pub fn render_emotions<F: VideoFrame>(frame: &mut F, scores: Option<&EmotionScores>) -> Result<(), FrameError> {
    let Some(scores) = scores else {
        return Ok(());
    };

    frame.fill_rect(PANEL_TOP_LEFT, PANEL_BOTTOM_RIGHT, Color::BLACK)?;

    for (line, (emotion, score)) in scores.iter().enumerate() {
        let origin = Point::new(TEXT_X, FIRST_LINE_Y + line as i32 * LINE_SPACING);
        frame.put_text(&format_score(emotion.as_str(), score), origin, Color::WHITE)?;
    }

    Ok(())
}

/// Draw the `FPS: n.nn` readout below the emotion panel.
pub fn render_fps<F: VideoFrame>(frame: &mut F, fps: f64) -> Result<(), FrameError> {
    frame.put_text(&format!("FPS: {fps:.2}"), FPS_ORIGIN, Color::WHITE)
}

fn format_score(label: &str, score: f32) -> String {
    format!("{label}: {score:.2}%")
}
