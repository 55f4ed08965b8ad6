//! HighGUI preview window with key polling.

use crate::frame::Frame;
use moodcam_core::capture::{DisplayError, FrameSink};
use opencv::highgui;

/// Milliseconds `wait_key` blocks per iteration; also pumps the GUI event loop.
const KEY_POLL_MS: i32 = 1;

pub struct Window {
    title: String,
    open: bool,
}

impl Window {
    pub fn open(title: &str) -> Result<Self, DisplayError> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .map_err(|e| DisplayError::Open(format!("{title}: {e}")))?;
        tracing::debug!(title, "opened preview window");
        Ok(Self {
            title: title.to_string(),
            open: true,
        })
    }
}

/// Map a raw `wait_key` code to a character; -1 means no key.
fn decode_key(code: i32) -> Option<char> {
    if code < 0 {
        return None;
    }
    Some(char::from((code & 0xFF) as u8))
}

impl FrameSink<Frame> for Window {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        highgui::imshow(&self.title, frame.mat()).map_err(|e| DisplayError::Show(e.to_string()))
    }

    fn poll_key(&mut self) -> Result<Option<char>, DisplayError> {
        let code = highgui::wait_key(KEY_POLL_MS).map_err(|e| DisplayError::Show(e.to_string()))?;
        Ok(decode_key(code))
    }

    fn close(&mut self) -> Result<(), DisplayError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        highgui::destroy_all_windows().map_err(|e| DisplayError::Show(e.to_string()))
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.open {
            let _ = highgui::destroy_all_windows();
        }
    }
}
