//! System clipboard adapter over `arboard`.
//!
//! `arboard` exposes no platform change counter, so the marker is a
//! fingerprint of the current text: quiet polls still cost one read
//! here, while counter-backed sources (and the fakes used in tests)
//! keep the cheap-marker contract.

use std::hash::{DefaultHasher, Hash, Hasher};

use arboard::Clipboard;

use super::{ChangeMarker, ClipboardError, ClipboardSource};

/// [`ClipboardSource`] over the OS clipboard.
pub struct SystemClipboard {
    inner: Clipboard,
}

impl SystemClipboard {
    /// Open the system clipboard.
    pub fn new() -> Result<Self, ClipboardError> {
        let inner = Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { inner })
    }

    fn current_text(&mut self) -> Result<Option<String>, ClipboardError> {
        match self.inner.get_text() {
            Ok(text) => Ok(Some(text)),
            // An empty or non-text clipboard is "nothing to do", not a failure.
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(ClipboardError::Read(e.to_string())),
        }
    }
}

impl ClipboardSource for SystemClipboard {
    fn change_marker(&mut self) -> Result<ChangeMarker, ClipboardError> {
        Ok(fingerprint(self.current_text()?.as_deref()))
    }

    fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
        self.current_text()
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// Marker for a given clipboard state. `None` (no text) and `Some("")`
/// hash differently, so clearing the clipboard registers as a change.
fn fingerprint(text: Option<&str>) -> ChangeMarker {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    ChangeMarker::from(hasher.finish())
}
