//! Clipboard source abstraction.
//!
//! The watch loop never talks to a platform clipboard directly; it
//! polls a [`ClipboardSource`]. `change_marker` is the cheap path:
//! callers compare markers every tick and only read content when the
//! marker moved.

pub mod system;

pub use system::SystemClipboard;

/// Errors returned by clipboard sources.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// The platform clipboard could not be opened at all.
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    /// Reading the current content failed.
    #[error("clipboard read failed: {0}")]
    Read(String),

    /// Writing new content failed.
    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Opaque change-detection token.
///
/// Markers are only compared for equality; the value carries no meaning
/// outside the source that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeMarker(u64);

impl From<u64> for ChangeMarker {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Read/write access to a shared clipboard.
pub trait ClipboardSource {
    /// Current change marker. Side-effect-free; two calls with no
    /// intervening clipboard change return equal markers.
    fn change_marker(&mut self) -> Result<ChangeMarker, ClipboardError>;

    /// Current text content, `None` when the clipboard holds no text.
    fn read_text(&mut self) -> Result<Option<String>, ClipboardError>;

    /// Replace the clipboard content with `text`.
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}
