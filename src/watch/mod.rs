//! Clipboard watch loop — change detection and suggestion state.
//!
//! [`Watcher`] is the timer-free state machine: a driver (the watch
//! daemon, or a test) calls [`Watcher::poll`] on whatever cadence it
//! owns, and the watcher reports what the tick amounted to. Content is
//! only read when the source's change marker moved, and writes made
//! through the accept operations are recognized when they echo back so
//! the loop never re-triggers on itself.

pub mod daemon;

pub use daemon::{WatchConfig, WatchError, run};

use crate::clipboard::{ChangeMarker, ClipboardSource};
use crate::processor;
use crate::rules::ReplacementRule;

/// A pending substitution suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Clipboard text as observed.
    pub original: String,
    /// The same text after the enabled rules were applied.
    pub processed: String,
    /// Rules that fired, in order.
    pub applied: Vec<ReplacementRule>,
}

/// What a single [`Watcher::poll`] call amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not watching — the poll did nothing.
    Idle,
    /// Change marker unmoved; content was not read.
    Unchanged,
    /// The change was the echo of our own write, consumed silently.
    EchoConsumed,
    /// Content was empty or unreadable; nothing to do.
    Ignored,
    /// New content needed no substitutions; any prior suggestion was
    /// dropped.
    Cleared,
    /// A new suggestion was published, superseding any prior one.
    Suggested,
}

/// Callback invoked exactly when a new suggestion is published.
pub type SuggestionSink = Box<dyn FnMut(&Suggestion) + Send>;

/// Clipboard watcher state machine.
///
/// States are `Idle` and `Watching`; the pending suggestion is an
/// orthogonal sub-state. All transitions happen inside [`Watcher::poll`]
/// and the accept/dismiss calls, which the driver must serialize — the
/// watcher itself holds no locks.
pub struct Watcher<S: ClipboardSource> {
    source: S,
    watching: bool,
    last_marker: Option<ChangeMarker>,
    /// Text written by an accept call whose echo has not been observed
    /// yet. Observed content is compared against this before
    /// suppressing, so an external copy landing in the echo window is
    /// processed instead of being swallowed.
    pending_echo: Option<String>,
    pending: Option<Suggestion>,
    notifier: Option<SuggestionSink>,
}

impl<S: ClipboardSource> Watcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            watching: false,
            last_marker: None,
            pending_echo: None,
            pending: None,
            notifier: None,
        }
    }

    /// Register the suggestion callback. At most one sink; a second
    /// call replaces the first.
    pub fn set_notifier(&mut self, sink: SuggestionSink) {
        self.notifier = Some(sink);
    }

    /// Begin watching. Captures the source's current marker so content
    /// already on the clipboard never triggers a suggestion. No-op when
    /// already watching.
    pub fn start(&mut self) {
        if self.watching {
            return;
        }
        self.watching = true;
        self.last_marker = match self.source.change_marker() {
            Ok(marker) => Some(marker),
            Err(e) => {
                tracing::warn!(error = %e, "could not read initial change marker");
                None
            }
        };
        tracing::debug!("watch started");
    }

    /// Stop watching. Idempotent. Cancelling the poll timer is the
    /// driver's concern.
    pub fn stop(&mut self) {
        self.watching = false;
    }

    /// The currently pending suggestion, if any.
    pub fn pending(&self) -> Option<&Suggestion> {
        self.pending.as_ref()
    }

    /// One poll tick.
    ///
    /// Never fails: clipboard errors are logged and reported as
    /// [`PollOutcome::Ignored`] so the driver keeps ticking.
    pub fn poll(&mut self, rules: &[ReplacementRule]) -> PollOutcome {
        if !self.watching {
            return PollOutcome::Idle;
        }

        let marker = match self.source.change_marker() {
            Ok(marker) => marker,
            Err(e) => {
                tracing::warn!(error = %e, "change marker read failed");
                return PollOutcome::Ignored;
            }
        };
        if self.last_marker == Some(marker) {
            return PollOutcome::Unchanged;
        }
        self.last_marker = Some(marker);

        let text = match self.source.read_text() {
            Ok(Some(text)) if !text.is_empty() => text,
            Ok(_) => return PollOutcome::Ignored,
            Err(e) => {
                tracing::warn!(error = %e, "clipboard read failed");
                return PollOutcome::Ignored;
            }
        };

        if let Some(expected) = self.pending_echo.take() {
            if expected == text {
                return PollOutcome::EchoConsumed;
            }
            // The user copied something else before our write echoed
            // back — a real change, fall through and process it.
        }

        let result = processor::process(&text, rules);
        if !result.has_changes() {
            self.pending = None;
            return PollOutcome::Cleared;
        }

        let suggestion = Suggestion {
            original: result.original,
            processed: result.processed,
            applied: result.applied,
        };
        if let Some(notify) = self.notifier.as_mut() {
            notify(&suggestion);
        }
        self.pending = Some(suggestion);
        PollOutcome::Suggested
    }

    /// Write the pending suggestion's original text back. No-op without
    /// a pending suggestion.
    pub fn accept_original(&mut self) {
        if let Some(suggestion) = self.pending.take() {
            self.write_back(suggestion.original);
        }
    }

    /// Write the pending suggestion's processed text back. No-op
    /// without a pending suggestion.
    pub fn accept_processed(&mut self) {
        if let Some(suggestion) = self.pending.take() {
            self.write_back(suggestion.processed);
        }
    }

    /// Drop the pending suggestion without touching the clipboard.
    pub fn dismiss(&mut self) {
        self.pending = None;
    }

    fn write_back(&mut self, text: String) {
        if let Err(e) = self.source.write_text(&text) {
            // Best effort — the suggestion is already consumed.
            tracing::warn!(error = %e, "clipboard write failed");
            return;
        }
        // Learn the post-write marker now instead of waiting a tick;
        // the remembered text catches sources that signal our write
        // back asynchronously.
        self.last_marker = self.source.change_marker().ok();
        self.pending_echo = Some(text);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::clipboard::ClipboardError;
    use crate::rules::default_rules;

    /// In-memory clipboard with an NSPasteboard-style change counter.
    #[derive(Default)]
    struct FakeState {
        text: Option<String>,
        marker: u64,
        reads: usize,
        fail_reads: bool,
    }

    #[derive(Clone, Default)]
    struct FakeClipboard(Rc<RefCell<FakeState>>);

    impl FakeClipboard {
        /// Simulate a copy performed by another application.
        fn copy_external(&self, text: &str) {
            let mut state = self.0.borrow_mut();
            state.text = Some(text.to_string());
            state.marker += 1;
        }

        /// Bump the marker without changing content — some platforms
        /// signal our own write back asynchronously like this.
        fn touch(&self) {
            self.0.borrow_mut().marker += 1;
        }

        fn set_fail_reads(&self, fail: bool) {
            self.0.borrow_mut().fail_reads = fail;
        }

        fn text(&self) -> Option<String> {
            self.0.borrow().text.clone()
        }

        fn reads(&self) -> usize {
            self.0.borrow().reads
        }
    }

    impl ClipboardSource for FakeClipboard {
        fn change_marker(&mut self) -> Result<ChangeMarker, ClipboardError> {
            Ok(ChangeMarker::from(self.0.borrow().marker))
        }

        fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
            let mut state = self.0.borrow_mut();
            state.reads += 1;
            if state.fail_reads {
                return Err(ClipboardError::Read("simulated failure".into()));
            }
            Ok(state.text.clone())
        }

        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            let mut state = self.0.borrow_mut();
            state.text = Some(text.to_string());
            state.marker += 1;
            Ok(())
        }
    }

    fn watcher() -> (FakeClipboard, Watcher<FakeClipboard>) {
        let clip = FakeClipboard::default();
        let watcher = Watcher::new(clip.clone());
        (clip, watcher)
    }

    // -- Start / stop --

    #[test]
    fn poll_is_idle_before_start() {
        let (clip, mut w) = watcher();
        clip.copy_external("你好，世界");
        assert_eq!(w.poll(&default_rules()), PollOutcome::Idle);
        assert_eq!(clip.reads(), 0);
    }

    #[test]
    fn start_ignores_preexisting_content() {
        let (clip, mut w) = watcher();
        clip.copy_external("你好，世界");
        w.start();
        assert_eq!(w.poll(&default_rules()), PollOutcome::Unchanged);
        assert!(w.pending().is_none());
    }

    #[test]
    fn start_twice_keeps_the_original_marker() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        // A redundant start must not swallow the change.
        w.start();
        assert_eq!(w.poll(&default_rules()), PollOutcome::Suggested);
    }

    #[test]
    fn stop_is_idempotent() {
        let (clip, mut w) = watcher();
        w.start();
        w.stop();
        w.stop();
        clip.copy_external("你好，世界");
        assert_eq!(w.poll(&default_rules()), PollOutcome::Idle);
    }

    // -- Change detection --

    #[test]
    fn unchanged_marker_skips_content_read() {
        let (clip, mut w) = watcher();
        w.start();
        assert_eq!(w.poll(&default_rules()), PollOutcome::Unchanged);
        assert_eq!(w.poll(&default_rules()), PollOutcome::Unchanged);
        assert_eq!(clip.reads(), 0);
    }

    #[test]
    fn external_change_publishes_suggestion() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        assert_eq!(w.poll(&default_rules()), PollOutcome::Suggested);

        let suggestion = w.pending().unwrap();
        assert_eq!(suggestion.original, "你好，世界");
        assert_eq!(suggestion.processed, "你好,世界");
        assert_eq!(suggestion.applied.len(), 1);
    }

    #[test]
    fn notifier_fires_once_per_detected_change() {
        let (clip, mut w) = watcher();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        w.set_notifier(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        w.start();
        clip.copy_external("你好，世界");
        w.poll(&default_rules());
        w.poll(&default_rules());
        w.poll(&default_rules());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn content_without_substitutions_clears_prior_suggestion() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        assert_eq!(w.poll(&default_rules()), PollOutcome::Suggested);

        clip.copy_external("plain ascii");
        assert_eq!(w.poll(&default_rules()), PollOutcome::Cleared);
        assert!(w.pending().is_none());
    }

    #[test]
    fn empty_text_is_ignored() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("");
        assert_eq!(w.poll(&default_rules()), PollOutcome::Ignored);
        assert!(w.pending().is_none());
    }

    #[test]
    fn new_change_supersedes_pending_suggestion() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，");
        assert_eq!(w.poll(&default_rules()), PollOutcome::Suggested);
        clip.copy_external("世界。");
        assert_eq!(w.poll(&default_rules()), PollOutcome::Suggested);
        assert_eq!(w.pending().unwrap().original, "世界。");
    }

    #[test]
    fn disabled_rules_do_not_trigger_suggestions() {
        let mut rule = crate::rules::ReplacementRule::new("，", ",");
        rule.enabled = false;
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        assert_eq!(w.poll(&[rule]), PollOutcome::Cleared);
    }

    #[test]
    fn read_failure_is_not_fatal() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        clip.set_fail_reads(true);
        assert_eq!(w.poll(&default_rules()), PollOutcome::Ignored);

        // The loop keeps going once the source recovers.
        clip.set_fail_reads(false);
        clip.touch();
        assert_eq!(w.poll(&default_rules()), PollOutcome::Suggested);
    }

    // -- Accept / dismiss --

    #[test]
    fn accept_processed_writes_and_clears() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        w.poll(&default_rules());

        w.accept_processed();
        assert_eq!(clip.text().as_deref(), Some("你好,世界"));
        assert!(w.pending().is_none());
        // Our own write must not re-trigger on the next tick.
        assert_eq!(w.poll(&default_rules()), PollOutcome::Unchanged);
    }

    #[test]
    fn accept_original_restores_the_observed_text() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        w.poll(&default_rules());

        w.accept_original();
        assert_eq!(clip.text().as_deref(), Some("你好，世界"));
        assert!(w.pending().is_none());
        assert_eq!(w.poll(&default_rules()), PollOutcome::Unchanged);
    }

    #[test]
    fn dismiss_leaves_the_clipboard_untouched() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        w.poll(&default_rules());

        w.dismiss();
        assert_eq!(clip.text().as_deref(), Some("你好，世界"));
        assert!(w.pending().is_none());
        assert_eq!(w.poll(&default_rules()), PollOutcome::Unchanged);
    }

    #[test]
    fn accept_without_pending_is_a_noop() {
        let (clip, mut w) = watcher();
        w.start();
        w.accept_processed();
        w.accept_original();
        assert!(clip.text().is_none());
    }

    // -- Echo suppression --

    #[test]
    fn late_echo_is_consumed_silently() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        w.poll(&default_rules());
        w.accept_processed();

        // The platform reports our own write one tick later.
        clip.touch();
        assert_eq!(w.poll(&default_rules()), PollOutcome::EchoConsumed);
        assert!(w.pending().is_none());
    }

    #[test]
    fn echo_is_consumed_exactly_once() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        w.poll(&default_rules());
        w.accept_processed();

        clip.touch();
        assert_eq!(w.poll(&default_rules()), PollOutcome::EchoConsumed);

        // Same content signalled again: no echo left to consume, and
        // the processed text needs no further substitutions.
        clip.touch();
        assert_eq!(w.poll(&default_rules()), PollOutcome::Cleared);
    }

    #[test]
    fn external_copy_during_echo_window_is_processed() {
        let (clip, mut w) = watcher();
        w.start();
        clip.copy_external("你好，世界");
        w.poll(&default_rules());
        w.accept_processed();

        // The user copies something else before the echo is observed.
        clip.copy_external("再见！朋友");
        assert_eq!(w.poll(&default_rules()), PollOutcome::Suggested);
        assert_eq!(w.pending().unwrap().original, "再见！朋友");
        assert_eq!(w.pending().unwrap().processed, "再见!朋友");
    }
}
