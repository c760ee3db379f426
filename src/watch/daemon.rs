//! Watch daemon — drives a [`Watcher`] on a fixed cadence.
//!
//! The loop owns the scheduling the state machine deliberately avoids:
//! a tokio interval tick calls [`Watcher::poll`], stdin lines act on
//! the pending suggestion, and SIGTERM/SIGINT shut down cleanly.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{SignalKind, signal};

use super::{PollOutcome, Suggestion, Watcher};
use crate::clipboard::{ClipboardError, ClipboardSource, SystemClipboard};
use crate::persist::PersistError;
use crate::persist::file::FileRepository;
use crate::rules::RuleStore;

/// Watch loop configuration.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Poll cadence. The reference behavior is 600 ms; this is a
    /// tunable, not a contract.
    pub interval: Duration,
    /// Accept the processed text automatically instead of prompting.
    pub auto_apply: bool,
}

/// Startup failures of the watch daemon. Once polling, nothing is
/// fatal — per-poll errors are logged inside the watcher.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the watch loop until SIGTERM, SIGINT, or a `q` command.
pub async fn run(config: WatchConfig) -> Result<(), WatchError> {
    let repo = FileRepository::at_default_location()?;
    tracing::debug!(path = %repo.path().display(), "loading rules");
    let store = RuleStore::load(repo);
    tracing::info!(rules = store.rules().len(), "rules loaded");

    let source = SystemClipboard::new()?;
    let mut watcher = Watcher::new(source);
    let prompt = !config.auto_apply;
    watcher.set_notifier(Box::new(move |suggestion| {
        print_suggestion(suggestion, prompt);
    }));
    watcher.start();

    let mut ticker = tokio::time::interval(config.interval);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tracing::info!(
        interval_ms = config.interval.as_millis() as u64,
        auto_apply = config.auto_apply,
        "watching clipboard"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = watcher.poll(store.rules());
                if outcome == PollOutcome::Suggested && config.auto_apply {
                    apply_pending(&mut watcher);
                }
            }

            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_command(line.trim(), &mut watcher) {
                            break;
                        }
                    }
                    Ok(None) => {
                        // stdin closed — keep polling; signals still stop us.
                        stdin_open = false;
                        tracing::debug!("stdin closed");
                    }
                    Err(e) => {
                        stdin_open = false;
                        tracing::warn!(error = %e, "stdin read failed");
                    }
                }
            }

            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    watcher.stop();
    tracing::info!("watcher stopped");
    Ok(())
}

/// Auto-apply mode: take the fresh suggestion and write the processed
/// text straight back.
fn apply_pending<S: ClipboardSource>(watcher: &mut Watcher<S>) {
    if let Some(suggestion) = watcher.pending() {
        tracing::info!(rules = suggestion.applied.len(), "applying substitutions");
    }
    watcher.accept_processed();
}

/// Act on one stdin command. Returns `false` when the loop should exit.
fn handle_command<S: ClipboardSource>(command: &str, watcher: &mut Watcher<S>) -> bool {
    match command {
        "q" | "quit" => return false,
        "a" | "accept" => {
            if watcher.pending().is_some() {
                watcher.accept_processed();
                println!("clipboard replaced with processed text");
            } else {
                println!("nothing pending");
            }
        }
        "o" | "original" => {
            if watcher.pending().is_some() {
                watcher.accept_original();
                println!("clipboard restored to original text");
            } else {
                println!("nothing pending");
            }
        }
        "d" | "dismiss" => {
            if watcher.pending().is_some() {
                watcher.dismiss();
                println!("suggestion dismissed");
            } else {
                println!("nothing pending");
            }
        }
        "" => {}
        _ => {
            println!("commands: a = accept processed, o = restore original, d = dismiss, q = quit");
        }
    }
    true
}

/// Print a published suggestion; in prompt mode also show the actions.
fn print_suggestion(suggestion: &Suggestion, prompt: bool) {
    println!("clipboard changed:");
    println!("  original:  {}", suggestion.original);
    println!("  processed: {}", suggestion.processed);
    let fired: Vec<String> = suggestion
        .applied
        .iter()
        .map(|rule| format!("{:?} -> {:?}", rule.source, rule.target))
        .collect();
    println!("  rules:     {}", fired.join(", "));
    if prompt {
        println!("apply? a = accept processed, o = keep original, d = dismiss, q = quit");
    }
}
