mod cli;
mod clipboard;
mod persist;
mod processor;
mod rules;
mod watch;

use std::io::Read;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, RulesCommand};
use clipboard::{ClipboardSource, SystemClipboard};
use persist::PersistError;
use persist::file::FileRepository;
use rules::{ReplacementRule, RuleStore};
use watch::{WatchConfig, WatchError};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Watch { interval_ms, apply } => {
            let config = WatchConfig {
                interval: Duration::from_millis(interval_ms),
                auto_apply: apply,
            };
            if let Err(e) = watch::run(config).await {
                tracing::error!(error = %e, "watch failed");
                eprintln!("punctd watch: {e}");
                std::process::exit(1);
            }
        }
        Command::Apply => {
            if let Err(e) = apply_once() {
                tracing::error!(error = %e, "apply failed");
                eprintln!("punctd apply: {e}");
                std::process::exit(1);
            }
        }
        Command::Process { text } => {
            if let Err(e) = process_once(text) {
                tracing::error!(error = %e, "process failed");
                eprintln!("punctd process: {e}");
                std::process::exit(1);
            }
        }
        Command::Rules { command } => {
            if let Err(e) = run_rules_command(command) {
                tracing::error!(error = %e, "rules command failed");
                eprintln!("punctd rules: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn load_store() -> Result<RuleStore<FileRepository>, PersistError> {
    Ok(RuleStore::load(FileRepository::at_default_location()?))
}

/// One-shot: process the current clipboard text and write the result
/// back if any rule fired.
fn apply_once() -> Result<(), WatchError> {
    let store = load_store()?;
    let mut source = SystemClipboard::new()?;

    let text = match source.read_text()? {
        Some(text) if !text.is_empty() => text,
        _ => {
            println!("clipboard holds no text");
            return Ok(());
        }
    };

    let result = processor::process(&text, store.rules());
    if !result.has_changes() {
        println!("no substitutions to apply");
        return Ok(());
    }

    source.write_text(&result.processed)?;
    println!(
        "applied {} rule(s): {}",
        result.applied.len(),
        format_applied(&result.applied)
    );
    Ok(())
}

/// Process TEXT (or stdin when omitted) and print the result. The
/// clipboard is untouched.
fn process_once(text: Option<String>) -> Result<(), WatchError> {
    let store = load_store()?;
    let input = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let result = processor::process(&input, store.rules());
    print!("{}", result.processed);
    if !result.processed.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn run_rules_command(command: RulesCommand) -> Result<(), PersistError> {
    let mut store = load_store()?;

    match command {
        RulesCommand::List => {
            for (index, rule) in store.rules().iter().enumerate() {
                let state = if rule.enabled { "enabled " } else { "disabled" };
                println!(
                    "{index:>3}  {}  [{state}]  {:?} -> {:?}",
                    rule.id, rule.source, rule.target
                );
            }
        }
        RulesCommand::Add { source, target } => {
            match store.add(&source, target.as_deref().unwrap_or("")) {
                Some(rule) => println!("added rule {}", rule.id),
                None => {
                    eprintln!("rule source must not be empty");
                    std::process::exit(1);
                }
            }
        }
        RulesCommand::Remove { id } => {
            if store.remove(id) {
                println!("removed {id}");
            } else {
                println!("no rule with id {id}");
            }
        }
        RulesCommand::RemoveAt { indices } => {
            let removed = store.remove_at(&indices);
            println!("removed {removed} rule(s)");
        }
        RulesCommand::Enable { id } => {
            if store.set_enabled(id, true) {
                println!("enabled {id}");
            } else {
                println!("no rule with id {id}");
            }
        }
        RulesCommand::Disable { id } => {
            if store.set_enabled(id, false) {
                println!("disabled {id}");
            } else {
                println!("no rule with id {id}");
            }
        }
        RulesCommand::Update { id, source, target } => {
            if store.update(id, &source, target.as_deref().unwrap_or("")) {
                println!("updated {id}");
            } else {
                println!("no rule with id {id} (or empty source)");
            }
        }
        RulesCommand::Reset => {
            store.reset_to_defaults();
            println!("rules reset to defaults");
        }
    }
    Ok(())
}

fn format_applied(rules: &[ReplacementRule]) -> String {
    rules
        .iter()
        .map(|rule| format!("{:?} -> {:?}", rule.source, rule.target))
        .collect::<Vec<_>>()
        .join(", ")
}
