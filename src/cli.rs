use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "punctd", about = "Clipboard substitution daemon")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Watch the clipboard and suggest substitutions
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 600)]
        interval_ms: u64,

        /// Apply the processed text automatically instead of prompting
        #[arg(long)]
        apply: bool,
    },

    /// Process the current clipboard text once and write back the result
    Apply,

    /// Run text through the rules and print the result
    Process {
        /// Text to process; read from stdin when omitted
        text: Option<String>,
    },

    /// Manage the substitution rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Subcommand)]
pub enum RulesCommand {
    /// List rules in application order
    List,

    /// Append a rule (new rules apply last)
    Add {
        /// Literal text to find
        source: String,

        /// Replacement; defaults to the source itself
        target: Option<String>,
    },

    /// Remove a rule by id
    Remove { id: Uuid },

    /// Remove rules by list position
    RemoveAt {
        /// Zero-based positions as shown by `rules list`
        #[arg(required = true)]
        indices: Vec<usize>,
    },

    /// Enable a rule by id
    Enable { id: Uuid },

    /// Disable a rule by id
    Disable { id: Uuid },

    /// Edit a rule's source and target
    Update {
        id: Uuid,

        /// New literal text to find
        source: String,

        /// New replacement; defaults to the source itself
        target: Option<String>,
    },

    /// Replace all rules with the built-in defaults
    Reset,
}
