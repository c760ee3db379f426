//! Rule persistence — repository trait and the on-disk encoding.
//!
//! The rule store treats persisted data as opaque bytes; this module
//! owns the encoding: a JSON array of `{id, source, target, isEnabled}`
//! records in application order. Absent or undecodable data is "no
//! persisted rules", never an error surfaced to the user.

pub mod file;

use std::path::PathBuf;

use crate::rules::ReplacementRule;

/// Errors returned by rule repositories.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("could not determine config directory ($XDG_CONFIG_HOME and $HOME both unset)")]
    NoConfigDir,

    #[error("failed to create directory {path}: {source}")]
    MkdirFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Stores the serialized rule list.
///
/// Absence is not an error: `load` returns `Ok(None)` when nothing has
/// been persisted yet. Decoding the returned bytes is the caller's
/// concern — `RuleStore::load` treats a decode failure the same as
/// absent data.
pub trait RulesRepository {
    /// Read the persisted rule bytes, or `None` if nothing is stored.
    fn load(&self) -> Result<Option<Vec<u8>>, PersistError>;

    /// Replace the persisted rule bytes.
    fn save(&self, bytes: &[u8]) -> Result<(), PersistError>;
}

/// Encode the rule list as pretty-printed JSON.
pub fn encode_rules(rules: &[ReplacementRule]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(rules)
}

/// Decode a rule list previously produced by [`encode_rules`].
pub fn decode_rules(bytes: &[u8]) -> Result<Vec<ReplacementRule>, serde_json::Error> {
    serde_json::from_slice(bytes)
}
