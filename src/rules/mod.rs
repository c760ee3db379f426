//! Replacement rules — the ordered substitution list and its store.
//!
//! Rules are literal find/replace pairs applied in list order; a later
//! rule sees text already transformed by the rules before it. The
//! [`RuleStore`] owns the sequence, enforces the add/edit policy, and
//! writes the full list back to its repository after every mutation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::persist::{self, RulesRepository};

/// A single literal substitution rule.
///
/// `source` is matched as an exact substring — no regex, no escaping.
/// A rule with an empty `source` is skipped at application time rather
/// than rejected, so a persisted list containing one stays loadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    /// Stable identity, kept across edits and persistence round trips.
    pub id: Uuid,
    pub source: String,
    pub target: String,
    #[serde(rename = "isEnabled")]
    pub enabled: bool,
}

impl ReplacementRule {
    /// Create an enabled rule with a fresh id.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            target: target.into(),
            enabled: true,
        }
    }
}

/// The built-in rule list: full-width CJK punctuation to its ASCII
/// equivalent, in fixed order, all enabled.
pub fn default_rules() -> Vec<ReplacementRule> {
    [
        ("，", ","),
        ("。", "."),
        ("！", "!"),
        ("？", "?"),
        ("：", ":"),
        ("；", ";"),
    ]
    .into_iter()
    .map(|(source, target)| ReplacementRule::new(source, target))
    .collect()
}

/// Ordered rule list plus the repository it persists to.
///
/// Every mutation synchronously writes the full current sequence back.
/// Persistence failures are logged and never propagated — a lost save
/// must not take down the caller.
pub struct RuleStore<R: RulesRepository> {
    rules: Vec<ReplacementRule>,
    repo: R,
}

impl<R: RulesRepository> RuleStore<R> {
    /// Load rules from the repository.
    ///
    /// Falls back to [`default_rules`] when nothing is persisted, the
    /// data fails to decode, or the decoded list is empty. Decode
    /// failures are logged at warn level, never surfaced.
    pub fn load(repo: R) -> Self {
        let rules = match repo.load() {
            Ok(Some(bytes)) => match persist::decode_rules(&bytes) {
                Ok(rules) if rules.is_empty() => {
                    tracing::debug!("persisted rule list is empty, using defaults");
                    default_rules()
                }
                Ok(rules) => rules,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to decode persisted rules, using defaults");
                    default_rules()
                }
            },
            Ok(None) => default_rules(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted rules, using defaults");
                default_rules()
            }
        };
        Self { rules, repo }
    }

    /// Rules in application order.
    pub fn rules(&self) -> &[ReplacementRule] {
        &self.rules
    }

    /// Append a rule. Both fields are trimmed; an empty trimmed source
    /// is a silent no-op, an empty trimmed target falls back to the
    /// source (mapping a string to itself is allowed). New rules apply
    /// last.
    pub fn add(&mut self, source: &str, target: &str) -> Option<&ReplacementRule> {
        let source = source.trim();
        let target = target.trim();
        if source.is_empty() {
            return None;
        }
        let target = if target.is_empty() { source } else { target };
        self.rules.push(ReplacementRule::new(source, target));
        self.persist();
        self.rules.last()
    }

    /// Remove a rule by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.id != id);
        let removed = self.rules.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Remove rules by list position. Out-of-range positions are
    /// ignored. Returns how many rules were removed.
    pub fn remove_at(&mut self, indices: &[usize]) -> usize {
        let before = self.rules.len();
        let mut position = 0usize;
        self.rules.retain(|_| {
            let keep = !indices.contains(&position);
            position += 1;
            keep
        });
        let removed = before - self.rules.len();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Enable or disable a rule in place. Returns `false` for unknown
    /// ids.
    pub fn set_enabled(&mut self, id: Uuid, enabled: bool) -> bool {
        let Some(rule) = self.rules.iter_mut().find(|rule| rule.id == id) else {
            return false;
        };
        rule.enabled = enabled;
        self.persist();
        true
    }

    /// Edit a rule's source and target in place, with the same trim and
    /// non-empty-source policy as [`RuleStore::add`]. Returns `false`
    /// when the id is unknown or the trimmed source is empty.
    pub fn update(&mut self, id: Uuid, source: &str, target: &str) -> bool {
        let source = source.trim();
        let target = target.trim();
        if source.is_empty() {
            return false;
        }
        let Some(rule) = self.rules.iter_mut().find(|rule| rule.id == id) else {
            return false;
        };
        rule.source = source.to_string();
        rule.target = if target.is_empty() { source } else { target }.to_string();
        self.persist();
        true
    }

    /// Replace the whole list with the built-in defaults. No merge —
    /// user customization is gone after this.
    pub fn reset_to_defaults(&mut self) {
        self.rules = default_rules();
        self.persist();
    }

    /// Write the full current sequence to the repository.
    fn persist(&self) {
        let bytes = match persist::encode_rules(&self.rules) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode rules, skipping save");
                return;
            }
        };
        if let Err(e) = self.repo.save(&bytes) {
            tracing::warn!(error = %e, "failed to persist rules");
        }
    }
}
