//! Text processing — ordered literal substitution over an input string.
//!
//! [`process`] is pure and stateless: it takes the text and the rule
//! list, applies every enabled rule in order, and reports which rules
//! actually changed something. Suggestion and clipboard state live in
//! `watch`; nothing here performs I/O.

use crate::rules::ReplacementRule;

/// Outcome of one processing pass. A fresh value per invocation — no
/// identity beyond its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    /// The input, verbatim.
    pub original: String,
    /// The input after all enabled rules were applied in order.
    pub processed: String,
    /// Rules that changed the string, in the order they fired. The same
    /// rule appears twice if the list contained it twice.
    pub applied: Vec<ReplacementRule>,
}

impl ProcessingResult {
    pub fn has_changes(&self) -> bool {
        self.processed != self.original
    }
}

/// Run `text` through `rules` in order.
///
/// Replacement is literal substring matching — no regex, no escaping.
/// Each rule sees the output of the rules before it, so `A→B` followed
/// by `B→C` turns `A` into `C`, and of two rules sharing a source the
/// first in order wins. Whether a rule fired is judged by comparing the
/// string before and after its replacement, not by counting matches: a
/// rule whose target equals the matched text counts as no change.
pub fn process(text: &str, rules: &[ReplacementRule]) -> ProcessingResult {
    if text.is_empty() {
        return ProcessingResult {
            original: text.to_string(),
            processed: text.to_string(),
            applied: Vec::new(),
        };
    }

    let mut updated = text.to_string();
    let mut applied = Vec::new();

    for rule in rules {
        if !rule.enabled || rule.source.is_empty() {
            continue;
        }
        let replaced = updated.replace(&rule.source, &rule.target);
        if replaced != updated {
            updated = replaced;
            applied.push(rule.clone());
        }
    }

    ProcessingResult {
        original: text.to_string(),
        processed: updated,
        applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::default_rules;

    fn rule(source: &str, target: &str) -> ReplacementRule {
        ReplacementRule::new(source, target)
    }

    // -- Fast paths --

    #[test]
    fn empty_input_is_a_noop() {
        let result = process("", &default_rules());
        assert!(!result.has_changes());
        assert!(result.applied.is_empty());
        assert_eq!(result.processed, "");
    }

    #[test]
    fn original_is_always_the_verbatim_input() {
        let result = process("你好，世界", &default_rules());
        assert_eq!(result.original, "你好，世界");
    }

    // -- Core scenarios --

    #[test]
    fn fullwidth_comma_is_replaced() {
        let rules = [rule("，", ",")];
        let result = process("你好，世界", &rules);

        assert!(result.has_changes());
        assert_eq!(result.processed, "你好,世界");
        assert_eq!(result.applied.len(), 1);
        assert_eq!(result.applied[0].source, "，");
    }

    #[test]
    fn disabled_rule_is_ignored() {
        let mut disabled = rule("，", ",");
        disabled.enabled = false;
        let result = process("你好，世界", &[disabled]);

        assert!(!result.has_changes());
        assert_eq!(result.processed, "你好，世界");
        assert!(result.applied.is_empty());
    }

    #[test]
    fn multiple_rules_apply_sequentially() {
        let rules = [rule("，", ","), rule("。", ".")];
        let result = process("你好，世界。", &rules);

        assert_eq!(result.processed, "你好,世界.");
        assert_eq!(result.applied.len(), 2);
    }

    #[test]
    fn replacement_is_global_within_the_text() {
        let rules = [rule("，", ",")];
        let result = process("一，二，三，", &rules);
        assert_eq!(result.processed, "一,二,三,");
    }

    // -- Ordering semantics --

    #[test]
    fn later_rule_sees_earlier_rule_output() {
        let rules = [rule("A", "B"), rule("B", "C")];
        let result = process("A", &rules);

        assert_eq!(result.processed, "C");
        assert_eq!(result.applied.len(), 2);
    }

    #[test]
    fn duplicate_source_first_rule_wins() {
        let rules = [rule("a", "b"), rule("a", "c")];
        let result = process("aa", &rules);

        assert_eq!(result.processed, "bb");
        assert_eq!(result.applied.len(), 1);
        assert_eq!(result.applied[0].target, "b");
    }

    #[test]
    fn applied_follows_rule_order_not_occurrence_order() {
        let rules = [rule("A", "x"), rule("B", "y")];
        let result = process("BA", &rules);

        let sources: Vec<&str> = result
            .applied
            .iter()
            .map(|r| r.source.as_str())
            .collect();
        assert_eq!(sources, vec!["A", "B"]);
    }

    // -- Non-firing rules --

    #[test]
    fn rule_without_match_is_not_recorded() {
        let rules = [rule("，", ","), rule("。", ".")];
        let result = process("你好，世界", &rules);
        assert_eq!(result.applied.len(), 1);
    }

    #[test]
    fn identity_replacement_counts_as_no_change() {
        // Source present in the text, but target equals source.
        let rules = [rule(",", ",")];
        let result = process("a,b", &rules);

        assert!(!result.has_changes());
        assert!(result.applied.is_empty());
    }

    #[test]
    fn empty_source_rule_is_skipped() {
        let result = process("abc", &[rule("", "x")]);
        assert!(!result.has_changes());
        assert!(result.applied.is_empty());
    }

    // -- Convergence --

    #[test]
    fn one_pass_converges_for_cycle_free_rules() {
        let rules = default_rules();
        let first = process("你好，世界。真的！？", &rules);
        let second = process(&first.processed, &rules);

        assert_eq!(second.processed, first.processed);
        assert!(!second.has_changes());
    }
}
