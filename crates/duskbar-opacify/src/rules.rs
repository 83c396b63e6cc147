//! Construction and recognition of engine-owned compositor match rules.
//!
//! Every rule this engine pushes embeds a sentinel token in its text, so a
//! later pass can strip stale engine rules from the compositor's list no
//! matter which process wrote them.

use compositor_ipc::OpacityState;

use crate::WindowId;

/// Token embedded in every rule the engine writes.
const OWNED_TAG: &str = "Line_added_by_duskbar";
/// Title token used for inert slot-reserving rules.
const PLACEHOLDER_TAG: &str = "Placeholder_line_for_duskbar";
/// Inert rule that matches no real window; reserves an animation slot.
pub(crate) const PLACEHOLDER_RULE: &str = "(title=Placeholder_line_for_duskbar)";

/// `xid=a|xid=b|...` alternation over a window set.
fn xid_alternation(windows: &[WindowId]) -> String {
    windows
        .iter()
        .map(|xid| format!("xid={xid}"))
        .collect::<Vec<_>>()
        .join("|")
}

/// Wrap a window selector in the engine's rule template.
///
/// Only normal and dialog windows are touched, and the sentinel keeps the
/// rule recognizable as engine-owned.
fn rule_for(selector: &str) -> String {
    format!("(type=Normal|type=Dialog)&{selector}&!title={OWNED_TAG}")
}

/// Rule matching every eligible window *except* the given set.
pub(crate) fn exclude_rule(windows: &[WindowId]) -> String {
    rule_for(&format!("!({})", xid_alternation(windows)))
}

/// Rule matching exactly the given set.
pub(crate) fn include_rule(windows: &[WindowId]) -> String {
    rule_for(&format!("({})", xid_alternation(windows)))
}

/// Whether a rule was written by this engine (any process, any session).
pub(crate) fn is_owned(rule: &str) -> bool {
    rule.contains(OWNED_TAG) || rule.contains(PLACEHOLDER_TAG)
}

/// Remote state with engine-owned entries removed.
pub(crate) struct Stripped {
    /// Surviving foreign rules, original order preserved.
    pub rules: Vec<String>,
    /// Values paired with `rules`.
    pub values: Vec<i32>,
    /// Values recovered from stripped engine slots, clamped to at least the
    /// target alpha, capped to the three most recent and padded with alpha.
    pub old_values: [i32; 3],
}

/// Strip engine-owned entries from a fetched state.
///
/// The recovered slot values seed the next animation's cross-fade so a fade
/// interrupted mid-flight continues from where it visibly is.
pub(crate) fn strip_owned(state: &OpacityState, alpha: i32) -> Stripped {
    let mut rules = Vec::with_capacity(state.rules.len());
    let mut values = Vec::with_capacity(state.values.len());
    let mut recovered = Vec::new();
    for (rule, &value) in state.rules.iter().zip(&state.values) {
        if is_owned(rule) {
            recovered.push(value.max(alpha));
        } else {
            rules.push(rule.clone());
            values.push(value);
        }
    }
    recovered.truncate(3);
    while recovered.len() < 3 {
        recovered.push(alpha);
    }
    let old_values = [recovered[0], recovered[1], recovered[2]];
    Stripped {
        rules,
        values,
        old_values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_text_embeds_sentinel_and_selector() {
        let rule = exclude_rule(&[7, 12]);
        assert_eq!(
            rule,
            "(type=Normal|type=Dialog)&!(xid=7|xid=12)&!title=Line_added_by_duskbar"
        );
        assert!(is_owned(&rule));

        let rule = include_rule(&[3]);
        assert_eq!(
            rule,
            "(type=Normal|type=Dialog)&(xid=3)&!title=Line_added_by_duskbar"
        );
        assert!(is_owned(PLACEHOLDER_RULE));
        assert!(!is_owned("(type=Menu)"));
    }

    #[test]
    fn strip_keeps_foreign_entries_in_order() {
        let state = OpacityState::new(
            vec![
                include_rule(&[1]),
                "(type=Menu)".into(),
                PLACEHOLDER_RULE.into(),
                "(type=Tooltip)".into(),
            ],
            vec![40, 90, 5, 80],
        );
        let stripped = strip_owned(&state, 5);
        assert_eq!(stripped.rules, vec!["(type=Menu)", "(type=Tooltip)"]);
        assert_eq!(stripped.values, vec![90, 80]);
        assert_eq!(stripped.old_values, [40, 5, 5]);
    }

    #[test]
    fn recovered_values_are_clamped_to_alpha() {
        let state = OpacityState::new(vec![include_rule(&[1])], vec![2]);
        let stripped = strip_owned(&state, 20);
        assert_eq!(stripped.old_values, [20, 20, 20]);
    }

    #[test]
    fn recovered_values_cap_at_three() {
        let rules = vec![
            include_rule(&[1]),
            include_rule(&[2]),
            include_rule(&[3]),
            include_rule(&[4]),
        ];
        let state = OpacityState::new(rules, vec![50, 60, 70, 80]);
        let stripped = strip_owned(&state, 5);
        assert_eq!(stripped.old_values, [50, 60, 70]);
        assert!(stripped.rules.is_empty());
    }
}
