//! Pure fade planning: slot assignment and step-frame construction.
//!
//! The compositor only gives us a bounded number of simultaneously animated
//! buckets, so every transition is expressed over three slots: a steady
//! background slot, a fade-out slot and a fade-in slot. Planning is pure so
//! the arithmetic (notably endpoint convergence under integer rounding) can
//! be tested without a runtime.

use std::collections::BTreeSet;

use crate::{
    WindowId,
    rules::{self, Stripped},
};

/// One scheduled animation step: a value array to push, optionally paired
/// with a full rule replacement (only the first frame of a fade and the
/// terminal frame of a restore carry rules).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Frame {
    /// Delay from the start of the run, in milliseconds (absolute, not
    /// relative to the previous frame).
    pub delay_ms: u64,
    /// Full value array: three slot values followed by foreign values.
    pub values: Vec<i32>,
    /// Full rule array, when this frame replaces rules as well.
    pub rules: Option<Vec<String>>,
}

/// Which of the three slots plays which role in a fade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Slots {
    /// Holds the background at the target alpha; its old value was lowest,
    /// so keeping it stationary minimizes visible flicker.
    pub steady: usize,
    /// Animates windows leaving the highlighted set down toward alpha; its
    /// old value was highest, closest to where those windows start.
    pub fade_out: usize,
    /// Animates windows entering the highlighted set up toward opaque.
    pub fade_in: usize,
}

/// Assign slot roles from the recovered old slot values.
///
/// First-index wins on ties; when all three values are equal the steady slot
/// falls back to index 2 so the roles stay distinct.
pub(crate) fn assign_slots(old_values: [i32; 3]) -> Slots {
    let min = old_values.iter().min().copied().unwrap_or(0);
    let max = old_values.iter().max().copied().unwrap_or(0);
    let mut steady = old_values.iter().position(|&v| v == min).unwrap_or(0);
    let fade_out = old_values.iter().position(|&v| v == max).unwrap_or(0);
    if steady == fade_out {
        steady = 2;
    }
    let fade_in = (0..3)
        .find(|&i| i != steady && i != fade_out)
        .unwrap_or(1);
    Slots {
        steady,
        fade_out,
        fade_in,
    }
}

/// Linear step toward 100, exact at `i == steps` despite integer division.
fn toward_opaque(from: i32, i: u32, steps: u32) -> i32 {
    100 - ((steps - i) as i32 * (100 - from)) / steps as i32
}

/// Linear step from 100 down toward `target`, exact at `i == steps`.
fn toward_target(target: i32, i: u32, steps: u32) -> i32 {
    100 - (i as i32 * (100 - target)) / steps as i32
}

/// Plan the fade toward a new nonempty highlighted window set.
///
/// Frame `i` (1-based) fires at `(i-1) * duration / steps`; the first frame
/// carries the full rule replacement. With no prior highlight the hovered set
/// is pinned opaque on the fade-in slot while the fade-out slot carries the
/// whole background down; in a cross-fade the background holds steady while
/// only the entering/leaving windows animate.
pub(crate) fn plan_fade(
    windows: &BTreeSet<WindowId>,
    prev: &BTreeSet<WindowId>,
    stripped: &Stripped,
    alpha: i32,
    steps: u32,
    duration_ms: u64,
) -> Vec<Frame> {
    let slots = assign_slots(stripped.old_values);
    let interval = duration_ms / u64::from(steps);

    let fade_ins: Vec<WindowId> = windows.difference(prev).copied().collect();
    let fade_outs: Vec<WindowId> = prev.difference(windows).copied().collect();

    let mut slot_rules = vec![rules::PLACEHOLDER_RULE.to_string(); 3];
    if prev.is_empty() {
        let hovered: Vec<WindowId> = windows.iter().copied().collect();
        slot_rules[slots.fade_out] = rules::exclude_rule(&hovered);
        slot_rules[slots.fade_in] = rules::include_rule(&hovered);
    } else {
        let excluded: Vec<WindowId> = windows.union(prev).copied().collect();
        slot_rules[slots.steady] = rules::exclude_rule(&excluded);
        if !fade_outs.is_empty() {
            slot_rules[slots.fade_out] = rules::include_rule(&fade_outs);
        }
        if !fade_ins.is_empty() {
            slot_rules[slots.fade_in] = rules::include_rule(&fade_ins);
        }
    }

    // Freshly hovered windows were already opaque, so their slot stays
    // pinned at 100; in a cross-fade the entering windows rise from alpha.
    let fade_in_start = if prev.is_empty() { 100 } else { alpha };
    let out_active = prev.is_empty() || !fade_outs.is_empty();
    let in_active = prev.is_empty() || !fade_ins.is_empty();

    let mut slot_values = [alpha; 3];
    let mut frames = Vec::with_capacity(steps as usize);
    for i in 1..=steps {
        if in_active {
            slot_values[slots.fade_in] = toward_opaque(fade_in_start, i, steps);
        }
        if out_active {
            slot_values[slots.fade_out] = toward_target(alpha, i, steps);
        }
        let mut values = slot_values.to_vec();
        values.extend_from_slice(&stripped.values);
        let frame_rules = (i == 1).then(|| {
            let mut all = slot_rules.clone();
            all.extend_from_slice(&stripped.rules);
            all
        });
        frames.push(Frame {
            delay_ms: u64::from(i - 1) * interval,
            values,
            rules: frame_rules,
        });
    }
    frames
}

/// Plan the fade back to full opacity plus the terminal restore.
///
/// Intermediate frames raise each slot from its last known value toward 100,
/// pushing values only (the engine rules are still in place remotely). The
/// terminal frame restores the captured pre-opacify rule set exactly, which
/// guards against residual values from accumulated integer rounding.
pub(crate) fn plan_restore(
    stripped: &Stripped,
    alpha: i32,
    steps: u32,
    duration_ms: u64,
) -> Vec<Frame> {
    let interval = duration_ms / u64::from(steps);
    let mut frames = Vec::with_capacity(steps as usize);
    for i in 1..steps {
        let ramp = toward_opaque(alpha, i, steps);
        let mut values: Vec<i32> = stripped
            .old_values
            .iter()
            .map(|&old| ramp.max(old))
            .collect();
        values.extend_from_slice(&stripped.values);
        frames.push(Frame {
            delay_ms: u64::from(i) * interval,
            values,
            rules: None,
        });
    }
    frames.push(Frame {
        delay_ms: u64::from(steps) * interval + 1,
        values: stripped.values.clone(),
        rules: Some(stripped.rules.clone()),
    });
    frames
}

/// Compute the single instant switch used when fading is disabled.
pub(crate) fn plan_instant(
    windows: &BTreeSet<WindowId>,
    stripped: &Stripped,
    alpha: i32,
) -> (Vec<i32>, Vec<String>) {
    if windows.is_empty() {
        return (stripped.values.clone(), stripped.rules.clone());
    }
    let hovered: Vec<WindowId> = windows.iter().copied().collect();
    let mut values = vec![alpha];
    values.extend_from_slice(&stripped.values);
    let mut rule_list = vec![rules::exclude_rule(&hovered)];
    rule_list.extend_from_slice(&stripped.rules);
    (values, rule_list)
}
