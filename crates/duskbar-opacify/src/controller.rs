//! The transparency controller: owns the opacify state machine and turns
//! hover transitions into scheduled compositor updates.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use compositor_ipc::{CompositorClient, CompositorOps, OpacityState};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    Requester, Result, WindowId,
    plan::{self, Frame},
    rules,
    scheduler::{RunHandle, Step, StepScheduler},
    settings::SettingsHandle,
};

/// Mutable controller state, guarded by one lock so opacify/deopacify calls
/// execute strictly sequentially.
struct OpacifyState {
    /// Identity of whoever most recently asked to opacify.
    owner: Option<Requester>,
    /// Window set of the most recent opacify request (empty after restore).
    prev_windows: BTreeSet<WindowId>,
    /// Handle of the animation run whose steps may still be pending.
    run: Option<RunHandle>,
}

/// Fades all other windows when a dock entry is hovered, and fades them back
/// when the pointer leaves.
///
/// One instance lives for the process lifetime. All operations return
/// promptly: they read the compositor state synchronously, compute the step
/// plan, and only *schedule* future writes. Any failure to reach the
/// compositor degrades silently to "no visual effect" — transparency is
/// cosmetic and must never disrupt the dock.
pub struct Opacifier {
    /// Probe-caching handle to the compositor's opacity state.
    client: CompositorClient,
    /// Runs the timed step sequences.
    scheduler: StepScheduler,
    /// Shared settings, read at the start of every transition.
    settings: SettingsHandle,
    /// Owner / previous-target / live-run state.
    inner: Mutex<OpacifyState>,
}

impl Opacifier {
    /// Create a controller over the given compositor transport.
    pub fn new(ops: Arc<dyn CompositorOps>, settings: SettingsHandle) -> Self {
        Self {
            client: CompositorClient::new(ops),
            scheduler: StepScheduler::new(),
            settings,
            inner: Mutex::new(OpacifyState {
                owner: None,
                prev_windows: BTreeSet::new(),
                run: None,
            }),
        }
    }

    /// Fade out every window except `windows`, on behalf of `requester`.
    ///
    /// An empty set is a full restore. Repeating the previous nonempty set
    /// only reassigns ownership — hover events over the same dock entry are
    /// debounced into a single animation run.
    pub fn opacify(&self, windows: &BTreeSet<WindowId>, requester: Requester) {
        self.transition(windows, Some(requester));
    }

    /// Fade all windows back to full opacity.
    ///
    /// With a requester given, this is a no-op unless that requester is the
    /// current owner — a stale leave event from a previous hoverer must not
    /// tear down a fade someone else now owns. Clears ownership.
    pub fn deopacify(&self, requester: Option<&Requester>) {
        if let Some(requester) = requester {
            let inner = self.inner.lock();
            if inner.owner.as_ref() != Some(requester) {
                debug!(%requester, "deopacify ignored, not the current owner");
                return;
            }
        }
        self.transition(&BTreeSet::new(), None);
    }

    /// Reassign ownership of an already-active fade without restarting it.
    ///
    /// Does nothing when no fade is owned.
    pub fn set_owner(&self, requester: Requester) {
        let mut inner = self.inner.lock();
        if inner.owner.is_some() {
            inner.owner = Some(requester);
        }
    }

    /// Identity of the current opacify owner, if any.
    pub fn owner(&self) -> Option<Requester> {
        self.inner.lock().owner.clone()
    }

    /// Number of scheduled steps that have not fired yet.
    pub fn pending_steps(&self) -> usize {
        self.inner
            .lock()
            .run
            .as_ref()
            .map_or(0, RunHandle::pending)
    }

    /// Fetch the compositor state through the probe-caching client.
    fn fetch_state(&self) -> Result<OpacityState> {
        Ok(self.client.fetch()?)
    }

    /// Core transition: compute and schedule the move from the previous
    /// window set to `windows`.
    fn transition(&self, windows: &BTreeSet<WindowId>, owner: Option<Requester>) {
        let mut inner = self.inner.lock();
        if !windows.is_empty() && *windows == inner.prev_windows {
            inner.owner = owner;
            return;
        }
        let cfg = self.settings.read().clamped();
        if !cfg.enabled && !windows.is_empty() {
            debug!("opacify disabled, ignoring fade request");
            return;
        }
        let state = match self.fetch_state() {
            Ok(state) => state,
            Err(e) => {
                // Cosmetic feature: abort with state unchanged.
                warn!("opacify aborted, compositor state unavailable: {e}");
                return;
            }
        };

        // Never let two runs' steps interleave on the shared rule set.
        if let Some(run) = inner.run.take() {
            self.scheduler.cancel_all(&run);
        }

        let stripped = rules::strip_owned(&state, cfg.alpha);
        if !cfg.fade {
            let (values, rule_list) = plan::plan_instant(windows, &stripped, cfg.alpha);
            self.client.push(Some(&values), Some(&rule_list));
        } else if windows.is_empty() {
            debug!(steps = cfg.smoothness, "scheduling restore run");
            let frames =
                plan::plan_restore(&stripped, cfg.alpha, cfg.smoothness, cfg.duration_ms);
            inner.run = Some(self.schedule_frames(frames));
        } else {
            debug!(
                steps = cfg.smoothness,
                targets = windows.len(),
                "scheduling fade run"
            );
            let frames = plan::plan_fade(
                windows,
                &inner.prev_windows,
                &stripped,
                cfg.alpha,
                cfg.smoothness,
                cfg.duration_ms,
            );
            inner.run = Some(self.schedule_frames(frames));
        }

        inner.prev_windows = windows.clone();
        inner.owner = owner;
    }

    /// Turn planned frames into scheduled fire-and-forget compositor writes.
    fn schedule_frames(&self, frames: Vec<Frame>) -> RunHandle {
        let steps = frames
            .into_iter()
            .map(|frame| {
                let client = self.client.clone();
                Step::new(Duration::from_millis(frame.delay_ms), move || {
                    client.push(Some(&frame.values), frame.rules.as_deref());
                })
            })
            .collect();
        self.scheduler.schedule(steps)
    }
}
