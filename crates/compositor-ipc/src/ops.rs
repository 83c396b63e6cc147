//! Transport abstraction over the compositor's opacity interface.
//!
//! The engine never talks to the compositor directly; it goes through the
//! [`CompositorOps`] trait so the application can wire in its real IPC
//! transport while tests use [`MockCompositor`].

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::{Error, OpacityState, Plugin, Result};

/// Trait abstraction over the compositor's opacity interface.
pub trait CompositorOps: Send + Sync {
    /// Read the (rules, values) lists under the given calling convention.
    fn get_opacity_state(&self, plugin: Plugin) -> Result<OpacityState>;

    /// Replace the value and/or rule list under the given convention.
    ///
    /// `None` leaves the corresponding list untouched. Callers treat this as
    /// fire-and-forget; no reply is awaited beyond transport-level rejection.
    fn set_opacity_state(
        &self,
        plugin: Plugin,
        values: Option<&[i32]>,
        rules: Option<&[String]>,
    ) -> Result<()>;
}

/// One recorded `set_opacity_state` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushRecord {
    /// Convention the write was issued under.
    pub plugin: Plugin,
    /// Replacement value list, if one was sent.
    pub values: Option<Vec<i32>>,
    /// Replacement rule list, if one was sent.
    pub rules: Option<Vec<String>>,
}

/// Mutable innards of [`MockCompositor`].
#[derive(Default)]
struct MockState {
    /// Current opacity state served to `get` calls and updated by `set`.
    state: OpacityState,
    /// Conventions whose `get` calls fail (probe testing).
    failing_gets: HashSet<Plugin>,
    /// When set, every `set` call is rejected.
    reject_sets: bool,
    /// Accepted writes, in order.
    pushes: Vec<PushRecord>,
    /// Count of rejected writes.
    rejected: usize,
    /// `get` call count per convention.
    get_calls: HashMap<Plugin, usize>,
}

/// In-memory compositor double for tests.
///
/// Accepted writes are applied to the served state, so a later fetch observes
/// exactly what the engine pushed — this is what makes end-to-end restore
/// checks possible.
#[derive(Default)]
pub struct MockCompositor {
    inner: Mutex<MockState>,
}

impl MockCompositor {
    /// Create a mock with an empty opacity state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the state served by `get` calls.
    pub fn set_state(&self, state: OpacityState) {
        self.inner.lock().state = state;
    }

    /// Current state, as mutated by accepted writes.
    pub fn state(&self) -> OpacityState {
        self.inner.lock().state.clone()
    }

    /// Make `get` calls fail for the given convention.
    pub fn fail_gets(&self, plugin: Plugin) {
        self.inner.lock().failing_gets.insert(plugin);
    }

    /// Reject (or stop rejecting) all writes.
    pub fn reject_sets(&self, reject: bool) {
        self.inner.lock().reject_sets = reject;
    }

    /// All accepted writes, in order.
    pub fn pushes(&self) -> Vec<PushRecord> {
        self.inner.lock().pushes.clone()
    }

    /// Number of writes rejected while `reject_sets` was active.
    pub fn rejected_count(&self) -> usize {
        self.inner.lock().rejected
    }

    /// Number of `get` calls issued under the given convention.
    pub fn get_calls(&self, plugin: Plugin) -> usize {
        self.inner.lock().get_calls.get(&plugin).copied().unwrap_or(0)
    }
}

impl CompositorOps for MockCompositor {
    fn get_opacity_state(&self, plugin: Plugin) -> Result<OpacityState> {
        let mut inner = self.inner.lock();
        *inner.get_calls.entry(plugin).or_insert(0) += 1;
        if inner.failing_gets.contains(&plugin) {
            return Err(Error::Unavailable(plugin.values_path().to_string()));
        }
        Ok(inner.state.clone())
    }

    fn set_opacity_state(
        &self,
        plugin: Plugin,
        values: Option<&[i32]>,
        rules: Option<&[String]>,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.reject_sets {
            inner.rejected += 1;
            return Err(Error::WriteRejected(plugin.values_path().to_string()));
        }
        if let Some(values) = values {
            inner.state.values = values.to_vec();
        }
        if let Some(rules) = rules {
            inner.state.rules = rules.to_vec();
        }
        inner.pushes.push(PushRecord {
            plugin,
            values: values.map(<[i32]>::to_vec),
            rules: rules.map(<[String]>::to_vec),
        });
        Ok(())
    }
}
