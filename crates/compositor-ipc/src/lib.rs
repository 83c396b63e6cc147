//! Client adapter for the compositor's global opacity-rule interface.
//!
//! The compositor exposes one screen-wide list of (match rule, opacity value)
//! pairs. This crate models that state, abstracts the transport behind the
//! [`CompositorOps`] trait, and wraps it in a [`CompositorClient`] that probes
//! which of the two calling conventions ([`Plugin`]) the running compositor
//! understands and caches the answer for the life of the client.
//!
//! Reads are synchronous snapshots; writes are fire-and-forget from the
//! caller's perspective (failures are logged, never surfaced).

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

mod error;
mod ops;

pub use error::{Error, Result};
pub use ops::{CompositorOps, MockCompositor, PushRecord};

/// Calling convention used to address the compositor's opacity options.
///
/// Newer compositors expose the opacity list through the `obs` plugin; older
/// ones keep it under `core`. The paths are otherwise identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Plugin {
    /// The `obs` plugin paths used by current compositor versions.
    Current,
    /// The `core` paths used by older compositor versions.
    Legacy,
}

impl Plugin {
    /// Path of the opacity value list under this convention.
    pub fn values_path(self) -> &'static str {
        match self {
            Self::Current => "obs/screen0/opacity_values",
            Self::Legacy => "core/screen0/opacity_values",
        }
    }

    /// Path of the opacity match-rule list under this convention.
    pub fn rules_path(self) -> &'static str {
        match self {
            Self::Current => "obs/screen0/opacity_matches",
            Self::Legacy => "core/screen0/opacity_matches",
        }
    }
}

/// Snapshot of the compositor's opacity configuration.
///
/// `rules` and `values` are parallel arrays: the value at index `i` applies to
/// windows matched by the rule at index `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpacityState {
    /// Ordered match rules, as understood by the compositor's rule language.
    pub rules: Vec<String>,
    /// Opacity percentages (0-100) paired positionally with `rules`.
    pub values: Vec<i32>,
}

impl OpacityState {
    /// Build a state from parallel rule/value arrays.
    pub fn new(rules: Vec<String>, values: Vec<i32>) -> Self {
        Self { rules, values }
    }

    /// Check the parallel-array invariant.
    pub fn validate(&self) -> Result<()> {
        if self.rules.len() == self.values.len() {
            Ok(())
        } else {
            Err(Error::Malformed {
                rules: self.rules.len(),
                values: self.values.len(),
            })
        }
    }
}

/// Shared probe state for a [`CompositorClient`].
struct ClientInner {
    /// Transport used to reach the compositor.
    ops: Arc<dyn CompositorOps>,
    /// Calling convention confirmed by the first successful read.
    plugin: OnceCell<Plugin>,
}

/// Handle to the compositor's opacity state with convention probing.
///
/// The first successful read decides which [`Plugin`] convention the client
/// uses from then on; the probe is never repeated after it succeeds once.
#[derive(Clone)]
pub struct CompositorClient {
    inner: Arc<ClientInner>,
}

impl CompositorClient {
    /// Create a client over the given transport.
    pub fn new(ops: Arc<dyn CompositorOps>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                ops,
                plugin: OnceCell::new(),
            }),
        }
    }

    /// The cached calling convention, if the probe has succeeded.
    pub fn plugin(&self) -> Option<Plugin> {
        self.inner.plugin.get().copied()
    }

    /// Read and validate the state under one convention.
    fn fetch_via(&self, plugin: Plugin) -> Result<OpacityState> {
        let state = self.inner.ops.get_opacity_state(plugin)?;
        state.validate()?;
        Ok(state)
    }

    /// Fetch the current opacity state.
    ///
    /// On the first call this probes the current convention and falls back to
    /// the legacy one; whichever answers validly is cached. A malformed reply
    /// counts as a failed probe.
    pub fn fetch(&self) -> Result<OpacityState> {
        if let Some(plugin) = self.plugin() {
            return self.fetch_via(plugin);
        }
        match self.fetch_via(Plugin::Current) {
            Ok(state) => {
                let _ = self.inner.plugin.set(Plugin::Current);
                Ok(state)
            }
            Err(first) => {
                debug!("current convention probe failed, trying legacy: {first}");
                let state = self.fetch_via(Plugin::Legacy)?;
                let _ = self.inner.plugin.set(Plugin::Legacy);
                Ok(state)
            }
        }
    }

    /// Push a replacement for the value and/or rule list.
    ///
    /// Fire-and-forget: a rejected write is logged at warn level and
    /// otherwise ignored. Uses the cached convention, or the current one if
    /// no probe has succeeded yet.
    pub fn push(&self, values: Option<&[i32]>, rules: Option<&[String]>) {
        let plugin = self.plugin().unwrap_or(Plugin::Current);
        if let Err(e) = self.inner.ops.set_opacity_state(plugin, values, rules) {
            warn!("opacity write failed on {}: {e}", plugin.values_path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_mismatched_arrays() {
        let state = OpacityState::new(vec!["(type=Menu)".into()], vec![90, 80]);
        assert!(matches!(
            state.validate(),
            Err(Error::Malformed { rules: 1, values: 2 })
        ));
        assert!(OpacityState::default().validate().is_ok());
    }

    #[test]
    fn probe_prefers_current_convention() {
        let mock = Arc::new(MockCompositor::new());
        let client = CompositorClient::new(mock.clone());
        assert!(client.fetch().is_ok());
        assert_eq!(client.plugin(), Some(Plugin::Current));
        assert_eq!(mock.get_calls(Plugin::Legacy), 0);
    }

    #[test]
    fn probe_falls_back_to_legacy_and_caches() {
        let mock = Arc::new(MockCompositor::new());
        mock.fail_gets(Plugin::Current);
        let client = CompositorClient::new(mock.clone());

        assert!(client.fetch().is_ok());
        assert_eq!(client.plugin(), Some(Plugin::Legacy));

        // The cached result skips the current-convention attempt entirely.
        assert!(client.fetch().is_ok());
        assert_eq!(mock.get_calls(Plugin::Current), 1);
        assert_eq!(mock.get_calls(Plugin::Legacy), 2);
    }

    #[test]
    fn fetch_fails_when_both_conventions_fail() {
        let mock = Arc::new(MockCompositor::new());
        mock.fail_gets(Plugin::Current);
        mock.fail_gets(Plugin::Legacy);
        let client = CompositorClient::new(mock.clone());
        assert!(client.fetch().is_err());
        assert_eq!(client.plugin(), None);
    }

    #[test]
    fn malformed_state_counts_as_probe_failure() {
        let mock = Arc::new(MockCompositor::new());
        mock.set_state(OpacityState::new(vec!["(type=Menu)".into()], vec![]));
        let client = CompositorClient::new(mock);
        assert!(client.fetch().is_err());
        assert_eq!(client.plugin(), None);
    }

    #[test]
    fn push_records_through_cached_plugin() {
        let mock = Arc::new(MockCompositor::new());
        mock.fail_gets(Plugin::Current);
        let client = CompositorClient::new(mock.clone());
        client.fetch().expect("legacy fetch");

        client.push(Some(&[50]), Some(&["(type=Normal)".to_string()]));
        let pushes = mock.pushes();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].plugin, Plugin::Legacy);
        assert_eq!(pushes[0].values.as_deref(), Some(&[50][..]));
    }
}
