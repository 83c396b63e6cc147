//! Opacify configuration, shared between the dock's settings layer and the
//! engine.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::Result;

/// Shared, reloadable settings handle.
///
/// Owned by the application root and handed by reference to the engine at
/// construction. Changes take effect on the next `opacify`/`deopacify` call;
/// an in-flight animation keeps the settings it was planned with.
pub type SettingsHandle = Arc<RwLock<OpacifySettings>>;

/// User-facing opacify settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OpacifySettings {
    /// Master switch; when off, new fades are suppressed (restores still run).
    pub enabled: bool,
    /// Animate transitions instead of switching opacity in one step.
    pub fade: bool,
    /// Target opacity percentage (0-100) for faded-out windows.
    pub alpha: i32,
    /// Number of animation steps per fade.
    pub smoothness: u32,
    /// Total fade duration in milliseconds.
    pub duration_ms: u64,
}

impl Default for OpacifySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            fade: true,
            alpha: 5,
            smoothness: 5,
            duration_ms: 100,
        }
    }
}

impl OpacifySettings {
    /// Parse settings from their RON text form.
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Wrap into a shared handle.
    pub fn into_handle(self) -> SettingsHandle {
        Arc::new(RwLock::new(self))
    }

    /// Snapshot with out-of-range values pulled back into bounds.
    pub(crate) fn clamped(&self) -> Self {
        Self {
            alpha: self.alpha.clamp(0, 100),
            smoothness: self.smoothness.max(1),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_config() {
        let settings = OpacifySettings::default();
        assert!(!settings.enabled);
        assert!(settings.fade);
        assert_eq!(settings.alpha, 5);
        assert_eq!(settings.smoothness, 5);
        assert_eq!(settings.duration_ms, 100);
    }

    #[test]
    fn partial_ron_overrides_defaults() {
        let settings =
            OpacifySettings::from_ron("(enabled: true, alpha: 20, smoothness: 4, duration_ms: 200)")
                .expect("valid settings");
        assert!(settings.enabled);
        assert_eq!(settings.alpha, 20);
        assert_eq!(settings.smoothness, 4);
        assert_eq!(settings.duration_ms, 200);
        assert!(settings.fade, "unset fields keep their defaults");
    }

    #[test]
    fn invalid_ron_is_an_error() {
        assert!(OpacifySettings::from_ron("(alpha: \"five\")").is_err());
    }

    #[test]
    fn clamping_bounds_alpha_and_smoothness() {
        let settings = OpacifySettings {
            alpha: 250,
            smoothness: 0,
            ..OpacifySettings::default()
        }
        .clamped();
        assert_eq!(settings.alpha, 100);
        assert_eq!(settings.smoothness, 1);
    }
}
