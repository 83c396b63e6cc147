//! Window semi-transparency ("opacify") animation engine for the duskbar
//! dock.
//!
//! When the pointer hovers over a dock entry, the engine fades every other
//! on-screen window toward a configured alpha by pushing rule/value updates
//! to the compositor's global opacity list, and fades them back when the
//! pointer leaves. The public surface is small:
//! - [`Opacifier`]: the controller driven by UI hover handlers
//! - [`StepScheduler`]: the timed-step runner behind the animations
//! - [`OpacifySettings`]: the user-facing knobs
//!
//! All operations return promptly and degrade silently when the compositor
//! is unreachable; transparency is cosmetic, never load-bearing.

use std::fmt;

mod controller;
mod error;
mod plan;
mod rules;
mod scheduler;
mod settings;

pub use controller::Opacifier;
pub use error::{Error, Result};
pub use scheduler::{RunHandle, Step, StepScheduler};
pub use settings::{OpacifySettings, SettingsHandle};

/// Opaque platform window identifier (the compositor's xid).
pub type WindowId = u64;

/// Opaque identity of whoever most recently asked to opacify.
///
/// Used to arbitrate competing fade requests: a stale `deopacify` from a
/// requester that no longer owns the fade is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Requester(String);

impl Requester {
    /// Create a requester token from any identifying string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The underlying identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Requester {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Requester {
    fn from(id: String) -> Self {
        Self(id)
    }
}
