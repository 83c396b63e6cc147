use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the opacify engine.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the opacify engine.
///
/// These never reach the dock's UI callers: [`crate::Opacifier`] swallows
/// them after logging, since transparency is cosmetic and must degrade to
/// "no visual effect" rather than disrupt the dock.
#[derive(Debug, Error)]
pub enum Error {
    /// Errors originating from the compositor adapter.
    #[error("compositor error: {0}")]
    Compositor(#[from] compositor_ipc::Error),

    /// Settings text failed to parse.
    #[error("settings parse error: {0}")]
    SettingsParse(#[from] ron::error::SpannedError),
}
