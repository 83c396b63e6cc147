use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the compositor adapter.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for compositor interactions.
#[derive(Debug, Error)]
pub enum Error {
    /// The compositor endpoint could not be reached under the given
    /// calling convention.
    #[error("compositor unreachable: {0}")]
    Unavailable(String),

    /// The fetched rule and value arrays disagree in length.
    #[error("malformed opacity state: {rules} rules vs {values} values")]
    Malformed {
        /// Number of match rules reported by the compositor.
        rules: usize,
        /// Number of opacity values reported by the compositor.
        values: usize,
    },

    /// An individual write was rejected by the compositor.
    #[error("opacity write rejected: {0}")]
    WriteRejected(String),
}
