//! Errors for adaptive point inversion.

use thiserror::Error;

/// Errors returned by curve and surface point inversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvertError {
    /// The query point could not be located after exhausting the
    /// neighbor-walk cycle guard; the returned parameter is the best
    /// candidate found before giving up.
    #[error("point inversion did not converge within {0} neighbor-walk steps")]
    DidNotConverge(u32),
}
