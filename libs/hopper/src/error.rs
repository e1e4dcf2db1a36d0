//! Error types for the hopper control core.

use thiserror::Error;

/// Errors raised at the boundary of the control core.
#[derive(Debug, Error)]
pub enum HopperError {
    /// A control sequence needs at least one entry to fall back on.
    #[error("control sequence is empty")]
    EmptySequence,

    /// Raw discriminant that does not name a control state.
    #[error("invalid control state value: {0}")]
    InvalidControlState(u8),

    /// Name that does not match any control state.
    #[error("unknown control state: {0}")]
    UnknownControlState(String),

    /// The controller drives one active and at most one idle leg.
    #[error("unsupported leg count {0}, expected 1 or 2")]
    UnsupportedLegCount(usize),

    /// Malformed JSON input.
    #[error("failed to parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ways an interactive challenge session can end without a solution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("challenge was cancelled")]
    Cancelled,

    #[error("challenge timed out")]
    TimedOut,

    #[error("solver gave up on the challenge")]
    Failed,

    #[error("wait for challenge interrupted: {0}")]
    Interrupted(String),
}
