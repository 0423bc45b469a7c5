//! Error taxonomy for the game core.
//!
//! `IllegalMove` is the only recoverable rejection: nothing reached the
//! ledger or the remote side. `CorruptLedger` means replay of our own
//! ledger failed, which is fatal to the session; the caller must reset.

use thiserror::Error;

/// Errors surfaced by the game session and its components.
#[derive(Debug, Error)]
pub enum GameError {
    /// The proposed move was rejected by local validation. No state change.
    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: String, reason: String },

    /// A truncation was requested beyond the current ledger length.
    #[error("cannot undo {requested} plies, only {available} recorded")]
    InvalidUndo { requested: usize, available: usize },

    /// Replaying the ledger produced an illegal move. This violates an
    /// internal invariant (every append is gated by validation) and the
    /// session cannot continue; reset is the only recovery.
    #[error("corrupt ledger at ply {ply} ({san}): {reason}")]
    CorruptLedger {
        ply: usize,
        san: String,
        reason: String,
    },

    /// The remote engine session could not be reached or rejected a request.
    #[error("engine sync failed: {0}")]
    RemoteSync(#[from] RemoteError),

    /// A move or undo was attempted before `start`.
    #[error("no game in progress")]
    NotStarted,

    /// `start` was called while a game is already running.
    #[error("a game is already in progress; reset first")]
    AlreadyStarted,
}

impl GameError {
    pub(crate) fn illegal(mv: impl Into<String>, reason: impl Into<String>) -> Self {
        GameError::IllegalMove {
            mv: mv.into(),
            reason: reason.into(),
        }
    }
}

/// Transport-level failures talking to the engine backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection, timeout, or body decoding failure.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },
}
