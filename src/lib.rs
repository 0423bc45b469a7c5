//! Game state synchronization engine for playing chess against a remote
//! engine backend.
//!
//! The core owns the canonical move ledger and rebuilds the board from
//! it by full replay; the board is never patched incrementally, so undo
//! and reset cannot leave board and ledger out of sync. Moves are
//! validated locally before anything is sent to the backend, and a user
//! move is only committed once the engine has acknowledged it.
//!
//! Layering follows the data flow:
//! `GameSession::apply_user_move` → validate → ledger append →
//! reconstruct → `EngineTransport::send_move` → engine reply append →
//! reconstruct.

pub mod config;
pub mod domain;
pub mod error;
pub mod models;

pub use config::{ClientConfig, DEFAULT_RATING};
pub use domain::{CanonicalMove, GameOverReason, MoveLedger, ProposedMove};
pub use error::{GameError, RemoteError};
pub use models::{EngineReply, EngineTransport, ExchangeOutcome, GameSession, GameStatus, HttpEngine, SessionId};
