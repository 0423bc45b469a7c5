pub mod board;
pub mod ledger;
pub mod validate;

pub use board::{GameOverReason, reconstruct, render, terminal_status};
pub use ledger::MoveLedger;
pub use validate::{CanonicalMove, ProposedMove, validate};
