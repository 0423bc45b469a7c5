//! The move ledger: the ordered record of every move played.
//!
//! This is the source of truth for game progress. The board is never
//! stored; it is always rebuilt by replaying the ledger (see
//! `domain::board`), so ledger order is semantically load-bearing.
//!
//! This is a pure domain module with no I/O dependencies.

use shakmaty::Color;

use crate::error::GameError;

/// An ordered sequence of moves in SAN, appended as the game progresses
/// and truncated on undo. Owned exclusively by the game session.
#[derive(Clone, Debug, Default)]
pub struct MoveLedger {
    moves: Vec<String>,
}

impl MoveLedger {
    /// Create an empty ledger (starting position, White to move).
    pub fn new() -> Self {
        Self { moves: Vec::new() }
    }

    /// Append one move. The caller must have validated it against the
    /// position the ledger currently reconstructs to.
    pub fn append(&mut self, san: String) {
        self.moves.push(san);
    }

    /// Remove the last `k` entries (undo/reset path).
    pub fn truncate(&mut self, k: usize) -> Result<(), GameError> {
        if k > self.moves.len() {
            return Err(GameError::InvalidUndo {
                requested: k,
                available: self.moves.len(),
            });
        }
        let new_len = self.moves.len() - k;
        self.moves.truncate(new_len);
        Ok(())
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Ply count (half-moves played).
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The recorded moves, in replay order.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// An immutable copy for reconstruction or display.
    pub fn snapshot(&self) -> Vec<String> {
        self.moves.clone()
    }

    /// Side to move, derived from ply parity: an even count means White
    /// (the human side) is to move, odd means Black (the engine).
    pub fn side_to_move(&self) -> Color {
        if self.moves.len() % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// The last recorded move, if any.
    pub fn last(&self) -> Option<&str> {
        self.moves.last().map(String::as_str)
    }

    /// Format the ledger as numbered move pairs, e.g. "1. e4 e5 2. Nf3".
    pub fn numbered(&self) -> String {
        let mut out = String::new();
        for (ply, san) in self.moves.iter().enumerate() {
            if ply % 2 == 0 {
                if ply > 0 {
                    out.push(' ');
                }
                out.push_str(&format!("{}. {}", ply / 2 + 1, san));
            } else {
                out.push_str(&format!(" {}", san));
            }
        }
        out
    }
}
