//! Move validation: origin/target squares in, canonical SAN out.
//!
//! A proposed move is matched against the legal moves of the current
//! position. Castling is expressed the way a player drags the king: to
//! its destination square (g- or c-file). A pawn reaching the last rank
//! with no promotion piece specified promotes to a queen; that default
//! is part of this contract, not something the caller has to know.
//!
//! This is a pure domain module with no I/O dependencies.

use shakmaty::san::San;
use shakmaty::{Chess, File, Move, Position, Rank, Role, Square};

use crate::domain::board::terminal_status;
use crate::error::GameError;

/// A move as proposed by the user: squares plus an optional promotion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProposedMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl ProposedMove {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Parse coordinate notation like "e2e4" or "e7e8q".
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if !input.is_ascii() || input.len() < 4 || input.len() > 5 {
            return None;
        }
        let from: Square = input[0..2].parse().ok()?;
        let to: Square = input[2..4].parse().ok()?;
        let promotion = match &input[4..] {
            "" => None,
            "q" => Some(Role::Queen),
            "r" => Some(Role::Rook),
            "b" => Some(Role::Bishop),
            "n" => Some(Role::Knight),
            _ => return None,
        };
        Some(Self {
            from,
            to,
            promotion,
        })
    }
}

impl std::fmt::Display for ProposedMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

/// The validated form of a move: the SAN string stored in the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalMove {
    pub san: String,
}

/// Check a proposed move against a position and return its canonical
/// notation.
pub fn validate(position: &Chess, proposed: &ProposedMove) -> Result<CanonicalMove, GameError> {
    let mv_text = proposed.to_string();

    if let Some(reason) = terminal_status(position) {
        return Err(GameError::illegal(
            mv_text,
            format!("the game ended in {reason}"),
        ));
    }

    match position.board().piece_at(proposed.from) {
        None => {
            return Err(GameError::illegal(
                mv_text,
                format!("no piece on {}", proposed.from),
            ));
        }
        Some(piece) if piece.color != position.turn() => {
            return Err(GameError::illegal(
                mv_text,
                format!("it is {}'s turn", side_name(position.turn())),
            ));
        }
        Some(_) => {}
    }

    for m in &position.legal_moves() {
        let (move_from, move_to) = match m {
            Move::Normal { from, to, .. } => (*from, *to),
            Move::EnPassant { from, to, .. } => (*from, *to),
            Move::Castle { king, rook, .. } => {
                // The user drags the king to its destination (g1/g8 or c1/c8)
                let king_dest = if rook.file() == File::H {
                    Square::from_coords(File::G, rook.rank())
                } else {
                    Square::from_coords(File::C, rook.rank())
                };
                (*king, king_dest)
            }
            Move::Put { .. } => continue,
        };

        if move_from != proposed.from || move_to != proposed.to {
            continue;
        }

        let move_to_play = match m {
            Move::Normal {
                role: Role::Pawn,
                from,
                to,
                capture,
                promotion,
            } if to.rank() == Rank::Eighth || to.rank() == Rank::First => {
                // Queen unless the caller asked for an underpromotion.
                // Move generation yields one candidate per promotion
                // piece; skip the ones for other pieces.
                let wanted = proposed.promotion.unwrap_or(Role::Queen);
                if let Some(generated) = promotion {
                    if *generated != wanted {
                        continue;
                    }
                }
                Move::Normal {
                    role: Role::Pawn,
                    from: *from,
                    to: *to,
                    capture: *capture,
                    promotion: Some(wanted),
                }
            }
            _ => m.clone(),
        };

        // Canonical notation carries the check/mate suffix, matching
        // what the backend produces for its own moves.
        let mut san = San::from_move(position, move_to_play.clone()).to_string();
        let after = position
            .clone()
            .play(move_to_play)
            .expect("move came from legal_moves");
        if after.is_checkmate() {
            san.push('#');
        } else if after.is_check() {
            san.push('+');
        }
        return Ok(CanonicalMove { san });
    }

    Err(GameError::illegal(
        mv_text,
        "the piece cannot legally move there",
    ))
}

fn side_name(color: shakmaty::Color) -> &'static str {
    match color {
        shakmaty::Color::White => "White",
        shakmaty::Color::Black => "Black",
    }
}
