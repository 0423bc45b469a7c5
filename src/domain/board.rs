//! Board reconstruction by full replay of the move ledger.
//!
//! The board is derived state: `reconstruct` replays every recorded move
//! from the standard starting position through shakmaty's legality
//! checks. Recomputing from scratch on every mutation is deliberate:
//! an incrementally patched board could drift from the ledger across
//! undo and reset, and a ledger of realistic length replays cheaply.
//!
//! This is a pure domain module with no I/O dependencies.

use shakmaty::san::SanPlus;
use shakmaty::{Chess, Color, File, Position, Rank, Role, Square};

use crate::error::GameError;

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOverReason {
    Checkmate,
    Stalemate,
    Draw,
}

impl std::fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOverReason::Checkmate => write!(f, "checkmate"),
            GameOverReason::Stalemate => write!(f, "stalemate"),
            GameOverReason::Draw => write!(f, "draw"),
        }
    }
}

/// Replay a ledger snapshot from the starting position.
///
/// Every entry must be a legal SAN move in the position it is applied
/// to. A failure here means the ledger itself is corrupt, since validation
/// gates every append, so this is a consistency check rather than a
/// normal code path.
pub fn reconstruct(moves: &[String]) -> Result<Chess, GameError> {
    let mut position = Chess::default();
    for (ply, san_str) in moves.iter().enumerate() {
        position = apply_san(position, san_str).map_err(|reason| GameError::CorruptLedger {
            ply,
            san: san_str.clone(),
            reason,
        })?;
    }
    Ok(position)
}

/// Parse and play a single SAN move on a position. Check and mate
/// suffixes are accepted but not required.
fn apply_san(position: Chess, san_str: &str) -> Result<Chess, String> {
    let san: SanPlus = san_str
        .parse()
        .map_err(|e| format!("unparsable SAN: {e}"))?;
    let m = san
        .san
        .to_move(&position)
        .map_err(|e| format!("no matching legal move: {e}"))?;
    position.play(m).map_err(|e| format!("illegal move: {e}"))
}

/// Check whether a position is terminal, and why.
pub fn terminal_status(position: &Chess) -> Option<GameOverReason> {
    if position.is_checkmate() {
        Some(GameOverReason::Checkmate)
    } else if position.is_stalemate() {
        Some(GameOverReason::Stalemate)
    } else if position.is_insufficient_material() {
        Some(GameOverReason::Draw)
    } else {
        None
    }
}

/// Render a position as an ASCII diagram, White at the bottom.
/// Uppercase is White, lowercase is Black.
pub fn render(position: &Chess) -> String {
    let board = position.board();
    let mut out = String::new();
    for rank in (0..8u32).rev() {
        out.push_str(&format!("{} ", rank + 1));
        for file in 0..8u32 {
            let sq = Square::from_coords(File::new(file), Rank::new(rank));
            let c = match board.piece_at(sq) {
                Some(piece) => piece_char(piece),
                None => '.',
            };
            out.push(c);
            out.push(' ');
        }
        out.push('\n');
    }
    out.push_str("  a b c d e f g h\n");
    out
}

fn piece_char(piece: shakmaty::Piece) -> char {
    let c = match piece.role {
        Role::Pawn => 'p',
        Role::Knight => 'n',
        Role::Bishop => 'b',
        Role::Rook => 'r',
        Role::Queen => 'q',
        Role::King => 'k',
    };
    match piece.color {
        Color::White => c.to_ascii_uppercase(),
        Color::Black => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn moves(sans: &[&str]) -> Vec<String> {
        sans.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_ledger_is_starting_position() {
        let position = reconstruct(&[]).unwrap();
        assert_eq!(position.board(), Chess::default().board());
        assert_eq!(terminal_status(&position), None);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let ledger = moves(&["e4", "e5", "Nf3", "Nc6", "Bb5"]);
        let a = reconstruct(&ledger).unwrap();
        let b = reconstruct(&ledger).unwrap();
        assert_eq!(a.board(), b.board());
        assert_eq!(a.turn(), b.turn());
        assert_eq!(a.turn(), Color::Black);
    }

    #[test]
    fn test_illegal_entry_is_corrupt_ledger() {
        // No white knight can reach f6 from the starting squares
        let ledger = moves(&["e4", "e5", "Nf6"]);
        let err = reconstruct(&ledger).unwrap_err();
        match err {
            GameError::CorruptLedger { ply, san, .. } => {
                assert_eq!(ply, 2);
                assert_eq!(san, "Nf6");
            }
            other => panic!("expected CorruptLedger, got {other:?}"),
        }
    }

    #[test]
    fn test_unparsable_entry_is_corrupt_ledger() {
        let ledger = moves(&["e4", "not-a-move"]);
        assert!(matches!(
            reconstruct(&ledger),
            Err(GameError::CorruptLedger { ply: 1, .. })
        ));
    }

    #[test]
    fn test_scholars_mate_is_checkmate() {
        let ledger = moves(&["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"]);
        let position = reconstruct(&ledger).unwrap();
        assert_eq!(terminal_status(&position), Some(GameOverReason::Checkmate));
    }

    #[test]
    fn test_render_starting_position() {
        let diagram = render(&Chess::default());
        assert!(diagram.starts_with("8 r n b q k b n r"));
        assert!(diagram.contains("1 R N B Q K B N R"));
        assert!(diagram.ends_with("  a b c d e f g h\n"));
    }
}
