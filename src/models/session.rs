//! Game session model - the application layer for one game against the
//! remote engine.
//!
//! The session is the single writer of the move ledger. Every mutating
//! method takes `&mut self`, which serializes move exchanges per session
//! without any locking: a second move cannot be submitted while one is
//! in flight.
//!
//! A user move is an atomic exchange: it is staged locally, sent to the
//! remote engine, and only committed once the engine acknowledged it.
//! If the transport fails, the staged move is rolled back so local and
//! remote ledgers never diverge over a move the remote never saw.

use shakmaty::{Chess, Color};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_RATING;
use crate::domain::board::{GameOverReason, reconstruct, terminal_status};
use crate::domain::ledger::MoveLedger;
use crate::domain::validate::{ProposedMove, validate};
use crate::error::GameError;
use crate::models::remote::{EngineTransport, SessionId};

/// Lifecycle of a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Over(GameOverReason),
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::NotStarted => write!(f, "not started"),
            GameStatus::InProgress => write!(f, "in progress"),
            GameStatus::Over(reason) => write!(f, "over ({reason})"),
        }
    }
}

/// The result of one completed user/engine exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeOutcome {
    /// The user's move as stored in the ledger.
    pub user_san: String,
    /// The engine's reply, absent when the user's move ended the game.
    pub engine_san: Option<String>,
    /// Session status after the exchange.
    pub status: GameStatus,
}

/// One game against the remote engine: ledger, remote session handle,
/// and lifecycle state.
pub struct GameSession<T: EngineTransport> {
    transport: T,
    ledger: MoveLedger,
    session_id: Option<SessionId>,
    rating: u32,
    status: GameStatus,
    /// A user move that has been appended locally but not yet
    /// acknowledged by the remote engine.
    pending_exchange: Option<String>,
}

impl<T: EngineTransport> GameSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            ledger: MoveLedger::new(),
            session_id: None,
            rating: DEFAULT_RATING,
            status: GameStatus::NotStarted,
            pending_exchange: None,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn ledger(&self) -> &MoveLedger {
        &self.ledger
    }

    pub fn rating(&self) -> u32 {
        self.rating
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// A staged user move awaiting remote acknowledgment, if any.
    pub fn pending_exchange(&self) -> Option<&str> {
        self.pending_exchange.as_deref()
    }

    /// The current board, rebuilt by replaying the ledger.
    pub fn board(&self) -> Result<Chess, GameError> {
        reconstruct(self.ledger.moves())
    }

    /// Begin a new game. Allocates a remote session at the given
    /// strength (falling back to the configured default rating) and
    /// resets the ledger.
    pub async fn start(&mut self, rating: Option<u32>) -> Result<(), GameError> {
        if self.status == GameStatus::InProgress {
            return Err(GameError::AlreadyStarted);
        }
        let rating = rating.unwrap_or(DEFAULT_RATING);
        let session_id = self.transport.start(rating).await?;
        info!(%session_id, rating, "game started");
        self.ledger.clear();
        self.session_id = Some(session_id);
        self.rating = rating;
        self.status = GameStatus::InProgress;
        self.pending_exchange = None;
        Ok(())
    }

    /// Play one user move and collect the engine's reply.
    ///
    /// Validation happens against the replayed board before anything is
    /// sent. On transport failure the staged move is rolled back and the
    /// error surfaced; the ledger is unchanged.
    pub async fn apply_user_move(
        &mut self,
        proposed: &ProposedMove,
    ) -> Result<ExchangeOutcome, GameError> {
        let session_id = match self.status {
            GameStatus::NotStarted => return Err(GameError::NotStarted),
            GameStatus::Over(reason) => {
                return Err(GameError::illegal(
                    proposed.to_string(),
                    format!("the game ended in {reason}"),
                ));
            }
            GameStatus::InProgress => self
                .session_id
                .clone()
                .ok_or(GameError::NotStarted)?,
        };

        // The user plays White; an odd ply count means the engine's
        // reply is still outstanding.
        if self.ledger.side_to_move() != Color::White {
            return Err(GameError::illegal(
                proposed.to_string(),
                "waiting for the engine's reply",
            ));
        }

        let board = reconstruct(self.ledger.moves())?;
        let canonical = validate(&board, proposed)?;
        let user_san = canonical.san;

        // Stage the move; commit only on remote acknowledgment.
        self.ledger.append(user_san.clone());
        self.pending_exchange = Some(user_san.clone());
        debug!(san = %user_san, ply = self.ledger.len(), "user move staged");

        let reply = match self.transport.send_move(&session_id, &user_san).await {
            Ok(reply) => reply,
            Err(err) => {
                self.ledger
                    .truncate(1)
                    .expect("staged move present in ledger");
                self.pending_exchange = None;
                warn!(error = %err, san = %user_san, "move not acknowledged; staged move rolled back");
                return Err(err.into());
            }
        };
        self.pending_exchange = None;

        let engine_san = reply.san;
        if let Some(san) = &engine_san {
            debug!(san = %san, "engine replied");
            self.ledger.append(san.clone());
        }

        // Full replay after the exchange; this both verifies the engine's
        // reply and drives the status transition.
        let board = reconstruct(self.ledger.moves())?;
        if let Some(reason) = terminal_status(&board) {
            info!(%reason, result = ?reply.result, "game over");
            self.status = GameStatus::Over(reason);
        }

        Ok(ExchangeOutcome {
            user_san,
            engine_san,
            status: self.status,
        })
    }

    /// Undo the last completed exchange (user move plus engine reply).
    ///
    /// Removes up to two trailing plies so parity returns to "user to
    /// move", reconstructs the board, and asks the remote side to pop
    /// its record too. A remote failure is surfaced but the local
    /// truncation stands: local state is authoritative for replay.
    /// Undoing out of a terminal position resumes play.
    pub async fn undo_last_exchange(&mut self) -> Result<usize, GameError> {
        let Some(session_id) = self.session_id.clone() else {
            return Err(GameError::NotStarted);
        };

        // An odd ply count means the user's last move has no reply
        // (it ended the game, or the reply never arrived); removing it
        // alone restores "user to move" parity.
        let removed = match self.ledger.len() {
            0 => 0,
            n if n % 2 == 1 => 1,
            _ => 2,
        };
        if removed == 0 {
            debug!("nothing to undo");
            return Ok(0);
        }
        self.ledger.truncate(removed)?;
        reconstruct(self.ledger.moves())?;
        self.status = GameStatus::InProgress;

        if let Err(err) = self.transport.undo(&session_id).await {
            warn!(error = %err, "remote undo failed; local truncation kept");
            return Err(err.into());
        }
        info!(removed, ply = self.ledger.len(), "undid last exchange");
        Ok(removed)
    }

    /// Terminate the game and return to `NotStarted`.
    ///
    /// Safe to call at any time: with no live remote session this is a
    /// no-op success. Local teardown happens regardless of the remote
    /// outcome; a remote failure is surfaced for reporting only.
    pub async fn end(&mut self) -> Result<(), GameError> {
        self.ledger.clear();
        self.status = GameStatus::NotStarted;
        self.pending_exchange = None;

        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };
        if let Err(err) = self.transport.end(&session_id).await {
            warn!(error = %err, %session_id, "remote end failed; local session discarded anyway");
            return Err(err.into());
        }
        Ok(())
    }

    /// Alias for [`end`](Self::end); the UI exposes both controls.
    pub async fn reset(&mut self) -> Result<(), GameError> {
        self.end().await
    }

    /// Fetch a natural-language analysis of the current position from
    /// the backend. Opaque to the core.
    pub async fn analysis(&mut self) -> Result<String, GameError> {
        let Some(session_id) = self.session_id.clone() else {
            return Err(GameError::NotStarted);
        };
        Ok(self.transport.analysis(&session_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::models::remote::EngineReply;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use shakmaty::Position;
    use std::collections::VecDeque;

    /// Transport double that serves scripted replies and counts calls.
    struct ScriptedEngine {
        move_replies: VecDeque<Result<EngineReply, RemoteError>>,
        fail_undo: bool,
        start_calls: usize,
        undo_calls: usize,
        end_calls: usize,
    }

    impl ScriptedEngine {
        fn new() -> Self {
            Self {
                move_replies: VecDeque::new(),
                fail_undo: false,
                start_calls: 0,
                undo_calls: 0,
                end_calls: 0,
            }
        }

        fn with_replies(sans: &[&str]) -> Self {
            let mut engine = Self::new();
            for san in sans {
                engine.move_replies.push_back(Ok(EngineReply {
                    san: Some(san.to_string()),
                    result: None,
                }));
            }
            engine
        }

        fn unavailable() -> RemoteError {
            RemoteError::Status {
                status: 503,
                detail: "engine unavailable".to_string(),
            }
        }
    }

    #[async_trait]
    impl EngineTransport for ScriptedEngine {
        async fn start(&mut self, _rating: u32) -> Result<SessionId, RemoteError> {
            self.start_calls += 1;
            Ok(SessionId::new(format!("session-{}", self.start_calls)))
        }

        async fn send_move(
            &mut self,
            _session: &SessionId,
            _san: &str,
        ) -> Result<EngineReply, RemoteError> {
            self.move_replies
                .pop_front()
                .expect("unscripted send_move call")
        }

        async fn undo(&mut self, _session: &SessionId) -> Result<(), RemoteError> {
            self.undo_calls += 1;
            if self.fail_undo {
                Err(Self::unavailable())
            } else {
                Ok(())
            }
        }

        async fn end(&mut self, _session: &SessionId) -> Result<(), RemoteError> {
            self.end_calls += 1;
            Ok(())
        }

        async fn analysis(&mut self, _session: &SessionId) -> Result<String, RemoteError> {
            Ok("Develop your pieces and castle early.".to_string())
        }
    }

    fn proposed(s: &str) -> ProposedMove {
        ProposedMove::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_start_play_undo_scenario() {
        let mut session = GameSession::new(ScriptedEngine::with_replies(&["e5"]));

        session.start(Some(1500)).await.unwrap();
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.rating(), 1500);
        assert!(session.ledger().is_empty());

        let outcome = session.apply_user_move(&proposed("e2e4")).await.unwrap();
        assert_eq!(outcome.user_san, "e4");
        assert_eq!(outcome.engine_san.as_deref(), Some("e5"));
        assert_eq!(session.ledger().moves(), &["e4".to_string(), "e5".to_string()]);

        // The white pawn actually advanced
        let board = session.board().unwrap();
        let e4: shakmaty::Square = "e4".parse().unwrap();
        assert!(board.board().piece_at(e4).is_some());

        let removed = session.undo_last_exchange().await.unwrap();
        assert_eq!(removed, 2);
        assert!(session.ledger().is_empty());
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.board().unwrap().board(), Chess::default().board());
    }

    #[tokio::test]
    async fn test_move_before_start_rejected() {
        let mut session = GameSession::new(ScriptedEngine::new());
        let err = session.apply_user_move(&proposed("e2e4")).await.unwrap_err();
        assert!(matches!(err, GameError::NotStarted));
    }

    #[tokio::test]
    async fn test_start_while_in_progress_rejected() {
        let mut session = GameSession::new(ScriptedEngine::with_replies(&[]));
        session.start(None).await.unwrap();
        assert_eq!(session.rating(), DEFAULT_RATING);
        let err = session.start(Some(2000)).await.unwrap_err();
        assert!(matches!(err, GameError::AlreadyStarted));
    }

    #[tokio::test]
    async fn test_failed_send_rolls_back_staged_move() {
        let mut engine = ScriptedEngine::new();
        engine.move_replies.push_back(Err(ScriptedEngine::unavailable()));
        let mut session = GameSession::new(engine);

        session.start(None).await.unwrap();
        let err = session.apply_user_move(&proposed("e2e4")).await.unwrap_err();
        assert!(matches!(err, GameError::RemoteSync(_)));

        // Staged move was rolled back; nothing diverged.
        assert!(session.ledger().is_empty());
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.pending_exchange(), None);
        assert_eq!(session.board().unwrap().board(), Chess::default().board());
    }

    #[tokio::test]
    async fn test_engine_reply_can_end_the_game() {
        // Fool's mate: the engine delivers checkmate on its second reply.
        let mut session = GameSession::new(ScriptedEngine::with_replies(&["e5", "Qh4#"]));
        session.start(None).await.unwrap();

        session.apply_user_move(&proposed("f2f3")).await.unwrap();
        let outcome = session.apply_user_move(&proposed("g2g4")).await.unwrap();
        assert_eq!(outcome.engine_san.as_deref(), Some("Qh4#"));
        assert_eq!(outcome.status, GameStatus::Over(GameOverReason::Checkmate));
        assert_eq!(session.status(), GameStatus::Over(GameOverReason::Checkmate));

        // No further moves are accepted.
        let err = session.apply_user_move(&proposed("a2a3")).await.unwrap_err();
        assert!(matches!(err, GameError::IllegalMove { .. }));
    }

    #[tokio::test]
    async fn test_user_move_can_end_the_game() {
        // Scholar's mate: no engine reply when the user's move mates.
        let mut engine = ScriptedEngine::with_replies(&["e5", "Nc6", "Nf6"]);
        engine.move_replies.push_back(Ok(EngineReply {
            san: None,
            result: Some("1-0".to_string()),
        }));
        let mut session = GameSession::new(engine);
        session.start(None).await.unwrap();

        session.apply_user_move(&proposed("e2e4")).await.unwrap();
        session.apply_user_move(&proposed("f1c4")).await.unwrap();
        session.apply_user_move(&proposed("d1h5")).await.unwrap();
        let outcome = session.apply_user_move(&proposed("h5f7")).await.unwrap();

        assert_eq!(outcome.user_san, "Qxf7#");
        assert_eq!(outcome.engine_san, None);
        assert_eq!(outcome.status, GameStatus::Over(GameOverReason::Checkmate));
        assert_eq!(session.ledger().len(), 7);
    }

    #[tokio::test]
    async fn test_undo_out_of_terminal_position_resumes_play() {
        let mut session = GameSession::new(ScriptedEngine::with_replies(&["e5", "Qh4#"]));
        session.start(None).await.unwrap();
        session.apply_user_move(&proposed("f2f3")).await.unwrap();
        session.apply_user_move(&proposed("g2g4")).await.unwrap();
        assert!(matches!(session.status(), GameStatus::Over(_)));

        let removed = session.undo_last_exchange().await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.ledger().moves(), &["f3".to_string(), "e5".to_string()]);
    }

    #[tokio::test]
    async fn test_undo_after_own_mating_move_removes_one_ply() {
        let mut engine = ScriptedEngine::with_replies(&["e5", "Nc6", "Nf6"]);
        engine.move_replies.push_back(Ok(EngineReply {
            san: None,
            result: Some("1-0".to_string()),
        }));
        let mut session = GameSession::new(engine);
        session.start(None).await.unwrap();
        for mv in ["e2e4", "f1c4", "d1h5", "h5f7"] {
            session.apply_user_move(&proposed(mv)).await.unwrap();
        }
        assert_eq!(session.ledger().len(), 7);

        // Only the unanswered mating move comes off; it is the user's
        // turn again.
        let removed = session.undo_last_exchange().await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(session.ledger().len(), 6);
        assert_eq!(session.ledger().side_to_move(), Color::White);
        assert_eq!(session.status(), GameStatus::InProgress);
    }

    #[tokio::test]
    async fn test_undo_single_trailing_ply() {
        // A lone user move (engine reply never recorded) undoes one ply.
        let mut session = GameSession::new(ScriptedEngine::new());
        session.start(None).await.unwrap();
        session.ledger.append("e4".to_string());

        let removed = session.undo_last_exchange().await.unwrap();
        assert_eq!(removed, 1);
        assert!(session.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_undo_with_empty_ledger_is_noop() {
        let mut session = GameSession::new(ScriptedEngine::new());
        session.start(None).await.unwrap();

        let removed = session.undo_last_exchange().await.unwrap();
        assert_eq!(removed, 0);
        // Remote side was never asked to undo
        assert_eq!(session.transport.undo_calls, 0);
    }

    #[tokio::test]
    async fn test_remote_undo_failure_keeps_local_truncation() {
        let mut engine = ScriptedEngine::with_replies(&["e5"]);
        engine.fail_undo = true;
        let mut session = GameSession::new(engine);
        session.start(None).await.unwrap();
        session.apply_user_move(&proposed("e2e4")).await.unwrap();

        let err = session.undo_last_exchange().await.unwrap_err();
        assert!(matches!(err, GameError::RemoteSync(_)));
        // Optimistic-local: the truncation is not rolled back.
        assert!(session.ledger().is_empty());
        assert_eq!(session.status(), GameStatus::InProgress);
    }

    #[tokio::test]
    async fn test_end_is_idempotent() {
        let mut session = GameSession::new(ScriptedEngine::new());
        session.start(None).await.unwrap();

        session.end().await.unwrap();
        assert_eq!(session.status(), GameStatus::NotStarted);
        assert!(session.session_id().is_none());

        // Second end is a local no-op success.
        session.end().await.unwrap();
        assert_eq!(session.transport.end_calls, 1);
    }

    #[tokio::test]
    async fn test_reset_clears_ledger_and_allows_restart() {
        let mut session = GameSession::new(ScriptedEngine::with_replies(&["e5"]));
        session.start(None).await.unwrap();
        session.apply_user_move(&proposed("e2e4")).await.unwrap();

        session.reset().await.unwrap();
        assert!(session.ledger().is_empty());
        assert_eq!(session.status(), GameStatus::NotStarted);

        session.start(Some(1800)).await.unwrap();
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.transport.start_calls, 2);
    }

    #[tokio::test]
    async fn test_analysis_requires_session() {
        let mut session = GameSession::new(ScriptedEngine::new());
        assert!(matches!(
            session.analysis().await.unwrap_err(),
            GameError::NotStarted
        ));

        session.start(None).await.unwrap();
        let text = session.analysis().await.unwrap();
        assert!(text.contains("castle"));
    }
}
