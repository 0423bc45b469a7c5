pub mod remote;
pub mod session;

pub use remote::{EngineReply, EngineTransport, HttpEngine, SessionId};
pub use session::{ExchangeOutcome, GameSession, GameStatus};
