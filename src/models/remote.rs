//! Engine backend client - manages the remote engine session.
//!
//! The backend owns the actual move search (Stockfish configured to an
//! ELO target); this module only covers the session lifecycle and the
//! move exchange. `EngineTransport` is the seam the game session talks
//! through, so tests can script an engine without a server.
//!
//! Ordering: at most one exchange may be in flight per session. That is
//! enforced structurally - every method takes `&mut self`, and the game
//! session is the single owner of the transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::RemoteError;

/// Opaque identifier for one remote game, issued on `start`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The engine's answer to a user move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineReply {
    /// The engine's reply move in SAN. Absent when the user's move
    /// already ended the game.
    pub san: Option<String>,
    /// Final result string when the backend declared the game over.
    pub result: Option<String>,
}

/// The request/response contract with the remote engine.
#[async_trait]
pub trait EngineTransport {
    /// Begin a remote session configured at the given strength. Must be
    /// called before any move is sent.
    async fn start(&mut self, rating: u32) -> Result<SessionId, RemoteError>;

    /// Transmit an accepted user move; the engine computes and returns
    /// its reply in the same notation.
    async fn send_move(&mut self, session: &SessionId, san: &str)
    -> Result<EngineReply, RemoteError>;

    /// Ask the remote side to pop its last recorded exchange so remote
    /// and local ledgers stay aligned.
    async fn undo(&mut self, session: &SessionId) -> Result<(), RemoteError>;

    /// Terminate the session.
    async fn end(&mut self, session: &SessionId) -> Result<(), RemoteError>;

    /// Free-text explanation of the current position, opaque to the core.
    async fn analysis(&mut self, session: &SessionId) -> Result<String, RemoteError>;
}

// Wire types, shaped after the backend's JSON.

#[derive(Debug, Deserialize)]
struct StartGameResponse {
    session_id: String,
    // The backend spells this one oddly
    #[serde(default, alias = "StockFish_Elo")]
    stockfish_elo: Option<u32>,
}

#[derive(Debug, Serialize)]
struct PlayMoveRequest<'a> {
    session_id: &'a str,
    #[serde(rename = "move")]
    san: &'a str,
}

#[derive(Debug, Deserialize)]
struct PlayMoveResponse {
    #[serde(default)]
    stockfish_san: Option<String>,
    #[serde(default)]
    result: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    analysis: String,
}

/// HTTP implementation of [`EngineTransport`] against the chess backend.
pub struct HttpEngine {
    http: reqwest::Client,
    base_url: String,
}

impl HttpEngine {
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{}/", self.base_url, endpoint)
    }

    /// Turn a non-success status into a `RemoteError`, keeping whatever
    /// detail the backend put in the body.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(RemoteError::Status {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

#[async_trait]
impl EngineTransport for HttpEngine {
    async fn start(&mut self, rating: u32) -> Result<SessionId, RemoteError> {
        let response = self
            .http
            .post(self.url("start_game"))
            .query(&[("user_elo", rating)])
            .send()
            .await?;
        let body: StartGameResponse = Self::check(response).await?.json().await?;
        info!(
            session_id = %body.session_id,
            engine_elo = ?body.stockfish_elo,
            "remote session started"
        );
        Ok(SessionId::new(body.session_id))
    }

    async fn send_move(
        &mut self,
        session: &SessionId,
        san: &str,
    ) -> Result<EngineReply, RemoteError> {
        debug!(%session, san, "sending move");
        let response = self
            .http
            .post(self.url("play_move"))
            .json(&PlayMoveRequest {
                session_id: session.as_str(),
                san,
            })
            .send()
            .await?;
        let body: PlayMoveResponse = Self::check(response).await?.json().await?;
        Ok(EngineReply {
            san: body.stockfish_san,
            result: body.result,
        })
    }

    async fn undo(&mut self, session: &SessionId) -> Result<(), RemoteError> {
        debug!(%session, "requesting remote undo");
        let response = self
            .http
            .post(self.url("undo_move"))
            .json(&SessionRequest {
                session_id: session.as_str(),
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn end(&mut self, session: &SessionId) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(self.url("end_game"))
            .json(&SessionRequest {
                session_id: session.as_str(),
            })
            .send()
            .await?;
        Self::check(response).await?;
        info!(%session, "remote session ended");
        Ok(())
    }

    async fn analysis(&mut self, session: &SessionId) -> Result<String, RemoteError> {
        let response = self
            .http
            .post(self.url("analysis"))
            .json(&SessionRequest {
                session_id: session.as_str(),
            })
            .send()
            .await?;
        let body: AnalysisResponse = Self::check(response).await?.json().await?;
        Ok(body.analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_move_response_with_reply() {
        let body = r#"{"message":"Move played","user_move":"e4","stockfish_san":"e5","board_fen":"..."}"#;
        let parsed: PlayMoveResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.stockfish_san.as_deref(), Some("e5"));
        assert_eq!(parsed.result, None);
    }

    #[test]
    fn test_play_move_response_game_over() {
        let body = r#"{"message":"Game over!","result":"1-0"}"#;
        let parsed: PlayMoveResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.stockfish_san, None);
        assert_eq!(parsed.result.as_deref(), Some("1-0"));
    }

    #[test]
    fn test_start_game_response() {
        let body = r#"{"message":"New game started","session_id":"abc123","StockFish_Elo":1500}"#;
        let parsed: StartGameResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.session_id, "abc123");
        assert_eq!(parsed.stockfish_elo, Some(1500));
    }

    #[test]
    fn test_play_move_request_shape() {
        let request = PlayMoveRequest {
            session_id: "abc",
            san: "Nf3",
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"session_id":"abc","move":"Nf3"}"#);
    }

    #[test]
    fn test_url_building() {
        let config = ClientConfig::new("http://localhost:8000/");
        let engine = HttpEngine::new(&config).unwrap();
        assert_eq!(engine.url("play_move"), "http://localhost:8000/api/play_move/");
    }
}
