//! Client configuration and ambient defaults.
//!
//! The two defaults the UI used to bury in event handlers live here
//! instead: the fallback ELO for session start, and the backend URL.
//! (The queen-promotion default is part of move validation, see
//! `domain::validate`.)

use std::time::Duration;

/// Rating used when the caller provides no (or an unparsable) ELO.
pub const DEFAULT_RATING: u32 = 1200;

/// Configuration for the engine backend client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the engine backend, without the `/api` prefix.
    pub base_url: String,
    /// Rating used by `start` when none is given.
    pub default_rating: u32,
    /// Per-request timeout. Engine replies are usually fast at client
    /// strength settings, but leave headroom for cold starts.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            default_rating: DEFAULT_RATING,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parse a user-supplied rating, falling back to the configured
    /// default when the input is empty or not a number.
    pub fn rating_from_input(&self, input: &str) -> u32 {
        input.trim().parse().unwrap_or(self.default_rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_falls_back_to_default() {
        let config = ClientConfig::default();
        assert_eq!(config.rating_from_input(""), 1200);
        assert_eq!(config.rating_from_input("grandmaster"), 1200);
        assert_eq!(config.rating_from_input("1500"), 1500);
        assert_eq!(config.rating_from_input(" 1800 "), 1800);
    }
}
