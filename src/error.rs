use crate::game::Game;

/// Errors that can occur while fetching or parsing a code source.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("no code source known for game {0}")]
    UnsupportedGame(Game),

    #[error("invalid code pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid selector: {0}")]
    Selector(String),
}
