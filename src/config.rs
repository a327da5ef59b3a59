use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};

use crate::game::Game;

pub const DEFAULT_BL2_URL: &str = "https://orcz.com/Borderlands_2:_Golden_Key";
pub const DEFAULT_BLPS_URL: &str = "https://orcz.com/Borderlands_Pre-Sequel:_Shift_Codes";

/// The env vars (prefixed with `SHIFT_`) needed for scraping.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingConfig {
    #[serde(default = "default_bl2_url")]
    pub bl2_url: String,
    #[serde(default = "default_blps_url")]
    pub blps_url: String,
    // Minimum time between two real fetches of the same parser.
    #[serde(default = "default_spam_window_secs")]
    pub spam_window_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_bl2_url() -> String {
    DEFAULT_BL2_URL.to_string()
}

fn default_blps_url() -> String {
    DEFAULT_BLPS_URL.to_string()
}

fn default_spam_window_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            bl2_url: default_bl2_url(),
            blps_url: default_blps_url(),
            spam_window_secs: default_spam_window_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ScrapingConfig {
    pub fn new() -> anyhow::Result<Self> {
        Self::load_from_env()
    }

    /// The fixed page codes for `game` are scraped from.
    pub fn source_url(&self, game: Game) -> Option<&str> {
        match game {
            Game::Bl2 => Some(&self.bl2_url),
            Game::Blps => Some(&self.blps_url),
            Game::None => None,
        }
    }

    pub fn spam_window(&self) -> Duration {
        Duration::from_secs(self.spam_window_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

const ENV_PREFIX: &str = "SHIFT_";

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<Self>()
            .context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
