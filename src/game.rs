use std::{fmt, str::FromStr};

use serde::Serialize;

/// A title that SHiFT codes can be scraped for.
///
/// `None` is a sentinel meaning "no game" and is never used as a real key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    None,
    Bl2,
    Blps,
}

impl Game {
    pub const ALL: [Game; 2] = [Game::Bl2, Game::Blps];

    pub fn is_none(self) -> bool {
        self == Game::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Game::None => "none",
            Game::Bl2 => "bl2",
            Game::Blps => "blps",
        }
    }
}

/// A distribution platform a code can be redeemed on.
///
/// `None` is a sentinel, like [`Game::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    None,
    Pc,
    Ps,
    Xbox,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Pc, Platform::Ps, Platform::Xbox];

    pub fn is_none(self) -> bool {
        self == Platform::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::None => "none",
            Platform::Pc => "pc",
            Platform::Ps => "ps",
            Platform::Xbox => "xbox",
        }
    }

    /// Slot of this platform in a parser's per-platform buckets.
    pub fn bucket_index(self) -> Option<usize> {
        match self {
            Platform::None => None,
            Platform::Pc => Some(0),
            Platform::Ps => Some(1),
            Platform::Xbox => Some(2),
        }
    }

    /// Recognises the platform named by a code table column header,
    /// e.g. "PC / Mac", "PlayStation 3" or "Xbox 360".
    pub fn from_column_header(header: &str) -> Option<Platform> {
        let header = header.to_lowercase();
        let tokens: Vec<&str> = header
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|token| !token.is_empty())
            .collect();

        if tokens.iter().any(|token| token.starts_with("xbox")) {
            return Some(Platform::Xbox);
        }
        if tokens.iter().any(|token| {
            token.starts_with("playstation")
                || *token == "psn"
                || token
                    .strip_prefix("ps")
                    .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
        }) {
            return Some(Platform::Ps);
        }
        if tokens
            .iter()
            .any(|token| matches!(*token, "pc" | "mac" | "steam" | "windows"))
        {
            return Some(Platform::Pc);
        }
        None
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Game {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bl2" | "borderlands2" => Ok(Game::Bl2),
            "blps" | "tps" | "presequel" => Ok(Game::Blps),
            other => Err(anyhow::anyhow!("unknown game: {}", other)),
        }
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pc" | "steam" => Ok(Platform::Pc),
            "ps" | "playstation" => Ok(Platform::Ps),
            "xbox" => Ok(Platform::Xbox),
            other => Err(anyhow::anyhow!("unknown platform: {}", other)),
        }
    }
}
