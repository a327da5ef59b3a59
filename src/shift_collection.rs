use chrono::NaiveDate;
use serde::Serialize;

use crate::game::{Game, Platform};

/// A single scraped SHiFT code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftCode {
    pub code: String,
    pub game: Game,
    pub platform: Platform,
    pub reward: String,
    pub expires: Option<NaiveDate>,
    // URL of the page the code was scraped from.
    pub source: String,
}

impl ShiftCode {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires.is_some_and(|expires| expires < today)
    }
}

/// Ordered, append-only accumulator of scraped codes.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ShiftCollection {
    codes: Vec<ShiftCode>,
}

impl ShiftCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `code` unless the same code is already held for the same
    /// game and platform. Returns whether it was added.
    pub fn push(&mut self, code: ShiftCode) -> bool {
        let duplicate = self.codes.iter().any(|held| {
            held.code == code.code && held.game == code.game && held.platform == code.platform
        });
        if duplicate {
            return false;
        }
        self.codes.push(code);
        true
    }

    pub fn extend_from(&mut self, other: &ShiftCollection) -> usize {
        other
            .iter()
            .filter(|code| self.push((*code).clone()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShiftCode> {
        self.codes.iter()
    }

    pub fn for_platform(&self, platform: Platform) -> impl Iterator<Item = &ShiftCode> {
        self.codes.iter().filter(move |code| code.platform == platform)
    }

    pub fn for_game_and_platform(
        &self,
        game: Game,
        platform: Platform,
    ) -> impl Iterator<Item = &ShiftCode> {
        self.codes
            .iter()
            .filter(move |code| code.game == game && code.platform == platform)
    }

    /// Codes without a known expiry date are kept.
    pub fn unexpired(&self, today: NaiveDate) -> impl Iterator<Item = &ShiftCode> {
        self.codes.iter().filter(move |code| !code.is_expired(today))
    }
}

impl<'a> IntoIterator for &'a ShiftCollection {
    type Item = &'a ShiftCode;
    type IntoIter = std::slice::Iter<'a, ShiftCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.codes.iter()
    }
}
