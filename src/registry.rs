use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use log::debug;

use crate::{
    code_parser::CodeParser,
    game::{Game, Platform},
};

/// Name of an icon resource shown next to a registered parser. The default
/// icon is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Icon(String);

impl Icon {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn for_game(game: Game) -> Self {
        match game {
            Game::None => Self::default(),
            Game::Bl2 => Self::new("bl2"),
            Game::Blps => Self::new("blps"),
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The window parsers register themselves with.
pub trait ParserHost {
    /// Platforms the host offers parsers for.
    fn supported_platforms(&self) -> Vec<Platform>;

    fn register_parser(
        &mut self,
        game: Game,
        platform: Platform,
        parser: Weak<dyn CodeParser>,
        icon: Icon,
    );
}

pub struct Registration {
    pub parser: Weak<dyn CodeParser>,
    pub icon: Icon,
}

/// Maps (game, platform) to the parser serving it. Parsers are held weakly;
/// their owner must keep them alive.
pub struct ParserRegistry {
    platforms: Vec<Platform>,
    registrations: HashMap<(Game, Platform), Registration>,
}

impl ParserRegistry {
    pub fn new(platforms: Vec<Platform>) -> Self {
        Self {
            platforms,
            registrations: HashMap::new(),
        }
    }

    pub fn parser(&self, game: Game, platform: Platform) -> Option<Arc<dyn CodeParser>> {
        self.registrations
            .get(&(game, platform))
            .and_then(|registration| registration.parser.upgrade())
    }

    pub fn icon(&self, game: Game, platform: Platform) -> Option<&Icon> {
        self.registrations
            .get(&(game, platform))
            .map(|registration| &registration.icon)
    }

    /// Registered combinations, sorted.
    pub fn keys(&self) -> Vec<(Game, Platform)> {
        let mut keys: Vec<_> = self.registrations.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl ParserHost for ParserRegistry {
    fn supported_platforms(&self) -> Vec<Platform> {
        self.platforms.clone()
    }

    fn register_parser(
        &mut self,
        game: Game,
        platform: Platform,
        parser: Weak<dyn CodeParser>,
        icon: Icon,
    ) {
        if game.is_none() || platform.is_none() {
            return;
        }
        let previous = self
            .registrations
            .insert((game, platform), Registration { parser, icon });
        if previous.is_some() {
            debug!("replaced parser registered for {}/{}", game, platform);
        }
    }
}
