use std::sync::{Arc, Weak};

use futures::{FutureExt, future::BoxFuture};
use log::{debug, info};

use crate::{
    error::ScrapeError,
    game::{Game, Platform},
    ratelimit::SpamGuard,
    registry::{Icon, ParserHost},
    shift_collection::ShiftCollection,
};

/// A source of SHiFT codes.
///
/// Implementors fetch and parse a source in [`CodeParser::parse_keys`]; the
/// spam-protected entry point [`CodeParser::parse_keys_throttled`] is
/// provided on top of it.
pub trait CodeParser: Send + Sync {
    /// Throttle shared by every registration of this parser instance.
    fn spam_guard(&self) -> &SpamGuard;

    /// Parse keys and add them to `coll`, without spam protection.
    ///
    /// Always fetches. Returns the number of codes added; on error `coll` is
    /// left untouched.
    fn parse_keys<'a>(
        &'a self,
        coll: &'a mut ShiftCollection,
    ) -> BoxFuture<'a, Result<usize, ScrapeError>>;

    /// Add the result of the last successful fetch to `coll` without any
    /// network I/O.
    fn cached_keys<'a>(&'a self, coll: &'a mut ShiftCollection) -> BoxFuture<'a, usize>;

    /// Parse keys and add them to `coll`, with spam protection: within the
    /// guard's window only the first call fetches, later ones are served from
    /// the last result.
    fn parse_keys_throttled<'a>(
        &'a self,
        coll: &'a mut ShiftCollection,
    ) -> BoxFuture<'a, Result<usize, ScrapeError>> {
        async move {
            if self.spam_guard().try_acquire() {
                self.parse_keys(coll).await
            } else {
                debug!("serving cached codes instead of fetching");
                Ok(self.cached_keys(coll).await)
            }
        }
        .boxed()
    }
}

/// Registers `parser` on `host` for every combination of the given games and
/// platforms.
///
/// Icons are handed out per game, in order: the n-th real game gets the n-th
/// icon (or the empty icon once they run out) for all of its platforms.
/// `Game::None` and `Platform::None` entries are skipped and consume no icon.
/// Returns the number of registrations made.
pub fn register_parser<H, P>(
    host: &mut H,
    parser: &Arc<P>,
    games: &[Game],
    platforms: &[Platform],
    icons: &[Icon],
) -> usize
where
    H: ParserHost + ?Sized,
    P: CodeParser + 'static,
{
    let handle: Weak<dyn CodeParser> = Arc::downgrade(parser) as Weak<dyn CodeParser>;
    let mut icons = icons.iter();
    let mut registered = 0;

    for &game in games.iter().filter(|game| !game.is_none()) {
        let icon = icons.next().cloned().unwrap_or_default();
        for &platform in platforms.iter().filter(|platform| !platform.is_none()) {
            host.register_parser(game, platform, handle.clone(), icon.clone());
            registered += 1;
        }
    }

    info!("registered parser for {} game/platform combination(s)", registered);
    registered
}

/// Registers `parser` for a single game and platform.
pub fn register_single<H, P>(
    host: &mut H,
    parser: &Arc<P>,
    game: Game,
    platform: Platform,
    icon: Option<Icon>,
) -> usize
where
    H: ParserHost + ?Sized,
    P: CodeParser + 'static,
{
    let icons: Vec<Icon> = icon.into_iter().collect();
    register_parser(host, parser, &[game], &[platform], &icons)
}
