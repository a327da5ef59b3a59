use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use log::{info, warn};
use tokio::sync::Mutex;

use crate::{
    code_parser::{CodeParser, register_parser},
    error::ScrapeError,
    game::{Game, Platform},
    ratelimit::SpamGuard,
    registry::{Icon, ParserHost},
    requests::RequestClient,
    scraping_context::ScrapingContext,
    shift_collection::ShiftCollection,
    text_manipulators::CodeExtractor,
};

/// Parser for the Borderlands 2 and Pre-Sequel code pages.
///
/// Both pages keep one table column per platform; the codes of the last
/// fetch are kept in one bucket per platform (PC, PlayStation, Xbox).
pub struct Bl2nBlpsParser {
    game: Game,
    url: String,
    request_client: Arc<RequestClient>,
    code_extractor: Arc<CodeExtractor>,
    spam_guard: SpamGuard,
    // Held for the whole fetch, so one instance runs one fetch at a time.
    collections: Mutex<[ShiftCollection; 3]>,
}

impl Bl2nBlpsParser {
    /// Creates the parser for `game` and registers it on `host` for every
    /// platform the host supports.
    pub fn new<H: ParserHost + ?Sized>(
        host: &mut H,
        context: &ScrapingContext,
        game: Game,
    ) -> Result<Arc<Self>, ScrapeError> {
        let url = context
            .scraping_config
            .source_url(game)
            .ok_or(ScrapeError::UnsupportedGame(game))?
            .to_string();

        let parser = Arc::new(Self {
            game,
            url,
            request_client: Arc::clone(&context.request_client),
            code_extractor: Arc::clone(&context.code_extractor),
            spam_guard: SpamGuard::new(context.scraping_config.spam_window()),
            collections: Mutex::new(Default::default()),
        });

        let platforms = host.supported_platforms();
        register_parser(host, &parser, &[game], &platforms, &[Icon::for_game(game)]);
        Ok(parser)
    }

    pub fn game(&self) -> Game {
        self.game
    }

    /// Codes of the last successful fetch for `platform`.
    pub async fn codes_for(&self, platform: Platform) -> ShiftCollection {
        let Some(index) = platform.bucket_index() else {
            return ShiftCollection::new();
        };
        self.collections.lock().await[index].clone()
    }
}

impl CodeParser for Bl2nBlpsParser {
    fn spam_guard(&self) -> &SpamGuard {
        &self.spam_guard
    }

    fn parse_keys<'a>(
        &'a self,
        coll: &'a mut ShiftCollection,
    ) -> BoxFuture<'a, Result<usize, ScrapeError>> {
        async move {
            let mut collections = self.collections.lock().await;

            let body = match self.request_client.fetch_url_body(&self.url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("fetching {} codes from {} failed: {}", self.game, self.url, e);
                    return Err(e);
                }
            };

            *collections = self
                .code_extractor
                .extract_codes(&body, self.game, &self.url);

            let added: usize = collections
                .iter()
                .map(|bucket| coll.extend_from(bucket))
                .sum();
            info!(
                "parsed {} {} codes from {} ({} new)",
                collections.iter().map(ShiftCollection::len).sum::<usize>(),
                self.game,
                self.url,
                added
            );
            Ok(added)
        }
        .boxed()
    }

    fn cached_keys<'a>(&'a self, coll: &'a mut ShiftCollection) -> BoxFuture<'a, usize> {
        async move {
            let collections = self.collections.lock().await;
            collections
                .iter()
                .map(|bucket| coll.extend_from(bucket))
                .sum::<usize>()
        }
        .boxed()
    }
}

/// Borderlands 2 codes.
pub struct Bl2Parser;

impl Bl2Parser {
    pub fn new<H: ParserHost + ?Sized>(
        host: &mut H,
        context: &ScrapingContext,
    ) -> Result<Arc<Bl2nBlpsParser>, ScrapeError> {
        Bl2nBlpsParser::new(host, context, Game::Bl2)
    }
}

/// Borderlands: The Pre-Sequel codes.
pub struct BlpsParser;

impl BlpsParser {
    pub fn new<H: ParserHost + ?Sized>(
        host: &mut H,
        context: &ScrapingContext,
    ) -> Result<Arc<Bl2nBlpsParser>, ScrapeError> {
        Bl2nBlpsParser::new(host, context, Game::Blps)
    }
}
