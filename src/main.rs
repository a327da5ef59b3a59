use std::collections::BTreeMap;

use anyhow::Context;
use chrono::Utc;
use dotenv::dotenv;
use log::{LevelFilter, error, info};
use shiftscraper::{
    Bl2Parser, BlpsParser, CodeParser, Game, ParserRegistry, Platform, ScrapingContext, ShiftCode,
    ShiftCollection,
};

extern crate env_logger;
extern crate log;

type CodesByPlatform = BTreeMap<Platform, Vec<ShiftCode>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let only_game = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<Game>())
        .transpose()?;

    let context = ScrapingContext::new().context("failed to set up the scraping context")?;
    let mut registry = ParserRegistry::new(Platform::ALL.to_vec());
    // The registry only holds weak handles; keep the parsers alive here.
    let _bl2 = Bl2Parser::new(&mut registry, &context)?;
    let _blps = BlpsParser::new(&mut registry, &context)?;

    let today = Utc::now().date_naive();
    let mut output: BTreeMap<Game, CodesByPlatform> = BTreeMap::new();

    for (game, platform) in registry.keys() {
        if only_game.is_some_and(|only| only != game) {
            continue;
        }
        let Some(parser) = registry.parser(game, platform) else {
            continue;
        };

        // Only the first registration of each parser fetches; spam protection
        // serves the others from the parser's buckets.
        let mut coll = ShiftCollection::new();
        if let Err(e) = parser.parse_keys_throttled(&mut coll).await {
            error!("no {} codes for {}: {}", game, platform, e);
            continue;
        }

        let codes: Vec<ShiftCode> = coll
            .unexpired(today)
            .filter(|code| code.game == game && code.platform == platform)
            .cloned()
            .collect();
        info!("{} unexpired {} codes for {}", codes.len(), game, platform);
        output.entry(game).or_default().insert(platform, codes);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
