mod bl2_blps_parser;
mod code_parser;
mod error;
mod game;
mod ratelimit;
mod registry;
mod requests;
mod scraping_context;
mod shift_collection;
mod text_manipulators;

pub mod config;

pub use bl2_blps_parser::{Bl2Parser, Bl2nBlpsParser, BlpsParser};
pub use code_parser::{CodeParser, register_parser, register_single};
pub use error::ScrapeError;
pub use game::{Game, Platform};
pub use ratelimit::SpamGuard;
pub use registry::{Icon, ParserHost, ParserRegistry, Registration};
pub use requests::RequestClient;
pub use scraping_context::ScrapingContext;
pub use shift_collection::{ShiftCode, ShiftCollection};
pub use text_manipulators::{CodeExtractor, parse_expiry};
