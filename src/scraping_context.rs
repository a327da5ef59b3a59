use std::sync::Arc;

use crate::{
    config::ScrapingConfig, error::ScrapeError, requests::RequestClient,
    text_manipulators::CodeExtractor,
};

/// Everything parsers share: configuration, the one HTTP client and the
/// compiled page extractor. Handed to each parser at construction.
pub struct ScrapingContext {
    pub scraping_config: ScrapingConfig,
    pub request_client: Arc<RequestClient>,
    pub code_extractor: Arc<CodeExtractor>,
}

impl ScrapingContext {
    /// Loads the config from the environment.
    pub fn new() -> anyhow::Result<Self> {
        let scraping_config = ScrapingConfig::new()?;
        Self::with_config(scraping_config).map_err(Into::into)
    }

    pub fn with_config(scraping_config: ScrapingConfig) -> Result<Self, ScrapeError> {
        let request_client = Arc::new(RequestClient::new(&scraping_config)?);
        let code_extractor = Arc::new(CodeExtractor::new()?);
        Ok(ScrapingContext {
            scraping_config,
            request_client,
            code_extractor,
        })
    }
}
