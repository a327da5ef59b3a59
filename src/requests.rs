use log::debug;
use reqwest::{Client, ClientBuilder, Response};

use crate::{config::ScrapingConfig, error::ScrapeError, ratelimit::RateLimiter};

/// The shared network resource: one HTTP client used by every parser.
pub struct RequestClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl RequestClient {
    pub fn new(config: &ScrapingConfig) -> Result<Self, ScrapeError> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;
        let rate_limiter = RateLimiter::new();
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    pub async fn fetch_url_response(&self, url: &str) -> Result<Response, ScrapeError> {
        // Wait (non-blocking) until we're allowed to make a request according
        // to our self-imposed rate-limiting policy.
        self.rate_limiter.wait_until_ready().await;

        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    pub async fn fetch_url_body(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.fetch_url_response(url).await?;
        let body = response.text().await?;
        Ok(body)
    }
}
