use crate::config::toml_config::SourcesConfig;
use crate::utils::error::{PipelineError, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Shared GET client with the configured timeout, headers and retry policy.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    headers: HashMap<String, String>,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(sources: &SourcesConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(sources.timeout_seconds))
            .user_agent(concat!("statcast-career/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            headers: sources.headers.clone().unwrap_or_default(),
            retry_attempts: sources.retry_attempts.max(1),
            retry_delay: Duration::from_secs(sources.retry_delay_seconds),
        })
    }

    pub async fn get_bytes(&self, url: &str, query: &[(String, String)]) -> Result<Vec<u8>> {
        let mut attempt = 1;
        loop {
            match self.get_once(url, query).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    tracing::warn!(
                        "⚠️ Request to {} failed (attempt {}/{}): {}",
                        url,
                        attempt,
                        self.retry_attempts,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str, query: &[(String, String)]) -> Result<Vec<u8>> {
        let mut request = self.client.get(url).query(query);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        tracing::debug!("GET {} ({} query parameters)", url, query.len());
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(PipelineError::HttpStatusError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
