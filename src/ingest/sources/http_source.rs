//! JSON feed source over HTTP

use crate::db::sqlite::{Domain, Record};
use crate::error::{AppError, Result};
use crate::ingest::RecordSource;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches a JSON array of records for one domain
pub struct HttpFeedSource {
    id: String,
    domain: Domain,
    url: Url,
    client: Client,
}

impl HttpFeedSource {
    pub fn new(domain: Domain, url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| AppError::Config(format!("Invalid {} feed URL '{}': {}", domain, url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            id: format!("http:{}", domain),
            domain,
            url,
            client,
        })
    }
}

#[async_trait]
impl RecordSource for HttpFeedSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> Domain {
        self.domain
    }

    async fn fetch(&self) -> Result<Vec<Record>> {
        debug!("Fetching {} feed from {}", self.domain, self.url);

        let body: serde_json::Value = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        decode_feed(self.domain, body)
    }
}

/// Decode a feed body.
///
/// A body that is not an array, or an element with missing or mistyped
/// fields, is a malformed response: the feed is treated as unavailable so
/// the chain falls through to its next source.
pub fn decode_feed(domain: Domain, body: serde_json::Value) -> Result<Vec<Record>> {
    match body {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                Record::from_value(domain, item).map_err(|e| {
                    AppError::SourceUnavailable(format!(
                        "{} feed element {} is malformed: {}",
                        domain, i, e
                    ))
                })
            })
            .collect(),
        other => Err(AppError::SourceUnavailable(format!(
            "{} feed returned {} instead of an array",
            domain,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
