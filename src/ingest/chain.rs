//! Record sources and the ordered fallback chain

use crate::db::sqlite::{Domain, Record};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Anything that can produce a batch of records for one domain
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Identifier used in logs and batch reports (e.g. "static:markets")
    fn id(&self) -> &str;

    /// Domain of every record this source yields
    fn domain(&self) -> Domain;

    /// Acquire the current batch of records, without timestamps
    async fn fetch(&self) -> Result<Vec<Record>>;
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (1-based: the wait after the
    /// first failure is `delay_for(1)`)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Records obtained from the first source that succeeded
#[derive(Debug, Clone)]
pub struct Acquired {
    pub source: String,
    pub records: Vec<Record>,
}

/// Ordered list of sources for one domain.
///
/// Sources are tried in order; each attempt is bounded by `timeout` and
/// retried per `retry` when it fails for source reasons. Any other failure
/// moves straight on to the next source. The first success wins.
#[derive(Clone)]
pub struct SourceChain {
    domain: Domain,
    sources: Vec<Arc<dyn RecordSource>>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl SourceChain {
    pub fn new(domain: Domain, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            domain,
            sources: Vec::new(),
            timeout,
            retry,
        }
    }

    /// Append a fallback source
    pub fn with_source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    /// Fetch from the first source that succeeds
    pub async fn acquire(&self) -> Result<Acquired> {
        let mut failures = Vec::new();

        for source in &self.sources {
            if source.domain() != self.domain {
                return Err(AppError::Config(format!(
                    "Source {} yields {} records, chain expects {}",
                    source.id(),
                    source.domain(),
                    self.domain
                )));
            }

            let result = self
                .fetch_with_retry(source.as_ref())
                .await
                .and_then(|records| {
                    check_domain(self.domain, source.id(), &records)?;
                    Ok(records)
                });

            match result {
                Ok(records) => {
                    return Ok(Acquired {
                        source: source.id().to_string(),
                        records,
                    });
                }
                Err(e) => {
                    warn!("Source {} failed, trying next: {}", source.id(), e);
                    failures.push(format!("{}: {}", source.id(), e));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no sources configured".to_string());
        }
        Err(AppError::SourceUnavailable(format!(
            "{}: {}",
            self.domain,
            failures.join("; ")
        )))
    }

    async fn fetch_with_retry(&self, source: &dyn RecordSource) -> Result<Vec<Record>> {
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(self.timeout, source.fetch()).await {
                Ok(result) => result,
                Err(_) => Err(AppError::Timeout(format!(
                    "{} did not respond within {:?}",
                    source.id(),
                    self.timeout
                ))),
            };

            match result {
                Ok(records) => {
                    debug!("{} returned {} records on attempt {}", source.id(), records.len(), attempt);
                    return Ok(records);
                }
                Err(e) if e.is_source_failure() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        self.retry.max_attempts,
                        source.id(),
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn check_domain(domain: Domain, source: &str, records: &[Record]) -> Result<()> {
    if let Some(stray) = records.iter().find(|r| r.domain() != domain) {
        return Err(AppError::Validation(format!(
            "Source {} returned a {} record in a {} batch",
            source,
            stray.domain(),
            domain
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::MarketQuote;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakySource {
        id: String,
        failures_before_success: u32,
        calls: AtomicU32,
    }

    impl FlakySource {
        fn new(id: &str, failures_before_success: u32) -> Self {
            Self {
                id: id.to_string(),
                failures_before_success,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl RecordSource for FlakySource {
        fn id(&self) -> &str {
            &self.id
        }

        fn domain(&self) -> Domain {
            Domain::Markets
        }

        async fn fetch(&self) -> Result<Vec<Record>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                return Err(AppError::SourceUnavailable(format!("{} down", self.id)));
            }
            Ok(vec![Record::Market(MarketQuote {
                symbol: "SPX".into(),
                category: "equities".into(),
                name: "S&P 500".into(),
                value: 4500.0,
                timestamp: String::new(),
            })])
        }
    }

    struct HangingSource;

    #[async_trait]
    impl RecordSource for HangingSource {
        fn id(&self) -> &str {
            "hanging"
        }

        fn domain(&self) -> Domain {
            Domain::Markets
        }

        async fn fetch(&self) -> Result<Vec<Record>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct InvalidSource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl RecordSource for InvalidSource {
        fn id(&self) -> &str {
            "invalid"
        }

        fn domain(&self) -> Domain {
            Domain::Markets
        }

        async fn fetch(&self) -> Result<Vec<Record>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Validation("record missing symbol".into()))
        }
    }

    /// Feed whose body has an element without a symbol
    struct MalformedFeedSource;

    #[async_trait]
    impl RecordSource for MalformedFeedSource {
        fn id(&self) -> &str {
            "malformed-feed"
        }

        fn domain(&self) -> Domain {
            Domain::Markets
        }

        async fn fetch(&self) -> Result<Vec<Record>> {
            crate::ingest::sources::decode_feed(
                Domain::Markets,
                serde_json::json!([{"category": "equities", "name": "S&P 500", "value": 1.0}]),
            )
        }
    }

    fn fast_retry(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_within_attempts() {
        let source = Arc::new(FlakySource::new("flaky", 2));
        let chain = SourceChain::new(Domain::Markets, Duration::from_secs(1), fast_retry(3))
            .with_source(source.clone());

        let acquired = chain.acquire().await.unwrap();
        assert_eq!(acquired.source, "flaky");
        assert_eq!(acquired.records.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_source() {
        let primary = Arc::new(FlakySource::new("primary", u32::MAX));
        let fallback = Arc::new(FlakySource::new("fallback", 0));
        let chain = SourceChain::new(Domain::Markets, Duration::from_secs(1), fast_retry(2))
            .with_source(primary.clone())
            .with_source(fallback);

        let acquired = chain.acquire().await.unwrap();
        assert_eq!(acquired.source, "fallback");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_source_failure() {
        let chain = SourceChain::new(Domain::Markets, Duration::from_millis(20), RetryPolicy::none())
            .with_source(Arc::new(HangingSource))
            .with_source(Arc::new(FlakySource::new("fallback", 0)));

        let acquired = chain.acquire().await.unwrap();
        assert_eq!(acquired.source, "fallback");
    }

    #[tokio::test]
    async fn test_all_sources_failing() {
        let chain = SourceChain::new(Domain::Markets, Duration::from_millis(20), RetryPolicy::none())
            .with_source(Arc::new(HangingSource))
            .with_source(Arc::new(FlakySource::new("down", u32::MAX)));

        let err = chain.acquire().await.unwrap_err();
        match err {
            AppError::SourceUnavailable(msg) => {
                assert!(msg.contains("hanging"));
                assert!(msg.contains("down"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validation_error_falls_back_without_retry() {
        let invalid = Arc::new(InvalidSource::default());
        let fallback = Arc::new(FlakySource::new("fallback", 0));
        let chain = SourceChain::new(Domain::Markets, Duration::from_secs(1), fast_retry(3))
            .with_source(invalid.clone())
            .with_source(fallback.clone());

        let acquired = chain.acquire().await.unwrap();
        assert_eq!(acquired.source, "fallback");
        assert_eq!(invalid.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_feed_element_falls_back() {
        let chain = SourceChain::new(Domain::Markets, Duration::from_secs(1), fast_retry(2))
            .with_source(Arc::new(MalformedFeedSource))
            .with_source(Arc::new(FlakySource::new("static", 0)));

        let acquired = chain.acquire().await.unwrap();
        assert_eq!(acquired.source, "static");
        assert_eq!(acquired.records.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_chain_is_unavailable() {
        let chain = SourceChain::new(Domain::Economics, Duration::from_secs(1), RetryPolicy::none());
        assert!(matches!(
            chain.acquire().await,
            Err(AppError::SourceUnavailable(_))
        ));
    }
}
