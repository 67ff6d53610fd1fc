//! Record source implementations and the default fallback chains

mod http_source;
mod static_source;

pub use http_source::{decode_feed, HttpFeedSource};
pub use static_source::StaticSource;

use super::{RetryPolicy, SourceChain};
use crate::config::AppConfig;
use crate::db::sqlite::Domain;
use crate::error::Result;
use std::sync::Arc;

/// Build one chain per ingested domain.
///
/// Markets and economics try their HTTP feed first when a URL is configured
/// and fall back to the bundled static data; the other domains are static.
pub fn default_chains(config: &AppConfig) -> Result<Vec<SourceChain>> {
    let timeout = config.source_timeout();
    let retry = config.retry_policy();

    let mut markets = SourceChain::new(Domain::Markets, timeout, retry);
    if let Some(url) = &config.markets_feed_url {
        markets = markets.with_source(Arc::new(HttpFeedSource::new(Domain::Markets, url, timeout)?));
    }
    markets = markets.with_source(Arc::new(StaticSource::markets()));

    let mut economics = SourceChain::new(Domain::Economics, timeout, retry);
    if let Some(url) = &config.economics_feed_url {
        economics =
            economics.with_source(Arc::new(HttpFeedSource::new(Domain::Economics, url, timeout)?));
    }
    economics = economics.with_source(Arc::new(StaticSource::economics()));

    let pe_metrics = SourceChain::new(Domain::PeMetrics, timeout, RetryPolicy::none())
        .with_source(Arc::new(StaticSource::pe_metrics()));
    let positions = SourceChain::new(Domain::Positions, timeout, RetryPolicy::none())
        .with_source(Arc::new(StaticSource::positions()));

    Ok(vec![markets, economics, pe_metrics, positions])
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_chains_without_feeds() {
        let config = AppConfig::try_parse_from(["findash"]).unwrap();
        let chains = default_chains(&config).unwrap();
        let domains: Vec<Domain> = chains.iter().map(|c| c.domain()).collect();
        assert_eq!(
            domains,
            vec![Domain::Markets, Domain::Economics, Domain::PeMetrics, Domain::Positions]
        );
        assert_eq!(chains[0].source_ids(), vec!["static:markets"]);
    }

    #[test]
    fn test_feed_source_precedes_static() {
        let config = AppConfig::try_parse_from([
            "findash",
            "--markets-feed-url",
            "http://127.0.0.1:9/markets.json",
        ])
        .unwrap();
        let chains = default_chains(&config).unwrap();
        assert_eq!(
            chains[0].source_ids(),
            vec!["http:markets", "static:markets"]
        );
    }
}
