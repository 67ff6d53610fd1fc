//! Freshness index
//!
//! Newest ingestion timestamp per domain, kept in memory so `lastUpdate`
//! never has to scan the tables. Seeded from the database at open and
//! advanced after every committed write. Positions are upserted in place,
//! so their entry is replaced with the table's maximum instead.

use super::models::Domain;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct FreshnessIndex {
    latest: DashMap<Domain, String>,
}

impl FreshnessIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed timestamp; older values never replace newer ones
    pub fn advance(&self, domain: Domain, timestamp: &str) {
        self.latest
            .entry(domain)
            .and_modify(|current| {
                if timestamp > current.as_str() {
                    *current = timestamp.to_string();
                }
            })
            .or_insert_with(|| timestamp.to_string());
    }

    /// Overwrite a domain's entry with the value read back from its table
    pub fn replace(&self, domain: Domain, timestamp: Option<String>) {
        match timestamp {
            Some(ts) => {
                self.latest.insert(domain, ts);
            }
            None => {
                self.latest.remove(&domain);
            }
        }
    }

    pub fn get(&self, domain: Domain) -> Option<String> {
        self.latest.get(&domain).map(|r| r.clone())
    }

    /// Newest timestamp across every domain
    pub fn overall(&self) -> Option<String> {
        self.latest.iter().map(|r| r.value().clone()).max()
    }
}
