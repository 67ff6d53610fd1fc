//! Commentary Service

use crate::analytics::{generate_commentary, Commentary};
use crate::error::Result;
use crate::state::AppState;
use serde::Serialize;

/// Commentary with the store-wide freshness stamp
#[derive(Debug, Clone, Serialize)]
pub struct CommentaryResult {
    #[serde(flatten)]
    pub commentary: Commentary,
    #[serde(rename = "lastUpdate")]
    pub last_update: Option<String>,
}

pub struct CommentaryService;

impl CommentaryService {
    /// Commentary over the latest quote per symbol
    pub fn get_commentary(state: &AppState) -> Result<CommentaryResult> {
        let quotes = state.store.market_snapshot(None)?;
        Ok(CommentaryResult {
            commentary: generate_commentary(&quotes),
            last_update: state.store.last_update(),
        })
    }
}
