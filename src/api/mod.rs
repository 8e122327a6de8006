pub mod errors;
pub mod report;

use crate::cache::QueryCache;
use crate::fetcher::Fetcher;
use crate::gsc::GscClient;
use crate::report::{DateRange, PerformanceRow, SiteScope};
use std::sync::Arc;

/// Cache of fetched tables, keyed by the selection that produced them.
pub type RowCache = QueryCache<(SiteScope, DateRange), Arc<Vec<PerformanceRow>>>;

/// Shared application state for the HTTP handlers.
pub struct AppState {
    pub fetcher: Fetcher<GscClient>,
    pub cache: RowCache,
    pub dashboard_origin: Option<String>,
}
