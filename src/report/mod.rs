//! Performance rows and the reporting pipeline built on them.

pub mod aggregate;
pub mod export;
pub mod pipeline;
pub mod range;

pub use aggregate::{aggregate, countries, filter, summarize, top_n, ReportFilter, Summary};
pub use export::to_csv;
pub use pipeline::{build_report, run_report, ReportRequest, ReportResult, SiteScope};
pub use range::{DateRange, RangeError};

use crate::gsc::ApiRow;
use serde::{Deserialize, Serialize};

/// One fetched row: a (query, page, country) slice of one site's traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub site: String,
    pub query: String,
    pub page: String,
    pub country: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

impl PerformanceRow {
    /// Map an API row onto the fixed row shape.
    ///
    /// Missing keys become empty strings and missing measures become zero.
    /// Keys are read in `QUERY_DIMENSIONS` order.
    pub fn from_api(site: &str, row: ApiRow) -> Self {
        let mut keys = row.keys.into_iter();
        let mut next_key = || keys.next().unwrap_or_default();
        let query = next_key();
        let page = next_key();
        let country = next_key();

        Self {
            site: site.to_string(),
            query,
            page,
            country,
            clicks: to_count(row.clicks),
            impressions: to_count(row.impressions),
            ctr: to_measure(row.ctr),
            position: to_measure(row.position),
        }
    }
}

/// Rows grouped by (query, page, site, country).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedRow {
    pub query: String,
    pub page: String,
    pub site: String,
    pub country: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

fn to_measure(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
