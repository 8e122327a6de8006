use super::{
    aggregate, countries, filter, summarize, top_n, DateRange, GroupedRow, PerformanceRow,
    ReportFilter, Summary,
};
use crate::fetcher::Fetcher;
use crate::gsc::{AuthError, SearchConsole};
use serde::Serialize;

/// Site selection meaning "every property".
pub const ALL_SITES: &str = "all";

/// Number of grouped rows returned when the caller does not choose.
pub const DEFAULT_TOP_N: usize = 10;

/// Which properties a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SiteScope {
    All,
    One(String),
}

impl SiteScope {
    /// Interpret a `site` parameter: empty, missing, or `all` selects every property.
    pub fn from_param(site: Option<&str>) -> Self {
        match site.map(str::trim) {
            None | Some("") => Self::All,
            Some(s) if s.eq_ignore_ascii_case(ALL_SITES) => Self::All,
            Some(s) => Self::One(s.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_SITES,
            Self::One(site) => site,
        }
    }
}

/// Everything needed to produce one report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub scope: SiteScope,
    pub range: DateRange,
    pub filter: ReportFilter,
    pub top_n: usize,
}

/// A finished report: headline numbers plus the filtered top-N view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportResult {
    pub site: String,
    pub range: DateRange,
    pub summary: Summary,
    /// Country codes present in the fetched data, for filter pickers.
    pub countries: Vec<String>,
    /// Rows fetched from the API before grouping.
    pub total_rows: usize,
    /// Groups remaining after filters, before truncation.
    pub matched_rows: usize,
    pub rows: Vec<GroupedRow>,
}

/// Summarize, group, filter and rank already-fetched rows.
pub fn build_report(
    scope: &SiteScope,
    range: DateRange,
    rows: &[PerformanceRow],
    filters: &ReportFilter,
    n: usize,
) -> ReportResult {
    let matched = filter(aggregate(rows), filters);
    let matched_rows = matched.len();
    ReportResult {
        site: scope.label().to_string(),
        range,
        summary: summarize(rows),
        countries: countries(rows),
        total_rows: rows.len(),
        matched_rows,
        rows: top_n(matched, n),
    }
}

/// Fetch rows for the request's scope and range, then build the report.
///
/// Only a credential failure is an error; sites that fail to query simply
/// contribute no rows.
pub async fn run_report<C: SearchConsole>(
    fetcher: &Fetcher<C>,
    request: &ReportRequest,
) -> Result<ReportResult, AuthError> {
    let rows = fetcher.fetch(&request.scope, &request.range).await?;
    Ok(build_report(
        &request.scope,
        request.range,
        &rows,
        &request.filter,
        request.top_n,
    ))
}
