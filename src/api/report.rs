use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::report::{
    build_report, to_csv, DateRange, PerformanceRow, ReportFilter, ReportRequest, ReportResult,
    SiteScope,
};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest top-N a caller may request.
const MAX_TOP_N: usize = 500;

/// Longest accepted filter or site parameter.
const MAX_PARAM_LEN: usize = 2048;

/// Query parameters shared by the report and export endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    /// Property URL; empty or `all` for every property.
    pub site: Option<String>,
    /// `24h`, `7d`, `28d`, `3m` or `custom`.
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub query: Option<String>,
    pub country: Option<String>,
    #[serde(default = "default_top")]
    pub top: usize,
    /// Ignore any cached table and query the API again.
    #[serde(default)]
    pub refresh: bool,
}

const fn default_top() -> usize {
    crate::report::pipeline::DEFAULT_TOP_N
}

impl ReportParams {
    /// Validate parameters and resolve them into a report request.
    pub fn to_request(&self, today: chrono::NaiveDate) -> Result<ReportRequest, ApiError> {
        if self.top == 0 || self.top > MAX_TOP_N {
            return Err(ApiError::BadRequest(format!(
                "top must be between 1 and {MAX_TOP_N}"
            )));
        }
        for (name, value) in [
            ("site", &self.site),
            ("page", &self.page),
            ("query", &self.query),
            ("country", &self.country),
        ] {
            if value.as_ref().is_some_and(|v| v.len() > MAX_PARAM_LEN) {
                return Err(ApiError::BadRequest(format!(
                    "{name} must be at most {MAX_PARAM_LEN} characters"
                )));
            }
        }

        let range = DateRange::resolve(
            self.period.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            today,
        )?;

        Ok(ReportRequest {
            scope: SiteScope::from_param(self.site.as_deref()),
            range,
            filter: ReportFilter {
                page: self.page.clone(),
                query: self.query.clone(),
                country: self.country.clone(),
            },
            top_n: self.top,
        })
    }
}

/// Return the fetched table for a scope and range, from cache when fresh.
async fn load_rows(
    state: &AppState,
    request: &ReportRequest,
    refresh: bool,
) -> Result<Arc<Vec<PerformanceRow>>, ApiError> {
    let key = (request.scope.clone(), request.range);
    if !refresh {
        if let Some(rows) = state.cache.get(&key) {
            tracing::debug!(site = %request.scope.label(), range = %request.range, "Serving cached rows");
            return Ok(rows);
        }
    }

    let rows = Arc::new(state.fetcher.fetch(&request.scope, &request.range).await?);
    state.cache.insert(key, Arc::clone(&rows));
    Ok(rows)
}

async fn report_for(state: &AppState, params: &ReportParams) -> Result<ReportResult, ApiError> {
    let today = chrono::Utc::now().date_naive();
    let request = params.to_request(today)?;
    let rows = load_rows(state, &request, params.refresh).await?;

    // Grouping large tables is CPU-bound; keep it off the async workers.
    tokio::task::spawn_blocking(move || {
        build_report(
            &request.scope,
            request.range,
            &rows,
            &request.filter,
            request.top_n,
        )
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Report task panicked: {e}")))
}

/// GET /api/sites — Properties available to the configured credential.
pub async fn get_sites(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.fetcher.list_sites().await)
}

/// GET /api/report — Summary plus the filtered top-N grouped rows.
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> Result<Json<ReportResult>, ApiError> {
    let Query(params) = params?;
    Ok(Json(report_for(&state, &params).await?))
}

/// The combined table as fetched, before grouping or filtering.
#[derive(Serialize)]
struct FetchedRows<'a> {
    site: &'a str,
    range: DateRange,
    total_rows: usize,
    rows: &'a [PerformanceRow],
}

/// GET /api/report/rows — Every fetched row for the selection, ungrouped.
///
/// Shares the row cache with `/api/report`, so viewing the raw table after a
/// report does not query Search Console again.
pub async fn get_rows(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let request = params.to_request(chrono::Utc::now().date_naive())?;
    let rows = load_rows(&state, &request, params.refresh).await?;
    Ok(Json(FetchedRows {
        site: request.scope.label(),
        range: request.range,
        total_rows: rows.len(),
        rows: &rows,
    })
    .into_response())
}

/// GET /api/report/export — The same view as `/api/report`, as CSV.
pub async fn get_export(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let report = report_for(&state, &params).await?;
    let filename = format!(
        "attachment; filename=\"gsc_data_{}_{}.csv\"",
        report.range.start_str(),
        report.range.end_str()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        to_csv(&report.rows),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2025, 2, 23).unwrap()
    }

    #[test]
    fn test_defaults_resolve() {
        let params = ReportParams {
            top: default_top(),
            ..ReportParams::default()
        };
        let request = params.to_request(today()).unwrap();
        assert_eq!(request.scope, SiteScope::All);
        assert_eq!(request.top_n, 10);
        assert_eq!(request.range.start_str(), "2025-01-26");
        assert!(request.filter.is_empty());
    }

    #[test]
    fn test_top_bounds() {
        for top in [0, MAX_TOP_N + 1] {
            let params = ReportParams {
                top,
                ..ReportParams::default()
            };
            assert!(matches!(
                params.to_request(today()),
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_oversized_filter_rejected() {
        let params = ReportParams {
            top: 10,
            query: Some("x".repeat(MAX_PARAM_LEN + 1)),
            ..ReportParams::default()
        };
        assert!(params.to_request(today()).is_err());
    }

    #[test]
    fn test_invalid_dates_rejected() {
        let params = ReportParams {
            top: 10,
            start_date: Some("2025-02-23".to_string()),
            end_date: Some("2025-02-01".to_string()),
            ..ReportParams::default()
        };
        assert!(matches!(
            params.to_request(today()),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_single_site_and_filters() {
        let params = ReportParams {
            site: Some("https://a.com/".to_string()),
            period: Some("7d".to_string()),
            page: Some("/blog".to_string()),
            country: Some("idn".to_string()),
            top: 20,
            ..ReportParams::default()
        };
        let request = params.to_request(today()).unwrap();
        assert_eq!(request.scope, SiteScope::One("https://a.com/".to_string()));
        assert_eq!(request.filter.page.as_deref(), Some("/blog"));
        assert_eq!(request.filter.country.as_deref(), Some("idn"));
        assert_eq!(request.top_n, 20);
    }
}
