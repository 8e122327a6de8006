//! Search Console API boundary: wire types, errors, and the client seam.

pub mod auth;
pub mod client;

pub use auth::{AuthError, Credentials};
pub use client::GscClient;

use serde::{Deserialize, Serialize};
use std::future::Future;

/// Dimensions every performance query groups by, in key order.
pub const QUERY_DIMENSIONS: [&str; 3] = ["query", "page", "country"];

/// Permission level returned for properties the account cannot read data from.
pub const UNVERIFIED_PERMISSION: &str = "siteUnverifiedUser";

/// A property entry from `GET /sites`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub site_url: String,
    #[serde(default)]
    pub permission_level: Option<String>,
}

impl SiteEntry {
    /// Whether the account holds a verified permission on this property.
    ///
    /// Entries without a permission level are treated as verified.
    pub fn is_verified(&self) -> bool {
        self.permission_level.as_deref() != Some(UNVERIFIED_PERMISSION)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SitesListResponse {
    #[serde(default)]
    pub site_entry: Vec<SiteEntry>,
}

/// Request body for `POST /sites/{site}/searchAnalytics/query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalyticsQuery {
    pub start_date: String,
    pub end_date: String,
    pub dimensions: Vec<String>,
    pub row_limit: u32,
}

impl SearchAnalyticsQuery {
    /// Build a query over the standard dimensions for an inclusive date span.
    pub fn new(start_date: &str, end_date: &str, row_limit: u32) -> Self {
        Self {
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            dimensions: QUERY_DIMENSIONS.iter().map(ToString::to_string).collect(),
            row_limit,
        }
    }
}

/// One loosely typed row as returned by the API. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ApiRow {
    #[serde(default)]
    pub keys: Vec<String>,
    pub clicks: Option<f64>,
    pub impressions: Option<f64>,
    pub ctr: Option<f64>,
    pub position: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchAnalyticsResponse {
    #[serde(default)]
    pub rows: Vec<ApiRow>,
}

/// Errors from a single Search Console call.
#[derive(Debug)]
pub enum GscError {
    /// No valid credential could be obtained, or the API rejected it.
    Auth(AuthError),
    /// The request never produced a response (DNS, TLS, timeout, ...).
    Transport(reqwest::Error),
    /// The API answered with a non-success status.
    Api { status: u16, message: String },
    /// The response body did not match the expected shape.
    Decode(String),
    /// The configured API base URL cannot address a site.
    InvalidUrl(String),
}

impl std::fmt::Display for GscError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(e) => write!(f, "{e}"),
            Self::Transport(e) => write!(f, "Transport error: {e}"),
            Self::Api { status, message } => write!(f, "API error ({status}): {message}"),
            Self::Decode(msg) => write!(f, "Malformed API response: {msg}"),
            Self::InvalidUrl(msg) => write!(f, "Invalid API URL: {msg}"),
        }
    }
}

impl std::error::Error for GscError {}

impl From<AuthError> for GscError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<reqwest::Error> for GscError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e)
        }
    }
}

/// The two Search Console operations the fetcher depends on.
///
/// Implemented by [`GscClient`] over HTTP; tests drive the fetcher with
/// in-memory implementations.
pub trait SearchConsole: Send + Sync {
    /// List every property visible to the credential.
    fn list_sites(&self) -> impl Future<Output = Result<Vec<SiteEntry>, GscError>> + Send;

    /// Run one search analytics query against a property.
    fn query(
        &self,
        site_url: &str,
        request: &SearchAnalyticsQuery,
    ) -> impl Future<Output = Result<Vec<ApiRow>, GscError>> + Send;
}
