use super::{
    ApiRow, AuthError, Credentials, GscError, SearchAnalyticsQuery, SearchAnalyticsResponse,
    SearchConsole, SiteEntry, SitesListResponse,
};
use crate::config::Config;
use reqwest::{RequestBuilder, StatusCode, Url};
use std::time::Duration;

/// HTTP client for the Search Console API.
///
/// Built once per process (or per test) and shared by reference; the
/// underlying connection pool and token cache live as long as the client.
#[derive(Debug)]
pub struct GscClient {
    http: reqwest::Client,
    base: Url,
    credentials: Credentials,
}

impl GscClient {
    /// Create a client against `api_base` using the given credentials.
    pub fn new(
        api_base: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, GscError> {
        let mut base = Url::parse(api_base).map_err(|e| GscError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(GscError::InvalidUrl(format!("{api_base} cannot be a base")));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gsc-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base,
            credentials,
        })
    }

    /// Create a client from configuration, loading credentials from disk if needed.
    pub fn from_config(config: &Config) -> Result<Self, GscError> {
        let credentials = Credentials::from_config(config)?;
        Self::new(
            &config.api_base,
            credentials,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// The credentials this client authenticates with.
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Make sure a bearer token can be obtained, without calling the API.
    pub async fn authorize(&self) -> Result<(), AuthError> {
        self.credentials.bearer_token(&self.http).await.map(|_| ())
    }

    fn sites_url(&self) -> Result<Url, GscError> {
        self.endpoint(&["sites"])
    }

    fn query_url(&self, site_url: &str) -> Result<Url, GscError> {
        self.endpoint(&["sites", site_url, "searchAnalytics", "query"])
    }

    /// Append path segments to the base URL, percent-encoding each one so a
    /// site URL like `https://example.com/` stays a single segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GscError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| GscError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, GscError> {
        let token = self.credentials.bearer_token(&self.http).await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        let message = extract_error_message(&message);
        // 403 is per-property (missing permission on one site), not a bad credential.
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(kind = self.credentials.kind(), "Bearer token rejected; discarding it");
            self.credentials.invalidate();
            return Err(GscError::Auth(AuthError::Rejected {
                status: status.as_u16(),
                message,
            }));
        }
        Err(GscError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull `error.message` out of a Google API error body, or fall back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

impl SearchConsole for GscClient {
    async fn list_sites(&self) -> Result<Vec<SiteEntry>, GscError> {
        let url = self.sites_url()?;
        let response = self.send(self.http.get(url)).await?;
        let body: SitesListResponse = response.json().await?;
        Ok(body.site_entry)
    }

    async fn query(
        &self,
        site_url: &str,
        request: &SearchAnalyticsQuery,
    ) -> Result<Vec<ApiRow>, GscError> {
        let url = self.query_url(site_url)?;
        let response = self.send(self.http.post(url).json(request)).await?;
        let body: SearchAnalyticsResponse = response.json().await?;
        Ok(body.rows)
    }
}
