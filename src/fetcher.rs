use crate::config::Config;
use crate::gsc::{AuthError, GscError, SearchAnalyticsQuery, SearchConsole};
use crate::report::{DateRange, PerformanceRow, SiteScope};

/// Pulls performance rows from Search Console, one property at a time.
///
/// Per-site failures are logged and treated as "no rows"; only credential
/// failures abort a multi-site fetch.
#[derive(Debug)]
pub struct Fetcher<C> {
    client: C,
    row_limit: u32,
    verified_only: bool,
}

impl<C: SearchConsole> Fetcher<C> {
    pub const fn new(client: C, row_limit: u32, verified_only: bool) -> Self {
        Self {
            client,
            row_limit,
            verified_only,
        }
    }

    /// Build a fetcher with the row limit and permission filter from `config`.
    pub fn from_config(client: C, config: &Config) -> Self {
        Self::new(client, config.effective_row_limit(), config.verified_only)
    }

    pub const fn client(&self) -> &C {
        &self.client
    }

    pub const fn row_limit(&self) -> u32 {
        self.row_limit
    }

    async fn try_list_sites(&self) -> Result<Vec<String>, GscError> {
        let entries = self.client.list_sites().await?;
        let total = entries.len();
        let sites: Vec<String> = entries
            .into_iter()
            .filter(|entry| !self.verified_only || entry.is_verified())
            .map(|entry| entry.site_url)
            .collect();

        if sites.len() < total {
            tracing::debug!(
                skipped = total - sites.len(),
                "Skipping properties without verified permission"
            );
        }
        if sites.is_empty() {
            tracing::warn!("No Search Console properties found for this credential");
        }
        Ok(sites)
    }

    /// List the properties to report on. Failures yield an empty list.
    pub async fn list_sites(&self) -> Vec<String> {
        match self.try_list_sites().await {
            Ok(sites) => sites,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list Search Console properties");
                Vec::new()
            }
        }
    }

    async fn try_fetch_site(
        &self,
        site: &str,
        range: &DateRange,
    ) -> Result<Vec<PerformanceRow>, GscError> {
        let request = SearchAnalyticsQuery::new(&range.start_str(), &range.end_str(), self.row_limit);
        let rows: Vec<PerformanceRow> = self
            .client
            .query(site, &request)
            .await?
            .into_iter()
            .map(|row| PerformanceRow::from_api(site, row))
            .collect();

        if rows.is_empty() {
            tracing::warn!(site = %site, range = %range, "No performance data for range");
        } else {
            tracing::info!(site = %site, rows = rows.len(), "Fetched performance data");
        }
        Ok(rows)
    }

    /// Fetch one property's rows. Any failure is logged and yields no rows.
    pub async fn fetch_site(&self, site: &str, range: &DateRange) -> Vec<PerformanceRow> {
        match self.try_fetch_site(site, range).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(site = %site, error = %e, "Failed to fetch performance data");
                Vec::new()
            }
        }
    }

    /// Fetch one property, surfacing credential failures only.
    async fn fetch_one(
        &self,
        site: &str,
        range: &DateRange,
    ) -> Result<Vec<PerformanceRow>, AuthError> {
        match self.try_fetch_site(site, range).await {
            Ok(rows) => Ok(rows),
            Err(GscError::Auth(e)) => Err(e),
            Err(e) => {
                tracing::error!(site = %site, error = %e, "Query failed; continuing without this site");
                Ok(Vec::new())
            }
        }
    }

    /// Fetch every listed property in turn and concatenate the rows.
    ///
    /// A failed query on one site does not stop the others.
    pub async fn fetch_all(&self, range: &DateRange) -> Result<Vec<PerformanceRow>, AuthError> {
        let sites = match self.try_list_sites().await {
            Ok(sites) => sites,
            Err(GscError::Auth(e)) => return Err(e),
            Err(e) => {
                tracing::error!(error = %e, "Failed to list Search Console properties");
                return Ok(Vec::new());
            }
        };

        let mut rows = Vec::new();
        for site in &sites {
            rows.extend(self.fetch_one(site, range).await?);
        }
        tracing::info!(sites = sites.len(), rows = rows.len(), range = %range, "Fetch complete");
        Ok(rows)
    }

    /// Fetch rows for a scope: every property, or a single one.
    pub async fn fetch(
        &self,
        scope: &SiteScope,
        range: &DateRange,
    ) -> Result<Vec<PerformanceRow>, AuthError> {
        match scope {
            SiteScope::All => self.fetch_all(range).await,
            SiteScope::One(site) => self.fetch_one(site, range).await,
        }
    }
}
