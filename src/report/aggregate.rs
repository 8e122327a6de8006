use super::{GroupedRow, PerformanceRow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Country selection that disables the country filter.
pub const ALL_COUNTRIES: &str = "all";

/// Headline numbers over a full row set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub mean_ctr: f64,
    pub mean_position: f64,
}

/// Compute totals and means. An empty set yields zeros.
pub fn summarize(rows: &[PerformanceRow]) -> Summary {
    if rows.is_empty() {
        return Summary::default();
    }

    #[allow(clippy::cast_precision_loss)]
    let n = rows.len() as f64;
    Summary {
        total_clicks: rows.iter().map(|r| r.clicks).sum(),
        total_impressions: rows.iter().map(|r| r.impressions).sum(),
        mean_ctr: rows.iter().map(|r| r.ctr).sum::<f64>() / n,
        mean_position: rows.iter().map(|r| r.position).sum::<f64>() / n,
    }
}

#[derive(Default)]
struct GroupAcc {
    clicks: u64,
    impressions: u64,
    ctr_sum: f64,
    position_sum: f64,
    count: u32,
}

/// Group rows by (query, page, site, country).
///
/// Clicks and impressions are summed; CTR and position are averaged over the
/// rows in each group. Output is ordered by group key.
pub fn aggregate(rows: &[PerformanceRow]) -> Vec<GroupedRow> {
    let mut groups: BTreeMap<(&str, &str, &str, &str), GroupAcc> = BTreeMap::new();
    for row in rows {
        let acc = groups
            .entry((
                row.query.as_str(),
                row.page.as_str(),
                row.site.as_str(),
                row.country.as_str(),
            ))
            .or_default();
        acc.clicks += row.clicks;
        acc.impressions += row.impressions;
        acc.ctr_sum += row.ctr;
        acc.position_sum += row.position;
        acc.count += 1;
    }

    groups
        .into_iter()
        .map(|((query, page, site, country), acc)| {
            let n = f64::from(acc.count);
            GroupedRow {
                query: query.to_string(),
                page: page.to_string(),
                site: site.to_string(),
                country: country.to_string(),
                clicks: acc.clicks,
                impressions: acc.impressions,
                ctr: acc.ctr_sum / n,
                position: acc.position_sum / n,
            }
        })
        .collect()
}

/// Optional row filters. Empty or missing values match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    /// Case-insensitive substring of the page URL, whitespace included.
    pub page: Option<String>,
    /// Case-insensitive substring of the search query.
    pub query: Option<String>,
    /// Exact country code; `all` disables the filter.
    pub country: Option<String>,
}

impl ReportFilter {
    fn page_needle(&self) -> Option<String> {
        needle(self.page.as_deref())
    }

    fn query_needle(&self) -> Option<String> {
        needle(self.query.as_deref())
    }

    fn country_code(&self) -> Option<&str> {
        self.country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_COUNTRIES))
    }

    /// Whether no filter is active.
    pub fn is_empty(&self) -> bool {
        self.page_needle().is_none()
            && self.query_needle().is_none()
            && self.country_code().is_none()
    }
}

/// Substring needle, matched as typed: surrounding whitespace is significant.
fn needle(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_lowercase)
}

/// Keep rows matching every active filter.
pub fn filter(rows: Vec<GroupedRow>, filters: &ReportFilter) -> Vec<GroupedRow> {
    let page = filters.page_needle();
    let query = filters.query_needle();
    let country = filters.country_code();

    rows.into_iter()
        .filter(|row| {
            page.as_deref()
                .is_none_or(|needle| row.page.to_lowercase().contains(needle))
                && query
                    .as_deref()
                    .is_none_or(|needle| row.query.to_lowercase().contains(needle))
                && country.is_none_or(|code| row.country == code)
        })
        .collect()
}

/// Sort by clicks then impressions, both descending, and keep the first `n`.
///
/// The sort is stable, so rows tied on both keep their incoming order.
pub fn top_n(mut rows: Vec<GroupedRow>, n: usize) -> Vec<GroupedRow> {
    rows.sort_by(|a, b| {
        b.clicks
            .cmp(&a.clicks)
            .then_with(|| b.impressions.cmp(&a.impressions))
    });
    rows.truncate(n);
    rows
}

/// Distinct non-empty country codes in first-seen order.
pub fn countries(rows: &[PerformanceRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| !r.country.is_empty())
        .filter(|r| seen.insert(r.country.as_str()))
        .map(|r| r.country.clone())
        .collect()
}
