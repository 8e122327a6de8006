//! Self-hosted Search Console performance dashboard.
//!
//! [`fetcher`] pulls query/page/country rows for one or every property,
//! [`report`] reduces them to summaries, grouped top-N tables and CSV, and
//! [`server`] exposes both over HTTP next to an embedded dashboard.

pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod fetcher;
pub mod gsc;
pub mod report;
pub mod server;
