use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Preset used when neither a period nor explicit dates are given.
pub const DEFAULT_PERIOD: &str = "28d";

/// Longest span accepted for an explicit range. Search Console keeps 16 months.
const MAX_RANGE_DAYS: i64 = 16 * 31;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive reporting window, serialized as `YYYY-MM-DD` dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A date range could not be resolved from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    InvalidDate { field: &'static str, value: String },
    EndBeforeStart,
    TooLong { days: i64 },
    UnknownPeriod(String),
    MissingDates,
}

impl std::fmt::Display for RangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate { field, value } => {
                write!(f, "Invalid {field} '{value}'. Use YYYY-MM-DD.")
            }
            Self::EndBeforeStart => write!(f, "end_date must be on or after start_date"),
            Self::TooLong { days } => write!(
                f,
                "Date range of {days} days exceeds the {MAX_RANGE_DAYS}-day maximum"
            ),
            Self::UnknownPeriod(p) => write!(
                f,
                "Invalid period: {p}. Use '24h', '7d', '28d', '3m', or provide start_date and end_date."
            ),
            Self::MissingDates => {
                write!(f, "A custom period needs both start_date and end_date")
            }
        }
    }
}

impl std::error::Error for RangeError {}

impl DateRange {
    /// Build a range, rejecting reversed or oversized spans.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        let days = (end - start).num_days();
        if days < 0 {
            return Err(RangeError::EndBeforeStart);
        }
        if days > MAX_RANGE_DAYS {
            return Err(RangeError::TooLong { days });
        }
        Ok(Self { start, end })
    }

    /// Parse explicit `YYYY-MM-DD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, RangeError> {
        Self::new(
            parse_date("start_date", start)?,
            parse_date("end_date", end)?,
        )
    }

    /// Resolve a named period ending today.
    ///
    /// `24h` spans one day, `7d` and `28d` their day counts, `3m` 90 days.
    pub fn from_period(period: &str, today: NaiveDate) -> Result<Self, RangeError> {
        let days = match period {
            "24h" => 1,
            "7d" => 7,
            "28d" => 28,
            "3m" => 90,
            "custom" => return Err(RangeError::MissingDates),
            other => return Err(RangeError::UnknownPeriod(other.to_string())),
        };
        Ok(Self {
            start: today - Days::new(days),
            end: today,
        })
    }

    /// Explicit dates win when both are present; otherwise use `period`.
    pub fn resolve(
        period: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, RangeError> {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());
        if let (Some(start), Some(end)) = (start, end) {
            return Self::parse(start, end);
        }
        let period = period
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PERIOD);
        Self::from_period(period, today)
    }

    /// Start date as sent to the API.
    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    /// End date as sent to the API.
    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, RangeError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| RangeError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
