use clap::Parser;
use gsc_dashboard::config::Config;
use gsc_dashboard::fetcher::Fetcher;
use gsc_dashboard::gsc::GscClient;
use gsc_dashboard::report::pipeline::DEFAULT_TOP_N;
use gsc_dashboard::report::{
    run_report, to_csv, DateRange, ReportFilter, ReportRequest, SiteScope,
};
use std::io::Write;
use std::path::PathBuf;

/// Fetch Search Console performance data once and write the top-N table as CSV.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file (GSC_* environment variables still apply)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Property URL; omit for every accessible property
    #[arg(short, long, value_name = "URL")]
    site: Option<String>,

    /// Preset window: 24h, 7d, 28d or 3m
    #[arg(short, long, conflicts_with_all = ["start", "end"])]
    period: Option<String>,

    /// First day of an explicit range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "end")]
    start: Option<String>,

    /// Last day of an explicit range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "start")]
    end: Option<String>,

    /// Keep rows whose page contains this text
    #[arg(long, value_name = "TEXT", help_heading = "Filters")]
    page: Option<String>,

    /// Keep rows whose query contains this text
    #[arg(long, value_name = "TEXT", help_heading = "Filters")]
    query: Option<String>,

    /// Keep rows for this country code ("all" disables)
    #[arg(long, value_name = "CODE", help_heading = "Filters")]
    country: Option<String>,

    /// Number of grouped rows to keep
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
    top: usize,

    /// Write CSV here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Cli {
    fn to_request(&self, today: chrono::NaiveDate) -> Result<ReportRequest, String> {
        if self.top == 0 {
            return Err("--top must be at least 1".to_string());
        }
        let range = DateRange::resolve(
            self.period.as_deref(),
            self.start.as_deref(),
            self.end.as_deref(),
            today,
        )
        .map_err(|e| e.to_string())?;

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

fn write_output(path: Option<&PathBuf>, csv: &str) -> std::io::Result<()> {
    match path {
        Some(path) => std::fs::write(path, csv),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(csv.as_bytes())?;
            stdout.flush()
        }
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays clean CSV.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gsc_dashboard=info,gsc_report=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());

    let request = match cli.to_request(chrono::Utc::now().date_naive()) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "Invalid arguments");
            std::process::exit(2);
        }
    };

    let client = match GscClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Could not set up Search Console credentials");
            std::process::exit(1);
        }
    };
    let fetcher = Fetcher::from_config(client, &config);

    let report = match run_report(&fetcher, &request).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Search Console authentication failed");
            std::process::exit(1);
        }
    };

    tracing::info!(
        site = %report.site,
        range = %report.range,
        total_clicks = report.summary.total_clicks,
        total_impressions = report.summary.total_impressions,
        mean_ctr = report.summary.mean_ctr,
        mean_position = report.summary.mean_position,
        fetched = report.total_rows,
        matched = report.matched_rows,
        "Report ready"
    );

    if let Err(e) = write_output(cli.output.as_ref(), &to_csv(&report.rows)) {
        tracing::error!(error = %e, "Failed to write CSV");
        std::process::exit(1);
    }
}
