use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use gsc_dashboard::report::{
    aggregate, build_report, filter, summarize, to_csv, top_n, DateRange, PerformanceRow,
    ReportFilter, SiteScope,
};

const COUNTRIES: [&str; 5] = ["usa", "idn", "gbr", "deu", "ind"];

fn make_row(i: usize) -> PerformanceRow {
    PerformanceRow {
        site: format!("https://site-{}.example.com/", i % 4),
        query: format!("keyword {}", i % 500),
        page: format!("https://example.com/blog/post-{}", i % 200),
        country: COUNTRIES[i % COUNTRIES.len()].to_string(),
        clicks: (i % 37) as u64,
        impressions: (i % 37 + i % 11 + 1) as u64 * 10,
        ctr: (i % 100) as f64 / 100.0,
        position: 1.0 + (i % 50) as f64 / 5.0,
    }
}

fn make_rows(size: usize) -> Vec<PerformanceRow> {
    (0..size).map(make_row).collect()
}

/// Grouping cost as the fetched table grows. Duplicate keys are frequent, as
/// with multi-day ranges.
fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for size in [1_000, 5_000, 25_000] {
        let rows = make_rows(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| aggregate(rows));
        });
    }

    group.finish();
}

fn bench_filter_top_n(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_top_n");
    let grouped = aggregate(&make_rows(25_000));
    let filters = ReportFilter {
        page: Some("/blog/".to_string()),
        query: Some("keyword 1".to_string()),
        country: Some("usa".to_string()),
    };

    // Setup clones the grouped table so only filtering and ranking are timed.
    group.bench_function("filtered_top_10", |b| {
        b.iter_batched(
            || grouped.clone(),
            |rows| top_n(filter(rows, &filters), 10),
            BatchSize::LargeInput,
        );
    });

    group.bench_function("unfiltered_top_500", |b| {
        b.iter_batched(
            || grouped.clone(),
            |rows| top_n(filter(rows, &ReportFilter::default()), 500),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_full_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");
    let rows = make_rows(25_000);
    let range = DateRange::parse("2025-01-01", "2025-01-28").unwrap();

    group.bench_function("summarize_25k", |b| {
        b.iter(|| summarize(&rows));
    });

    group.bench_function("build_report_25k", |b| {
        b.iter(|| build_report(&SiteScope::All, range, &rows, &ReportFilter::default(), 10));
    });

    let top = top_n(aggregate(&rows), 500);
    group.bench_function("csv_500", |b| {
        b.iter(|| to_csv(&top));
    });

    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_filter_top_n, bench_full_report);
criterion_main!(benches);
