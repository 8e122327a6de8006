use super::GroupedRow;
use std::fmt::Write;

/// Header row of the CSV export, in column order.
pub const CSV_HEADER: &str = "query,page,site,country,clicks,impressions,ctr,position";

/// Render grouped rows as UTF-8 CSV with a header row.
pub fn to_csv(rows: &[GroupedRow]) -> String {
    let mut csv = String::with_capacity(64 * (rows.len() + 1));
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for row in rows {
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{},{}",
            escape_csv_field(&row.query),
            escape_csv_field(&row.page),
            escape_csv_field(&row.site),
            escape_csv_field(&row.country),
            row.clicks,
            row.impressions,
            row.ctr,
            row.position,
        );
    }
    csv
}

/// Quote a text field for CSV.
///
/// Embedded quotes are doubled. Values starting with `=`, `+`, `-` or `@` get
/// a leading `'` so spreadsheets do not evaluate them as formulas.
fn escape_csv_field(field: &str) -> String {
    let guarded = if field.starts_with(['=', '+', '-', '@']) {
        format!("'{field}")
    } else {
        field.to_string()
    };
    format!("\"{}\"", guarded.replace('"', "\"\""))
}
