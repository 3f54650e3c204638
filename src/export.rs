use std::fmt::Write as _;

use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use v_htmlescape::escape;

use crate::types::{ScanResult, StatusKind};

pub const CSV_HEADER: [&str; 3] = ["Subdomain", "Status Code", "Status Text"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer flush failed: {0}")]
    Flush(String),
    #[error("csv output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serialize results as CSV: one header row, then subdomain, status code, status text.
///
/// Fields holding a comma, quote or newline are quoted.
pub fn to_csv(results: &[ScanResult]) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADER)?;
    for r in results {
        let status = r.status.to_string();
        wtr.write_record([r.subdomain.as_str(), status.as_str(), r.status_text.as_str()])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))?;
    Ok(String::from_utf8(data)?)
}

pub fn csv_filename(domain: &str) -> String {
    format!("{domain}-subdomains.csv")
}

pub fn report_filename(domain: &str) -> String {
    format!("{domain}-report.html")
}

/// `Content-Disposition` value that makes the browser download `filename`.
pub fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

/// Per-class counts shown at the top of the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub success: usize,
    pub redirect: usize,
    pub client_error: usize,
    pub server_error: usize,
    pub other: usize,
}

impl StatusSummary {
    pub fn from_results(results: &[ScanResult]) -> Self {
        let mut s = Self::default();
        for r in results {
            match r.kind() {
                StatusKind::Success => s.success += 1,
                StatusKind::Redirect => s.redirect += 1,
                StatusKind::ClientError => s.client_error += 1,
                StatusKind::ServerError => s.server_error += 1,
                StatusKind::Other => s.other += 1,
            }
        }
        s
    }
}

/// Standalone, printable HTML report for a scan.
pub fn render_report(domain: &str, results: &[ScanResult], generated_at: OffsetDateTime) -> String {
    let summary = StatusSummary::from_results(results);
    let generated = generated_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| generated_at.unix_timestamp().to_string());

    let mut rows = String::new();
    for (i, r) in results.iter().enumerate() {
        let _ = writeln!(
            rows,
            "<tr><td>{n}</td><td><code>{sub}</code></td><td><span class=\"badge {class}\">{status}</span></td><td>{text}</td></tr>",
            n = i + 1,
            sub = escape(&r.subdomain),
            class = r.kind().css_class(),
            status = r.status,
            text = escape(&r.status_text),
        );
    }
    if results.is_empty() {
        rows.push_str("<tr><td colspan=\"4\" class=\"empty\">No results recorded.</td></tr>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>ReconHub report: {domain}</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 2rem; color: #111; }}
h1 {{ margin-bottom: 0.25rem; }}
.meta {{ color: #666; margin-bottom: 1.5rem; }}
.summary {{ display: flex; gap: 1rem; margin-bottom: 1.5rem; }}
.summary div {{ border: 1px solid #ddd; border-radius: 6px; padding: 0.5rem 1rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border-bottom: 1px solid #eee; padding: 0.5rem; text-align: left; }}
.badge {{ border: 1px solid currentColor; border-radius: 4px; padding: 0 0.4rem; }}
.status-ok {{ color: #15803d; }}
.status-redirect {{ color: #a16207; }}
.status-client {{ color: #c2410c; }}
.status-server {{ color: #b91c1c; }}
.status-other {{ color: #6b7280; }}
.empty {{ color: #666; text-align: center; }}
@media print {{ body {{ margin: 0; }} }}
</style>
</head>
<body>
<h1>Subdomain report</h1>
<p class="meta">Target <strong>{domain}</strong> &middot; {total} subdomains &middot; generated {generated}</p>
<div class="summary">
<div class="status-ok">2xx: {ok}</div>
<div class="status-redirect">3xx: {redirect}</div>
<div class="status-client">4xx: {client}</div>
<div class="status-server">5xx: {server}</div>
</div>
<table>
<thead><tr><th>#</th><th>Subdomain</th><th>Status</th><th>Status Text</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</body>
</html>
"#,
        domain = escape(domain),
        total = results.len(),
        generated = generated,
        ok = summary.success,
        redirect = summary.redirect,
        client = summary.client_error,
        server = summary.server_error,
        rows = rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::synthesize_results;

    #[test]
    fn csv_has_header_plus_one_line_per_result() {
        let results = synthesize_results("example.com");
        let csv = to_csv(&results).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), results.len() + 1);
        assert_eq!(lines[0], "Subdomain,Status Code,Status Text");
        assert_eq!(lines[1], "www.example.com,200,OK");
        assert_eq!(lines[5], "mail.example.com,301,Moved Permanently");
    }

    #[test]
    fn csv_quotes_fields_with_delimiters() {
        let results = vec![ScanResult {
            subdomain: "a,b.example.com".into(),
            status: 418,
            status_text: "I'm a \"teapot\"".into(),
        }];
        let csv = to_csv(&results).unwrap();
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            r#""a,b.example.com",418,"I'm a ""teapot""""#
        );
    }

    #[test]
    fn csv_of_nothing_is_header_only() {
        let csv = to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn filenames_and_disposition() {
        assert_eq!(csv_filename("example.com"), "example.com-subdomains.csv");
        assert_eq!(report_filename("example.com"), "example.com-report.html");
        assert_eq!(
            content_disposition("we\"ird.csv"),
            "attachment; filename=\"weird.csv\""
        );
    }

    #[test]
    fn report_summarizes_and_escapes() {
        let results = synthesize_results("<x>.com");
        let html = render_report("<x>.com", &results, OffsetDateTime::UNIX_EPOCH);
        assert!(html.contains("&lt;x&gt;.com"));
        assert!(!html.contains("<x>.com"));
        assert!(html.contains("2xx: 5"));
        assert!(html.contains("3xx: 1"));
        assert!(html.contains("4xx: 3"));
        assert!(html.contains("5xx: 1"));
        assert!(html.contains("1970-01-01T00:00:00Z"));
    }
}
