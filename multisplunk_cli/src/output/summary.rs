use super::paint;
use multisplunk_core::AggregateReport;
use owo_colors::Style;
use std::collections::BTreeMap;
use std::path::Path;

/// End-of-run summary: timing, counts and one line per instance.
///
/// `unsaved` lists instances whose results came back but could not be
/// written to disk.
pub fn render_summary(
    report: &AggregateReport,
    unsaved: &BTreeMap<String, String>,
    outdir: &Path,
) -> String {
    let ok = paint("✓", Style::new().green());
    let failed = paint("✗", Style::new().red());

    let mut lines = vec![
        paint("Summary", Style::new().bold().cyan()),
        format!("  Elapsed:    {:.2}s", report.elapsed.as_secs_f64()),
        format!(
            "  Successful: {}",
            paint(report.success_count(), Style::new().green())
        ),
        format!(
            "  Failed:     {}",
            paint(report.failure_count(), Style::new().red())
        ),
    ];

    lines.extend(
        report
            .successes
            .iter()
            .map(|(name, rows)| format!("  {} {}: {} results", ok, name, rows.len())),
    );
    lines.extend(
        report
            .failures
            .iter()
            .map(|(name, failure)| format!("  {} {}: {}", failed, name, failure)),
    );
    lines.extend(
        unsaved
            .iter()
            .map(|(name, reason)| format!("  {} {}: not saved: {}", failed, name, reason)),
    );

    lines.push(format!("  Output:     {}", outdir.display()));
    lines.join("\n")
}
