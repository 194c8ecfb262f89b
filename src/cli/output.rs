//! Human-readable reporting for CLI commands.

use crate::{FetchOutcome, SyncReport};

/// Formats a body length as B, KB or MB.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_size(len: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if len >= MB {
        format!("{:.2} MB", len as f64 / MB as f64)
    } else if len >= KB {
        format!("{:.2} KB", len as f64 / KB as f64)
    } else {
        format!("{len} B")
    }
}

/// One-line summary of how a request was answered.
#[must_use]
pub fn describe_outcome(url: &str, outcome: &FetchOutcome) -> String {
    match outcome.response() {
        None => format!("{url}: not intercepted"),
        Some(resp) => format!(
            "{url}: {} {} from {} ({})",
            resp.status,
            resp.status_text,
            outcome.source(),
            format_size(resp.body.len())
        ),
    }
}

/// One-line summary of a background-sync run.
#[must_use]
pub fn describe_sync(tag: &str, report: Option<&SyncReport>) -> String {
    report.map_or_else(
        || format!("Sync tag '{tag}' is not handled"),
        |r| format!("Synced {} request(s), {} still queued", r.replayed, r.failed),
    )
}

/// Tab-separated partition listing.
#[must_use]
pub fn partition_table(rows: &[(String, usize)]) -> String {
    rows.iter()
        .map(|(name, count)| format!("{name}\t{count}"))
        .collect::<Vec<_>>()
        .join("\n")
}
