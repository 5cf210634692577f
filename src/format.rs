//! Report renderers for the text, JSON, and CSV output formats.
//!
//! The aggregate is consumed as-is; nothing here recomputes statistics.

use crate::types::{ReportAggregate, Task, TaskStatus};
use anyhow::Result;
use chrono::{TimeZone, Utc};

/// Output format for rendered reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Txt,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Some(OutputFormat::Txt),
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Resolve a format name, falling back to txt for unrecognized values.
pub fn resolve_format(name: &str) -> OutputFormat {
    OutputFormat::from_str(name).unwrap_or(OutputFormat::Txt)
}

/// Render an aggregate in the given format.
pub fn render(aggregate: &ReportAggregate, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Txt => Ok(render_txt(aggregate)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(aggregate)?),
        OutputFormat::Csv => Ok(render_csv(aggregate)),
    }
}

/// Format an epoch-ms timestamp for display.
fn format_ts(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => ms.to_string(),
    }
}

/// Humanize a millisecond duration as days/hours/minutes/seconds.
fn format_duration(ms: i64) -> String {
    if ms <= 0 {
        return "0s".to_string();
    }

    let secs = ms / 1_000;
    let (days, hours, mins) = (secs / 86_400, (secs % 86_400) / 3_600, (secs % 3_600) / 60);

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if mins > 0 {
        parts.push(format!("{}m", mins));
    }
    if parts.is_empty() {
        parts.push(format!("{}s", secs.max(1)));
    }

    parts.join(" ")
}

fn format_task_line(task: &Task) -> String {
    let assignee = task
        .assignee_id
        .as_ref()
        .map(|a| format!(" @{}", a))
        .unwrap_or_default();

    let deadline = task
        .deadline
        .map(|d| format!(" (deadline {})", format_ts(d)))
        .unwrap_or_default();

    format!(
        "  - [{}] {} `{}`{}{}\n",
        task.status,
        task.title,
        &task.id[..8.min(task.id.len())],
        assignee,
        deadline,
    )
}

/// Plain-text report summary.
fn render_txt(aggregate: &ReportAggregate) -> String {
    let mut out = String::new();

    out.push_str(&format!("Report {}\n", aggregate.id));
    out.push_str(&format!("Generated: {}\n", aggregate.generated_at));
    out.push_str(&format!(
        "Window: {} .. {}\n",
        format_ts(aggregate.parameters.from),
        format_ts(aggregate.parameters.to),
    ));
    if let Some(ref pid) = aggregate.parameters.project_id {
        out.push_str(&format!("Project: {}\n", pid));
    }
    if let Some(ref aid) = aggregate.parameters.assignee_id {
        out.push_str(&format!("Assignee: {}\n", aid));
    }

    out.push_str(&format!(
        "\nTasks: {} total, {:.1}% done\n",
        aggregate.total, aggregate.percent_done
    ));
    for status in TaskStatus::ALL {
        let count = aggregate.counts_by_status.get(&status).copied().unwrap_or(0);
        out.push_str(&format!("  {}: {}\n", status, count));
    }

    out.push_str(&format!(
        "\nDone on time: {}\nOverdue: {}\n",
        aggregate.done_on_time, aggregate.overdue_count
    ));
    out.push_str(&format!(
        "Elapsed: total {}, average {}\n",
        format_duration(aggregate.total_elapsed_ms),
        format_duration(aggregate.average_elapsed_ms),
    ));

    out.push('\n');
    for task in &aggregate.tasks {
        out.push_str(&format_task_line(task));
    }

    out
}

/// Escape a CSV cell, quoting when it contains a delimiter, quote, or newline.
fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV rendering: a metric section followed by the selected task rows.
fn render_csv(aggregate: &ReportAggregate) -> String {
    let mut csv = String::new();

    csv.push_str("metric,value\n");
    csv.push_str(&format!("report_id,{}\n", aggregate.id));
    csv.push_str(&format!("generated_at,{}\n", aggregate.generated_at));
    csv.push_str(&format!("from,{}\n", aggregate.parameters.from));
    csv.push_str(&format!("to,{}\n", aggregate.parameters.to));
    csv.push_str(&format!("total,{}\n", aggregate.total));
    csv.push_str(&format!("percent_done,{:.1}\n", aggregate.percent_done));
    for status in TaskStatus::ALL {
        let count = aggregate.counts_by_status.get(&status).copied().unwrap_or(0);
        csv.push_str(&format!("count_{},{}\n", status, count));
    }
    csv.push_str(&format!("done_on_time,{}\n", aggregate.done_on_time));
    csv.push_str(&format!("overdue_count,{}\n", aggregate.overdue_count));
    csv.push_str(&format!("total_elapsed_ms,{}\n", aggregate.total_elapsed_ms));
    csv.push_str(&format!(
        "average_elapsed_ms,{}\n",
        aggregate.average_elapsed_ms
    ));

    csv.push('\n');
    csv.push_str("id,title,status,assignee_id,created_at,started_at,completed_at,deadline\n");
    for task in &aggregate.tasks {
        let cells = [
            task.id.clone(),
            csv_escape(&task.title),
            task.status.to_string(),
            task.assignee_id.clone().unwrap_or_default(),
            task.created_at.to_string(),
            task.started_at.map(|v| v.to_string()).unwrap_or_default(),
            task.completed_at.map(|v| v.to_string()).unwrap_or_default(),
            task.deadline.map(|v| v.to_string()).unwrap_or_default(),
        ];
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }

    csv
}
