//! Report command arguments and date-window parsing.

use crate::types::{ReportParameters, TaskStatus};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the report command.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Window start date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub from: String,

    /// Window end date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub to: String,

    /// Scope to a project id
    #[arg(long)]
    pub project: Option<String>,

    /// Scope to an assignee id
    #[arg(long)]
    pub assignee: Option<String>,

    /// Restrict to a status (repeatable); empty means all
    #[arg(long = "status")]
    pub statuses: Vec<String>,

    /// Output format: txt, json, or csv (unknown values render as txt)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Gzip-compress the written file
    #[arg(long, requires = "output")]
    pub gzip: bool,
}

impl ReportArgs {
    /// Build core report parameters, resolving the format default.
    ///
    /// `--from` maps to the start of its day and `--to` to the last
    /// millisecond of its day, so both dates are inclusive.
    pub fn to_parameters(&self, default_format: &str) -> Result<ReportParameters> {
        let statuses = self
            .statuses
            .iter()
            .map(|s| {
                TaskStatus::from_str(s).ok_or_else(|| anyhow!("unknown status filter: {}", s))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ReportParameters {
            from: day_start_ms(&self.from)?,
            to: day_end_ms(&self.to)?,
            project_id: self.project.clone(),
            assignee_id: self.assignee.clone(),
            statuses,
            output_format: self
                .format
                .clone()
                .unwrap_or_else(|| default_format.to_string()),
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date '{}', expected YYYY-MM-DD", s))
}

/// First millisecond of the given date (UTC).
pub fn day_start_ms(s: &str) -> Result<i64> {
    let date = parse_date(s)?;
    Ok(date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp_millis())
}

/// Last millisecond of the given date (UTC).
pub fn day_end_ms(s: &str) -> Result<i64> {
    let date = parse_date(s)?;
    Ok(date
        .and_hms_milli_opt(23, 59, 59, 999)
        .expect("end of day is always valid")
        .and_utc()
        .timestamp_millis())
}
