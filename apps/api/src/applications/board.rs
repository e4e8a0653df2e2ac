//! Kanban board helpers: status history lines and column grouping.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::models::job_application::{ApplicationStatus, JobApplicationRow};

#[derive(Debug, Serialize)]
pub struct BoardColumn {
    pub status: ApplicationStatus,
    pub applications: Vec<JobApplicationRow>,
}

/// `"{timestamp}: {from} -> {to}"`, with ` ({note})` when a note is given.
pub fn history_line(
    at: DateTime<Utc>,
    from: ApplicationStatus,
    to: ApplicationStatus,
    note: Option<&str>,
) -> String {
    let timestamp = at.to_rfc3339_opts(SecondsFormat::Secs, true);
    match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("{timestamp}: {from} -> {to} ({note})"),
        None => format!("{timestamp}: {from} -> {to}"),
    }
}

pub fn append_history(history: &str, line: &str) -> String {
    if history.is_empty() {
        line.to_string()
    } else {
        format!("{history}\n{line}")
    }
}

/// First move into `applied` stamps the date; later moves keep it.
pub fn applied_at_after_move(
    current: Option<DateTime<Utc>>,
    to: ApplicationStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (current, to) {
        (None, ApplicationStatus::Applied) => Some(now),
        (current, _) => current,
    }
}

/// Every column in board order, empty ones included. Rows keep their
/// incoming order inside a column.
pub fn group_board(rows: Vec<JobApplicationRow>) -> Vec<BoardColumn> {
    let mut columns: Vec<BoardColumn> = ApplicationStatus::ALL
        .into_iter()
        .map(|status| BoardColumn {
            status,
            applications: Vec::new(),
        })
        .collect();
    for row in rows {
        let status = row.status();
        if let Some(column) = columns.iter_mut().find(|c| c.status == status) {
            column.applications.push(row);
        }
    }
    columns
}
