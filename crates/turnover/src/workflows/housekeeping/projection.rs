use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CleaningTask, Reservation, TaskStatus};

/// Display status derived from raw timestamps. This is the single place the
/// derivation lives; report screens and elapsed-time displays all consume
/// it rather than re-inferring state from nullable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectedStatus {
    NoTask,
    WaitingCheckout,
    CheckedOut,
    InProgress,
    Completed,
}

impl ProjectedStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoTask => "No Task",
            Self::WaitingCheckout => "Waiting for Checkout",
            Self::CheckedOut => "Checked Out",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

/// Filter for the checkout report: reservations checking out on `date`,
/// optionally narrowed to a set of projected statuses (empty = all).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportQuery {
    pub date: NaiveDate,
    #[serde(default)]
    pub statuses: Vec<ProjectedStatus>,
}

/// One reservation/task pair in the checkout report.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReportRow {
    pub reservation: Reservation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<CleaningTask>,
    pub projected_status: ProjectedStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_minutes: Option<i64>,
}

/// Resolution order: a missing or cancelled task wins, then terminal task
/// states, then the checkout report splits `pending` into waiting vs
/// checked out.
pub fn project(reservation: &Reservation, task: Option<&CleaningTask>) -> ProjectedStatus {
    let task = match task {
        Some(task) if task.status != TaskStatus::Cancelled => task,
        _ => return ProjectedStatus::NoTask,
    };

    match task.status {
        TaskStatus::Completed => ProjectedStatus::Completed,
        TaskStatus::InProgress => ProjectedStatus::InProgress,
        TaskStatus::Pending | TaskStatus::Cancelled => {
            if reservation.actual_checkout_time.is_some() {
                ProjectedStatus::CheckedOut
            } else {
                ProjectedStatus::WaitingCheckout
            }
        }
    }
}

/// Elapsed span backing the report's timers. `checked_out` counts from the
/// reported checkout instant in the tenant timezone, `in_progress` from the
/// task start, and `completed` freezes at the recorded duration. Spans that
/// would come out negative (clock skew, future-dated report) are suppressed
/// so the display falls back to "not started".
pub fn elapsed(
    reservation: &Reservation,
    task: Option<&CleaningTask>,
    timezone: FixedOffset,
    now: DateTime<Utc>,
) -> Option<Duration> {
    match project(reservation, task) {
        ProjectedStatus::CheckedOut => {
            let reported = reservation
                .check_out_date
                .and_time(reservation.actual_checkout_time?);
            let reported = timezone.from_local_datetime(&reported).single()?;
            non_negative(now.signed_duration_since(reported))
        }
        ProjectedStatus::InProgress => {
            let started_at = task?.started_at?;
            non_negative(now.signed_duration_since(started_at))
        }
        ProjectedStatus::Completed => {
            let task = task?;
            let started_at = task.started_at?;
            let completed_at = task.completed_at?;
            non_negative(completed_at.signed_duration_since(started_at))
        }
        ProjectedStatus::WaitingCheckout | ProjectedStatus::NoTask => None,
    }
}

pub fn report_row(
    reservation: Reservation,
    task: Option<CleaningTask>,
    timezone: FixedOffset,
    now: DateTime<Utc>,
) -> CheckoutReportRow {
    let projected_status = project(&reservation, task.as_ref());
    let elapsed_minutes =
        elapsed(&reservation, task.as_ref(), timezone, now).map(|span| span.num_minutes());

    CheckoutReportRow {
        reservation,
        task,
        projected_status,
        status_label: projected_status.label(),
        elapsed_minutes,
    }
}

fn non_negative(span: Duration) -> Option<Duration> {
    (span >= Duration::zero()).then_some(span)
}
