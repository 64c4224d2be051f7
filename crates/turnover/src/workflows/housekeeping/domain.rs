use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub String);

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StaffId(pub String);

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    CheckOut,
    StayOver,
    DeepCleaning,
}

impl TaskType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CheckOut => "Check-Out Clean",
            Self::StayOver => "Stay-Over Clean",
            Self::DeepCleaning => "Deep Clean",
        }
    }

    /// Check-out and deep cleans share the checkout date and the rotation
    /// bookkeeping; stay-over cleans are interleaved mid-stay.
    pub const fn is_checkout_clean(self) -> bool {
        matches!(self, Self::CheckOut | Self::DeepCleaning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    CheckedIn,
    CheckedOut,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::CheckedIn => "Checked In",
            Self::CheckedOut => "Checked Out",
            Self::Cancelled => "Cancelled",
            Self::NoShow => "No-Show",
        }
    }

    /// Closed reservations accept no further guest reports.
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Cancelled | Self::NoShow)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub property_id: PropertyId,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub checkin_time: NaiveTime,
    pub checkout_time: NaiveTime,
    pub actual_checkin_time: Option<NaiveTime>,
    pub actual_checkout_time: Option<NaiveTime>,
    pub status: ReservationStatus,
    pub is_priority: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningTask {
    pub id: TaskId,
    pub property_id: PropertyId,
    pub reservation_id: Option<ReservationId>,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub scheduled_date: NaiveDate,
    pub assigned_to: Option<StaffId>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub checkout_reported_at: Option<DateTime<Utc>>,
    pub is_priority: bool,
    pub notes: Option<String>,
}

/// Booking payload accepted when a reservation is created. Identifiers and
/// lifecycle state are assigned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub property_id: PropertyId,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub checkin_time: NaiveTime,
    pub checkout_time: NaiveTime,
    #[serde(default)]
    pub is_priority: bool,
}

/// Staff-entered checkout report for a reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReport {
    pub actual_checkout_time: NaiveTime,
    #[serde(default)]
    pub is_priority: bool,
}
