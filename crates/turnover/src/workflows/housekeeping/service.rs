use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::domain::{
    CheckoutReport, CleaningTask, PropertyId, Reservation, ReservationDraft, ReservationId,
    ReservationStatus, StaffId, TaskId, TaskStatus, TaskType,
};
use super::lifecycle::{self, TransitionError};
use super::projection::{self, CheckoutReportRow, ReportQuery};
use super::repository::{
    HousekeepingEvent, HousekeepingRepository, NotificationPublisher, RepositoryError,
};
use super::resolver;
use super::rotation::RotationCounter;
use super::settings::{HousekeepingSettings, SettingsError, SettingsSource};

/// Service composing the rotation counter, task planner, lifecycle guards,
/// and checkout-report projection behind one facade.
pub struct HousekeepingService<R, S, N> {
    repository: Arc<R>,
    settings: Arc<S>,
    notifications: Arc<N>,
    rotation: RotationCounter<R>,
}

static RESERVATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TASK_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_reservation_id() -> ReservationId {
    let id = RESERVATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReservationId(format!("res-{id:06}"))
}

fn next_task_id() -> TaskId {
    let id = TASK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TaskId(format!("task-{id:06}"))
}

/// Reservation plus the cleaning schedule created for it.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledReservation {
    pub reservation: Reservation,
    pub tasks: Vec<CleaningTask>,
}

/// Completed task plus the property's rotation counter after the
/// transactional update.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedTask {
    pub task: CleaningTask,
    pub cleaning_count: u32,
}

/// Current rotation state of a property.
#[derive(Debug, Clone, Serialize)]
pub struct RotationStatus {
    pub property_id: PropertyId,
    pub cleaning_count: u32,
    pub next_task_type: TaskType,
}

impl<R, S, N> HousekeepingService<R, S, N>
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, settings: Arc<S>, notifications: Arc<N>) -> Self {
        let rotation = RotationCounter::new(repository.clone());
        Self {
            repository,
            settings,
            notifications,
            rotation,
        }
    }

    /// Store the reservation and create its cleaning schedule: stay-over
    /// cleans at each interval boundary and one checkout-date clean whose
    /// type the rotation counter resolves.
    pub fn schedule_reservation(
        &self,
        draft: ReservationDraft,
    ) -> Result<ScheduledReservation, HousekeepingServiceError> {
        let settings = self.load_settings()?;

        if draft.check_out_date <= draft.check_in_date {
            return Err(HousekeepingServiceError::InvalidStayWindow {
                check_in: draft.check_in_date,
                check_out: draft.check_out_date,
            });
        }

        let reservation = Reservation {
            id: next_reservation_id(),
            property_id: draft.property_id,
            check_in_date: draft.check_in_date,
            check_out_date: draft.check_out_date,
            checkin_time: draft.checkin_time,
            checkout_time: draft.checkout_time,
            actual_checkin_time: None,
            actual_checkout_time: None,
            status: ReservationStatus::Active,
            is_priority: draft.is_priority,
        };
        let reservation = self.repository.insert_reservation(reservation)?;

        let checkout_task_type = self
            .rotation
            .peek_next_task_type(&reservation.property_id, &settings)?;
        let plan = resolver::plan_reservation_tasks(&reservation, &settings, checkout_task_type);

        let mut tasks = Vec::with_capacity(plan.len());
        for planned in plan {
            let task = CleaningTask {
                id: next_task_id(),
                property_id: reservation.property_id.clone(),
                reservation_id: Some(reservation.id.clone()),
                task_type: planned.task_type,
                status: TaskStatus::Pending,
                scheduled_date: planned.scheduled_date,
                assigned_to: None,
                assigned_at: None,
                started_at: None,
                completed_at: None,
                checkout_reported_at: None,
                is_priority: reservation.is_priority,
                notes: None,
            };
            tasks.push(self.repository.insert_task(task)?);
        }

        Ok(ScheduledReservation { reservation, tasks })
    }

    /// Schedule a deep clean unattached to any reservation (e.g., pulled
    /// forward manually by operations).
    pub fn schedule_deep_cleaning(
        &self,
        property_id: PropertyId,
        scheduled_date: NaiveDate,
    ) -> Result<CleaningTask, HousekeepingServiceError> {
        let task = CleaningTask {
            id: next_task_id(),
            property_id,
            reservation_id: None,
            task_type: TaskType::DeepCleaning,
            status: TaskStatus::Pending,
            scheduled_date,
            assigned_to: None,
            assigned_at: None,
            started_at: None,
            completed_at: None,
            checkout_reported_at: None,
            is_priority: false,
            notes: None,
        };
        Ok(self.repository.insert_task(task)?)
    }

    /// Stamp the guest's arrival on the reservation.
    pub fn report_check_in(
        &self,
        reservation_id: &ReservationId,
        actual_checkin_time: NaiveTime,
    ) -> Result<Reservation, HousekeepingServiceError> {
        let mut reservation = self.fetch_reservation(reservation_id)?;
        self.ensure_open(&reservation)?;

        reservation.actual_checkin_time = Some(actual_checkin_time);
        reservation.status = ReservationStatus::CheckedIn;
        self.repository.update_reservation(reservation.clone())?;
        Ok(reservation)
    }

    /// Record the guest's departure: stamps the reservation, marks the
    /// checkout-type task as reported, and propagates a priority flag set
    /// at report time. Task status is untouched; start/complete remain
    /// explicit actions.
    pub fn report_checkout(
        &self,
        reservation_id: &ReservationId,
        report: CheckoutReport,
        reported_at: DateTime<Utc>,
    ) -> Result<CleaningTask, HousekeepingServiceError> {
        let mut reservation = self.fetch_reservation(reservation_id)?;
        self.ensure_open(&reservation)?;

        reservation.actual_checkout_time = Some(report.actual_checkout_time);
        reservation.status = ReservationStatus::CheckedOut;
        if report.is_priority {
            reservation.is_priority = true;
        }
        self.repository.update_reservation(reservation.clone())?;

        let mut task = self
            .repository
            .checkout_task_for_reservation(&reservation.id)?
            .ok_or_else(|| {
                warn!(%reservation_id, "checkout reported without a matching cleaning task");
                HousekeepingServiceError::TaskNotFound(reservation_id.clone())
            })?;

        task.checkout_reported_at = Some(reported_at);
        if report.is_priority {
            task.is_priority = true;
        }
        self.repository.update_task(task.clone())?;

        self.notify(HousekeepingEvent::CheckoutReported {
            reservation_id: reservation.id,
            property_id: task.property_id.clone(),
            task_id: task.id.clone(),
            is_priority: task.is_priority,
        });

        Ok(task)
    }

    /// Cancel the reservation and cascade to its open tasks in one
    /// repository operation, so no orphaned pending tasks survive.
    pub fn cancel_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Vec<CleaningTask>, HousekeepingServiceError> {
        match self.repository.cancel_reservation(reservation_id) {
            Ok((_, cancelled)) => Ok(cancelled),
            Err(RepositoryError::NotFound) => Err(HousekeepingServiceError::UnknownReservation(
                reservation_id.clone(),
            )),
            Err(other) => Err(other.into()),
        }
    }

    /// Date edits after the schedule exists are rejected; callers cancel
    /// and recreate instead of inheriting a stale task schedule.
    pub fn reschedule_reservation(
        &self,
        reservation_id: &ReservationId,
        check_in_date: NaiveDate,
        check_out_date: NaiveDate,
    ) -> Result<Reservation, HousekeepingServiceError> {
        let mut reservation = self.fetch_reservation(reservation_id)?;
        self.ensure_open(&reservation)?;

        let has_open_tasks = self
            .repository
            .tasks_for_reservation(reservation_id)?
            .iter()
            .any(|task| task.status != TaskStatus::Cancelled);
        if has_open_tasks {
            return Err(HousekeepingServiceError::ScheduleLocked(
                reservation_id.clone(),
            ));
        }

        if check_out_date <= check_in_date {
            return Err(HousekeepingServiceError::InvalidStayWindow {
                check_in: check_in_date,
                check_out: check_out_date,
            });
        }

        reservation.check_in_date = check_in_date;
        reservation.check_out_date = check_out_date;
        self.repository.update_reservation(reservation.clone())?;
        Ok(reservation)
    }

    /// `pending -> in_progress`, guarded by a compare-and-set on the prior
    /// status so two staff racing to start the same task produce exactly
    /// one winner.
    pub fn start_task(
        &self,
        task_id: &TaskId,
        assigned_to: Option<StaffId>,
        now: DateTime<Utc>,
    ) -> Result<CleaningTask, HousekeepingServiceError> {
        let task = self.fetch_task(task_id)?;
        let updated = lifecycle::start(&task, assigned_to, now)?;
        self.guarded_transition(task_id, TaskStatus::Pending, updated)
    }

    /// `in_progress -> completed`. The status write and the rotation
    /// counter mutation happen in one repository operation; if either
    /// fails, the completion fails as a whole.
    pub fn complete_task(
        &self,
        task_id: &TaskId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CompletedTask, HousekeepingServiceError> {
        let task = self.fetch_task(task_id)?;
        let (updated, effect) = lifecycle::complete(&task, notes, now)?;

        let (task, cleaning_count) = self
            .repository
            .complete_task(TaskStatus::InProgress, updated, effect)
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    HousekeepingServiceError::ConcurrencyConflict(task_id.clone())
                }
                other => other.into(),
            })?;

        self.notify(HousekeepingEvent::TaskCompleted {
            task_id: task.id.clone(),
            property_id: task.property_id.clone(),
            task_type: task.task_type,
            cleaning_count,
        });

        Ok(CompletedTask {
            task,
            cleaning_count,
        })
    }

    /// `pending | in_progress -> cancelled`; no rotation effect.
    pub fn cancel_task(
        &self,
        task_id: &TaskId,
    ) -> Result<CleaningTask, HousekeepingServiceError> {
        let task = self.fetch_task(task_id)?;
        let expected = task.status;
        let updated = lifecycle::cancel(&task)?;
        self.guarded_transition(task_id, expected, updated)
    }

    pub fn get_task(&self, task_id: &TaskId) -> Result<CleaningTask, HousekeepingServiceError> {
        self.fetch_task(task_id)
    }

    /// Current rotation state for a property, resolved against the live
    /// tenant settings.
    pub fn rotation_status(
        &self,
        property_id: &PropertyId,
    ) -> Result<RotationStatus, HousekeepingServiceError> {
        let settings = self.load_settings()?;
        let cleaning_count = self.rotation.cleaning_count(property_id)?;
        let next_task_type = self.rotation.peek_next_task_type(property_id, &settings)?;
        Ok(RotationStatus {
            property_id: property_id.clone(),
            cleaning_count,
            next_task_type,
        })
    }

    /// Checkout report for a date: every reservation checking out that day
    /// with its projected status and elapsed timer, priority rows first.
    pub fn checkout_report(
        &self,
        query: ReportQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<CheckoutReportRow>, HousekeepingServiceError> {
        let settings = self.load_settings()?;
        let timezone = settings.timezone()?;

        let mut rows = Vec::new();
        for reservation in self.repository.reservations_checking_out(query.date)? {
            let task = self
                .repository
                .checkout_task_for_reservation(&reservation.id)?;
            let row = projection::report_row(reservation, task, timezone, now);
            if query.statuses.is_empty() || query.statuses.contains(&row.projected_status) {
                rows.push(row);
            }
        }

        rows.sort_by(|a, b| {
            b.reservation
                .is_priority
                .cmp(&a.reservation.is_priority)
                .then(a.reservation.checkout_time.cmp(&b.reservation.checkout_time))
                .then(a.reservation.id.0.cmp(&b.reservation.id.0))
        });

        Ok(rows)
    }

    fn guarded_transition(
        &self,
        task_id: &TaskId,
        expected: TaskStatus,
        updated: CleaningTask,
    ) -> Result<CleaningTask, HousekeepingServiceError> {
        self.repository
            .transition_task(expected, updated)
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    HousekeepingServiceError::ConcurrencyConflict(task_id.clone())
                }
                other => other.into(),
            })
    }

    fn fetch_task(&self, task_id: &TaskId) -> Result<CleaningTask, HousekeepingServiceError> {
        self.repository
            .fetch_task(task_id)?
            .ok_or_else(|| HousekeepingServiceError::UnknownTask(task_id.clone()))
    }

    fn fetch_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Reservation, HousekeepingServiceError> {
        self.repository
            .fetch_reservation(reservation_id)?
            .ok_or_else(|| HousekeepingServiceError::UnknownReservation(reservation_id.clone()))
    }

    fn ensure_open(&self, reservation: &Reservation) -> Result<(), HousekeepingServiceError> {
        if reservation.status.is_closed() {
            return Err(HousekeepingServiceError::ReservationClosed {
                reservation_id: reservation.id.clone(),
                status: reservation.status,
            });
        }
        Ok(())
    }

    fn load_settings(&self) -> Result<HousekeepingSettings, HousekeepingServiceError> {
        let settings = self.settings.housekeeping_settings()?;
        settings.validate()?;
        Ok(settings)
    }

    fn notify(&self, event: HousekeepingEvent) {
        if let Err(err) = self.notifications.publish(event) {
            warn!(error = %err, "housekeeping notification dropped");
        }
    }
}

/// Error raised by the housekeeping service.
#[derive(Debug, thiserror::Error)]
pub enum HousekeepingServiceError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("no checkout cleaning task recorded for reservation {0}")]
    TaskNotFound(ReservationId),
    #[error("task {0} not found")]
    UnknownTask(TaskId),
    #[error("reservation {0} not found")]
    UnknownReservation(ReservationId),
    #[error("reservation {reservation_id} is {}", .status.label())]
    ReservationClosed {
        reservation_id: ReservationId,
        status: ReservationStatus,
    },
    #[error("task {0} was updated concurrently; re-read and retry")]
    ConcurrencyConflict(TaskId),
    #[error("check-out must fall after check-in ({check_in} .. {check_out})")]
    InvalidStayWindow {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    #[error("reservation {0} still has an active cleaning schedule; cancel it before re-dating")]
    ScheduleLocked(ReservationId),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
