use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    CleaningTask, PropertyId, Reservation, ReservationId, TaskId, TaskStatus, TaskType,
};
use super::rotation::RotationEffect;

/// Storage abstraction so the workflow can be exercised in isolation.
///
/// Two operations carry the concurrency contract. `transition_task` is a
/// compare-and-set: the write lands only while the stored status still
/// equals `expected`, so racing staff members cannot both win the same
/// transition. `complete_task` additionally applies the rotation effect to
/// the property counter inside the same guarded operation; a completed
/// check-out clean with a stale counter must be impossible.
pub trait HousekeepingRepository: Send + Sync {
    fn insert_reservation(&self, reservation: Reservation)
        -> Result<Reservation, RepositoryError>;
    fn fetch_reservation(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError>;
    fn update_reservation(&self, reservation: Reservation) -> Result<(), RepositoryError>;
    fn reservations_checking_out(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError>;
    /// Marks the reservation cancelled and cancels its non-terminal tasks
    /// in one operation, returning the tasks that were cancelled.
    fn cancel_reservation(
        &self,
        id: &ReservationId,
    ) -> Result<(Reservation, Vec<CleaningTask>), RepositoryError>;

    /// Rejects a second non-cancelled task for the same reservation and
    /// task type with `Conflict`.
    fn insert_task(&self, task: CleaningTask) -> Result<CleaningTask, RepositoryError>;
    fn fetch_task(&self, id: &TaskId) -> Result<Option<CleaningTask>, RepositoryError>;
    fn tasks_for_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Vec<CleaningTask>, RepositoryError>;
    /// The reservation's non-cancelled checkout-type task (check-out or
    /// deep clean), if one exists.
    fn checkout_task_for_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Option<CleaningTask>, RepositoryError>;
    fn update_task(&self, task: CleaningTask) -> Result<(), RepositoryError>;
    fn transition_task(
        &self,
        expected: TaskStatus,
        task: CleaningTask,
    ) -> Result<CleaningTask, RepositoryError>;
    fn complete_task(
        &self,
        expected: TaskStatus,
        task: CleaningTask,
        effect: RotationEffect,
    ) -> Result<(CleaningTask, u32), RepositoryError>;

    /// Rotation counter reads/mutations. Unknown properties read as zero;
    /// increments must be atomic with respect to other completions on the
    /// same property.
    fn cleaning_count(&self, property_id: &PropertyId) -> Result<u32, RepositoryError>;
    fn advance_cleaning_count(&self, property_id: &PropertyId) -> Result<u32, RepositoryError>;
    fn reset_cleaning_count(&self, property_id: &PropertyId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was updated concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Domain events emitted after a state change commits. Delivery is
/// fire-and-forget; the staff messaging transport subscribes out of
/// process and failures never roll back the originating operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HousekeepingEvent {
    CheckoutReported {
        reservation_id: ReservationId,
        property_id: PropertyId,
        task_id: TaskId,
        is_priority: bool,
    },
    TaskCompleted {
        task_id: TaskId,
        property_id: PropertyId,
        task_type: TaskType,
        cleaning_count: u32,
    },
}

/// Trait describing the outbound notification hook (e.g., the Telegram
/// bridge adapter).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, event: HousekeepingEvent) -> Result<(), NotificationError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
