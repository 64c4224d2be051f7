//! Housekeeping turnover workflow: cleaning-rotation bookkeeping, task
//! planning for reservations, the guarded task lifecycle, and the
//! checkout-report projection consumed by the staff-facing screens.

pub mod domain;
mod lifecycle;
pub mod projection;
pub mod repository;
mod resolver;
mod rotation;
pub mod router;
pub mod service;
pub mod settings;

#[cfg(test)]
mod tests;

pub use domain::{
    CheckoutReport, CleaningTask, PropertyId, Reservation, ReservationDraft, ReservationId,
    ReservationStatus, StaffId, TaskId, TaskStatus, TaskType,
};
pub use lifecycle::{TransitionAction, TransitionError};
pub use projection::{CheckoutReportRow, ProjectedStatus, ReportQuery};
pub use repository::{
    HousekeepingEvent, HousekeepingRepository, NotificationError, NotificationPublisher,
    RepositoryError,
};
pub use rotation::{RotationCounter, RotationEffect};
pub use router::housekeeping_router;
pub use service::{
    CompletedTask, HousekeepingService, HousekeepingServiceError, RotationStatus,
    ScheduledReservation,
};
pub use settings::{HousekeepingSettings, SettingsError, SettingsSource};
