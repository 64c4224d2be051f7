use std::sync::Arc;

use super::domain::{PropertyId, TaskType};
use super::repository::{HousekeepingRepository, RepositoryError};
use super::settings::HousekeepingSettings;

/// Counter mutation a completed task applies to its property's rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationEffect {
    None,
    Advance,
    Reset,
}

impl RotationEffect {
    pub const fn for_task_type(task_type: TaskType) -> Self {
        match task_type {
            TaskType::CheckOut => Self::Advance,
            TaskType::DeepCleaning => Self::Reset,
            TaskType::StayOver => Self::None,
        }
    }
}

/// Decides whether the next checkout clean escalates to a deep clean. The
/// comparison is `>=`, so a counter already past a lowered interval still
/// escalates immediately.
pub(crate) const fn next_checkout_task_type(
    cleaning_count: u32,
    deep_cleaning_interval: u32,
) -> TaskType {
    if cleaning_count.saturating_add(1) >= deep_cleaning_interval {
        TaskType::DeepCleaning
    } else {
        TaskType::CheckOut
    }
}

/// Per-property rotation counter. Reads and mutations go through the
/// repository's atomic operations so concurrent completions on the same
/// property never lose an increment.
pub struct RotationCounter<R> {
    repository: Arc<R>,
}

impl<R> RotationCounter<R>
where
    R: HousekeepingRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Pure read: resolves the type of the property's next checkout clean
    /// against the interval in the supplied settings, which the caller has
    /// re-read for this request.
    pub fn peek_next_task_type(
        &self,
        property_id: &PropertyId,
        settings: &HousekeepingSettings,
    ) -> Result<TaskType, RepositoryError> {
        let count = self.repository.cleaning_count(property_id)?;
        Ok(next_checkout_task_type(count, settings.deep_cleaning_interval))
    }

    pub fn cleaning_count(&self, property_id: &PropertyId) -> Result<u32, RepositoryError> {
        self.repository.cleaning_count(property_id)
    }

    /// Atomic increment; called only when a check-out clean completes.
    pub fn advance(&self, property_id: &PropertyId) -> Result<u32, RepositoryError> {
        self.repository.advance_cleaning_count(property_id)
    }

    /// Atomic reset to zero; called only when a deep clean completes.
    pub fn reset(&self, property_id: &PropertyId) -> Result<(), RepositoryError> {
        self.repository.reset_cleaning_count(property_id)
    }
}
