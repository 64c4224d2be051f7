use chrono::{DateTime, Utc};
use std::fmt;

use super::domain::{CleaningTask, StaffId, TaskId, TaskStatus};
use super::rotation::RotationEffect;

/// Transition being attempted, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAction {
    Start,
    Complete,
    Cancel,
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        };
        write!(f, "{}", verb)
    }
}

/// Rejected task transition. These are recoverable: the caller surfaces the
/// message and the operator retries against the task's current state.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} task {task_id} from status {}", .status.label())]
    InvalidState {
        task_id: TaskId,
        status: TaskStatus,
        action: TransitionAction,
    },
}

/// `pending -> in_progress`. Starting unassigned is valid; `assigned_at` is
/// only stamped when a staff member is named.
pub(crate) fn start(
    task: &CleaningTask,
    assigned_to: Option<StaffId>,
    now: DateTime<Utc>,
) -> Result<CleaningTask, TransitionError> {
    if task.status != TaskStatus::Pending {
        return Err(TransitionError::InvalidState {
            task_id: task.id.clone(),
            status: task.status,
            action: TransitionAction::Start,
        });
    }

    let mut updated = task.clone();
    updated.status = TaskStatus::InProgress;
    updated.started_at = Some(now);
    updated.assigned_at = assigned_to.is_some().then_some(now);
    updated.assigned_to = assigned_to;
    Ok(updated)
}

/// `in_progress -> completed`, returning the rotation effect the repository
/// must apply in the same transaction as the status write.
pub(crate) fn complete(
    task: &CleaningTask,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<(CleaningTask, RotationEffect), TransitionError> {
    if task.status != TaskStatus::InProgress {
        return Err(TransitionError::InvalidState {
            task_id: task.id.clone(),
            status: task.status,
            action: TransitionAction::Complete,
        });
    }

    let mut updated = task.clone();
    updated.status = TaskStatus::Completed;
    updated.completed_at = Some(now);
    if notes.is_some() {
        updated.notes = notes;
    }

    let effect = RotationEffect::for_task_type(task.task_type);
    Ok((updated, effect))
}

/// `pending | in_progress -> cancelled`. Cancelled cleans never touch the
/// rotation counter.
pub(crate) fn cancel(task: &CleaningTask) -> Result<CleaningTask, TransitionError> {
    if task.status.is_terminal() {
        return Err(TransitionError::InvalidState {
            task_id: task.id.clone(),
            status: task.status,
            action: TransitionAction::Cancel,
        });
    }

    let mut updated = task.clone();
    updated.status = TaskStatus::Cancelled;
    Ok(updated)
}
