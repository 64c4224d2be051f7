use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::workflows::housekeeping::domain::{
    CleaningTask, PropertyId, Reservation, ReservationDraft, ReservationId, ReservationStatus,
    TaskId, TaskStatus, TaskType,
};
use crate::workflows::housekeeping::repository::{
    HousekeepingEvent, HousekeepingRepository, NotificationError, NotificationPublisher,
    RepositoryError,
};
use crate::workflows::housekeeping::rotation::RotationEffect;
use crate::workflows::housekeeping::service::HousekeepingService;
use crate::workflows::housekeeping::settings::{
    HousekeepingSettings, SettingsError, SettingsSource,
};

#[derive(Default)]
struct RepositoryState {
    reservations: HashMap<ReservationId, Reservation>,
    tasks: HashMap<TaskId, CleaningTask>,
    counters: HashMap<PropertyId, u32>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    state: Arc<Mutex<RepositoryState>>,
}

impl HousekeepingRepository for MemoryRepository {
    fn insert_reservation(
        &self,
        reservation: Reservation,
    ) -> Result<Reservation, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        if state.reservations.contains_key(&reservation.id) {
            return Err(RepositoryError::Conflict);
        }
        state
            .reservations
            .insert(reservation.id.clone(), reservation.clone());
        Ok(reservation)
    }

    fn fetch_reservation(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.reservations.get(id).cloned())
    }

    fn update_reservation(&self, reservation: Reservation) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        if !state.reservations.contains_key(&reservation.id) {
            return Err(RepositoryError::NotFound);
        }
        state.reservations.insert(reservation.id.clone(), reservation);
        Ok(())
    }

    fn reservations_checking_out(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        let mut matches: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|reservation| reservation.check_out_date == date)
            .filter(|reservation| reservation.status != ReservationStatus::Cancelled)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(matches)
    }

    fn cancel_reservation(
        &self,
        id: &ReservationId,
    ) -> Result<(Reservation, Vec<CleaningTask>), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let mut reservation = state
            .reservations
            .get(id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;
        reservation.status = ReservationStatus::Cancelled;
        state.reservations.insert(id.clone(), reservation.clone());

        let mut cancelled = Vec::new();
        for task in state.tasks.values_mut() {
            if task.reservation_id.as_ref() == Some(id) && !task.status.is_terminal() {
                task.status = TaskStatus::Cancelled;
                cancelled.push(task.clone());
            }
        }
        cancelled.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok((reservation, cancelled))
    }

    fn insert_task(&self, task: CleaningTask) -> Result<CleaningTask, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        if state.tasks.contains_key(&task.id) {
            return Err(RepositoryError::Conflict);
        }
        if let Some(reservation_id) = &task.reservation_id {
            let duplicate = state.tasks.values().any(|existing| {
                existing.reservation_id.as_ref() == Some(reservation_id)
                    && existing.task_type == task.task_type
                    && existing.status != TaskStatus::Cancelled
            });
            if duplicate {
                return Err(RepositoryError::Conflict);
            }
        }
        state.tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    fn fetch_task(&self, id: &TaskId) -> Result<Option<CleaningTask>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.tasks.get(id).cloned())
    }

    fn tasks_for_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Vec<CleaningTask>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        let mut tasks: Vec<CleaningTask> = state
            .tasks
            .values()
            .filter(|task| task.reservation_id.as_ref() == Some(reservation_id))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            a.scheduled_date
                .cmp(&b.scheduled_date)
                .then(a.id.0.cmp(&b.id.0))
        });
        Ok(tasks)
    }

    fn checkout_task_for_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Option<CleaningTask>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state
            .tasks
            .values()
            .find(|task| {
                task.reservation_id.as_ref() == Some(reservation_id)
                    && task.task_type.is_checkout_clean()
                    && task.status != TaskStatus::Cancelled
            })
            .cloned())
    }

    fn update_task(&self, task: CleaningTask) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        if !state.tasks.contains_key(&task.id) {
            return Err(RepositoryError::NotFound);
        }
        state.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    fn transition_task(
        &self,
        expected: TaskStatus,
        task: CleaningTask,
    ) -> Result<CleaningTask, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let current = state.tasks.get(&task.id).ok_or(RepositoryError::NotFound)?;
        if current.status != expected {
            return Err(RepositoryError::Conflict);
        }
        state.tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    fn complete_task(
        &self,
        expected: TaskStatus,
        task: CleaningTask,
        effect: RotationEffect,
    ) -> Result<(CleaningTask, u32), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let current = state.tasks.get(&task.id).ok_or(RepositoryError::NotFound)?;
        if current.status != expected {
            return Err(RepositoryError::Conflict);
        }
        let property_id = task.property_id.clone();
        state.tasks.insert(task.id.clone(), task.clone());

        let counter = state.counters.entry(property_id).or_default();
        match effect {
            RotationEffect::Advance => *counter += 1,
            RotationEffect::Reset => *counter = 0,
            RotationEffect::None => {}
        }
        Ok((task, *counter))
    }

    fn cleaning_count(&self, property_id: &PropertyId) -> Result<u32, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.counters.get(property_id).copied().unwrap_or(0))
    }

    fn advance_cleaning_count(&self, property_id: &PropertyId) -> Result<u32, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let counter = state.counters.entry(property_id.clone()).or_default();
        *counter += 1;
        Ok(*counter)
    }

    fn reset_cleaning_count(&self, property_id: &PropertyId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.counters.insert(property_id.clone(), 0);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<HousekeepingEvent>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<HousekeepingEvent> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, event: HousekeepingEvent) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) struct FixedSettings {
    current: Mutex<HousekeepingSettings>,
}

impl FixedSettings {
    pub(super) fn new(settings: HousekeepingSettings) -> Self {
        Self {
            current: Mutex::new(settings),
        }
    }
}

impl SettingsSource for FixedSettings {
    fn housekeeping_settings(&self) -> Result<HousekeepingSettings, SettingsError> {
        Ok(self.current.lock().expect("settings mutex poisoned").clone())
    }
}

pub(super) fn settings() -> HousekeepingSettings {
    HousekeepingSettings {
        stay_over_interval: 3,
        deep_cleaning_interval: 11,
        utc_offset_minutes: 0,
    }
}

pub(super) fn build_service() -> (
    HousekeepingService<MemoryRepository, FixedSettings, MemoryNotifications>,
    Arc<MemoryRepository>,
    Arc<FixedSettings>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let settings_source = Arc::new(FixedSettings::new(settings()));
    let notifications = Arc::new(MemoryNotifications::default());
    let service = HousekeepingService::new(
        repository.clone(),
        settings_source.clone(),
        notifications.clone(),
    );
    (service, repository, settings_source, notifications)
}

pub(super) fn draft(property: &str) -> ReservationDraft {
    ReservationDraft {
        property_id: PropertyId(property.to_string()),
        check_in_date: date(2025, 1, 1),
        check_out_date: date(2025, 1, 10),
        checkin_time: time(15, 0),
        checkout_time: time(11, 0),
        is_priority: false,
    }
}

pub(super) fn reservation(property: &str) -> Reservation {
    Reservation {
        id: ReservationId("res-fixture".to_string()),
        property_id: PropertyId(property.to_string()),
        check_in_date: date(2025, 1, 1),
        check_out_date: date(2025, 1, 10),
        checkin_time: time(15, 0),
        checkout_time: time(11, 0),
        actual_checkin_time: None,
        actual_checkout_time: None,
        status: ReservationStatus::Active,
        is_priority: false,
    }
}

pub(super) fn pending_task(task_type: TaskType) -> CleaningTask {
    CleaningTask {
        id: TaskId("task-fixture".to_string()),
        property_id: PropertyId("prop-1".to_string()),
        reservation_id: Some(ReservationId("res-fixture".to_string())),
        task_type,
        status: TaskStatus::Pending,
        scheduled_date: date(2025, 1, 10),
        assigned_to: None,
        assigned_at: None,
        started_at: None,
        completed_at: None,
        checkout_reported_at: None,
        is_priority: false,
        notes: None,
    }
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn instant(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid instant")
}
