use chrono::{NaiveDate, NaiveTime};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use turnover::config::HousekeepingConfig;
use turnover::workflows::housekeeping::{
    CleaningTask, HousekeepingEvent, HousekeepingRepository, HousekeepingSettings,
    NotificationError, NotificationPublisher, PropertyId, Reservation, ReservationId,
    ReservationStatus, RepositoryError, RotationEffect, SettingsError, SettingsSource, TaskId,
    TaskStatus,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct RepositoryState {
    reservations: HashMap<ReservationId, Reservation>,
    tasks: HashMap<TaskId, CleaningTask>,
    counters: HashMap<PropertyId, u32>,
}

/// In-memory repository. One mutex guards all state, so the compare-and-set
/// transitions and the combined complete+rotation operation are atomic.
#[derive(Default, Clone)]
pub(crate) struct InMemoryHousekeepingRepository {
    state: Arc<Mutex<RepositoryState>>,
}

impl HousekeepingRepository for InMemoryHousekeepingRepository {
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
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<HousekeepingEvent>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, event: HousekeepingEvent) -> Result<(), NotificationError> {
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(event);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<HousekeepingEvent> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

/// Settings source seeded from the environment configuration. A production
/// deployment reads the tenant's row instead; the contract is the same:
/// return the live value on every call.
pub(crate) struct ConfiguredSettings {
    current: Mutex<HousekeepingSettings>,
}

impl ConfiguredSettings {
    pub(crate) fn from_config(config: &HousekeepingConfig) -> Self {
        Self::with(HousekeepingSettings {
            stay_over_interval: config.stay_over_interval,
            deep_cleaning_interval: config.deep_cleaning_interval,
            utc_offset_minutes: config.utc_offset_minutes,
        })
    }

    pub(crate) fn with(settings: HousekeepingSettings) -> Self {
        Self {
            current: Mutex::new(settings),
        }
    }

    pub(crate) fn set(&self, settings: HousekeepingSettings) {
        *self.current.lock().expect("settings mutex poisoned") = settings;
    }
}

impl SettingsSource for ConfiguredSettings {
    fn housekeeping_settings(&self) -> Result<HousekeepingSettings, SettingsError> {
        Ok(self.current.lock().expect("settings mutex poisoned").clone())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
        .map_err(|err| format!("failed to parse '{raw}' as HH:MM ({err})"))
}
