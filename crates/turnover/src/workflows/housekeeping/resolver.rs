use chrono::{Duration, NaiveDate};

use super::domain::{Reservation, TaskType};
use super::settings::HousekeepingSettings;

/// One planned cleaning visit for a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedTask {
    pub task_type: TaskType,
    pub scheduled_date: NaiveDate,
}

/// Plans the cleaning schedule for a newly created reservation: stay-over
/// cleans at each interval boundary inside the stay, then the checkout-date
/// clean whose type the rotation counter already resolved.
pub(crate) fn plan_reservation_tasks(
    reservation: &Reservation,
    settings: &HousekeepingSettings,
    checkout_task_type: TaskType,
) -> Vec<PlannedTask> {
    let mut plan: Vec<PlannedTask> = stay_over_dates(
        reservation.check_in_date,
        reservation.check_out_date,
        settings.stay_over_interval,
    )
    .into_iter()
    .map(|scheduled_date| PlannedTask {
        task_type: TaskType::StayOver,
        scheduled_date,
    })
    .collect();

    plan.push(PlannedTask {
        task_type: checkout_task_type,
        scheduled_date: reservation.check_out_date,
    });

    plan
}

/// Stay-over boundaries: check-in + k * interval for every k >= 1 where the
/// date falls strictly before the check-out date. A boundary landing on the
/// checkout date belongs to the checkout clean, not a stay-over.
pub(crate) fn stay_over_dates(
    check_in: NaiveDate,
    check_out: NaiveDate,
    interval: u32,
) -> Vec<NaiveDate> {
    let step = Duration::days(i64::from(interval));
    let mut dates = Vec::new();
    let mut date = check_in + step;
    while date < check_out {
        dates.push(date);
        date = date + step;
    }
    dates
}
