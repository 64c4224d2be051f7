use crate::infra::{
    ConfiguredSettings, InMemoryHousekeepingRepository, InMemoryNotificationPublisher,
};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use clap::Args;
use std::sync::Arc;
use turnover::config::AppConfig;
use turnover::error::AppError;
use turnover::workflows::housekeeping::{
    CheckoutReport, CheckoutReportRow, CleaningTask, HousekeepingService, ProjectedStatus,
    PropertyId, ReportQuery, ReservationDraft, ScheduledReservation, StaffId, TaskType,
};

type DemoService = HousekeepingService<
    InMemoryHousekeepingRepository,
    ConfiguredSettings,
    InMemoryNotificationPublisher,
>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Check-in date for the demo reservation (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) check_in: Option<NaiveDate>,
    /// Nights the demo guest stays (drives the stay-over plan)
    #[arg(long, default_value_t = 9)]
    pub(crate) nights: u16,
    /// Deep-clean threshold for the demo tenant (kept low so the rotation
    /// escalates within a short run)
    #[arg(long, default_value_t = 3)]
    pub(crate) deep_cleaning_interval: u32,
    /// Skip the rotation escalation portion of the demo
    #[arg(long)]
    pub(crate) skip_rotation: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CheckoutReportArgs {
    /// Report date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Narrow to projected statuses (comma-separated: waiting_checkout,
    /// checked_out, in_progress, completed)
    #[arg(long, value_parser = parse_status, value_delimiter = ',')]
    pub(crate) statuses: Vec<ProjectedStatus>,
    /// Checkout time reported for the second seeded reservation (HH:MM)
    #[arg(long, value_parser = crate::infra::parse_time)]
    pub(crate) reported_checkout: Option<NaiveTime>,
}

fn parse_status(raw: &str) -> Result<ProjectedStatus, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string()))
        .map_err(|_| format!("unknown projected status '{raw}'"))
}

fn build_demo_service(
    deep_cleaning_interval: Option<u32>,
) -> Result<(DemoService, Arc<InMemoryNotificationPublisher>), AppError> {
    let config = AppConfig::load()?;
    let settings = Arc::new(ConfiguredSettings::from_config(&config.housekeeping));
    if let Some(interval) = deep_cleaning_interval {
        // Only the rotation threshold is shortened for the walkthrough; the
        // stay-over interval and timezone still come from the environment.
        settings.set(turnover::workflows::housekeeping::HousekeepingSettings {
            stay_over_interval: config.housekeeping.stay_over_interval,
            deep_cleaning_interval: interval,
            utc_offset_minutes: config.housekeeping.utc_offset_minutes,
        });
    }

    let repository = Arc::new(InMemoryHousekeepingRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let service = HousekeepingService::new(repository, settings, notifications.clone());
    Ok((service, notifications))
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_else(NaiveTime::default)
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_time(hm(hour, minute)), Utc)
}

fn standard_draft(property: &str, check_in: NaiveDate, nights: u16) -> ReservationDraft {
    ReservationDraft {
        property_id: PropertyId(property.to_string()),
        check_in_date: check_in,
        check_out_date: check_in + Duration::days(i64::from(nights.max(1))),
        checkin_time: hm(15, 0),
        checkout_time: hm(11, 0),
        is_priority: false,
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        check_in,
        nights,
        deep_cleaning_interval,
        skip_rotation,
    } = args;

    let check_in = check_in.unwrap_or_else(|| Local::now().date_naive());
    let (service, notifications) = build_demo_service(Some(deep_cleaning_interval))?;

    println!("Housekeeping turnover demo");
    println!(
        "Demo tenant: stay-over every few nights, deep clean after {} check-out cleans",
        deep_cleaning_interval
    );

    let scheduled = service
        .schedule_reservation(standard_draft("villa-01", check_in, nights))
        .map_err(AppError::from)?;
    let checkout_date = scheduled.reservation.check_out_date;
    println!(
        "\nReservation {} at villa-01: {} -> {}",
        scheduled.reservation.id, check_in, checkout_date
    );
    render_task_plan(&scheduled);

    let checkout_task = scheduled
        .tasks
        .last()
        .cloned()
        .ok_or_else(|| AppError::Io(std::io::Error::other("demo plan produced no tasks")))?;

    service
        .report_checkout(
            &scheduled.reservation.id,
            CheckoutReport {
                actual_checkout_time: hm(10, 0),
                is_priority: false,
            },
            at(checkout_date, 10, 2),
        )
        .map_err(AppError::from)?;
    println!("\nGuest reported out at 10:00 on {}", checkout_date);
    render_report(&service, checkout_date, at(checkout_date, 10, 30))?;

    service
        .start_task(
            &checkout_task.id,
            Some(StaffId("demo-cleaner".to_string())),
            at(checkout_date, 10, 45),
        )
        .map_err(AppError::from)?;
    let completed = service
        .complete_task(
            &checkout_task.id,
            Some("demo walkthrough".to_string()),
            at(checkout_date, 11, 35),
        )
        .map_err(AppError::from)?;
    println!(
        "\nCheck-out clean completed in 50 minutes; villa-01 rotation count is now {}",
        completed.cleaning_count
    );

    if !skip_rotation {
        run_rotation_walkthrough(&service, checkout_date)?;
    }

    let events = notifications.events();
    println!("\nNotification events dispatched: {}", events.len());
    for event in events {
        match serde_json::to_string(&event) {
            Ok(json) => println!("- {}", json),
            Err(err) => println!("- <unserializable event: {err}>"),
        }
    }

    Ok(())
}

/// Books one-night turnovers until the rotation escalates, then completes
/// the resulting deep clean to show the counter reset.
fn run_rotation_walkthrough(service: &DemoService, mut date: NaiveDate) -> Result<(), AppError> {
    let property = PropertyId("villa-01".to_string());

    println!("\nRotation walkthrough");
    loop {
        let status = service.rotation_status(&property).map_err(AppError::from)?;
        println!(
            "- rotation count {} -> next checkout clean resolves to {}",
            status.cleaning_count,
            status.next_task_type.label()
        );
        if status.next_task_type == TaskType::DeepCleaning {
            break;
        }

        let scheduled = service
            .schedule_reservation(standard_draft("villa-01", date, 1))
            .map_err(AppError::from)?;
        let task = scheduled
            .tasks
            .last()
            .cloned()
            .ok_or_else(|| AppError::Io(std::io::Error::other("turnover plan was empty")))?;
        let turnover_date = scheduled.reservation.check_out_date;

        service
            .report_checkout(
                &scheduled.reservation.id,
                CheckoutReport {
                    actual_checkout_time: hm(10, 0),
                    is_priority: false,
                },
                at(turnover_date, 10, 5),
            )
            .map_err(AppError::from)?;
        service
            .start_task(&task.id, None, at(turnover_date, 10, 30))
            .map_err(AppError::from)?;
        let completed = service
            .complete_task(&task.id, None, at(turnover_date, 11, 10))
            .map_err(AppError::from)?;
        println!(
            "  completed {} on {} (count {})",
            task.task_type.label(),
            turnover_date,
            completed.cleaning_count
        );

        date = turnover_date;
    }

    let scheduled = service
        .schedule_reservation(standard_draft("villa-01", date, 1))
        .map_err(AppError::from)?;
    let deep_clean = scheduled
        .tasks
        .last()
        .cloned()
        .ok_or_else(|| AppError::Io(std::io::Error::other("deep-clean plan was empty")))?;
    let turnover_date = scheduled.reservation.check_out_date;
    println!(
        "- next reservation's checkout task is a {}",
        deep_clean.task_type.label()
    );

    service
        .report_checkout(
            &scheduled.reservation.id,
            CheckoutReport {
                actual_checkout_time: hm(10, 0),
                is_priority: false,
            },
            at(turnover_date, 10, 5),
        )
        .map_err(AppError::from)?;
    service
        .start_task(&deep_clean.id, None, at(turnover_date, 10, 30))
        .map_err(AppError::from)?;
    let completed = service
        .complete_task(&deep_clean.id, None, at(turnover_date, 13, 0))
        .map_err(AppError::from)?;
    println!(
        "- deep clean completed; rotation count reset to {}",
        completed.cleaning_count
    );

    Ok(())
}

pub(crate) fn run_checkout_report(args: CheckoutReportArgs) -> Result<(), AppError> {
    let CheckoutReportArgs {
        date,
        statuses,
        reported_checkout,
    } = args;

    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let (service, _) = build_demo_service(None)?;
    seed_report_day(&service, date, reported_checkout)?;

    println!("Checkout report for {}", date);
    let rows = service
        .checkout_report(ReportQuery { date, statuses }, at(date, 12, 0))
        .map_err(AppError::from)?;
    render_rows(&rows);
    render_summary(&rows);
    Ok(())
}

/// Three reservations checking out on the report date, one per projected
/// stage: completed, in progress, and still waiting for the guest.
fn seed_report_day(
    service: &DemoService,
    date: NaiveDate,
    reported_checkout: Option<NaiveTime>,
) -> Result<(), AppError> {
    let check_in = date - Duration::days(2);
    let reported = reported_checkout.unwrap_or_else(|| hm(10, 30));

    let done = service
        .schedule_reservation(standard_draft("villa-01", check_in, 2))
        .map_err(AppError::from)?;
    let done_task = done
        .tasks
        .last()
        .cloned()
        .ok_or_else(|| AppError::Io(std::io::Error::other("seed plan was empty")))?;
    service
        .report_checkout(
            &done.reservation.id,
            CheckoutReport {
                actual_checkout_time: hm(9, 45),
                is_priority: false,
            },
            at(date, 9, 50),
        )
        .map_err(AppError::from)?;
    service
        .start_task(
            &done_task.id,
            Some(StaffId("staff-1".to_string())),
            at(date, 10, 0),
        )
        .map_err(AppError::from)?;
    service
        .complete_task(&done_task.id, None, at(date, 10, 50))
        .map_err(AppError::from)?;

    let busy = service
        .schedule_reservation(standard_draft("loft-02", check_in, 2))
        .map_err(AppError::from)?;
    let busy_task = busy
        .tasks
        .last()
        .cloned()
        .ok_or_else(|| AppError::Io(std::io::Error::other("seed plan was empty")))?;
    service
        .report_checkout(
            &busy.reservation.id,
            CheckoutReport {
                actual_checkout_time: reported,
                is_priority: false,
            },
            at(date, 10, 35),
        )
        .map_err(AppError::from)?;
    service
        .start_task(&busy_task.id, None, at(date, 11, 15))
        .map_err(AppError::from)?;

    let mut waiting_draft = standard_draft("cabin-03", check_in, 2);
    waiting_draft.is_priority = true;
    service
        .schedule_reservation(waiting_draft)
        .map_err(AppError::from)?;

    Ok(())
}

fn render_report(
    service: &DemoService,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let rows = service
        .checkout_report(
            ReportQuery {
                date,
                statuses: Vec::new(),
            },
            now,
        )
        .map_err(AppError::from)?;
    render_rows(&rows);
    Ok(())
}

fn render_rows(rows: &[CheckoutReportRow]) {
    if rows.is_empty() {
        println!("No reservations check out on this date.");
        return;
    }

    for row in rows {
        let elapsed = match row.elapsed_minutes {
            Some(minutes) => format!("{minutes}m"),
            None => "--".to_string(),
        };
        let priority = if row.reservation.is_priority {
            " | priority"
        } else {
            ""
        };
        println!(
            "- {} | {} | {} | elapsed {}{}",
            row.reservation.id, row.reservation.property_id, row.status_label, elapsed, priority
        );
    }
}

fn render_summary(rows: &[CheckoutReportRow]) {
    if rows.is_empty() {
        return;
    }

    const ORDER: [ProjectedStatus; 5] = [
        ProjectedStatus::WaitingCheckout,
        ProjectedStatus::CheckedOut,
        ProjectedStatus::InProgress,
        ProjectedStatus::Completed,
        ProjectedStatus::NoTask,
    ];

    println!("\nSummary");
    for status in ORDER {
        let count = rows
            .iter()
            .filter(|row| row.projected_status == status)
            .count();
        if count > 0 {
            println!("- {}: {}", status.label(), count);
        }
    }
}

fn render_task_plan(scheduled: &ScheduledReservation) {
    println!("Cleaning schedule:");
    for task in &scheduled.tasks {
        render_task_line(task);
    }
}

fn render_task_line(task: &CleaningTask) {
    println!(
        "- {} | {} | due {} | status {}",
        task.id,
        task.task_type.label(),
        task.scheduled_date,
        task.status.label()
    );
}
