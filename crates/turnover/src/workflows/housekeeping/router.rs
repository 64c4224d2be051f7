use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CheckoutReport, PropertyId, ReservationDraft, ReservationId, TaskId};
use super::projection::ReportQuery;
use super::repository::{HousekeepingRepository, NotificationPublisher, RepositoryError};
use super::service::{HousekeepingService, HousekeepingServiceError};
use super::settings::SettingsSource;

/// Router builder exposing the housekeeping workflow over HTTP.
pub fn housekeeping_router<R, S, N>(service: Arc<HousekeepingService<R, S, N>>) -> Router
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/housekeeping/reservations",
            post(schedule_reservation_handler::<R, S, N>),
        )
        .route(
            "/api/v1/housekeeping/reservations/:reservation_id/check-in",
            post(check_in_handler::<R, S, N>),
        )
        .route(
            "/api/v1/housekeeping/reservations/:reservation_id/checkout",
            post(checkout_handler::<R, S, N>),
        )
        .route(
            "/api/v1/housekeeping/reservations/:reservation_id/cancel",
            post(cancel_reservation_handler::<R, S, N>),
        )
        .route(
            "/api/v1/housekeeping/tasks/:task_id",
            get(get_task_handler::<R, S, N>),
        )
        .route(
            "/api/v1/housekeeping/tasks/:task_id/start",
            post(start_task_handler::<R, S, N>),
        )
        .route(
            "/api/v1/housekeeping/tasks/:task_id/complete",
            post(complete_task_handler::<R, S, N>),
        )
        .route(
            "/api/v1/housekeeping/tasks/:task_id/cancel",
            post(cancel_task_handler::<R, S, N>),
        )
        .route(
            "/api/v1/housekeeping/deep-cleanings",
            post(schedule_deep_cleaning_handler::<R, S, N>),
        )
        .route(
            "/api/v1/housekeeping/properties/:property_id/rotation",
            get(rotation_status_handler::<R, S, N>),
        )
        .route(
            "/api/v1/housekeeping/report",
            post(checkout_report_handler::<R, S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckInRequest {
    pub(crate) actual_checkin_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartTaskRequest {
    #[serde(default)]
    pub(crate) assigned_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompleteTaskRequest {
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeepCleaningRequest {
    pub(crate) property_id: String,
    pub(crate) scheduled_date: NaiveDate,
}

pub(crate) async fn schedule_reservation_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    axum::Json(draft): axum::Json<ReservationDraft>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    match service.schedule_reservation(draft) {
        Ok(scheduled) => (StatusCode::CREATED, axum::Json(scheduled)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn check_in_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    Path(reservation_id): Path<String>,
    axum::Json(request): axum::Json<CheckInRequest>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    let id = ReservationId(reservation_id);
    match service.report_check_in(&id, request.actual_checkin_time) {
        Ok(reservation) => (StatusCode::OK, axum::Json(reservation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn checkout_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    Path(reservation_id): Path<String>,
    axum::Json(report): axum::Json<CheckoutReport>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    let id = ReservationId(reservation_id);
    match service.report_checkout(&id, report, Utc::now()) {
        Ok(task) => (StatusCode::OK, axum::Json(task)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_reservation_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    Path(reservation_id): Path<String>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    let id = ReservationId(reservation_id);
    match service.cancel_reservation(&id) {
        Ok(cancelled) => (
            StatusCode::OK,
            axum::Json(json!({
                "reservation_id": id,
                "cancelled_tasks": cancelled,
            })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_task_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    Path(task_id): Path<String>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    let id = TaskId(task_id);
    match service.get_task(&id) {
        Ok(task) => (StatusCode::OK, axum::Json(task)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn start_task_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    Path(task_id): Path<String>,
    axum::Json(request): axum::Json<StartTaskRequest>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    let id = TaskId(task_id);
    let assigned_to = request.assigned_to.map(super::domain::StaffId);
    match service.start_task(&id, assigned_to, Utc::now()) {
        Ok(task) => (StatusCode::OK, axum::Json(task)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_task_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    Path(task_id): Path<String>,
    axum::Json(request): axum::Json<CompleteTaskRequest>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    let id = TaskId(task_id);
    match service.complete_task(&id, request.notes, Utc::now()) {
        Ok(completed) => (StatusCode::OK, axum::Json(completed)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_task_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    Path(task_id): Path<String>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    let id = TaskId(task_id);
    match service.cancel_task(&id) {
        Ok(task) => (StatusCode::OK, axum::Json(task)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn schedule_deep_cleaning_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    axum::Json(request): axum::Json<DeepCleaningRequest>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    let property_id = PropertyId(request.property_id);
    match service.schedule_deep_cleaning(property_id, request.scheduled_date) {
        Ok(task) => (StatusCode::CREATED, axum::Json(task)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rotation_status_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    Path(property_id): Path<String>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    let id = PropertyId(property_id);
    match service.rotation_status(&id) {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn checkout_report_handler<R, S, N>(
    State(service): State<Arc<HousekeepingService<R, S, N>>>,
    axum::Json(query): axum::Json<ReportQuery>,
) -> Response
where
    R: HousekeepingRepository + 'static,
    S: SettingsSource + 'static,
    N: NotificationPublisher + 'static,
{
    match service.checkout_report(query, Utc::now()) {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: HousekeepingServiceError) -> Response {
    let status = match &error {
        HousekeepingServiceError::Transition(_)
        | HousekeepingServiceError::ConcurrencyConflict(_)
        | HousekeepingServiceError::ScheduleLocked(_)
        | HousekeepingServiceError::ReservationClosed { .. }
        | HousekeepingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        HousekeepingServiceError::TaskNotFound(_)
        | HousekeepingServiceError::UnknownTask(_)
        | HousekeepingServiceError::UnknownReservation(_)
        | HousekeepingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        HousekeepingServiceError::InvalidStayWindow { .. }
        | HousekeepingServiceError::Settings(_) => StatusCode::UNPROCESSABLE_ENTITY,
        HousekeepingServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let body = axum::Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}
