//! HTTP request handlers for the roster API.
//!
//! Every handler tags its work with a correlation id, logs the outcome and
//! maps [`RosterError`](crate::error::RosterError) into an
//! [`ApiErrorResponse`].

use std::future::Future;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{HolidayDraft, ShiftDefinition};

use super::auth::Caller;
use super::request::{
    ApplyBatchRequest, AssignEmployeeRequest, AvailableEmployeesQuery, DateQuery, DetailedQuery,
    HolidayMapQuery, OptionalProjectQuery, ProjectRangeQuery, ProjectsRangeQuery, RangeQuery,
    ShiftVersionRequest,
};
use super::response::{ApiErrorResponse, StatusResponse};
use super::state::AppState;

type ApiResult<T> = Result<T, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/me/context", get(context_handler))
        // Shift versions
        .route("/shifts/masters", get(active_shifts_handler))
        .route(
            "/projects/:project_id/shifts",
            get(shifts_on_handler).post(create_shift_handler),
        )
        .route("/projects/:project_id/shifts/history", get(shift_history_handler))
        .route("/projects/:project_id/shifts/:shift_code", put(version_shift_handler))
        .route(
            "/projects/:project_id/shifts/:shift_code/resolve",
            get(resolve_shift_handler),
        )
        .route(
            "/projects/:project_id/shift-versions/:version_id/deactivate",
            post(deactivate_shift_handler),
        )
        // Holidays
        .route("/holidays", get(list_holidays_handler).post(upsert_holiday_handler))
        .route("/holidays/map", get(holiday_map_handler))
        .route("/holidays/:holiday_id", delete(delete_holiday_handler))
        // Allocation ledger
        .route("/shifts/weekly", get(weekly_handler))
        .route("/shifts/apply-batch", post(apply_batch_handler))
        .route("/shifts/employees/available", get(available_employees_handler))
        // Reports
        .route("/allowances/allocations", get(approved_allocations_handler))
        .route(
            "/allowances/reports/employee-allowance",
            get(single_project_report_handler),
        )
        .route(
            "/allowances/reports/employee-allowance/aggregate",
            get(aggregate_report_handler),
        )
        .route("/allowances/reports/detailed", get(detailed_report_handler))
        .route("/allowances/reports/employees", get(report_employees_handler))
        // Project membership
        .route(
            "/assignments/projects/:project_id/employees",
            get(project_employees_handler).post(assign_employee_handler),
        )
        .route(
            "/assignments/projects/:project_id/employees/:emp_id",
            delete(remove_employee_handler),
        )
        .with_state(state)
}

/// Runs a handler body and turns its outcome into a logged JSON response.
async fn respond<T, F>(operation: &'static str, success: StatusCode, work: F) -> Response
where
    T: Serialize,
    F: Future<Output = ApiResult<T>>,
{
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, operation, "Processing request");

    let start_time = Instant::now();
    match work.await {
        Ok(body) => {
            info!(
                correlation_id = %correlation_id,
                operation,
                duration_us = start_time.elapsed().as_micros(),
                "Request completed successfully"
            );
            (
                success,
                [(header::CONTENT_TYPE, "application/json")],
                Json(body),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                status = err.status.as_u16(),
                code = %err.error.code,
                error = %err.error.message,
                "Request failed"
            );
            err.into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Response {
    respond("health", StatusCode::OK, async move {
        state.service().store().health_check().await?;
        Ok::<_, ApiErrorResponse>(StatusResponse::new("ok"))
    })
    .await
}

async fn context_handler(State(state): State<AppState>, Caller(caller): Caller) -> Response {
    respond("caller_context", StatusCode::OK, async move {
        Ok::<_, ApiErrorResponse>(state.service().caller_context(&caller).await?)
    })
    .await
}

// =====================================================================
// Shift versions
// =====================================================================

async fn active_shifts_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<ProjectsRangeQuery>, QueryRejection>,
) -> Response {
    respond("active_shifts", StatusCode::OK, async move {
        let Query(query) = query?;
        let project_ids = query.project_ids()?;
        let range = query.range()?;
        let body = state
            .service()
            .active_shifts(&caller, &project_ids, &range)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn shifts_on_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Response {
    respond("shifts_on", StatusCode::OK, async move {
        let Path(project_id) = path?;
        let Query(query) = query?;
        let body = state
            .service()
            .shifts_on(&caller, project_id, query.date)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn shift_history_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    respond("shift_history", StatusCode::OK, async move {
        let Path(project_id) = path?;
        Ok::<_, ApiErrorResponse>(state.service().shift_history(&caller, project_id).await?)
    })
    .await
}

async fn create_shift_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ShiftDefinition>, JsonRejection>,
) -> Response {
    respond("create_shift", StatusCode::CREATED, async move {
        let Path(project_id) = path?;
        let Json(definition) = payload?;
        let body = state
            .service()
            .create_shift(&caller, project_id, &definition)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn version_shift_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<(i64, String)>, PathRejection>,
    payload: Result<Json<ShiftVersionRequest>, JsonRejection>,
) -> Response {
    respond("version_shift", StatusCode::OK, async move {
        let Path((project_id, shift_code)) = path?;
        let Json(request) = payload?;
        let definition = request.into_definition(&shift_code);
        let body = state
            .service()
            .version_shift(&caller, project_id, &shift_code, &definition)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn resolve_shift_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<(i64, String)>, PathRejection>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Response {
    respond("resolve_shift", StatusCode::OK, async move {
        let Path((project_id, shift_code)) = path?;
        let Query(query) = query?;
        let body = state
            .service()
            .resolve_shift(&caller, project_id, &shift_code, query.date)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn deactivate_shift_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> Response {
    respond("deactivate_shift_version", StatusCode::OK, async move {
        let Path((project_id, version_id)) = path?;
        state
            .service()
            .deactivate_shift_version(&caller, project_id, version_id)
            .await?;
        Ok::<_, ApiErrorResponse>(StatusResponse::new("deactivated"))
    })
    .await
}

// =====================================================================
// Holidays
// =====================================================================

async fn list_holidays_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<OptionalProjectQuery>, QueryRejection>,
) -> Response {
    respond("list_holidays", StatusCode::OK, async move {
        let Query(query) = query?;
        let body = state
            .service()
            .list_holidays(&caller, query.project_id)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn upsert_holiday_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<HolidayDraft>, JsonRejection>,
) -> Response {
    respond("upsert_holiday", StatusCode::OK, async move {
        let Json(draft) = payload?;
        Ok::<_, ApiErrorResponse>(state.service().upsert_holiday(&caller, &draft).await?)
    })
    .await
}

async fn delete_holiday_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    respond("delete_holiday", StatusCode::OK, async move {
        let Path(holiday_id) = path?;
        state.service().delete_holiday(&caller, holiday_id).await?;
        Ok::<_, ApiErrorResponse>(StatusResponse::new("deleted"))
    })
    .await
}

async fn holiday_map_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<HolidayMapQuery>, QueryRejection>,
) -> Response {
    respond("holiday_map", StatusCode::OK, async move {
        let Query(query) = query?;
        let range = query.range()?;
        let body = state
            .service()
            .holiday_map(&caller, query.project(), &range)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

// =====================================================================
// Allocation ledger
// =====================================================================

async fn weekly_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<ProjectRangeQuery>, QueryRejection>,
) -> Response {
    respond("weekly_view", StatusCode::OK, async move {
        let Query(query) = query?;
        let range = query.range()?;
        let body = state
            .service()
            .weekly_view(&caller, query.project_id, &range)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn apply_batch_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<ApplyBatchRequest>, JsonRejection>,
) -> Response {
    respond("apply_batch", StatusCode::OK, async move {
        let Json(request) = payload?;
        let body = state
            .service()
            .apply_batch(&caller, request.project_id, &request.batch)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn available_employees_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<AvailableEmployeesQuery>, QueryRejection>,
) -> Response {
    respond("available_employees", StatusCode::OK, async move {
        let Query(query) = query?;
        let body = state
            .service()
            .available_employees(&caller, query.project_id, &query.shift_code, query.shift_date)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

// =====================================================================
// Reports
// =====================================================================

async fn approved_allocations_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<ProjectsRangeQuery>, QueryRejection>,
) -> Response {
    respond("approved_allocations", StatusCode::OK, async move {
        let Query(query) = query?;
        let project_ids = query.project_ids()?;
        let range = query.range()?;
        let body = state
            .service()
            .approved_allocations(&caller, &project_ids, &range, query.emp_id)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn single_project_report_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<ProjectRangeQuery>, QueryRejection>,
) -> Response {
    respond("single_project_report", StatusCode::OK, async move {
        let Query(query) = query?;
        let range = query.range()?;
        let body = state
            .service()
            .single_project_report(&caller, query.project_id, range)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn aggregate_report_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Response {
    respond("aggregate_report", StatusCode::OK, async move {
        let Query(query) = query?;
        let range = query.range()?;
        Ok::<_, ApiErrorResponse>(state.service().aggregate_report(&caller, range).await?)
    })
    .await
}

async fn detailed_report_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<DetailedQuery>, QueryRejection>,
) -> Response {
    respond("detailed_report", StatusCode::OK, async move {
        let Query(query) = query?;
        let query = query.to_query()?;
        Ok::<_, ApiErrorResponse>(state.service().detailed_report(&caller, query).await?)
    })
    .await
}

async fn report_employees_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<OptionalProjectQuery>, QueryRejection>,
) -> Response {
    respond("report_employees", StatusCode::OK, async move {
        let Query(query) = query?;
        let body = state
            .service()
            .report_employees(&caller, query.project_id)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

// =====================================================================
// Project membership
// =====================================================================

async fn project_employees_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    respond("project_employees", StatusCode::OK, async move {
        let Path(project_id) = path?;
        let body = state
            .service()
            .project_employees(&caller, project_id)
            .await?;
        Ok::<_, ApiErrorResponse>(body)
    })
    .await
}

async fn assign_employee_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AssignEmployeeRequest>, JsonRejection>,
) -> Response {
    respond("assign_employee", StatusCode::CREATED, async move {
        let Path(project_id) = path?;
        let Json(request) = payload?;
        state
            .service()
            .assign_employee(&caller, project_id, request.emp_id)
            .await?;
        Ok::<_, ApiErrorResponse>(StatusResponse::new("assigned"))
    })
    .await
}

async fn remove_employee_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> Response {
    respond("remove_employee", StatusCode::OK, async move {
        let Path((project_id, emp_id)) = path?;
        state
            .service()
            .remove_employee(&caller, project_id, emp_id)
            .await?;
        Ok::<_, ApiErrorResponse>(StatusResponse::new("removed"))
    })
    .await
}
