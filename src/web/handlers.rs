//! REST handlers
//!
//! Every endpoint wraps its payload in the same envelope. Pre-flight
//! rejections map to HTTP statuses: unknown task 404, disabled or
//! already-running 409. A failed run is not an HTTP error; the recorded
//! result is returned with a 200.

use crate::catalog::TaskOverview;
use crate::errors::EngineError;
use crate::health::SystemHealthSnapshot;
use crate::history::TaskResult;
use crate::run_guard::{RunGuardStatus, RunTrigger};
use crate::scheduler::SweepReport;
use crate::web::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

fn engine_error_response(error: EngineError) -> (StatusCode, Json<ApiResponse<()>>) {
    let status = match &error {
        EngineError::TaskNotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::TaskDisabled { .. }
        | EngineError::TaskAlreadyRunning { .. }
        | EngineError::SweepAlreadyRunning => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::error(error.to_string())))
}

pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Vec<TaskOverview>> {
    Ok(Json(ApiResponse::success(state.catalog.overview().await)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<TaskOverview> {
    let overview = state
        .catalog
        .get_overview(&task_id)
        .await
        .map_err(engine_error_response)?;
    Ok(Json(ApiResponse::success(overview)))
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(request): Json<ToggleRequest>,
) -> ApiResult<TaskOverview> {
    state
        .catalog
        .toggle_task(&task_id, request.enabled)
        .await
        .map_err(engine_error_response)?;
    let overview = state
        .catalog
        .get_overview(&task_id)
        .await
        .map_err(engine_error_response)?;
    Ok(Json(ApiResponse::success(overview)))
}

pub async fn run_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<TaskResult> {
    let result = state
        .executor
        .run_task(&task_id, RunTrigger::Manual)
        .await
        .map_err(engine_error_response)?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn run_all_tasks(State(state): State<AppState>) -> ApiResult<SweepReport> {
    let report = state
        .sweep
        .run_all()
        .await
        .map_err(engine_error_response)?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn get_task_results(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Vec<TaskResult>> {
    if !state.catalog.contains(&task_id).await {
        return Err(engine_error_response(EngineError::TaskNotFound { task_id }));
    }
    Ok(Json(ApiResponse::success(
        state.history.get_results(&task_id).await,
    )))
}

pub async fn get_all_results(
    State(state): State<AppState>,
) -> ApiResult<HashMap<String, Vec<TaskResult>>> {
    Ok(Json(ApiResponse::success(
        state.history.get_all_results().await,
    )))
}

pub async fn get_system_health(State(state): State<AppState>) -> ApiResult<SystemHealthSnapshot> {
    Ok(Json(ApiResponse::success(
        state.aggregator.check_system().await,
    )))
}

pub async fn get_active_operations(State(state): State<AppState>) -> ApiResult<RunGuardStatus> {
    Ok(Json(ApiResponse::success(state.run_guard.snapshot().await)))
}
