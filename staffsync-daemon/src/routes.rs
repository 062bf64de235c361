//! HTTP surface.
//!
//! ```text
//! POST /employees              add one employee (sheet append + store insert)
//! GET  /employees?department=  list employees by name
//! POST /sync                   queue a reconciliation run and return its report
//! POST /mirror                 apply one store change event to the sheet
//! GET  /health
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use staffsync_core::{EmployeeRecord, NewEmployee};
use staffsync_store::EmployeeFilter;
use staffsync_sync::{ChangeEvent, SyncContext, SyncError};

use crate::error::{ApiError, DaemonError};
use crate::runtime::ReconcileQueue;

#[derive(Clone)]
pub struct AppState {
    ctx: SyncContext,
    queue: ReconcileQueue,
}

impl AppState {
    pub fn new(ctx: SyncContext, queue: ReconcileQueue) -> Self {
        Self { ctx, queue }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/employees", post(add_employee).get(list_employees))
        .route("/sync", post(reconcile))
        .route("/mirror", post(mirror))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub department: Option<String>,
}

async fn add_employee(
    State(state): State<AppState>,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(employee) = payload?;
    let ctx = state.ctx.clone();
    let record: EmployeeRecord = blocking(move || ctx.add_employee(employee)).await?;
    tracing::info!(email = %record.email, id = %record.id, "employee added");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Employee added successfully",
            "data": record,
        })),
    ))
}

async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = EmployeeFilter {
        department: query.department.filter(|d| !d.is_empty()),
    };
    let ctx = state.ctx.clone();
    let records = blocking(move || ctx.list_employees(&filter)).await?;
    Ok(Json(json!({ "data": records })))
}

async fn reconcile(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    match state.queue.run("http").await {
        Ok(report) => Ok(Json(json!(report))),
        Err(err) => Err(ApiError::SyncFailed {
            details: err.to_string(),
        }),
    }
}

async fn mirror(
    State(state): State<AppState>,
    payload: Result<Json<ChangeEvent>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(event) = payload?;
    let operation = event.operation;
    let ctx = state.ctx.clone();
    let outcome = blocking(move || ctx.mirror(&event)).await?;
    tracing::info!(%operation, ?outcome, "change mirrored");
    Ok(Json(json!({
        "success": true,
        "message": format!("Sheet updated for {operation} operation"),
    })))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn blocking<T, F>(work: F) -> Result<T, DaemonError>
where
    F: FnOnce() -> Result<T, SyncError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| DaemonError::Task(format!("blocking task join error: {err}")))?;
    Ok(result?)
}
