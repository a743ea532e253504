//! Handlers for the `/api/expenses` resource.
//!
//! Every handler runs behind `jwt_auth_middleware` and only ever sees records
//! owned by the authenticated caller.

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Expense, ExpensePayload, NewExpense};
use crate::state::AppState;

/// POST /api/expenses
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ExpensePayload>, JsonRejection>,
) -> ApiResult<Expense> {
    let fields = validate(payload)?;
    let expense = state.store.create(user.user_id, fields).await?;

    tracing::debug!("Created expense {} for {}", expense.id, user.user_id);
    Ok(ApiResponse::created(expense))
}

/// GET /api/expenses
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Expense>> {
    let expenses = state.store.list(user.user_id).await?;

    tracing::debug!("Listed {} expenses for {}", expenses.len(), user.user_id);
    Ok(ApiResponse::success(expenses))
}

/// GET /api/expenses/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Expense> {
    let id = parse_id(path)?;
    let expense = state
        .store
        .get(user.user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(ApiResponse::success(expense))
}

/// PUT /api/expenses/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ExpensePayload>, JsonRejection>,
) -> ApiResult<Expense> {
    let id = parse_id(path)?;
    let fields = validate(payload)?;
    let expense = state
        .store
        .update(user.user_id, id, fields)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::debug!("Updated expense {} for {}", expense.id, user.user_id);
    Ok(ApiResponse::success(expense))
}

/// DELETE /api/expenses/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<()> {
    let id = parse_id(path)?;
    if !state.store.delete(user.user_id, id).await? {
        return Err(not_found(id));
    }

    tracing::debug!("Deleted expense {} for {}", id, user.user_id);
    Ok(ApiResponse::no_content())
}

fn validate(payload: Result<Json<ExpensePayload>, JsonRejection>) -> Result<NewExpense, ApiError> {
    let Json(payload) = payload?;
    payload
        .validate()
        .map_err(|field_errors| ApiError::validation_error("Missing or invalid fields", Some(field_errors)))
}

// A malformed id can never resolve, so it is reported like an unknown one
fn parse_id(path: Result<Path<String>, PathRejection>) -> Result<Uuid, ApiError> {
    let Path(raw) = path.map_err(|rejection| {
        tracing::debug!("Rejected expense path: {}", rejection.body_text());
        ApiError::not_found("Expense not found")
    })?;
    Uuid::parse_str(&raw).map_err(|_| ApiError::not_found(format!("Expense {} not found", raw)))
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::not_found(format!("Expense {} not found", id))
}
