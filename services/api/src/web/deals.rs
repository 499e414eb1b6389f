//! services/api/src/web/deals.rs
//!
//! Handlers for the deal collection: listing, create, update, delete, usage
//! toggling and AI-written descriptions.

use crate::web::error::{ErrorBody, HttpResult};
use crate::web::rest::{DealPayload, DealResponse, DescribeRequest, DescribeResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use lifedeal_core::{DealForm, RecordId};
use std::sync::Arc;

/// List the deals passing the current filter, in creation order.
#[utoipa::path(
    get,
    path = "/deals",
    responses(
        (status = 200, description = "Filtered deals", body = [DealResponse]),
        (status = 503, description = "Dashboard not loaded", body = ErrorBody)
    )
)]
pub async fn list_deals_handler(
    State(app_state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<DealResponse>>> {
    let controller = app_state.controller.lock().await;
    let deals = controller
        .visible_deals()?
        .into_iter()
        .map(DealResponse::from)
        .collect();
    Ok(Json(deals))
}

/// Validate a deal form and create the deal.
#[utoipa::path(
    post,
    path = "/deals",
    request_body = DealPayload,
    responses(
        (status = 201, description = "Deal created", body = DealResponse),
        (status = 422, description = "Form validation failed", body = ErrorBody),
        (status = 502, description = "Record backend failed", body = ErrorBody),
        (status = 503, description = "Dashboard not loaded", body = ErrorBody)
    )
)]
pub async fn create_deal_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<DealPayload>,
) -> HttpResult<impl IntoResponse> {
    let form = DealForm::from(payload);
    let mut controller = app_state.controller.lock().await;
    let deal = controller.create_deal(&form).await?;
    Ok((StatusCode::CREATED, Json(DealResponse::from(&deal))))
}

/// Validate a deal form and overwrite the deal's editable fields.
#[utoipa::path(
    put,
    path = "/deals/{id}",
    request_body = DealPayload,
    params(("id" = i64, Path, description = "Deal id")),
    responses(
        (status = 200, description = "Deal updated", body = DealResponse),
        (status = 404, description = "No such deal", body = ErrorBody),
        (status = 422, description = "Form validation failed", body = ErrorBody),
        (status = 502, description = "Record backend failed", body = ErrorBody)
    )
)]
pub async fn update_deal_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<DealPayload>,
) -> HttpResult<Json<DealResponse>> {
    let form = DealForm::from(payload);
    let mut controller = app_state.controller.lock().await;
    let deal = controller.update_deal(RecordId::new(id), &form).await?;
    Ok(Json(DealResponse::from(&deal)))
}

/// Delete a deal.
#[utoipa::path(
    delete,
    path = "/deals/{id}",
    params(("id" = i64, Path, description = "Deal id")),
    responses(
        (status = 204, description = "Deal deleted"),
        (status = 404, description = "No such deal", body = ErrorBody),
        (status = 502, description = "Record backend failed", body = ErrorBody)
    )
)]
pub async fn delete_deal_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> HttpResult<StatusCode> {
    let mut controller = app_state.controller.lock().await;
    controller.delete_deal(RecordId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip a deal between used and unused.
///
/// Marking a deal used stamps `lastAccessed`; marking it unused leaves the
/// stamp alone.
#[utoipa::path(
    post,
    path = "/deals/{id}/toggle-usage",
    params(("id" = i64, Path, description = "Deal id")),
    responses(
        (status = 200, description = "Deal with its new usage flag", body = DealResponse),
        (status = 404, description = "No such deal", body = ErrorBody),
        (status = 502, description = "Record backend failed", body = ErrorBody)
    )
)]
pub async fn toggle_usage_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> HttpResult<Json<DealResponse>> {
    let mut controller = app_state.controller.lock().await;
    let deal = controller.toggle_usage(RecordId::new(id)).await?;
    Ok(Json(DealResponse::from(&deal)))
}

/// Ask the language model for a short description of a deal.
#[utoipa::path(
    post,
    path = "/deals/describe",
    request_body = DescribeRequest,
    responses(
        (status = 200, description = "Generated description", body = DescribeResponse),
        (status = 422, description = "Deal name missing", body = ErrorBody),
        (status = 502, description = "Model request failed", body = ErrorBody),
        (status = 503, description = "Description generation not configured", body = ErrorBody)
    )
)]
pub async fn describe_deal_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<DescribeRequest>,
) -> HttpResult<Json<DescribeResponse>> {
    // The guard is released before the model call; other requests keep flowing.
    let generator = app_state.controller.lock().await.description_generator();
    let description = generator.generate(&request.name).await?;
    Ok(Json(DescribeResponse { description }))
}
