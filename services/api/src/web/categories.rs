//! services/api/src/web/categories.rs
//!
//! Handlers for the category list: listing with deal counts, adding and removing.

use crate::web::error::{ErrorBody, HttpResult};
use crate::web::rest::{CategoryPayload, CategoryResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use lifedeal_core::{CategoryForm, RecordId};
use std::sync::Arc;

/// List every category with its current deal count.
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "All categories", body = [CategoryResponse]),
        (status = 503, description = "Dashboard not loaded", body = ErrorBody)
    )
)]
pub async fn list_categories_handler(
    State(app_state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<CategoryResponse>>> {
    let controller = app_state.controller.lock().await;
    let categories = controller
        .categories()?
        .iter()
        .map(CategoryResponse::from)
        .collect();
    Ok(Json(categories))
}

/// Add a category. Names are unique, ignoring case.
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 422, description = "Missing or duplicate name", body = ErrorBody),
        (status = 502, description = "Record backend failed", body = ErrorBody)
    )
)]
pub async fn create_category_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CategoryPayload>,
) -> HttpResult<impl IntoResponse> {
    let form = CategoryForm::from(payload);
    let mut controller = app_state.controller.lock().await;
    let category = controller.add_category(&form).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(&category))))
}

/// Delete a category. Deals filed under it keep their category name.
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "No such category", body = ErrorBody),
        (status = 502, description = "Record backend failed", body = ErrorBody)
    )
)]
pub async fn delete_category_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> HttpResult<StatusCode> {
    let mut controller = app_state.controller.lock().await;
    controller.delete_category(RecordId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
