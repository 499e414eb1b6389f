//! services/api/src/web/rest.rs
//!
//! Contains the dashboard-level Axum handlers, the request and response
//! payloads shared by every handler, and the master definition for the
//! OpenAPI document.

use crate::web::error::{ErrorBody, HttpError, HttpResult};
use crate::web::state::AppState;
use crate::web::{categories, deals};
use axum::{extract::State, response::Json};
use chrono::{DateTime, NaiveDate, Utc};
use lifedeal_core::{
    Category, CategoryForm, DashboardController, DashboardState, Deal, DealFilter, DealForm,
    DealStats, Notification, NotificationLevel, StatusFilter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_dashboard_handler,
        reload_dashboard_handler,
        set_filters_handler,
        get_stats_handler,
        drain_notifications_handler,
        deals::list_deals_handler,
        deals::create_deal_handler,
        deals::update_deal_handler,
        deals::delete_deal_handler,
        deals::toggle_usage_handler,
        deals::describe_deal_handler,
        categories::list_categories_handler,
        categories::create_category_handler,
        categories::delete_category_handler,
    ),
    components(
        schemas(
            DashboardResponse, DealResponse, CategoryResponse, StatsResponse,
            FilterPayload, DealPayload, CategoryPayload, DescribeRequest,
            DescribeResponse, NotificationResponse, ErrorBody
        )
    ),
    tags(
        (name = "LifeDeal Vault API", description = "Track lifetime software deals, their usage and spend.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A deal as returned to clients. `id` is the string form of the store key.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealResponse {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub purchase_date: NaiveDate,
    pub category: String,
    pub description: String,
    pub url: Option<String>,
    pub notes: String,
    pub is_used: bool,
    pub last_accessed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Deal> for DealResponse {
    fn from(deal: &Deal) -> Self {
        Self {
            id: deal.id.to_string(),
            name: deal.name.clone(),
            price: deal.price,
            purchase_date: deal.purchase_date,
            category: deal.category.clone(),
            description: deal.description.clone(),
            url: deal.url.clone(),
            notes: deal.notes.clone(),
            is_used: deal.is_used,
            last_accessed: deal.last_accessed,
            created_at: deal.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    /// Deals filed under this category, counted at read time.
    pub deal_count: usize,
}

impl From<&Category> for CategoryResponse {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            deal_count: category.deal_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_deals: usize,
    pub total_spent: f64,
    pub used_deals: usize,
    /// Whole percent, 0 when there are no deals.
    pub usage_rate: u32,
}

impl From<DealStats> for StatsResponse {
    fn from(stats: DealStats) -> Self {
        Self {
            total_deals: stats.total_deals,
            total_spent: stats.total_spent,
            used_deals: stats.used_deals,
            usage_rate: stats.usage_rate,
        }
    }
}

/// List filter criteria. Empty strings match everything.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct FilterPayload {
    pub search: String,
    pub category: String,
    /// `""`, `"used"` or `"unused"`.
    pub status: String,
}

impl From<&DealFilter> for FilterPayload {
    fn from(filter: &DealFilter) -> Self {
        let status: &'static str = filter.status.into();
        Self {
            search: filter.search.clone(),
            category: filter.category.clone(),
            status: status.to_string(),
        }
    }
}

impl TryFrom<FilterPayload> for DealFilter {
    type Error = HttpError;

    fn try_from(payload: FilterPayload) -> Result<Self, Self::Error> {
        let status = payload
            .status
            .parse::<StatusFilter>()
            .map_err(|e| HttpError::BadRequest(e.to_string()))?;
        Ok(DealFilter {
            search: payload.search,
            category: payload.category,
            status,
        })
    }
}

/// Raw deal form input. Every field is a string, exactly as typed.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DealPayload {
    pub name: String,
    pub price: String,
    pub category: String,
    /// `YYYY-MM-DD`.
    pub purchase_date: String,
    pub description: String,
    pub url: String,
    pub notes: String,
}

impl From<DealPayload> for DealForm {
    fn from(payload: DealPayload) -> Self {
        DealForm {
            name: payload.name,
            price: payload.price,
            category: payload.category,
            purchase_date: payload.purchase_date,
            description: payload.description,
            url: payload.url,
            notes: payload.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CategoryPayload {
    pub name: String,
}

impl From<CategoryPayload> for CategoryForm {
    fn from(payload: CategoryPayload) -> Self {
        CategoryForm { name: payload.name }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DescribeRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DescribeResponse {
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    /// `success` or `error`.
    pub level: String,
    pub message: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        let level = match notification.level {
            NotificationLevel::Success => "success",
            NotificationLevel::Error => "error",
        };
        Self {
            level: level.to_string(),
            message: notification.message,
        }
    }
}

/// A snapshot of the dashboard. Only `status` is present while loading or
/// after a failed load.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    /// `loading`, `ready` or `error`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsResponse>,
    /// The deals passing the current filter.
    pub deals: Vec<DealResponse>,
    pub categories: Vec<CategoryResponse>,
}

impl DashboardResponse {
    pub fn snapshot(controller: &DashboardController) -> HttpResult<Self> {
        let response = match controller.state() {
            DashboardState::Loading => Self::bare("loading", None),
            DashboardState::Error(message) => Self::bare("error", Some(message.clone())),
            DashboardState::Ready(data) => Self {
                status: "ready".to_string(),
                message: None,
                filter: Some(FilterPayload::from(&data.filter)),
                stats: Some(controller.stats()?.into()),
                deals: controller
                    .visible_deals()?
                    .into_iter()
                    .map(DealResponse::from)
                    .collect(),
                categories: controller
                    .categories()?
                    .iter()
                    .map(CategoryResponse::from)
                    .collect(),
            },
        };
        Ok(response)
    }

    fn bare(status: &str, message: Option<String>) -> Self {
        Self {
            status: status.to_string(),
            message,
            filter: None,
            stats: None,
            deals: Vec::new(),
            categories: Vec::new(),
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Get the dashboard: load state, stats and the filtered deal list.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Current dashboard snapshot", body = DashboardResponse)
    )
)]
pub async fn get_dashboard_handler(
    State(app_state): State<Arc<AppState>>,
) -> HttpResult<Json<DashboardResponse>> {
    let controller = app_state.controller.lock().await;
    Ok(Json(DashboardResponse::snapshot(&controller)?))
}

/// Reload deals and categories from the record backend.
///
/// Also the way out of the `error` state.
#[utoipa::path(
    post,
    path = "/dashboard/reload",
    responses(
        (status = 200, description = "Dashboard after the reload attempt", body = DashboardResponse)
    )
)]
pub async fn reload_dashboard_handler(
    State(app_state): State<Arc<AppState>>,
) -> HttpResult<Json<DashboardResponse>> {
    let mut controller = app_state.controller.lock().await;
    controller.retry().await;
    Ok(Json(DashboardResponse::snapshot(&controller)?))
}

/// Replace the list filter criteria.
#[utoipa::path(
    put,
    path = "/dashboard/filters",
    request_body = FilterPayload,
    responses(
        (status = 200, description = "Dashboard with the new filter applied", body = DashboardResponse),
        (status = 400, description = "Unknown status value", body = ErrorBody),
        (status = 503, description = "Dashboard not loaded", body = ErrorBody)
    )
)]
pub async fn set_filters_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<FilterPayload>,
) -> HttpResult<Json<DashboardResponse>> {
    let filter = DealFilter::try_from(payload)?;
    let mut controller = app_state.controller.lock().await;
    controller.set_filter(filter)?;
    Ok(Json(DashboardResponse::snapshot(&controller)?))
}

/// Aggregate statistics over every deal, ignoring the filter.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Deal statistics", body = StatsResponse),
        (status = 503, description = "Dashboard not loaded", body = ErrorBody)
    )
)]
pub async fn get_stats_handler(
    State(app_state): State<Arc<AppState>>,
) -> HttpResult<Json<StatsResponse>> {
    let controller = app_state.controller.lock().await;
    Ok(Json(controller.stats()?.into()))
}

/// Drain the pending toast notifications, oldest first.
#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Notifications raised since the last call", body = [NotificationResponse])
    )
)]
pub async fn drain_notifications_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<NotificationResponse>> {
    Json(
        app_state
            .toasts
            .drain()
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    )
}
