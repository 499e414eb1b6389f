//! services/api/src/web/mod.rs
//!
//! Assembles the HTTP surface: routes, CORS and the Swagger UI.

pub mod categories;
pub mod deals;
pub mod error;
pub mod rest;
pub mod state;

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use rest::ApiDoc;
use state::AppState;

/// Builds the complete application router over the shared state.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let api_router = Router::new()
        .route("/dashboard", get(rest::get_dashboard_handler))
        .route("/dashboard/reload", post(rest::reload_dashboard_handler))
        .route("/dashboard/filters", put(rest::set_filters_handler))
        .route("/stats", get(rest::get_stats_handler))
        .route("/notifications", get(rest::drain_notifications_handler))
        .route(
            "/deals",
            get(deals::list_deals_handler).post(deals::create_deal_handler),
        )
        .route("/deals/describe", post(deals::describe_deal_handler))
        .route(
            "/deals/{id}",
            put(deals::update_deal_handler).delete(deals::delete_deal_handler),
        )
        .route("/deals/{id}/toggle-usage", post(deals::toggle_usage_handler))
        .route(
            "/categories",
            get(categories::list_categories_handler).post(categories::create_category_handler),
        )
        .route("/categories/{id}", delete(categories::delete_category_handler))
        .layer(cors)
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
