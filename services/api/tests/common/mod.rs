use std::sync::Arc;

use api_lib::adapters::ToastLog;
use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use lifedeal_core::ports::KeyValueStorage;
use lifedeal_core::{DashboardController, DescriptionGenerationService, LocalRecordBackend};
use serde_json::Value;
use tower::ServiceExt;

/// Configuration with every variable at its default.
pub fn test_config() -> Config {
    Config::from_lookup(|_| None).expect("default config is valid")
}

/// Builds the full router over a local-mode backend on `storage`, after the
/// initial dashboard load.
pub async fn build_test_app(storage: Arc<dyn KeyValueStorage>) -> Router {
    build_app(storage, None).await
}

/// Like `build_test_app`, with a description service plugged in.
pub async fn build_test_app_with_describer(
    storage: Arc<dyn KeyValueStorage>,
    describer: Arc<dyn DescriptionGenerationService>,
) -> Router {
    build_app(storage, Some(describer)).await
}

async fn build_app(
    storage: Arc<dyn KeyValueStorage>,
    describer: Option<Arc<dyn DescriptionGenerationService>>,
) -> Router {
    let config = Arc::new(test_config());
    let toasts = Arc::new(ToastLog::new(config.notification_capacity));
    let backend = Arc::new(LocalRecordBackend::with_default_seeds(storage));
    let mut controller = DashboardController::new(backend, toasts.clone());
    if let Some(describer) = describer {
        controller = controller.with_description_service(describer);
    }
    controller.load().await;

    build_router(Arc::new(AppState::new(controller, toasts, config)))
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
