//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::ToastLog;
use crate::config::Config;
use lifedeal_core::DashboardController;
use std::sync::Arc;
use tokio::sync::Mutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The controller sits behind a mutex, so mutations from concurrent requests
/// apply one at a time against the same canonical state.
pub struct AppState {
    pub controller: Mutex<DashboardController>,
    pub toasts: Arc<ToastLog>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(controller: DashboardController, toasts: Arc<ToastLog>, config: Arc<Config>) -> Self {
        Self {
            controller: Mutex::new(controller),
            toasts,
            config,
        }
    }
}
