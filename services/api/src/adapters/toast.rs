//! services/api/src/adapters/toast.rs
//!
//! The `Notifier` adapter. Every toast is logged and kept in a bounded buffer
//! until a client drains it.

use lifedeal_core::domain::{Notification, NotificationLevel};
use lifedeal_core::ports::Notifier;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug)]
pub struct ToastLog {
    capacity: usize,
    pending: Mutex<VecDeque<Notification>>,
}

impl ToastLog {
    /// Keeps at most `capacity` undrained toasts; the oldest are dropped first.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            pending: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Removes and returns every pending toast, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for ToastLog {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!(toast = %notification.message, "notification"),
            NotificationLevel::Error => warn!(toast = %notification.message, "notification"),
        }

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending.len() == self.capacity {
            pending.pop_front();
        }
        pending.push_back(notification);
    }
}
