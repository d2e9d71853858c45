//! Shared application state.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use essaymark_core::engine::Evaluator;

/// Application state shared across handlers.
pub struct AppState {
    pub evaluator: Evaluator,
    pub in_flight: Arc<InFlight>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(evaluator: Evaluator) -> Self {
        Self {
            evaluator,
            in_flight: Arc::new(InFlight::default()),
            start_time: Instant::now(),
        }
    }
}

/// Session keys with a submission currently running.
#[derive(Debug, Default)]
pub struct InFlight {
    keys: Mutex<HashSet<String>>,
}

impl InFlight {
    /// Claim `key`. Returns `None` while another holder has it.
    pub fn try_acquire(self: &Arc<Self>, key: &str) -> Option<InFlightGuard> {
        let mut keys = self.keys.lock().unwrap_or_else(|p| p.into_inner());
        if !keys.insert(key.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            registry: Arc::clone(self),
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its key on drop, including when the request future is cancelled.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlight>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry
            .keys
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.key);
    }
}
