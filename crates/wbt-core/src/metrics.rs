use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

/// Attempt counters and mean latency for one collaborator
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CallStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub average_ms: f64,
}

impl CallStats {
    fn record(&mut self, success: bool, elapsed: Duration) {
        self.attempts += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        let sample = elapsed.as_secs_f64() * 1000.0;
        // Running mean over all attempts
        self.average_ms += (sample - self.average_ms) / self.attempts as f64;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub session_id: Uuid,
    pub session_start: DateTime<Local>,
    pub recognition: CallStats,
    pub lookup: CallStats,
}

/// Session telemetry, written once at shutdown
#[derive(Debug)]
pub struct Metrics {
    inner: Mutex<MetricsSnapshot>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot {
                session_id: Uuid::new_v4(),
                session_start: Local::now(),
                recognition: CallStats::default(),
                lookup: CallStats::default(),
            }),
        }
    }

    pub fn record_recognition(&self, success: bool, elapsed: Duration) {
        self.lock().recognition.record(success, elapsed);
    }

    pub fn record_lookup(&self, success: bool, elapsed: Duration) {
        self.lock().lookup.record(success, elapsed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MetricsSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
