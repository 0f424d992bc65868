//! In-memory metric aggregation for one push window.
//!
//! # Responsibilities
//! - Count requests (total and per method), auth outcomes and pizza sales
//! - Accumulate revenue for the current window
//! - Keep a bounded latency window
//! - Track distinct active users
//!
//! # Design Decisions
//! - One mutex covers every recorder and `snapshot_and_reset`, so a reset
//!   never loses or double-counts an increment
//! - Recorders never fail: bad numeric input is coerced, a poisoned lock is
//!   recovered
//! - Lock hold times are a handful of integer ops; nothing awaits under it

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::http::Method;

use super::latency::LatencyWindow;

/// Cap on distinct users remembered per window.
pub const ACTIVE_USER_CAPACITY: usize = 10_000;

/// Per-window counters. All values restart at zero after a push cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSet {
    pub requests_total: u64,
    pub requests_get: u64,
    pub requests_post: u64,
    pub requests_put: u64,
    pub requests_delete: u64,
    pub auth_success: u64,
    pub auth_fail: u64,
    pub pizza_sold: u64,
    pub pizza_failed: u64,
}

/// Everything read out of the aggregator by one push cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub counters: CounterSet,
    /// Revenue from successful sales during the window.
    pub revenue: f64,
    /// Mean of the latency window in milliseconds.
    pub latency_avg_ms: f64,
    /// Number of samples behind `latency_avg_ms`.
    pub latency_samples: usize,
    /// Distinct users seen during the window.
    pub active_users: usize,
    /// How long the window was open.
    pub window: Duration,
}

impl MetricsSnapshot {
    /// Revenue normalised to one minute of window time.
    pub fn revenue_per_minute(&self) -> f64 {
        let minutes = self.window.as_secs_f64() / 60.0;
        if minutes > 0.0 {
            self.revenue / minutes
        } else {
            0.0
        }
    }
}

#[derive(Debug)]
struct WindowState {
    counters: CounterSet,
    revenue: f64,
    latency: LatencyWindow,
    active_users: HashSet<String>,
    opened: Instant,
}

impl WindowState {
    fn new() -> Self {
        Self {
            counters: CounterSet::default(),
            revenue: 0.0,
            latency: LatencyWindow::new(),
            active_users: HashSet::new(),
            opened: Instant::now(),
        }
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters,
            revenue: self.revenue,
            latency_avg_ms: self.latency.average(),
            latency_samples: self.latency.len(),
            active_users: self.active_users.len(),
            window: self.opened.elapsed(),
        }
    }
}

/// Thread-safe aggregator shared by middleware, route handlers and the
/// publisher.
#[derive(Debug)]
pub struct MetricsAggregator {
    state: Mutex<WindowState>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(WindowState::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one finished request and record its wall-clock duration.
    pub fn track_request(&self, method: &Method, elapsed: Duration) {
        let mut state = self.lock();
        let counters = &mut state.counters;
        counters.requests_total += 1;
        match *method {
            Method::GET => counters.requests_get += 1,
            Method::POST => counters.requests_post += 1,
            Method::PUT => counters.requests_put += 1,
            Method::DELETE => counters.requests_delete += 1,
            _ => {}
        }
        state.latency.push(elapsed.as_secs_f64() * 1_000.0);
    }

    pub fn record_auth(&self, success: bool) {
        let mut state = self.lock();
        if success {
            state.counters.auth_success += 1;
        } else {
            state.counters.auth_fail += 1;
        }
    }

    /// Record a pizza order outcome.
    ///
    /// A non-finite or negative `price` counts as zero. A non-finite
    /// `latency_ms` is skipped; a negative one is recorded as zero.
    pub fn record_pizza(&self, success: bool, latency_ms: f64, price: f64) {
        let mut state = self.lock();
        if success {
            state.counters.pizza_sold += 1;
            state.revenue += non_negative(price);
        } else {
            state.counters.pizza_failed += 1;
        }
        if latency_ms.is_finite() {
            state.latency.push(latency_ms.max(0.0));
        }
    }

    /// Note an authenticated user as active in the current window.
    pub fn record_active_user(&self, user: impl Into<String>) {
        let mut state = self.lock();
        if state.active_users.len() < ACTIVE_USER_CAPACITY {
            state.active_users.insert(user.into());
        }
    }

    /// Read the current window without resetting it.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().snapshot()
    }

    /// Read every value and open a fresh window in one critical section.
    pub fn snapshot_and_reset(&self) -> MetricsSnapshot {
        let previous = std::mem::replace(&mut *self.lock(), WindowState::new());
        previous.snapshot()
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
