//! Bounded FIFO window of latency samples.

use std::collections::VecDeque;

/// Maximum number of samples retained.
pub const LATENCY_WINDOW_CAPACITY: usize = 200;

/// Ordered, size-bounded sequence of millisecond durations.
///
/// Insertion appends and then evicts from the front once the window is full.
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl LatencyWindow {
    pub fn new() -> Self {
        Self::with_capacity(LATENCY_WINDOW_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when over capacity.
    pub fn push(&mut self, millis: f64) {
        self.samples.push_back(millis);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Mean of the retained samples; zero when empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_averages_zero() {
        assert_eq!(LatencyWindow::new().average(), 0.0);
    }

    #[test]
    fn evicts_oldest_after_capacity() {
        let mut window = LatencyWindow::new();
        for i in 0..=LATENCY_WINDOW_CAPACITY {
            window.push(i as f64);
        }

        assert_eq!(window.len(), LATENCY_WINDOW_CAPACITY);
        assert_eq!(window.iter().next(), Some(1.0));
        // samples 1..=200
        assert_eq!(window.average(), 100.5);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut window = LatencyWindow::with_capacity(3);
        for i in 0..50 {
            window.push(i as f64);
            assert!(window.len() <= 3);
        }
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![47.0, 48.0, 49.0]);
    }
}
