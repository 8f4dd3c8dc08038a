//! Fixed-capacity rolling window with an incremental running sum.
//!
//! Shared by the price-discovery process (trend/reference windows) and the
//! analytics engine (realized volatility, effective-spread averaging).

use std::collections::VecDeque;

/// The most recent `capacity` observations, oldest first.
///
/// `push` is O(1) and keeps a running sum so `mean` never rescans the
/// window.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    data: VecDeque<f64>,
    capacity: usize,
    sum: f64,
}

impl RollingWindow {
    /// Create an empty window.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RollingWindow capacity must be > 0");
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
        }
    }

    /// Push an observation, evicting and returning the oldest one when the
    /// window is already full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.data.len() >= self.capacity {
            let old = self.data.pop_front();
            if let Some(v) = old {
                self.sum -= v;
            }
            old
        } else {
            None
        };

        self.data.push_back(value);
        self.sum += value;
        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the window, `None` while empty.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.sum / self.data.len() as f64)
        }
    }

    /// Population variance, `None` with fewer than 2 observations.
    pub fn variance(&self) -> Option<f64> {
        if self.data.len() < 2 {
            return None;
        }

        let mean = self.sum / self.data.len() as f64;
        let sum_sq: f64 = self.data.iter().map(|v| (v - mean).powi(2)).sum();
        Some(sum_sq / self.data.len() as f64)
    }

    /// Population standard deviation, `None` with fewer than 2 observations.
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(|v| v.sqrt())
    }

    /// Most recent observation.
    #[inline]
    pub fn last(&self) -> Option<f64> {
        self.data.back().copied()
    }

    /// Oldest observation still in the window.
    #[inline]
    pub fn first(&self) -> Option<f64> {
        self.data.front().copied()
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.sum = 0.0;
    }
}
