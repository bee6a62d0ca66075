//! Rolling latency estimator
//!
//! Smooths noisy instantaneous round-trip samples into a display-ready value
//! by averaging over a small fixed-capacity history.

/// Number of samples retained for smoothing
pub const HISTORY_CAPACITY: usize = 5;

/// Fixed-capacity FIFO window of round-trip samples (milliseconds).
///
/// Slots are allocated once up front; when the window is full the oldest
/// sample is overwritten in place and the head index advances, so recording
/// never reallocates or shifts.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    /// Pre-allocated sample slots
    buf: Box<[f64]>,

    /// Index of the oldest sample
    head: usize,

    /// Number of valid samples (always <= capacity)
    len: usize,
}

impl RollingWindow {
    /// Create a window holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            buf: vec![0.0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Record a sample, evicting the oldest one when the window is full
    pub fn record(&mut self, sample_ms: f64) {
        let capacity = self.buf.len();

        if self.len == capacity {
            // Overwrite the oldest slot and advance the head
            self.buf[self.head] = sample_ms;
            self.head = (self.head + 1) % capacity;
        } else {
            self.buf[(self.head + self.len) % capacity] = sample_ms;
            self.len += 1;
        }
    }

    /// Arithmetic mean of the current window, `None` while empty
    pub fn average(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }

        Some(self.iter().sum::<f64>() / self.len as f64)
    }

    /// Most recently recorded sample, if any
    pub fn last(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }

        let capacity = self.buf.len();
        Some(self.buf[(self.head + self.len - 1) % capacity])
    }

    /// Samples in arrival order, oldest first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let capacity = self.buf.len();
        (0..self.len).map(move |i| self.buf[(self.head + i) % capacity])
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// True before the first sample arrives
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of samples the window holds
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_creation() {
        let window = RollingWindow::default();
        assert_eq!(window.capacity(), HISTORY_CAPACITY);
        assert_eq!(window.len(), 0);
        assert!(window.is_empty());
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than 0")]
    fn test_zero_capacity() {
        let _window = RollingWindow::new(0);
    }

    #[test]
    fn test_average_of_three() {
        let mut window = RollingWindow::default();
        window.record(10.0);
        window.record(20.0);
        window.record(30.0);

        assert_eq!(window.average(), Some(20.0));
    }

    #[test]
    fn test_empty_average_is_none() {
        let window = RollingWindow::default();
        assert_eq!(window.average(), None);
        assert_eq!(window.last(), None);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut window = RollingWindow::default();

        for sample in 1..=6 {
            window.record(sample as f64);
        }

        // Length is capped and the first sample is gone
        assert_eq!(window.len(), 5);
        let samples: Vec<f64> = window.iter().collect();
        assert!(!samples.contains(&1.0));
        assert_eq!(samples, vec![2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut window = RollingWindow::default();

        for sample in 0..100 {
            window.record(sample as f64);
            assert!(window.len() <= HISTORY_CAPACITY);
        }

        // Only the 5 newest samples remain, in arrival order
        let samples: Vec<f64> = window.iter().collect();
        assert_eq!(samples, vec![95.0, 96.0, 97.0, 98.0, 99.0]);
    }

    #[test]
    fn test_last_tracks_newest_sample() {
        let mut window = RollingWindow::default();

        window.record(12.5);
        assert_eq!(window.last(), Some(12.5));

        for sample in 0..10 {
            window.record(sample as f64);
        }
        assert_eq!(window.last(), Some(9.0));
    }

    #[test]
    fn test_average_after_wraparound() {
        let mut window = RollingWindow::new(3);

        window.record(1.0);
        window.record(2.0);
        window.record(3.0);
        window.record(10.0); // evicts 1.0

        assert_eq!(window.average(), Some(5.0));
    }
}
