//! Time-stamped sample history
//!
//! `TimedSample` is a fixed ring of values, each paired with the time that
//! elapsed between the previous write and this one. `MovingAverage` answers
//! trailing-window questions by walking backward from the newest write and
//! accumulating those elapsed times.
//!
//! Every time slot starts at `+inf`. The very first sample keeps that value
//! (there is no previous write to measure from), so any backward walk stops
//! at the oldest real sample instead of running into unwritten slots.

use std::ops::Add;

use glam::{DVec2, Vec2, Vec3};

use crate::consts::VELOCITY_HISTORY_LEN;

/// Values that can be summed and averaged
pub trait Summable: Copy + Add<Output = Self> {
    const ZERO: Self;

    /// Divide by a sample count (always >= 1)
    fn div_count(self, count: u32) -> Self;
}

impl Summable for f32 {
    const ZERO: Self = 0.0;

    fn div_count(self, count: u32) -> Self {
        self / count as f32
    }
}

impl Summable for f64 {
    const ZERO: Self = 0.0;

    fn div_count(self, count: u32) -> Self {
        self / f64::from(count)
    }
}

impl Summable for i32 {
    const ZERO: Self = 0;

    /// Integer division, truncating toward zero
    fn div_count(self, count: u32) -> Self {
        self / count as i32
    }
}

impl Summable for Vec2 {
    const ZERO: Self = Vec2::ZERO;

    fn div_count(self, count: u32) -> Self {
        self / count as f32
    }
}

impl Summable for Vec3 {
    const ZERO: Self = Vec3::ZERO;

    fn div_count(self, count: u32) -> Self {
        self / count as f32
    }
}

impl Summable for DVec2 {
    const ZERO: Self = DVec2::ZERO;

    fn div_count(self, count: u32) -> Self {
        self / f64::from(count)
    }
}

/// Fixed-capacity ring of values with per-sample elapsed time
#[derive(Debug, Clone)]
pub struct TimedSample<T> {
    values: Vec<T>,
    /// Elapsed seconds between the previous write and the value in the same slot
    times: Vec<f32>,
    /// Slot of the most recent write
    index: usize,
    /// Number of writes so far (saturates at capacity)
    len: usize,
}

impl<T: Summable> TimedSample<T> {
    /// Create an empty ring. Capacity is raised to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: vec![T::ZERO; capacity],
            times: vec![f32::INFINITY; capacity],
            // Start on the last slot so the first write lands in slot 0
            index: capacity - 1,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Write a value, overwriting the oldest slot once full
    ///
    /// `elapsed` is the time since the previous write. It is ignored for the
    /// first write, which keeps the `+inf` seed.
    pub fn add_value(&mut self, value: T, elapsed: f32) {
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        self.index = (self.index + 1) % self.capacity();
        self.values[self.index] = value;
        self.times[self.index] = if self.len == 0 { f32::INFINITY } else { elapsed };
        self.len = (self.len + 1).min(self.capacity());
    }

    /// Newest value (zero when empty)
    pub fn latest(&self) -> T {
        self.values[self.index]
    }

    /// Oldest recorded value (zero when empty)
    pub fn oldest(&self) -> T {
        if self.len < self.capacity() {
            // Not wrapped yet: slot 0 holds the first write (or the zero seed)
            self.values[0]
        } else {
            self.values[(self.index + 1) % self.capacity()]
        }
    }

    /// Slot `steps` writes before the newest
    fn slot_back(&self, steps: usize) -> usize {
        let cap = self.capacity();
        (self.index + cap - steps % cap) % cap
    }

    fn clear(&mut self) {
        self.values.fill(T::ZERO);
        self.times.fill(f32::INFINITY);
        self.index = self.capacity() - 1;
        self.len = 0;
    }
}

/// Trailing-window queries over a `TimedSample`
#[derive(Debug, Clone)]
pub struct MovingAverage<T> {
    samples: TimedSample<T>,
}

impl<T: Summable> Default for MovingAverage<T> {
    fn default() -> Self {
        Self::new(VELOCITY_HISTORY_LEN)
    }
}

impl<T: Summable> MovingAverage<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: TimedSample::new(capacity),
        }
    }

    /// Record a value observed `elapsed` seconds after the previous one
    pub fn add_value(&mut self, value: T, elapsed: f32) {
        self.samples.add_value(value, elapsed);
    }

    pub fn latest(&self) -> T {
        self.samples.latest()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    /// Forget all samples
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Average of the samples covering the trailing `window` seconds
    ///
    /// The sample whose elapsed time crosses the window edge is included.
    /// A window `<= 0` yields the newest value.
    pub fn average(&self, window: f32) -> T {
        let (sum, count) = self.sum_over(window);
        sum.div_count(count)
    }

    /// Sum of the samples covering the trailing `window` seconds
    pub fn sum(&self, window: f32) -> T {
        self.sum_over(window).0
    }

    /// Value recorded roughly `time_in_past` seconds ago
    ///
    /// Returns the first sample (walking back from the newest) whose
    /// cumulative elapsed time reaches `time_in_past`, or the oldest sample
    /// if the history is shorter than that.
    pub fn value_at(&self, time_in_past: f32) -> T {
        let mut summed_time = 0.0;
        for step in 0..self.samples.capacity() {
            let slot = self.samples.slot_back(step);
            summed_time += self.samples.times[slot];
            if summed_time >= time_in_past {
                return self.samples.values[slot];
            }
        }
        self.samples.oldest()
    }

    fn sum_over(&self, window: f32) -> (T, u32) {
        let newest = self.samples.index;
        let mut summed = self.samples.values[newest];
        let mut summed_time = self.samples.times[newest];
        let mut count = 1;
        if window <= 0.0 {
            return (summed, count);
        }
        for step in 1..self.samples.capacity() {
            if summed_time >= window {
                break;
            }
            let slot = self.samples.slot_back(step);
            summed_time += self.samples.times[slot];
            summed = summed + self.samples.values[slot];
            count += 1;
        }
        (summed, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f32 = 0.02;

    fn filled(values: &[f32]) -> MovingAverage<f32> {
        let mut history = MovingAverage::new(64);
        for &v in values {
            history.add_value(v, DT);
        }
        history
    }

    #[test]
    fn test_empty_history_is_zero() {
        let history = MovingAverage::<f32>::new(16);
        assert_eq!(history.average(0.2), 0.0);
        assert_eq!(history.value_at(0.0), 0.0);
        assert_eq!(history.value_at(10.0), 0.0);
        assert_eq!(history.sum(1.0), 0.0);
    }

    #[test]
    fn test_single_sample() {
        let history = filled(&[7.0]);
        assert_eq!(history.average(0.2), 7.0);
        assert_eq!(history.value_at(5.0), 7.0);
    }

    #[test]
    fn test_non_positive_window_returns_newest() {
        let history = filled(&[1.0, 2.0, 3.0]);
        assert_eq!(history.average(0.0), 3.0);
        assert_eq!(history.average(-1.0), 3.0);
    }

    #[test]
    fn test_window_includes_crossing_sample() {
        let history = filled(&[100.0, 1.0, 2.0, 3.0, 4.0]);
        // newest three: 4 (0.02), 3 (0.04), 2 (0.06 >= 0.05 stop)
        let avg = history.average(0.05);
        assert!((avg - 3.0).abs() < 1e-5);
        assert!((history.sum(0.05) - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_value_at_walks_back() {
        let history = filled(&[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(history.value_at(0.0), 40.0);
        assert_eq!(history.value_at(0.02), 40.0);
        assert_eq!(history.value_at(0.03), 30.0);
        assert_eq!(history.value_at(0.05), 20.0);
    }

    #[test]
    fn test_ring_overwrites_oldest() {
        let mut history = MovingAverage::new(4);
        for v in 1..=6 {
            history.add_value(v as f32, DT);
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history.latest(), 6.0);
        // 3 is the oldest surviving sample
        assert_eq!(history.value_at(100.0), 3.0);
        assert!((history.average(100.0) - 4.5).abs() < 1e-6);
    }

    #[test]
    fn test_vector_average() {
        let mut history = MovingAverage::<Vec3>::new(8);
        history.add_value(Vec3::new(2.0, 0.0, 0.0), DT);
        history.add_value(Vec3::new(0.0, 0.0, 4.0), DT);
        let avg = history.average(1.0);
        assert!((avg - Vec3::new(1.0, 0.0, 2.0)).length() < 1e-6);
    }

    #[test]
    fn test_clear_resets_to_seed() {
        let mut history = filled(&[5.0, 6.0]);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.average(1.0), 0.0);
        history.add_value(9.0, DT);
        assert_eq!(history.value_at(3.0), 9.0);
    }

    proptest! {
        #[test]
        fn prop_long_window_is_mean_of_everything(values in prop::collection::vec(-50.0f32..50.0, 1..64)) {
            let history = filled(&values);
            let mean = values.iter().sum::<f32>() / values.len() as f32;
            let window = DT * values.len() as f32 + 1.0;
            prop_assert!((history.average(window) - mean).abs() < 1e-3);
        }

        #[test]
        fn prop_value_at_zero_is_latest(values in prop::collection::vec(-50.0f32..50.0, 1..200)) {
            let history = filled(&values);
            prop_assert_eq!(history.value_at(0.0), *values.last().unwrap());
        }

        #[test]
        fn prop_value_far_in_past_is_oldest_kept(values in prop::collection::vec(-50.0f32..50.0, 1..200)) {
            let history = filled(&values);
            let oldest_kept = values[values.len().saturating_sub(64)];
            prop_assert_eq!(history.value_at(1.0e6), oldest_kept);
        }
    }
}
