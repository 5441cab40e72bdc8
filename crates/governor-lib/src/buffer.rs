//! Fixed-capacity rolling buffer for metric samples
//!
//! Every signal the governor tracks (frame times, memory usage, thermal
//! ordinals) is kept in a ring buffer sized once at construction. Appending is
//! O(1) and never allocates; once the buffer is full the oldest slot is
//! overwritten.

/// Numeric sample that can be stored in a [`RollingMetricBuffer`]
pub trait MetricSample: Copy + PartialOrd {
    /// Value used to fill unwritten slots
    fn zero() -> Self;

    /// Lossy conversion used for sums and averages
    fn to_f64(self) -> f64;
}

impl MetricSample for f64 {
    fn zero() -> Self {
        0.0
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl MetricSample for f32 {
    fn zero() -> Self {
        0.0
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl MetricSample for u64 {
    fn zero() -> Self {
        0
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl MetricSample for u8 {
    fn zero() -> Self {
        0
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// Ring buffer with running statistics over the valid samples
#[derive(Debug, Clone)]
pub struct RollingMetricBuffer<T: MetricSample> {
    slots: Box<[T]>,
    /// Next slot to write
    cursor: usize,
    /// Number of valid samples, never above capacity
    len: usize,
}

impl<T: MetricSample> RollingMetricBuffer<T> {
    /// Create a buffer holding `capacity` samples (clamped to at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![T::zero(); capacity].into_boxed_slice(),
            cursor: 0,
            len: 0,
        }
    }

    /// Append a sample, overwriting the oldest once full
    pub fn append(&mut self, value: T) {
        self.slots[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.slots.len();
        if self.len < self.slots.len() {
            self.len += 1;
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Drop all samples; capacity is unchanged
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.len = 0;
    }

    /// Most recently appended sample
    pub fn latest(&self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.cursor + self.slots.len() - 1) % self.slots.len();
        Some(self.slots[idx])
    }

    /// Iterate valid samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let (head, tail) = if self.is_full() {
            (&self.slots[self.cursor..], &self.slots[..self.cursor])
        } else {
            (&self.slots[..self.len], &self.slots[..0])
        };
        head.iter().chain(tail.iter()).copied()
    }

    /// Sum of the valid samples (zero when empty), accumulated in `f64` so
    /// narrow sample types cannot overflow
    pub fn sum(&self) -> f64 {
        self.iter().map(MetricSample::to_f64).sum()
    }

    /// Arithmetic mean of the valid samples (zero when empty)
    pub fn average(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        self.sum() / self.len as f64
    }

    pub fn min(&self) -> Option<T> {
        self.iter().reduce(|a, b| {
            if b.partial_cmp(&a) == Some(std::cmp::Ordering::Less) {
                b
            } else {
                a
            }
        })
    }

    pub fn max(&self) -> Option<T> {
        self.iter().reduce(|a, b| {
            if b.partial_cmp(&a) == Some(std::cmp::Ordering::Greater) {
                b
            } else {
                a
            }
        })
    }
}
