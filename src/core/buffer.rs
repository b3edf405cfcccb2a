//! Uniform indexed access over plain arrays and fixed-capacity ring buffers.
//!
//! Decimators only see the `Buffer` trait, so streaming series backed by a
//! `RingBuffer` and static series backed by an `ArrayBuffer` share one code
//! path. Logical index `0` is always the oldest retained entry.

use std::marker::PhantomData;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::types::TraceInterval;
use crate::error::{ChartError, ChartResult};

/// Finite random-access sequence with O(1) `get` and `len`.
pub trait Buffer<T> {
    /// Returns the entry at logical `index`, or `None` outside `[0, len())`.
    fn get(&self, index: usize) -> Option<&T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies entries out in logical order.
    fn data(&self) -> Vec<T>
    where
        T: Clone,
    {
        (0..self.len())
            .filter_map(|index| self.get(index).cloned())
            .collect()
    }
}

/// Iterator over a buffer in logical order.
pub struct BufferIter<'a, T, B: ?Sized> {
    buffer: &'a B,
    index: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T, B> BufferIter<'a, T, B>
where
    B: Buffer<T> + ?Sized,
{
    #[must_use]
    pub fn new(buffer: &'a B) -> Self {
        Self {
            buffer,
            index: 0,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn starting_at(buffer: &'a B, index: usize) -> Self {
        Self {
            buffer,
            index,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: 'a, B> Iterator for BufferIter<'a, T, B>
where
    B: Buffer<T> + ?Sized,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.index)?;
        self.index += 1;
        Some(item)
    }
}

/// Thin wrapper around a contiguous vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArrayBuffer<T> {
    values: Vec<T>,
}

impl<T> Default for ArrayBuffer<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> ArrayBuffer<T> {
    #[must_use]
    pub fn new(values: Vec<T>) -> Self {
        Self { values }
    }

    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.values
    }
}

impl<T> Buffer<T> for ArrayBuffer<T> {
    fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

impl<T> From<Vec<T>> for ArrayBuffer<T> {
    fn from(values: Vec<T>) -> Self {
        Self::new(values)
    }
}

/// Fixed-capacity buffer that overwrites its oldest entry once full.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    head: usize,
}

impl<T> RingBuffer<T> {
    pub fn with_capacity(capacity: usize) -> ChartResult<Self> {
        if capacity == 0 {
            return Err(ChartError::InvalidData(
                "ring buffer capacity must be > 0".to_owned(),
            ));
        }
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Appends `value`, returning the evicted oldest entry when full.
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.slots.len() < self.capacity {
            self.slots.push(value);
            return None;
        }
        let evicted = std::mem::replace(&mut self.slots[self.head], value);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            let _ = self.push(value);
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}

impl<T> Buffer<T> for RingBuffer<T> {
    fn get(&self, index: usize) -> Option<&T> {
        if index >= self.slots.len() {
            return None;
        }
        self.slots.get((self.head + index) % self.slots.len())
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Storage chosen per series: static array or streaming ring.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesBuffer<T> {
    Array(ArrayBuffer<T>),
    Ring(RingBuffer<T>),
}

impl<T> SeriesBuffer<T> {
    /// Appends one entry; ring storage evicts the oldest entry when full.
    pub fn push(&mut self, value: T) {
        match self {
            Self::Array(buffer) => buffer.push(value),
            Self::Ring(buffer) => {
                let _ = buffer.push(value);
            }
        }
    }
}

impl<T> Default for SeriesBuffer<T> {
    fn default() -> Self {
        Self::Array(ArrayBuffer::default())
    }
}

impl<T> Buffer<T> for SeriesBuffer<T> {
    fn get(&self, index: usize) -> Option<&T> {
        match self {
            Self::Array(buffer) => buffer.get(index),
            Self::Ring(buffer) => buffer.get(index),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Array(buffer) => buffer.len(),
            Self::Ring(buffer) => buffer.len(),
        }
    }
}

impl<T> From<Vec<T>> for SeriesBuffer<T> {
    fn from(values: Vec<T>) -> Self {
        Self::Array(ArrayBuffer::new(values))
    }
}

/// Trace interval storage that remembers the longest duration it held.
///
/// Intervals ending before a window start can be skipped by bisecting on
/// `x` against that bound. Ring eviction never lowers it, so it is an upper
/// bound rather than the exact maximum.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraceBuffer {
    intervals: SeriesBuffer<TraceInterval>,
    longest: f64,
}

impl TraceBuffer {
    #[must_use]
    pub fn new(intervals: SeriesBuffer<TraceInterval>) -> Self {
        let longest = BufferIter::<TraceInterval, _>::new(&intervals)
            .map(|interval| interval.dx)
            .fold(0.0, f64::max);
        Self { intervals, longest }
    }

    pub fn push(&mut self, interval: TraceInterval) {
        self.longest = self.longest.max(interval.dx);
        self.intervals.push(interval);
    }

    /// Upper bound on the duration of every retained interval.
    #[must_use]
    pub fn longest(&self) -> f64 {
        self.longest
    }

    /// First index that can reach past `at` when every interval lasts at
    /// most `reach` longest durations.
    #[must_use]
    pub fn seek(&self, at: f64, reach: f64) -> usize {
        let bound = at - reach * self.longest;
        if bound.is_nan() {
            return 0;
        }
        bisect_left(self, bound, |interval: &TraceInterval| interval.x)
    }
}

impl Buffer<TraceInterval> for TraceBuffer {
    fn get(&self, index: usize) -> Option<&TraceInterval> {
        self.intervals.get(index)
    }

    fn len(&self) -> usize {
        self.intervals.len()
    }
}

impl From<Vec<TraceInterval>> for TraceBuffer {
    fn from(intervals: Vec<TraceInterval>) -> Self {
        Self::new(SeriesBuffer::from(intervals))
    }
}

/// First index whose key is `>= target`, assuming keys are non-decreasing.
pub fn bisect_left<T, B, F>(buffer: &B, target: f64, key: F) -> usize
where
    B: Buffer<T> + ?Sized,
    F: Fn(&T) -> f64,
{
    partition(buffer, |item| key(item) < target)
}

/// First index whose key is `> target`, assuming keys are non-decreasing.
pub fn bisect_right<T, B, F>(buffer: &B, target: f64, key: F) -> usize
where
    B: Buffer<T> + ?Sized,
    F: Fn(&T) -> f64,
{
    partition(buffer, |item| key(item) <= target)
}

/// Index range of entries with keys in the half-open window `[start, end)`.
pub fn bisect_range<T, B, F>(buffer: &B, start: f64, end: f64, key: F) -> Range<usize>
where
    B: Buffer<T> + ?Sized,
    F: Fn(&T) -> f64,
{
    let lo = bisect_left(buffer, start, &key);
    let hi = bisect_left(buffer, end, &key).max(lo);
    lo..hi
}

fn partition<T, B, P>(buffer: &B, is_before: P) -> usize
where
    B: Buffer<T> + ?Sized,
    P: Fn(&T) -> bool,
{
    let mut lo = 0;
    let mut hi = buffer.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let Some(item) = buffer.get(mid) else {
            break;
        };
        if is_before(item) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}
