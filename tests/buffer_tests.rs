use linked_charts::core::{
    ArrayBuffer, Buffer, RingBuffer, SeriesBuffer, bisect_left, bisect_range,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn ring_buffer_keeps_the_newest_entries_in_order(
        capacity in 1usize..64,
        values in proptest::collection::vec(any::<i32>(), 0..256),
    ) {
        let mut ring = RingBuffer::with_capacity(capacity).expect("capacity");
        ring.extend(values.iter().copied());

        let keep = values.len().min(capacity);
        let expected = values[values.len() - keep..].to_vec();
        prop_assert_eq!(ring.len(), keep);
        prop_assert_eq!(ring.data(), expected);
        prop_assert!(ring.get(keep).is_none());
    }

    #[test]
    fn bisection_over_a_wrapped_ring_matches_a_linear_scan(
        capacity in 1usize..32,
        count in 0usize..96,
        target in -5.0f64..100.0,
    ) {
        let mut ring = RingBuffer::with_capacity(capacity).expect("capacity");
        ring.extend((0..count).map(|index| index as f64));

        let linear = ring.data().iter().take_while(|x| **x < target).count();
        prop_assert_eq!(bisect_left(&ring, target, |x| *x), linear);

        let range = bisect_range(&ring, target, target + 10.0, |x| *x);
        prop_assert!(range.start <= range.end);
        prop_assert!(range.end <= ring.len());
    }
}

#[test]
fn zero_capacity_ring_is_rejected() {
    assert!(RingBuffer::<f64>::with_capacity(0).is_err());
}

#[test]
fn default_series_buffer_needs_no_default_entries() {
    #[derive(Debug, Clone, PartialEq)]
    struct Sample(f64);

    let mut buffer: SeriesBuffer<Sample> = SeriesBuffer::default();
    assert!(buffer.is_empty());
    buffer.push(Sample(1.5));
    assert_eq!(buffer.get(0), Some(&Sample(1.5)));
    assert!(ArrayBuffer::<Sample>::default().is_empty());
}
