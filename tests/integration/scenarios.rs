//! End-to-end scenarios over the public API.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use circular_rs::{CapacityControl, CircularBuffer, RingError, SpaceOptimized};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn keeps_the_last_three() {
    let mut history = CircularBuffer::with_capacity(3);
    for i in 1..=4 {
        history.push_back(i);
    }
    assert_eq!(history, [2, 3, 4]);
    history.push_back(5);
    assert_eq!(history, [3, 4, 5]);
    assert!(history.is_full());
    assert_eq!(history.len(), history.capacity());
}

#[test]
fn overwrite_then_erase_begin() {
    let mut buf: CircularBuffer<i32> = (1..=5).collect();
    assert_eq!(buf.capacity(), 5);
    buf.push_back(6);
    assert_eq!(buf, [2, 3, 4, 5, 6]);

    buf.erase_begin(2);
    assert_eq!(buf, [4, 5, 6]);
    assert_eq!(buf.reserve(), 2);
    buf.check_invariants();
}

#[test]
fn rotate_brings_position_to_front() {
    let mut buf = CircularBuffer::from_iter_with_capacity(7, 1..=7);
    buf.rotate(2);
    assert_eq!(buf, [3, 4, 5, 6, 7, 1, 2]);

    let mut partial = CircularBuffer::from_iter_with_capacity(10, 1..=7);
    partial.rotate(2);
    assert_eq!(partial, [3, 4, 5, 6, 7, 1, 2]);
    partial.check_invariants();
}

#[test]
fn capacity_change_keeps_the_requested_end() {
    let mut buf = CircularBuffer::with_capacity(5);
    buf.extend([2, 3, 1]);
    let mut rev = buf.clone();

    buf.set_capacity(2).unwrap();
    assert_eq!(buf, [2, 3]);
    rev.rset_capacity(2).unwrap();
    assert_eq!(rev, [3, 1]);
}

#[test]
fn linearize_is_idempotent_on_wrapped_data() {
    let mut buf = CircularBuffer::with_capacity(6);
    buf.extend(0..9);
    assert!(!buf.is_linearized());
    let expected: Vec<_> = buf.iter().copied().collect();

    let first = buf.linearize().as_ptr();
    assert_eq!(buf.as_slices().0, expected.as_slice());
    assert!(buf.as_slices().1.is_empty());

    let second = buf.linearize();
    assert_eq!(second.as_ptr(), first);
    assert_eq!(second, expected.as_slice());
}

#[test]
fn insert_then_erase_restores_sequence() {
    let mut buf = CircularBuffer::with_capacity(8);
    buf.extend([10, 11, 12, 13, 14]);
    buf.erase_begin(2);
    buf.extend([15, 16, 17]);
    let before: Vec<_> = buf.iter().copied().collect();

    for pos in 0..=buf.len() {
        let at = buf.insert(pos, 99);
        assert_eq!(at, pos);
        assert_eq!(buf[at], 99);
        buf.erase(at);
        assert_eq!(buf, before);
    }
}

#[test]
fn full_buffer_insert_evicts_front_and_rinsert_evicts_back() {
    let mut buf = CircularBuffer::from_iter_with_capacity(4, [1, 2, 3, 4]);
    assert_eq!(buf.insert(2, 9), 1);
    assert_eq!(buf, [2, 9, 3, 4]);
    assert_eq!(buf.insert(0, 7), 0);
    assert_eq!(buf, [2, 9, 3, 4], "value evicted immediately");

    assert_eq!(buf.rinsert(1, 8), 1);
    assert_eq!(buf, [2, 8, 9, 3]);
    assert_eq!(buf.rinsert(4, 6), 4);
    assert_eq!(buf, [2, 8, 9, 3]);
}

#[test]
fn bulk_inserts_drop_the_right_excess() {
    let mut buf = CircularBuffer::from_iter_with_capacity(5, [1, 2, 3]);
    buf.insert_iter(2, [10, 11, 12, 13]);
    assert_eq!(buf, [10, 11, 12, 13, 3]);

    let mut buf = CircularBuffer::from_iter_with_capacity(5, [1, 2, 3]);
    buf.rinsert_iter(1, [10, 11, 12, 13]);
    assert_eq!(buf, [1, 10, 11, 12, 13]);

    let mut buf = CircularBuffer::from_iter_with_capacity(5, [1, 2, 3]);
    buf.insert_n(3, 4, &0);
    assert_eq!(buf, [3, 0, 0, 0, 0]);
}

#[test]
fn sliding_window_average() {
    let samples = [4.0_f64, 8.0, 6.0, 2.0, 10.0, 12.0];
    let mut window = CircularBuffer::with_capacity(3);
    let mut means = Vec::new();
    for s in samples {
        window.push_back(s);
        means.push(window.iter().sum::<f64>() / window.len() as f64);
    }
    assert_eq!(means, [4.0, 6.0, 6.0, 16.0 / 3.0, 6.0, 8.0]);
}

#[test]
fn cursors_walk_across_the_wrap() {
    let mut buf = CircularBuffer::with_capacity(4);
    buf.extend([0, 1, 2, 3, 4, 5]);
    assert_eq!(buf, [2, 3, 4, 5]);

    let mut cur = buf.begin();
    let mut seen = Vec::new();
    while let Some(v) = cur.get() {
        seen.push(*v);
        cur.move_next();
    }
    assert_eq!(seen, [2, 3, 4, 5]);
    assert_eq!(cur, buf.end());
    assert_eq!(buf.end() - buf.begin(), 4);
    assert_eq!((buf.begin() + 3isize).get(), Some(&5));
    assert!(buf.cursor(1) < buf.cursor(2));
    assert_eq!(buf.cursor(2).physical(), Some(0));
}

#[test]
fn checked_access_reports_out_of_range() {
    let mut buf = CircularBuffer::from_iter_with_capacity(3, ['a', 'b']);
    assert_eq!(buf.at(1), Ok(&'b'));
    assert_eq!(buf.at(2), Err(RingError::OutOfRange { index: 2, len: 2 }));
    *buf.at_mut(0).unwrap() = 'z';
    assert_eq!(buf.front(), Some(&'z'));
    assert_eq!(buf.get(5), None);
}

#[test]
fn equality_ordering_and_hash_ignore_layout() {
    let mut wrapped = CircularBuffer::with_capacity(3);
    wrapped.extend([0, 1, 2, 3]);
    let straight = CircularBuffer::from_iter_with_capacity(7, [1, 2, 3]);

    assert_eq!(wrapped, straight);
    assert_eq!(hash_of(&wrapped), hash_of(&straight));
    assert!(wrapped < CircularBuffer::from([1, 2, 4]));
    assert_eq!(format!("{wrapped:?}"), "[1, 2, 3]");
}

#[test]
fn take_leaves_an_empty_zero_capacity_buffer() {
    let mut buf = CircularBuffer::from_iter_with_capacity(4, ["x".to_string()]);
    let moved = std::mem::take(&mut buf);
    assert_eq!(moved, ["x".to_string()]);
    assert!(buf.is_empty());
    assert_eq!(buf.capacity(), 0);
    buf.push_back("ignored".into());
    assert!(buf.is_empty());
}

#[test]
fn into_iter_drains_in_logical_order() {
    let mut buf = CircularBuffer::with_capacity(3);
    buf.extend(["a", "b", "c", "d"].map(String::from));
    let mut it = buf.into_iter();
    assert_eq!(it.next().as_deref(), Some("b"));
    assert_eq!(it.next_back().as_deref(), Some("d"));
    assert_eq!(it.len(), 1);
    assert_eq!(it.collect::<Vec<_>>(), ["c"]);
}

#[test]
fn space_optimized_tracks_demand() {
    let control = CapacityControl::new(1000, 16).unwrap();
    let mut log = SpaceOptimized::new(control).unwrap();
    assert_eq!(log.internal_capacity(), 16);

    for i in 0..1500u32 {
        log.push_back(i).unwrap();
        assert!(log.internal_capacity() <= 1000);
        assert!(log.internal_capacity() >= 16);
    }
    assert_eq!(log.len(), 1000);
    assert_eq!(log.front(), Some(&500));

    log.erase_begin(990);
    assert!(log.internal_capacity() < 100);
    assert_eq!(log.iter().copied().collect::<Vec<_>>(), (1490..1500).collect::<Vec<_>>());
}

#[test]
fn buffers_are_send_and_sync_when_elements_are() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CircularBuffer<String>>();
    assert_send_sync::<SpaceOptimized<Vec<u8>>>();

    let buf = CircularBuffer::from_iter_with_capacity(4, [1, 2, 3]);
    let total = std::thread::scope(|s| {
        let a = s.spawn(|| buf.iter().sum::<i32>());
        let b = s.spawn(|| buf.iter().rev().sum::<i32>());
        a.join().unwrap() + b.join().unwrap()
    });
    assert_eq!(total, 12);
}
