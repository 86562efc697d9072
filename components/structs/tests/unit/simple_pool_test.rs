//! Unit tests for SimplePool

use proptest::prelude::*;
use std::cell::Cell;
use std::rc::Rc;
use structs::SimplePool;

#[test]
fn get_object_creates_when_empty() {
    let mut pool = SimplePool::new(0, 4, || vec![0u8; 4]);
    let obj = pool.get_object();
    assert_eq!(obj.len(), 4);
    assert_eq!(pool.stats().created, 1);
    assert_eq!(pool.stats().reused, 0);
}

#[test]
fn released_object_is_reused() {
    let mut pool = SimplePool::new(0, 4, String::new);
    let mut s = pool.get_object();
    s.push_str("stale");
    pool.release_object(s);

    assert_eq!(pool.free_count(), 1);
    let _ = pool.get_object();
    assert_eq!(pool.stats().reused, 1);
    assert_eq!(pool.free_count(), 0);
}

#[test]
fn reset_hook_clears_before_reuse() {
    let mut pool = SimplePool::new(0, 4, String::new).with_reset(|s: &mut String| s.clear());
    let mut s = pool.get_object();
    s.push_str("stale");
    pool.release_object(s);
    assert!(pool.get_object().is_empty());
}

#[test]
fn reset_hook_runs_even_when_discarding() {
    let resets = Rc::new(Cell::new(0));
    let r = resets.clone();
    let mut pool = SimplePool::new(0, 1, || 0u32).with_reset(move |_| r.set(r.get() + 1));

    pool.release_object(1);
    pool.release_object(2);

    assert_eq!(resets.get(), 2);
    assert_eq!(pool.free_count(), 1);
    assert_eq!(pool.stats().discarded, 1);
}

#[test]
fn clear_empties_free_list() {
    let mut pool = SimplePool::new(3, 3, || 1u8);
    pool.clear();
    assert_eq!(pool.free_count(), 0);
    assert_eq!(pool.max_count(), 3);
}

proptest! {
    #[test]
    fn free_list_never_exceeds_max(max in 0usize..16, releases in 0usize..64) {
        let mut pool = SimplePool::new(0, max, || 0u64);
        for i in 0..releases {
            pool.release_object(i as u64);
        }
        prop_assert_eq!(pool.free_count(), releases.min(max));
        prop_assert_eq!(pool.stats().discarded, releases.saturating_sub(max));
    }
}
