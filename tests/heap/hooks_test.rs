/*!
 * Failure Hook Tests
 * Full-hook firing discipline and rejection counters
 */

use firstfit::{Heap, HeapConfig, HeapError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting_heap(capacity: usize) -> (Heap, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let hook_fired = Arc::clone(&fired);
    let heap = Heap::with_config(
        HeapConfig::new()
            .capacity(capacity)
            .on_full(move || {
                hook_fired.fetch_add(1, Ordering::SeqCst);
            }),
    );
    (heap, fired)
}

#[test]
fn test_full_hook_fires_once_per_failing_call() {
    let (heap, fired) = counting_heap(2048);
    let usable = heap.usable();

    assert!(heap.allocate(usable + 1).is_err());
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    assert!(heap.allocate(usable * 2).is_err());
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    // Successful calls never fire it.
    let addr = heap.allocate(64).unwrap();
    heap.deallocate(addr).unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[test]
fn test_full_hook_fires_when_arena_exhausted() {
    let (heap, fired) = counting_heap(2048);
    let usable = heap.usable();

    let addr = heap.allocate(usable - 16).unwrap();
    assert_eq!(heap.free_bytes_remaining(), 0);

    for attempt in 1..=3 {
        match heap.allocate(1) {
            Err(HeapError::OutOfMemory { available, .. }) => assert_eq!(available, 0),
            other => panic!("expected OutOfMemory, got {:?}", other),
        }
        assert_eq!(fired.load(Ordering::SeqCst), attempt);
    }

    heap.deallocate(addr).unwrap();
}

#[test]
fn test_fragmentation_miss_does_not_fire_full_hook() {
    let (heap, fired) = counting_heap(4096);

    let mut blocks = Vec::new();
    while let Ok(addr) = heap.allocate(32) {
        blocks.push(addr);
    }
    let fired_by_fill = fired.load(Ordering::SeqCst);

    // Interior holes only: aggregate is plenty, no block fits.
    for addr in blocks.iter().skip(1).step_by(2).take(blocks.len() / 2 - 2) {
        heap.deallocate(*addr).unwrap();
    }
    assert!(heap.free_bytes_remaining() >= 64);

    match heap.allocate(64) {
        Err(HeapError::Fragmented { .. }) => {}
        other => panic!("expected Fragmented, got {:?}", other),
    }

    // The miss above must not have moved the counter.
    assert_eq!(fired.load(Ordering::SeqCst), fired_by_fill);
}

#[test]
fn test_zero_size_does_not_fire_full_hook() {
    let (heap, fired) = counting_heap(2048);
    assert_eq!(heap.allocate(0), Err(HeapError::ZeroSize));
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn test_rejection_counters_are_independent() {
    let heap = Heap::with_capacity(2048);

    let addr = heap.allocate(64).unwrap();
    heap.deallocate(addr).unwrap();

    // Two double frees, one foreign address.
    let _ = heap.deallocate(addr);
    let _ = heap.deallocate(addr);
    let _ = heap.deallocate(usize::MAX / 2);

    let stats = heap.stats();
    assert_eq!(stats.double_free_rejections, 2);
    assert_eq!(stats.not_owned_rejections, 1);
}
