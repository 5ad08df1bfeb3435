/*!
 * Concurrency Tests
 * Shared-arena traffic across threads under both lock types
 */

use firstfit::{Heap, HeapConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;

#[test]
fn test_threads_share_one_arena() {
    let heap = Heap::new();
    let usable = heap.usable();
    let mut handles = Vec::new();

    for seed in 0..4u64 {
        let heap = heap.clone();
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut live = Vec::new();

            for _ in 0..500 {
                if live.len() < 8 && rng.gen_bool(0.6) {
                    let size = rng.gen_range(1..256);
                    let addr = heap.allocate(size).expect("arena sized for all threads");
                    live.push(addr);
                } else if let Some(addr) = live.pop() {
                    heap.deallocate(addr).unwrap();
                }
            }

            for addr in live {
                heap.deallocate(addr).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Total order under the lock: after every thread drained, the arena is
    // one spanning free block again.
    assert_eq!(heap.free_bytes_remaining(), usable);
    assert_eq!(heap.free_regions().len(), 1);
    assert_eq!(heap.stats().allocated_blocks, 0);
}

#[test]
fn test_threads_with_parking_lot_lock() {
    let heap = Heap::<parking_lot::RawMutex>::with_config(
        HeapConfig::new().capacity(64 * 1024),
    );
    let usable = heap.usable();
    let mut handles = Vec::new();

    for seed in 10..14u64 {
        let heap = heap.clone();
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..300 {
                let size = rng.gen_range(1..128);
                let addr = heap.allocate(size).unwrap();
                heap.deallocate(addr).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(heap.free_bytes_remaining(), usable);
    assert_eq!(heap.free_regions().len(), 1);
}

#[test]
fn test_counters_consistent_under_contention() {
    let heap = Heap::with_capacity(32 * 1024);
    let mut handles = Vec::new();

    for _ in 0..4 {
        let heap = heap.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                let addr = heap.allocate(64).unwrap();
                heap.deallocate(addr).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = heap.stats();
    assert_eq!(stats.used_bytes, 0);
    assert_eq!(stats.not_owned_rejections, 0);
    assert_eq!(stats.double_free_rejections, 0);

    // At most four 80-byte blocks were ever live at once.
    assert!(stats.low_watermark <= stats.free_bytes);
    assert!(stats.low_watermark >= stats.usable - 4 * 80);
}
