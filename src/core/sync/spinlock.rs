/*!
 * Busy-Wait Spin Lock
 *
 * Default lock for the heap engine: a `lock_api::RawMutex` built on a
 * single atomic flag. Critical sections in the engine are short (one list
 * walk at most), so contention is resolved with a two-phase wait:
 *
 * 1. **Tight spin phase** (first 10 attempts): just `spin_loop()` hint
 * 2. **Yield phase** (after that): `yield_now()` every attempt
 *
 * On targets without a scheduler the yield is a no-op and the lock degrades
 * to a plain spin.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Raw busy-wait spin lock.
///
/// Not reentrant: re-locking from the owning thread (e.g. from inside a
/// heap failure hook) deadlocks.
pub struct RawSpinLock {
    locked: AtomicBool,
}

unsafe impl lock_api::RawMutex for RawSpinLock {
    const INIT: RawSpinLock = RawSpinLock {
        locked: AtomicBool::new(false),
    };

    type GuardMarker = lock_api::GuardSend;

    fn lock(&self) {
        let mut attempts = 0u32;
        while !self.try_lock() {
            if attempts < 10 {
                std::hint::spin_loop();
            } else {
                thread::yield_now();
            }
            attempts = attempts.saturating_add(1);
        }
    }

    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// Mutex over the default spin lock.
pub type SpinMutex<T> = lock_api::Mutex<RawSpinLock, T>;
