/*!
 * Synchronization Primitives
 *
 * The engine serializes all heap traffic through a single mutual-exclusion
 * primitive. The lock is a policy parameter: any `lock_api::RawMutex`
 * qualifies (e.g. `parking_lot::RawMutex`). The default is the busy-wait
 * [`RawSpinLock`], suitable for targets without an OS scheduler.
 */

mod spinlock;

pub use spinlock::{RawSpinLock, SpinMutex};
