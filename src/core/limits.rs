/*!
 * Construction-Time Limits
 * Default sizing for heap instances
 */

use crate::core::types::Size;

/// Default arena capacity in bytes (120 KiB).
///
/// Sized for MCU-class targets; override per instance via
/// [`HeapConfig`](crate::heap::HeapConfig).
pub const DEFAULT_HEAP_CAPACITY: Size = 120 * 1024;
