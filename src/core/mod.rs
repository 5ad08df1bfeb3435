/*!
 * Core Primitives
 * Shared types, limits, and synchronization
 */

pub mod limits;
pub mod sync;
pub mod types;

pub use limits::DEFAULT_HEAP_CAPACITY;
pub use types::{Address, Size};
