/*!
 * Core Types
 * Common types used across the crate
 */

/// Arena offset of a payload, as handed out by the engine.
///
/// Offsets are indices into the arena buffer; they are converted to real
/// pointers only at the `ffi`/`global` boundary.
pub type Address = usize;

/// Size type for heap operations
pub type Size = usize;
