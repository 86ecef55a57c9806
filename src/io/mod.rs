//! # Byte Channels
//!
//! Buffered pull/push primitives over raw byte sources and sinks: fixed-width
//! little-endian integer and float access, varint counts and lengths,
//! length-prefixed strings and bulk reads. No business logic lives here —
//! the codec registry composes these operations into column codecs.
//!
//! ## Module Structure
//!
//! - `varint`: LEB128 slice-level helpers
//! - `input`: `ByteInput` with resumable checkpoint/rollback semantics
//! - `output`: `ByteOutput` buffered over an optional sink

mod input;
mod output;
pub mod varint;

pub use input::ByteInput;
pub use output::ByteOutput;
