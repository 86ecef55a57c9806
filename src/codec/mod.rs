//! # Codec Registry
//!
//! Builds a composed [`Decoder`] or [`Encoder`] for one column descriptor.
//! Both builders are pure functions of the descriptor and the configuration:
//! they perform no I/O and fail fast with `UnsupportedType` for anything
//! outside the closed kind set, so a malformed schema is always a
//! construction error, never a mid-stream one.
//!
//! The codecs are tagged-variant sum types over column kinds; composite
//! variants own their child codecs, built by recursing into the descriptor's
//! children (which are fully resolved and acyclic by construction). Dispatch
//! is therefore exhaustive and checked at compile time.
//!
//! ## Wire rules
//!
//! | Kind | Encoding |
//! |------|----------|
//! | fixed-width scalars | constant byte count, little-endian |
//! | String / JSON | varint byte length + bytes |
//! | FixedString(n) | n raw bytes |
//! | Decimal | scaled LE integer, width from precision |
//! | Array | varint element count + elements |
//! | Map | varint entry count + (key, value) pairs |
//! | Tuple | fields back to back, arity from the descriptor |
//! | Nested | tuple of per-field arrays |
//! | Ring / Polygon / MultiPolygon | nested arrays of the Point codec |
//! | Nullable(T) | 1 flag byte (non-zero = null), then T when present |
//! | SimpleAggregateFunction(T) | exactly T |
//! | AggregateFunction(groupBitmap, T) | bitmap state (see `bitmap`) |
//! | Nothing | zero bytes |
//!
//! Configuration never changes these bytes; it only selects the decoded
//! output shape (unsigned widening, binary strings) or an equivalent faster
//! path (bulk arrays).

pub mod bitmap;
mod decode;
mod encode;

pub use bitmap::BitmapWidth;
pub use decode::{build_decoder, Decoder};
pub use encode::{build_encoder, Encoder};

use crate::config::CodecConfig;
use crate::error::WireError;
use crate::types::{Column, ColumnKind};

fn unsupported(column: &Column) -> eyre::Report {
    WireError::UnsupportedType(format!("{} {}", column.name(), column.type_name())).into()
}

/// Bulk block codec element kinds: depth-1 fixed-width numerics whose wire
/// image can be reinterpreted directly from the byte block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkElem {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8 { widen: bool },
    UInt16 { widen: bool },
    UInt32 { widen: bool },
    UInt64,
    Float32,
    Float64,
}

impl BulkElem {
    pub fn width(&self) -> usize {
        match self {
            BulkElem::Int8 | BulkElem::UInt8 { .. } => 1,
            BulkElem::Int16 | BulkElem::UInt16 { .. } => 2,
            BulkElem::Int32 | BulkElem::UInt32 { .. } | BulkElem::Float32 => 4,
            BulkElem::Int64 | BulkElem::UInt64 | BulkElem::Float64 => 8,
        }
    }
}

/// The bulk block codec applies to depth-1 arrays of non-nullable
/// fixed-width numeric elements, when enabled. Both codec directions use the
/// same eligibility rule, and the bulk path never changes the bytes or the
/// value shapes of the generic path.
fn bulk_element(config: &CodecConfig, element: &Column) -> Option<BulkElem> {
    if !config.use_bulk_arrays || element.is_nullable() || !element.kind().is_bulk_array_element() {
        return None;
    }
    let widen = config.widen_unsigned_types;
    Some(match element.kind() {
        ColumnKind::Int8 => BulkElem::Int8,
        ColumnKind::Int16 => BulkElem::Int16,
        ColumnKind::Int32 => BulkElem::Int32,
        ColumnKind::Int64 => BulkElem::Int64,
        ColumnKind::UInt8 => BulkElem::UInt8 { widen },
        ColumnKind::UInt16 => BulkElem::UInt16 { widen },
        ColumnKind::UInt32 => BulkElem::UInt32 { widen },
        ColumnKind::UInt64 => BulkElem::UInt64,
        ColumnKind::Float32 => BulkElem::Float32,
        ColumnKind::Float64 => BulkElem::Float64,
        _ => return None,
    })
}

#[cfg(test)]
mod tests;
