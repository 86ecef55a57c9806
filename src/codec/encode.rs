//! Serializer side of the codec registry.
//!
//! Serializers coerce through the [`Value`] accessor views, so any value
//! shape that can represent the column is accepted: a widened `Int64`
//! decoded from a `UInt32` column writes back byte-identically, and a
//! two-element tuple serializes as a point.

use eyre::{bail, ensure, Result};

use super::bitmap::{self, BitmapWidth};
use super::{bulk_element, unsupported, BulkElem};
use crate::config::CodecConfig;
use crate::io::ByteOutput;
use crate::types::{Column, ColumnKind};
use crate::value::Value;

/// Composed serializer for one column.
#[derive(Debug, Clone)]
pub enum Encoder {
    Nothing,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
    Float32,
    Float64,
    Decimal { width: usize },
    Decimal256,
    Date,
    Date32,
    DateTime,
    DateTime64,
    Enum8,
    Enum16,
    String,
    FixedString { len: usize },
    Uuid,
    Ipv4,
    Ipv6,
    Point,
    BulkArray(BulkElem),
    Array(Box<Encoder>),
    Map { key: Box<Encoder>, value: Box<Encoder> },
    Tuple(Vec<Encoder>),
    Nullable(Box<Encoder>),
    Bitmap(BitmapWidth),
}

/// Builds the serializer for `column`. Same closed set and same failure
/// rules as [`super::build_decoder`].
pub fn build_encoder(config: &CodecConfig, column: &Column) -> Result<Encoder> {
    let inner = build_bare(config, column)?;
    Ok(if column.is_nullable() {
        Encoder::Nullable(Box::new(inner))
    } else {
        inner
    })
}

fn build_bare(config: &CodecConfig, column: &Column) -> Result<Encoder> {
    let encoder = match column.kind() {
        ColumnKind::Nothing => Encoder::Nothing,
        ColumnKind::Bool => Encoder::Bool,
        ColumnKind::Int8 => Encoder::Int8,
        ColumnKind::Int16 => Encoder::Int16,
        ColumnKind::Int32 => Encoder::Int32,
        ColumnKind::Int64 => Encoder::Int64,
        ColumnKind::Int128 => Encoder::Int128,
        ColumnKind::Int256 => Encoder::Int256,
        ColumnKind::UInt8 => Encoder::UInt8,
        ColumnKind::UInt16 => Encoder::UInt16,
        ColumnKind::UInt32 => Encoder::UInt32,
        ColumnKind::UInt64 => Encoder::UInt64,
        ColumnKind::UInt128 => Encoder::UInt128,
        ColumnKind::UInt256 => Encoder::UInt256,
        ColumnKind::Float32 => Encoder::Float32,
        ColumnKind::Float64 => Encoder::Float64,
        ColumnKind::Decimal => match column.decimal_byte_width() {
            32 => Encoder::Decimal256,
            width => Encoder::Decimal { width },
        },
        ColumnKind::Date => Encoder::Date,
        ColumnKind::Date32 => Encoder::Date32,
        ColumnKind::DateTime => Encoder::DateTime,
        ColumnKind::DateTime64 => Encoder::DateTime64,
        ColumnKind::Enum8 => Encoder::Enum8,
        ColumnKind::Enum16 => Encoder::Enum16,
        ColumnKind::String | ColumnKind::Json => Encoder::String,
        ColumnKind::FixedString => Encoder::FixedString {
            len: column.fixed_len(),
        },
        ColumnKind::Uuid => Encoder::Uuid,
        ColumnKind::Ipv4 => Encoder::Ipv4,
        ColumnKind::Ipv6 => Encoder::Ipv6,
        ColumnKind::Point => Encoder::Point,
        ColumnKind::Ring => array_of(Encoder::Point, 1),
        ColumnKind::Polygon => array_of(Encoder::Point, 2),
        ColumnKind::MultiPolygon => array_of(Encoder::Point, 3),
        ColumnKind::Array => {
            let element = child(column, 0)?;
            match bulk_element(config, element) {
                Some(elem) => Encoder::BulkArray(elem),
                None => Encoder::Array(Box::new(build_encoder(config, element)?)),
            }
        }
        ColumnKind::Map => {
            ensure!(column.children().len() == 2, unsupported(column));
            Encoder::Map {
                key: Box::new(build_encoder(config, child(column, 0)?)?),
                value: Box::new(build_encoder(config, child(column, 1)?)?),
            }
        }
        ColumnKind::Tuple => Encoder::Tuple(
            column
                .children()
                .iter()
                .map(|field| build_encoder(config, field))
                .collect::<Result<_>>()?,
        ),
        ColumnKind::Nested => Encoder::Tuple(
            column
                .children()
                .iter()
                .map(|field| build_encoder(config, &Column::array("", field.clone())))
                .collect::<Result<_>>()?,
        ),
        ColumnKind::SimpleAggregateFunction => build_encoder(config, child(column, 0)?)?,
        ColumnKind::AggregateFunction => {
            if column.aggregate_fn() != Some("groupBitmap") {
                return Err(unsupported(column));
            }
            let width = bitmap::width_for(child(column, 0)?.kind()).ok_or_else(|| unsupported(column))?;
            Encoder::Bitmap(width)
        }
    };
    Ok(encoder)
}

fn child(column: &Column, index: usize) -> Result<&Column> {
    column
        .children()
        .get(index)
        .ok_or_else(|| unsupported(column))
}

fn array_of(encoder: Encoder, depth: usize) -> Encoder {
    let mut out = encoder;
    for _ in 0..depth {
        out = Encoder::Array(Box::new(out));
    }
    out
}

impl Encoder {
    /// Serializes one value. Only a null under a `Nullable` wrapper is legal;
    /// anywhere else it is a shape error.
    pub fn encode(&self, value: &Value, output: &mut ByteOutput) -> Result<()> {
        match self {
            Encoder::Nothing => {}
            Encoder::Bool => output.write_u8(u8::from(value.as_bool()?)),
            Encoder::Int8 | Encoder::Enum8 => output.write_i8(value.as_i8()?),
            Encoder::Int16 | Encoder::Enum16 => output.write_i16_le(value.as_i16()?),
            Encoder::Int32 => output.write_i32_le(value.as_i32()?),
            Encoder::Int64 => output.write_i64_le(value.as_i64()?),
            Encoder::Int128 => output.write_i128_le(value.as_i128()?),
            Encoder::Int256 | Encoder::UInt256 | Encoder::Decimal256 => {
                output.write_raw(&value.as_le256()?)
            }
            Encoder::UInt8 => output.write_u8(value.as_u64()? as u8),
            Encoder::UInt16 => output.write_u16_le(value.as_u64()? as u16),
            Encoder::UInt32 => output.write_u32_le(value.as_u64()? as u32),
            Encoder::UInt64 => output.write_u64_le(value.as_u64()?),
            Encoder::UInt128 => output.write_u128_le(value.as_u128()?),
            Encoder::Float32 => output.write_f32_le(value.as_f32()?),
            Encoder::Float64 => output.write_f64_le(value.as_f64()?),
            Encoder::Decimal { width } => {
                let unscaled = value.as_i128()?;
                match width {
                    4 => output.write_i32_le(unscaled as i32),
                    8 => output.write_i64_le(unscaled as i64),
                    _ => output.write_i128_le(unscaled),
                }
            }
            Encoder::Date => output.write_u16_le(value.as_u64()? as u16),
            Encoder::Date32 => output.write_i32_le(value.as_i32()?),
            Encoder::DateTime => output.write_u32_le(value.as_u64()? as u32),
            Encoder::DateTime64 => output.write_i64_le(value.as_i64()?),
            Encoder::String => output.write_len_prefixed(value.as_bytes()?),
            Encoder::FixedString { len } => {
                let bytes = value.as_bytes()?;
                ensure!(
                    bytes.len() <= *len,
                    "value of {} bytes exceeds FixedString({})",
                    bytes.len(),
                    len
                );
                output.write_raw(bytes);
                for _ in bytes.len()..*len {
                    output.write_u8(0);
                }
            }
            Encoder::Uuid => output.write_raw(&fixed_bytes::<16>(value)?),
            Encoder::Ipv4 => output.write_raw(&fixed_bytes::<4>(value)?),
            Encoder::Ipv6 => output.write_raw(&fixed_bytes::<16>(value)?),
            Encoder::Point => {
                let (x, y) = value.as_point()?;
                output.write_f64_le(x);
                output.write_f64_le(y);
            }
            Encoder::BulkArray(elem) => {
                let items = value.as_array()?;
                output.write_varint(items.len() as u64);
                let block = encode_bulk_block(*elem, items)?;
                output.write_raw(&block);
            }
            Encoder::Array(element) => {
                let items = value.as_array()?;
                output.write_varint(items.len() as u64);
                for item in items {
                    element.encode(item, output)?;
                }
            }
            Encoder::Map { key, value: val } => {
                let entries = value.as_map()?;
                output.write_varint(entries.len() as u64);
                for (k, v) in entries {
                    key.encode(k, output)?;
                    val.encode(v, output)?;
                }
            }
            Encoder::Tuple(fields) => {
                let items = value.as_tuple()?;
                ensure!(
                    items.len() == fields.len(),
                    "tuple arity mismatch: value has {} fields, column has {}",
                    items.len(),
                    fields.len()
                );
                for (field, item) in fields.iter().zip(items) {
                    field.encode(item, output)?;
                }
            }
            Encoder::Nullable(inner) => {
                if value.is_null() {
                    output.write_u8(1);
                } else {
                    output.write_u8(0);
                    inner.encode(value, output)?;
                }
            }
            Encoder::Bitmap(width) => bitmap::write_bitmap(output, value.as_bitmap()?, *width)?,
        }
        Ok(())
    }
}

/// Serializes a whole element sequence into one contiguous block, written in
/// a single pass. Coercion rules match the per-element path exactly.
fn encode_bulk_block(elem: BulkElem, items: &[Value]) -> Result<Vec<u8>> {
    let mut block = Vec::with_capacity(items.len() * elem.width());
    for item in items {
        match elem {
            BulkElem::Int8 => block.push(item.as_i8()? as u8),
            BulkElem::Int16 => block.extend_from_slice(&item.as_i16()?.to_le_bytes()),
            BulkElem::Int32 => block.extend_from_slice(&item.as_i32()?.to_le_bytes()),
            BulkElem::Int64 => block.extend_from_slice(&item.as_i64()?.to_le_bytes()),
            BulkElem::UInt8 { .. } => block.push(item.as_u64()? as u8),
            BulkElem::UInt16 { .. } => {
                block.extend_from_slice(&(item.as_u64()? as u16).to_le_bytes())
            }
            BulkElem::UInt32 { .. } => {
                block.extend_from_slice(&(item.as_u64()? as u32).to_le_bytes())
            }
            BulkElem::UInt64 => block.extend_from_slice(&item.as_u64()?.to_le_bytes()),
            BulkElem::Float32 => block.extend_from_slice(&item.as_f32()?.to_le_bytes()),
            BulkElem::Float64 => block.extend_from_slice(&item.as_f64()?.to_le_bytes()),
        }
    }
    Ok(block)
}

/// Exact-size byte image for UUID and IP columns; `Uuid`/`Ipv4`/`Ipv6`
/// variants or a `Bytes` of the right length.
fn fixed_bytes<const N: usize>(value: &Value) -> Result<[u8; N]> {
    match value {
        Value::Uuid(raw) if N == 16 => Ok(sized::<N>(raw)),
        Value::Ipv6(raw) if N == 16 => Ok(sized::<N>(raw)),
        Value::Ipv4(raw) if N == 4 => Ok(sized::<N>(raw)),
        Value::Bytes(raw) if raw.len() == N => {
            let mut out = [0u8; N];
            out.copy_from_slice(raw);
            Ok(out)
        }
        other => bail!("expected a {N}-byte value, got {}", other.shape()),
    }
}

fn sized<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(raw);
    out
}
