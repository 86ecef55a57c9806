//! Deserializer side of the codec registry.

use eyre::{ensure, Result};
use zerocopy::byteorder::little_endian as le;
use zerocopy::FromBytes;

use super::bitmap::{self, BitmapWidth};
use super::{bulk_element, unsupported, BulkElem};
use crate::config::CodecConfig;
use crate::error::WireError;
use crate::io::ByteInput;
use crate::types::{Column, ColumnKind};
use crate::value::Value;

/// Reserve hint cap: counts come off the wire and are untrusted, so large
/// sequences grow instead of pre-allocating.
const MAX_RESERVE: usize = 64 * 1024;

/// Composed deserializer for one column.
#[derive(Debug, Clone)]
pub enum Decoder {
    Nothing,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    UInt8 { widen: bool },
    UInt16 { widen: bool },
    UInt32 { widen: bool },
    UInt64,
    UInt128,
    UInt256,
    Float32,
    Float64,
    Decimal { width: usize, scale: u8 },
    Decimal256 { scale: u8 },
    Date,
    Date32,
    DateTime,
    DateTime64 { scale: u8 },
    Enum8,
    Enum16,
    String { binary: bool },
    FixedString { len: usize, binary: bool },
    Uuid,
    Ipv4,
    Ipv6,
    Point,
    BulkArray(BulkElem),
    Array(Box<Decoder>),
    Map { key: Box<Decoder>, value: Box<Decoder> },
    Tuple(Vec<Decoder>),
    Nullable(Box<Decoder>),
    Bitmap(BitmapWidth),
}

/// Builds the deserializer for `column`. Pure function of descriptor and
/// configuration; fails with `UnsupportedType` outside the closed set.
pub fn build_decoder(config: &CodecConfig, column: &Column) -> Result<Decoder> {
    let inner = build_bare(config, column)?;
    Ok(if column.is_nullable() {
        Decoder::Nullable(Box::new(inner))
    } else {
        inner
    })
}

fn build_bare(config: &CodecConfig, column: &Column) -> Result<Decoder> {
    let widen = config.widen_unsigned_types;
    let binary = config.use_binary_string;
    let decoder = match column.kind() {
        ColumnKind::Nothing => Decoder::Nothing,
        ColumnKind::Bool => Decoder::Bool,
        ColumnKind::Int8 => Decoder::Int8,
        ColumnKind::Int16 => Decoder::Int16,
        ColumnKind::Int32 => Decoder::Int32,
        ColumnKind::Int64 => Decoder::Int64,
        ColumnKind::Int128 => Decoder::Int128,
        ColumnKind::Int256 => Decoder::Int256,
        ColumnKind::UInt8 => Decoder::UInt8 { widen },
        ColumnKind::UInt16 => Decoder::UInt16 { widen },
        ColumnKind::UInt32 => Decoder::UInt32 { widen },
        ColumnKind::UInt64 => Decoder::UInt64,
        ColumnKind::UInt128 => Decoder::UInt128,
        ColumnKind::UInt256 => Decoder::UInt256,
        ColumnKind::Float32 => Decoder::Float32,
        ColumnKind::Float64 => Decoder::Float64,
        ColumnKind::Decimal => match column.decimal_byte_width() {
            32 => Decoder::Decimal256 { scale: column.scale() },
            width => Decoder::Decimal { width, scale: column.scale() },
        },
        ColumnKind::Date => Decoder::Date,
        ColumnKind::Date32 => Decoder::Date32,
        ColumnKind::DateTime => Decoder::DateTime,
        ColumnKind::DateTime64 => Decoder::DateTime64 { scale: column.scale() },
        ColumnKind::Enum8 => Decoder::Enum8,
        ColumnKind::Enum16 => Decoder::Enum16,
        ColumnKind::String | ColumnKind::Json => Decoder::String { binary },
        ColumnKind::FixedString => Decoder::FixedString {
            len: column.fixed_len(),
            binary,
        },
        ColumnKind::Uuid => Decoder::Uuid,
        ColumnKind::Ipv4 => Decoder::Ipv4,
        ColumnKind::Ipv6 => Decoder::Ipv6,
        ColumnKind::Point => Decoder::Point,
        ColumnKind::Ring => array_of(Decoder::Point, 1),
        ColumnKind::Polygon => array_of(Decoder::Point, 2),
        ColumnKind::MultiPolygon => array_of(Decoder::Point, 3),
        ColumnKind::Array => {
            let element = child(column, 0)?;
            match bulk_element(config, element) {
                Some(elem) => Decoder::BulkArray(elem),
                None => Decoder::Array(Box::new(build_decoder(config, element)?)),
            }
        }
        ColumnKind::Map => {
            ensure!(column.children().len() == 2, unsupported(column));
            Decoder::Map {
                key: Box::new(build_decoder(config, child(column, 0)?)?),
                value: Box::new(build_decoder(config, child(column, 1)?)?),
            }
        }
        ColumnKind::Tuple => Decoder::Tuple(
            column
                .children()
                .iter()
                .map(|field| build_decoder(config, field))
                .collect::<Result<_>>()?,
        ),
        ColumnKind::Nested => Decoder::Tuple(
            column
                .children()
                .iter()
                .map(|field| build_decoder(config, &Column::array("", field.clone())))
                .collect::<Result<_>>()?,
        ),
        ColumnKind::SimpleAggregateFunction => build_decoder(config, child(column, 0)?)?,
        ColumnKind::AggregateFunction => {
            if column.aggregate_fn() != Some("groupBitmap") {
                return Err(unsupported(column));
            }
            let width = bitmap::width_for(child(column, 0)?.kind()).ok_or_else(|| unsupported(column))?;
            Decoder::Bitmap(width)
        }
    };
    Ok(decoder)
}

fn child(column: &Column, index: usize) -> Result<&Column> {
    column
        .children()
        .get(index)
        .ok_or_else(|| unsupported(column))
}

fn array_of(decoder: Decoder, depth: usize) -> Decoder {
    let mut out = decoder;
    for _ in 0..depth {
        out = Decoder::Array(Box::new(out));
    }
    out
}

/// Takes an existing sequence allocation out of the slot for reuse.
fn reuse_vec(dst: &mut Value) -> Vec<Value> {
    match std::mem::take(dst) {
        Value::Array(mut items) | Value::Tuple(mut items) => {
            items.clear();
            items
        }
        _ => Vec::new(),
    }
}

impl Decoder {
    /// Decodes one value into `dst` in place. On a resumable channel a
    /// `NotEnoughData` failure leaves `dst` unspecified; the caller rolls the
    /// channel back and retries the whole value.
    pub fn decode(&self, dst: &mut Value, input: &mut ByteInput) -> Result<()> {
        match self {
            Decoder::Nothing => dst.reset(),
            Decoder::Bool => *dst = Value::Bool(input.read_u8()? != 0),
            Decoder::Int8 => *dst = Value::Int8(input.read_i8()?),
            Decoder::Int16 => *dst = Value::Int16(input.read_i16_le()?),
            Decoder::Int32 => *dst = Value::Int32(input.read_i32_le()?),
            Decoder::Int64 => *dst = Value::Int64(input.read_i64_le()?),
            Decoder::Int128 => *dst = Value::Int128(input.read_i128_le()?),
            Decoder::Int256 => {
                let mut raw = [0u8; 32];
                input.read_exact(&mut raw)?;
                *dst = Value::Int256(raw);
            }
            Decoder::UInt8 { widen } => {
                let v = input.read_u8()?;
                *dst = if *widen { Value::Int16(i16::from(v)) } else { Value::Int8(v as i8) };
            }
            Decoder::UInt16 { widen } => {
                let v = input.read_u16_le()?;
                *dst = if *widen { Value::Int32(i32::from(v)) } else { Value::Int16(v as i16) };
            }
            Decoder::UInt32 { widen } => {
                let v = input.read_u32_le()?;
                *dst = if *widen { Value::Int64(i64::from(v)) } else { Value::Int32(v as i32) };
            }
            Decoder::UInt64 => *dst = Value::UInt64(input.read_u64_le()?),
            Decoder::UInt128 => *dst = Value::UInt128(input.read_u128_le()?),
            Decoder::UInt256 => {
                let mut raw = [0u8; 32];
                input.read_exact(&mut raw)?;
                *dst = Value::UInt256(raw);
            }
            Decoder::Float32 => *dst = Value::Float32(input.read_f32_le()?),
            Decoder::Float64 => *dst = Value::Float64(input.read_f64_le()?),
            Decoder::Decimal { width, scale } => {
                let unscaled = match width {
                    4 => i128::from(input.read_i32_le()?),
                    8 => i128::from(input.read_i64_le()?),
                    _ => input.read_i128_le()?,
                };
                *dst = Value::Decimal { unscaled, scale: *scale };
            }
            Decoder::Decimal256 { scale } => {
                let mut unscaled = [0u8; 32];
                input.read_exact(&mut unscaled)?;
                *dst = Value::Decimal256 { unscaled, scale: *scale };
            }
            Decoder::Date => *dst = Value::Date(input.read_u16_le()?),
            Decoder::Date32 => *dst = Value::Date32(input.read_i32_le()?),
            Decoder::DateTime => *dst = Value::DateTime(input.read_u32_le()?),
            Decoder::DateTime64 { scale } => {
                *dst = Value::DateTime64 {
                    ticks: input.read_i64_le()?,
                    scale: *scale,
                }
            }
            Decoder::Enum8 => *dst = Value::Int8(input.read_i8()?),
            Decoder::Enum16 => *dst = Value::Int16(input.read_i16_le()?),
            Decoder::String { binary } => {
                let len = input.read_varint()? as usize;
                let bytes = input.read_bytes(len)?;
                set_string(dst, bytes, *binary)?;
            }
            Decoder::FixedString { len, binary } => {
                let bytes = input.read_bytes(*len)?;
                set_string(dst, bytes, *binary)?;
            }
            Decoder::Uuid => {
                let mut raw = [0u8; 16];
                input.read_exact(&mut raw)?;
                *dst = Value::Uuid(raw);
            }
            Decoder::Ipv4 => {
                let mut raw = [0u8; 4];
                input.read_exact(&mut raw)?;
                *dst = Value::Ipv4(raw);
            }
            Decoder::Ipv6 => {
                let mut raw = [0u8; 16];
                input.read_exact(&mut raw)?;
                *dst = Value::Ipv6(raw);
            }
            Decoder::Point => {
                let x = input.read_f64_le()?;
                let y = input.read_f64_le()?;
                *dst = Value::Point(x, y);
            }
            Decoder::BulkArray(elem) => {
                let count = input.read_varint()? as usize;
                // The count is untrusted; a wrapped product would decode a
                // corrupt array as truncated instead of failing.
                let byte_len = count.checked_mul(elem.width()).ok_or_else(|| {
                    WireError::InvalidData(format!("array count {count} overflows"))
                })?;
                let mut items = reuse_vec(dst);
                items.reserve(count.min(MAX_RESERVE));
                let block = input.read_bytes(byte_len)?;
                decode_bulk_block(*elem, block, &mut items)?;
                *dst = Value::Array(items);
            }
            Decoder::Array(element) => {
                let count = input.read_varint()? as usize;
                let mut items = reuse_vec(dst);
                items.reserve(count.min(MAX_RESERVE));
                for _ in 0..count {
                    let mut item = Value::Null;
                    element.decode(&mut item, input)?;
                    items.push(item);
                }
                *dst = Value::Array(items);
            }
            Decoder::Map { key, value } => {
                let count = input.read_varint()? as usize;
                let mut entries = match std::mem::take(dst) {
                    Value::Map(mut entries) => {
                        entries.clear();
                        entries
                    }
                    _ => Vec::new(),
                };
                entries.reserve(count.min(MAX_RESERVE));
                for _ in 0..count {
                    let mut k = Value::Null;
                    let mut v = Value::Null;
                    key.decode(&mut k, input)?;
                    value.decode(&mut v, input)?;
                    entries.push((k, v));
                }
                *dst = Value::Map(entries);
            }
            Decoder::Tuple(fields) => {
                let mut items = reuse_vec(dst);
                for field in fields {
                    let mut item = Value::Null;
                    field.decode(&mut item, input)?;
                    items.push(item);
                }
                *dst = Value::Tuple(items);
            }
            Decoder::Nullable(inner) => {
                if input.read_u8()? != 0 {
                    dst.reset();
                } else {
                    inner.decode(dst, input)?;
                }
            }
            Decoder::Bitmap(width) => {
                *dst = Value::Bitmap(bitmap::read_bitmap(input, *width)?);
            }
        }
        Ok(())
    }
}

fn set_string(dst: &mut Value, bytes: &[u8], binary: bool) -> Result<()> {
    if binary {
        if let Value::Bytes(existing) = dst {
            existing.clear();
            existing.extend_from_slice(bytes);
        } else {
            *dst = Value::Bytes(bytes.to_vec());
        }
    } else {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| WireError::InvalidData("string is not valid UTF-8".into()))?;
        if let Value::Text(existing) = dst {
            existing.clear();
            existing.push_str(text);
        } else {
            *dst = Value::Text(text.to_string());
        }
    }
    Ok(())
}

/// Reinterprets one contiguous element block through the unaligned
/// little-endian views, so a bulk array costs one channel fill instead of
/// one per element.
fn decode_bulk_block(elem: BulkElem, block: &[u8], items: &mut Vec<Value>) -> Result<()> {
    fn cast<T>(block: &[u8]) -> Result<&[T]>
    where
        T: FromBytes + zerocopy::Immutable + zerocopy::KnownLayout + zerocopy::Unaligned,
    {
        <[T]>::ref_from_bytes(block)
            .map_err(|_| WireError::InvalidData("bulk array block size mismatch".into()).into())
    }

    match elem {
        BulkElem::Int8 => items.extend(block.iter().map(|b| Value::Int8(*b as i8))),
        BulkElem::Int16 => {
            items.extend(cast::<le::I16>(block)?.iter().map(|v| Value::Int16(v.get())))
        }
        BulkElem::Int32 => {
            items.extend(cast::<le::I32>(block)?.iter().map(|v| Value::Int32(v.get())))
        }
        BulkElem::Int64 => {
            items.extend(cast::<le::I64>(block)?.iter().map(|v| Value::Int64(v.get())))
        }
        BulkElem::UInt8 { widen } => items.extend(block.iter().map(|b| {
            if widen {
                Value::Int16(i16::from(*b))
            } else {
                Value::Int8(*b as i8)
            }
        })),
        BulkElem::UInt16 { widen } => {
            items.extend(cast::<le::U16>(block)?.iter().map(|v| {
                if widen {
                    Value::Int32(i32::from(v.get()))
                } else {
                    Value::Int16(v.get() as i16)
                }
            }))
        }
        BulkElem::UInt32 { widen } => {
            items.extend(cast::<le::U32>(block)?.iter().map(|v| {
                if widen {
                    Value::Int64(i64::from(v.get()))
                } else {
                    Value::Int32(v.get() as i32)
                }
            }))
        }
        BulkElem::UInt64 => {
            items.extend(cast::<le::U64>(block)?.iter().map(|v| Value::UInt64(v.get())))
        }
        BulkElem::Float32 => {
            items.extend(cast::<le::F32>(block)?.iter().map(|v| Value::Float32(v.get())))
        }
        BulkElem::Float64 => {
            items.extend(cast::<le::F64>(block)?.iter().map(|v| Value::Float64(v.get())))
        }
    }
    Ok(())
}
