//! # Materialized Column Values
//!
//! `Value` is the mutable, reusable holder for one materialized column value
//! of any supported shape. The row stream processor owns one slot per column
//! and decodes into it in place, so steady-state row reading performs no
//! per-row slot allocation.
//!
//! ## Shapes
//!
//! | Shape | Variants |
//! |-------|----------|
//! | Scalar | `Bool`, signed/unsigned integers, floats, decimals, date/time, strings, `Uuid`, `Ipv4`/`Ipv6`, `Point` |
//! | Sequence | `Array` (ordered) |
//! | Mapping | `Map` (insertion-ordered key/value pairs) |
//! | Tuple | `Tuple` (fixed arity) |
//! | Aggregate | `Bitmap` |
//!
//! 256-bit integers and `Decimal256` keep their 32-byte little-endian wire
//! image; everything smaller uses native machine types.
//!
//! ## Coercion accessors
//!
//! Serializers accept any value whose shape can represent the column: all
//! integer variants coerce through [`Value::as_i128`]/[`Value::as_u128`], so
//! a widened `Int16` decoded from a `UInt8` column can be written straight
//! back. Shape mismatches fail with a descriptive error, never a panic.

mod bitmap;

pub use bitmap::Bitmap;

use eyre::{bail, Result};

/// One materialized column value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    /// 32-byte little-endian two's-complement image.
    Int256([u8; 32]),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    /// 32-byte little-endian image.
    UInt256([u8; 32]),
    Float32(f32),
    Float64(f64),
    /// Scaled integer: the logical value is `unscaled * 10^-scale`.
    Decimal { unscaled: i128, scale: u8 },
    /// 32-byte little-endian scaled integer image.
    Decimal256 { unscaled: [u8; 32], scale: u8 },
    /// Days since the Unix epoch.
    Date(u16),
    /// Signed days since the Unix epoch.
    Date32(i32),
    /// Seconds since the Unix epoch.
    DateTime(u32),
    /// Ticks of `10^-scale` seconds since the Unix epoch.
    DateTime64 { ticks: i64, scale: u8 },
    Text(String),
    Bytes(Vec<u8>),
    Uuid([u8; 16]),
    Ipv4([u8; 4]),
    Ipv6([u8; 16]),
    Point(f64, f64),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    /// Insertion-ordered key/value pairs.
    Map(Vec<(Value, Value)>),
    Bitmap(Bitmap),
}

impl Value {
    /// True for the null sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Resets the slot to the null sentinel in place.
    pub fn reset(&mut self) {
        *self = Value::Null;
    }

    /// Shape name used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int8(_) => "Int8",
            Value::Int16(_) => "Int16",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::Int128(_) => "Int128",
            Value::Int256(_) => "Int256",
            Value::UInt8(_) => "UInt8",
            Value::UInt16(_) => "UInt16",
            Value::UInt32(_) => "UInt32",
            Value::UInt64(_) => "UInt64",
            Value::UInt128(_) => "UInt128",
            Value::UInt256(_) => "UInt256",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::Decimal { .. } => "Decimal",
            Value::Decimal256 { .. } => "Decimal256",
            Value::Date(_) => "Date",
            Value::Date32(_) => "Date32",
            Value::DateTime(_) => "DateTime",
            Value::DateTime64 { .. } => "DateTime64",
            Value::Text(_) => "Text",
            Value::Bytes(_) => "Bytes",
            Value::Uuid(_) => "Uuid",
            Value::Ipv4(_) => "Ipv4",
            Value::Ipv6(_) => "Ipv6",
            Value::Point(..) => "Point",
            Value::Array(_) => "Array",
            Value::Tuple(_) => "Tuple",
            Value::Map(_) => "Map",
            Value::Bitmap(_) => "Bitmap",
        }
    }

    /// Signed integer view of any integer-shaped value.
    pub fn as_i128(&self) -> Result<i128> {
        Ok(match self {
            Value::Bool(b) => i128::from(*b),
            Value::Int8(v) => i128::from(*v),
            Value::Int16(v) => i128::from(*v),
            Value::Int32(v) => i128::from(*v),
            Value::Int64(v) => i128::from(*v),
            Value::Int128(v) => *v,
            Value::UInt8(v) => i128::from(*v),
            Value::UInt16(v) => i128::from(*v),
            Value::UInt32(v) => i128::from(*v),
            Value::UInt64(v) => i128::from(*v),
            Value::UInt128(v) => *v as i128,
            Value::Date(v) => i128::from(*v),
            Value::Date32(v) => i128::from(*v),
            Value::DateTime(v) => i128::from(*v),
            Value::DateTime64 { ticks, .. } => i128::from(*ticks),
            Value::Decimal { unscaled, .. } => *unscaled,
            other => bail!("expected an integer value, got {}", other.shape()),
        })
    }

    /// Unsigned integer view; the bit pattern of signed inputs is preserved
    /// at their own width, matching the wire representation.
    pub fn as_u64(&self) -> Result<u64> {
        Ok(match self {
            Value::Int8(v) => u64::from(*v as u8),
            Value::Int16(v) => u64::from(*v as u16),
            Value::Int32(v) => u64::from(*v as u32),
            Value::Int64(v) => *v as u64,
            other => other.as_i128()? as u64,
        })
    }

    pub fn as_i64(&self) -> Result<i64> {
        Ok(self.as_i128()? as i64)
    }

    pub fn as_i32(&self) -> Result<i32> {
        Ok(self.as_i128()? as i32)
    }

    pub fn as_i16(&self) -> Result<i16> {
        Ok(self.as_i128()? as i16)
    }

    pub fn as_i8(&self) -> Result<i8> {
        Ok(self.as_i128()? as i8)
    }

    pub fn as_u128(&self) -> Result<u128> {
        Ok(match self {
            Value::UInt128(v) => *v,
            Value::Int128(v) => *v as u128,
            other => u128::from(other.as_u64()?),
        })
    }

    pub fn as_bool(&self) -> Result<bool> {
        Ok(match self {
            Value::Bool(b) => *b,
            other => other.as_i128()? != 0,
        })
    }

    pub fn as_f64(&self) -> Result<f64> {
        Ok(match self {
            Value::Float32(v) => f64::from(*v),
            Value::Float64(v) => *v,
            other => other.as_i128()? as f64,
        })
    }

    pub fn as_f32(&self) -> Result<f32> {
        Ok(self.as_f64()? as f32)
    }

    /// Byte view of string-shaped values.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::Text(s) => Ok(s.as_bytes()),
            Value::Bytes(b) => Ok(b),
            other => bail!("expected a string value, got {}", other.shape()),
        }
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            other => bail!("expected an array value, got {}", other.shape()),
        }
    }

    pub fn as_tuple(&self) -> Result<&[Value]> {
        match self {
            Value::Tuple(items) => Ok(items),
            other => bail!("expected a tuple value, got {}", other.shape()),
        }
    }

    pub fn as_map(&self) -> Result<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Ok(entries),
            other => bail!("expected a map value, got {}", other.shape()),
        }
    }

    pub fn as_point(&self) -> Result<(f64, f64)> {
        match self {
            Value::Point(x, y) => Ok((*x, *y)),
            Value::Tuple(items) if items.len() == 2 => {
                Ok((items[0].as_f64()?, items[1].as_f64()?))
            }
            other => bail!("expected a point value, got {}", other.shape()),
        }
    }

    pub fn as_bitmap(&self) -> Result<&Bitmap> {
        match self {
            Value::Bitmap(bitmap) => Ok(bitmap),
            other => bail!("expected a bitmap value, got {}", other.shape()),
        }
    }

    /// 32-byte little-endian image of 256-bit and smaller integers.
    pub fn as_le256(&self) -> Result<[u8; 32]> {
        match self {
            Value::Int256(raw) | Value::UInt256(raw) => Ok(*raw),
            Value::Decimal256 { unscaled, .. } => Ok(*unscaled),
            other => {
                let v = other.as_i128()?;
                let mut raw = if v < 0 { [0xff; 32] } else { [0; 32] };
                raw[..16].copy_from_slice(&v.to_le_bytes());
                Ok(raw)
            }
        }
    }
}
