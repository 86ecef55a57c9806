//! # Bitmap Aggregate States
//!
//! Wire format of `AggregateFunction(groupBitmap, T)` states for integer `T`
//! up to 64 bits:
//!
//! | Flag byte | Layout |
//! |-----------|--------|
//! | 0 | varint cardinality + that many fixed-width LE values |
//! | 1 | varint byte size + portable roaring serialization |
//!
//! Small sets (32 values or fewer) use the flat layout; larger sets use the
//! roaring container format. The roaring format indexes 32-bit values, so a
//! 64-bit column whose state crossed the small-set threshold cannot be
//! represented and fails with `UnsupportedType`.

use eyre::{bail, Result};
use roaring::RoaringBitmap;

use crate::error::WireError;
use crate::io::{ByteInput, ByteOutput};
use crate::types::ColumnKind;
use crate::value::Bitmap;

const SMALL_SET_FLAG: u8 = 0;
const ROARING_FLAG: u8 = 1;

/// Wire width of the bitmap's element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapWidth {
    W1,
    W2,
    W4,
    W8,
}

impl BitmapWidth {
    pub fn bytes(self) -> usize {
        match self {
            BitmapWidth::W1 => 1,
            BitmapWidth::W2 => 2,
            BitmapWidth::W4 => 4,
            BitmapWidth::W8 => 8,
        }
    }
}

/// Maps an integer element kind to its bitmap width. `None` for kinds that
/// cannot be a `groupBitmap` element.
pub fn width_for(kind: ColumnKind) -> Option<BitmapWidth> {
    match kind {
        ColumnKind::Int8 | ColumnKind::UInt8 => Some(BitmapWidth::W1),
        ColumnKind::Int16 | ColumnKind::UInt16 => Some(BitmapWidth::W2),
        ColumnKind::Int32 | ColumnKind::UInt32 => Some(BitmapWidth::W4),
        ColumnKind::Int64 | ColumnKind::UInt64 => Some(BitmapWidth::W8),
        _ => None,
    }
}

pub fn read_bitmap(input: &mut ByteInput, width: BitmapWidth) -> Result<Bitmap> {
    match input.read_u8()? {
        SMALL_SET_FLAG => {
            let count = input.read_varint()? as usize;
            let mut values = Vec::with_capacity(count.min(64));
            for _ in 0..count {
                values.push(read_element(input, width)?);
            }
            Ok(Bitmap::Small(values))
        }
        ROARING_FLAG => {
            if width == BitmapWidth::W8 {
                bail!(WireError::UnsupportedType(
                    "roaring groupBitmap state over a 64-bit element".into()
                ));
            }
            let len = input.read_varint()? as usize;
            let bytes = input.read_bytes(len)?;
            let bitmap = RoaringBitmap::deserialize_from(bytes)
                .map_err(|e| WireError::InvalidData(format!("bad roaring bitmap: {e}")))?;
            Ok(Bitmap::Roaring(bitmap))
        }
        flag => bail!(WireError::InvalidData(format!(
            "unknown bitmap flag byte {flag:#04x}"
        ))),
    }
}

fn read_element(input: &mut ByteInput, width: BitmapWidth) -> Result<u64> {
    Ok(match width {
        BitmapWidth::W1 => u64::from(input.read_u8()?),
        BitmapWidth::W2 => u64::from(input.read_u16_le()?),
        BitmapWidth::W4 => u64::from(input.read_u32_le()?),
        BitmapWidth::W8 => input.read_u64_le()?,
    })
}

pub fn write_bitmap(output: &mut ByteOutput, bitmap: &Bitmap, width: BitmapWidth) -> Result<()> {
    match bitmap {
        Bitmap::Small(values) => {
            output.write_u8(SMALL_SET_FLAG);
            output.write_varint(values.len() as u64);
            for value in values {
                write_element(output, *value, width);
            }
        }
        Bitmap::Roaring(bitmap) => {
            if width == BitmapWidth::W8 {
                bail!(WireError::UnsupportedType(
                    "roaring groupBitmap state over a 64-bit element".into()
                ));
            }
            output.write_u8(ROARING_FLAG);
            output.write_varint(bitmap.serialized_size() as u64);
            let mut bytes = Vec::with_capacity(bitmap.serialized_size());
            bitmap
                .serialize_into(&mut bytes)
                .map_err(|e| WireError::InvalidData(format!("roaring serialization failed: {e}")))?;
            output.write_raw(&bytes);
        }
    }
    Ok(())
}

fn write_element(output: &mut ByteOutput, value: u64, width: BitmapWidth) {
    match width {
        BitmapWidth::W1 => output.write_u8(value as u8),
        BitmapWidth::W2 => output.write_u16_le(value as u16),
        BitmapWidth::W4 => output.write_u32_le(value as u32),
        BitmapWidth::W8 => output.write_u64_le(value),
    }
}
