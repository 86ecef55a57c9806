//! Materialized `groupBitmap` aggregate state.
//!
//! Small sets keep their raw integers in wire order; larger 32-bit sets use a
//! roaring bitmap. The codec in `crate::codec::bitmap` decides which form a
//! stream carries.

use roaring::RoaringBitmap;

/// One materialized bitmap aggregate value.
#[derive(Debug, Clone, PartialEq)]
pub enum Bitmap {
    /// At most 32 values, kept in wire order.
    Small(Vec<u64>),
    /// Roaring-compressed set of 32-bit keys.
    Roaring(RoaringBitmap),
}

impl Bitmap {
    pub fn empty() -> Self {
        Bitmap::Small(Vec::new())
    }

    /// Builds the compact representation for a set of values: the small form
    /// for up to 32 values, roaring for larger sets of 32-bit keys.
    pub fn from_values(values: Vec<u64>) -> Self {
        if values.len() <= 32 || values.iter().any(|v| *v > u64::from(u32::MAX)) {
            Bitmap::Small(values)
        } else {
            Bitmap::Roaring(values.iter().map(|v| *v as u32).collect())
        }
    }

    pub fn cardinality(&self) -> u64 {
        match self {
            Bitmap::Small(values) => values.len() as u64,
            Bitmap::Roaring(bitmap) => bitmap.len(),
        }
    }

    pub fn contains(&self, value: u64) -> bool {
        match self {
            Bitmap::Small(values) => values.contains(&value),
            Bitmap::Roaring(bitmap) => {
                u32::try_from(value).map(|v| bitmap.contains(v)).unwrap_or(false)
            }
        }
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Bitmap::empty()
    }
}
