//! # Column Kind Enumeration
//!
//! `ColumnKind` is the closed set of column kinds the wire layer understands.
//! Discriminants are grouped by category; the enum carries no metadata —
//! scale, precision, fixed length and children live on [`super::Column`].
//!
//! | Category | Kinds | Fixed wire size |
//! |----------|-------|-----------------|
//! | **Special** | Nothing | 0 bytes |
//! | **Boolean** | Bool | 1 byte |
//! | **Integer** | Int8..Int256, UInt8..UInt256 | 1-32 bytes |
//! | **Float** | Float32, Float64 | 4, 8 bytes |
//! | **Numeric** | Decimal | width from precision |
//! | **Date/Time** | Date, Date32, DateTime, DateTime64 | 2-8 bytes |
//! | **String** | String, FixedString, Json | variable / fixed |
//! | **Network** | Uuid, Ipv4, Ipv6 | 16, 4, 16 bytes |
//! | **Enum** | Enum8, Enum16 | 1, 2 bytes |
//! | **Geo** | Point, Ring, Polygon, MultiPolygon | 16 / variable |
//! | **Composite** | Array, Map, Tuple, Nested | variable |
//! | **Aggregate** | SimpleAggregateFunction, AggregateFunction | delegated |

/// Closed set of supported column kinds.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Nothing = 0,

    Bool = 1,
    Int8 = 2,
    Int16 = 3,
    Int32 = 4,
    Int64 = 5,
    Int128 = 6,
    Int256 = 7,
    UInt8 = 8,
    UInt16 = 9,
    UInt32 = 10,
    UInt64 = 11,
    UInt128 = 12,
    UInt256 = 13,
    Float32 = 14,
    Float64 = 15,

    Decimal = 20,

    Date = 30,
    Date32 = 31,
    DateTime = 32,
    DateTime64 = 33,

    String = 40,
    FixedString = 41,
    Json = 42,

    Uuid = 50,
    Ipv4 = 51,
    Ipv6 = 52,

    Enum8 = 60,
    Enum16 = 61,

    Point = 70,
    Ring = 71,
    Polygon = 72,
    MultiPolygon = 73,

    Array = 80,
    Map = 81,
    Tuple = 82,
    Nested = 83,

    SimpleAggregateFunction = 90,
    AggregateFunction = 91,
}

impl ColumnKind {
    /// Fixed wire width in bytes, or `None` for variable-length and
    /// precision-dependent kinds.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            ColumnKind::Nothing => Some(0),
            ColumnKind::Bool | ColumnKind::Int8 | ColumnKind::UInt8 | ColumnKind::Enum8 => Some(1),
            ColumnKind::Int16 | ColumnKind::UInt16 | ColumnKind::Enum16 | ColumnKind::Date => {
                Some(2)
            }
            ColumnKind::Int32
            | ColumnKind::UInt32
            | ColumnKind::Float32
            | ColumnKind::Date32
            | ColumnKind::DateTime
            | ColumnKind::Ipv4 => Some(4),
            ColumnKind::Int64
            | ColumnKind::UInt64
            | ColumnKind::Float64
            | ColumnKind::DateTime64 => Some(8),
            ColumnKind::Int128 | ColumnKind::UInt128 | ColumnKind::Uuid | ColumnKind::Ipv6 => {
                Some(16)
            }
            ColumnKind::Int256 | ColumnKind::UInt256 => Some(32),
            ColumnKind::Point => Some(16),
            _ => None,
        }
    }

    /// True for kinds built from child columns.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            ColumnKind::Array
                | ColumnKind::Map
                | ColumnKind::Tuple
                | ColumnKind::Nested
                | ColumnKind::SimpleAggregateFunction
                | ColumnKind::AggregateFunction
        )
    }

    /// True for the unsigned integer kinds.
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            ColumnKind::UInt8
                | ColumnKind::UInt16
                | ColumnKind::UInt32
                | ColumnKind::UInt64
                | ColumnKind::UInt128
                | ColumnKind::UInt256
        )
    }

    /// True for kinds eligible for the bulk array block codec: depth-1
    /// fixed-width numerics with a byte-reinterpretable wire image.
    pub fn is_bulk_array_element(&self) -> bool {
        matches!(
            self,
            ColumnKind::Int8
                | ColumnKind::Int16
                | ColumnKind::Int32
                | ColumnKind::Int64
                | ColumnKind::UInt8
                | ColumnKind::UInt16
                | ColumnKind::UInt32
                | ColumnKind::UInt64
                | ColumnKind::Float32
                | ColumnKind::Float64
        )
    }

    /// Canonical type name used when rendering a descriptor back to a
    /// header type string.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Nothing => "Nothing",
            ColumnKind::Bool => "Bool",
            ColumnKind::Int8 => "Int8",
            ColumnKind::Int16 => "Int16",
            ColumnKind::Int32 => "Int32",
            ColumnKind::Int64 => "Int64",
            ColumnKind::Int128 => "Int128",
            ColumnKind::Int256 => "Int256",
            ColumnKind::UInt8 => "UInt8",
            ColumnKind::UInt16 => "UInt16",
            ColumnKind::UInt32 => "UInt32",
            ColumnKind::UInt64 => "UInt64",
            ColumnKind::UInt128 => "UInt128",
            ColumnKind::UInt256 => "UInt256",
            ColumnKind::Float32 => "Float32",
            ColumnKind::Float64 => "Float64",
            ColumnKind::Decimal => "Decimal",
            ColumnKind::Date => "Date",
            ColumnKind::Date32 => "Date32",
            ColumnKind::DateTime => "DateTime",
            ColumnKind::DateTime64 => "DateTime64",
            ColumnKind::String => "String",
            ColumnKind::FixedString => "FixedString",
            ColumnKind::Json => "JSON",
            ColumnKind::Uuid => "UUID",
            ColumnKind::Ipv4 => "IPv4",
            ColumnKind::Ipv6 => "IPv6",
            ColumnKind::Enum8 => "Enum8",
            ColumnKind::Enum16 => "Enum16",
            ColumnKind::Point => "Point",
            ColumnKind::Ring => "Ring",
            ColumnKind::Polygon => "Polygon",
            ColumnKind::MultiPolygon => "MultiPolygon",
            ColumnKind::Array => "Array",
            ColumnKind::Map => "Map",
            ColumnKind::Tuple => "Tuple",
            ColumnKind::Nested => "Nested",
            ColumnKind::SimpleAggregateFunction => "SimpleAggregateFunction",
            ColumnKind::AggregateFunction => "AggregateFunction",
        }
    }

    /// Looks up a parameterless kind by its canonical name.
    pub fn from_name(name: &str) -> Option<ColumnKind> {
        let kind = match name {
            "Nothing" => ColumnKind::Nothing,
            "Bool" | "Boolean" => ColumnKind::Bool,
            "Int8" => ColumnKind::Int8,
            "Int16" => ColumnKind::Int16,
            "Int32" => ColumnKind::Int32,
            "Int64" => ColumnKind::Int64,
            "Int128" => ColumnKind::Int128,
            "Int256" => ColumnKind::Int256,
            "UInt8" => ColumnKind::UInt8,
            "UInt16" => ColumnKind::UInt16,
            "UInt32" => ColumnKind::UInt32,
            "UInt64" => ColumnKind::UInt64,
            "UInt128" => ColumnKind::UInt128,
            "UInt256" => ColumnKind::UInt256,
            "Float32" => ColumnKind::Float32,
            "Float64" => ColumnKind::Float64,
            "Date" => ColumnKind::Date,
            "Date32" => ColumnKind::Date32,
            "DateTime" | "DateTime32" => ColumnKind::DateTime,
            "String" => ColumnKind::String,
            "JSON" => ColumnKind::Json,
            "UUID" => ColumnKind::Uuid,
            "IPv4" => ColumnKind::Ipv4,
            "IPv6" => ColumnKind::Ipv6,
            "Point" => ColumnKind::Point,
            "Ring" => ColumnKind::Ring,
            "Polygon" => ColumnKind::Polygon,
            "MultiPolygon" => ColumnKind::MultiPolygon,
            _ => return None,
        };
        Some(kind)
    }
}
