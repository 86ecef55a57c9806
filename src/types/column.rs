//! # Column Descriptors
//!
//! A `Column` pairs a [`ColumnKind`] with the metadata the codec registry
//! needs: nullability, decimal precision/scale, `DateTime64` scale,
//! `FixedString` length, ordered child descriptors for composite kinds, and
//! the function name for aggregate wrappers.
//!
//! Descriptors are immutable once built. Children are owned by value, so a
//! descriptor tree is always fully resolved and acyclic by construction.
//!
//! ## Usage
//!
//! ```ignore
//! use rowbin::types::{Column, ColumnKind};
//!
//! // Simple column
//! let id = Column::new("id", ColumnKind::UInt64);
//!
//! // Nullable(String)
//! let note = Column::new("note", ColumnKind::String).nullable();
//!
//! // Map(String, Int32)
//! let attrs = Column::map(
//!     "attrs",
//!     Column::new("", ColumnKind::String),
//!     Column::new("", ColumnKind::Int32),
//! );
//!
//! // Parsed from a header type string
//! let tags = Column::parse("tags", "Array(Nullable(Int64))")?;
//! ```

use super::ColumnKind;

/// Immutable description of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    nullable: bool,
    precision: u8,
    scale: u8,
    fixed_len: usize,
    children: Vec<Column>,
    enum_values: Vec<(String, i16)>,
    aggregate_fn: Option<String>,
}

impl Column {
    /// Creates a descriptor for a parameterless kind.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            precision: 0,
            scale: 0,
            fixed_len: 0,
            children: Vec::new(),
            enum_values: Vec::new(),
            aggregate_fn: None,
        }
    }

    /// Creates a `FixedString(len)` column.
    pub fn fixed_string(name: impl Into<String>, len: usize) -> Self {
        let mut column = Column::new(name, ColumnKind::FixedString);
        column.fixed_len = len;
        column
    }

    /// Creates a `Decimal(precision, scale)` column.
    pub fn decimal(name: impl Into<String>, precision: u8, scale: u8) -> Self {
        let mut column = Column::new(name, ColumnKind::Decimal);
        column.precision = precision;
        column.scale = scale;
        column
    }

    /// Creates a `DateTime64(scale)` column.
    pub fn datetime64(name: impl Into<String>, scale: u8) -> Self {
        let mut column = Column::new(name, ColumnKind::DateTime64);
        column.scale = scale;
        column
    }

    /// Creates an `Enum8(...)` column from (name, value) pairs.
    pub fn enum8(name: impl Into<String>, values: Vec<(String, i16)>) -> Self {
        let mut column = Column::new(name, ColumnKind::Enum8);
        column.enum_values = values;
        column
    }

    /// Creates an `Enum16(...)` column from (name, value) pairs.
    pub fn enum16(name: impl Into<String>, values: Vec<(String, i16)>) -> Self {
        let mut column = Column::new(name, ColumnKind::Enum16);
        column.enum_values = values;
        column
    }

    /// Creates an `Array(element)` column.
    pub fn array(name: impl Into<String>, element: Column) -> Self {
        let mut column = Column::new(name, ColumnKind::Array);
        column.children = vec![element];
        column
    }

    /// Creates a `Map(key, value)` column.
    pub fn map(name: impl Into<String>, key: Column, value: Column) -> Self {
        let mut column = Column::new(name, ColumnKind::Map);
        column.children = vec![key, value];
        column
    }

    /// Creates a `Tuple(...)` column from its field descriptors.
    pub fn tuple(name: impl Into<String>, fields: Vec<Column>) -> Self {
        let mut column = Column::new(name, ColumnKind::Tuple);
        column.children = fields;
        column
    }

    /// Creates a `Nested(...)` column from its named field descriptors.
    pub fn nested(name: impl Into<String>, fields: Vec<Column>) -> Self {
        let mut column = Column::new(name, ColumnKind::Nested);
        column.children = fields;
        column
    }

    /// Creates a `SimpleAggregateFunction(func, inner)` column.
    pub fn simple_aggregate(name: impl Into<String>, func: impl Into<String>, inner: Column) -> Self {
        let mut column = Column::new(name, ColumnKind::SimpleAggregateFunction);
        column.aggregate_fn = Some(func.into());
        column.children = vec![inner];
        column
    }

    /// Creates an `AggregateFunction(func, inner)` column.
    pub fn aggregate(name: impl Into<String>, func: impl Into<String>, inner: Column) -> Self {
        let mut column = Column::new(name, ColumnKind::AggregateFunction);
        column.aggregate_fn = Some(func.into());
        column.children = vec![inner];
        column
    }

    /// Marks the column nullable, wrapping its codec with the flag-byte
    /// decorator at build time.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Returns a copy with a different name, keeping the type intact.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut column = self.clone();
        column.name = name.into();
        column
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn fixed_len(&self) -> usize {
        self.fixed_len
    }

    pub fn children(&self) -> &[Column] {
        &self.children
    }

    pub fn enum_values(&self) -> &[(String, i16)] {
        &self.enum_values
    }

    pub fn aggregate_fn(&self) -> Option<&str> {
        self.aggregate_fn.as_deref()
    }

    /// Wire width of the decimal representation for this column's precision:
    /// 4, 8, 16 or 32 bytes.
    pub fn decimal_byte_width(&self) -> usize {
        match self.precision {
            0..=9 => 4,
            10..=18 => 8,
            19..=38 => 16,
            _ => 32,
        }
    }

    /// Renders the canonical type string for this column, such that
    /// `Column::parse(name, &c.type_name())` reproduces the descriptor.
    pub fn type_name(&self) -> String {
        let mut out = String::new();
        self.write_type_name(&mut out);
        out
    }

    fn write_type_name(&self, out: &mut String) {
        if self.nullable {
            out.push_str("Nullable(");
        }
        match self.kind {
            ColumnKind::FixedString => {
                out.push_str(&format!("FixedString({})", self.fixed_len));
            }
            ColumnKind::Decimal => {
                out.push_str(&format!("Decimal({}, {})", self.precision, self.scale));
            }
            ColumnKind::DateTime64 => {
                out.push_str(&format!("DateTime64({})", self.scale));
            }
            ColumnKind::Enum8 | ColumnKind::Enum16 => {
                out.push_str(self.kind.name());
                out.push('(');
                for (i, (name, value)) in self.enum_values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    // The parser unescapes \', so rendering must re-escape
                    // for the string to re-parse.
                    out.push_str(&format!("'{}' = {}", name.replace('\'', "\\'"), value));
                }
                out.push(')');
            }
            ColumnKind::Array => {
                out.push_str("Array(");
                self.children[0].write_type_name(out);
                out.push(')');
            }
            ColumnKind::Map => {
                out.push_str("Map(");
                self.children[0].write_type_name(out);
                out.push_str(", ");
                self.children[1].write_type_name(out);
                out.push(')');
            }
            ColumnKind::Tuple | ColumnKind::Nested => {
                out.push_str(self.kind.name());
                out.push('(');
                for (i, child) in self.children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if !child.name.is_empty() {
                        out.push_str(&child.name);
                        out.push(' ');
                    }
                    child.write_type_name(out);
                }
                out.push(')');
            }
            ColumnKind::SimpleAggregateFunction | ColumnKind::AggregateFunction => {
                out.push_str(self.kind.name());
                out.push('(');
                out.push_str(self.aggregate_fn.as_deref().unwrap_or(""));
                out.push_str(", ");
                self.children[0].write_type_name(out);
                out.push(')');
            }
            _ => out.push_str(self.kind.name()),
        }
        if self.nullable {
            out.push(')');
        }
    }
}
