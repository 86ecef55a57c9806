//! # Column Type Descriptors
//!
//! Recursively-structured descriptions of the columns a stream carries:
//! a closed [`ColumnKind`] set, the [`Column`] descriptor tree, and the
//! header type-string parser/renderer.
//!
//! ## Module Structure
//!
//! - `kind`: the `ColumnKind` enum and its predicates
//! - `column`: the `Column` descriptor with metadata and children
//! - `parse`: `Column::parse` for header type strings

mod column;
mod kind;
mod parse;

pub use column::Column;
pub use kind::ColumnKind;
