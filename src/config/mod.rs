//! # Codec Configuration
//!
//! Per-stream options consumed by the codec registry, the row stream
//! processors, the frame codec and the pipe. A `CodecConfig` is cheap to clone
//! and is captured by value at construction time; changing it afterwards never
//! affects an already-built codec.
//!
//! None of the options change the bytes on the wire. They select output shape
//! (`widen_unsigned_types`, `use_binary_string`), an equivalent faster code
//! path (`use_bulk_arrays`), or buffer sizing.

pub mod constants;

pub use constants::*;

/// Row-oriented wire format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// Raw rows only; the column list must be supplied by the caller.
    RowBinary,
    /// A leading header carries the column count, names and type strings.
    RowBinaryWithNamesAndTypes,
}

impl RowFormat {
    /// True when the format carries a column header before the first row.
    pub fn has_header(&self) -> bool {
        matches!(self, RowFormat::RowBinaryWithNamesAndTypes)
    }
}

/// Transform applied exactly once to each column name read from a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenameMethod {
    #[default]
    None,
    /// `my_column_name` becomes `myColumnName`.
    ToCamelCase,
    /// `myColumnName` becomes `my_column_name`.
    ToUnderscore,
    /// Drops everything up to and including the last `.`, so a qualified
    /// `table.column` becomes `column`.
    RemovePrefix,
}

impl RenameMethod {
    pub fn rename(&self, name: &str) -> String {
        match self {
            RenameMethod::None => name.to_string(),
            RenameMethod::ToCamelCase => {
                let mut out = String::with_capacity(name.len());
                let mut upper_next = false;
                for ch in name.chars() {
                    if ch == '_' {
                        upper_next = true;
                    } else if upper_next {
                        out.extend(ch.to_uppercase());
                        upper_next = false;
                    } else {
                        out.push(ch);
                    }
                }
                out
            }
            RenameMethod::ToUnderscore => {
                let mut out = String::with_capacity(name.len() + 4);
                for ch in name.chars() {
                    if ch.is_uppercase() {
                        if !out.is_empty() {
                            out.push('_');
                        }
                        out.extend(ch.to_lowercase());
                    } else {
                        out.push(ch);
                    }
                }
                out
            }
            RenameMethod::RemovePrefix => match name.rfind('.') {
                Some(idx) => name[idx + 1..].to_string(),
                None => name.to_string(),
            },
        }
    }
}

/// Options consumed at codec build and stream construction time.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Active row format; decides whether streams carry a header.
    pub format: RowFormat,
    /// Decode UInt8/16/32 into the next wider signed container instead of
    /// reinterpreting the bits as the same-width signed value.
    pub widen_unsigned_types: bool,
    /// Decode string columns as raw bytes instead of UTF-8 text.
    pub use_binary_string: bool,
    /// Use the bulk block codec for depth-1 arrays of non-nullable
    /// fixed-width numeric elements.
    pub use_bulk_arrays: bool,
    /// Transform applied to column names read from a header.
    pub rename_method: RenameMethod,
    /// Upper bound on the uncompressed payload of one compressed frame.
    pub max_compress_block_size: usize,
    /// Size of one pipe chunk handed from producer to consumer.
    pub pipe_chunk_size: usize,
    /// Bound on queued pipe chunks before the producer blocks.
    pub pipe_max_chunks: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            format: RowFormat::RowBinaryWithNamesAndTypes,
            widen_unsigned_types: true,
            use_binary_string: false,
            use_bulk_arrays: true,
            rename_method: RenameMethod::None,
            max_compress_block_size: DEFAULT_MAX_COMPRESS_BLOCK_SIZE,
            pipe_chunk_size: DEFAULT_PIPE_CHUNK_SIZE,
            pipe_max_chunks: DEFAULT_PIPE_MAX_CHUNKS,
        }
    }
}
