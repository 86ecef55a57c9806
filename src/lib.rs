//! # rowbin
//!
//! Binary row-stream wire layer for a columnar database client: codecs for
//! the row-binary formats, an LZ4 frame codec with CityHash integrity
//! checking, and a bounded byte pipe for decoupling serialization from
//! transport.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │ rows: RowStreamReader / RowStreamWriter                │
//! │   resumable cursor, optional names-and-types header    │
//! ├────────────────────────────────────────────────────────┤
//! │ codec: Decoder / Encoder built per Column              │
//! │   closed kind set, recursive composites, bulk arrays   │
//! ├───────────────────────┬────────────────────────────────┤
//! │ io: ByteInput /       │ value: Value slots, Bitmap     │
//! │ ByteOutput, varints   │ types: Column, ColumnKind      │
//! ├───────────────────────┴────────────────────────────────┤
//! │ compress: Lz4Reader / Lz4Writer (framed, checksummed)  │
//! │ pipe: bounded SPSC byte pipe                           │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! The layers compose through the standard `Read`/`Write` traits: a
//! `RowStreamReader` can pull from an `Lz4Reader` over a `PipeReader` the
//! same way it pulls from a plain buffer. Failure conditions the caller must
//! branch on travel as [`WireError`] inside `eyre::Report` (or `io::Error`
//! across the trait boundary).
//!
//! ## Example
//!
//! ```ignore
//! use rowbin::{CodecConfig, Column, ColumnKind, Fetch, RowStreamReader};
//! use rowbin::io::ByteInput;
//!
//! let config = CodecConfig::default();
//! let mut reader = RowStreamReader::new(config, None, ByteInput::from_bytes(bytes))?;
//! while reader.next_row()? == Fetch::Ready {
//!     println!("{:?}", reader.row());
//! }
//! ```

pub mod codec;
pub mod compress;
pub mod config;
pub mod error;
pub mod io;
pub mod pipe;
pub mod rows;
pub mod types;
pub mod value;

pub use codec::{build_decoder, build_encoder, Decoder, Encoder};
pub use compress::{Compression, Lz4Reader, Lz4Writer};
pub use config::{CodecConfig, RenameMethod, RowFormat};
pub use error::WireError;
pub use pipe::{pipe, PipeReader, PipeWriter};
pub use rows::{Fetch, RowStreamReader, RowStreamWriter};
pub use types::{Column, ColumnKind};
pub use value::{Bitmap, Value};
