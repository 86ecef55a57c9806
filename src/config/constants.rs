//! # Wire Layer Constants
//!
//! This module centralizes the constants of the wire layer. Values that depend
//! on each other are co-located and their relationships documented, with
//! compile-time checks where a mismatch would corrupt the stream.
//!
//! ## Dependency Graph
//!
//! ```text
//! FRAME_HEADER_SIZE (25 bytes)
//!       │
//!       ├─> FRAME_CHECKSUM_SIZE (16 bytes, two u64 halves)
//!       │
//!       └─> FRAME_SUBHEADER_SIZE (9 bytes: magic + two u32 sizes)
//!             The checksum is computed over subheader + compressed payload,
//!             so FRAME_HEADER_SIZE must equal CHECKSUM + SUBHEADER exactly.
//!
//! DEFAULT_MAX_COMPRESS_BLOCK_SIZE (1 MiB)
//!       │
//!       └─> every flush of the compressing writer emits one frame whose
//!           uncompressed_size field is at most this value
//!
//! DEFAULT_PIPE_CHUNK_SIZE (8 KiB) × DEFAULT_PIPE_MAX_CHUNKS (512)
//!       └─> upper bound (~4 MiB) on bytes buffered in an SPSC pipe before
//!           the producer blocks on backpressure
//! ```

/// Total fixed frame header length: checksum halves, magic byte, two sizes.
pub const FRAME_HEADER_SIZE: usize = 25;

/// Leading 128-bit checksum, stored as two little-endian u64 halves.
pub const FRAME_CHECKSUM_SIZE: usize = 16;

/// Magic byte plus `compressed_size_with_subheader` and `uncompressed_size`.
/// These 9 bytes are included in both the checksum input and the stored
/// compressed size.
pub const FRAME_SUBHEADER_SIZE: usize = 9;

/// Format tag identifying an LZ4-compressed frame.
pub const LZ4_MAGIC: u8 = 0x82;

/// Default upper bound on the uncompressed payload of a single frame.
pub const DEFAULT_MAX_COMPRESS_BLOCK_SIZE: usize = 1024 * 1024;

/// Default size of one pipe chunk; the producer hands off ownership of a
/// chunk of this size per queue slot.
pub const DEFAULT_PIPE_CHUNK_SIZE: usize = 8 * 1024;

/// Default bound on queued pipe chunks before `write` blocks.
pub const DEFAULT_PIPE_MAX_CHUNKS: usize = 512;

/// Maximum encoded length of a varint (LEB128 over u64).
pub const MAX_VARINT_SIZE: usize = 10;

const _: () = assert!(FRAME_HEADER_SIZE == FRAME_CHECKSUM_SIZE + FRAME_SUBHEADER_SIZE);
const _: () = assert!(DEFAULT_MAX_COMPRESS_BLOCK_SIZE <= u32::MAX as usize);
