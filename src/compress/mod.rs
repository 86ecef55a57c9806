//! # Compressed Frame Codec
//!
//! Self-delimiting LZ4 frames over any byte transport. Each frame is:
//!
//! ```text
//! offset  size  field
//! ──────  ────  ─────────────────────────────────────────────
//!      0     8  checksum low half   (u64 LE)
//!      8     8  checksum high half  (u64 LE)
//!     16     1  magic 0x82
//!     17     4  compressed size     (u32 LE, subheader + payload)
//!     21     4  uncompressed size   (u32 LE)
//!     25     …  LZ4 block payload
//! ```
//!
//! The 128-bit CityHash checksum covers the 9-byte subheader (magic and both
//! sizes) plus the payload, so header corruption and payload corruption are
//! both caught. The stored compressed size includes the subheader.
//!
//! [`Lz4Writer`] buffers plain bytes up to the configured block size and
//! emits one frame per full block and one per explicit flush; an empty
//! buffer flushes to nothing. [`Lz4Reader`] inflates frame by frame; a clean
//! EOF is only legal on a frame boundary. Both implement the standard
//! `Read`/`Write` traits, carrying [`WireError`] conditions through
//! `io::Error` so the row layer can branch on them.

use std::io::{self, Read, Write};

use zerocopy::byteorder::little_endian as le;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::constants::{
    DEFAULT_MAX_COMPRESS_BLOCK_SIZE, FRAME_CHECKSUM_SIZE, FRAME_HEADER_SIZE, FRAME_SUBHEADER_SIZE,
    LZ4_MAGIC,
};
use crate::error::WireError;

/// Transport codings of the wire layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Lz4,
}

impl Compression {
    /// Content-coding token used in transport negotiation.
    pub fn encoding(&self) -> &'static str {
        match self {
            Compression::None => "identity",
            Compression::Lz4 => "lz4",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Lz4 => "lz4",
        }
    }
}

/// Fixed frame header, in wire layout.
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct FrameHeader {
    checksum_lo: le::U64,
    checksum_hi: le::U64,
    magic: u8,
    /// Subheader plus payload, in bytes.
    compressed_size: le::U32,
    uncompressed_size: le::U32,
}

const _: () = assert!(std::mem::size_of::<FrameHeader>() == FRAME_HEADER_SIZE);

fn frame_checksum(subheader_and_payload: &[u8]) -> u128 {
    cityhash_rs::cityhash_102_128(subheader_and_payload)
}

/// Compressing writer: plain bytes in, LZ4 frames out.
pub struct Lz4Writer<W: Write> {
    sink: Option<W>,
    buf: Vec<u8>,
    max_block: usize,
}

impl<W: Write> Lz4Writer<W> {
    pub fn new(sink: W) -> Self {
        Self::with_block_size(sink, DEFAULT_MAX_COMPRESS_BLOCK_SIZE)
    }

    /// Writer emitting frames of at most `max_block` uncompressed bytes.
    pub fn with_block_size(sink: W, max_block: usize) -> Self {
        Self {
            sink: Some(sink),
            buf: Vec::with_capacity(max_block.min(DEFAULT_MAX_COMPRESS_BLOCK_SIZE)),
            max_block: max_block.max(1),
        }
    }

    fn sink(&mut self) -> io::Result<&mut W> {
        self.sink.as_mut().ok_or_else(|| WireError::ClosedPipe.into_io())
    }

    /// Flushes the remaining partial block and the sink. Further writes are
    /// rejected.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.sink.is_none() {
            return Ok(());
        }
        self.flush_block()?;
        self.sink()?.flush()?;
        self.sink = None;
        Ok(())
    }

    /// Consumes the writer, returning the sink after a final flush.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush_block()?;
        let mut sink = self.sink.take().ok_or_else(|| WireError::ClosedPipe.into_io())?;
        sink.flush()?;
        Ok(sink)
    }

    fn flush_block(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let bound = lz4::block::compress_bound(self.buf.len())?;
        let mut frame = vec![0u8; FRAME_HEADER_SIZE + bound];
        let compressed = lz4::block::compress_to_buffer(
            &self.buf,
            None,
            false,
            &mut frame[FRAME_HEADER_SIZE..],
        )?;
        frame.truncate(FRAME_HEADER_SIZE + compressed);

        let header = FrameHeader::mut_from_bytes(&mut frame[..FRAME_HEADER_SIZE])
            .map_err(|_| WireError::InvalidData("frame header layout mismatch".into()).into_io())?;
        header.magic = LZ4_MAGIC;
        header.compressed_size = le::U32::new((FRAME_SUBHEADER_SIZE + compressed) as u32);
        header.uncompressed_size = le::U32::new(self.buf.len() as u32);

        let checksum = frame_checksum(&frame[FRAME_CHECKSUM_SIZE..]);
        frame[..FRAME_CHECKSUM_SIZE].copy_from_slice(&checksum.to_le_bytes());

        self.sink()?.write_all(&frame)?;
        self.buf.clear();
        Ok(())
    }
}

impl<W: Write> Write for Lz4Writer<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.sink.is_none() {
            return Err(WireError::ClosedPipe.into_io());
        }
        let mut rest = data;
        while !rest.is_empty() {
            let room = self.max_block - self.buf.len();
            let take = room.min(rest.len());
            self.buf.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.buf.len() == self.max_block {
                self.flush_block()?;
            }
        }
        Ok(data.len())
    }

    /// Emits the buffered partial block as one frame; an empty buffer emits
    /// nothing.
    fn flush(&mut self) -> io::Result<()> {
        self.flush_block()?;
        self.sink()?.flush()
    }
}

impl<W: Write> Drop for Lz4Writer<W> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

/// Decompressing reader: LZ4 frames in, plain bytes out.
pub struct Lz4Reader<R: Read> {
    source: R,
    out: Vec<u8>,
    pos: usize,
    done: bool,
}

impl<R: Read> Lz4Reader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            out: Vec::new(),
            pos: 0,
            done: false,
        }
    }

    /// Reads the next frame header. `Ok(None)` is a clean EOF before the
    /// first header byte; a partial header is a truncated stream.
    fn read_header(&mut self) -> io::Result<Option<[u8; FRAME_HEADER_SIZE]>> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        let mut filled = 0;
        while filled < FRAME_HEADER_SIZE {
            let n = self.source.read(&mut header[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(WireError::IncompleteRead {
                    expected: FRAME_HEADER_SIZE,
                    got: filled,
                }
                .into_io());
            }
            filled += n;
        }
        Ok(Some(header))
    }

    fn read_payload(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut payload = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.source.read(&mut payload[filled..])?;
            if n == 0 {
                return Err(WireError::IncompleteRead {
                    expected: len,
                    got: filled,
                }
                .into_io());
            }
            filled += n;
        }
        Ok(payload)
    }

    /// Pulls and verifies one frame into the output buffer. False at a clean
    /// end of stream.
    fn next_frame(&mut self) -> io::Result<bool> {
        let raw = match self.read_header()? {
            Some(raw) => raw,
            None => {
                self.done = true;
                return Ok(false);
            }
        };
        let header = FrameHeader::ref_from_bytes(&raw)
            .map_err(|_| WireError::InvalidData("frame header layout mismatch".into()).into_io())?;
        if header.magic != LZ4_MAGIC {
            self.done = true;
            return Err(WireError::BadMagic {
                expected: LZ4_MAGIC,
                got: header.magic,
            }
            .into_io());
        }
        let compressed = header.compressed_size.get() as usize;
        if compressed < FRAME_SUBHEADER_SIZE {
            self.done = true;
            return Err(
                WireError::InvalidData(format!("compressed size {compressed} below subheader"))
                    .into_io(),
            );
        }
        let payload = self.read_payload(compressed - FRAME_SUBHEADER_SIZE)?;

        // Checksum input is the subheader immediately followed by the payload.
        let mut block =
            Vec::with_capacity(FRAME_SUBHEADER_SIZE + payload.len());
        block.extend_from_slice(&raw[FRAME_CHECKSUM_SIZE..]);
        block.extend_from_slice(&payload);
        let stored = u128::from_le_bytes(
            raw[..FRAME_CHECKSUM_SIZE]
                .try_into()
                .map_err(|_| WireError::ChecksumMismatch.into_io())?,
        );
        if frame_checksum(&block) != stored {
            self.done = true;
            return Err(WireError::ChecksumMismatch.into_io());
        }

        let uncompressed = header.uncompressed_size.get() as usize;
        self.out.resize(uncompressed, 0);
        self.pos = 0;
        if uncompressed > 0 {
            let n = lz4::block::decompress_to_buffer(
                &block[FRAME_SUBHEADER_SIZE..],
                Some(uncompressed as i32),
                &mut self.out,
            )?;
            if n != uncompressed {
                self.done = true;
                return Err(WireError::InvalidData(format!(
                    "frame inflated to {n} bytes, header said {uncompressed}"
                ))
                .into_io());
            }
        }
        Ok(true)
    }
}

impl<R: Read> Read for Lz4Reader<R> {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }
        while self.pos == self.out.len() {
            if self.done || !self.next_frame()? {
                return Ok(0);
            }
        }
        let take = dst.len().min(self.out.len() - self.pos);
        dst[..take].copy_from_slice(&self.out[self.pos..self.pos + take]);
        self.pos += take;
        Ok(take)
    }
}
