//! # Buffered Byte Input Channel
//!
//! `ByteInput` is the pull side of the byte channel: fixed-width
//! little-endian reads, varint reads, length-prefixed strings and bulk
//! reads over one of three byte sources:
//!
//! - a blocking [`Read`] source (`from_reader`) — shortfalls block until the
//!   source delivers or reaches EOF;
//! - a fixed in-memory buffer (`from_bytes`);
//! - an externally fed chunk buffer (`open` + `feed` + `finish`) used to
//!   drive resumable decoding from a non-blocking transport.
//!
//! ## Shortfall semantics
//!
//! | Situation | Result |
//! |-----------|--------|
//! | enough bytes buffered or readable | `Ok` |
//! | fed source, not finished, too few bytes | `NotEnoughData` (retry after `feed`) |
//! | source at EOF, too few bytes | `IncompleteRead` |
//! | `exhausted()` with empty window at EOF | clean end of stream |
//!
//! ## Resume protocol
//!
//! A caller decoding resumable units calls [`ByteInput::checkpoint`] at each
//! unit boundary and [`ByteInput::rollback`] when a read inside the unit hit
//! `NotEnoughData`; the unit then re-decodes from its first byte once more
//! data arrives. Checkpointing also reclaims consumed buffer space.

use std::io::Read;

use eyre::{bail, Context, Result};

use crate::error::WireError;

const FILL_CHUNK_SIZE: usize = 8 * 1024;

/// Buffered pull channel over a byte source.
pub struct ByteInput {
    source: Option<Box<dyn Read + Send>>,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl ByteInput {
    /// Channel over a blocking source; reads block until satisfied or EOF.
    pub fn from_reader(source: impl Read + Send + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
            buf: Vec::new(),
            pos: 0,
            eof: false,
        }
    }

    /// Channel over a fixed buffer; the end of the buffer is EOF.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source: None,
            buf: bytes.into(),
            pos: 0,
            eof: true,
        }
    }

    /// Externally fed channel for chunked, non-blocking decoding.
    pub fn open() -> Self {
        Self {
            source: None,
            buf: Vec::new(),
            pos: 0,
            eof: false,
        }
    }

    /// Appends bytes to a fed channel.
    pub fn feed(&mut self, bytes: &[u8]) {
        debug_assert!(self.source.is_none(), "feed on a sourced channel");
        self.buf.extend_from_slice(bytes);
    }

    /// Marks a fed channel as complete; the remaining window is the tail of
    /// the stream.
    pub fn finish(&mut self) {
        self.eof = true;
    }

    /// Closes the channel: drops the source and discards buffered bytes.
    pub fn close(&mut self) {
        self.source = None;
        self.buf.clear();
        self.pos = 0;
        self.eof = true;
    }

    /// Bytes currently buffered and unread.
    pub fn available(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Commits everything read so far and reclaims the consumed prefix.
    /// After a checkpoint, [`ByteInput::rollback`] returns here.
    pub fn checkpoint(&mut self) {
        self.buf.drain(..self.pos);
        self.pos = 0;
    }

    /// Rewinds to the last checkpoint (or the start of the window).
    pub fn rollback(&mut self) {
        self.pos = 0;
    }

    /// True when the stream is cleanly exhausted: EOF with an empty window.
    /// On a fed channel that is not finished, an empty window is
    /// `NotEnoughData` — it cannot be distinguished from a slow producer.
    pub fn exhausted(&mut self) -> Result<bool> {
        loop {
            if self.available() > 0 {
                return Ok(false);
            }
            if self.eof {
                return Ok(true);
            }
            if self.source.is_some() {
                self.fill_from_source()?;
            } else {
                bail!(WireError::NotEnoughData);
            }
        }
    }

    fn fill_from_source(&mut self) -> Result<()> {
        let Some(source) = self.source.as_mut() else {
            return Ok(());
        };
        let mut chunk = [0u8; FILL_CHUNK_SIZE];
        let n = source.read(&mut chunk).context("failed to read from byte source")?;
        if n == 0 {
            self.eof = true;
            self.source = None;
        } else {
            self.buf.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }

    /// Ensures `n` unread bytes are buffered, blocking on the source when
    /// present.
    fn ensure(&mut self, n: usize) -> Result<()> {
        while self.available() < n {
            if self.eof {
                bail!(WireError::IncompleteRead {
                    expected: n,
                    got: self.available(),
                });
            }
            if self.source.is_some() {
                self.fill_from_source()?;
            } else {
                bail!(WireError::NotEnoughData);
            }
        }
        Ok(())
    }

    /// Reads exactly `n` bytes, borrowing them from the window.
    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.ensure(n)?;
        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..self.pos])
    }

    /// Reads exactly `out.len()` bytes into `out`.
    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<()> {
        let bytes = self.read_bytes(out.len())?;
        out.copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Decodes a varint incrementally; a shortfall mid-varint is resumable
    /// on a fed channel.
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..crate::config::constants::MAX_VARINT_SIZE {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        bail!(WireError::InvalidData("varint exceeds maximum length".into()))
    }

    /// Varint length prefix followed by that many raw bytes.
    pub fn read_len_prefixed(&mut self) -> Result<Vec<u8>> {
        let len = self.read_varint()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Length-prefixed UTF-8 string.
    pub fn read_utf8(&mut self) -> Result<String> {
        let bytes = self.read_len_prefixed()?;
        String::from_utf8(bytes)
            .map_err(|_| WireError::InvalidData("string is not valid UTF-8".into()).into())
    }
}

macro_rules! impl_fixed_reads {
    ($($fn_name:ident -> $ty:ty),+ $(,)?) => {
        impl ByteInput {
            $(
                pub fn $fn_name(&mut self) -> Result<$ty> {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    self.read_exact(&mut raw)?;
                    Ok(<$ty>::from_le_bytes(raw))
                }
            )+
        }
    };
}

impl_fixed_reads! {
    read_u16_le -> u16,
    read_i16_le -> i16,
    read_u32_le -> u32,
    read_i32_le -> i32,
    read_u64_le -> u64,
    read_i64_le -> i64,
    read_u128_le -> u128,
    read_i128_le -> i128,
    read_f32_le -> f32,
    read_f64_le -> f64,
}
