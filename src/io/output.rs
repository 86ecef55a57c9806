//! # Buffered Byte Output Channel
//!
//! `ByteOutput` mirrors [`super::ByteInput`]: fixed-width little-endian
//! writes, varint writes and length-prefixed strings into an internal buffer,
//! flushed to an optional [`Write`] sink. Without a sink the channel is an
//! in-memory capture, drained with [`ByteOutput::into_bytes`].

use std::io::Write;

use eyre::{Context, Result};

use super::varint::encode_varint;
use crate::config::constants::MAX_VARINT_SIZE;

/// Buffered push channel over an optional byte sink.
pub struct ByteOutput {
    sink: Option<Box<dyn Write + Send>>,
    buf: Vec<u8>,
}

impl ByteOutput {
    /// Channel flushing into a sink.
    pub fn to_writer(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            buf: Vec::new(),
        }
    }

    /// In-memory capture channel.
    pub fn in_memory() -> Self {
        Self {
            sink: None,
            buf: Vec::new(),
        }
    }

    /// Bytes buffered and not yet flushed.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the channel, returning the unflushed buffer. Intended for
    /// in-memory channels; a sink, if any, is dropped unflushed.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Flushes the buffer into the sink and flushes the sink itself.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(sink) = self.sink.as_mut() {
            sink.write_all(&self.buf).context("failed to write to byte sink")?;
            self.buf.clear();
            sink.flush().context("failed to flush byte sink")?;
        }
        Ok(())
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    pub fn write_varint(&mut self, value: u64) {
        let mut scratch = [0u8; MAX_VARINT_SIZE];
        let len = encode_varint(value, &mut scratch);
        self.buf.extend_from_slice(&scratch[..len]);
    }

    /// Varint length prefix followed by the raw bytes.
    pub fn write_len_prefixed(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Length-prefixed UTF-8 string.
    pub fn write_utf8(&mut self, s: &str) {
        self.write_len_prefixed(s.as_bytes());
    }
}

macro_rules! impl_fixed_writes {
    ($($fn_name:ident($ty:ty)),+ $(,)?) => {
        impl ByteOutput {
            $(
                pub fn $fn_name(&mut self, value: $ty) {
                    self.buf.extend_from_slice(&value.to_le_bytes());
                }
            )+
        }
    };
}

impl_fixed_writes! {
    write_u16_le(u16),
    write_i16_le(i16),
    write_u32_le(u32),
    write_i32_le(i32),
    write_u64_le(u64),
    write_i64_le(i64),
    write_u128_le(u128),
    write_i128_le(i128),
    write_f32_le(f32),
    write_f64_le(f64),
}
