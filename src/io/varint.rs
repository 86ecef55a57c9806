//! # Variable-Length Integer Encoding
//!
//! LEB128 encoding for the counts and lengths of the row wire format: seven
//! value bits per byte, least-significant group first, high bit set on every
//! byte except the last.
//!
//! ## Encoding Format
//!
//! | Value Range            | Bytes |
//! |------------------------|-------|
//! | 0 - 127                | 1     |
//! | 128 - 16383            | 2     |
//! | 16384 - 2097151        | 3     |
//! | ...                    | ...   |
//! | 2^56 - 2^63-1          | 9     |
//! | up to u64::MAX         | 10    |
//!
//! ## Boundary Values
//!
//! Key boundary values for testing: 0, 127, 128, 16383, 16384, u64::MAX.
//!
//! All functions operate on byte slices and perform no allocation. The byte
//! channels in this module's parent stream the same format incrementally so a
//! partially-fed varint can be resumed.

use eyre::{bail, ensure, Result};

use crate::config::constants::MAX_VARINT_SIZE;

/// Number of bytes `encode_varint` writes for `value`.
pub fn varint_len(value: u64) -> usize {
    match value {
        0 => 1,
        v => (64 - v.leading_zeros() as usize).div_ceil(7),
    }
}

/// Encodes `value` into `buf`, returning the number of bytes written.
/// `buf` must hold at least [`varint_len`] bytes.
pub fn encode_varint(value: u64, buf: &mut [u8]) -> usize {
    let mut v = value;
    let mut i = 0;
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            buf[i] = byte;
            return i + 1;
        }
        buf[i] = byte | 0x80;
        i += 1;
    }
}

/// Decodes a varint from the front of `buf`, returning the value and the
/// number of bytes consumed.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    ensure!(!buf.is_empty(), "empty buffer for varint decode");

    let mut value = 0u64;
    for (i, &byte) in buf.iter().enumerate().take(MAX_VARINT_SIZE) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if buf.len() < MAX_VARINT_SIZE {
        bail!("truncated varint: {} bytes without a terminator", buf.len());
    }
    bail!("varint exceeds {} bytes", MAX_VARINT_SIZE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_boundaries() {
        assert_eq!(varint_len(0), 1);
        assert_eq!(varint_len(127), 1);
        assert_eq!(varint_len(128), 2);
        assert_eq!(varint_len(16383), 2);
        assert_eq!(varint_len(16384), 3);
        assert_eq!(varint_len(u64::MAX), 10);
    }

    #[test]
    fn round_trips_boundary_values() {
        let mut buf = [0u8; MAX_VARINT_SIZE];
        for value in [0u64, 1, 127, 128, 300, 16383, 16384, u32::MAX as u64, u64::MAX] {
            let written = encode_varint(value, &mut buf);
            assert_eq!(written, varint_len(value));
            let (decoded, read) = decode_varint(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(read, written);
        }
    }

    #[test]
    fn known_two_byte_encoding() {
        let mut buf = [0u8; MAX_VARINT_SIZE];
        let written = encode_varint(300, &mut buf);
        assert_eq!(&buf[..written], &[0xac, 0x02]);
    }

    #[test]
    fn truncated_input_is_an_error() {
        assert!(decode_varint(&[]).is_err());
        assert!(decode_varint(&[0x80]).is_err());
        assert!(decode_varint(&[0x80; MAX_VARINT_SIZE]).is_err());
    }
}
