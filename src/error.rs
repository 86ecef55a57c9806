//! # Wire Error Taxonomy
//!
//! Most of this crate reports failures through `eyre::Result` like every other
//! module. The protocol layers, however, need to *branch* on a small closed
//! set of conditions: a resumable reader must tell "not enough bytes fed yet"
//! apart from "stream truncated", and a frame decoder must distinguish a bad
//! magic byte from a checksum mismatch.
//!
//! `WireError` is that closed set. It is always attached to the `eyre::Report`
//! (or to an `io::Error` when a type implements `std::io::Read`/`Write`) and
//! recovered by downcast via [`WireError::of`].
//!
//! ## Classification
//!
//! | Variant | Raised | Fatal to |
//! |---------|--------|----------|
//! | `UnsupportedType` | codec build time, never mid-stream | that build call |
//! | `IncompleteRead` | mid-structure shortfall at EOF | the stream |
//! | `NotEnoughData` | shortfall on an unfinished chunk feed | nothing (retry after feeding) |
//! | `BadMagic` | frame header validation | the stream |
//! | `ChecksumMismatch` | frame payload validation | the stream |
//! | `ClosedPipe` | pipe operation after peer close | that operation |
//! | `InvalidData` | malformed varint/UTF-8/type string | the stream |
//!
//! A clean end-of-stream (zero bytes available at a natural boundary) is not
//! an error and never surfaces through this enum.

use std::fmt;
use std::io;

/// Closed set of wire-level failure conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Column descriptor names a kind or combination outside the support set.
    UnsupportedType(String),
    /// Fewer bytes than a codec or frame header requires, with the structure
    /// already partially consumed.
    IncompleteRead { expected: usize, got: usize },
    /// The chunk feed cannot satisfy the read yet; decode may resume after
    /// more bytes are fed.
    NotEnoughData,
    /// Frame format tag does not match the expected constant.
    BadMagic { expected: u8, got: u8 },
    /// Frame checksum does not match the stored digest.
    ChecksumMismatch,
    /// Pipe operation attempted after the peer end closed.
    ClosedPipe,
    /// Bytes were available but malformed.
    InvalidData(String),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::UnsupportedType(what) => write!(f, "unsupported type: {}", what),
            WireError::IncompleteRead { expected, got } => {
                write!(f, "incomplete read: expected {} bytes but got {}", expected, got)
            }
            WireError::NotEnoughData => write!(f, "not enough data buffered to complete the read"),
            WireError::BadMagic { expected, got } => {
                write!(f, "bad magic: expected 0x{:02x} but got 0x{:02x}", expected, got)
            }
            WireError::ChecksumMismatch => write!(f, "checksum mismatch: corrupted frame"),
            WireError::ClosedPipe => write!(f, "pipe closed by peer"),
            WireError::InvalidData(what) => write!(f, "invalid data: {}", what),
        }
    }
}

impl std::error::Error for WireError {}

impl WireError {
    /// Recovers the `WireError` carried by a report, looking through an
    /// `io::Error` wrapper when the report crossed a `Read`/`Write` boundary.
    pub fn of(report: &eyre::Report) -> Option<&WireError> {
        if let Some(e) = report.downcast_ref::<WireError>() {
            return Some(e);
        }
        if let Some(ioe) = report.downcast_ref::<io::Error>() {
            if let Some(inner) = ioe.get_ref() {
                return inner.downcast_ref::<WireError>();
            }
        }
        None
    }

    /// True when the report is the retryable would-block signal.
    pub fn is_not_enough(report: &eyre::Report) -> bool {
        matches!(WireError::of(report), Some(WireError::NotEnoughData))
    }

    /// Wraps this error into an `io::Error` for `Read`/`Write` impls, keeping
    /// it recoverable through `io::Error::get_ref`.
    pub fn into_io(self) -> io::Error {
        let kind = match &self {
            WireError::IncompleteRead { .. } => io::ErrorKind::UnexpectedEof,
            WireError::NotEnoughData => io::ErrorKind::WouldBlock,
            WireError::ClosedPipe => io::ErrorKind::BrokenPipe,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_error_survives_report_downcast() {
        let report = eyre::Report::new(WireError::ChecksumMismatch);
        assert_eq!(WireError::of(&report), Some(&WireError::ChecksumMismatch));
    }

    #[test]
    fn wire_error_survives_io_wrapping() {
        let ioe = WireError::BadMagic { expected: 0x82, got: 0x00 }.into_io();
        let report = eyre::Report::new(ioe);
        assert_eq!(
            WireError::of(&report),
            Some(&WireError::BadMagic { expected: 0x82, got: 0x00 })
        );
    }

    #[test]
    fn not_enough_data_maps_to_would_block() {
        let ioe = WireError::NotEnoughData.into_io();
        assert_eq!(ioe.kind(), io::ErrorKind::WouldBlock);
        let report = eyre::Report::new(ioe);
        assert!(WireError::is_not_enough(&report));
    }
}
