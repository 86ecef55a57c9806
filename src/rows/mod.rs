//! # Row Stream Processors
//!
//! `RowStreamReader` and `RowStreamWriter` turn a byte channel into a stream
//! of rows and back. The format is row-major: an optional leading header
//! (varint column count, then one length-prefixed name and one
//! length-prefixed type string per column), followed by rows serialized
//! column by column with no delimiters. End of stream is implicit: a clean
//! EOF at a row boundary.
//!
//! ## Cursor and resumability
//!
//! The reader is a resumable cursor. [`RowStreamReader::next_row`] returns
//! [`Fetch::Ready`] when a whole row was materialized, [`Fetch::Done`] at a
//! clean end of stream, and [`Fetch::Pending`] when a fed channel ran out of
//! bytes mid-structure. On `Pending` the cursor keeps its position; feeding
//! more bytes through [`RowStreamReader::input_mut`] and calling `next_row`
//! again resumes at the interrupted column, never re-yielding completed
//! columns. An EOF that lands inside a row or inside the header is a hard
//! `IncompleteRead` error.
//!
//! Decoded values live in a reusable per-column slot arena, so steady-state
//! reading allocates only for variable-size payloads.

use eyre::{ensure, Result};

use crate::codec::{build_decoder, build_encoder, Decoder, Encoder};
use crate::config::CodecConfig;
use crate::error::WireError;
use crate::io::{ByteInput, ByteOutput};
use crate::types::Column;
use crate::value::Value;

/// Outcome of one cursor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// A complete row (or value) is materialized and readable.
    Ready,
    /// The channel ran out of bytes mid-structure; feed more and retry.
    Pending,
    /// Clean end of stream at a row boundary.
    Done,
}

enum Cursor {
    /// Header not yet read (header formats only).
    Header,
    /// At a row boundary; the next byte starts column 0 or is EOF.
    RowStart,
    /// Mid-row, about to decode this column index.
    Column(usize),
    Finished,
}

/// Streaming row reader over a byte channel.
pub struct RowStreamReader {
    config: CodecConfig,
    columns: Vec<Column>,
    decoders: Vec<Decoder>,
    row: Vec<Value>,
    input: ByteInput,
    cursor: Cursor,
}

impl RowStreamReader {
    /// Creates a reader. `columns` must be given for the raw row format and
    /// may be given for the header format to skip schema discovery; without
    /// it the header is read on the first cursor step.
    pub fn new(
        config: CodecConfig,
        columns: Option<Vec<Column>>,
        input: ByteInput,
    ) -> Result<Self> {
        let mut reader = Self {
            columns: Vec::new(),
            decoders: Vec::new(),
            row: Vec::new(),
            input,
            cursor: Cursor::RowStart,
            config,
        };
        match columns {
            Some(columns) => reader.install_columns(columns)?,
            None => {
                ensure!(
                    reader.config.format.has_header(),
                    "column list required for a format without a header"
                );
                reader.cursor = Cursor::Header;
            }
        }
        Ok(reader)
    }

    fn install_columns(&mut self, columns: Vec<Column>) -> Result<()> {
        self.decoders = columns
            .iter()
            .map(|column| build_decoder(&self.config, column))
            .collect::<Result<_>>()?;
        self.row = vec![Value::Null; columns.len()];
        self.columns = columns;
        self.cursor = Cursor::RowStart;
        Ok(())
    }

    /// Column descriptors; empty until the header has been read.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The current row's value slots, one per column. Valid after a `Ready`
    /// step; slots are overwritten by the next one.
    pub fn row(&self) -> &[Value] {
        &self.row
    }

    /// The underlying channel, for feeding a chunked source.
    pub fn input_mut(&mut self) -> &mut ByteInput {
        &mut self.input
    }

    /// Advances the cursor by one whole row.
    pub fn next_row(&mut self) -> Result<Fetch> {
        loop {
            match self.cursor {
                Cursor::Header => match self.step_header()? {
                    Fetch::Ready => {}
                    other => return Ok(other),
                },
                Cursor::RowStart => {
                    if self.columns.is_empty() {
                        self.finish();
                        return Ok(Fetch::Done);
                    }
                    match self.probe_row_boundary()? {
                        Some(outcome) => return Ok(outcome),
                        None => self.cursor = Cursor::Column(0),
                    }
                }
                Cursor::Column(index) => {
                    for i in index..self.decoders.len() {
                        match self.decode_column(i)? {
                            Fetch::Ready => {}
                            pending => return Ok(pending),
                        }
                    }
                    self.cursor = Cursor::RowStart;
                    return Ok(Fetch::Ready);
                }
                Cursor::Finished => return Ok(Fetch::Done),
            }
        }
    }

    /// Advances the cursor by one column value, wrapping to the next row
    /// after the last column. After `Ready` the value is in
    /// `row()[column_index]` for the column just decoded.
    pub fn next_value(&mut self) -> Result<Fetch> {
        loop {
            match self.cursor {
                Cursor::Header => match self.step_header()? {
                    Fetch::Ready => {}
                    other => return Ok(other),
                },
                Cursor::RowStart => {
                    if self.columns.is_empty() {
                        self.finish();
                        return Ok(Fetch::Done);
                    }
                    match self.probe_row_boundary()? {
                        Some(outcome) => return Ok(outcome),
                        None => self.cursor = Cursor::Column(0),
                    }
                }
                Cursor::Column(index) => {
                    let outcome = self.decode_column(index)?;
                    if outcome == Fetch::Ready {
                        self.cursor = if index + 1 == self.decoders.len() {
                            Cursor::RowStart
                        } else {
                            Cursor::Column(index + 1)
                        };
                    }
                    return Ok(outcome);
                }
                Cursor::Finished => return Ok(Fetch::Done),
            }
        }
    }

    /// Index of the column the cursor will decode next; `None` at a row
    /// boundary.
    pub fn current_column(&self) -> Option<usize> {
        match self.cursor {
            Cursor::Column(index) => Some(index),
            _ => None,
        }
    }

    fn finish(&mut self) {
        self.cursor = Cursor::Finished;
        self.input.close();
    }

    /// Clean-EOF probe at a row boundary. `Some(outcome)` ends the step.
    fn probe_row_boundary(&mut self) -> Result<Option<Fetch>> {
        match self.input.exhausted() {
            Ok(true) => {
                self.finish();
                Ok(Some(Fetch::Done))
            }
            Ok(false) => {
                self.input.checkpoint();
                Ok(None)
            }
            Err(err) if WireError::is_not_enough(&err) => Ok(Some(Fetch::Pending)),
            Err(err) => Err(err),
        }
    }

    fn step_header(&mut self) -> Result<Fetch> {
        match self.input.exhausted() {
            // An empty stream is a valid zero-column, zero-row stream.
            Ok(true) => {
                self.finish();
                return Ok(Fetch::Done);
            }
            Ok(false) => {}
            Err(err) if WireError::is_not_enough(&err) => return Ok(Fetch::Pending),
            Err(err) => return Err(err),
        }

        self.input.checkpoint();
        match self.read_header() {
            Ok(columns) => {
                self.install_columns(columns)?;
                Ok(Fetch::Ready)
            }
            Err(err) if WireError::is_not_enough(&err) => {
                self.input.rollback();
                Ok(Fetch::Pending)
            }
            Err(err) => Err(err),
        }
    }

    fn read_header(&mut self) -> Result<Vec<Column>> {
        let count = self.input.read_varint()? as usize;
        let mut columns = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let name = self.input.read_utf8()?;
            let type_name = self.input.read_utf8()?;
            let name = self.config.rename_method.rename(&name);
            columns.push(Column::parse(name, &type_name)?);
        }
        Ok(columns)
    }

    fn decode_column(&mut self, index: usize) -> Result<Fetch> {
        match self.decoders[index].decode(&mut self.row[index], &mut self.input) {
            Ok(()) => {
                self.input.checkpoint();
                self.cursor = Cursor::Column(index + 1);
                Ok(Fetch::Ready)
            }
            Err(err) if WireError::is_not_enough(&err) => {
                self.input.rollback();
                self.cursor = Cursor::Column(index);
                Ok(Fetch::Pending)
            }
            Err(err) => Err(err),
        }
    }
}

/// Streaming row writer over a byte channel. The header, when the format has
/// one, is written at construction time.
pub struct RowStreamWriter {
    columns: Vec<Column>,
    encoders: Vec<Encoder>,
    output: ByteOutput,
}

impl RowStreamWriter {
    pub fn new(config: CodecConfig, columns: Vec<Column>, mut output: ByteOutput) -> Result<Self> {
        let encoders = columns
            .iter()
            .map(|column| build_encoder(&config, column))
            .collect::<Result<_>>()?;
        if config.format.has_header() {
            output.write_varint(columns.len() as u64);
            for column in &columns {
                output.write_utf8(column.name());
                output.write_utf8(&column.type_name());
            }
        }
        Ok(Self {
            columns,
            encoders,
            output,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Serializes one row, column by column. `values` must match the column
    /// arity.
    pub fn write_row(&mut self, values: &[Value]) -> Result<()> {
        ensure!(
            values.len() == self.encoders.len(),
            "row arity mismatch: got {} values for {} columns",
            values.len(),
            self.encoders.len()
        );
        for (encoder, value) in self.encoders.iter().zip(values) {
            encoder.encode(value, &mut self.output)?;
        }
        Ok(())
    }

    /// Flushes buffered bytes into the sink, if any.
    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()
    }

    /// Consumes the writer, returning the in-memory buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.output.into_bytes()
    }
}
