//! # Bounded Byte Pipe
//!
//! Single-producer single-consumer byte pipe decoupling a serializer thread
//! from a transport thread. The producer buffers into a chunk of
//! `pipe_chunk_size` bytes and hands off whole chunks through a bounded
//! queue; at `pipe_max_chunks` queued chunks the producer blocks until the
//! consumer drains one. Chunk handoff moves ownership, so bytes are copied
//! once in and once out.
//!
//! ## Close semantics
//!
//! | Event | Producer side | Consumer side |
//! |-------|---------------|---------------|
//! | producer close | flushes the partial chunk, then marks the queue done | reads drain the queue, then return 0 |
//! | consumer close | writes fail with `ClosedPipe` (broken pipe) | — |
//! | either drop | best-effort close | close |
//!
//! Each end takes an optional close hook, run exactly once when that end
//! closes; transports use it to finalize a request or release a connection.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::config::CodecConfig;
use crate::error::WireError;

/// Hook run exactly once when a pipe end closes.
pub type CloseHook = Box<dyn FnOnce() + Send>;

struct PipeState {
    chunks: VecDeque<Vec<u8>>,
    writer_closed: bool,
    reader_closed: bool,
}

struct Shared {
    state: Mutex<PipeState>,
    /// Signaled when a chunk is queued or the writer closes.
    data: Condvar,
    /// Signaled when a chunk is drained or the reader closes.
    space: Condvar,
    max_chunks: usize,
}

/// Creates a connected pipe with the configured chunk size and queue bound.
pub fn pipe(config: &CodecConfig) -> (PipeWriter, PipeReader) {
    let shared = Arc::new(Shared {
        state: Mutex::new(PipeState {
            chunks: VecDeque::new(),
            writer_closed: false,
            reader_closed: false,
        }),
        data: Condvar::new(),
        space: Condvar::new(),
        max_chunks: config.pipe_max_chunks.max(1),
    });
    let writer = PipeWriter {
        shared: shared.clone(),
        chunk: Vec::with_capacity(config.pipe_chunk_size.max(1)),
        chunk_size: config.pipe_chunk_size.max(1),
        on_close: None,
    };
    let reader = PipeReader {
        shared,
        chunk: Vec::new(),
        pos: 0,
        on_close: None,
    };
    (writer, reader)
}

/// Producer end; buffers into a chunk and blocks on a full queue.
pub struct PipeWriter {
    shared: Arc<Shared>,
    chunk: Vec<u8>,
    chunk_size: usize,
    on_close: Option<CloseHook>,
}

impl PipeWriter {
    /// Installs a hook run once when this end closes.
    pub fn set_close_hook(&mut self, hook: CloseHook) {
        self.on_close = Some(hook);
    }

    /// Queues the current chunk, blocking while the queue is at its bound.
    fn push_chunk(&mut self) -> io::Result<()> {
        if self.chunk.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.chunk, Vec::with_capacity(self.chunk_size));
        let mut state = self.shared.state.lock();
        loop {
            if state.reader_closed {
                return Err(WireError::ClosedPipe.into_io());
            }
            if state.chunks.len() < self.shared.max_chunks {
                break;
            }
            self.shared.space.wait(&mut state);
        }
        state.chunks.push_back(chunk);
        self.shared.data.notify_one();
        Ok(())
    }

    /// Flushes the partial chunk and marks the stream complete. Idempotent;
    /// the close hook runs on the first call.
    pub fn close(&mut self) -> io::Result<()> {
        let already = self.shared.state.lock().writer_closed;
        let result = if already { Ok(()) } else { self.push_chunk() };
        {
            let mut state = self.shared.state.lock();
            state.writer_closed = true;
        }
        self.shared.data.notify_one();
        if let Some(hook) = self.on_close.take() {
            hook();
        }
        result
    }
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        {
            let state = self.shared.state.lock();
            if state.writer_closed || state.reader_closed {
                return Err(WireError::ClosedPipe.into_io());
            }
        }
        let mut rest = data;
        while !rest.is_empty() {
            let room = self.chunk_size - self.chunk.len();
            let take = room.min(rest.len());
            self.chunk.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.chunk.len() == self.chunk_size {
                self.push_chunk()?;
            }
        }
        Ok(data.len())
    }

    /// Hands the partial chunk to the consumer without closing.
    fn flush(&mut self) -> io::Result<()> {
        self.push_chunk()
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Consumer end; drains queued chunks and blocks while the queue is empty.
pub struct PipeReader {
    shared: Arc<Shared>,
    chunk: Vec<u8>,
    pos: usize,
    on_close: Option<CloseHook>,
}

impl PipeReader {
    /// Installs a hook run once when this end closes.
    pub fn set_close_hook(&mut self, hook: CloseHook) {
        self.on_close = Some(hook);
    }

    /// Marks the consumer gone; subsequent producer writes fail. Idempotent.
    pub fn close(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.reader_closed = true;
            state.chunks.clear();
        }
        self.shared.space.notify_one();
        if let Some(hook) = self.on_close.take() {
            hook();
        }
    }

    /// Blocks until a chunk is available or the writer closed with an empty
    /// queue. True when a chunk was taken.
    fn pull_chunk(&mut self) -> bool {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(chunk) = state.chunks.pop_front() {
                self.chunk = chunk;
                self.pos = 0;
                self.shared.space.notify_one();
                return true;
            }
            if state.writer_closed || state.reader_closed {
                return false;
            }
            self.shared.data.wait(&mut state);
        }
    }
}

impl Read for PipeReader {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }
        if self.pos == self.chunk.len() && !self.pull_chunk() {
            return Ok(0);
        }
        let take = dst.len().min(self.chunk.len() - self.pos);
        dst[..take].copy_from_slice(&self.chunk[self.pos..self.pos + take]);
        self.pos += take;
        Ok(take)
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn tiny_config(chunk_size: usize, max_chunks: usize) -> CodecConfig {
        CodecConfig {
            pipe_chunk_size: chunk_size,
            pipe_max_chunks: max_chunks,
            ..CodecConfig::default()
        }
    }

    #[test]
    fn bytes_arrive_in_order_across_threads() {
        let (mut writer, mut reader) = pipe(&tiny_config(16, 4));
        let payload: Vec<u8> = (0..10_000u32).flat_map(|i| i.to_le_bytes()).collect();
        let expected = payload.clone();

        let producer = std::thread::spawn(move || {
            writer.write_all(&payload).unwrap();
            writer.close().unwrap();
        });

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        producer.join().unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn partial_chunk_is_delivered_on_close() {
        let (mut writer, mut reader) = pipe(&tiny_config(1024, 4));
        writer.write_all(b"abc").unwrap();
        writer.close().unwrap();

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn flush_hands_off_without_closing() {
        let (mut writer, mut reader) = pipe(&tiny_config(1024, 4));
        writer.write_all(b"ab").unwrap();
        writer.flush().unwrap();

        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ab");

        writer.write_all(b"cd").unwrap();
        writer.close().unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"cd");
    }

    #[test]
    fn write_after_reader_close_is_broken_pipe() {
        let (mut writer, mut reader) = pipe(&tiny_config(4, 4));
        reader.close();
        let err = writer.write_all(b"data").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        let inner = err.get_ref().and_then(|e| e.downcast_ref::<WireError>());
        assert_eq!(inner, Some(&WireError::ClosedPipe));
    }

    #[test]
    fn read_after_writer_close_drains_then_eof() {
        let (mut writer, mut reader) = pipe(&tiny_config(4, 4));
        writer.write_all(b"tail").unwrap();
        writer.close().unwrap();

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"tail");
        assert_eq!(reader.read(&mut [0u8; 1]).unwrap(), 0);
    }

    #[test]
    fn producer_blocks_on_full_queue_until_drained() {
        let (mut writer, mut reader) = pipe(&tiny_config(1, 2));
        let unblocked = Arc::new(AtomicBool::new(false));
        let flag = unblocked.clone();

        let producer = std::thread::spawn(move || {
            // 4 single-byte chunks against a bound of 2.
            writer.write_all(b"wxyz").unwrap();
            flag.store(true, Ordering::SeqCst);
            writer.close().unwrap();
        });

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!unblocked.load(Ordering::SeqCst));

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        producer.join().unwrap();
        assert!(unblocked.load(Ordering::SeqCst));
        assert_eq!(out, b"wxyz");
    }

    #[test]
    fn close_hooks_run_exactly_once() {
        let (mut writer, mut reader) = pipe(&tiny_config(4, 4));
        let writer_hook = Arc::new(AtomicBool::new(false));
        let reader_hook = Arc::new(AtomicBool::new(false));

        let w = writer_hook.clone();
        writer.set_close_hook(Box::new(move || {
            assert!(!w.swap(true, Ordering::SeqCst), "hook ran twice");
        }));
        let r = reader_hook.clone();
        reader.set_close_hook(Box::new(move || {
            assert!(!r.swap(true, Ordering::SeqCst), "hook ran twice");
        }));

        writer.close().unwrap();
        writer.close().unwrap();
        drop(writer);
        assert!(writer_hook.load(Ordering::SeqCst));

        reader.close();
        drop(reader);
        assert!(reader_hook.load(Ordering::SeqCst));
    }

    #[test]
    fn dropping_the_writer_closes_the_stream() {
        let (mut writer, mut reader) = pipe(&tiny_config(4, 4));
        writer.write_all(b"end").unwrap();
        drop(writer);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"end");
    }
}
