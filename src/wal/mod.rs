//! Segmented write-ahead log
//!
//! Durability layer for mutations: an append-only log split into
//! size-bounded segment files, with batched fsync and a random-access read
//! path that feeds replication.
//!
//! ## Responsibilities
//! - Buffer appended records and flush them in batches
//! - Roll the active segment when its byte bound is reached
//! - Replay every durable record on startup
//! - Serve records after a `(segment, line)` position to replicas
//!
//! ## Concurrency
//! One mutex guards the buffer and the active segment. The read side
//! ([`SegmentReader`]) opens its own descriptors and runs concurrently with
//! appends. A background thread flushes the buffer on a ticker so sparse
//! workloads still hit disk within one period.

mod reader;
mod segment;
mod writer;

pub use reader::SegmentReader;
pub use segment::{framed_len, Segment};
pub use writer::SegmentWriter;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, tick, Sender};
use crossbeam::select;
use parking_lot::Mutex;

use crate::config::WalConfig;
use crate::error::{OrionError, Result};

/// A `(segment_index, line_number)` pair identifying the next record a
/// consumer will read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogPosition {
    pub segment_index: u64,
    pub line_number: u64,
}

/// The write-ahead log front-end
pub struct Wal {
    shared: Arc<WalShared>,
    reader: SegmentReader,
    flusher: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: Sender<()>,
}

struct WalShared {
    max_segment_size: u64,
    flushing_batch_size: usize,
    state: Mutex<WalState>,
}

struct WalState {
    buffer: Vec<String>,
    writer: SegmentWriter,
    /// Set by threshold flushes so the ticker skips one period
    flushed_since_tick: bool,
    closed: bool,
}

impl Wal {
    /// Open the log: ensure the data directory, attach to the
    /// highest-indexed segment, and start the flush ticker.
    pub fn open(conf: &WalConfig) -> Result<Self> {
        let max_segment_size = conf.max_segment_size_bytes()?;
        let flush_period = conf.flushing_batch_timeout()?;
        let dir = PathBuf::from(&conf.data_directory);

        let active = segment::open_active(&dir)?;
        tracing::info!(
            segment = active.index,
            size = active.size,
            lines = active.lines,
            "opened wal"
        );

        let writer = SegmentWriter::new(dir.clone(), max_segment_size, active);
        let buffer_capacity = conf.flushing_batch_size + conf.flushing_batch_size / 10;

        let shared = Arc::new(WalShared {
            max_segment_size,
            flushing_batch_size: conf.flushing_batch_size.max(1),
            state: Mutex::new(WalState {
                buffer: Vec::with_capacity(buffer_capacity),
                writer,
                flushed_since_tick: false,
                closed: false,
            }),
        });

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let ticker = tick(flush_period);
        let flusher_shared = Arc::clone(&shared);
        let flusher = std::thread::Builder::new()
            .name("orionkv-wal-flush".to_string())
            .spawn(move || loop {
                select! {
                    recv(ticker) -> _ => flusher_shared.tick_flush(),
                    recv(shutdown_rx) -> _ => break,
                }
            })
            .map_err(|e| OrionError::Wal(format!("cannot spawn flusher: {e}")))?;

        Ok(Self {
            shared,
            reader: SegmentReader::new(dir),
            flusher: Mutex::new(Some(flusher)),
            shutdown_tx,
        })
    }

    /// Buffer one record, flushing synchronously when the batch threshold
    /// is reached. Returns only after the record is buffered (or the flush
    /// it triggered failed).
    pub fn append(&self, record: &str) -> Result<()> {
        if framed_len(record) > self.shared.max_segment_size {
            return Err(OrionError::Wal(
                "query is larger than max segment size".to_string(),
            ));
        }

        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(OrionError::Wal("wal is closed".to_string()));
        }

        state.buffer.push(record.to_string());
        if state.buffer.len() >= self.shared.flushing_batch_size {
            WalShared::flush_locked(&mut state)?;
            state.flushed_since_tick = true;
        }

        Ok(())
    }

    /// Flush whatever is buffered right now
    pub fn flush(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        WalShared::flush_locked(&mut state)?;
        state.flushed_since_tick = true;
        Ok(())
    }

    /// Replay every durable record in order; see [`SegmentReader::for_each`]
    pub fn for_each<F>(&self, f: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        self.reader.for_each(f)
    }

    /// All durable records strictly after `position`
    pub fn read_from(&self, position: LogPosition) -> Result<Vec<String>> {
        self.reader.read_from(position)
    }

    /// Position of the durable tail. Buffered records are not advertised,
    /// so a replica can never outrun durability.
    pub fn status(&self) -> LogPosition {
        let state = self.shared.state.lock();
        let (segment_index, line_number) = state.writer.position();
        LogPosition {
            segment_index,
            line_number,
        }
    }

    /// Stop the flush ticker, flush the remaining buffer, and mark the log
    /// closed. A second close is an error callers log and tolerate.
    pub fn close(&self) -> Result<()> {
        let Some(flusher) = self.flusher.lock().take() else {
            return Err(OrionError::Wal("wal is already closed".to_string()));
        };
        let _ = self.shutdown_tx.send(());
        let _ = flusher.join();

        let mut state = self.shared.state.lock();
        let flushed = WalShared::flush_locked(&mut state);
        state.closed = true;
        flushed?;
        state.writer.sync()?;
        Ok(())
    }
}

impl WalShared {
    /// Hand the buffered records to the writer; the buffer is cleared only
    /// after the whole batch is durable.
    fn flush_locked(state: &mut WalState) -> Result<()> {
        if state.buffer.is_empty() {
            return Ok(());
        }
        let state = &mut *state;
        state.writer.write(&state.buffer)?;
        state.buffer.clear();
        Ok(())
    }

    fn tick_flush(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        if state.flushed_since_tick {
            state.flushed_since_tick = false;
            return;
        }
        if let Err(e) = Self::flush_locked(&mut state) {
            tracing::error!("wal auto flush failed: {e}");
        }
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        let still_open = self.flusher.get_mut().is_some();
        if still_open {
            if let Err(e) = self.close() {
                tracing::error!("wal close on drop failed: {e}");
            }
        }
    }
}
