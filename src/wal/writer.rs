//! Segment writer
//!
//! Writes flushed batches into the active segment, rolling into the next
//! index when a record would push the file past its byte bound. Every
//! touched segment is fsync'd before the batch counts as durable.

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::error::{OrionError, Result};

use super::segment::{create_segment, framed_len, Segment};

/// Owns the active segment and the rollover policy
pub struct SegmentWriter {
    dir: PathBuf,
    max_segment_size: u64,
    segment: Segment,
}

impl SegmentWriter {
    pub fn new(dir: PathBuf, max_segment_size: u64, segment: Segment) -> Self {
        Self {
            dir,
            max_segment_size,
            segment,
        }
    }

    /// Active segment position as `(index, line_count)`
    pub fn position(&self) -> (u64, u64) {
        (self.segment.index, self.segment.lines)
    }

    /// Write a batch of records in order, rolling over as needed.
    ///
    /// A record goes into the active segment while `size + framed < max`;
    /// the remainder is written to freshly created segments, recursively.
    /// An empty segment always accepts one record that fits the bound on
    /// its own, so a batch can never stall between rollovers.
    pub fn write(&mut self, batch: &[String]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut fitting = 0;
        let mut size = self.segment.size;
        for record in batch {
            let framed = framed_len(record);
            if framed > self.max_segment_size {
                return Err(OrionError::Wal(format!(
                    "record of {framed} bytes is too large for segments of {} bytes",
                    self.max_segment_size
                )));
            }
            let fresh_segment = size == 0;
            if size + framed < self.max_segment_size || fresh_segment {
                size += framed;
                fitting += 1;
            } else {
                break;
            }
        }

        if fitting > 0 {
            let mut writer = BufWriter::new(&mut self.segment.file);
            for record in &batch[..fitting] {
                writer.write_all(record.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
            drop(writer);

            self.segment.file.sync_all()?;

            for record in &batch[..fitting] {
                self.segment.size += framed_len(record);
                self.segment.lines += 1;
            }
        }

        let tail = &batch[fitting..];
        if !tail.is_empty() {
            self.roll()?;
            self.write(tail)?;
        }

        Ok(())
    }

    /// Flush and fsync the active segment without writing anything new
    pub fn sync(&mut self) -> Result<()> {
        self.segment.file.sync_all()?;
        Ok(())
    }

    /// Close the active segment and open the next index
    fn roll(&mut self) -> Result<()> {
        let next = create_segment(&self.dir, self.segment.index + 1)?;
        tracing::debug!(index = next.index, "rolled over to new wal segment");
        self.segment = next;
        Ok(())
    }
}
