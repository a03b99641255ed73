//! Worker agents: reserve a chunk, read it, parse it, repeat.

use std::ops::Range;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use memchr::memrchr;
use tracing::{debug, trace};

use crate::cursor::{CursorHandle, SharedCursor};
use crate::error::{Result, SolveError};
use crate::input::InputFile;
use crate::parse::{parse_chunk, LINE_TERMINATOR};
use crate::record::RecordTable;

/// Everything a worker produced once the input is exhausted.
#[derive(Debug)]
pub struct WorkerReport {
    pub worker: usize,
    pub table: RecordTable,
    /// Byte ranges this worker consumed, in the order it reserved them.
    pub chunks: Vec<Range<u64>>,
}

/// One parallel parsing unit.
///
/// The aggregate table is private to the worker until `run` returns it by
/// value; the only state shared with other workers is the cursor.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    input_path: PathBuf,
    cursor: CursorHandle,
    chunk_size: usize,
    cancelled: Arc<AtomicBool>,
}

impl Worker {
    pub fn new(
        id: usize,
        input_path: PathBuf,
        cursor: CursorHandle,
        chunk_size: usize,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            input_path,
            cursor,
            chunk_size,
            cancelled,
        }
    }

    /// Consume chunks until the cursor reaches the end of the input.
    pub fn run(self) -> Result<WorkerReport> {
        let input = InputFile::open(&self.input_path)?;
        let file_size = input.size();
        let cursor = SharedCursor::from_shareable(self.cursor);

        let mut buf = vec![0u8; self.chunk_size];
        let mut table = RecordTable::new();
        let mut chunks = Vec::new();

        debug!(worker = self.id, file_size, "worker started");

        loop {
            if self.cancelled.load(Ordering::Acquire) {
                debug!(worker = self.id, "worker cancelled");
                return Err(SolveError::Cancelled);
            }

            // Critical section: from reading the offset until it is advanced.
            let reservation = cursor.reserve();
            let offset = reservation.offset();
            if offset >= file_size {
                break;
            }

            let window = (file_size - offset).min(self.chunk_size as u64) as usize;
            let read = input.read_window(&mut buf[..window], offset)?;
            if read == 0 {
                break;
            }

            let consumed = if offset + read as u64 >= file_size {
                read
            } else {
                match memrchr(LINE_TERMINATOR, &buf[..read]) {
                    Some(pos) => pos + 1,
                    None => {
                        return Err(SolveError::ChunkTooSmall {
                            offset,
                            chunk_size: self.chunk_size,
                        })
                    }
                }
            };
            reservation.commit(consumed as u64);

            trace!(worker = self.id, offset, consumed, "chunk reserved");

            parse_chunk(&buf[..consumed], offset, &mut table)?;
            chunks.push(offset..offset + consumed as u64);
        }

        debug!(
            worker = self.id,
            chunks = chunks.len(),
            keys = table.len(),
            "worker done"
        );

        Ok(WorkerReport {
            worker: self.id,
            table,
            chunks,
        })
    }
}
