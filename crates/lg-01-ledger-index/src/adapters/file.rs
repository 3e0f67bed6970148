//! JSON-lines file ledger.
//!
//! One [`LedgerRecord`] per line, appended and synced to disk before
//! `append` returns. Complete lines are replayed into memory on open and
//! again before every read, so records appended through another handle on
//! the same file become visible. A trailing line without its newline is
//! left for a later pass.

use crate::domain::LedgerRecord;
use crate::ports::{LedgerSource, SourceError};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{TopicSet, TransactionEnvelope};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Ledger persisted to a single append-only file.
pub struct FileLedger {
    path: PathBuf,
    records: RwLock<Vec<LedgerRecord>>,
    /// Serializes appends and replays so heights follow file order.
    tail: Mutex<Tail>,
}

struct Tail {
    file: File,
    /// Bytes of complete lines already replayed.
    offset: u64,
    /// Lines already replayed, for error positions.
    lines: usize,
}

impl FileLedger {
    /// Open (or create) the ledger at `path` and replay it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let ledger = Self {
            path,
            records: RwLock::new(Vec::new()),
            tail: Mutex::new(Tail {
                file,
                offset: 0,
                lines: 0,
            }),
        };
        ledger.refresh().await?;
        info!(
            path = %ledger.path.display(),
            records = ledger.records.read().len(),
            "Opened file ledger"
        );
        Ok(ledger)
    }

    async fn refresh(&self) -> Result<(), SourceError> {
        let mut tail = self.tail.lock().await;
        self.replay(&mut tail).await
    }

    /// Load complete lines written past `tail.offset`.
    async fn replay(&self, tail: &mut Tail) -> Result<(), SourceError> {
        let mut reader = File::open(&self.path).await?;
        reader.seek(SeekFrom::Start(tail.offset)).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;

        let Some(end) = buf.iter().rposition(|b| *b == b'\n').map(|i| i + 1) else {
            return Ok(());
        };
        let chunk = &buf[..end];

        let first_height = self.records.read().len() as u64;
        let parsed = parse_records(chunk, tail.lines, first_height)?;
        if !parsed.is_empty() {
            debug!(records = parsed.len(), "Replayed ledger lines");
        }
        self.records.write().extend(parsed);

        tail.offset += end as u64;
        tail.lines += chunk.iter().filter(|b| **b == b'\n').count();
        Ok(())
    }
}

/// Parse newline-terminated lines; `first_line` is the number of lines
/// before `chunk` in the file.
fn parse_records(
    chunk: &[u8],
    first_line: usize,
    first_height: u64,
) -> Result<Vec<LedgerRecord>, SourceError> {
    let mut records = Vec::new();
    for (index, line) in chunk.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let line_number = first_line + index + 1;
        let record: LedgerRecord =
            serde_json::from_slice(line).map_err(|e| SourceError::Corrupt {
                line: line_number,
                message: e.to_string(),
            })?;
        let expected = first_height + records.len() as u64;
        if record.height != expected {
            return Err(SourceError::Corrupt {
                line: line_number,
                message: format!("expected height {}, found {}", expected, record.height),
            });
        }
        records.push(record);
    }
    Ok(records)
}

/// Write one line and flush it to disk.
async fn write_line(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.sync_data().await
}

#[async_trait]
impl LedgerSource for FileLedger {
    async fn probe(&self) -> Result<(), SourceError> {
        tokio::fs::metadata(&self.path)
            .await
            .map(|_| ())
            .map_err(|e| SourceError::Unavailable(format!("{}: {}", self.path.display(), e)))
    }

    async fn append(
        &self,
        envelope: TransactionEnvelope,
        topics: TopicSet,
    ) -> Result<LedgerRecord, SourceError> {
        let mut tail = self.tail.lock().await;
        self.replay(&mut tail).await?;

        // Anything past the replayed offset is a torn line from a failed write.
        let len = tail.file.metadata().await?.len();
        if len > tail.offset {
            warn!(
                path = %self.path.display(),
                bytes = len - tail.offset,
                "Truncating torn ledger line"
            );
            let offset = tail.offset;
            tail.file.set_len(offset).await?;
        }

        let record = LedgerRecord {
            height: self.records.read().len() as u64,
            envelope,
            topics,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        if let Err(e) = write_line(&mut tail.file, &line).await {
            let offset = tail.offset;
            if let Err(rollback) = tail.file.set_len(offset).await {
                error!(
                    error = %rollback,
                    height = record.height,
                    "Failed ledger write could not be rolled back"
                );
            }
            return Err(e.into());
        }

        tail.offset += line.len() as u64;
        tail.lines += 1;
        self.records.write().push(record.clone());
        debug!(height = record.height, "Appended ledger record");
        Ok(record)
    }

    async fn read_from(&self, height: u64, limit: usize) -> Result<Vec<LedgerRecord>, SourceError> {
        self.refresh().await?;
        let records = self.records.read();
        let start = usize::try_from(height).unwrap_or(usize::MAX).min(records.len());
        Ok(records[start..].iter().take(limit).cloned().collect())
    }

    async fn head(&self) -> Result<u64, SourceError> {
        self.refresh().await?;
        Ok(self.records.read().len() as u64)
    }
}
