//! Append-only write log
//!
//! The only durability mechanism a worker has. Accepted records from all
//! shards funnel through one bounded queue into a single writer thread, which
//! appends each as a fixed-width row and flushes per write. That thread is the
//! sole serialization point for the on-disk order. On startup the file is
//! replayed row by row to rebuild in-memory state; a trailing partial row
//! (crash mid-write) is discarded. There is no compaction or snapshotting;
//! the log grows for the life of the dataset.

use crate::common::{record::RECORD_LEN, Error, Result, VoteRecord};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

enum LogCommand {
    Append(VoteRecord),
    Sync(std::sync::mpsc::Sender<()>),
}

/// Handle to the log writer. Cloned into every request path; dropping the
/// last handle stops the writer thread after it drains the queue.
#[derive(Clone)]
pub struct WriteLog {
    tx: mpsc::Sender<LogCommand>,
}

impl WriteLog {
    /// Replay the existing log through `replay`, then open it in append mode
    /// and start the writer thread.
    pub fn open<F>(path: impl AsRef<Path>, capacity: usize, mut replay: F) -> Result<Self>
    where
        F: FnMut(VoteRecord),
    {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        replay_file(&path, &mut replay)?;

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let (tx, rx) = mpsc::channel(capacity);
        std::thread::Builder::new()
            .name("write-log".to_string())
            .spawn(move || writer_loop(path, file, rx))?;

        Ok(Self { tx })
    }

    /// Enqueue a record for appending. Never blocks: a saturated queue or a
    /// stopped writer is reported as a storage error so the caller can tell
    /// the submitter the write is not durable.
    pub fn append(&self, record: VoteRecord) -> Result<()> {
        self.tx
            .try_send(LogCommand::Append(record))
            .map_err(|_| Error::Storage("write queue saturated or writer stopped".into()))
    }

    /// Wait until every record enqueued so far is on disk.
    pub fn sync(&self) -> Result<()> {
        let (ack_tx, ack_rx) = std::sync::mpsc::channel();
        self.tx
            .try_send(LogCommand::Sync(ack_tx))
            .map_err(|_| Error::Storage("write queue saturated or writer stopped".into()))?;
        ack_rx
            .recv()
            .map_err(|_| Error::Storage("log writer stopped".into()))
    }
}

fn writer_loop(path: PathBuf, file: File, mut rx: mpsc::Receiver<LogCommand>) {
    let mut writer = BufWriter::new(file);
    while let Some(cmd) = rx.blocking_recv() {
        let result = match cmd {
            LogCommand::Append(record) => writer
                .write_all(&record.encode())
                .and_then(|_| writer.flush()),
            LogCommand::Sync(ack) => {
                let result = writer.flush().and_then(|_| writer.get_ref().sync_all());
                let _ = ack.send(());
                result
            }
        };
        // A failed append breaks the durability guarantee; serving further
        // writes would silently lose data, so the process must die loudly.
        if let Err(e) = result {
            tracing::error!("append-only log write failed on {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn replay_file<F>(path: &Path, replay: &mut F) -> Result<()>
where
    F: FnMut(VoteRecord),
{
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(file);
    let mut row = [0u8; RECORD_LEN];
    while read_row(&mut reader, &mut row)? {
        // decode cannot fail on a full fixed-width row
        replay(VoteRecord::decode(&row)?);
    }

    Ok(())
}

/// Fill one row from the reader. Returns false at end of file; a partial row
/// is logged and discarded.
fn read_row<R: Read>(reader: &mut R, row: &mut [u8; RECORD_LEN]) -> Result<bool> {
    let mut filled = 0;
    while filled < RECORD_LEN {
        let n = reader.read(&mut row[filled..])?;
        if n == 0 {
            if filled > 0 {
                tracing::warn!("discarding {} trailing bytes of partial record", filled);
            }
            return Ok(false);
        }
        filled += n;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(voter: u64, ts: i64) -> VoteRecord {
        VoteRecord {
            shard: 0,
            voter,
            candidate: 0,
            timestamp: ts,
        }
    }

    #[test]
    fn test_append_then_replay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("votes.log");

        {
            let log = WriteLog::open(&path, 16, |_| {}).unwrap();
            log.append(record(1, 10)).unwrap();
            log.append(record(2, 20)).unwrap();
            log.sync().unwrap();
        }

        let mut replayed = Vec::new();
        WriteLog::open(&path, 16, |r| replayed.push(r)).unwrap();
        assert_eq!(replayed, vec![record(1, 10), record(2, 20)]);
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("votes.log");

        {
            let log = WriteLog::open(&path, 16, |_| {}).unwrap();
            log.append(record(1, 10)).unwrap();
            log.sync().unwrap();
        }
        {
            let log = WriteLog::open(&path, 16, |_| {}).unwrap();
            log.append(record(2, 20)).unwrap();
            log.sync().unwrap();
        }

        let mut count = 0;
        WriteLog::open(&path, 16, |_| count += 1).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_partial_trailing_record_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("votes.log");

        {
            let log = WriteLog::open(&path, 16, |_| {}).unwrap();
            log.append(record(1, 10)).unwrap();
            log.sync().unwrap();
        }

        // Simulate a crash mid-write: append half a row.
        {
            use std::io::Write;
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[0xAB; RECORD_LEN / 2]).unwrap();
        }

        let mut replayed = Vec::new();
        WriteLog::open(&path, 16, |r| replayed.push(r)).unwrap();
        assert_eq!(replayed, vec![record(1, 10)]);
    }

    #[test]
    fn test_full_queue_is_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("votes.log");
        let log = WriteLog::open(&path, 1, |_| {}).unwrap();

        // Queue capacity 1: flood until try_send reports saturation.
        let mut saw_storage_error = false;
        for voter in 0..1000 {
            if let Err(Error::Storage(_)) = log.append(record(voter, voter as i64)) {
                saw_storage_error = true;
                break;
            }
        }
        // The writer may drain fast enough to keep up; only assert the error
        // shape when saturation was actually hit.
        if saw_storage_error {
            log.sync().unwrap();
        }
    }
}
