//! Audit trail for exchange request/response reconciliation.
//!
//! Every order submission writes the outbound parameter set and the inbound
//! payload (or failure) here, separately from general application logs. The
//! sink is caller-owned and injected into the gateway before construction;
//! opening it is idempotent by construction (append-mode, create-if-missing),
//! so there is no global logging state to guard.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Default rotation threshold in bytes.
pub const DEFAULT_MAX_BYTES: u64 = 2_000_000;
/// Default number of rotated backups kept on disk.
pub const DEFAULT_BACKUPS: u32 = 5;

/// Direction of an audited exchange interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Request,
    Response,
}

/// One audited request or response, serialized as a JSON line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: AuditKind,
    pub endpoint: String,
    pub payload: serde_json::Value,
    pub success: bool,
    pub error: Option<String>,
}

impl AuditRecord {
    pub fn request(endpoint: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: AuditKind::Request,
            endpoint: endpoint.into(),
            payload,
            success: true,
            error: None,
        }
    }

    pub fn response(endpoint: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: AuditKind::Response,
            endpoint: endpoint.into(),
            payload,
            success: true,
            error: None,
        }
    }

    pub fn failure(endpoint: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: AuditKind::Response,
            endpoint: endpoint.into(),
            payload: serde_json::Value::Null,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Storage backend for audit records.
pub trait AuditSink: Send + Sync {
    /// Persist one record.
    fn record(&self, record: &AuditRecord) -> Result<()>;
}

/// Append-only writer that rotates the file once it exceeds `max_bytes`.
///
/// Rotation renames `file` to `file.1`, shifting existing backups up and
/// dropping the oldest beyond `backups`. Cloning shares the underlying file
/// handle, which makes this usable both as an [`AuditSink`] backend and as a
/// `tracing` writer.
#[derive(Clone)]
pub struct RotatingWriter {
    inner: Arc<Mutex<RotatingWriterState>>,
}

struct RotatingWriterState {
    path: PathBuf,
    max_bytes: u64,
    backups: u32,
    file: File,
    written: u64,
}

impl RotatingWriter {
    pub fn open(path: impl AsRef<Path>, max_bytes: u64, backups: u32) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            inner: Arc::new(Mutex::new(RotatingWriterState {
                path,
                max_bytes,
                backups,
                file,
                written,
            })),
        })
    }
}

impl RotatingWriterState {
    fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.backup_path(self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;

        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.inner.lock().expect("rotating writer lock poisoned");
        if state.written > 0 && state.written + buf.len() as u64 > state.max_bytes {
            state.rotate()?;
        }
        state.file.write_all(buf)?;
        state.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.inner.lock().expect("rotating writer lock poisoned");
        state.file.flush()
    }
}

/// Rotating JSON-lines file sink.
pub struct FileAuditSink {
    writer: RotatingWriter,
}

impl FileAuditSink {
    pub fn new(path: impl AsRef<Path>, max_bytes: u64, backups: u32) -> Result<Self> {
        Ok(Self {
            writer: RotatingWriter::open(path, max_bytes, backups)?,
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut writer = self.writer.clone();
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory audit sink for testing.
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().expect("audit sink lock poisoned").clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<()> {
        self.records
            .lock()
            .expect("audit sink lock poisoned")
            .push(record.clone());
        Ok(())
    }
}

/// Caller-owned audit handle held by the gateway.
///
/// A sink write failure is reported through `tracing` and never fails the
/// order call; the submission outcome is already determined by then.
#[derive(Clone)]
pub struct AuditLog {
    sink: Arc<dyn AuditSink>,
}

impl AuditLog {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// File-backed audit log with default rotation (2 MB, 5 backups).
    pub fn rotating(path: impl AsRef<Path>) -> Result<Self> {
        let sink = FileAuditSink::new(path, DEFAULT_MAX_BYTES, DEFAULT_BACKUPS)?;
        Ok(Self::new(Arc::new(sink)))
    }

    pub fn record_request(&self, endpoint: &str, payload: serde_json::Value) {
        self.store(AuditRecord::request(endpoint, payload));
    }

    pub fn record_response(&self, endpoint: &str, payload: serde_json::Value) {
        self.store(AuditRecord::response(endpoint, payload));
    }

    pub fn record_failure(&self, endpoint: &str, error: &str) {
        self.store(AuditRecord::failure(endpoint, error));
    }

    fn store(&self, record: AuditRecord) {
        if let Err(e) = self.sink.record(&record) {
            tracing::error!(error = %e, "Failed to record audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("audit-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_memory_sink_preserves_order() {
        let sink = MemoryAuditSink::new();
        sink.record(&AuditRecord::request("/fapi/v1/order", serde_json::json!({"a": 1})))
            .unwrap();
        sink.record(&AuditRecord::failure("/fapi/v1/order", "timed out"))
            .unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, AuditKind::Request);
        assert_eq!(records[1].kind, AuditKind::Response);
        assert!(!records[1].success);
        assert_eq!(records[1].error.as_deref(), Some("timed out"));
    }

    #[test]
    fn test_rotating_writer_rolls_at_threshold() {
        let dir = temp_dir("rotate");
        let path = dir.join("requests.log");
        let mut writer = RotatingWriter::open(&path, 64, 2).unwrap();

        let line = [b'x'; 40];
        writer.write_all(&line).unwrap();
        writer.write_all(&line).unwrap(); // would exceed 64 -> rotates first
        writer.write_all(&line).unwrap();
        writer.flush().unwrap();

        assert!(path.exists());
        assert!(dir.join("requests.log.1").exists());
        assert!(dir.join("requests.log.2").exists());
        assert_eq!(fs::metadata(&path).unwrap().len(), 40);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rotating_writer_drops_oldest_backup() {
        let dir = temp_dir("backups");
        let path = dir.join("requests.log");
        let mut writer = RotatingWriter::open(&path, 8, 1).unwrap();

        writer.write_all(b"first!!!").unwrap();
        writer.write_all(b"second!!").unwrap();
        writer.write_all(b"third!!!").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(dir.join("requests.log.1")).unwrap(), "second!!");
        assert!(!dir.join("requests.log.2").exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "third!!!");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_sink_writes_json_lines() {
        let dir = temp_dir("jsonl");
        let path = dir.join("requests.log");
        let sink = FileAuditSink::new(&path, DEFAULT_MAX_BYTES, DEFAULT_BACKUPS).unwrap();

        sink.record(&AuditRecord::request(
            "/fapi/v1/order",
            serde_json::json!({"symbol": "BTCUSDT"}),
        ))
        .unwrap();
        sink.record(&AuditRecord::response(
            "/fapi/v1/order",
            serde_json::json!({"orderId": 1}),
        ))
        .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.kind, AuditKind::Request);
        assert_eq!(first.payload["symbol"], "BTCUSDT");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_reopening_sink_appends() {
        let dir = temp_dir("reopen");
        let path = dir.join("requests.log");

        for _ in 0..2 {
            let sink = FileAuditSink::new(&path, DEFAULT_MAX_BYTES, DEFAULT_BACKUPS).unwrap();
            sink.record(&AuditRecord::request("/fapi/v1/order", serde_json::Value::Null))
                .unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);

        let _ = fs::remove_dir_all(&dir);
    }
}
