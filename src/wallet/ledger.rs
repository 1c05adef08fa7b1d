//! Removal ledger - append-only audit trail of dropped wallets

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Error, Result};

use super::types::RemovalRecord;

/// Destination for removal records
pub trait RemovalLedger: Send {
    /// Append one record. Records are never rewritten.
    fn append(&mut self, record: &RemovalRecord) -> Result<()>;
}

/// CSV file ledger; the file is opened, appended and closed on every write
#[derive(Debug, Clone)]
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record, oldest first.
    /// A missing file is an empty ledger.
    pub fn read_all(&self) -> Result<Vec<RemovalRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(RemovalRecord::from_csv_line)
            .collect()
    }
}

impl RemovalLedger for CsvLedger {
    fn append(&mut self, record: &RemovalRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::Io(format!("Failed to open {}: {}", self.path.display(), e)))?;

        // Single write so a record never lands as a partial line
        let line = format!("{}\n", record.to_csv_line());
        file.write_all(line.as_bytes())?;
        file.flush()?;

        debug!("Appended removal record to {}", self.path.display());
        Ok(())
    }
}

/// In-memory ledger. Clones share the same record list.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    records: Arc<Mutex<Vec<RemovalRecord>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RemovalRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl RemovalLedger for MemoryLedger {
    fn append(&mut self, record: &RemovalRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| Error::Internal("removal ledger lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}
