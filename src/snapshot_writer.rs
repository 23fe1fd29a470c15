use crate::prelude::*;

use chrono::{DateTime, Local};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Serialize)]
struct SnapshotRecord<'a> {
    timestamp: DateTime<Local>,
    serial_number: Serial,
    sensors: &'a Snapshot,
}

/// Keeps the latest snapshot of a logger on disk as one JSON document.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
    snapshots_written: Arc<Mutex<u64>>,
}

impl SnapshotWriter {
    pub fn new(path: &str) -> Result<Self> {
        info!("Writing snapshots to {}", path);

        let path = PathBuf::from(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self {
            path,
            snapshots_written: Arc::new(Mutex::new(0)),
        })
    }

    pub fn write(&self, serial: Serial, snapshot: &Snapshot) -> Result<()> {
        self.write_at(serial, snapshot, Local::now())
    }

    /// Replace the file contents. Readers see either the old or the new document.
    pub fn write_at(
        &self,
        serial: Serial,
        snapshot: &Snapshot,
        timestamp: DateTime<Local>,
    ) -> Result<()> {
        let record = SnapshotRecord {
            timestamp,
            serial_number: serial,
            sensors: snapshot,
        };
        let json = serde_json::to_string_pretty(&record)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let result = (|| -> Result<()> {
            let mut file = std::fs::File::create(&tmp)?;
            writeln!(file, "{}", json)?;
            file.flush()?;
            std::fs::rename(&tmp, &self.path)?;
            Ok(())
        })();

        if let Err(e) = result {
            error!("Failed to write snapshot file {}: {}", self.path.display(), e);
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }

        let mut written = self
            .snapshots_written
            .lock()
            .map_err(|_| anyhow!("Failed to lock snapshot counter"))?;
        *written += 1;
        debug!("snapshot {} written to {}", *written, self.path.display());

        Ok(())
    }

    pub fn snapshots_written(&self) -> u64 {
        self.snapshots_written.lock().map(|n| *n).unwrap_or(0)
    }
}
