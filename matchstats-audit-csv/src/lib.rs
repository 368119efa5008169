use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use chrono::Utc;
use log::{debug, warn};
use matchstats_domain::{
    ServiceError, ServiceResult,
    audit::{AuditEntry, AuditLog},
};

pub const HEADER: [&str; 3] = ["evento", "descricao", "timestamp"];

/// Audit log stored as a CSV file with header `evento,descricao,timestamp`.
pub struct CsvAuditLog {
    path: PathBuf,
}

impl CsvAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, entry: &AuditEntry) -> Result<(), csv::Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let needs_header = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(HEADER)?;
        }
        let timestamp = entry.timestamp.to_string();
        writer.write_record([
            entry.event.as_str(),
            entry.description.as_str(),
            timestamp.as_str(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

/// Lines written by older versions did not quote descriptions, so a description containing
/// commas spans several columns. The first column is the event and the last one the timestamp.
fn parse_entry(record: &csv::StringRecord) -> Option<AuditEntry> {
    if record.len() < HEADER.len() {
        return None;
    }
    let event = record.get(0)?;
    let timestamp = record.get(record.len() - 1)?.trim().parse::<i64>().ok()?;
    let description = (1..record.len() - 1)
        .filter_map(|i| record.get(i))
        .collect::<Vec<_>>()
        .join(",");

    let entry = AuditEntry {
        event: event.to_string(),
        description,
        timestamp,
    };
    entry.local_time().map(|_| entry)
}

impl AuditLog for CsvAuditLog {
    fn record(&self, event: &str, description: &str) {
        let entry = AuditEntry {
            event: event.to_string(),
            description: description.to_string(),
            timestamp: Utc::now().timestamp(),
        };
        match self.append(&entry) {
            Ok(()) => debug!("Audit event '{}' recorded", event),
            Err(e) => warn!(
                "Failed to record audit event '{}' to {}: {}",
                event,
                self.path.display(),
                e
            ),
        }
    }

    fn read_all(&self) -> ServiceResult<Vec<AuditEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return ServiceError::internal(format!(
                    "Failed to open audit log {}: {}",
                    self.path.display(),
                    e
                ));
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let entries = reader
            .records()
            .enumerate()
            .filter_map(|(index, record)| {
                let entry = record.ok().as_ref().and_then(parse_entry);
                if entry.is_none() {
                    // +2: one for the header, one for 1-based numbering
                    warn!("Skipping malformed audit log line {}", index + 2);
                }
                entry
            })
            .collect();
        Ok(entries)
    }
}
