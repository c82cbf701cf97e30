// Metadata store - the flat CSV file of user overrides keyed by filename

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

use crate::models::{ContentKind, MetadataPatch, MetadataRecord};

pub const METADATA_HEADER: &str = "type,series,filename,title,season,episode,customTitle";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to flush metadata buffer: {0}")]
    Persist(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// On-disk row. Numbers are read leniently: empty or invalid cells become `None`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRow {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    series: String,
    filename: String,
    #[serde(default)]
    title: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    season: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    episode: Option<u32>,
    #[serde(default)]
    custom_title: String,
}

impl From<StoredRow> for MetadataRecord {
    fn from(row: StoredRow) -> Self {
        Self {
            kind: ContentKind::parse_lenient(&row.kind),
            series: row.series,
            filename: row.filename,
            title: row.title,
            season: row.season,
            episode: row.episode,
            custom_title: row.custom_title,
        }
    }
}

/// File-backed metadata store.
///
/// Every mutation is a full read-modify-write of the file. Mutations are
/// serialized through `write_lock`, and the file is replaced via rename so
/// readers never observe a half-written file.
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl MetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with just the header if it does not exist yet
    pub async fn ensure_initialized(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| self.io_err(e))?;
        }

        self.persist(&[]).await?;
        tracing::info!("Initialized metadata file at {}", self.path().display());
        Ok(())
    }

    /// Load every record. A missing file is an empty store.
    pub async fn read_all(&self) -> Result<Vec<MetadataRecord>> {
        let contents = match fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(contents.as_slice());

        let mut records = Vec::new();
        for row in reader.deserialize::<StoredRow>() {
            records.push(row?.into());
        }

        Ok(records)
    }

    /// Filename -> record map. When filenames repeat, the last row wins.
    pub async fn lookup(&self) -> Result<HashMap<String, MetadataRecord>> {
        let records = self.read_all().await?;
        Ok(records
            .into_iter()
            .map(|record| (record.filename.clone(), record))
            .collect())
    }

    /// Overwrite the file with exactly `records`, in order
    pub async fn write_all(&self, records: &[MetadataRecord]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.persist(records).await
    }

    /// Replace the whole store (used by import)
    pub async fn replace_all(&self, records: Vec<MetadataRecord>) -> Result<usize> {
        let count = records.len();
        self.write_all(&records).await?;
        tracing::info!("Replaced metadata store with {} records", count);
        Ok(count)
    }

    /// Insert or update the record for `filename`, merging `patch` over it
    pub async fn upsert(&self, filename: &str, patch: MetadataPatch) -> Result<MetadataRecord> {
        let _guard = self.write_lock.lock().await;

        let records = self.read_all().await?;
        let (records, updated) = merge_upsert(records, filename, patch);
        self.persist(&records).await?;

        tracing::debug!("Upserted metadata for '{}'", filename);
        Ok(updated)
    }

    /// Rewrite every record whose series is exactly `old_name`
    pub async fn rename_series(&self, old_name: &str, new_name: &str) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_all().await?;
        let mut changed = 0;
        for record in records.iter_mut().filter(|r| r.series == old_name) {
            record.series = new_name.to_string();
            changed += 1;
        }
        self.persist(&records).await?;

        tracing::info!(
            "Renamed series '{}' -> '{}' ({} records)",
            old_name,
            new_name,
            changed
        );
        Ok(changed)
    }

    /// Serialize and atomically replace the file. Caller holds `write_lock`.
    async fn persist(&self, records: &[MetadataRecord]) -> Result<()> {
        let bytes = encode_records(records)?;

        let tmp_path = self.temp_path();
        fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| self.io_err(e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("metadata.csv");
        self.path.with_file_name(format!(".{}.tmp", name))
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Header plus one row per record. The header is written even when empty.
fn encode_records(records: &[MetadataRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(METADATA_HEADER.split(','))?;
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| StoreError::Persist(e.to_string()))
}

/// Merge `patch` into the record keyed by `filename`.
///
/// The merge starts from the last row with that filename (the one lookups
/// see); duplicate rows collapse into the position of the first one. A new
/// filename is appended with default values.
fn merge_upsert(
    records: Vec<MetadataRecord>,
    filename: &str,
    patch: MetadataPatch,
) -> (Vec<MetadataRecord>, MetadataRecord) {
    let first = records.iter().position(|r| r.filename == filename);
    let mut updated = records
        .iter()
        .rev()
        .find(|r| r.filename == filename)
        .cloned()
        .unwrap_or_else(|| MetadataRecord::new(filename));
    patch.apply(&mut updated);

    let mut merged = Vec::with_capacity(records.len() + 1);
    for (index, record) in records.into_iter().enumerate() {
        if record.filename != filename {
            merged.push(record);
        } else if Some(index) == first {
            merged.push(updated.clone());
        }
    }
    if first.is_none() {
        merged.push(updated.clone());
    }

    (merged, updated)
}
