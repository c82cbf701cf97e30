// Metadata service - user edits and CSV transfer on top of the metadata store

use serde::Deserialize;
use thiserror::Error;

use crate::db::{MetadataStore, StoreError, METADATA_HEADER};
use crate::models::{derive_title, ContentKind, MetadataPatch, MetadataRecord};

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("{0}")]
    Validation(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, MetadataError>;

/// Body of a title update. Everything except `customTitle` is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleUpdate {
    pub custom_title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ContentKind>,
    pub series: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// Set the custom title of a movie or episode.
/// Fields absent from the request keep their stored values.
pub async fn update_title(
    store: &MetadataStore,
    filename: &str,
    update: TitleUpdate,
) -> Result<MetadataRecord> {
    let custom_title = update
        .custom_title
        .filter(|t| !t.is_empty())
        .ok_or(MetadataError::Validation("Title is required"))?;

    let patch = MetadataPatch {
        kind: update.kind,
        series: update.series,
        title: Some(derive_title(filename).to_string()),
        season: update.season.filter(|&n| n != 0),
        episode: update.episode.filter(|&n| n != 0),
        custom_title: Some(custom_title),
    };

    let record = store.upsert(filename, patch).await?;
    tracing::info!(
        "Updated title of '{}' to '{}'",
        filename,
        record.custom_title
    );
    Ok(record)
}

/// Rename a series in every stored record. Returns the number of records touched.
pub async fn rename_series(
    store: &MetadataStore,
    old_name: &str,
    new_name: Option<&str>,
) -> Result<usize> {
    let new_name = new_name
        .filter(|n| !n.is_empty())
        .ok_or(MetadataError::Validation("New title is required"))?;

    Ok(store.rename_series(old_name, new_name).await?)
}

/// Render records as CSV text without any quoting.
/// Values containing commas or newlines will not survive a re-import.
pub fn export_csv(records: &[MetadataRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(METADATA_HEADER.to_string());

    for record in records {
        lines.push(format!(
            "{},{},{},{},{},{},{}",
            record.kind.as_str(),
            record.series,
            record.filename,
            record.title,
            record.season.unwrap_or(1),
            record.episode.unwrap_or(1),
            record.custom_title
        ));
    }

    lines.join("\n")
}

/// Parse CSV text with a plain comma split.
///
/// Blank lines are dropped, a leading header line is skipped, and rows
/// without a filename or title are ignored.
pub fn parse_import(text: &str) -> Vec<MetadataRecord> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect();

    let start = match lines.first() {
        Some(first) if first.starts_with(METADATA_HEADER) => 1,
        _ => 0,
    };

    lines[start..]
        .iter()
        .filter_map(|line| parse_import_line(line))
        .collect()
}

fn parse_import_line(line: &str) -> Option<MetadataRecord> {
    let mut fields = line.split(',');
    let mut next = || fields.next().unwrap_or_default();

    let kind = next();
    let series = next();
    let filename = next();
    let title = next();
    let season = next();
    let episode = next();
    let custom_title = next();

    if filename.is_empty() || title.is_empty() {
        tracing::debug!("Skipping import row without filename or title: {}", line);
        return None;
    }

    Some(MetadataRecord {
        kind: ContentKind::parse_lenient(kind),
        series: series.to_string(),
        filename: filename.to_string(),
        title: title.to_string(),
        season: Some(parse_number_or_one(season)),
        episode: Some(parse_number_or_one(episode)),
        custom_title: if custom_title.is_empty() {
            title.to_string()
        } else {
            custom_title.to_string()
        },
    })
}

fn parse_number_or_one(value: &str) -> u32 {
    value.trim().parse().ok().filter(|&n| n != 0).unwrap_or(1)
}

/// Replace the whole store with the rows of `text`
pub async fn import_csv(store: &MetadataStore, text: &str) -> Result<usize> {
    if text.trim().is_empty() {
        return Err(MetadataError::Validation("CSV content is required"));
    }

    let records = parse_import(text);
    Ok(store.replace_all(records).await?)
}
