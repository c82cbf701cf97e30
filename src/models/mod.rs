use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Movie,
    Episode,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Episode => "episode",
        }
    }

    /// Unknown or empty values are treated as movies
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "episode" => ContentKind::Episode,
            _ => ContentKind::Movie,
        }
    }
}

/// One row of the metadata file, keyed by filename.
/// `season` and `episode` are `None` when the cell is empty or not a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub series: String,
    pub filename: String,
    pub title: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub custom_title: String,
}

impl MetadataRecord {
    /// Record with default values for a file that has no stored metadata yet
    pub fn new(filename: &str) -> Self {
        let title = derive_title(filename).to_string();
        Self {
            kind: ContentKind::Movie,
            series: String::new(),
            filename: filename.to_string(),
            custom_title: title.clone(),
            title,
            season: Some(1),
            episode: Some(1),
        }
    }
}

/// Field-level update applied over an existing (or new) record
#[derive(Debug, Clone, Default)]
pub struct MetadataPatch {
    pub kind: Option<ContentKind>,
    pub series: Option<String>,
    pub title: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub custom_title: Option<String>,
}

impl MetadataPatch {
    pub fn apply(self, record: &mut MetadataRecord) {
        if let Some(kind) = self.kind {
            record.kind = kind;
        }
        if let Some(series) = self.series {
            record.series = series;
        }
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(season) = self.season {
            record.season = Some(season);
        }
        if let Some(episode) = self.episode {
            record.episode = Some(episode);
        }
        if let Some(custom_title) = self.custom_title {
            record.custom_title = custom_title;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub filename: String,
    pub path: String,
    pub title: String,
    pub custom_title: String,
    pub original_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub series: String,
    pub filename: String,
    pub path: String,
    pub title: String,
    pub custom_title: String,
    pub season: u32,
    pub episode: u32,
    pub original_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesEntry {
    pub name: String,
    pub seasons: BTreeMap<u32, Vec<Episode>>,
    pub total_episodes: usize,
}

/// Strip the last extension from a filename
/// e.g., "Inception.2010.mkv" -> "Inception.2010"
///
/// A trailing dot is not an extension ("Foo." stays "Foo."), and a bare
/// extension leaves nothing (".mkv" -> "").
pub fn derive_title(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .filter(|(_, ext)| !ext.is_empty())
        .map(|(name, _)| name)
        .unwrap_or(filename)
}
