use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::fs;

use crate::models::{derive_title, ContentKind, Episode, MetadataRecord, Movie, SeriesEntry};

pub mod parse;
pub mod search;

pub use parse::{parse_episode_number, parse_season_number};
pub use search::SearchFilter;

/// Filename -> stored metadata, as returned by `MetadataStore::lookup`
pub type MetadataLookup = HashMap<String, MetadataRecord>;

/// URL prefix under which the video tree is served
const VIDEOS_URL_PREFIX: &str = "/videos";

/// Everything the scanner needs besides the directory being scanned
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    pub metadata: &'a MetadataLookup,
    pub extensions: &'a [String],
    pub search: &'a SearchFilter,
}

/// Matches on the lowercased name's suffix, so a file named just ".mkv" counts
pub fn is_video_file(path: &Path, extensions: &[String]) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| {
            let name = name.to_lowercase();
            extensions.iter().any(|ext| {
                name.strip_suffix(ext.as_str())
                    .is_some_and(|stem| stem.ends_with('.'))
            })
        })
        .unwrap_or(false)
}

/// Lowercased extension with its dot, e.g. ".mkv"
fn original_format(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// (title, customTitle) for a file: stored values win over the derived title
fn resolve_titles(filename: &str, meta: Option<&MetadataRecord>) -> (String, String) {
    let derived = derive_title(filename);
    let title = non_empty(meta.map(|m| &m.title)).unwrap_or(derived);
    let custom_title = non_empty(meta.map(|m| &m.custom_title)).unwrap_or(title);
    (title.to_string(), custom_title.to_string())
}

fn encode_path(segments: &[&str]) -> String {
    let mut path = VIDEOS_URL_PREFIX.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&urlencoding::encode(segment));
    }
    path
}

/// Sorted names of the immediate entries of `dir` that satisfy `keep`
async fn list_entries<F>(dir: &Path, keep: F) -> std::io::Result<Vec<String>>
where
    F: Fn(&Path, &std::fs::FileType) -> bool,
{
    let mut entries = fs::read_dir(dir).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let entry_path = entry.path();
        // Follow symlinks so linked folders and files behave like real ones
        let file_type = match fs::metadata(&entry_path).await {
            Ok(meta) => meta.file_type(),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry {}: {}", entry_path.display(), e);
                continue;
            }
        };

        if !keep(&entry_path, &file_type) {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => {
                tracing::warn!("Skipping non UTF-8 entry name: {:?}", name);
            }
        }
    }

    names.sort();
    Ok(names)
}

async fn list_video_files(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<String>> {
    list_entries(dir, |path, file_type| {
        file_type.is_file() && is_video_file(path, extensions)
    })
    .await
}

async fn list_subdirectories(dir: &Path) -> std::io::Result<Vec<String>> {
    list_entries(dir, |_, file_type| file_type.is_dir()).await
}

/// List playable files directly under the movies root.
/// A missing or unreadable root yields an empty list.
pub async fn list_movies(movies_dir: &Path, ctx: ScanContext<'_>) -> Vec<Movie> {
    if !fs::try_exists(movies_dir).await.unwrap_or(false) {
        tracing::debug!("Movies directory does not exist: {}", movies_dir.display());
        return Vec::new();
    }

    let filenames = match list_video_files(movies_dir, ctx.extensions).await {
        Ok(filenames) => filenames,
        Err(e) => {
            tracing::error!("Error reading movies directory: {}", e);
            return Vec::new();
        }
    };

    filenames
        .into_iter()
        .map(|filename| build_movie(filename, ctx.metadata))
        .filter(|movie| ctx.search.matches_movie(movie))
        .collect()
}

fn build_movie(filename: String, metadata: &MetadataLookup) -> Movie {
    let (title, custom_title) = resolve_titles(&filename, metadata.get(&filename));

    Movie {
        kind: ContentKind::Movie,
        path: encode_path(&["movies", filename.as_str()]),
        original_format: original_format(&filename),
        filename,
        title,
        custom_title,
    }
}

/// List every series under the series root.
/// A series whose directory cannot be read is logged and left out.
pub async fn list_series(series_dir: &Path, ctx: ScanContext<'_>) -> BTreeMap<String, SeriesEntry> {
    let mut series = BTreeMap::new();

    if !fs::try_exists(series_dir).await.unwrap_or(false) {
        tracing::debug!("Series directory does not exist: {}", series_dir.display());
        return series;
    }

    let series_names = match list_subdirectories(series_dir).await {
        Ok(names) => names,
        Err(e) => {
            tracing::error!("Error reading series directory: {}", e);
            return series;
        }
    };

    for series_name in series_names {
        match scan_series(&series_dir.join(&series_name), &series_name, ctx).await {
            Ok(Some(entry)) => {
                series.insert(series_name, entry);
            }
            Ok(None) => {
                tracing::trace!("Series '{}' has no matching episodes", series_name);
            }
            Err(e) => {
                tracing::error!("Error reading series folder \"{}\": {}", series_name, e);
            }
        }
    }

    series
}

/// Build one series entry, or `None` when it has no (matching) episodes
async fn scan_series(
    series_path: &Path,
    series_name: &str,
    ctx: ScanContext<'_>,
) -> Result<Option<SeriesEntry>> {
    let season_folders = list_subdirectories(series_path).await?;
    let mut seasons: BTreeMap<u32, Vec<Episode>> = BTreeMap::new();

    if season_folders.is_empty() {
        // No season folders: files in the series folder are season 1
        let filenames = list_video_files(series_path, ctx.extensions).await?;
        let episodes = filenames.into_iter().filter_map(|filename| {
            let path = encode_path(&["series", series_name, filename.as_str()]);
            let episode = build_episode(filename, path, series_name, 1, ctx.metadata);
            ctx.search
                .matches_episode(&episode, false)
                .then_some(episode)
        });
        seasons.entry(1).or_default().extend(episodes);
    } else {
        for season_folder in &season_folders {
            let season_number = parse_season_number(season_folder);
            let filenames =
                list_video_files(&series_path.join(season_folder), ctx.extensions).await?;

            let episodes = filenames.into_iter().filter_map(|filename| {
                let path = encode_path(&[
                    "series",
                    series_name,
                    season_folder.as_str(),
                    filename.as_str(),
                ]);
                let episode =
                    build_episode(filename, path, series_name, season_number, ctx.metadata);
                ctx.search
                    .matches_episode(&episode, true)
                    .then_some(episode)
            });
            seasons.entry(season_number).or_default().extend(episodes);
        }
    }

    seasons.retain(|_, episodes| !episodes.is_empty());
    for episodes in seasons.values_mut() {
        episodes.sort_by(|a, b| {
            a.episode
                .cmp(&b.episode)
                .then_with(|| a.filename.cmp(&b.filename))
        });
    }

    let total_episodes: usize = seasons.values().map(Vec::len).sum();
    if total_episodes == 0 {
        return Ok(None);
    }

    Ok(Some(SeriesEntry {
        name: series_name.to_string(),
        seasons,
        total_episodes,
    }))
}

fn build_episode(
    filename: String,
    path: String,
    series_name: &str,
    season: u32,
    metadata: &MetadataLookup,
) -> Episode {
    let meta = metadata.get(&filename);
    let (title, custom_title) = resolve_titles(&filename, meta);
    let episode = meta
        .and_then(|m| m.episode)
        .filter(|&n| n != 0)
        .unwrap_or_else(|| parse_episode_number(&filename));

    Episode {
        kind: ContentKind::Episode,
        series: series_name.to_string(),
        original_format: original_format(&filename),
        filename,
        path,
        title,
        custom_title,
        season,
        episode,
    }
}
