//! Story collection loading and normalization.
//!
//! Collections are JSON files in a data directory. A file holds either a
//! bare array of story records or an object with a `stories` array. Each
//! record is normalized into a [`Story`] here, at the boundary, so nothing
//! else in the crate ever sees a raw date or a missing coordinate.

use crate::moment::{Moment, RawDate};
use crate::story::{MediaRef, Position, Story, StoryCollection, StoryId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

/// Collection read when no name is given.
pub const DEFAULT_COLLECTION: &str = "storymap.json";

/// Errors from loading story collections.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Collection not found: {0}")]
    NotFound(String),

    #[error("Story not found: {0}")]
    StoryNotFound(StoryId),

    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),

    #[error("Failed to parse collection {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single record was left out of a collection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordIssue {
    #[error("record {index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("record has no id")]
    MissingId,

    #[error("story {0} has no coordinates")]
    MissingPosition(StoryId),

    #[error("story {id} has invalid coordinates ({lat}, {lng})")]
    InvalidPosition { id: StoryId, lat: f64, lng: f64 },
}

/// A story id as it appears in a record: text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    fn normalize(&self) -> Option<StoryId> {
        let text = match self {
            RawId::Text(text) => text.trim().to_string(),
            RawId::Number(number) => number.to_string(),
        };
        (!text.is_empty()).then(|| StoryId::new(text))
    }
}

/// A media entry: a bare URL or an object with a URL and caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMedia {
    Url(String),
    Item {
        url: String,
        #[serde(default)]
        caption: Option<String>,
    },
    Other(serde_json::Value),
}

/// A story record exactly as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStory {
    pub id: Option<RawId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub start_date: Option<RawDate>,
    pub mid_date: Option<RawDate>,
    pub end_date: Option<RawDate>,
    pub media: Option<Vec<RawMedia>>,
    pub image_urls: Option<Vec<String>>,
    pub zoom: Option<f64>,
}

impl RawStory {
    /// Normalize into a canonical [`Story`].
    ///
    /// Dates that cannot be read become absent. Records without a usable id
    /// or position are rejected.
    pub fn normalize(&self) -> Result<Story, RecordIssue> {
        let id = self
            .id
            .as_ref()
            .and_then(RawId::normalize)
            .ok_or(RecordIssue::MissingId)?;

        let (lat, lng) = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => return Err(RecordIssue::MissingPosition(id)),
        };
        let position =
            Position::new(lat, lng).ok_or_else(|| RecordIssue::InvalidPosition {
                id: id.clone(),
                lat,
                lng,
            })?;

        let mut story = Story::new(id, position);
        story.title = non_blank(&self.title);
        story.description = non_blank(&self.description);
        story.long_description = non_blank(&self.long_description);
        story.category = non_blank(&self.category);
        story.address = non_blank(&self.address);
        story.start = normalize_date(&story.id, "startDate", self.start_date.as_ref());
        story.mid = normalize_date(&story.id, "midDate", self.mid_date.as_ref());
        story.end = normalize_date(&story.id, "endDate", self.end_date.as_ref());
        story.media = self.collect_media();
        story.zoom = self
            .zoom
            .filter(|z| z.is_finite())
            .map(|z| z.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32);

        if !story.moments_ordered() {
            warn!(id = %story.id, "story moments are out of order; classification may look odd");
        }

        Ok(story)
    }

    /// `imageUrls` first, then `media`; blanks and repeats dropped.
    fn collect_media(&self) -> Vec<MediaRef> {
        let urls = self
            .image_urls
            .iter()
            .flatten()
            .map(|url| MediaRef::new(url.trim()));

        let items = self.media.iter().flatten().filter_map(|item| match item {
            RawMedia::Url(url) => Some(MediaRef::new(url.trim())),
            RawMedia::Item { url, caption } => Some(MediaRef {
                url: url.trim().to_string(),
                caption: non_blank(caption),
            }),
            RawMedia::Other(_) => None,
        });

        let mut seen = HashSet::new();
        urls.chain(items)
            .filter(|media| !media.url.is_empty())
            .filter(|media| seen.insert(media.url.clone()))
            .collect()
    }
}

fn non_blank(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn normalize_date(
    id: &StoryId,
    field: &'static str,
    raw: Option<&RawDate>,
) -> Option<Moment> {
    let raw = raw?;
    let moment = raw.normalize();
    if moment.is_none() {
        warn!(%id, field, value = ?raw, "unreadable date treated as absent");
    }
    moment
}

// Records stay untyped JSON here so one mistyped record cannot fail the file.
#[derive(Deserialize)]
#[serde(untagged)]
enum CollectionFile {
    Bare(Vec<serde_json::Value>),
    Wrapped { stories: Vec<serde_json::Value> },
}

/// Decode one record, reporting its position in the file on failure.
pub fn decode_record(index: usize, value: serde_json::Value) -> Result<RawStory, RecordIssue> {
    serde_json::from_value(value).map_err(|e| RecordIssue::Malformed {
        index,
        reason: e.to_string(),
    })
}

/// Parse a collection from JSON text.
///
/// Malformed JSON fails the whole collection; individual bad records,
/// including ones with wrong-typed fields, are skipped with a warning.
pub fn parse_collection(name: &str, json: &str) -> Result<StoryCollection, LoadError> {
    let file: CollectionFile = serde_json::from_str(json).map_err(|source| LoadError::Parse {
        name: name.to_string(),
        source,
    })?;

    let values = match file {
        CollectionFile::Bare(values) => values,
        CollectionFile::Wrapped { stories } => stories,
    };

    let records = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| decode_record(index, value));

    Ok(collect_records(name, records))
}

/// Normalize raw records into a collection, skipping unusable ones.
pub fn normalize_records(name: &str, records: &[RawStory]) -> StoryCollection {
    collect_records(name, records.iter().cloned().map(Ok))
}

fn collect_records(
    name: &str,
    records: impl Iterator<Item = Result<RawStory, RecordIssue>>,
) -> StoryCollection {
    let mut skipped = 0usize;
    let stories: Vec<Story> = records
        .filter_map(|record| match record.and_then(|raw| raw.normalize()) {
            Ok(story) => Some(story),
            Err(issue) => {
                warn!(collection = name, %issue, "skipping story record");
                skipped += 1;
                None
            }
        })
        .collect();

    let collection = StoryCollection::new(name, stories);
    info!(
        collection = name,
        stories = collection.len(),
        skipped,
        "loaded story collection"
    );
    collection
}

/// Resolve a collection name to a file name inside the data directory.
///
/// `None` means the default collection. `.json` is appended when missing.
/// Names that could escape the data directory are rejected.
pub fn collection_file_name(name: Option<&str>) -> Result<String, LoadError> {
    let name = match name.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_COLLECTION.to_string()),
        Some(name) => name,
    };

    if name.contains(['/', '\\']) || name.contains("..") {
        return Err(LoadError::InvalidCollectionName(name.to_string()));
    }

    if name.ends_with(".json") {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}.json"))
    }
}

/// Read side of a story store.
#[async_trait]
pub trait StorySource: Send + Sync {
    /// Fetch a whole collection by name, or the default one.
    async fn fetch_all(&self, name: Option<&str>) -> Result<StoryCollection, LoadError>;

    /// Fetch one story from the default collection.
    async fn fetch_one(&self, id: &StoryId) -> Result<Story, LoadError> {
        let collection = self.fetch_all(None).await?;
        collection
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| LoadError::StoryNotFound(id.clone()))
    }
}

/// Collections stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FileStorySource {
    data_dir: PathBuf,
}

impl FileStorySource {
    /// Create a source reading from `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of a named collection.
    pub fn path_for(&self, name: Option<&str>) -> Result<PathBuf, LoadError> {
        Ok(self.data_dir.join(collection_file_name(name)?))
    }

    /// Names of all collections in the data directory, sorted.
    pub async fn list_collections(&self) -> Result<Vec<String>, LoadError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.data_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(file_name) = path.file_name() {
                    names.push(file_name.to_string_lossy().to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl StorySource for FileStorySource {
    async fn fetch_all(&self, name: Option<&str>) -> Result<StoryCollection, LoadError> {
        let file_name = collection_file_name(name)?;
        let path = self.data_dir.join(&file_name);

        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(file_name));
            }
            Err(e) => return Err(e.into()),
        };

        parse_collection(&file_name, &json)
    }
}

/// Collections held in memory as JSON text.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorySource {
    collections: HashMap<String, String>,
}

impl MemoryStorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a collection under `name`.
    pub fn with_collection(mut self, name: &str, json: impl Into<String>) -> Self {
        self.insert(name, json);
        self
    }

    /// Add or replace a collection under `name`.
    pub fn insert(&mut self, name: &str, json: impl Into<String>) {
        let key = collection_file_name(Some(name)).unwrap_or_else(|_| name.to_string());
        self.collections.insert(key, json.into());
    }
}

#[async_trait]
impl StorySource for MemoryStorySource {
    async fn fetch_all(&self, name: Option<&str>) -> Result<StoryCollection, LoadError> {
        let file_name = collection_file_name(name)?;
        let json = self
            .collections
            .get(&file_name)
            .ok_or_else(|| LoadError::NotFound(file_name.clone()))?;
        parse_collection(&file_name, json)
    }
}
