//! Canonical story records and collections.
//!
//! A [`Story`] is produced once by the loader and never mutated afterwards;
//! a refetch replaces the whole [`StoryCollection`], which gets a fresh
//! [`CollectionId`] every time it is built.

use crate::moment::Moment;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Opaque, stable identifier of a story within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(String);

impl StoryId {
    /// Create a story ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StoryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for StoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    /// Create a position, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let position = Self { lat, lng };
        position.is_valid().then_some(position)
    }

    /// Whether both coordinates are finite and inside the geographic range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// A reference to an image attached to a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl MediaRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            caption: None,
        }
    }
}

/// A single geotagged, time-bounded historical story.
///
/// Serializes in the same record shape the loader reads, so a saved
/// collection loads back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Unique identifier within the collection.
    pub id: StoryId,
    /// Short headline shown in the list and marker popup.
    pub title: Option<String>,
    /// One-paragraph summary.
    pub description: Option<String>,
    /// Full text shown by the detail view.
    pub long_description: Option<String>,
    /// Free-form category label.
    pub category: Option<String>,
    /// Street address, if known.
    pub address: Option<String>,
    /// Where the story happened.
    #[serde(flatten)]
    pub position: Position,
    /// When the story becomes active.
    #[serde(rename = "startDate")]
    pub start: Option<Moment>,
    /// When the story becomes overtaken.
    #[serde(rename = "midDate")]
    pub mid: Option<Moment>,
    /// When the story is closed.
    #[serde(rename = "endDate")]
    pub end: Option<Moment>,
    /// Ordered image references, possibly empty.
    #[serde(default)]
    pub media: Vec<MediaRef>,
    /// Preferred map zoom when the camera recenters on this story.
    pub zoom: Option<i32>,
}

impl Story {
    /// Create a story with only an id and a position.
    pub fn new(id: impl Into<StoryId>, position: Position) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            long_description: None,
            category: None,
            address: None,
            position,
            start: None,
            mid: None,
            end: None,
            media: Vec::new(),
            zoom: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the short description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set all three lifecycle moments at once.
    pub fn with_moments(
        mut self,
        start: Option<Moment>,
        mid: Option<Moment>,
        end: Option<Moment>,
    ) -> Self {
        self.start = start;
        self.mid = mid;
        self.end = end;
        self
    }

    /// Set the start moment.
    pub fn with_start(mut self, start: Moment) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the mid moment.
    pub fn with_mid(mut self, mid: Moment) -> Self {
        self.mid = Some(mid);
        self
    }

    /// Set the end moment.
    pub fn with_end(mut self, end: Moment) -> Self {
        self.end = Some(end);
        self
    }

    /// Attach an image reference.
    pub fn with_media(mut self, media: MediaRef) -> Self {
        self.media.push(media);
        self
    }

    /// Set the preferred recenter zoom.
    pub fn with_zoom(mut self, zoom: i32) -> Self {
        self.zoom = Some(zoom);
        self
    }

    /// Title for display, falling back to the id.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.id.as_str())
    }

    /// Whether the start/mid/end moments that are present are in order.
    pub fn moments_ordered(&self) -> bool {
        let present: Vec<Moment> = [self.start, self.mid, self.end].into_iter().flatten().collect();
        present.windows(2).all(|pair| pair[0] <= pair[1])
    }
}

/// Identity of one loaded collection snapshot.
///
/// Two fetches of the same data yield different ids, which is how the
/// focus coordinator notices that a collection was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(Uuid);

impl CollectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CollectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered set of stories with unique ids.
#[derive(Debug, Clone)]
pub struct StoryCollection {
    id: CollectionId,
    name: String,
    stories: Vec<Story>,
    index: HashMap<StoryId, usize>,
}

impl StoryCollection {
    /// Build a collection, keeping source order.
    ///
    /// When two stories share an id the first one wins and the later one is
    /// dropped with a warning.
    pub fn new(name: impl Into<String>, stories: impl IntoIterator<Item = Story>) -> Self {
        let name = name.into();
        let mut kept = Vec::new();
        let mut index = HashMap::new();

        for story in stories {
            if index.contains_key(&story.id) {
                warn!(collection = %name, id = %story.id, "dropping story with duplicate id");
                continue;
            }
            index.insert(story.id.clone(), kept.len());
            kept.push(story);
        }

        Self {
            id: CollectionId::new(),
            name,
            stories: kept,
            index,
        }
    }

    /// An empty collection.
    pub fn empty() -> Self {
        Self::new("", Vec::new())
    }

    /// Identity of this snapshot.
    pub fn id(&self) -> CollectionId {
        self.id
    }

    /// The collection name it was loaded under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All stories, in source order.
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Story> {
        self.stories.iter()
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Look up a story by id.
    pub fn get(&self, id: &str) -> Option<&Story> {
        self.index.get(id).map(|&i| &self.stories[i])
    }

    /// Whether a story with this id is part of the collection.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Source-order index of a story.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Story ids in source order.
    pub fn ids(&self) -> impl Iterator<Item = &StoryId> {
        self.stories.iter().map(|s| &s.id)
    }
}

impl Default for StoryCollection {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a StoryCollection {
    type Item = &'a Story;
    type IntoIter = std::slice::Iter<'a, Story>;

    fn into_iter(self) -> Self::IntoIter {
        self.stories.iter()
    }
}
