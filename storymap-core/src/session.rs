//! ViewSession - one open story map view.
//!
//! Holds the loaded collection, the time control position and the focus
//! coordinator, and recomputes the derived projections (states, visible
//! subset, camera frame) on demand. Nothing derived is stored.

use crate::config::{ConfigError, ViewConfig};
use crate::focus::{FocusCommand, FocusCoordinator, ListGeometry};
use crate::framing::{focus_frame, frame, ViewportFrame};
use crate::loader::{LoadError, StorySource};
use crate::moment::Moment;
use crate::story::{Position, Story, StoryCollection, StoryId};
use crate::temporal::{classify_with_focus, TemporalState, TimeRange};
use crate::visibility::visible;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Errors from ViewSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// One marker as the map should draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub id: StoryId,
    pub position: Position,
    pub state: TemporalState,
    /// Popup text: the title, or the id when there is none.
    pub popup: String,
    pub is_active: bool,
}

/// Everything the rendering layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub now: Moment,
    pub range: TimeRange,
    pub markers: Vec<MarkerView>,
    /// Visible story ids in list order.
    pub visible: Vec<StoryId>,
    pub frame: ViewportFrame,
    pub active: Option<StoryId>,
}

/// An open view over one story collection.
#[derive(Debug, Clone)]
pub struct ViewSession {
    config: ViewConfig,
    collection: Arc<StoryCollection>,
    range: TimeRange,
    now: Moment,
    focus: FocusCoordinator,
    camera_zoom: i32,
}

impl ViewSession {
    /// Create a session with an empty collection.
    pub fn new(config: ViewConfig) -> Self {
        let range = config.default_time_range;
        let collection = Arc::new(StoryCollection::empty());
        let mut focus = FocusCoordinator::from_config(&config);
        focus.attach(&collection);

        Self {
            now: range.clamp(config.initial_moment),
            camera_zoom: config.default_zoom,
            config,
            collection,
            range,
            focus,
        }
    }

    /// Create a session and load its first collection from `source`.
    pub async fn open<S: StorySource + ?Sized>(
        config: ViewConfig,
        source: &S,
        name: Option<&str>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let mut session = Self::new(config);
        session.load_from(source, name).await?;
        Ok(session)
    }

    /// Swap in a freshly fetched collection.
    ///
    /// Focus is cleared, the time range is recomputed and the current moment
    /// is pulled into it. The camera zoom resets to the new frame.
    pub fn replace_collection(&mut self, collection: StoryCollection) -> Vec<FocusCommand> {
        let collection = Arc::new(collection);
        let commands = self.focus.attach(&collection);

        self.range = TimeRange::of(&collection, self.config.default_time_range);
        self.now = self.range.clamp(self.now);
        self.collection = collection;
        self.camera_zoom = self.frame().zoom;

        info!(
            collection = self.collection.name(),
            stories = self.collection.len(),
            range_start = %self.range.start,
            range_end = %self.range.end,
            "collection replaced"
        );

        commands
    }

    /// Fetch a collection from `source` and swap it in.
    ///
    /// On failure the current collection stays in place.
    pub async fn load_from<S: StorySource + ?Sized>(
        &mut self,
        source: &S,
        name: Option<&str>,
    ) -> Result<Vec<FocusCommand>, SessionError> {
        let collection = source.fetch_all(name).await?;
        Ok(self.replace_collection(collection))
    }

    /// The view configuration this session was built with.
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// The loaded collection snapshot.
    pub fn collection(&self) -> &Arc<StoryCollection> {
        &self.collection
    }

    /// The focus coordinator owning the active story.
    pub fn focus(&self) -> &FocusCoordinator {
        &self.focus
    }

    /// Current position of the time control.
    pub fn now(&self) -> Moment {
        self.now
    }

    /// Bounds of the time control.
    pub fn time_range(&self) -> TimeRange {
        self.range
    }

    /// Move the time control. Returns the moment actually set after
    /// clamping into the time range.
    pub fn set_now(&mut self, moment: Moment) -> Moment {
        self.now = self.range.clamp(moment);
        self.now
    }

    /// Look up a story in the loaded collection.
    pub fn story(&self, id: &str) -> Option<&Story> {
        self.collection.get(id)
    }

    /// Id of the active story, if any.
    pub fn active_id(&self) -> Option<&StoryId> {
        self.focus.active_id()
    }

    /// The active story, looked up in the loaded collection.
    pub fn active_story(&self) -> Option<&Story> {
        self.active_id().and_then(|id| self.story(id.as_str()))
    }

    /// A marker or list entry was clicked.
    pub fn click(&mut self, id: impl Into<StoryId>, at: Instant) -> Vec<FocusCommand> {
        self.focus.activate(id.into(), at)
    }

    /// The popup's "view full story" action, or any other navigation by
    /// code.
    pub fn view_full_story(&mut self, id: impl Into<StoryId>, at: Instant) -> Vec<FocusCommand> {
        self.focus.focus_programmatically(id.into(), at)
    }

    /// The list scrolled. Picks the entry at the configured reference line
    /// and hands it to the coordinator as a scroll candidate.
    pub fn list_scrolled(&mut self, geometry: &ListGeometry, at: Instant) -> Option<StoryId> {
        let candidate = geometry.entry_at(self.config.focus_reference_line)?.clone();
        self.focus.scroll(candidate.clone(), at);
        Some(candidate)
    }

    /// The list scrolled and `id` is already known to be at the reference
    /// line.
    pub fn scrolled_to(&mut self, id: impl Into<StoryId>, at: Instant) {
        self.focus.scroll(id.into(), at);
    }

    /// Advance focus timers.
    pub fn poll(&mut self, at: Instant) -> Vec<FocusCommand> {
        self.focus.poll(at)
    }

    /// When [`poll`](Self::poll) next has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.focus.next_deadline()
    }

    /// The renderer finished applying the last focus change.
    pub fn propagation_complete(&mut self) {
        self.focus.propagation_complete();
    }

    /// The user zoomed the map.
    pub fn zoom_changed(&mut self, zoom: i32) {
        self.camera_zoom = self.config.clamp_zoom(zoom);
    }

    pub fn camera_zoom(&self) -> i32 {
        self.camera_zoom
    }

    /// Camera frame for recentering on `id`, keeping the current zoom unless
    /// the story carries its own.
    pub fn recenter_frame(&self, id: &str) -> Option<ViewportFrame> {
        self.story(id)
            .map(|story| focus_frame(story, self.camera_zoom, &self.config))
    }

    /// Apply a `RecenterMap` command to the camera and return the new frame.
    pub fn recenter_on(&mut self, id: &str) -> Option<ViewportFrame> {
        let frame = self.recenter_frame(id)?;
        self.camera_zoom = frame.zoom;
        Some(frame)
    }

    /// Stories on screen at the current moment, in list order.
    pub fn visible_stories(&self) -> Vec<&Story> {
        visible(&self.collection, self.now, self.config.visibility_policy)
    }

    /// Camera frame fitting the visible stories.
    pub fn frame(&self) -> ViewportFrame {
        frame(self.visible_stories(), &self.config)
    }

    /// Displayed state of one story, with the focus override applied.
    pub fn state_of(&self, id: &str) -> Option<TemporalState> {
        self.story(id)
            .map(|story| classify_with_focus(story, self.now, self.active_id()))
    }

    /// Project the current view for rendering.
    pub fn snapshot(&self) -> ViewSnapshot {
        let active = self.active_id();
        let stories = self.visible_stories();

        let markers = stories
            .iter()
            .map(|story| MarkerView {
                id: story.id.clone(),
                position: story.position,
                state: classify_with_focus(story, self.now, active),
                popup: story.display_title().to_string(),
                is_active: active == Some(&story.id),
            })
            .collect();

        ViewSnapshot {
            now: self.now,
            range: self.range,
            markers,
            visible: stories.iter().map(|story| story.id.clone()).collect(),
            frame: frame(stories.iter().copied(), &self.config),
            active: active.cloned(),
        }
    }
}
