//! Testing utilities for the story map core.
//!
//! This module provides tools for integration testing:
//! - Fixture builders for stories and a small sample collection
//! - `TestHarness` for scripted focus scenarios on a manual clock
//! - Assertion helpers over recorded focus commands

use crate::config::ViewConfig;
use crate::focus::{FocusCommand, FocusOrigin, ListGeometry};
use crate::moment::Moment;
use crate::session::{ViewSession, ViewSnapshot};
use crate::story::{Position, Story, StoryCollection, StoryId};
use std::time::{Duration, Instant};

/// January 1 of `year`, panicking on years chrono cannot represent.
pub fn year(year: i32) -> Moment {
    Moment::start_of_year(year).unwrap_or_else(|| panic!("year {year} out of range"))
}

/// A story with only an id and a position.
pub fn story_at(id: &str, lat: f64, lng: f64) -> Story {
    let position =
        Position::new(lat, lng).unwrap_or_else(|| panic!("invalid test position ({lat}, {lng})"));
    Story::new(id, position)
}

/// Five Berlin stories spread over 1933 to 1945, in list order.
///
/// | id          | start | mid  | end  |
/// |-------------|-------|------|------|
/// | reichstag   | 1933  |      | 1933 |
/// | olympics    | 1936  |      | 1936 |
/// | kristall    | 1938  |      |      |
/// | airlift     |       |      |      |
/// | bunker      | 1943  | 1944 | 1945 |
pub fn sample_collection() -> StoryCollection {
    StoryCollection::new(
        "sample",
        vec![
            story_at("reichstag", 52.5186, 13.3762)
                .with_title("Reichstag fire")
                .with_start(year(1933))
                .with_end(year(1933)),
            story_at("olympics", 52.5147, 13.2395)
                .with_title("Olympic games")
                .with_start(year(1936))
                .with_end(year(1936)),
            story_at("kristall", 52.5250, 13.4010).with_start(year(1938)),
            story_at("airlift", 52.4736, 13.4017).with_title("Tempelhof"),
            story_at("bunker", 52.5125, 13.3815)
                .with_title("Führerbunker")
                .with_moments(Some(year(1943)), Some(year(1944)), Some(year(1945)))
                .with_zoom(17),
        ],
    )
}

/// A view session over [`sample_collection`] driven by a manual clock.
///
/// Every command the session emits is recorded so tests can assert on the
/// whole history.
pub struct TestHarness {
    session: ViewSession,
    clock: Instant,
    commands: Vec<FocusCommand>,
}

impl TestHarness {
    /// Create a harness with default config and the sample collection.
    pub fn new() -> Self {
        Self::with_config(ViewConfig::default())
    }

    /// Create a harness with a custom config and the sample collection.
    pub fn with_config(config: ViewConfig) -> Self {
        Self::with_collection(config, sample_collection())
    }

    /// Create a harness over any collection.
    pub fn with_collection(config: ViewConfig, collection: StoryCollection) -> Self {
        let mut session = ViewSession::new(config);
        let commands = session.replace_collection(collection);
        Self {
            session,
            clock: Instant::now(),
            commands,
        }
    }

    pub fn session(&self) -> &ViewSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ViewSession {
        &mut self.session
    }

    /// Current time on the manual clock.
    pub fn now(&self) -> Instant {
        self.clock
    }

    /// Click a marker or list entry.
    pub fn click(&mut self, id: &str) -> &mut Self {
        let produced = self.session.click(id, self.clock);
        self.commands.extend(produced);
        self
    }

    /// Trigger "view full story".
    pub fn open(&mut self, id: &str) -> &mut Self {
        let produced = self.session.view_full_story(id, self.clock);
        self.commands.extend(produced);
        self
    }

    /// Report the list resting on `id`.
    pub fn scroll(&mut self, id: &str) -> &mut Self {
        self.session.scrolled_to(id, self.clock);
        self
    }

    /// Report a list scroll by geometry.
    pub fn scroll_geometry(&mut self, geometry: &ListGeometry) -> &mut Self {
        self.session.list_scrolled(geometry, self.clock);
        self
    }

    /// Advance the clock and poll timers.
    pub fn advance(&mut self, ms: u64) -> &mut Self {
        self.clock += Duration::from_millis(ms);
        let produced = self.session.poll(self.clock);
        self.commands.extend(produced);
        self
    }

    /// Acknowledge the last focus change.
    pub fn complete(&mut self) -> &mut Self {
        self.session.propagation_complete();
        self
    }

    /// Replace the collection with a fresh copy of the sample.
    pub fn refetch(&mut self) -> &mut Self {
        let produced = self.session.replace_collection(sample_collection());
        self.commands.extend(produced);
        self
    }

    /// Move the time control.
    pub fn at(&mut self, moment: Moment) -> &mut Self {
        self.session.set_now(moment);
        self
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.session.snapshot()
    }

    pub fn active(&self) -> Option<&str> {
        self.session.active_id().map(StoryId::as_str)
    }

    /// All commands recorded so far.
    pub fn commands(&self) -> &[FocusCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the log empty.
    pub fn take_commands(&mut self) -> Vec<FocusCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Focus updates recorded so far, as `(id, origin)`.
    pub fn focus_updates(&self) -> Vec<(&str, FocusOrigin)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                FocusCommand::Focus { id, origin } => Some((id.as_str(), *origin)),
                _ => None,
            })
            .collect()
    }

    /// Ids the list was told to scroll to.
    pub fn list_scrolls(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                FocusCommand::ScrollListTo(id) => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Ids the map was told to recenter on.
    pub fn recenters(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                FocusCommand::RecenterMap(id) => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of `Clear` commands recorded.
    pub fn clears(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, FocusCommand::Clear))
            .count()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the active story.
pub fn assert_active(harness: &TestHarness, expected: Option<&str>) {
    assert_eq!(
        harness.active(),
        expected,
        "expected active story {expected:?}, got {:?}",
        harness.active()
    );
}

/// Assert that the list was never told to scroll.
pub fn assert_no_list_scroll(harness: &TestHarness) {
    assert!(
        harness.list_scrolls().is_empty(),
        "expected no list scroll, got {:?}",
        harness.list_scrolls()
    );
}

/// Assert the exact sequence of focus updates.
pub fn assert_focus_updates(harness: &TestHarness, expected: &[(&str, FocusOrigin)]) {
    assert_eq!(harness.focus_updates(), expected);
}
