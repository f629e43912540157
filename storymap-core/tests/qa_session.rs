//! QA tests for the view session end to end.
//!
//! Run with: `cargo test -p storymap-core --test qa_session`

use std::time::{Duration, Instant};
use storymap_core::testing::{sample_collection, story_at, year, TestHarness};
use storymap_core::{
    frame, FocusCommand, MemoryStorySource, Position, StoryCollection, TemporalState,
    ViewConfig, ViewSession, VisibilityPolicy,
};

// =============================================================================
// TEST 1: Framing
// =============================================================================

#[test]
fn test_frame_empty_collection_uses_configured_default() {
    let config = ViewConfig::default()
        .with_default_center(Position { lat: 40.0, lng: -3.7 })
        .with_default_zoom(9);
    let session = ViewSession::new(config);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.frame.center, Position { lat: 40.0, lng: -3.7 });
    assert_eq!(snapshot.frame.zoom, 9);
}

#[test]
fn test_frame_single_story() {
    let config = ViewConfig::default();
    let stories = [story_at("a", 52.52, 13.405)];
    let result = frame(&stories, &config);
    assert_eq!(result.center, Position { lat: 52.52, lng: 13.405 });
    assert_eq!(result.zoom, config.single_point_zoom);
}

#[test]
fn test_frame_two_stories() {
    let config = ViewConfig::default();
    let stories = [story_at("a", 52.0, 13.0), story_at("b", 53.0, 14.0)];
    let result = frame(&stories, &config);
    assert_eq!(result.center, Position { lat: 52.5, lng: 13.5 });
    assert_eq!(result.zoom, 15);

    let narrow = ViewConfig::default().with_zoom_bounds(5, 10);
    assert_eq!(frame(&stories, &narrow).zoom, 10);
}

#[test]
fn test_frame_is_idempotent() {
    let collection = sample_collection();
    let config = ViewConfig::default();
    assert_eq!(frame(&collection, &config), frame(&collection, &config));
}

// =============================================================================
// TEST 2: Time control drives marker states
// =============================================================================

#[test]
fn test_sweeping_the_time_control() {
    let mut harness = TestHarness::new();
    let state = |harness: &TestHarness, id: &str| {
        harness
            .snapshot()
            .markers
            .into_iter()
            .find(|marker| marker.id.as_str() == id)
            .map(|marker| marker.state)
    };

    harness.at(year(1933));
    assert_eq!(state(&harness, "reichstag"), Some(TemporalState::Closed));
    assert_eq!(state(&harness, "bunker"), Some(TemporalState::Future));

    harness.at(year(1943));
    assert_eq!(state(&harness, "bunker"), Some(TemporalState::Active));

    harness.at(year(1944));
    assert_eq!(state(&harness, "bunker"), Some(TemporalState::Overtaken));

    harness.at(year(1990));
    assert_eq!(harness.snapshot().now, year(1945));
    assert_eq!(state(&harness, "bunker"), Some(TemporalState::Closed));

    harness.click("bunker");
    assert_eq!(state(&harness, "bunker"), Some(TemporalState::Active));
}

#[test]
fn test_windowed_snapshot() {
    let config = ViewConfig::default().with_visibility_policy(VisibilityPolicy::Windowed);
    let mut harness = TestHarness::with_config(config);
    harness.at(year(1936));

    let snapshot = harness.snapshot();
    let visible: Vec<&str> = snapshot.visible.iter().map(|id| id.as_str()).collect();
    assert_eq!(visible, vec!["olympics", "airlift"]);
    assert_eq!(snapshot.markers.len(), 2);
}

#[test]
fn test_dateless_collection_uses_default_range() {
    let collection = StoryCollection::new("plain", vec![story_at("a", 1.0, 1.0)]);
    let harness = TestHarness::with_collection(ViewConfig::default(), collection);
    let range = harness.session().time_range();
    assert_eq!(range, ViewConfig::default().default_time_range);
}

// =============================================================================
// TEST 3: Focus through the session
// =============================================================================

#[test]
fn test_recenter_uses_story_zoom_hint() {
    let mut harness = TestHarness::new();
    harness.session_mut().zoom_changed(13);
    harness.click("bunker");

    let target = harness.recenters()[0].to_string();
    let frame = harness.session_mut().recenter_on(&target).unwrap();
    assert_eq!(frame.zoom, 17);
    assert_eq!(harness.session().camera_zoom(), 17);

    harness.click("olympics");
    let frame = harness.session_mut().recenter_on("olympics").unwrap();
    assert_eq!(frame.zoom, 17);
}

#[test]
fn test_snapshot_serializes_for_renderer() {
    let mut harness = TestHarness::new();
    harness.at(year(1944)).click("bunker");

    let json = serde_json::to_value(harness.snapshot()).unwrap();
    assert_eq!(json["now"], "1944-01-01");
    assert_eq!(json["active"], "bunker");
    assert_eq!(json["markers"][4]["state"], "active");
    assert_eq!(json["markers"][4]["popup"], "Führerbunker");
    assert_eq!(json["markers"][4]["is_active"], true);
    assert_eq!(json["markers"][3]["popup"], "Tempelhof");
}

#[tokio::test]
async fn test_dataset_switch_resets_focus() {
    let source = MemoryStorySource::new()
        .with_collection(
            "storymap",
            r#"[{"id": "a", "lat": 52.5, "lng": 13.4, "startDate": 1933}]"#,
        )
        .with_collection(
            "alternate",
            r#"{"stories": [{"id": "b", "lat": 48.1, "lng": 11.6, "startDate": 1923, "endDate": 1924}]}"#,
        );

    let mut session = ViewSession::open(ViewConfig::default(), &source, None)
        .await
        .unwrap();
    let at = Instant::now();
    session.click("a", at);
    session.scrolled_to("a", at + Duration::from_millis(10));

    let commands = session.load_from(&source, Some("alternate")).await.unwrap();
    assert_eq!(commands, vec![FocusCommand::Clear]);
    assert_eq!(session.active_id(), None);
    assert!(session.poll(at + Duration::from_secs(5)).is_empty());

    assert_eq!(session.now(), year(1924));
    assert_eq!(session.snapshot().frame.center, Position { lat: 48.1, lng: 11.6 });
}
