//! QA tests for lifecycle classification and visibility.
//!
//! Run with: `cargo test -p storymap-core --test qa_temporal`

use storymap_core::temporal::classify_all;
use storymap_core::testing::{sample_collection, story_at, year};
use storymap_core::{
    classify, classify_with_focus, visible, Moment, StoryId, TemporalState, TimeRange,
    VisibilityPolicy,
};

fn day(y: i32, m: u32, d: u32) -> Moment {
    Moment::from_ymd(y, m, d).unwrap()
}

// =============================================================================
// TEST 1: Start-only stories
// =============================================================================

#[test]
fn test_start_only_is_future_then_active() {
    let story = story_at("s", 52.5, 13.4).with_start(day(1938, 11, 9));

    for moment in [day(1900, 1, 1), day(1938, 11, 8)] {
        assert_eq!(classify(&story, moment), TemporalState::Future, "{moment}");
    }
    for moment in [day(1938, 11, 9), day(1938, 11, 10), day(2020, 1, 1)] {
        assert_eq!(classify(&story, moment), TemporalState::Active, "{moment}");
    }
}

// =============================================================================
// TEST 2: Monotonic sweep with inclusive boundaries
// =============================================================================

#[test]
fn test_full_lifecycle_sweep_is_monotonic() {
    let start = day(1939, 9, 1);
    let mid = day(1942, 1, 20);
    let end = day(1945, 5, 8);
    let story = story_at("s", 52.5, 13.4).with_moments(Some(start), Some(mid), Some(end));

    let mut previous = TemporalState::Future;
    let mut date = day(1938, 1, 1).date();
    let last = day(1947, 1, 1).date();
    while date <= last {
        let moment = Moment::from(date);
        let state = classify(&story, moment);
        assert!(state >= previous, "state went backwards at {moment}");
        previous = state;
        date = date.succ_opt().unwrap();
    }

    assert_eq!(classify(&story, start), TemporalState::Active);
    assert_eq!(classify(&story, mid), TemporalState::Overtaken);
    assert_eq!(classify(&story, end), TemporalState::Closed);
    assert_eq!(classify(&story, day(1942, 1, 19)), TemporalState::Active);
    assert_eq!(classify(&story, day(1945, 5, 7)), TemporalState::Overtaken);
}

// =============================================================================
// TEST 3: Focus override
// =============================================================================

#[test]
fn test_focused_story_is_always_active() {
    let collection = sample_collection();
    let focused = StoryId::from("bunker");

    for y in [1900, 1943, 1944, 1945, 2000] {
        let story = collection.get("bunker").unwrap();
        assert_eq!(
            classify_with_focus(story, year(y), Some(&focused)),
            TemporalState::Active
        );
    }

    let other = collection.get("reichstag").unwrap();
    assert_eq!(
        classify_with_focus(other, year(1940), Some(&focused)),
        TemporalState::Closed
    );
}

// =============================================================================
// TEST 4: Purity and degenerate data
// =============================================================================

#[test]
fn test_classification_is_idempotent() {
    let collection = sample_collection();
    let first = classify_all(&collection, year(1944), None);
    let second = classify_all(&collection, year(1944), None);
    assert_eq!(first, second);
}

#[test]
fn test_out_of_order_moments_still_classify() {
    let story = story_at("odd", 1.0, 1.0).with_moments(
        Some(year(1945)),
        Some(year(1940)),
        Some(year(1935)),
    );
    assert_eq!(classify(&story, year(1930)), TemporalState::Future);
    assert_eq!(classify(&story, year(1937)), TemporalState::Future);
    assert_eq!(classify(&story, year(1950)), TemporalState::Closed);
}

#[test]
fn test_story_that_never_started_is_not_closed() {
    let story = story_at("ended", 1.0, 1.0).with_end(year(1940));
    assert_eq!(classify(&story, year(1941)), TemporalState::Future);
    assert_eq!(classify(&story, year(1990)), TemporalState::Future);
}

#[test]
fn test_dateless_story_stays_future() {
    let story = story_at("airlift", 1.0, 1.0);
    assert_eq!(classify(&story, year(1000)), TemporalState::Future);
    assert_eq!(classify(&story, year(3000)), TemporalState::Future);
}

// =============================================================================
// TEST 5: Visibility and time range
// =============================================================================

#[test]
fn test_unfiltered_shows_everything() {
    let collection = sample_collection();
    for y in [1900, 1933, 1950] {
        assert_eq!(
            visible(&collection, year(y), VisibilityPolicy::Unfiltered).len(),
            collection.len()
        );
    }
}

#[test]
fn test_windowed_follows_bounds() {
    let collection = sample_collection();
    let ids = |y| -> Vec<String> {
        visible(&collection, year(y), VisibilityPolicy::Windowed)
            .into_iter()
            .map(|story| story.id.to_string())
            .collect()
    };

    assert_eq!(ids(1933), vec!["reichstag", "airlift"]);
    assert_eq!(ids(1939), vec!["kristall", "airlift"]);
    assert_eq!(ids(1944), vec!["kristall", "airlift", "bunker"]);
}

#[test]
fn test_time_range_of_sample() {
    let range = TimeRange::of(&sample_collection(), TimeRange::new(year(1), year(2)));
    assert_eq!(range, TimeRange::new(year(1933), year(1945)));
    assert_eq!(range.clamp(year(1920)), year(1933));
    assert!(range.contains(year(1940)));
}
