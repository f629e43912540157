//! Story lifecycle states and time-control bounds.
//!
//! Classification is a pure projection of `(story, now)` and is meant to be
//! recomputed for the whole collection on every tick of the time slider.

use crate::moment::Moment;
use crate::story::{Story, StoryCollection, StoryId};
use serde::{Deserialize, Serialize};

/// Where a story sits in its lifecycle relative to "now".
///
/// Variants are ordered along the lifecycle, so `Future < Active <
/// Overtaken < Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalState {
    /// Not started yet, or no start date known.
    Future,
    /// Started and not yet overtaken or closed.
    Active,
    /// Superseded but still relevant.
    Overtaken,
    /// Historically concluded.
    Closed,
}

impl TemporalState {
    /// Get the display name for this state.
    pub fn name(&self) -> &'static str {
        match self {
            TemporalState::Future => "future",
            TemporalState::Active => "active",
            TemporalState::Overtaken => "overtaken",
            TemporalState::Closed => "closed",
        }
    }
}

/// Classify a story at `now`.
///
/// 1. No start, or `now` before start: `Future`.
/// 2. Otherwise `Active`.
/// 3. Active and `now` at or past mid: `Overtaken`.
/// 4. Active or overtaken and `now` at or past end: `Closed`.
///
/// A story that never started stays `Future` whatever its mid and end say.
/// Out-of-order moments are not corrected; the rules above still yield
/// exactly one state.
pub fn classify(story: &Story, now: Moment) -> TemporalState {
    let mut state = match story.start {
        Some(start) if now >= start => TemporalState::Active,
        _ => TemporalState::Future,
    };

    if state == TemporalState::Active && story.mid.is_some_and(|mid| now >= mid) {
        state = TemporalState::Overtaken;
    }

    if state >= TemporalState::Active && story.end.is_some_and(|end| now >= end) {
        state = TemporalState::Closed;
    }

    state
}

/// Classify a story as it should be displayed.
///
/// The focused story always shows as `Active` so the user's selection is
/// never dimmed.
pub fn classify_with_focus(story: &Story, now: Moment, focused: Option<&StoryId>) -> TemporalState {
    if focused == Some(&story.id) {
        TemporalState::Active
    } else {
        classify(story, now)
    }
}

/// Displayed state of every story, in collection order.
pub fn classify_all<'a>(
    collection: &'a StoryCollection,
    now: Moment,
    focused: Option<&StoryId>,
) -> Vec<(&'a StoryId, TemporalState)> {
    collection
        .iter()
        .map(|story| (&story.id, classify_with_focus(story, now, focused)))
        .collect()
}

/// Inclusive bounds of the time control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Moment,
    pub end: Moment,
}

impl TimeRange {
    /// Create a range; reversed bounds are swapped.
    pub fn new(a: Moment, b: Moment) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Earliest start and latest end across a collection.
    ///
    /// Falls back to `fallback` when no story carries a start or end date.
    pub fn of(collection: &StoryCollection, fallback: TimeRange) -> Self {
        let moments = collection.iter().flat_map(|s| [s.start, s.end]).flatten();

        let mut bounds: Option<(Moment, Moment)> = None;
        for moment in moments {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(moment), hi.max(moment)),
                None => (moment, moment),
            });
        }

        match bounds {
            Some((start, end)) => Self { start, end },
            None => fallback,
        }
    }

    /// Whether `moment` lies within the range, inclusive.
    pub fn contains(&self, moment: Moment) -> bool {
        self.start <= moment && moment <= self.end
    }

    /// Pull `moment` into the range.
    pub fn clamp(&self, moment: Moment) -> Moment {
        moment.max(self.start).min(self.end)
    }
}
