//! Which stories are on screen at a given moment.

use crate::moment::Moment;
use crate::story::{Story, StoryCollection};
use serde::{Deserialize, Serialize};

/// How the time control limits what is listed and drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityPolicy {
    /// Every story is always visible; only its state changes with time.
    #[default]
    Unfiltered,
    /// A story is visible only while `start <= now <= end`. Missing bounds
    /// are open-ended.
    Windowed,
}

impl VisibilityPolicy {
    /// Whether `story` is on screen at `now` under this policy.
    pub fn admits(&self, story: &Story, now: Moment) -> bool {
        match self {
            VisibilityPolicy::Unfiltered => true,
            VisibilityPolicy::Windowed => {
                story.start.map_or(true, |start| start <= now)
                    && story.end.map_or(true, |end| now <= end)
            }
        }
    }
}

/// The visible subset of `collection` at `now`, in source order.
pub fn visible(collection: &StoryCollection, now: Moment, policy: VisibilityPolicy) -> Vec<&Story> {
    collection
        .iter()
        .filter(|story| policy.admits(story, now))
        .collect()
}
