//! List viewport hit testing for scroll-driven focus.

use crate::story::StoryId;
use serde::{Deserialize, Serialize};

/// The horizontal line in the list viewport that picks the focused entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceLine {
    /// Top edge of the viewport.
    Top,
    /// Vertical middle of the viewport.
    #[default]
    Center,
}

/// One rendered list entry, in content coordinates (pixels from the top of
/// the scrollable content).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryExtent {
    pub id: StoryId,
    pub top: f64,
    pub height: f64,
}

impl EntryExtent {
    pub fn new(id: impl Into<StoryId>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }

    fn bottom(&self) -> f64 {
        self.top + self.height.max(0.0)
    }

    /// Distance from `y` to this entry; zero when `y` falls inside it.
    fn distance_to(&self, y: f64) -> f64 {
        if y < self.top {
            self.top - y
        } else if y > self.bottom() {
            y - self.bottom()
        } else {
            0.0
        }
    }
}

/// Scroll state of the list as reported by the rendering layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListGeometry {
    /// Current scroll offset of the viewport.
    pub scroll_top: f64,
    /// Visible height of the viewport.
    pub viewport_height: f64,
    /// Entries in list order.
    pub entries: Vec<EntryExtent>,
}

impl ListGeometry {
    pub fn new(scroll_top: f64, viewport_height: f64, entries: Vec<EntryExtent>) -> Self {
        Self {
            scroll_top,
            viewport_height,
            entries,
        }
    }

    /// Lay out entries back to back from the top of the content.
    pub fn stacked<I, S>(scroll_top: f64, viewport_height: f64, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<StoryId>,
    {
        let mut top = 0.0;
        let entries = entries
            .into_iter()
            .map(|(id, height)| {
                let entry = EntryExtent::new(id, top, height);
                top += height;
                entry
            })
            .collect();
        Self::new(scroll_top, viewport_height, entries)
    }

    /// Content y-coordinate of the reference line.
    pub fn reference_y(&self, line: ReferenceLine) -> f64 {
        match line {
            ReferenceLine::Top => self.scroll_top,
            ReferenceLine::Center => self.scroll_top + self.viewport_height.max(0.0) / 2.0,
        }
    }

    /// The entry closest to the reference line.
    ///
    /// An entry containing the line wins outright; ties go to the entry that
    /// comes first. Entries with non-finite extents are ignored.
    pub fn entry_at(&self, line: ReferenceLine) -> Option<&StoryId> {
        let y = self.reference_y(line);
        if !y.is_finite() {
            return None;
        }

        let mut best: Option<(&EntryExtent, f64)> = None;
        for entry in &self.entries {
            if !entry.top.is_finite() || !entry.height.is_finite() {
                continue;
            }
            let distance = entry.distance_to(y);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((entry, distance));
            }
        }
        best.map(|(entry, _)| &entry.id)
    }
}
