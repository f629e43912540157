//! Map camera framing.
//!
//! The center is the arithmetic mean of the framed coordinates, not a
//! geodesic centroid. That is close enough at city scale and is what the
//! map has always done; it is wrong near the antimeridian.

use crate::config::ViewConfig;
use crate::story::{Position, Story};
use serde::{Deserialize, Serialize};

/// Zoom level at which a one-degree span fills the map.
const BASE_ZOOM: f64 = 15.0;

/// Map camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportFrame {
    pub center: Position,
    pub zoom: i32,
}

/// Frame a set of stories.
///
/// - No stories: the configured default center and zoom.
/// - Otherwise the center is the mean position and the zoom is
///   `floor(15 - log2(span))`, where `span` is the larger of the latitude
///   and longitude extents. A zero span uses the single-point zoom. The
///   result is clamped into the configured zoom bounds.
pub fn frame<'a, I>(stories: I, config: &ViewConfig) -> ViewportFrame
where
    I: IntoIterator<Item = &'a Story>,
{
    let mut count = 0usize;
    let (mut lat_sum, mut lng_sum) = (0.0, 0.0);
    let (mut lat_min, mut lat_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut lng_min, mut lng_max) = (f64::INFINITY, f64::NEG_INFINITY);

    for story in stories {
        let Position { lat, lng } = story.position;
        count += 1;
        lat_sum += lat;
        lng_sum += lng;
        lat_min = lat_min.min(lat);
        lat_max = lat_max.max(lat);
        lng_min = lng_min.min(lng);
        lng_max = lng_max.max(lng);
    }

    if count == 0 {
        return ViewportFrame {
            center: config.default_center,
            zoom: config.default_zoom,
        };
    }

    let n = count as f64;
    let center = Position {
        lat: lat_sum / n,
        lng: lng_sum / n,
    };

    let span = (lat_max - lat_min).max(lng_max - lng_min);
    let raw_zoom = if span > 0.0 && span.is_finite() {
        (BASE_ZOOM - span.log2()).floor() as i32
    } else {
        config.single_point_zoom
    };

    ViewportFrame {
        center,
        zoom: config.clamp_zoom(raw_zoom),
    }
}

/// Recenter the camera on one story.
///
/// Uses the story's own zoom hint when it has one, otherwise keeps
/// `current_zoom`.
pub fn focus_frame(story: &Story, current_zoom: i32, config: &ViewConfig) -> ViewportFrame {
    ViewportFrame {
        center: story.position,
        zoom: config.clamp_zoom(story.zoom.unwrap_or(current_zoom)),
    }
}
