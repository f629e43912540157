//! Temporal state and view synchronization for geotagged story maps.
//!
//! This crate provides:
//! - Lifecycle classification of stories against a moving "now"
//! - Visibility filtering and map camera framing
//! - A focus coordinator that reconciles clicks, programmatic focus and
//!   list scrolling without feedback loops
//! - Loading and normalization of story collections from JSON
//!
//! # Quick Start
//!
//! ```ignore
//! use storymap_core::{FileStorySource, ViewConfig, ViewSession};
//! use std::time::Instant;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = FileStorySource::new("data");
//!     let mut session = ViewSession::open(ViewConfig::default(), &source, None).await?;
//!
//!     session.set_now("1938-11-09".parse()?);
//!     for command in session.click("kristallnacht", Instant::now()) {
//!         println!("{command:?}");
//!     }
//!
//!     let snapshot = session.snapshot();
//!     println!("{}", serde_json::to_string_pretty(&snapshot)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod focus;
pub mod framing;
pub mod loader;
pub mod moment;
pub mod session;
pub mod story;
pub mod temporal;
pub mod testing;
pub mod visibility;

// Primary public API
pub use config::{ConfigError, ViewConfig};
pub use focus::{FocusCommand, FocusCoordinator, FocusOrigin, ListGeometry, ReferenceLine};
pub use framing::{focus_frame, frame, ViewportFrame};
pub use loader::{FileStorySource, LoadError, MemoryStorySource, StorySource};
pub use moment::{Moment, RawDate};
pub use session::{MarkerView, SessionError, ViewSession, ViewSnapshot};
pub use story::{CollectionId, MediaRef, Position, Story, StoryCollection, StoryId};
pub use temporal::{classify, classify_with_focus, TemporalState, TimeRange};
pub use visibility::{visible, VisibilityPolicy};
