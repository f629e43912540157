//! Focus coordination between the story list, the map and the popup.
//!
//! ## Architecture
//!
//! ```text
//!   list scroll ──▶ ListGeometry::entry_at ──┐
//!   marker / list click ─────────────────────┼──▶ FocusCoordinator ──▶ FocusCommand
//!   "view full story" ───────────────────────┘        (single writer      ├─ Focus / Clear
//!                                                      of active id)      ├─ ScrollListTo
//!                                                                         └─ RecenterMap
//! ```
//!
//! [`FocusCoordinator`] is synchronous and takes the current instant as an
//! argument, so it can be driven by any event loop. [`driver::spawn`] runs
//! it on a tokio task with real timers.

mod coordinator;
pub mod driver;
mod geometry;

pub use coordinator::{FocusCommand, FocusCoordinator, FocusOrigin, FocusPhase};
pub use driver::{FocusEvent, FocusHandle};
pub use geometry::{EntryExtent, ListGeometry, ReferenceLine};
