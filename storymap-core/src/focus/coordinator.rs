//! The single writer of the active story id.
//!
//! Three sources can move focus: explicit clicks (marker or list entry),
//! programmatic requests (the popup's "view full story", external
//! navigation) and scrolling the list. Each focus change is tagged with its
//! origin so the coordinator can decide which reciprocal actions to emit:
//!
//! ```text
//!                 scroll                    debounce elapsed
//!   Idle ─────────────────▶ PendingScroll ─────────────────▶ Applying(scroll)
//!    ▲  ◀───────────────┐        │ scroll (restart timer)        │
//!    │   complete/      │        │ click / programmatic          │ scroll
//!    │   timeout        │        ▼                               ▼
//!    └───────────── Applying(explicit) ◀── click ──────── PendingScroll
//! ```
//!
//! While an explicit or programmatic change is `Applying`, the list is being
//! scrolled on our behalf. Scroll events arriving in that window are echoes
//! of our own `ScrollListTo` command and are dropped; feeding them back
//! would start a scroll/recenter oscillation.

use crate::config::ViewConfig;
use crate::story::{CollectionId, StoryCollection, StoryId};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::debug;

/// What caused a focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusOrigin {
    /// The list scrolled and settled on an entry.
    Scroll,
    /// The user clicked a marker or list entry.
    Explicit,
    /// Focus was requested by code, e.g. "view full story".
    Programmatic,
}

impl FocusOrigin {
    /// Whether the list must be scrolled to the newly focused entry.
    ///
    /// Scroll-driven focus is already where the list is.
    pub fn scrolls_list(&self) -> bool {
        !matches!(self, FocusOrigin::Scroll)
    }
}

/// Instructions for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusCommand {
    /// The active story is now `id`.
    Focus { id: StoryId, origin: FocusOrigin },
    /// There is no active story any more.
    Clear,
    /// Scroll the list so this story's entry is in view.
    ScrollListTo(StoryId),
    /// Move the map camera onto this story.
    RecenterMap(StoryId),
}

/// Where the coordinator is in handling a focus change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusPhase {
    /// Nothing in flight.
    Idle,
    /// A scroll-driven candidate is waiting for the list to settle.
    PendingScroll { candidate: StoryId, deadline: Instant },
    /// A focus change is being propagated to the map and list.
    Applying {
        id: StoryId,
        origin: FocusOrigin,
        started: Instant,
    },
}

/// Reconciles click, programmatic and scroll focus into one active id.
#[derive(Debug, Clone)]
pub struct FocusCoordinator {
    active: Option<StoryId>,
    phase: FocusPhase,
    collection: Option<CollectionId>,
    known: HashSet<StoryId>,
    debounce: Duration,
    propagation_timeout: Duration,
}

impl FocusCoordinator {
    /// Create a coordinator with explicit timings.
    pub fn new(debounce: Duration, propagation_timeout: Duration) -> Self {
        Self {
            active: None,
            phase: FocusPhase::Idle,
            collection: None,
            known: HashSet::new(),
            debounce,
            propagation_timeout,
        }
    }

    /// Create a coordinator using the timings from `config`.
    pub fn from_config(config: &ViewConfig) -> Self {
        Self::new(config.scroll_debounce(), config.propagation_timeout())
    }

    /// The authoritative active story.
    pub fn active_id(&self) -> Option<&StoryId> {
        self.active.as_ref()
    }

    /// Current phase of the focus cycle.
    pub fn phase(&self) -> &FocusPhase {
        &self.phase
    }

    /// Whether `id` is the active story.
    pub fn is_active(&self, id: &StoryId) -> bool {
        self.active.as_ref() == Some(id)
    }

    /// The collection snapshot focus is currently scoped to.
    pub fn collection(&self) -> Option<CollectionId> {
        self.collection
    }

    /// Scope focus to a collection snapshot.
    ///
    /// A different snapshot than the current one clears focus and cancels
    /// anything in flight. Attaching the same snapshot again is a no-op.
    pub fn attach(&mut self, collection: &StoryCollection) -> Vec<FocusCommand> {
        if self.collection == Some(collection.id()) {
            return Vec::new();
        }

        debug!(
            collection = %collection.id(),
            stories = collection.len(),
            "focus scoped to new collection"
        );

        self.collection = Some(collection.id());
        self.known = collection.ids().cloned().collect();
        self.phase = FocusPhase::Idle;

        match self.active.take() {
            Some(_) => vec![FocusCommand::Clear],
            None => Vec::new(),
        }
    }

    /// Drop all focus state, e.g. when the view session ends.
    pub fn reset(&mut self) -> Vec<FocusCommand> {
        self.collection = None;
        self.known.clear();
        self.phase = FocusPhase::Idle;
        match self.active.take() {
            Some(_) => vec![FocusCommand::Clear],
            None => Vec::new(),
        }
    }

    /// A marker or list entry was clicked.
    pub fn activate(&mut self, id: StoryId, now: Instant) -> Vec<FocusCommand> {
        self.apply_immediate(id, FocusOrigin::Explicit, now)
    }

    /// Focus was requested programmatically.
    pub fn focus_programmatically(&mut self, id: StoryId, now: Instant) -> Vec<FocusCommand> {
        self.apply_immediate(id, FocusOrigin::Programmatic, now)
    }

    fn apply_immediate(&mut self, id: StoryId, origin: FocusOrigin, now: Instant) -> Vec<FocusCommand> {
        if let FocusPhase::PendingScroll { candidate, .. } = &self.phase {
            debug!(%candidate, %id, "pending scroll focus cancelled");
        }

        if !self.known.contains(&id) {
            debug!(%id, ?origin, "focus requested for unknown story");
            self.phase = FocusPhase::Idle;
            return match self.active.take() {
                Some(_) => vec![FocusCommand::Clear],
                None => Vec::new(),
            };
        }

        self.enter_applying(id, origin, now)
    }

    /// The list scrolled and `candidate` is the entry at the reference line.
    ///
    /// The candidate only becomes focus once the list has been quiet for the
    /// debounce interval; each new scroll event restarts the timer and
    /// replaces the candidate, so a burst settles on its last event.
    pub fn scroll(&mut self, candidate: StoryId, now: Instant) {
        if let FocusPhase::Applying { origin, .. } = &self.phase {
            if origin.scrolls_list() {
                debug!(%candidate, "scroll echo ignored while applying");
                return;
            }
        }

        if !self.known.contains(&candidate) {
            debug!(%candidate, "scroll candidate not in collection");
            return;
        }

        self.phase = FocusPhase::PendingScroll {
            candidate,
            deadline: now + self.debounce,
        };
    }

    /// Advance timers to `now`.
    ///
    /// Settles a pending scroll candidate whose debounce has elapsed and
    /// gives up on a propagation the renderer never acknowledged.
    pub fn poll(&mut self, now: Instant) -> Vec<FocusCommand> {
        match &self.phase {
            FocusPhase::PendingScroll { candidate, deadline } if now >= *deadline => {
                let candidate = candidate.clone();
                if self.is_active(&candidate) {
                    self.phase = FocusPhase::Idle;
                    Vec::new()
                } else {
                    self.enter_applying(candidate, FocusOrigin::Scroll, now)
                }
            }
            FocusPhase::Applying { id, started, .. }
                if now.saturating_duration_since(*started) >= self.propagation_timeout =>
            {
                debug!(%id, "focus propagation timed out");
                self.phase = FocusPhase::Idle;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// The renderer finished applying the last focus change.
    pub fn propagation_complete(&mut self) {
        if matches!(self.phase, FocusPhase::Applying { .. }) {
            self.phase = FocusPhase::Idle;
        }
    }

    /// When [`poll`](Self::poll) next has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.phase {
            FocusPhase::Idle => None,
            FocusPhase::PendingScroll { deadline, .. } => Some(*deadline),
            FocusPhase::Applying { started, .. } => Some(*started + self.propagation_timeout),
        }
    }

    fn enter_applying(&mut self, id: StoryId, origin: FocusOrigin, now: Instant) -> Vec<FocusCommand> {
        debug!(%id, ?origin, "focus applying");

        let mut commands = vec![FocusCommand::Focus {
            id: id.clone(),
            origin,
        }];
        if origin.scrolls_list() {
            commands.push(FocusCommand::ScrollListTo(id.clone()));
        }
        commands.push(FocusCommand::RecenterMap(id.clone()));

        self.active = Some(id.clone());
        self.phase = FocusPhase::Applying {
            id,
            origin,
            started: now,
        };
        commands
    }
}

impl Default for FocusCoordinator {
    fn default() -> Self {
        Self::from_config(&ViewConfig::default())
    }
}
