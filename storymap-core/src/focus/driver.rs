//! Runs a [`FocusCoordinator`] on a tokio task with real timers.
//!
//! UI event handlers push [`FocusEvent`]s into the handle without waiting;
//! the task applies them in arrival order, sleeps until the coordinator's
//! next deadline, and streams the resulting [`FocusCommand`]s back out.

use super::coordinator::{FocusCommand, FocusCoordinator};
use crate::story::{StoryCollection, StoryId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Input to a running focus driver.
#[derive(Debug, Clone)]
pub enum FocusEvent {
    /// Marker or list entry clicked.
    Clicked(StoryId),
    /// Focus requested by code.
    Requested(StoryId),
    /// The list scrolled; this entry is at the reference line.
    Scrolled(StoryId),
    /// The renderer finished applying the last focus change.
    PropagationComplete,
    /// A new collection snapshot replaced the old one.
    CollectionReplaced(Arc<StoryCollection>),
}

/// Handle to a spawned focus driver task.
pub struct FocusHandle {
    events: mpsc::UnboundedSender<FocusEvent>,
    commands: mpsc::UnboundedReceiver<FocusCommand>,
    task: JoinHandle<FocusCoordinator>,
}

impl FocusHandle {
    /// Queue an event. Returns `false` if the driver has stopped.
    pub fn send(&self, event: FocusEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Wait for the next command.
    pub async fn next_command(&mut self) -> Option<FocusCommand> {
        self.commands.recv().await
    }

    /// Take the next command if one is ready.
    pub fn try_next_command(&mut self) -> Option<FocusCommand> {
        self.commands.try_recv().ok()
    }

    /// Take every command that is ready right now.
    pub fn drain_commands(&mut self) -> Vec<FocusCommand> {
        std::iter::from_fn(|| self.try_next_command()).collect()
    }

    /// Stop the driver and get the coordinator back.
    pub async fn shutdown(self) -> Option<FocusCoordinator> {
        drop(self.events);
        self.task.await.ok()
    }
}

/// Spawn a driver for `coordinator` on the current tokio runtime.
pub fn spawn(coordinator: FocusCoordinator) -> FocusHandle {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(coordinator, event_rx, command_tx));

    FocusHandle {
        events: event_tx,
        commands: command_rx,
        task,
    }
}

async fn run(
    mut coordinator: FocusCoordinator,
    mut events: mpsc::UnboundedReceiver<FocusEvent>,
    commands: mpsc::UnboundedSender<FocusCommand>,
) -> FocusCoordinator {
    loop {
        let deadline = coordinator.next_deadline().map(Instant::from_std);

        let produced = tokio::select! {
            event = events.recv() => match event {
                Some(event) => apply(&mut coordinator, event, Instant::now().into_std()),
                None => break,
            },
            _ = wait_for(deadline) => coordinator.poll(Instant::now().into_std()),
        };

        for command in produced {
            if commands.send(command).is_err() {
                debug!("focus command receiver dropped, stopping driver");
                return coordinator;
            }
        }
    }

    coordinator
}

fn apply(
    coordinator: &mut FocusCoordinator,
    event: FocusEvent,
    now: std::time::Instant,
) -> Vec<FocusCommand> {
    match event {
        FocusEvent::Clicked(id) => coordinator.activate(id, now),
        FocusEvent::Requested(id) => coordinator.focus_programmatically(id, now),
        FocusEvent::Scrolled(id) => {
            coordinator.scroll(id, now);
            Vec::new()
        }
        FocusEvent::PropagationComplete => {
            coordinator.propagation_complete();
            Vec::new()
        }
        FocusEvent::CollectionReplaced(collection) => coordinator.attach(&collection),
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::focus::FocusOrigin;
    use crate::story::{Position, Story};
    use std::time::Duration;
    use tokio::time::sleep;

    fn collection() -> Arc<StoryCollection> {
        let p = Position::new(52.5, 13.4).unwrap();
        Arc::new(StoryCollection::new(
            "test",
            ["a", "b", "c"].into_iter().map(|id| Story::new(id, p)),
        ))
    }

    fn coordinator() -> FocusCoordinator {
        FocusCoordinator::new(Duration::from_millis(100), Duration::from_millis(600))
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_debounces_scroll_burst() {
        let mut handle = spawn(coordinator());
        handle.send(FocusEvent::CollectionReplaced(collection()));

        handle.send(FocusEvent::Scrolled("a".into()));
        sleep(Duration::from_millis(30)).await;
        handle.send(FocusEvent::Scrolled("b".into()));
        sleep(Duration::from_millis(30)).await;
        handle.send(FocusEvent::Scrolled("c".into()));

        sleep(Duration::from_millis(50)).await;
        assert!(handle.drain_commands().is_empty());

        sleep(Duration::from_millis(100)).await;
        let commands = handle.drain_commands();
        assert_eq!(
            commands,
            vec![
                FocusCommand::Focus {
                    id: "c".into(),
                    origin: FocusOrigin::Scroll
                },
                FocusCommand::RecenterMap("c".into()),
            ]
        );

        let coordinator = handle.shutdown().await.unwrap();
        assert_eq!(coordinator.active_id().unwrap().as_str(), "c");
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_click_is_immediate() {
        let mut handle = spawn(coordinator());
        handle.send(FocusEvent::CollectionReplaced(collection()));
        handle.send(FocusEvent::Scrolled("a".into()));
        handle.send(FocusEvent::Clicked("b".into()));

        let first = handle.next_command().await;
        assert_eq!(
            first,
            Some(FocusCommand::Focus {
                id: "b".into(),
                origin: FocusOrigin::Explicit
            })
        );
        assert_eq!(
            handle.next_command().await,
            Some(FocusCommand::ScrollListTo("b".into()))
        );
        assert_eq!(
            handle.next_command().await,
            Some(FocusCommand::RecenterMap("b".into()))
        );

        // The cancelled scroll candidate never fires.
        handle.send(FocusEvent::PropagationComplete);
        sleep(Duration::from_millis(500)).await;
        assert!(handle.drain_commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_collection_swap_clears_focus() {
        let mut handle = spawn(coordinator());
        handle.send(FocusEvent::CollectionReplaced(collection()));
        handle.send(FocusEvent::Clicked("a".into()));
        handle.send(FocusEvent::CollectionReplaced(collection()));

        sleep(Duration::from_millis(1)).await;
        let commands = handle.drain_commands();
        assert_eq!(commands.last(), Some(&FocusCommand::Clear));

        let coordinator = handle.shutdown().await.unwrap();
        assert!(coordinator.active_id().is_none());
    }
}
