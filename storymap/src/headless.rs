//! Headless mode for the story map.
//!
//! This module stands in for the map and list renderer. It reads one
//! command per line, feeds it into a [`ViewSession`] and prints every
//! resulting command, so focus behaviour can be scripted and inspected.

use std::path::PathBuf;
use std::time::Instant;
use storymap_core::{
    FileStorySource, FocusCommand, FocusOrigin, Moment, SessionError, ViewConfig, ViewSession,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Collection directory used when neither flag nor environment sets one.
const DEFAULT_DATA_DIR: &str = "data";

/// Startup options for a headless run.
#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub data_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub collection: Option<String>,
    pub at: Option<Moment>,
}

/// Run the session in headless mode.
///
/// This provides a simple line-oriented protocol:
/// - Lines starting with `#` are commands (see `#help`)
/// - Output lines are tagged `[FOCUS]`, `[LIST]`, `[MAP]`, `[TIME]`, ...
/// - Debounced scroll focus fires on its own, without waiting for input
pub async fn run_headless(options: HeadlessOptions) -> Result<(), SessionError> {
    let config = match &options.config_path {
        Some(path) => ViewConfig::load(path).await?,
        None => ViewConfig::default(),
    };

    let source = FileStorySource::new(&options.data_dir);
    let mut session = ViewSession::new(config);

    println!("=== Story Map Headless Mode ===");
    println!("Data directory: {}", options.data_dir.display());
    load(&mut session, &source, options.collection.as_deref()).await;

    if let Some(at) = options.at {
        session.set_now(at);
    }
    print_time(&session);
    println!();
    print_help();
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = session.next_deadline();

        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = wait_for(deadline) => {
                let commands = session.poll(Instant::now());
                report(&mut session, commands);
                continue;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(command) = line.strip_prefix('#') else {
            println!("[ERROR] Commands start with '#'. Type #help for help.");
            continue;
        };

        let parts: Vec<&str> = command.split_whitespace().collect();
        let arg = parts.get(1).copied();
        let now = Instant::now();

        match parts.first().copied() {
            Some("quit") | Some("exit") => {
                println!("Goodbye!");
                break;
            }
            Some("at") => match arg.map(str::parse::<Moment>) {
                Some(Ok(moment)) => {
                    session.set_now(moment);
                    print_time(&session);
                    print_markers(&session);
                }
                Some(Err(e)) => println!("[ERROR] {e}"),
                None => println!("[ERROR] Usage: #at <date>"),
            },
            Some("click") => match arg {
                Some(id) => {
                    let commands = session.click(id, now);
                    report(&mut session, commands);
                }
                None => println!("[ERROR] Usage: #click <id>"),
            },
            Some("open") => match arg {
                Some(id) => {
                    let commands = session.view_full_story(id, now);
                    report(&mut session, commands);
                    if let Some(story) = session.story(id) {
                        println!("[STORY] {}", story.display_title());
                        if let Some(text) = story.long_description.as_ref().or(story.description.as_ref()) {
                            println!("{text}");
                        }
                    }
                }
                None => println!("[ERROR] Usage: #open <id>"),
            },
            Some("scroll") => match arg {
                Some(id) => {
                    session.scrolled_to(id, now);
                    debug!(id, "scroll reported");
                }
                None => println!("[ERROR] Usage: #scroll <id>"),
            },
            Some("wait") => match arg.map(str::parse::<u64>) {
                Some(Ok(ms)) => {
                    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
                }
                _ => println!("[ERROR] Usage: #wait <milliseconds>"),
            },
            Some("done") => {
                session.propagation_complete();
                println!("[DONE]");
            }
            Some("zoom") => match arg.map(str::parse::<i32>) {
                Some(Ok(zoom)) => {
                    session.zoom_changed(zoom);
                    println!("[MAP] zoom {}", session.camera_zoom());
                }
                _ => println!("[ERROR] Usage: #zoom <level>"),
            },
            Some("load") => {
                load(&mut session, &source, arg).await;
                print_time(&session);
            }
            Some("status") => print_status(&session),
            Some("snapshot") => match serde_json::to_string_pretty(&session.snapshot()) {
                Ok(json) => println!("[SNAPSHOT]\n{json}"),
                Err(e) => println!("[ERROR] {e}"),
            },
            Some("story") => match arg.and_then(|id| session.story(id)) {
                Some(story) => match serde_json::to_string_pretty(story) {
                    Ok(json) => println!("[STORY]\n{json}"),
                    Err(e) => println!("[ERROR] {e}"),
                },
                None => println!("[ERROR] Usage: #story <id> (id must exist)"),
            },
            Some("help") => print_help(),
            _ => println!("[ERROR] Unknown command. Type #help for help."),
        }

        let commands = session.poll(Instant::now());
        report(&mut session, commands);
    }

    Ok(())
}

/// Parse startup options from command line arguments and the environment.
pub fn parse_options_from_args(args: &[String]) -> Result<HeadlessOptions, String> {
    let mut options = HeadlessOptions {
        data_dir: std::env::var("STORYMAP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
        config_path: std::env::var("STORYMAP_CONFIG").ok().map(PathBuf::from),
        collection: None,
        at: None,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--data-dir", Some(dir)) => options.data_dir = PathBuf::from(dir),
            ("--config", Some(path)) => options.config_path = Some(PathBuf::from(path)),
            ("--collection", Some(name)) => options.collection = Some(name.clone()),
            ("--at", Some(date)) => {
                let moment = date
                    .parse::<Moment>()
                    .map_err(|e| format!("--at: {e}"))?;
                options.at = Some(moment);
            }
            ("--data-dir" | "--config" | "--collection" | "--at", None) => {
                return Err(format!("{} needs a value", args[i]));
            }
            (other, _) => return Err(format!("unknown argument: {other}")),
        }
        i += 2;
    }

    Ok(options)
}

async fn load(session: &mut ViewSession, source: &FileStorySource, name: Option<&str>) {
    match session.load_from(source, name).await {
        Ok(commands) => {
            let collection = session.collection();
            println!(
                "[LOADED] {} ({} stories)",
                collection.name(),
                collection.len()
            );
            report(session, commands);
        }
        Err(e) => println!("[ERROR] Load failed: {e}"),
    }
}

/// Print commands the way a renderer would apply them.
fn report(session: &mut ViewSession, commands: Vec<FocusCommand>) {
    for command in commands {
        match command {
            FocusCommand::Focus { id, origin } => {
                println!("[FOCUS] {id} ({})", origin_name(origin));
            }
            FocusCommand::Clear => println!("[FOCUS] cleared"),
            FocusCommand::ScrollListTo(id) => println!("[LIST] scroll to {id}"),
            FocusCommand::RecenterMap(id) => match session.recenter_on(id.as_str()) {
                Some(frame) => println!("[MAP] recenter on {id} at {} zoom {}", frame.center, frame.zoom),
                None => println!("[MAP] {id} is not in the collection"),
            },
        }
    }
}

fn origin_name(origin: FocusOrigin) -> &'static str {
    match origin {
        FocusOrigin::Scroll => "scroll",
        FocusOrigin::Explicit => "click",
        FocusOrigin::Programmatic => "programmatic",
    }
}

fn print_time(session: &ViewSession) {
    let range = session.time_range();
    println!("[TIME] {} (range {} to {})", session.now(), range.start, range.end);
}

fn print_markers(session: &ViewSession) {
    for marker in session.snapshot().markers {
        let flag = if marker.is_active { " *" } else { "" };
        println!("  {:<10} {}{flag}  {}", marker.state.name(), marker.id, marker.popup);
    }
}

fn print_status(session: &ViewSession) {
    let snapshot = session.snapshot();
    println!("[STATUS]");
    println!("  Collection: {}", session.collection().name());
    println!("  Stories: {} ({} visible)", session.collection().len(), snapshot.visible.len());
    println!("  Now: {}", snapshot.now);
    println!(
        "  Active: {}",
        snapshot.active.as_ref().map(|id| id.as_str()).unwrap_or("none")
    );
    println!("  Focus phase: {:?}", session.focus().phase());
    println!("  Frame: {} zoom {}", snapshot.frame.center, snapshot.frame.zoom);
    println!("  Camera zoom: {}", session.camera_zoom());
    print_markers(session);
}

fn print_help() {
    println!("Commands:");
    println!("  #at <date>      - Move the time control (1938 or 1938-11-09)");
    println!("  #click <id>     - Click a marker or list entry");
    println!("  #open <id>      - View the full story (programmatic focus)");
    println!("  #scroll <id>    - Report the list resting on an entry");
    println!("  #wait <ms>      - Let time pass");
    println!("  #done           - Acknowledge the last focus change");
    println!("  #zoom <level>   - Report a user zoom");
    println!("  #load [name]    - Load a collection (default storymap.json)");
    println!("  #status         - Show session status");
    println!("  #snapshot       - Print the render snapshot as JSON");
    println!("  #story <id>     - Print one story as JSON");
    println!("  #help           - Show this help");
    println!("  #quit           - Exit");
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
