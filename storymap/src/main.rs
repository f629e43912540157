//! Story map terminal driver.
//!
//! Loads a story collection and drives a view session from a simple
//! line-oriented protocol on stdin, printing the commands a map and list
//! renderer would receive.
//!
//! ```bash
//! cargo run -p storymap -- --data-dir data --collection storymap --at 1938-11-09
//! ```
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

mod headless;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let options = match headless::parse_options_from_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    headless::run_headless(options).await.map_err(|e| e.into())
}

fn print_help() {
    println!("Story map terminal driver");
    println!();
    println!("USAGE:");
    println!("  storymap [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --data-dir <dir>      Directory holding collection files (env: STORYMAP_DATA_DIR, default: data)");
    println!("  --config <file>       TOML view configuration (env: STORYMAP_CONFIG)");
    println!("  --collection <name>   Collection to open (default: storymap.json)");
    println!("  --at <date>           Initial time control position, e.g. 1938 or 1938-11-09");
    println!("  -h, --help            Show this help");
    println!();
    println!("Type #help once running for the command list.");
}
