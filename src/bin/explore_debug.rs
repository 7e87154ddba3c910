//! Walk the local drives with the explorer core and print what it reports
//!
//! Usage:
//!   cargo run --features dev-bins --bin explore_debug -- /some/dir --back

use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use fresh_explorer::app::{Collaborators, Explorer};
use fresh_explorer::config::Config;
use fresh_explorer::config_io::{load_config, DirectoryContext};
use fresh_explorer::services::tracing_setup;
use std::path::PathBuf;
use std::time::Duration;

/// Drive the explorer core from the command line
#[derive(Parser, Debug)]
#[command(name = "explore_debug")]
#[command(about = "Navigate with the explorer core and print its events", long_about = None)]
#[command(version)]
struct Args {
    /// Directory to open (default: configured start path, then the first drive)
    #[arg(value_name = "DIR")]
    start: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to log file (default: the data directory)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Show hidden entries
    #[arg(long)]
    show_hidden: bool,

    /// Go up this many levels after opening
    #[arg(long, value_name = "N", default_value_t = 0)]
    up: usize,

    /// Go back once at the end
    #[arg(long)]
    back: bool,

    /// Keep running and report drive changes for this many seconds
    #[arg(long, value_name = "SECS")]
    watch_drives: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn load_effective_config(args: &Args, dirs: &DirectoryContext) -> AnyhowResult<Config> {
    let path = args.config.clone().unwrap_or_else(|| dirs.config_path());
    let mut config = load_config(&path)?;
    if args.show_hidden {
        config.explorer.show_hidden = true;
    }
    if let Some(start) = &args.start {
        let start = std::fs::canonicalize(start)
            .with_context(|| format!("Cannot open start directory {}", start.display()))?;
        config.explorer.start_path = Some(start);
    }
    Ok(config)
}

fn print_events(explorer: &Explorer) -> AnyhowResult<()> {
    for event in explorer.events().drain() {
        println!(
            "{}",
            serde_json::to_string(&event).context("Failed to serialize event")?
        );
    }
    Ok(())
}

async fn print_listing(explorer: &mut Explorer) -> AnyhowResult<()> {
    let listing = explorer
        .navigator_mut()
        .list_current()
        .await
        .context("Failed to list current directory")?;
    println!("# {}", listing.path.display());
    for (i, entry) in listing.entries.iter().enumerate() {
        let marker = if listing.selected == Some(i) { '>' } else { ' ' };
        println!("{} {:?}\t{}", marker, entry.kind, entry.name);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> AnyhowResult<()> {
    let args = Args::parse();
    let dirs = DirectoryContext::from_system().context("Failed to locate user directories")?;
    let config = load_effective_config(&args, &dirs)?;

    if args.dump_config {
        let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
        println!("{}", json);
        return Ok(());
    }

    let log_file = args.log_file.clone().unwrap_or_else(|| dirs.log_path());
    tracing_setup::init_global(&log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let collaborators = Collaborators::local(&config);
    let mut explorer = Explorer::new(config, collaborators);
    explorer.start().await.context("No drive could be opened")?;
    print_events(&explorer)?;
    print_listing(&mut explorer).await?;

    for _ in 0..args.up {
        if explorer.navigator_mut().up().await?.is_none() {
            break;
        }
    }
    if args.back {
        explorer.navigator_mut().back().await?;
    }
    print_events(&explorer)?;

    if let Some(secs) = args.watch_drives {
        let watcher = explorer.spawn_drive_watcher();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(secs);
        while tokio::time::Instant::now() < deadline {
            if explorer.wait_for_async_message(Duration::from_millis(250)).await {
                print_events(&explorer)?;
            }
        }
        if let Some(watcher) = watcher {
            watcher.abort();
        }
    }

    print_listing(&mut explorer).await
}
