//! Lurk — watches a remote discussion thread and notifies subscribers of new
//! posts and milestone crossings.
//!
//! The core watch loop lives in the library crate; this binary is the thin
//! command layer over it plus process bootstrap (config, signal handling).

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use lurk::channel::console::ConsoleNotifier;
use lurk::channel::discord::DiscordNotifier;
use lurk::config::LurkConfig;
use lurk::dispatch::Notifier;
use lurk::fetch::http::HttpFetcher;
use lurk::store::WatchStore;
use lurk::watch::Watcher;

/// Lurk — track a thread, notify subscribers of new posts and milestones.
#[derive(Parser)]
#[command(name = "lurk", version, about)]
struct Cli {
    /// Working directory (defaults to current directory).
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    /// Explicit path to config file (defaults to .lurk/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the watch loop, polling on the configured interval.
    Run,

    /// Run a single poll cycle and exit.
    Once,

    /// Start tracking a thread by URL (replaces any current watch).
    Track {
        /// Thread URL, e.g. https://boards.4chan.org/g/thread/123456
        thread_url: String,
    },

    /// Stop tracking the current thread.
    Untrack,

    /// Add a recipient to the direct-delivery list.
    AddUser {
        /// Recipient identifier (Discord user ID).
        id: String,
    },

    /// Remove a recipient from the direct-delivery list.
    RemoveUser {
        /// Recipient identifier (Discord user ID).
        id: String,
    },

    /// Add a channel to the broadcast list.
    AddChannel {
        /// Channel identifier (Discord channel ID).
        id: String,
    },

    /// Remove a channel from the broadcast list.
    RemoveChannel {
        /// Channel identifier (Discord channel ID).
        id: String,
    },

    /// Show watch status and recipient counts.
    Status,

    /// Re-send the last dispatched notification (daemon session cache).
    Repost,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let cwd = match &cli.dir {
        Some(d) => d.clone(),
        None => std::env::current_dir().wrap_err("failed to get current directory")?,
    };
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cwd.join(".lurk/config.toml"));
    let config = LurkConfig::load(&config_path)?;

    let mut watcher = build_watcher(&cwd, &config);

    match cli.command {
        Command::Run => cmd_run(&mut watcher, &config).await,
        Command::Once => watcher.tick().await,
        Command::Track { thread_url } => {
            let (board, thread_id) = parse_thread_url(&thread_url)?;
            watcher.track(&board, &thread_id).await?;
            println!("Started tracking /{board}/ thread {thread_id}.");
            Ok(())
        }
        Command::Untrack => {
            if watcher.untrack()? {
                println!("Stopped tracking the current thread.");
            } else {
                println!("No thread is being tracked.");
            }
            Ok(())
        }
        Command::AddUser { id } => {
            if watcher.add_user(&id)? {
                println!("Added {id} to the DM list.");
            } else {
                println!("{id} is already on the DM list.");
            }
            Ok(())
        }
        Command::RemoveUser { id } => {
            if watcher.remove_user(&id)? {
                println!("Removed {id} from the DM list.");
            } else {
                println!("{id} is not on the DM list.");
            }
            Ok(())
        }
        Command::AddChannel { id } => {
            if watcher.add_channel(&id)? {
                println!("Added channel {id} to the update list.");
            } else {
                println!("Channel {id} is already on the update list.");
            }
            Ok(())
        }
        Command::RemoveChannel { id } => {
            if watcher.remove_channel(&id)? {
                println!("Removed channel {id} from the update list.");
            } else {
                println!("Channel {id} is not on the update list.");
            }
            Ok(())
        }
        Command::Status => cmd_status(&watcher),
        Command::Repost => {
            if watcher.repost().await {
                println!("Reposted the last notification.");
            } else {
                println!("No notification cached in this session.");
            }
            Ok(())
        }
    }
}

/// Assemble the watcher from config: store, HTTP fetcher, delivery channel.
fn build_watcher(cwd: &Path, config: &LurkConfig) -> Watcher {
    let store = WatchStore::load(cwd);
    let fetcher = HttpFetcher::new(config.api_base.clone(), config.media_base.clone());

    let notifier: Box<dyn Notifier> = match &config.discord {
        Some(discord) => Box::new(DiscordNotifier::new(discord.bot_token.clone())),
        None => {
            eprintln!("[daemon] no [discord] config — notifications go to stdout as JSONL");
            Box::new(ConsoleNotifier)
        }
    };

    Watcher::new(store, Box::new(fetcher), notifier)
}

/// Run the watch loop until SIGINT/SIGTERM.
async fn cmd_run(watcher: &mut Watcher, config: &LurkConfig) -> Result<()> {
    let cancel = CancellationToken::new();

    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        eprintln!("\n[daemon] shutdown signal received");
        shutdown_cancel.cancel();
    });

    eprintln!(
        "[daemon] polling every {}s",
        config.poll_interval_secs
    );
    watcher
        .run(
            std::time::Duration::from_secs(config.poll_interval_secs),
            cancel,
        )
        .await
}

/// Show watch status and recipient counts.
fn cmd_status(watcher: &Watcher) -> Result<()> {
    let status = watcher.status();
    if status.is_tracking {
        println!(
            "Tracking /{}/ thread {} — {} posts seen, cursor at {}.",
            status.board.unwrap_or_default(),
            status.thread_id.unwrap_or_default(),
            status.post_count,
            status
                .last_seen
                .map(|n| n.to_string())
                .unwrap_or_else(|| "none".to_string()),
        );
    } else {
        println!("Not tracking any thread.");
    }

    let recipients = watcher.store().recipients();
    println!(
        "Recipients: {} direct, {} channel(s).",
        recipients.direct_recipients.len(),
        recipients.broadcast_channels.len()
    );
    Ok(())
}

/// Extract `(board, thread_id)` from a pasted thread URL.
///
/// Accepts any URL shaped like `…/{board}/thread/{id}[.json][#fragment]`.
fn parse_thread_url(url: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = url.trim_end_matches('/').split('/').collect();
    let pos = parts
        .iter()
        .position(|p| *p == "thread")
        .ok_or_else(|| color_eyre::eyre::eyre!("not a thread URL: {url}"))?;

    if pos == 0 || pos + 1 >= parts.len() {
        color_eyre::eyre::bail!("not a thread URL: {url}");
    }

    let board = parts[pos - 1];
    let thread_id: &str = parts[pos + 1]
        .split(['#', '?', '.'])
        .next()
        .unwrap_or_default();

    if board.is_empty() || thread_id.is_empty() || !thread_id.chars().all(|c| c.is_ascii_digit()) {
        color_eyre::eyre::bail!("not a thread URL: {url}");
    }

    Ok((board.to_string(), thread_id.to_string()))
}
