//! Replay a recorded server event log and print the resulting snapshot.
//!
//! The log is JSON lines, one envelope per line:
//!
//! ```text
//! {"event": "roomJoined", "data": {"pk": "p1", "room": "R1"}}
//! {"event": "colorPlayed", "data": {"color": "red", "position": [5, 3]}}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use connectn_sync::config::SyncConfig;
use connectn_sync::logging::{self, LogFormat};
use connectn_sync::state::{channel, Dispatcher, Envelope};

#[derive(Parser, Debug)]
#[command(name = "connectn-replay")]
#[command(about = "Fold a recorded connect-N event log into a client snapshot")]
struct Cli {
    /// JSON-lines file of server envelopes
    events: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log format (text, json, pretty)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = SyncConfig::load_or_default(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    logging::init(&config.logging).context("Failed to initialize logging")?;

    let file = File::open(&cli.events)
        .with_context(|| format!("Failed to open event log '{}'", cli.events.display()))?;

    let (inbox, receiver) = channel(&config.dispatch);
    let events_path = cli.events.clone();

    let reader = thread::spawn(move || -> Result<usize> {
        let mut sent = 0;
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line
                .with_context(|| format!("Failed to read '{}'", events_path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            match Envelope::from_json(&line) {
                Ok(envelope) => {
                    inbox.send(envelope)?;
                    sent += 1;
                }
                Err(e) => warn!(line = index + 1, error = %e, "Skipping unparseable frame"),
            }
        }
        Ok(sent)
    });

    let mut dispatcher = Dispatcher::new(&config.dispatch);
    let summary = dispatcher.run(&receiver);

    let sent = reader
        .join()
        .map_err(|_| anyhow::anyhow!("Event reader thread panicked"))??;

    info!(
        sent,
        applied = summary.applied,
        ignored = summary.ignored,
        rejected = summary.rejected,
        "Replay finished"
    );

    let snapshot = dispatcher.snapshot();
    println!("{}", serde_json::to_string_pretty(&*snapshot)?);

    Ok(())
}
