use anyhow::Result;
use async_channel::Receiver;
use clap::{Parser, Subcommand};
use mail_scanner::core::config::ScanConfig;
use mail_scanner::core::events::{EventBus, RunMode, ScanEvent};
use mail_scanner::core::models::format_sender;
use mail_scanner::infrastructure::auth::EnvTokenProvider;
use mail_scanner::infrastructure::gmail::{GmailClient, MailClient};
use mail_scanner::infrastructure::logging::init_logging;
use mail_scanner::infrastructure::notification::{DesktopNotifier, NotificationSink};
use mail_scanner::services::scan::Scheduler;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "mail-scanner")]
#[command(about = "Scans mailbox attachments for a keyword", long_about = None)]
struct Cli {
    /// Keyword to search for inside attachment content
    #[arg(short, long)]
    keyword: Option<String>,

    /// Search emails from the last N days
    #[arg(long)]
    days: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the mailbox continuously at the configured interval
    Monitor {
        /// Seconds between scans
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Run a single scan and print the matches
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging("mail-scanner")?;

    let (events, rx) = EventBus::new();
    let tokens = Arc::new(EnvTokenProvider::new());
    let client: Arc<dyn MailClient> = Arc::new(GmailClient::new(tokens));
    let notifier: Arc<dyn NotificationSink> = Arc::new(DesktopNotifier::new());
    let scheduler = Arc::new(Scheduler::new(client, notifier, events));

    match cli.command {
        Command::Monitor { interval } => {
            let config = ScanConfig::resolve(cli.keyword, cli.days, interval)?;
            info!("Starting mail-scanner in monitoring mode");

            let consumer = tokio::spawn(consume_events(rx));
            scheduler.start_monitoring(config);

            tokio::signal::ctrl_c().await?;
            scheduler.stop_monitoring().await;
            consumer.abort();
        }
        Command::Check => {
            let config = ScanConfig::resolve(cli.keyword, cli.days, None)?;
            info!("Starting mail-scanner one-shot check");

            scheduler.check_now(config);

            // Drain events until the manual run reports completion.
            while let Ok(event) = rx.recv().await {
                match event {
                    ScanEvent::Progress(value) => debug!("Progress: {}%", value),
                    ScanEvent::RunFinished {
                        mode: RunMode::Manual,
                    } => break,
                    _ => {}
                }
            }

            let matched = scheduler.matched_emails();
            info!("Matched emails: {}", matched.len());
            for email in matched {
                info!(
                    "[{}] {} | {} | matched: {}",
                    email.timestamp,
                    format_sender(&email.sender),
                    email.subject,
                    email.matched_filenames.join(", ")
                );
            }
        }
    }

    Ok(())
}

/// Single presentation-side consumer of the worker event queue. Log events
/// are already mirrored to tracing by the bus, so only the structural events
/// are reported here.
async fn consume_events(rx: Receiver<ScanEvent>) {
    while let Ok(event) = rx.recv().await {
        match event {
            ScanEvent::MatchesUpdated { new_matches, total } => {
                info!("Matched emails updated: {} new, {} total", new_matches, total);
            }
            ScanEvent::IntervalProgress(value) => {
                debug!("Interval progress: {}%", value);
            }
            ScanEvent::Progress(value) => {
                debug!("Scan progress: {}%", value);
            }
            ScanEvent::Log { .. } | ScanEvent::RunFinished { .. } => {}
        }
    }
}
