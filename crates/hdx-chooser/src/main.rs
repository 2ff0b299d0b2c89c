//! hdx-chooser - pick a resource from the HDX catalog in a terminal
//!
//! In hand-off mode (`--handoff`) the screen goes to stderr and the chosen
//! resource is written to stdout as one JSON line, so a parent process can
//! read it. Closing without a choice writes nothing.

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hdx_chooser::{
    config::Args,
    handoff,
    terminal::{self, Command},
    CachedCatalog, HandoffMode, NavigationEvent, NavigationService,
};
use hdx_client::CatalogClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Logs go to stderr; stdout carries the screen or the hand-off payload
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("hdx_chooser={0},hdx_client={0},warn", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!(catalog = %args.catalog_url, handoff = args.handoff, "Starting chooser");

    let client = CatalogClient::new(args.catalog_config())?;
    let catalog = CachedCatalog::with_timeout(Arc::new(client), args.call_timeout());

    let (mode, receiver) = if args.handoff {
        let (sender, receiver) = handoff::channel();
        (HandoffMode::Opener(sender), Some(receiver))
    } else {
        (HandoffMode::Standalone, None)
    };
    let handoff_mode = receiver.is_some();

    let (service, mut events) = NavigationService::new(catalog, mode);
    let service = Arc::new(service);

    let show = move |text: &str| {
        if handoff_mode {
            eprintln!("{}", text);
        } else {
            println!("{}", text);
        }
    };

    let start = args.token.clone().unwrap_or_default();
    spawn_restore(&service, start);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(NavigationEvent::Render(render)) => {
                        show(&terminal::format_render(&render));
                    }
                    Some(NavigationEvent::Notice { level, message }) => {
                        show(&terminal::format_notice(level, &message));
                    }
                    Some(NavigationEvent::OpenUrl(url)) => {
                        show(&format!("Open: {}", url));
                    }
                    Some(NavigationEvent::Closed(reason)) => {
                        debug!(?reason, "Session closed");
                        break;
                    }
                    None => break,
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => dispatch(&service, &line, &show),
                    Ok(None) => {
                        stdin_open = false;
                        service.cancel();
                    }
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        stdin_open = false;
                        service.cancel();
                    }
                }
            }
        }
    }

    let stats = service.catalog().stats();
    debug!(
        entries = stats.entries,
        hits = stats.hits,
        misses = stats.misses,
        coalesced = stats.coalesced,
        network_calls = stats.network_calls,
        "Cache statistics"
    );

    if let Some(receiver) = receiver {
        if let Some(resource) = receiver.wait().await {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer(&mut stdout, &resource)?;
            writeln!(stdout)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn spawn_restore(service: &Arc<NavigationService>, token: String) {
    let service = Arc::clone(service);
    tokio::spawn(async move {
        // Failures already reached the screen as notices
        let _ = service.restore(&token).await;
    });
}

fn dispatch(service: &Arc<NavigationService>, line: &str, show: &impl Fn(&str)) {
    let Some(command) = terminal::parse_command(line) else {
        return;
    };

    match command {
        Command::Select(index) => {
            let service = Arc::clone(service);
            tokio::spawn(async move {
                let _ = service.select(index).await;
            });
        }
        Command::Search(query) => {
            let service = Arc::clone(service);
            tokio::spawn(async move {
                let _ = service.search(&query).await;
            });
        }
        Command::Restore(token) => spawn_restore(service, token),
        Command::Up => {
            let service = Arc::clone(service);
            tokio::spawn(async move {
                let _ = service.up().await;
            });
        }
        Command::Help => show(terminal::HELP),
        Command::Cancel => service.cancel(),
        Command::Unknown(input) => show(&format!("Unknown command \"{}\" (? for help)", input)),
    }
}
