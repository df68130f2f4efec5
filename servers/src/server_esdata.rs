use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::runtime::Handle;
use tokio::signal;

use lib_esdata::{DispatchOutcome, Relay};

mod esdata_logic;
use esdata_logic::{config, host_feed, logger};

async fn shutdown_signal() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut term_signal) => {
                        term_signal.recv().await;
                        log::info!("SIGTERM received, initiating shutdown.");
                    }
                    Err(e) => {
                        log::warn!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                // On non-unix platforms, just wait forever.
                std::future::pending::<()>().await;
            }
        } => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config();
    logger::setup_logging(&config.log_dir(), config.log_level())?;

    let mut relay = Relay::with_http(config.relay_config(), Handle::current())?;
    let mut host = host_feed::ReplayHost::default();
    let mut lines = host_feed::open_input(config.input.as_deref()).await?.lines();
    let mut input_open = true;
    let mut hold_until: Option<Instant> = None;

    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_ms()));
    let mut counter: u64 = 0;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let feed_ready = input_open && hold_until.is_none_or(|until| Instant::now() >= until);
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                counter += 1;
                relay.on_timer(counter, &host);
            }
            line = lines.next_line(), if feed_ready => match line {
                Ok(Some(line)) => match host_feed::parse_line(&line) {
                    Ok(Some(event)) => {
                        hold_until = host.apply(event, &mut relay).map(|d| Instant::now() + d);
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("Skipping malformed host event: {}", e),
                },
                Ok(None) => {
                    log::info!("Host feed closed, relay keeps running until shutdown.");
                    input_open = false;
                }
                Err(e) => {
                    log::error!("Failed to read host feed: {}", e);
                    input_open = false;
                }
            },
        }
    }

    // Last chance for whatever is pending while still live.
    if relay.is_enabled() {
        match relay.flush().await {
            Ok(DispatchOutcome::Sent { entities, bytes }) => {
                log::info!("Final post: {} entities ({} bytes)", entities, bytes);
            }
            Ok(DispatchOutcome::Empty) => {}
            Err(e) => log::warn!("Final post failed: {}", e),
        }
    }

    log::info!("Shutdown complete.");
    Ok(())
}
