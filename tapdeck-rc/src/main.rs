//! tapdeck Remote Control - Main entry point
//!
//! Headless remote for an out-of-process playback engine: attaches over
//! HTTP, mirrors playback position and queue state, and relays transport
//! commands typed on stdin.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tapdeck_rc::config::{Config, DEFAULT_RENDER_WIDTH};
use tapdeck_rc::control::input::{DragEvent, InputPulse, InputSource, ScrollState, SeekDirection, TapControl};
use tapdeck_rc::controller::{ControlInput, Controller};
use tapdeck_rc::remote::lifecycle::EngineLink;
use tapdeck_rc::render::TraceRender;

/// Command-line arguments for tapdeck-rc
#[derive(Parser, Debug)]
#[command(name = "tapdeck-rc")]
#[command(about = "Remote control for the tapdeck playback engine")]
#[command(version)]
struct Args {
    /// Base URL of the playback engine
    #[arg(short, long, env = "TAPDECK_ENGINE_URL")]
    engine_url: Option<String>,

    /// Progress bar width in pixels, used to pace smooth refreshes
    #[arg(short = 'w', long, default_value_t = DEFAULT_RENDER_WIDTH, env = "TAPDECK_RENDER_WIDTH")]
    render_width: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tapdeck_rc=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = Config::resolve(args.engine_url.as_deref(), args.render_width)
        .context("Failed to resolve configuration")?;

    info!(engine_url = %config.engine_url, "Starting tapdeck remote control");

    let link = EngineLink::connect(&config)
        .await
        .context("Failed to attach to playback engine")?;

    let controller = Controller::attach(&link, &config, TraceRender)
        .await
        .context("Failed to build view state, closing")?;

    let (input_tx, input_rx) = mpsc::channel(16);
    let notices = link.subscribe();

    let reader = tokio::spawn(read_commands(input_tx));

    tokio::select! {
        result = controller.run(input_rx, notices) => {
            result.context("Controller error")?;
            info!("Input closed, shutting down");
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    reader.abort();
    Ok(())
}

/// Map stdin lines onto control inputs
///
/// Commands: `p` play/pause, `n` next, `b` prev, `s` shuffle, `r` repeat,
/// `seek <0..1>`, `ff <hold-ms>` / `rw <hold-ms>` scan, `page <n>`, `q` quit.
async fn read_commands(tx: mpsc::Sender<ControlInput>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let mut parts = line.split_whitespace();
        let inputs: Vec<ControlInput> = match (parts.next(), parts.next()) {
            (Some("p"), _) => vec![ControlInput::Tap(TapControl::PlayPause)],
            (Some("n"), _) => vec![ControlInput::Tap(TapControl::Next)],
            (Some("b"), _) => vec![ControlInput::Tap(TapControl::Prev)],
            (Some("s"), _) => vec![ControlInput::Tap(TapControl::Shuffle)],
            (Some("r"), _) => vec![ControlInput::Tap(TapControl::Repeat)],
            (Some("seek"), Some(ratio)) => match ratio.parse::<f64>() {
                Ok(ratio) if (0.0..=1.0).contains(&ratio) => vec![
                    ControlInput::DragStarted,
                    ControlInput::Drag(DragEvent {
                        ratio,
                        from_user: true,
                    }),
                    ControlInput::DragReleased,
                ],
                _ => {
                    warn!(line = %line, "seek expects a ratio in [0, 1]");
                    continue;
                }
            },
            (Some(cmd @ ("ff" | "rw")), Some(hold)) => match hold.parse::<i64>() {
                Ok(hold_ms) if hold_ms > 0 => {
                    let direction = if cmd == "ff" {
                        SeekDirection::Forward
                    } else {
                        SeekDirection::Backward
                    };
                    vec![
                        ControlInput::Pulse(InputPulse {
                            source: InputSource::Dpad,
                            direction,
                            repeat: 0,
                            elapsed_ms: 0,
                        }),
                        ControlInput::Pulse(InputPulse {
                            source: InputSource::Dpad,
                            direction,
                            repeat: 1,
                            elapsed_ms: hold_ms,
                        }),
                        ControlInput::Pulse(InputPulse {
                            source: InputSource::Dpad,
                            direction,
                            repeat: -1,
                            elapsed_ms: hold_ms,
                        }),
                    ]
                }
                _ => {
                    warn!(line = %line, "scan expects a positive hold time in ms");
                    continue;
                }
            },
            (Some("page"), Some(page)) => match page.parse::<usize>() {
                Ok(page) => vec![
                    ControlInput::PagerScroll(ScrollState::Dragging),
                    ControlInput::PagerPage(page),
                    ControlInput::PagerScroll(ScrollState::Idle),
                ],
                Err(_) => {
                    warn!(line = %line, "page expects an index");
                    continue;
                }
            },
            (Some("q"), _) => break,
            (None, _) => continue,
            _ => {
                warn!(line = %line, "Unknown command");
                continue;
            }
        };

        for input in inputs {
            if tx.send(input).await.is_err() {
                return;
            }
        }
    }
    // Dropping the sender tears the controller down
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
