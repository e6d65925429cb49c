use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use duet_client::{
    CallEngine, CallHandle, ClientConfig, ClientEvent, Collaborators, MediaConstraints,
    RtcPeerLinkProvider, Severity, SyntheticMediaProvider, WsSignalTransport,
};
use duet_core::RoomId;
use duet_server::RelayConfig;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duet", version, about = "Two-party call relay and headless client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Relay {
        /// Address to bind. Defaults to DUET_HOST (also read from .env) or 0.0.0.0.
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port to bind. Defaults to DUET_PORT, PORT or 4000.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Join a room as a headless client with synthetic media.
    Call {
        #[arg(long, default_value = "ws://localhost:4000/ws")]
        relay_url: String,

        /// Eight-digit room id. A new one is generated when omitted.
        #[arg(short, long)]
        room: Option<String>,

        #[arg(long)]
        no_video: bool,

        #[arg(long)]
        no_audio: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command {
        Commands::Relay { host, port } => run_relay(host, port).await,
        Commands::Call {
            relay_url,
            room,
            no_video,
            no_audio,
        } => {
            let config = ClientConfig {
                relay_url,
                media: MediaConstraints {
                    audio: !no_audio,
                    video: !no_video,
                },
                ..Default::default()
            };
            let room = room
                .map(|r| RoomId::parse(&r))
                .transpose()
                .context("Invalid room id")?;
            run_call(config, room).await
        }
    }
}

async fn run_relay(host: Option<IpAddr>, port: Option<u16>) -> Result<()> {
    let mut config = RelayConfig::from_env().context("Invalid relay configuration")?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    println!(
        "{} {}",
        "Duet relay on".green().bold(),
        format!("ws://{}/ws", config.socket_addr()).cyan()
    );
    duet_server::run(config)
        .await
        .context("Relay stopped unexpectedly")
}

async fn run_call(config: ClientConfig, room: Option<RoomId>) -> Result<()> {
    info!("Using relay {}", config.relay_url);
    let collaborators = Collaborators {
        media: Arc::new(SyntheticMediaProvider::default()),
        links: Arc::new(RtcPeerLinkProvider),
        transport: Arc::new(WsSignalTransport::from_config(&config)),
    };
    let (handle, mut events) = CallEngine::spawn(config, collaborators);

    let room_id = handle
        .initialize(room)
        .await
        .context("Failed to start the call")?;
    println!("{} {}", "Room:".bold(), room_id.as_str().yellow().bold());
    println!(
        "{}",
        "Type to chat. Commands: /audio /video /camera /health /quit".dimmed()
    );

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let closed = matches!(
                    event,
                    ClientEvent::StateChanged { to: duet_client::NegotiationState::Closed, .. }
                );
                print_event(&event);
                if closed {
                    break;
                }
            }

            line = stdin.next_line() => {
                match line? {
                    Some(line) => {
                        if !run_input(&handle, line.trim()).await? {
                            break;
                        }
                    }
                    None => break,
                }
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.end_call().await.ok();
    println!("{}", "Call ended".dimmed());
    Ok(())
}

/// Returns `false` when the user asked to quit.
async fn run_input(handle: &CallHandle, line: &str) -> Result<bool> {
    let outcome = match line {
        "" => return Ok(true),
        "/quit" => return Ok(false),
        "/audio" => handle
            .toggle_audio()
            .await
            .map(|on| format!("audio {}", on_off(on))),
        "/video" => handle
            .toggle_video()
            .await
            .map(|on| format!("video {}", on_off(on))),
        "/camera" => handle
            .switch_camera()
            .await
            .map(|device| format!("camera {device}")),
        "/health" => handle.health().await.map(|report| {
            if report.is_healthy() {
                "healthy".to_owned()
            } else {
                report
                    .issues
                    .iter()
                    .map(|i| i.code())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }),
        text => handle
            .send_chat(serde_json::Value::String(text.to_owned()))
            .await
            .map(|()| String::new()),
    };

    match outcome {
        Ok(message) if message.is_empty() => {}
        Ok(message) => println!("{}", message.cyan()),
        Err(e) => println!("{} {}", "✗".red(), e),
    }
    Ok(true)
}

fn print_event(event: &ClientEvent) {
    match event {
        ClientEvent::Initialized { room_id } => {
            println!("{} {}", "initialized".dimmed(), room_id)
        }
        ClientEvent::LocalMediaReady { audio, video } => println!(
            "{} audio {}, video {}",
            "local media ready:".green(),
            on_off(*audio),
            on_off(*video)
        ),
        ClientEvent::RemoteStreamConnected => println!("{}", "peer media connected".green().bold()),
        ClientEvent::PeerLeft => println!("{}", "peer left, waiting for someone new".yellow()),
        ClientEvent::Reconnecting { attempt } => {
            println!("{} attempt {}", "reconnecting to relay,".yellow(), attempt)
        }
        ClientEvent::Error { kind, message } => {
            println!("{} {:?}: {}", "error".red().bold(), kind, message)
        }
        ClientEvent::AudioToggled { enabled } => println!("audio {}", on_off(*enabled)),
        ClientEvent::VideoToggled { enabled } => println!("video {}", on_off(*enabled)),
        ClientEvent::StateChanged { from, to } => {
            println!("{} {} → {}", "state".dimmed(), from, to.to_string().bold())
        }
        ClientEvent::ChatReceived { message } => match message.as_str() {
            Some(text) => println!("{} {}", "peer:".magenta().bold(), text),
            None => println!("{} {}", "peer:".magenta().bold(), message),
        },
        ClientEvent::FileReceived { file_data } => {
            let name = file_data["name"].as_str().unwrap_or("unnamed");
            println!("{} {}", "file received:".magenta(), name)
        }
        ClientEvent::HealthDegraded { report } => {
            for issue in &report.issues {
                let line = format!("health: {issue}");
                match issue.severity() {
                    Severity::Warning => println!("{}", line.yellow()),
                    Severity::Error => println!("{}", line.red()),
                }
            }
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
