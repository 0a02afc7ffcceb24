use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::info;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

use voicelive_assistant::{
    AssistantConfig, AssistantSession, RealtimeClient,
    config::{ConfigStore, MemoryStore, YamlFileStore},
    core::{audio, drive_cycle, realtime::redact_api_key, tools::car_tools},
    routes,
    state::AppState,
    utils::{is_valid_phone_number, normalize_phone_number},
};

/// Voice Live car assistant
#[derive(Parser, Debug)]
#[command(name = "voicelive-assistant")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a headless assistant session
    Connect {
        /// File remembering the endpoint and API key between runs
        #[arg(long = "settings", value_name = "FILE")]
        settings: Option<PathBuf>,

        /// WAV file streamed as microphone input after connecting
        #[arg(long = "audio", value_name = "WAV")]
        audio: Option<PathBuf>,
    },

    /// Print the connection URL
    Url {
        /// Print the API key instead of masking it
        #[arg(long = "show-key")]
        show_key: bool,
    },

    /// Run the mock payment API
    Serve,

    /// Normalize a phone number
    Phone {
        /// Number in any common format
        number: String,
    },

    /// Print one drive cycle
    DriveCycle {
        /// Seconds between printed rows
        #[arg(long = "step", default_value_t = 60)]
        step: u64,
    },

    /// Print the advertised tool catalog as JSON
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize crypto provider for wss:// connections
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        info!("Loading configuration from {}", config_path.display());
        AssistantConfig::from_file(config_path)?
    } else {
        AssistantConfig::from_env()?
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Connect { settings, audio } => {
            run_session(config, settings.as_deref(), audio.as_deref()).await
        }
        Commands::Url { show_key } => {
            let url = RealtimeClient::new(config.realtime_config()).url();
            if show_key {
                println!("{url}");
            } else {
                println!("{}", redact_api_key(&url));
            }
            Ok(())
        }
        Commands::Serve => serve(config).await,
        Commands::Phone { number } => {
            match normalize_phone_number(&number) {
                Some(normalized) => println!("{normalized}"),
                None => anyhow::bail!("Invalid phone number format: {number:?}"),
            }
            if !is_valid_phone_number(&number) {
                tracing::warn!("{:?} is longer than 15 characters", number);
            }
            Ok(())
        }
        Commands::DriveCycle { step } => {
            print_drive_cycle(step.max(1));
            Ok(())
        }
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&car_tools())?);
            Ok(())
        }
    }
}

async fn serve(config: AssistantConfig) -> anyhow::Result<()> {
    let address = config.address();
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    let app = routes::create_app(AppState::new(config));

    println!("Payment API listening on http://{}", socket_addr);

    let listener = TcpListener::bind(&socket_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

async fn run_session(
    mut config: AssistantConfig,
    settings: Option<&Path>,
    audio_path: Option<&Path>,
) -> anyhow::Result<()> {
    let store: Box<dyn ConfigStore> = match settings {
        Some(path) => Box::new(YamlFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };

    // Saved values only fill in what the environment and YAML leave out
    if config.require_credentials().is_err() {
        if let Some(stored) = store.load().await? {
            config.apply_stored(stored);
        }
    }
    config.require_credentials()?;
    store.save(&config.stored_settings()).await?;

    let samples = audio_path.map(audio::load_wav).transpose()?;

    let mut client = RealtimeClient::new(config.realtime_config());
    info!("Connecting to {}", redact_api_key(&client.url()));

    let session = AssistantSession::new();
    session.attach(&client);
    client.connect().await?;

    let sender = client.sender();
    if let Some(samples) = samples {
        let audio_sender = sender.clone();
        tokio::spawn(async move {
            audio::stream_pcm16(&audio_sender, &samples).await;
        });
    }

    println!("Connected. Type a message, or /status, /metrics, /reset, /quit.");

    let started = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.tick(started.elapsed().as_secs());
                if !sender.is_open() {
                    println!("Connection closed.");
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" => {}
                    "/quit" => break,
                    "/status" => {
                        println!("{}", serde_json::to_string_pretty(&session.vehicle())?);
                    }
                    "/metrics" => {
                        let metrics = session.metrics();
                        println!("{}", serde_json::to_string_pretty(&metrics.snapshot())?);
                        println!("{}", metrics.calculator_url(&config.realtime.model));
                    }
                    "/reset" => session.reset(),
                    text => {
                        session.send_user_text(&sender, text);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.disconnect().await;

    let metrics = session.metrics();
    info!(
        "Session finished after {} turns ({}s)",
        metrics.turns(),
        started.elapsed().as_secs()
    );
    Ok(())
}

fn print_drive_cycle(step: u64) {
    println!("{:>6} {:>6} {:>8}", "t(s)", "km/h", "drain");
    for t in (0..drive_cycle::CYCLE_DURATION).step_by(step as usize) {
        let speed = drive_cycle::speed_at(t);
        println!(
            "{:>6} {:>6} {:>8.4}",
            t,
            speed,
            drive_cycle::battery_consumption(speed)
        );
    }
}
