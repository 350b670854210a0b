use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inspector_bridge::graph::LiveValue;
use inspector_bridge::host::{MockComponent, MockStore, StoreRef};
use inspector_bridge::inspector::{self, InspectorConfig, InspectorState};
use inspector_bridge::{
    util, BridgeConfig, HostEvent, ObservationHooks, PageDescriptor, Versions, WebSocketTransport,
};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "inspector-bridge")]
#[command(author, version, about = "Stream UI component and store snapshots to an inspector", long_about = None)]
struct Cli {
    /// Data directory (default: ~/.inspector-bridge)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a minimal inspector and print every received frame as JSON
    Listen {
        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "9229")]
        port: u16,
    },

    /// Drive a mock application through the bridge
    Demo {
        /// Inspector WebSocket URL (overrides config and environment)
        #[arg(long)]
        url: Option<String>,

        /// Config file to load instead of the default
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Number of simulated interactions
        #[arg(long, default_value = "5")]
        rounds: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);

    match cli.command {
        Commands::Listen { host, port } => {
            init_stderr_logging();
            listen(InspectorConfig { host, port }).await
        }
        Commands::Demo {
            url,
            config,
            rounds,
        } => {
            init_file_logging()?;
            let mut config = match config {
                Some(path) => BridgeConfig::load_from(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => BridgeConfig::load(),
            };
            if let Some(url) = url {
                config = config.with_inspector_url(url);
                config.validate()?;
            }
            demo(config, rounds).await
        }
    }
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize logging to file (~/.inspector-bridge/logs/inspector-bridge.log)
fn init_file_logging() -> Result<()> {
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

async fn listen(config: InspectorConfig) -> Result<()> {
    let state = InspectorState::new();
    let mut frames = state.subscribe();

    tokio::spawn(async move {
        loop {
            match frames.recv().await {
                Ok(frame) => match serde_json::to_string(&frame) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!("Failed to serialize frame: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Output fell behind; frames dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    inspector::run_server(state, config).await
}

async fn demo(config: BridgeConfig, rounds: u32) -> Result<()> {
    println!("Streaming mock application to {}", config.inspector_url);

    let transport = Arc::new(WebSocketTransport::new(
        config.inspector_url.clone(),
        config.transport.reconnect_delay,
    ));
    let hooks = ObservationHooks::new(&config, transport, Versions::new().with("host", "mock"));
    hooks.listen()?;
    hooks.launch();

    let store = MockStore::new()
        .with_state("count", 0)
        .with_state("user", LiveValue::object([("name", "guest")]))
        .into_ref();
    let shared: StoreRef = store.clone();

    let counter = MockComponent::component(
        "counter",
        Some(PageDescriptor::new("1", "pages/index/main", 0)),
    )
    .with_prop("step", 1)
    .into_ref();
    let index = MockComponent::page("pages/index/main", "1", 0)
        .with_data("title", "Home")
        .with_child(counter.clone())
        .with_store(shared.clone());
    let index_data = index.data_handle();
    let index = index.into_ref();

    hooks.load(&index);
    hooks.mounted(&index);

    let detail = MockComponent::page("pages/detail/main", "2", 1)
        .with_data("id", 42)
        .with_store(shared)
        .into_ref();
    hooks.load(&detail);
    hooks.mounted(&detail);

    for round in 1..=rounds {
        tokio::time::sleep(Duration::from_millis(500)).await;

        hooks.event(&HostEvent::element(
            counter.clone(),
            Some("button".into()),
            "tap",
            LiveValue::object([("round", i64::from(round))]),
        ));
        store.commit("increment", "count", i64::from(round));
        index_data.borrow_mut().insert("title", format!("Home #{}", round));
        hooks.updated(&index);

        let answered = hooks.process_requests();
        if answered > 0 {
            tracing::info!(answered, "Answered inspector requests");
        }
    }

    hooks.before_destroy(&detail);
    tokio::time::sleep(Duration::from_millis(500)).await;
    hooks.process_requests();

    println!("Demo finished after {} rounds", rounds);
    Ok(())
}
