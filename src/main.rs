use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use web_recorder::session::{format_elapsed, format_file_size};
use web_recorder::sim::{EncoderScript, SimulatedCapture, SimulatedEncoder};
use web_recorder::{
    create_router, AppState, AudioMode, Config, FileStore, RecordingSession, RecordingStore,
    SourceSelector,
};

#[derive(Parser)]
#[command(name = "web-recorder")]
#[command(about = "Screen, camera and tab recorder")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/web-recorder")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API
    Serve,

    /// Record for a fixed time and save the result
    Record {
        /// What to capture
        #[arg(short, long, value_enum, default_value = "screen")]
        source: SourceSelector,

        /// Which audio to include
        #[arg(short, long, value_enum, default_value = "both")]
        audio: AudioMode,

        /// Recording time in seconds, pauses excluded
        #[arg(long, default_value = "5")]
        seconds: u64,

        /// Pause for one second after this many seconds
        #[arg(long)]
        pause_after: Option<u64>,
    },

    /// List stored recordings, most recent first
    List,

    /// Delete a stored recording
    Delete {
        id: Uuid,
    },

    /// Report which preferred formats the encoder supports
    Probe,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Web Recorder v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let store: Arc<dyn RecordingStore> = Arc::new(
        FileStore::open(&cfg.store.path, cfg.store.capacity)
            .with_context(|| format!("opening store at {}", cfg.store.path.display()))?,
    );

    match cli.command {
        Command::Serve => serve(cfg, store).await,
        Command::Record {
            source,
            audio,
            seconds,
            pause_after,
        } => record(cfg, store, source, audio, seconds, pause_after).await,
        Command::List => list(store.as_ref()),
        Command::Delete { id } => {
            if store.delete(id)? {
                info!("Deleted recording {}", id);
            } else {
                warn!("No recording with id {}", id);
            }
            Ok(())
        }
        Command::Probe => {
            let encoder = simulated_encoder();
            let negotiator = cfg.session.negotiator();
            for format in negotiator.support_report(&encoder) {
                let marker = if format.is_supported() { "yes" } else { "no" };
                info!("  {:<4} {}", marker, format.mime_type());
            }
            info!(
                "Negotiated: {}",
                negotiator.negotiate(&encoder).mime_type()
            );
            Ok(())
        }
    }
}

/// Platform stand-in: a simulated display/camera and an encoder that
/// emits a segment every 250ms
fn simulated_encoder() -> SimulatedEncoder {
    SimulatedEncoder::new(EncoderScript {
        timeslice: Some(Duration::from_millis(250)),
        chunk_size: 64 * 1024,
        final_chunk: Some(vec![0; 4096]),
        ..EncoderScript::default()
    })
}

fn new_session(cfg: &Config, store: Arc<dyn RecordingStore>) -> RecordingSession {
    RecordingSession::new(
        cfg.session.clone(),
        Arc::new(SimulatedCapture::default()),
        Arc::new(simulated_encoder()),
        store,
    )
}

async fn serve(cfg: Config, store: Arc<dyn RecordingStore>) -> Result<()> {
    let state = AppState::new(new_session(&cfg, store));
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("HTTP API listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn record(
    cfg: Config,
    store: Arc<dyn RecordingStore>,
    source: SourceSelector,
    audio: AudioMode,
    seconds: u64,
    pause_after: Option<u64>,
) -> Result<()> {
    let mut session = new_session(&cfg, store);
    session.start(source, audio).await?;

    for warning in session.warnings() {
        warn!("{:?}", warning);
    }

    let mut updates = session.elapsed_updates();
    let display = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let elapsed = *updates.borrow();
            info!("Recording {}", format_elapsed(elapsed));
        }
    });

    match pause_after {
        Some(before) if before < seconds => {
            sleep(Duration::from_secs(before)).await;
            session.pause()?;
            sleep(Duration::from_secs(1)).await;
            session.resume()?;
            sleep(Duration::from_secs(seconds - before)).await;
        }
        _ => sleep(Duration::from_secs(seconds)).await,
    }

    let artifact = session.stop().await?;
    drop(session);
    display.abort();

    match artifact {
        Some(artifact) => info!(
            "Saved {} ({}, {}) as {}",
            artifact.filename(),
            format_file_size(artifact.size()),
            format_elapsed(artifact.duration()),
            artifact.id()
        ),
        None => warn!("Nothing was recorded"),
    }

    Ok(())
}

fn list(store: &dyn RecordingStore) -> Result<()> {
    let recordings = store.list()?;
    if recordings.is_empty() {
        info!("No recordings");
        return Ok(());
    }

    for meta in recordings.iter().rev() {
        info!(
            "{}  {}  {}  {}  {}",
            meta.id,
            meta.created_at.format("%Y-%m-%d %H:%M:%S"),
            meta.filename,
            format_file_size(meta.size),
            format_elapsed(meta.duration())
        );
    }
    Ok(())
}
