//! rollcalld - The rollcall attendance service
//!
//! This is the main entry point for the rollcalld service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Admission engine
//! - IPC server

use anyhow::{Context, Result};
use clap::Parser;
use rollcall_api::{Event, EventPayload};
use rollcall_config::{Settings, load_config};
use rollcall_core::AdmissionEngine;
use rollcall_ipc::IpcServer;
use rollcall_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use rollcall_util::{default_config_path, format_instant, is_mock_time_active};
use rollcalld::{append_audit, handle_message};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// rollcalld - QR and geofence attendance admission service
#[derive(Parser, Debug)]
#[command(name = "rollcalld")]
#[command(about = "QR and geofence attendance admission service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/rollcall/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set ROLLCALL_SOCKET env var)
    #[arg(short, long, env = "ROLLCALL_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set ROLLCALL_DATA_DIR env var)
    #[arg(short, long, env = "ROLLCALL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    engine: Arc<AdmissionEngine>,
    ipc: Arc<IpcServer>,
    store: Arc<dyn Store>,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        // A missing file means "all defaults"; a broken one is fatal
        let mut settings = if args.config.exists() {
            let settings = load_config(&args.config)
                .with_context(|| format!("Failed to load config from {:?}", args.config))?;
            info!(config_path = %args.config.display(), "Configuration loaded");
            settings
        } else {
            warn!(
                config_path = %args.config.display(),
                "Config file not found, using defaults"
            );
            Settings::default()
        };

        if let Some(socket) = &args.socket {
            settings.service.socket_path = socket.clone();
        }
        if let Some(data_dir) = &args.data_dir {
            settings.service.data_dir = data_dir.clone();
        }
        let socket_path = settings.service.socket_path.clone();

        std::fs::create_dir_all(&settings.service.data_dir).with_context(|| {
            format!(
                "Failed to create data directory {:?}",
                settings.service.data_dir
            )
        })?;

        let db_path = settings.service.database_path();
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStarted))
            .context("Failed to write to audit log")?;
        append_audit(
            &store,
            AuditEventType::ConfigLoaded {
                token_ttl_secs: settings.admission.token_ttl.as_secs(),
            },
        );

        let engine = Arc::new(AdmissionEngine::new(store.clone(), settings.admission));

        let mut ipc = IpcServer::new(&socket_path);
        ipc.start()
            .await
            .with_context(|| format!("Failed to bind socket {:?}", socket_path))?;

        info!(socket_path = %socket_path.display(), "IPC server started");

        Ok(Self {
            engine,
            ipc: Arc::new(ipc),
            store,
        })
    }

    async fn run(self) -> Result<()> {
        let mut ipc_messages = self
            .ipc
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        let ipc_accept = self.ipc.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                msg = ipc_messages.recv() => match msg {
                    Some(msg) => handle_message(&self.engine, &self.ipc, &self.store, msg).await,
                    None => {
                        warn!("IPC message channel closed");
                        break;
                    }
                },
            }
        }

        info!("Shutting down rollcalld");

        self.ipc.broadcast_event(Event::new(EventPayload::Shutdown));
        append_audit(&self.store, AuditEventType::ServiceStopped);
        self.ipc.shutdown();

        info!("Shutdown complete");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "rollcalld starting");

    if is_mock_time_active() {
        warn!(
            now = %format_instant(&rollcall_util::now()),
            "Mock time is active; all admission decisions use the overridden clock"
        );
    }

    let service = Service::new(&args).await?;
    service.run().await
}
