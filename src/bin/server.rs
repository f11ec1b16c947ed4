//! OrionKV Server Binary
//!
//! Loads the config, wires the node together, and runs the TCP endpoints
//! until INT/TERM.

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use orionkv::config::{LoggingConfig, ReplicaRole};
use orionkv::network::TcpServer;
use orionkv::replication::MasterReplicator;
use orionkv::wal::Wal;
use orionkv::{AppConfig, Database, OrionError};

const CONFIG_ENV_VAR: &str = "ORIONKV_CONFIG";

/// OrionKV Server
#[derive(Parser, Debug)]
#[command(name = "orionkv-server")]
#[command(about = "Replicated in-memory key-value store")]
#[command(version)]
struct Args {
    /// Path to the TOML config file; falls back to $ORIONKV_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let Some(config_path) = args
        .config
        .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    else {
        eprintln!("no config file: pass --config or set {CONFIG_ENV_VAR}");
        process::exit(1);
    };

    let conf = match AppConfig::load(&config_path) {
        Ok(conf) => conf,
        Err(e) => {
            eprintln!("failed to load config {}: {e}", config_path.display());
            process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&conf.logging) {
        eprintln!("failed to initialize logging: {e}");
        process::exit(1);
    }

    tracing::info!("OrionKV v{} starting", orionkv::VERSION);

    if let Err(e) = run(conf) {
        tracing::error!("fatal: {e}");
        process::exit(1);
    }
}

fn run(conf: AppConfig) -> orionkv::Result<()> {
    let wal = Arc::new(Wal::open(&conf.wal)?);
    let engine = orionkv::storage::from_config(&conf.engine);
    let database = Database::open(&conf, engine, Arc::clone(&wal))?;

    let handler_db = Arc::clone(&database);
    let server = TcpServer::bind(
        &conf.network,
        Arc::new(move |request| handler_db.execute(request)),
    )?;

    let mut shutdown_handles = vec![server.shutdown_handle()];
    let mut replication_thread = None;

    // The primary serves its update feed on the master address
    if conf.replication.replica_type == ReplicaRole::Master {
        let master = MasterReplicator::new(&conf.replication, Arc::clone(&wal));
        let replication_server = TcpServer::bind(
            &conf.replicator_network_config(),
            Arc::new(move |request| master.handle_request(request)),
        )?;
        shutdown_handles.push(replication_server.shutdown_handle());

        replication_thread = Some(
            thread::Builder::new()
                .name("orionkv-replication-server".to_string())
                .spawn(move || {
                    if let Err(e) = replication_server.run() {
                        tracing::error!("replication server failed: {e}");
                    }
                })
                .map_err(|e| {
                    OrionError::Network(format!("cannot spawn replication server: {e}"))
                })?,
        );
    }

    ctrlc::set_handler(move || {
        tracing::info!("shutting down server...");
        for handle in &shutdown_handles {
            handle.shutdown();
        }
    })
    .map_err(|e| OrionError::Config(format!("cannot install signal handler: {e}")))?;

    server.run()?;

    if let Some(handle) = replication_thread {
        let _ = handle.join();
    }
    database.shutdown()?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(conf: &LoggingConfig) -> orionkv::Result<()> {
    match conf.level.as_str() {
        "debug" | "info" | "warn" | "error" => {}
        unknown => {
            return Err(OrionError::Config(format!(
                "unknown logger level: {unknown}"
            )))
        }
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(conf.level.clone()));

    match conf.output.as_str() {
        "stdout" => fmt().with_env_filter(filter).with_writer(std::io::stdout).init(),
        "stderr" => fmt().with_env_filter(filter).with_writer(std::io::stderr).init(),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    OrionError::Config(format!("cannot open log output {path}: {e}"))
                })?;
            fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
    }

    Ok(())
}
