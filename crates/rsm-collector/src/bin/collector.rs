//! The collector binary: samples the host, serves it over WebSocket.
//!
//! CLI surface is intentionally thin (`--machine-id`, `--loglevel`,
//! `--bind`) — metric sampling internals, persistent machine-id generation
//! policy, and any config-file layer are out of this system's scope.

use std::sync::Arc;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use rsm_collector::{
    generate_machine_info, logging, FixedMetricsSource, SamplingPipeline, Server, ServerConfig,
};
use rsm_wire::{LoadAverage, MemoryInfo, SensorData};

/// Default bind address: `0.0.0.0:2604`.
const DEFAULT_BIND: &str = "0.0.0.0:2604";

#[derive(Debug, Clone, clap::ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            // tracing has no CRITICAL level; ERROR is the closest match.
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "collector",
    version,
    about = "Samples this host's metrics and serves them over a JSON-RPC/WebSocket stream"
)]
struct Cli {
    /// Override the machine id reported by get_machine_info, instead of
    /// deriving it from the host's stable machine identifier.
    #[arg(long)]
    machine_id: Option<String>,

    /// Minimum log severity.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    loglevel: LogLevel,

    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: String,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.loglevel.into());

    let bind = match cli.bind.parse() {
        Ok(addr) => addr,
        Err(err) => {
            eprintln!("invalid --bind address `{}`: {err}", cli.bind);
            return std::process::ExitCode::FAILURE;
        }
    };

    let machine_info = generate_machine_info(cli.machine_id);
    let config = ServerConfig {
        bind,
        machine_info,
    };

    let broadcaster = rsm_collector::Broadcaster::new();
    // Real sampling (disk mounts, memory, CPU%, load, network counters, boot
    // time) is a pluggable MetricsSource outside this crate's scope; the
    // bootstrap binary wires a fixed placeholder snapshot until one is
    // supplied by an embedder.
    let source = Arc::new(FixedMetricsSource::new(placeholder_snapshot()));
    let pipeline = SamplingPipeline::new(source, broadcaster.clone());
    let pipeline_handle = pipeline.spawn();

    let server = Server::new(config, broadcaster);
    let result = server.serve().await;
    pipeline_handle.abort();

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "collector failed to bind or accept");
            std::process::ExitCode::FAILURE
        }
    }
}

fn placeholder_snapshot() -> SensorData {
    SensorData {
        disk_usage: std::collections::HashMap::new(),
        memory: MemoryInfo {
            total: 0,
            available: 0,
            used: 0,
            free: 0,
            percent: 0.0,
        },
        io_counters: std::collections::HashMap::new(),
        load: LoadAverage {
            one: 0.0,
            five: 0.0,
            fifteen: 0.0,
        },
        cpu_percent: None,
        boot_time: chrono::Utc::now(),
    }
}
