use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use nutrid::{
    coach::CoachClient,
    config::AppConfig,
    notify::{self, EventBroadcaster, NotificationDispatcher},
    rest,
    storage::Storage,
    AppContext,
};

#[derive(Parser)]
#[command(
    name = "nutrid",
    about = "Nutrition tracking service — meal ledger, achievements, coach API",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP API port
    #[arg(long, env = "NUTRID_PORT")]
    port: Option<u16>,

    /// Data directory for the SQLite database and config.toml
    #[arg(long, env = "NUTRID_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "NUTRID_LOG")]
    log: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "NUTRID_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "NUTRID_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the API server (default when no subcommand given).
    ///
    /// Examples:
    ///   nutrid serve
    ///   nutrid
    Serve,
    /// Show server status (running, version, uptime).
    ///
    /// Connects to the running server and prints a summary line.
    /// Exits 0 if healthy, 1 if stopped or unresponsive.
    ///
    /// Examples:
    ///   nutrid status
    ///   nutrid status --json
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Init once — must happen before any tracing calls.
    let log_level = args.log.as_deref().unwrap_or("info").to_owned();
    let log_format = std::env::var("NUTRID_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let _file_guard = setup_logging(&log_level, args.log_file.as_deref(), &log_format);

    match args.command {
        Some(Command::Status { json }) => {
            let config = AppConfig::new(args.port, args.data_dir, Some("error".to_string()), None);
            let exit_code = run_status(&config, json).await;
            std::process::exit(exit_code);
        }
        None | Some(Command::Serve) => {
            run_server(args.port, args.data_dir, args.log, args.bind_address).await?;
        }
    }

    Ok(())
}

async fn run_server(
    port: Option<u16>,
    data_dir: Option<std::path::PathBuf>,
    log: Option<String>,
    bind_address: Option<String>,
) -> Result<()> {
    let config = Arc::new(AppConfig::new(port, data_dir, log, bind_address));
    info!(
        data_dir = %config.data_dir.display(),
        port = config.port,
        "starting nutrid v{}",
        env!("CARGO_PKG_VERSION")
    );

    let storage = Arc::new(Storage::new(&config.data_dir).await?);
    let broadcaster = Arc::new(EventBroadcaster::new());
    let mailer = notify::email::spawn(config.clone());
    let dispatcher = NotificationDispatcher::new(broadcaster.clone(), mailer);

    let coach = CoachClient::new(&config.coach, config.ai_key.clone());
    if coach.is_none() {
        info!("NUTRID_AI_KEY not set — coach endpoint disabled");
    }
    if config.email_token.is_none() {
        info!("NUTRID_EMAIL_TOKEN not set — achievement emails disabled");
    }

    let ctx = Arc::new(AppContext {
        config,
        storage,
        broadcaster,
        dispatcher,
        coach,
        started_at: std::time::Instant::now(),
    });

    rest::run(ctx).await
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format)
/// or `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("nutrid.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}

/// Returns exit code: 0 = healthy, 1 = stopped/unresponsive.
async fn run_status(config: &AppConfig, json: bool) -> i32 {
    let url = format!("http://127.0.0.1:{}/api/v1/health", config.port);
    let client = match reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(3))
        .build()
    {
        Ok(c) => c,
        Err(_) => return 1,
    };

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let version = body["version"].as_str().unwrap_or("?");
            let uptime = body["uptime_secs"].as_u64().unwrap_or(0);
            if json {
                println!("{}", serde_json::to_string(&body).unwrap_or_default());
            } else {
                println!("nutrid {version} — Running (uptime {})", format_uptime(uptime));
            }
            0
        }
        _ => {
            if json {
                println!(r#"{{"status":"not_running"}}"#);
            } else {
                println!("nutrid: not running");
            }
            1
        }
    }
}

/// Format uptime seconds as "2h 14m" or "45m 3s".
fn format_uptime(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}
