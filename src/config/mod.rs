use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 4500;
const DEFAULT_RECALC_TIMEOUT_SECS: u64 = 10;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── CoachConfig ──────────────────────────────────────────────────────────────

/// Generative-AI coach configuration (`[coach]` in config.toml).
///
/// The API key is never stored in source or config — it is read from the
/// `NUTRID_AI_KEY` environment variable at startup. Without a key the coach
/// endpoint answers 503.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Text-completion endpoint base URL.
    pub api_url: String,
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com/v1".to_string(),
            model: "claude-haiku-4-5".to_string(),
            timeout_secs: 30,
        }
    }
}

// ─── EmailConfig ──────────────────────────────────────────────────────────────

/// Email delivery configuration (`[email]` in config.toml).
///
/// Achievement unlock mails are POSTed as JSON to `api_url`. The bearer
/// token comes from the `NUTRID_EMAIL_TOKEN` environment variable. With
/// `enabled = false` (or no token) the dispatcher drops mail requests
/// silently — unlocks are never affected either way.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Send achievement emails. Default: true.
    pub enabled: bool,
    /// Mail-API endpoint that accepts the JSON send request.
    pub api_url: String,
    /// From address shown to recipients.
    pub from_address: String,
    /// Per-request timeout in seconds (default: 10).
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://api.mailchannels.net/tx/v1/send".to_string(),
            from_address: "badges@nutrid.app".to_string(),
            timeout_secs: 10,
        }
    }
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP API port (default: 4500).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,nutrid=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured).
    log_format: Option<String>,
    /// Upper bound in seconds on achievement recalculation after a ledger
    /// mutation (default: 10). Past it the mutation still succeeds and the
    /// recalculation is abandoned with a warning.
    recalc_timeout_secs: Option<u64>,
    /// Coach (AI) configuration (`[coach]`).
    coach: Option<CoachConfig>,
    /// Email delivery configuration (`[email]`).
    email: Option<EmailConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── AppConfig ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub log: String,
    /// "pretty" (default) | "json" (for log aggregators).
    pub log_format: String,
    pub bind_address: String,
    pub recalc_timeout_secs: u64,
    pub coach: CoachConfig,
    pub email: EmailConfig,
    /// AI key from NUTRID_AI_KEY. None disables the coach endpoint.
    pub ai_key: Option<String>,
    /// Mail-API token from NUTRID_EMAIL_TOKEN. None disables email dispatch.
    pub email_token: Option<String>,
}

impl AppConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let log_format = std::env::var("NUTRID_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let bind_address = bind_address
            .or(std::env::var("NUTRID_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let recalc_timeout_secs = toml
            .recalc_timeout_secs
            .unwrap_or(DEFAULT_RECALC_TIMEOUT_SECS);

        let ai_key = std::env::var("NUTRID_AI_KEY").ok().filter(|s| !s.is_empty());
        let email_token = std::env::var("NUTRID_EMAIL_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        Self {
            port,
            data_dir,
            log,
            log_format,
            bind_address,
            recalc_timeout_secs,
            coach: toml.coach.unwrap_or_default(),
            email: toml.email.unwrap_or_default(),
            ai_key,
            email_token,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("nutrid");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/nutrid or ~/.local/share/nutrid
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("nutrid");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("nutrid");
        }
    }
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("nutrid");
        }
    }
    // Fallback
    PathBuf::from(".nutrid")
}
