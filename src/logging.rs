//! Logging setup with optional file rotation
//!
//! Installs a `tracing` subscriber with an env filter, a stderr layer and,
//! when configured, a daily-rotated file layer. Also hosts the helpers used
//! to keep secrets (API secret, bearer token, PINs, digital keys) out of
//! log output.

use crate::config::LoggingConfig;
use serde_json::Value;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

/// Default log file name when the configured path has none
const DEFAULT_LOG_FILE: &str = "ringo-bridge.log";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level
    pub level: Level,

    /// Log to file
    pub file_path: Option<PathBuf>,

    /// Log to stderr
    pub stderr: bool,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_path: None,
            stderr: true,
            json: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            if let Some(level) = parse_level(&rust_log) {
                config.level = level;
            }
        }

        if let Ok(log_file) = std::env::var("RINGO_LOG_FILE") {
            config.file_path = Some(PathBuf::from(log_file));
        }

        if let Ok(json) = std::env::var("RINGO_LOG_JSON") {
            config.json = json.eq_ignore_ascii_case("true") || json == "1";
        }

        config
    }

    /// Force debug level
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug {
            self.level = Level::DEBUG;
        }
        self
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: parse_level(&config.level).unwrap_or(Level::INFO),
            file_path: config.file.as_ref().map(PathBuf::from),
            stderr: true,
            json: config.json_format,
        }
    }
}

fn parse_level(spec: &str) -> Option<Level> {
    let spec = spec.to_lowercase();
    ["trace", "debug", "info", "warn", "error"]
        .iter()
        .find(|name| spec.contains(*name))
        .and_then(|name| name.parse().ok())
}

fn output_layer<S, W>(writer: W, ansi: bool, json: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .boxed()
    }
}

/// Initialize logging with the given configuration
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();

    let stderr_layer = config
        .stderr
        .then(|| output_layer(std::io::stderr, true, config.json));

    let file_layer = match config.file_path {
        Some(file_path) => {
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let file_appender = tracing_appender::rolling::daily(
                file_path
                    .parent()
                    .unwrap_or_else(|| std::path::Path::new(".")),
                file_path
                    .file_name()
                    .unwrap_or_else(|| std::ffi::OsStr::new(DEFAULT_LOG_FILE)),
            );
            Some(output_layer(file_appender, false, config.json))
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Shorten a secret-bearing string to a recognisable prefix
pub fn redact(value: &str) -> String {
    let prefix: String = value.chars().take(6).collect();
    if prefix.len() < value.len() {
        format!("{prefix}…")
    } else {
        "***".to_string()
    }
}

/// Check if a field name indicates sensitive data
fn is_sensitive_field(field: &str) -> bool {
    let field = field.to_lowercase();
    field.contains("secret")
        || field.contains("token")
        || field.contains("pin")
        || field.contains("digital_key")
        || field.contains("auth")
}

/// Copy of `params` with sensitive fields replaced, safe to log
pub fn sanitize_params(params: &Value) -> Value {
    match params {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = if !is_sensitive_field(key) {
                        sanitize_params(value)
                    } else if let Value::String(s) = value {
                        Value::String(redact(s))
                    } else {
                        Value::String("***".to_string())
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_params).collect()),
        _ => params.clone(),
    }
}
