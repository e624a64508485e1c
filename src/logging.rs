//! Structured logging setup.
//!
//! Logs go to stderr so stdout stays reserved for command output (forms,
//! prepared requests, responses). Configuration comes from the environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `APIFORM_LOG_LEVEL` | `warn` | trace/debug/info/warn/error |
//! | `APIFORM_LOG_FORMAT` | `pretty` | `pretty` or `json` |
//! | `APIFORM_LOG_TARGET_FILTER` | unset | extra comma-separated `EnvFilter` directives |
//! | `APIFORM_LOG_INCLUDE_LOCATION` | `false` | include file:line |
//!
//! `RUST_LOG` takes precedence over `APIFORM_LOG_LEVEL` when set.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: pretty for terminals, JSON for log collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Module filter (comma-separated directives)
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("APIFORM_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
            format: LogFormat::parse(
                &env::var("APIFORM_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            ),
            target_filter: env::var("APIFORM_LOG_TARGET_FILTER").ok(),
            include_location: env::var("APIFORM_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let level = parse_level(&config.log_level);
    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',') {
            let filter = filter.trim();
            if filter.is_empty() {
                continue;
            }
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
            }
        }
    }

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

const CREDENTIAL_PATTERNS: [&str; 11] = [
    "authorization",
    "cookie",
    "password",
    "passwd",
    "secret",
    "api_key",
    "api-key",
    "apikey",
    "token",
    "credential",
    "session",
];

/// Whether a header or field name carries a credential
pub fn is_sensitive(name: &str) -> bool {
    let lower = name.to_lowercase();
    CREDENTIAL_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Value safe to log or print for a header.
///
/// Credential-like headers keep an auth scheme word (`Bearer`, `Basic`) and the
/// first four characters of longer values.
pub fn redact_header(name: &str, value: &str) -> String {
    if !is_sensitive(name) {
        return value.to_string();
    }
    let (scheme, secret) = match value.split_once(' ') {
        Some((scheme, rest)) if matches!(scheme, "Bearer" | "Basic") => {
            (format!("{scheme} "), rest)
        }
        _ => (String::new(), value),
    };
    if secret.chars().count() > 8 {
        let head: String = secret.chars().take(4).collect();
        format!("{scheme}{head}***")
    } else {
        format!("{scheme}<REDACTED>")
    }
}
