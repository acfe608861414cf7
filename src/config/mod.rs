//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{fmt, net::SocketAddr, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides, StoreOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "avtools";
const ENV_PREFIX: &str = "AVTOOLS";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_STORE_API_URL: &str = "https://api.airtable.com/v0";
const DEFAULT_TABLE_PRODUCTS: &str = "Products";
const DEFAULT_TABLE_CATEGORIES: &str = "Categories";
const DEFAULT_TABLE_REVIEWS: &str = "Reviews";
const DEFAULT_TABLE_LEADS: &str = "Leads";
const DEFAULT_REVIEW_APPROVED_FIELD: &str = "Approved";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub api_url: Url,
    pub base_id: String,
    pub api_key: ApiKey,
    pub tables: TableSettings,
    /// Moderation checkbox written as `false` on new reviews and checked by
    /// the approved-review filter.
    pub review_approved_field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSettings {
    pub products: String,
    pub categories: String,
    pub reviews: String,
    pub leads: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            products: DEFAULT_TABLE_PRODUCTS.to_string(),
            categories: DEFAULT_TABLE_CATEGORIES.to_string(),
            reviews: DEFAULT_TABLE_REVIEWS.to_string(),
            leads: DEFAULT_TABLE_LEADS.to_string(),
        }
    }
}

/// Store credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_store_overrides(&cli.store);
    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::CheckConfig) | None => {}
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    store: RawStoreSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_store_overrides(&mut self, overrides: &StoreOverrides) {
        let store = &mut self.store;
        override_with(&mut store.base_id, &overrides.base_id);
        override_with(&mut store.api_key, &overrides.api_key);
        override_with(&mut store.api_url, &overrides.api_url);
        override_with(&mut store.tables.products, &overrides.table_products);
        override_with(&mut store.tables.categories, &overrides.table_categories);
        override_with(&mut store.tables.reviews, &overrides.table_reviews);
        override_with(&mut store.tables.leads, &overrides.table_leads);
        override_with(
            &mut store.review_approved_field,
            &overrides.review_approved_field,
        );
    }
}

fn override_with(target: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value.as_ref() {
        *target = Some(value.clone());
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            store,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let store = build_store_settings(store)?;

        Ok(Self {
            server,
            logging,
            store,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let raw_url = non_blank(store.api_url).unwrap_or_else(|| DEFAULT_STORE_API_URL.to_string());
    let api_url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("store.api_url", format!("invalid URL `{raw_url}`: {err}")))?;
    if api_url.cannot_be_a_base() || !matches!(api_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "store.api_url",
            format!("`{raw_url}` must be an http(s) URL"),
        ));
    }

    let base_id = non_blank(store.base_id).ok_or_else(|| {
        LoadError::invalid(
            "store.base_id",
            "is required (set AIRTABLE_BASE_ID or AVTOOLS__STORE__BASE_ID)",
        )
    })?;
    let api_key = non_blank(store.api_key).map(ApiKey::new).ok_or_else(|| {
        LoadError::invalid(
            "store.api_key",
            "is required (set AIRTABLE_API_KEY or AVTOOLS__STORE__API_KEY)",
        )
    })?;

    let tables = TableSettings {
        products: table_name(store.tables.products, DEFAULT_TABLE_PRODUCTS),
        categories: table_name(store.tables.categories, DEFAULT_TABLE_CATEGORIES),
        reviews: table_name(store.tables.reviews, DEFAULT_TABLE_REVIEWS),
        leads: table_name(store.tables.leads, DEFAULT_TABLE_LEADS),
    };

    let review_approved_field = non_blank(store.review_approved_field)
        .unwrap_or_else(|| DEFAULT_REVIEW_APPROVED_FIELD.to_string());

    Ok(StoreSettings {
        api_url,
        base_id,
        api_key,
        tables,
        review_approved_field,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    api_url: Option<String>,
    base_id: Option<String>,
    api_key: Option<String>,
    tables: RawTableSettings,
    review_approved_field: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTableSettings {
    products: Option<String>,
    categories: Option<String>,
    reviews: Option<String>,
    leads: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn table_name(value: Option<String>, default: &str) -> String {
    non_blank(value).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests;
