use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the avtools binary.
#[derive(Debug, Parser)]
#[command(
    name = "avtools",
    version,
    about = "Aviation software directory and review site"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "AVTOOLS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve(Box<ServeArgs>),
    /// Resolve and validate configuration, print it with secrets redacted, and exit.
    #[command(name = "check-config")]
    CheckConfig,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

/// Record store connection. These also read the conventional `AIRTABLE_*`
/// variables and apply to every subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct StoreOverrides {
    /// Base identifier of the record store.
    #[arg(
        long = "store-base-id",
        env = "AIRTABLE_BASE_ID",
        value_name = "ID",
        global = true
    )]
    pub base_id: Option<String>,

    /// API token for the record store.
    #[arg(
        long = "store-api-key",
        env = "AIRTABLE_API_KEY",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub api_key: Option<String>,

    /// Override the record store API root.
    #[arg(
        long = "store-api-url",
        env = "AIRTABLE_API_URL",
        value_name = "URL",
        global = true
    )]
    pub api_url: Option<String>,

    /// Override the Products table name.
    #[arg(
        long = "store-table-products",
        env = "AIRTABLE_TABLE_PRODUCTS",
        value_name = "NAME",
        global = true
    )]
    pub table_products: Option<String>,

    /// Override the Categories table name.
    #[arg(
        long = "store-table-categories",
        env = "AIRTABLE_TABLE_CATEGORIES",
        value_name = "NAME",
        global = true
    )]
    pub table_categories: Option<String>,

    /// Override the Reviews table name.
    #[arg(
        long = "store-table-reviews",
        env = "AIRTABLE_TABLE_REVIEWS",
        value_name = "NAME",
        global = true
    )]
    pub table_reviews: Option<String>,

    /// Override the Leads table name.
    #[arg(
        long = "store-table-leads",
        env = "AIRTABLE_TABLE_LEADS",
        value_name = "NAME",
        global = true
    )]
    pub table_leads: Option<String>,

    /// Override the review moderation checkbox column.
    #[arg(
        long = "store-review-approved-field",
        env = "AIRTABLE_REVIEW_APPROVED_FIELD",
        value_name = "COLUMN",
        global = true
    )]
    pub review_approved_field: Option<String>,
}
