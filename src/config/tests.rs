use super::*;

fn raw_with_credentials() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.store.base_id = Some("appBase".to_string());
    raw.store.api_key = Some("patSecret".to_string());
    raw
}

#[test]
fn defaults_apply_once_credentials_are_present() {
    let settings = Settings::from_raw(raw_with_credentials()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.store.api_url.as_str(), "https://api.airtable.com/v0");
    assert_eq!(settings.store.tables, TableSettings::default());
    assert_eq!(settings.store.review_approved_field, "Approved");
}

#[test]
fn missing_base_id_is_fatal() {
    let mut raw = raw_with_credentials();
    raw.store.base_id = None;

    let err = Settings::from_raw(raw).expect_err("base id required");
    assert!(matches!(err, LoadError::Invalid { key: "store.base_id", .. }));
}

#[test]
fn blank_api_key_is_fatal() {
    let mut raw = raw_with_credentials();
    raw.store.api_key = Some("   ".to_string());

    let err = Settings::from_raw(raw).expect_err("api key required");
    assert!(matches!(err, LoadError::Invalid { key: "store.api_key", .. }));
}

#[test]
fn api_key_is_redacted_in_debug_output() {
    let settings = Settings::from_raw(raw_with_credentials()).expect("valid settings");
    let rendered = format!("{settings:?}");
    assert!(!rendered.contains("patSecret"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn rejects_non_http_store_url() {
    let mut raw = raw_with_credentials();
    raw.store.api_url = Some("mailto:ops@example.com".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid url");
    assert!(matches!(err, LoadError::Invalid { key: "store.api_url", .. }));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_credentials();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.store.tables.reviews = Some("Reviews (legacy)".to_string());

    raw.apply_serve_overrides(&ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        log_json: Some(true),
        ..Default::default()
    });
    raw.apply_store_overrides(&StoreOverrides {
        table_reviews: Some("Reviews".to_string()),
        review_approved_field: Some("Approved?".to_string()),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
    assert_eq!(settings.store.tables.reviews, "Reviews");
    assert_eq!(settings.store.review_approved_field, "Approved?");
}

#[test]
fn blank_table_names_fall_back_to_defaults() {
    let mut raw = raw_with_credentials();
    raw.store.tables.leads = Some(String::new());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.store.tables.leads, "Leads");
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = raw_with_credentials();
    raw.server.port = Some(0);

    let err = Settings::from_raw(raw).expect_err("port must be positive");
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["avtools"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn store_flags_are_accepted_after_the_subcommand() {
    let args = CliArgs::parse_from([
        "avtools",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--store-base-id",
        "appFromFlag",
        "--store-table-products",
        "Tools",
    ]);

    assert_eq!(args.store.base_id.as_deref(), Some("appFromFlag"));
    assert_eq!(args.store.table_products.as_deref(), Some("Tools"));
    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
        }
        Command::CheckConfig => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_check_config_command() {
    let args = CliArgs::parse_from(["avtools", "check-config"]);
    assert!(matches!(args.command, Some(Command::CheckConfig)));
}
