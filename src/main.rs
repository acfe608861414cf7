use std::{future::IntoFuture, pin::pin, process, sync::Arc};

use avtools::{
    application::{
        catalog::CatalogService, error::AppError, store::RecordStore,
        submissions::SubmissionService,
    },
    config::{self, Settings},
    infra::{
        error::InfraError,
        http::{self, RouterState},
        store::HttpRecordStore,
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    match command {
        config::Command::Serve(_) => {
            telemetry::init(&settings.logging)?;
            run_serve(settings).await
        }
        config::Command::CheckConfig => {
            println!("{settings:#?}");
            Ok(())
        }
    }
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let store: Arc<dyn RecordStore> = Arc::new(HttpRecordStore::new(&settings.store)?);
    let tables = settings.store.tables.clone();
    let approved_field = settings.store.review_approved_field.clone();

    let state = RouterState {
        catalog: Arc::new(CatalogService::new(
            store.clone(),
            tables.clone(),
            approved_field.clone(),
        )),
        submissions: Arc::new(SubmissionService::new(store, tables, approved_field)),
    };

    serve_http(&settings, state).await
}

async fn serve_http(settings: &Settings, state: RouterState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "avtools::server",
        addr = %settings.server.addr,
        base_id = %settings.store.base_id,
        "listening"
    );

    let (signalled_tx, signalled_rx) = oneshot::channel();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();
    let mut server = pin!(server);

    let finished = tokio::select! {
        result = &mut server => Some(result),
        _ = signalled_rx => None,
    };

    let result = match finished {
        Some(result) => result,
        None => {
            let grace = settings.server.graceful_shutdown;
            match tokio::time::timeout(grace, server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        target = "avtools::server",
                        grace_secs = grace.as_secs(),
                        "in-flight requests did not finish before the shutdown deadline"
                    );
                    Ok(())
                }
            }
        }
    };

    result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
    info!(target = "avtools::server", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "avtools::server", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(target = "avtools::server", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        target = "avtools::server",
        "shutdown signal received, draining connections"
    );
}
