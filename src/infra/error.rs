use thiserror::Error;

/// Failures while bringing up process-level infrastructure.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("record store client could not be built: {0}")]
    StoreClient(String),
}

impl InfraError {
    pub fn store_client(message: impl Into<String>) -> Self {
        Self::StoreClient(message.into())
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
