use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TallyError {
    #[error("Configuration error: {0}")] Config(String),

    #[error("Input error: {0}")] Input(String),

    #[error("Invalid address: {0}")] InvalidAddress(String),

    #[error("Network error: {0}")] Network(String),

    #[error("HTTP error: {0}")] Http(String),

    #[error("RPC error: {0}")] Rpc(String),

    #[error("Parse error: {0}")] Parse(String),
}

impl TallyError {
    /// Transient failures are worth another attempt; everything else is
    /// permanent and must surface immediately.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TallyError::Network(_) => true,
            TallyError::Http(_) => true,
            TallyError::Rpc(_) => true,
            TallyError::Input(_) => true,
            _ => false,
        }
    }
}

pub type TallyResult<T> = Result<T, TallyError>;
