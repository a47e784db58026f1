use thiserror::Error;

/// Errors that can occur in the selection engine
#[derive(Error, Debug)]
pub enum SelectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("no protocol accepted the selection parameters")]
    NoProtocols,

    #[error("no protocol can handle {param} at message length {msg_length}")]
    Unsupported { param: String, msg_length: usize },
}

pub type Result<T> = std::result::Result<T, SelectError>;
