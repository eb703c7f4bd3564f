use ::thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("timed out after {timeout_secs}s waiting for results at {url}")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("no results rendered at {url}")]
    NoResults { url: String },

    #[error("failed to parse rendered results: {0}")]
    ParseFailure(String),

    #[error("blocked or rate-limited response at {url}")]
    Blocked { url: String },

    #[error("browser session failure: {0}")]
    Session(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("dataset I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset write failure: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("SFTP authentication failed for {username}@{host}: {message}")]
    AuthFailure { host: String, username: String, message: String },

    #[error("SFTP connection to {host}:{port} failed: {message}")]
    NetworkFailure { host: String, port: u16, message: String },

    #[error("remote write of {remote_path} failed: {message}")]
    RemoteWriteFailure { remote_path: String, message: String },
}
