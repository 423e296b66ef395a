use thiserror::Error;

/// Errors raised by the leaderboard backends and the key-value storage.
///
/// None of these reach the game loop: the public read operations turn them
/// into empty results and the save path hands them to the host to log.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key-value storage could not be read or written
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedded database error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Snapshot or response body did not decode
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Snapshot written by an unknown format version
    #[error("unsupported snapshot version {0}")]
    UnsupportedSnapshot(u32),

    /// Remote endpoint could not be reached
    #[error("remote request failed: {0}")]
    Request(String),

    /// Remote endpoint answered with a non-success status
    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Remote endpoint did not answer in time
    #[error("remote request timed out after {0} ms")]
    Timeout(u64),

    /// Remote URL is not usable
    #[error("invalid remote url: {0}")]
    InvalidUrl(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
