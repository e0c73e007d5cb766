use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store is not open")]
    StoreClosed,

    #[error("root path is not a readable directory: {0}")]
    InvalidPath(String),

    #[error("granularity out of range: {0}")]
    InvalidGranularity(i32),

    #[error("scheduler is already running")]
    SchedulerBusy,

    #[error("scan found no files")]
    NoData,
}
