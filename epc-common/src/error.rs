//! Error type shared by the catalog crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML file unreadable or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A registry or taxonomy row the code cannot interpret (unknown enum
    /// label, malformed id)
    #[error("Corrupt registry row: {0}")]
    Registry(String),

    /// Schema state this build does not know how to reach
    #[error("Schema error: {0}")]
    Schema(String),
}
