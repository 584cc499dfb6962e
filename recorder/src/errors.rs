//! Error types and handling for recorder operations

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("stream sink cannot hold {requested} bytes ({available} available), event dropped")]
    SinkFull { requested: usize, available: usize },

    #[error("symbol table is full ({capacity} entries)")]
    SymbolTableFull { capacity: usize },

    #[error("strings containing a nul byte cannot be registered as symbols")]
    InvalidSymbol,

    #[error("invalid recorder configuration: {0}")]
    InvalidConfig(String),

    #[error("recorder already initialized")]
    AlreadyInitialized,

    #[error("recorder not initialized")]
    NotInitialized,
}

pub type Result<T> = std::result::Result<T, Error>;
