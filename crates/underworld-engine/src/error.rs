//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can stop startup. Once a run
//! has begun nothing is fatal: content and persistence problems are logged
//! by the engine and the run still resolves.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: underworld_core::config::ConfigError,
    },

    /// The requested crime key is not in the catalog.
    #[error("unknown crime '{key}'")]
    UnknownCrime {
        /// The key as given on the command line.
        key: String,
    },

    /// The engine refused to start the run.
    #[error("run refused: {reason}")]
    Refused {
        /// Why the run did not start.
        reason: String,
    },
}
