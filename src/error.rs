//! Error types for the quest engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building, loading or persisting quest state.
///
/// Requirement evaluation never produces one of these: a requirement that
/// cannot see the host state it needs is simply not satisfied.
#[derive(Error, Debug)]
pub enum QuestError {
    /// Lookup of a quest or requirement id that was never declared.
    #[error("Unknown definition: {0}")]
    UnknownDefinition(String),

    /// A declaration points at an id that does not exist after linking.
    #[error("Quest '{quest}' references unresolved definition '{reference}'")]
    UnresolvedReference { quest: String, reference: String },

    /// Two declarations share the same id.
    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    /// The child graph loops back on itself.
    #[error("Quest graph contains a cycle: {}", .0.join(" -> "))]
    CycleDetected(Vec<String>),

    /// A quest data file parsed but describes something invalid.
    #[error("Invalid quest file {path:?}: {message}")]
    InvalidQuestFile { path: PathBuf, message: String },

    /// A TOML file failed to parse.
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot or script (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, QuestError>;
