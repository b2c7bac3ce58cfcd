//! Trigger-condition quest engine for the survival tutorial chain.

pub mod config;
pub mod error;
pub mod quest;
pub mod replay;

pub use config::EngineConfig;
pub use error::{QuestError, Result};
pub use quest::{QuestManager, QuestRegistry, RegistryBuilder, SessionContext};
