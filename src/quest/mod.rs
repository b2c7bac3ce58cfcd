//! Quest System Module
//!
//! Trigger-condition quest graph: quests gated by counted or event-driven
//! requirements, instantiated per player and advanced by a normalized event
//! stream from the host game.

pub mod adapter;
pub mod bootstrap;
pub mod definition;
pub mod events;
pub mod host;
pub mod manager;
pub mod registry;
pub mod requirement;
pub mod session;
pub mod starter;
pub mod state;

pub use adapter::{HostEvent, LifecycleEvent, Normalized, normalize};
pub use definition::{
    CountKind, ItemMatcher, QuestDeclaration, QuestDefinition, QuestHandle, Requirement,
    RequirementHandle, RequirementSpec,
};
pub use events::{ActionArgument, ActionType, EquipSlot, EventName, EventPayload, ItemRef, QuestEvent, QuestUpdate};
pub use host::{Doodad, DoodadType, HostWorld, InMemoryWorld, TilePos};
pub use manager::QuestManager;
pub use registry::{HotReloadEvent, QuestRegistry, RegistryBuilder};
pub use requirement::{EvaluationMode, RequirementContext, TriggerRequirement};
pub use session::{GameMode, MultiplayerRole, SessionContext};
pub use state::{PlayerQuestSet, QuestInstance, QuestStatus, RequirementProgress};
