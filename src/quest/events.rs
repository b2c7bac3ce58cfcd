//! Quest Event Types
//!
//! Normalized events that can advance quest requirements, and the updates
//! the manager reports back to the host.

use serde::{Deserialize, Serialize};

/// Name an event is dispatched under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    ActionExecuted,
    OptionChanged,
    QuickslotUpdated,
    ItemCollected,
    ItemCrafted,
    ItemDismantled,
    CreatureKilled,
    CreatureTamed,
    DoodadBuilt,
    ItemEquipped,
}

impl EventName {
    /// Get event name as string (for logging/debugging)
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::ActionExecuted => "action_executed",
            EventName::OptionChanged => "option_changed",
            EventName::QuickslotUpdated => "quickslot_updated",
            EventName::ItemCollected => "item_collected",
            EventName::ItemCrafted => "item_crafted",
            EventName::ItemDismantled => "item_dismantled",
            EventName::CreatureKilled => "creature_killed",
            EventName::CreatureTamed => "creature_tamed",
            EventName::DoodadBuilt => "doodad_built",
            EventName::ItemEquipped => "item_equipped",
        }
    }
}

/// Actions the host can report through `ActionExecuted`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    StartFire,
    StokeFire,
    GatherLiquid,
    DrinkInFront,
    DetachContainer,
    AttachContainer,
    Pour,
    /// Any action the quest chain does not look at
    #[serde(other)]
    Other,
}

/// Equipment slots referenced by equip requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    LeftHand,
    RightHand,
    Head,
    Chest,
    Legs,
    Feet,
    Hands,
    Neck,
    Waist,
    Back,
}

/// Reference to an item passed as an action argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub item_type: String,
    /// False once the item has been consumed or destroyed by the action
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

/// Action argument as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionArgument {
    Item(ItemRef),
    Other(String),
}

impl ActionArgument {
    pub fn as_item(&self) -> Option<&ItemRef> {
        match self {
            ActionArgument::Item(item) => Some(item),
            ActionArgument::Other(_) => None,
        }
    }
}

/// Event-specific data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    Action {
        action: ActionType,
        args: Vec<ActionArgument>,
    },
    Option {
        key: String,
    },
    Quickslot {
        slot: u32,
    },
    /// Item collected, crafted, dismantled or built
    Item {
        item_type: String,
        count: u32,
    },
    Creature {
        creature: String,
    },
    Equip {
        slot: EquipSlot,
        item_type: String,
    },
}

/// A normalized `(name, actor, payload)` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestEvent {
    pub name: EventName,
    /// Player that performed the event
    pub actor: String,
    pub payload: EventPayload,
}

impl QuestEvent {
    pub fn new(name: EventName, actor: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            name,
            actor: actor.into(),
            payload,
        }
    }

    /// Get the player ID associated with this event
    pub fn player_id(&self) -> &str {
        &self.actor
    }

    pub fn action(&self) -> Option<(ActionType, &[ActionArgument])> {
        match &self.payload {
            EventPayload::Action { action, args } => Some((*action, args.as_slice())),
            _ => None,
        }
    }

    /// First item argument of an action event
    pub fn first_item_arg(&self) -> Option<&ItemRef> {
        self.action().and_then(|(_, args)| args.first()).and_then(ActionArgument::as_item)
    }
}

/// A change to a player's quest state, reported back to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestUpdate {
    /// A new quest instance was added to the player (`player.quests.add`)
    Activated { player_id: String, quest_id: String },
    /// A requirement moved forward
    Progressed {
        player_id: String,
        quest_id: String,
        requirement: usize,
        current: u32,
        target: u32,
        satisfied: bool,
    },
    /// A quest instance reached its terminal state
    Completed { player_id: String, quest_id: String },
}

impl QuestUpdate {
    pub fn quest_id(&self) -> &str {
        match self {
            QuestUpdate::Activated { quest_id, .. }
            | QuestUpdate::Progressed { quest_id, .. }
            | QuestUpdate::Completed { quest_id, .. } => quest_id,
        }
    }
}
