//! Event Stream Adapter
//!
//! Turns raw host events into normalized quest events, split from the player
//! lifecycle events that drive bootstrap.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::events::{ActionArgument, ActionType, EquipSlot, EventName, EventPayload, QuestEvent};

/// Events as the host emits them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    PostExecuteAction {
        executor: String,
        action: ActionType,
        #[serde(default)]
        args: Vec<ActionArgument>,
    },
    UpdateOption {
        player: String,
        key: String,
    },
    UpdatedQuickslotInfo {
        player: String,
        #[serde(default)]
        slot: u32,
    },
    InventoryItemAdd {
        player: String,
        item_type: String,
        #[serde(default = "default_count")]
        count: u32,
    },
    Craft {
        player: String,
        item_type: String,
        #[serde(default = "default_count")]
        count: u32,
    },
    Dismantle {
        player: String,
        item_type: String,
    },
    KillCreature {
        player: String,
        creature: String,
    },
    TameCreature {
        player: String,
        creature: String,
    },
    BuildDoodad {
        player: String,
        /// Item the doodad was built from
        item_type: String,
    },
    Equip {
        player: String,
        slot: EquipSlot,
        item_type: String,
    },
    PlayerJoin {
        player: String,
    },
    GamePlay {
        #[serde(default)]
        is_loading_save: bool,
    },
}

fn default_count() -> u32 {
    1
}

/// Lifecycle events handled by bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    PlayerJoined { player_id: String },
    GameStarted { is_loading_save: bool },
}

/// Output of the adapter
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Quest(QuestEvent),
    Lifecycle(LifecycleEvent),
}

/// Normalize a host event. Malformed events (no actor, zero counts) are
/// dropped.
pub fn normalize(event: HostEvent) -> Option<Normalized> {
    let (name, actor, payload) = match event {
        HostEvent::PostExecuteAction { executor, action, args } => {
            (EventName::ActionExecuted, executor, EventPayload::Action { action, args })
        }
        HostEvent::UpdateOption { player, key } => {
            (EventName::OptionChanged, player, EventPayload::Option { key })
        }
        HostEvent::UpdatedQuickslotInfo { player, slot } => {
            (EventName::QuickslotUpdated, player, EventPayload::Quickslot { slot })
        }
        HostEvent::InventoryItemAdd { player, item_type, count } => {
            (EventName::ItemCollected, player, EventPayload::Item { item_type, count })
        }
        HostEvent::Craft { player, item_type, count } => {
            (EventName::ItemCrafted, player, EventPayload::Item { item_type, count })
        }
        HostEvent::Dismantle { player, item_type } => (
            EventName::ItemDismantled,
            player,
            EventPayload::Item { item_type, count: 1 },
        ),
        HostEvent::KillCreature { player, creature } => {
            (EventName::CreatureKilled, player, EventPayload::Creature { creature })
        }
        HostEvent::TameCreature { player, creature } => {
            (EventName::CreatureTamed, player, EventPayload::Creature { creature })
        }
        HostEvent::BuildDoodad { player, item_type } => (
            EventName::DoodadBuilt,
            player,
            EventPayload::Item { item_type, count: 1 },
        ),
        HostEvent::Equip { player, slot, item_type } => {
            (EventName::ItemEquipped, player, EventPayload::Equip { slot, item_type })
        }
        HostEvent::PlayerJoin { player } => {
            if player.is_empty() {
                debug!("Dropping player join without a player id");
                return None;
            }
            return Some(Normalized::Lifecycle(LifecycleEvent::PlayerJoined { player_id: player }));
        }
        HostEvent::GamePlay { is_loading_save } => {
            return Some(Normalized::Lifecycle(LifecycleEvent::GameStarted { is_loading_save }));
        }
    };

    if actor.is_empty() {
        debug!("Dropping {} event without an actor", name.as_str());
        return None;
    }
    if let EventPayload::Item { count: 0, .. } = payload {
        debug!("Dropping {} event for player {} with zero count", name.as_str(), actor);
        return None;
    }

    Some(Normalized::Quest(QuestEvent::new(name, actor, payload)))
}
