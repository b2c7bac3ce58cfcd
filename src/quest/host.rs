//! Host World Queries
//!
//! Read-only view of the game simulation that requirements evaluate against.
//! The engine never mutates host state through this interface.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::events::EquipSlot;

/// Tile coordinates in the host world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Doodad types the tutorial chain cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoodadType {
    ClayCampfire,
    StoneCampfire,
    SandstoneCampfire,
    LitClayCampfire,
    LitStoneCampfire,
    LitSandstoneCampfire,
    ClayWaterStill,
    StoneWaterStill,
    SandstoneWaterStill,
    LitClayWaterStill,
    LitStoneWaterStill,
    LitSandstoneWaterStill,
    WoodenChest,
    #[serde(other)]
    Other,
}

impl DoodadType {
    pub fn is_lit_campfire(&self) -> bool {
        matches!(
            self,
            DoodadType::LitClayCampfire | DoodadType::LitStoneCampfire | DoodadType::LitSandstoneCampfire
        )
    }

    pub fn is_lit_water_still(&self) -> bool {
        matches!(
            self,
            DoodadType::LitClayWaterStill
                | DoodadType::LitStoneWaterStill
                | DoodadType::LitSandstoneWaterStill
        )
    }

    pub fn is_unlit_water_still(&self) -> bool {
        matches!(
            self,
            DoodadType::ClayWaterStill | DoodadType::StoneWaterStill | DoodadType::SandstoneWaterStill
        )
    }

    /// Lit or unlit water still
    pub fn is_water_still(&self) -> bool {
        self.is_lit_water_still() || self.is_unlit_water_still()
    }
}

/// A placed world object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doodad {
    pub doodad_type: DoodadType,
    /// Remaining liquid ready to gather; `None` when the doodad does not track it
    #[serde(default)]
    pub gather_ready: Option<i32>,
    /// Container attached under a water still
    #[serde(default)]
    pub still_container: Option<String>,
}

impl Doodad {
    pub fn new(doodad_type: DoodadType) -> Self {
        Self {
            doodad_type,
            gather_ready: None,
            still_container: None,
        }
    }
}

/// Queries the engine issues against host state.
///
/// Every method answers "nothing" (None / empty / false) when the host has no
/// such state, and requirements treat that as not satisfied.
pub trait HostWorld {
    /// Tile the player is facing
    fn facing_tile(&self, player_id: &str) -> Option<TilePos>;

    /// Doodad placed on a tile
    fn doodad_at(&self, tile: TilePos) -> Option<&Doodad>;

    /// Item type held in each quickslot, in slot order
    fn quickslots(&self, player_id: &str) -> Vec<Option<String>>;

    /// Item type equipped in a slot
    fn equipped(&self, player_id: &str, slot: EquipSlot) -> Option<String>;

    /// Item types and counts in the player's inventory
    fn inventory(&self, player_id: &str) -> Vec<(String, u32)>;

    /// Whether an item type belongs to an item type group
    fn is_in_group(&self, item_type: &str, group: &str) -> bool;

    /// Doodad on the tile the player is facing
    fn facing_doodad(&self, player_id: &str) -> Option<&Doodad> {
        self.facing_tile(player_id).and_then(|tile| self.doodad_at(tile))
    }
}

/// Per-player slice of [`InMemoryWorld`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerView {
    #[serde(default)]
    pub facing: Option<TilePos>,
    #[serde(default)]
    pub quickslots: Vec<Option<String>>,
    #[serde(default)]
    pub equipped: HashMap<EquipSlot, String>,
    #[serde(default)]
    pub inventory: HashMap<String, u32>,
}

/// Self-contained host world used by the replay tool and tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryWorld {
    #[serde(default)]
    pub players: HashMap<String, PlayerView>,
    /// Doodads keyed by tile; kept as a list so the JSON form stays simple
    #[serde(default)]
    pub doodads: Vec<(TilePos, Doodad)>,
    /// Item type group -> member item types
    #[serde(default)]
    pub groups: HashMap<String, HashSet<String>>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_mut(&mut self, player_id: &str) -> &mut PlayerView {
        self.players.entry(player_id.to_string()).or_default()
    }

    pub fn set_facing(&mut self, player_id: &str, tile: Option<TilePos>) {
        self.player_mut(player_id).facing = tile;
    }

    /// Place or clear the doodad on a tile
    pub fn set_doodad(&mut self, tile: TilePos, doodad: Option<Doodad>) {
        self.doodads.retain(|(pos, _)| *pos != tile);
        if let Some(doodad) = doodad {
            self.doodads.push((tile, doodad));
        }
    }

    pub fn add_to_group(&mut self, group: &str, item_type: &str) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(item_type.to_string());
    }
}

impl HostWorld for InMemoryWorld {
    fn facing_tile(&self, player_id: &str) -> Option<TilePos> {
        self.players.get(player_id).and_then(|p| p.facing)
    }

    fn doodad_at(&self, tile: TilePos) -> Option<&Doodad> {
        self.doodads
            .iter()
            .find(|(pos, _)| *pos == tile)
            .map(|(_, doodad)| doodad)
    }

    fn quickslots(&self, player_id: &str) -> Vec<Option<String>> {
        self.players
            .get(player_id)
            .map(|p| p.quickslots.clone())
            .unwrap_or_default()
    }

    fn equipped(&self, player_id: &str, slot: EquipSlot) -> Option<String> {
        self.players
            .get(player_id)
            .and_then(|p| p.equipped.get(&slot).cloned())
    }

    fn inventory(&self, player_id: &str) -> Vec<(String, u32)> {
        self.players
            .get(player_id)
            .map(|p| p.inventory.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default()
    }

    fn is_in_group(&self, item_type: &str, group: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|members| members.contains(item_type))
    }
}
