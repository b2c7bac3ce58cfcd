//! Quest Definition Structures
//!
//! Declarations (as written in code or deserialized from TOML quest files)
//! and the linked definitions the registry hands out after resolution.

use serde::{Deserialize, Serialize};

use super::events::{EquipSlot, EventName};

/// A quest declaration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: String,
    /// Quests activated when this one completes
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub needs_manual_completion: bool,
    #[serde(default)]
    pub requirements: Vec<RawRequirement>,
}

/// Raw requirement as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawRequirement {
    #[serde(rename = "type")]
    pub requirement_type: String,
    /// Named requirement id (for `type = "named"`)
    pub id: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default = "default_count")]
    pub count: u32,
    /// Slots for `type = "equip"`
    #[serde(default)]
    pub slots: Vec<EquipSlot>,
}

fn default_count() -> u32 {
    1
}

// ============================================================================
// Requirement Declarations
// ============================================================================

/// Matches an item by exact type or by item type group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemMatcher {
    Type(String),
    Group(String),
}

impl ItemMatcher {
    pub fn item(item_type: &str) -> Self {
        ItemMatcher::Type(item_type.to_string())
    }

    pub fn group(group: &str) -> Self {
        ItemMatcher::Group(group.to_string())
    }
}

/// What a counted requirement counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountKind {
    CollectItem,
    Craft,
    Dismantle,
    KillCreatures,
    TameCreatures,
    Build,
}

impl CountKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "collect_item" | "collect" => Some(CountKind::CollectItem),
            "craft" => Some(CountKind::Craft),
            "dismantle" => Some(CountKind::Dismantle),
            "kill_creatures" | "kill" => Some(CountKind::KillCreatures),
            "tame_creatures" | "tame" => Some(CountKind::TameCreatures),
            "build" => Some(CountKind::Build),
            _ => None,
        }
    }

    /// Event this kind of requirement listens to
    pub fn event_name(&self) -> EventName {
        match self {
            CountKind::CollectItem => EventName::ItemCollected,
            CountKind::Craft => EventName::ItemCrafted,
            CountKind::Dismantle => EventName::ItemDismantled,
            CountKind::KillCreatures => EventName::CreatureKilled,
            CountKind::TameCreatures => EventName::CreatureTamed,
            CountKind::Build => EventName::DoodadBuilt,
        }
    }
}

/// Collect/craft/dismantle/kill/tame/build N of something
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountedRequirement {
    pub kind: CountKind,
    /// Empty means any item or creature counts
    pub matchers: Vec<ItemMatcher>,
    pub count: u32,
}

/// Equip an item matching one of `matchers` into one of `slots`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquipRequirement {
    pub slots: Vec<EquipSlot>,
    pub matchers: Vec<ItemMatcher>,
}

/// A requirement reference inside a quest declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementSpec {
    /// Shared named requirement, resolved at link time
    Named(String),
    Counted(CountedRequirement),
    Equip(EquipRequirement),
}

impl RequirementSpec {
    pub fn named(id: &str) -> Self {
        RequirementSpec::Named(id.to_string())
    }

    pub fn counted(kind: CountKind, matchers: Vec<ItemMatcher>, count: u32) -> Self {
        RequirementSpec::Counted(CountedRequirement {
            kind,
            matchers,
            count: count.max(1),
        })
    }

    pub fn collect(matchers: Vec<ItemMatcher>, count: u32) -> Self {
        Self::counted(CountKind::CollectItem, matchers, count)
    }

    pub fn craft(matchers: Vec<ItemMatcher>, count: u32) -> Self {
        Self::counted(CountKind::Craft, matchers, count)
    }

    pub fn dismantle(matchers: Vec<ItemMatcher>, count: u32) -> Self {
        Self::counted(CountKind::Dismantle, matchers, count)
    }

    pub fn kill(count: u32) -> Self {
        Self::counted(CountKind::KillCreatures, Vec::new(), count)
    }

    pub fn tame(count: u32) -> Self {
        Self::counted(CountKind::TameCreatures, Vec::new(), count)
    }

    pub fn build(matchers: Vec<ItemMatcher>) -> Self {
        Self::counted(CountKind::Build, matchers, 1)
    }

    pub fn equip(slots: Vec<EquipSlot>, matchers: Vec<ItemMatcher>) -> Self {
        RequirementSpec::Equip(EquipRequirement { slots, matchers })
    }

    pub fn from_raw(raw: &RawRequirement) -> Result<Self, String> {
        let matchers: Vec<ItemMatcher> = raw
            .items
            .iter()
            .map(|i| ItemMatcher::item(i))
            .chain(raw.groups.iter().map(|g| ItemMatcher::group(g)))
            .collect();

        match raw.requirement_type.to_lowercase().as_str() {
            "named" => raw
                .id
                .as_deref()
                .map(Self::named)
                .ok_or_else(|| "Named requirement is missing 'id'".to_string()),
            "equip" => {
                if raw.slots.is_empty() {
                    return Err("Equip requirement has no slots".to_string());
                }
                Ok(Self::equip(raw.slots.clone(), matchers))
            }
            other => {
                let kind = CountKind::from_str(other)
                    .ok_or_else(|| format!("Invalid requirement type '{}'", other))?;
                Ok(Self::counted(kind, matchers, raw.count))
            }
        }
    }
}

/// An unlinked quest node; children and named requirements are plain ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestDeclaration {
    pub id: String,
    pub requirements: Vec<RequirementSpec>,
    pub children: Vec<String>,
    /// Completion waits for an explicit call even when every requirement is met
    pub needs_manual_completion: bool,
}

impl QuestDeclaration {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            requirements: Vec::new(),
            children: Vec::new(),
            needs_manual_completion: false,
        }
    }

    pub fn requires(mut self, requirement: RequirementSpec) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn child(mut self, quest_id: &str) -> Self {
        self.children.push(quest_id.to_string());
        self
    }

    pub fn manual_completion(mut self) -> Self {
        self.needs_manual_completion = true;
        self
    }

    /// Create a declaration from raw TOML data
    pub fn from_raw(raw: &RawQuest) -> Result<Self, String> {
        let requirements = raw
            .requirements
            .iter()
            .enumerate()
            .map(|(i, r)| RequirementSpec::from_raw(r).map_err(|e| format!("{} at index {}", e, i)))
            .collect::<Result<Vec<_>, _>>()?;

        if requirements.is_empty() && !raw.needs_manual_completion {
            return Err(format!(
                "Quest '{}' has no requirements and does not need manual completion",
                raw.id
            ));
        }

        Ok(Self {
            id: raw.id.clone(),
            requirements,
            children: raw.children.clone(),
            needs_manual_completion: raw.needs_manual_completion,
        })
    }
}

// ============================================================================
// Linked Definitions
// ============================================================================

/// Handle to a linked quest definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestHandle(pub(crate) usize);

/// Handle to a named requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequirementHandle(pub(crate) usize);

/// A requirement after linking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Counted(CountedRequirement),
    Equip(EquipRequirement),
    Trigger(RequirementHandle),
}

impl Requirement {
    /// Progress needed to satisfy the requirement
    pub fn target(&self) -> u32 {
        match self {
            Requirement::Counted(counted) => counted.count,
            Requirement::Equip(_) | Requirement::Trigger(_) => 1,
        }
    }
}

/// A fully linked quest definition
#[derive(Debug, Clone)]
pub struct QuestDefinition {
    pub id: String,
    pub requirements: Vec<Requirement>,
    pub children: Vec<QuestHandle>,
    pub needs_manual_completion: bool,
}

impl QuestDefinition {
    /// Targets for each requirement, in declaration order
    pub fn targets(&self) -> Vec<u32> {
        self.requirements.iter().map(Requirement::target).collect()
    }
}
