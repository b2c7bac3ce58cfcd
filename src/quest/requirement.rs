//! Requirement Evaluation
//!
//! Named trigger requirements plus the evaluator for counted and equip
//! requirements. Every evaluation starts by checking that the event was
//! performed by the player who owns the quest instance.

use std::fmt;
use std::sync::Arc;

use super::definition::{CountKind, CountedRequirement, EquipRequirement, ItemMatcher};
use super::events::{EventName, EventPayload, QuestEvent};
use super::host::HostWorld;

/// What a requirement sees while evaluating
#[derive(Clone, Copy)]
pub struct RequirementContext<'a> {
    /// Player that owns the quest instance
    pub owner: &'a str,
    pub world: &'a dyn HostWorld,
}

impl<'a> RequirementContext<'a> {
    pub fn new(owner: &'a str, world: &'a dyn HostWorld) -> Self {
        Self { owner, world }
    }

    fn matches_item(&self, matchers: &[ItemMatcher], item_type: &str) -> bool {
        matchers.is_empty()
            || matchers.iter().any(|m| match m {
                ItemMatcher::Type(t) => t == item_type,
                ItemMatcher::Group(g) => self.world.is_in_group(item_type, g),
            })
    }
}

/// How a trigger gets invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Once per matching event
    EventTriggered,
    /// When a host property (player option) changes
    HostStateTriggered,
    /// Once, when the quest instance activates
    InitializeSnapshot,
}

pub type EventPredicate = Arc<dyn Fn(&RequirementContext<'_>, &QuestEvent) -> bool + Send + Sync>;
pub type HostStatePredicate = Arc<dyn Fn(&RequirementContext<'_>, &str) -> bool + Send + Sync>;
pub type InitializePredicate = Arc<dyn Fn(&RequirementContext<'_>) -> bool + Send + Sync>;

#[derive(Clone)]
enum Trigger {
    Event {
        event: EventName,
        predicate: EventPredicate,
    },
    HostState {
        predicate: HostStatePredicate,
    },
    Initialize {
        predicate: InitializePredicate,
    },
}

impl Trigger {
    fn mode(&self) -> EvaluationMode {
        match self {
            Trigger::Event { .. } => EvaluationMode::EventTriggered,
            Trigger::HostState { .. } => EvaluationMode::HostStateTriggered,
            Trigger::Initialize { .. } => EvaluationMode::InitializeSnapshot,
        }
    }
}

/// A shared, named predicate requirement
#[derive(Clone)]
pub struct TriggerRequirement {
    pub id: String,
    triggers: Vec<Trigger>,
    /// UI selectors to highlight; metadata only
    pub relations: Vec<String>,
}

impl TriggerRequirement {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            triggers: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn on_event<F>(mut self, event: EventName, predicate: F) -> Self
    where
        F: Fn(&RequirementContext<'_>, &QuestEvent) -> bool + Send + Sync + 'static,
    {
        self.triggers.push(Trigger::Event {
            event,
            predicate: Arc::new(predicate),
        });
        self
    }

    /// Invoked with the option key whenever the owner changes an option
    pub fn on_host_state<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequirementContext<'_>, &str) -> bool + Send + Sync + 'static,
    {
        self.triggers.push(Trigger::HostState {
            predicate: Arc::new(predicate),
        });
        self
    }

    pub fn on_initialize<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequirementContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.triggers.push(Trigger::Initialize {
            predicate: Arc::new(predicate),
        });
        self
    }

    pub fn with_relation(mut self, selector: &str) -> Self {
        self.relations.push(selector.to_string());
        self
    }

    pub fn modes(&self) -> Vec<EvaluationMode> {
        self.triggers.iter().map(Trigger::mode).collect()
    }

    /// Event names this requirement must be dispatched
    pub fn subscriptions(&self) -> Vec<EventName> {
        let mut names = Vec::new();
        for trigger in &self.triggers {
            let name = match trigger {
                Trigger::Event { event, .. } => *event,
                Trigger::HostState { .. } => EventName::OptionChanged,
                Trigger::Initialize { .. } => continue,
            };
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Whether `event` satisfies this requirement for `ctx.owner`
    pub fn evaluate(&self, ctx: &RequirementContext<'_>, event: &QuestEvent) -> bool {
        if event.actor != ctx.owner {
            return false;
        }

        self.triggers.iter().any(|trigger| match trigger {
            Trigger::Event { event: name, predicate } => *name == event.name && predicate(ctx, event),
            Trigger::HostState { predicate } => match &event.payload {
                EventPayload::Option { key } if event.name == EventName::OptionChanged => {
                    predicate(ctx, key)
                }
                _ => false,
            },
            Trigger::Initialize { .. } => false,
        })
    }

    /// Whether prior state already satisfies this requirement
    pub fn evaluate_initial(&self, ctx: &RequirementContext<'_>) -> bool {
        self.triggers.iter().any(|trigger| match trigger {
            Trigger::Initialize { predicate } => predicate(ctx),
            _ => false,
        })
    }
}

impl fmt::Debug for TriggerRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerRequirement")
            .field("id", &self.id)
            .field("modes", &self.modes())
            .field("relations", &self.relations)
            .finish()
    }
}

// ============================================================================
// Counted / Equip Evaluation
// ============================================================================

/// Amount a counted requirement advances by for `event`, or 0 when the event
/// does not apply
pub fn counted_amount(
    requirement: &CountedRequirement,
    ctx: &RequirementContext<'_>,
    event: &QuestEvent,
) -> u32 {
    if event.actor != ctx.owner || event.name != requirement.kind.event_name() {
        return 0;
    }

    match (&requirement.kind, &event.payload) {
        (
            CountKind::CollectItem | CountKind::Craft | CountKind::Dismantle | CountKind::Build,
            EventPayload::Item { item_type, count },
        ) => {
            if ctx.matches_item(&requirement.matchers, item_type) {
                *count
            } else {
                0
            }
        }
        (CountKind::KillCreatures | CountKind::TameCreatures, EventPayload::Creature { creature }) => {
            if ctx.matches_item(&requirement.matchers, creature) {
                1
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Matching items the owner already holds; only collect requirements take a
/// snapshot
pub fn counted_initial(requirement: &CountedRequirement, ctx: &RequirementContext<'_>) -> u32 {
    if requirement.kind != CountKind::CollectItem {
        return 0;
    }
    ctx.world
        .inventory(ctx.owner)
        .iter()
        .filter(|(item_type, _)| ctx.matches_item(&requirement.matchers, item_type))
        .map(|(_, count)| *count)
        .fold(0u32, u32::saturating_add)
}

pub fn equip_satisfied(
    requirement: &EquipRequirement,
    ctx: &RequirementContext<'_>,
    event: &QuestEvent,
) -> bool {
    if event.actor != ctx.owner || event.name != EventName::ItemEquipped {
        return false;
    }
    match &event.payload {
        EventPayload::Equip { slot, item_type } => {
            requirement.slots.contains(slot) && ctx.matches_item(&requirement.matchers, item_type)
        }
        _ => false,
    }
}

pub fn equip_initial(requirement: &EquipRequirement, ctx: &RequirementContext<'_>) -> bool {
    requirement.slots.iter().any(|slot| {
        ctx.world
            .equipped(ctx.owner, *slot)
            .is_some_and(|item_type| ctx.matches_item(&requirement.matchers, &item_type))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::definition::RequirementSpec;
    use crate::quest::events::EquipSlot;
    use crate::quest::host::InMemoryWorld;

    fn item_event(name: EventName, actor: &str, item_type: &str, count: u32) -> QuestEvent {
        QuestEvent::new(
            name,
            actor,
            EventPayload::Item {
                item_type: item_type.to_string(),
                count,
            },
        )
    }

    fn counted(spec: RequirementSpec) -> CountedRequirement {
        match spec {
            RequirementSpec::Counted(c) => c,
            other => panic!("not counted: {:?}", other),
        }
    }

    #[test]
    fn test_counted_matches_type_and_group() {
        let mut world = InMemoryWorld::new();
        world.add_to_group("Rock", "LargeRock");
        let ctx = RequirementContext::new("p1", &world);

        let branch = counted(RequirementSpec::collect(vec![ItemMatcher::item("Branch")], 2));
        assert_eq!(counted_amount(&branch, &ctx, &item_event(EventName::ItemCollected, "p1", "Branch", 1)), 1);
        assert_eq!(counted_amount(&branch, &ctx, &item_event(EventName::ItemCollected, "p1", "Log", 1)), 0);
        // Crafting a branch is not collecting one
        assert_eq!(counted_amount(&branch, &ctx, &item_event(EventName::ItemCrafted, "p1", "Branch", 1)), 0);

        let rocks = counted(RequirementSpec::collect(vec![ItemMatcher::group("Rock")], 5));
        assert_eq!(counted_amount(&rocks, &ctx, &item_event(EventName::ItemCollected, "p1", "LargeRock", 3)), 3);
    }

    #[test]
    fn test_counted_ignores_other_players() {
        let world = InMemoryWorld::new();
        let ctx = RequirementContext::new("p1", &world);
        let branch = counted(RequirementSpec::collect(vec![ItemMatcher::item("Branch")], 2));
        assert_eq!(counted_amount(&branch, &ctx, &item_event(EventName::ItemCollected, "p2", "Branch", 2)), 0);
    }

    #[test]
    fn test_kill_any_creature() {
        let world = InMemoryWorld::new();
        let ctx = RequirementContext::new("p1", &world);
        let kill = counted(RequirementSpec::kill(1));
        let event = QuestEvent::new(
            EventName::CreatureKilled,
            "p1",
            EventPayload::Creature { creature: "Rabbit".to_string() },
        );
        assert_eq!(counted_amount(&kill, &ctx, &event), 1);
    }

    #[test]
    fn test_collect_snapshot_counts_inventory() {
        let mut world = InMemoryWorld::new();
        world.player_mut("p1").inventory.insert("Branch".to_string(), 3);
        world.player_mut("p1").inventory.insert("Log".to_string(), 1);
        let ctx = RequirementContext::new("p1", &world);

        let branch = counted(RequirementSpec::collect(vec![ItemMatcher::item("Branch")], 2));
        assert_eq!(counted_initial(&branch, &ctx), 3);

        let craft = counted(RequirementSpec::craft(vec![ItemMatcher::item("Branch")], 1));
        assert_eq!(counted_initial(&craft, &ctx), 0);
    }

    #[test]
    fn test_equip() {
        let mut world = InMemoryWorld::new();
        world.add_to_group("Weapon", "WoodenSword");
        let requirement = EquipRequirement {
            slots: vec![EquipSlot::RightHand, EquipSlot::LeftHand],
            matchers: vec![ItemMatcher::group("Weapon"), ItemMatcher::group("Tool")],
        };

        {
            let ctx = RequirementContext::new("p1", &world);
            assert!(!equip_initial(&requirement, &ctx));

            let head = QuestEvent::new(
                EventName::ItemEquipped,
                "p1",
                EventPayload::Equip { slot: EquipSlot::Head, item_type: "WoodenSword".to_string() },
            );
            assert!(!equip_satisfied(&requirement, &ctx, &head));

            let hand = QuestEvent::new(
                EventName::ItemEquipped,
                "p1",
                EventPayload::Equip { slot: EquipSlot::LeftHand, item_type: "WoodenSword".to_string() },
            );
            assert!(equip_satisfied(&requirement, &ctx, &hand));
        }

        world
            .player_mut("p1")
            .equipped
            .insert(EquipSlot::RightHand, "WoodenSword".to_string());
        let ctx = RequirementContext::new("p1", &world);
        assert!(equip_initial(&requirement, &ctx));
    }

    #[test]
    fn test_trigger_checks_actor_first() {
        let world = InMemoryWorld::new();
        let requirement = TriggerRequirement::new("always").on_event(EventName::QuickslotUpdated, |_, _| true);
        let event = QuestEvent::new(EventName::QuickslotUpdated, "p2", EventPayload::Quickslot { slot: 0 });

        assert!(!requirement.evaluate(&RequirementContext::new("p1", &world), &event));
        assert!(requirement.evaluate(&RequirementContext::new("p2", &world), &event));
    }

    #[test]
    fn test_host_state_trigger_filters_key() {
        let world = InMemoryWorld::new();
        let ctx = RequirementContext::new("p1", &world);
        let requirement = TriggerRequirement::new("hand").on_host_state(|_, key| key == "leftHand");
        assert_eq!(requirement.subscriptions(), vec![EventName::OptionChanged]);
        assert_eq!(requirement.modes(), vec![EvaluationMode::HostStateTriggered]);

        let left = QuestEvent::new(EventName::OptionChanged, "p1", EventPayload::Option { key: "leftHand".to_string() });
        let other = QuestEvent::new(EventName::OptionChanged, "p1", EventPayload::Option { key: "autoSave".to_string() });
        assert!(requirement.evaluate(&ctx, &left));
        assert!(!requirement.evaluate(&ctx, &other));
        assert!(!requirement.evaluate_initial(&ctx));
    }
}
