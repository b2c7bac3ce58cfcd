//! Quest Manager
//!
//! Owns every player's quest set. Routes normalized events to the
//! requirements of the acting player's active quests, completes quests whose
//! requirements are all met and activates their children.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::definition::{QuestHandle, Requirement};
use super::events::{EventName, QuestEvent, QuestUpdate};
use super::host::HostWorld;
use super::registry::QuestRegistry;
use super::requirement::{
    RequirementContext, counted_amount, counted_initial, equip_initial, equip_satisfied,
};
use super::session::SessionContext;
use super::state::{PlayerQuestSet, QuestInstance, QuestStatus};
use crate::error::Result;

/// One requirement of one quest listening to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub quest: QuestHandle,
    /// Index into the quest's requirement list
    pub requirement: usize,
}

/// Event name -> interested requirements, in quest declaration order
#[derive(Debug, Default)]
pub struct DispatchTable {
    subscribers: HashMap<EventName, Vec<Subscription>>,
}

impl DispatchTable {
    pub fn build(registry: &QuestRegistry) -> Self {
        let mut subscribers: HashMap<EventName, Vec<Subscription>> = HashMap::new();

        for quest in registry.handles() {
            for (requirement, req) in registry.get(quest).requirements.iter().enumerate() {
                let names = match req {
                    Requirement::Counted(counted) => vec![counted.kind.event_name()],
                    Requirement::Equip(_) => vec![EventName::ItemEquipped],
                    Requirement::Trigger(handle) => registry.trigger(*handle).subscriptions(),
                };
                for name in names {
                    subscribers
                        .entry(name)
                        .or_default()
                        .push(Subscription { quest, requirement });
                }
            }
        }

        Self { subscribers }
    }

    pub fn subscribers(&self, name: EventName) -> &[Subscription] {
        self.subscribers.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Per-player quest scheduler
pub struct QuestManager {
    registry: Arc<QuestRegistry>,
    dispatch: DispatchTable,
    players: HashMap<String, PlayerQuestSet>,
}

impl QuestManager {
    pub fn new(registry: Arc<QuestRegistry>) -> Self {
        let dispatch = DispatchTable::build(&registry);
        Self {
            registry,
            dispatch,
            players: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<QuestRegistry> {
        &self.registry
    }

    /// Swap in a re-linked registry, keeping every player's progress.
    ///
    /// Instances the new definitions leave fully satisfied complete now, and
    /// completed quests that gained children activate them.
    pub fn replace_registry(
        &mut self,
        ctx: &SessionContext<'_>,
        registry: Arc<QuestRegistry>,
    ) -> Vec<QuestUpdate> {
        self.dispatch = DispatchTable::build(&registry);
        let mut updates = Vec::new();
        for (player_id, set) in &mut self.players {
            conform_set(&registry, player_id, set);
            let queue = resume_steps(&registry, set);
            run_steps(&registry, set, ctx.world, player_id, queue, &mut updates);
        }
        info!("Quest registry replaced ({} quests)", registry.count());
        self.registry = registry;
        updates
    }

    /// Install a player's saved quest set (called on join)
    pub fn load_player(
        &mut self,
        ctx: &SessionContext<'_>,
        player_id: &str,
        mut set: PlayerQuestSet,
    ) -> Vec<QuestUpdate> {
        let registry = Arc::clone(&self.registry);
        conform_set(&registry, player_id, &mut set);
        let mut updates = Vec::new();
        let queue = resume_steps(&registry, &set);
        run_steps(&registry, &mut set, ctx.world, player_id, queue, &mut updates);
        self.players.insert(player_id.to_string(), set);
        updates
    }

    /// Take a player's quest set for saving (called on leave)
    pub fn remove_player(&mut self, player_id: &str) -> Option<PlayerQuestSet> {
        self.players.remove(player_id)
    }

    pub fn player_quests(&self, player_id: &str) -> Option<&PlayerQuestSet> {
        self.players.get(player_id)
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.players.keys().map(String::as_str)
    }

    pub fn status(&self, player_id: &str, quest_id: &str) -> QuestStatus {
        self.players
            .get(player_id)
            .map(|set| set.status(quest_id))
            .unwrap_or(QuestStatus::NotStarted)
    }

    /// Route one event to the acting player's active quests
    pub fn handle_event(&mut self, ctx: &SessionContext<'_>, event: &QuestEvent) -> Vec<QuestUpdate> {
        let registry = Arc::clone(&self.registry);
        let player_id = event.player_id();
        let Some(set) = self.players.get_mut(player_id) else {
            debug!("Ignoring {} for player {} with no quests", event.name.as_str(), player_id);
            return Vec::new();
        };

        let req_ctx = RequirementContext::new(player_id, ctx.world);
        let mut updates = Vec::new();
        let mut touched = Vec::new();

        for sub in self.dispatch.subscribers(event.name) {
            let definition = registry.get(sub.quest);
            let Some(instance) = set.get_mut(&definition.id) else {
                continue;
            };
            if !instance.is_active() {
                continue;
            }
            let (Some(progress), Some(requirement)) = (
                instance.requirements.get_mut(sub.requirement),
                definition.requirements.get(sub.requirement),
            ) else {
                continue;
            };
            if progress.satisfied {
                continue;
            }

            let advanced = match requirement {
                Requirement::Counted(counted) => {
                    let amount = counted_amount(counted, &req_ctx, event);
                    progress.add_progress(amount);
                    amount > 0
                }
                Requirement::Equip(equip) => {
                    equip_satisfied(equip, &req_ctx, event) && progress.force_satisfy()
                }
                Requirement::Trigger(handle) => {
                    registry.trigger(*handle).evaluate(&req_ctx, event) && progress.force_satisfy()
                }
            };

            if advanced {
                debug!(
                    "Player {} progress on requirement {} for quest {}: {}/{}",
                    player_id, sub.requirement, definition.id, progress.current, progress.target
                );
                updates.push(QuestUpdate::Progressed {
                    player_id: player_id.to_string(),
                    quest_id: definition.id.clone(),
                    requirement: sub.requirement,
                    current: progress.current,
                    target: progress.target,
                    satisfied: progress.satisfied,
                });
                if !touched.contains(&sub.quest) {
                    touched.push(sub.quest);
                }
            }
        }

        let queue = touched.into_iter().map(Step::TryComplete).collect();
        run_steps(&registry, set, ctx.world, player_id, queue, &mut updates);
        updates
    }

    /// Explicit completion for quests that need it.
    ///
    /// No-op unless the quest is active with every requirement satisfied.
    pub fn complete_quest(
        &mut self,
        ctx: &SessionContext<'_>,
        player_id: &str,
        quest_id: &str,
    ) -> Result<Vec<QuestUpdate>> {
        let registry = Arc::clone(&self.registry);
        let handle = registry.quest(quest_id)?;
        let mut updates = Vec::new();

        let Some(set) = self.players.get_mut(player_id) else {
            warn!("Cannot complete quest {} for unknown player {}", quest_id, player_id);
            return Ok(updates);
        };
        let Some(instance) = set.get(quest_id) else {
            debug!("Player {} has not started quest {}", player_id, quest_id);
            return Ok(updates);
        };
        if !instance.is_active() {
            debug!(
                "Player {} quest {} is {}, not active",
                player_id,
                quest_id,
                instance.status.as_str()
            );
            return Ok(updates);
        }
        if !instance.all_satisfied() {
            debug!("Player {} quest {} still has unmet requirements", player_id, quest_id);
            return Ok(updates);
        }

        let mut queue = VecDeque::new();
        complete_instance(&registry, set, player_id, handle, &mut queue, &mut updates);
        run_steps(&registry, set, ctx.world, player_id, queue, &mut updates);
        Ok(updates)
    }

    /// Create and activate an instance unless the player already has one
    pub(crate) fn activate(
        &mut self,
        ctx: &SessionContext<'_>,
        player_id: &str,
        handle: QuestHandle,
    ) -> Vec<QuestUpdate> {
        let registry = Arc::clone(&self.registry);
        let set = self.players.entry(player_id.to_string()).or_default();
        let mut updates = Vec::new();
        run_steps(
            &registry,
            set,
            ctx.world,
            player_id,
            VecDeque::from([Step::Activate(handle)]),
            &mut updates,
        );
        updates
    }

    pub(crate) fn has_instance(&self, player_id: &str, quest_id: &str) -> bool {
        self.players
            .get(player_id)
            .is_some_and(|set| set.contains(quest_id))
    }
}

enum Step {
    TryComplete(QuestHandle),
    Activate(QuestHandle),
}

fn run_steps(
    registry: &QuestRegistry,
    set: &mut PlayerQuestSet,
    world: &dyn HostWorld,
    player_id: &str,
    mut queue: VecDeque<Step>,
    updates: &mut Vec<QuestUpdate>,
) {
    while let Some(step) = queue.pop_front() {
        match step {
            Step::TryComplete(handle) => {
                let definition = registry.get(handle);
                let ready = set.get(&definition.id).is_some_and(|instance| {
                    instance.is_active()
                        && instance.all_satisfied()
                        && !definition.needs_manual_completion
                });
                if ready {
                    complete_instance(registry, set, player_id, handle, &mut queue, updates);
                }
            }
            Step::Activate(handle) => {
                let definition = registry.get(handle);
                if set.contains(&definition.id) {
                    continue;
                }

                let instance = initialize_instance(registry, handle, world, player_id, updates);
                set.insert(instance);
                queue.push_back(Step::TryComplete(handle));
            }
        }
    }
}

/// Build an active instance and run every initialize snapshot against it
fn initialize_instance(
    registry: &QuestRegistry,
    handle: QuestHandle,
    world: &dyn HostWorld,
    player_id: &str,
    updates: &mut Vec<QuestUpdate>,
) -> QuestInstance {
    let definition = registry.get(handle);
    let mut instance = QuestInstance::new(&definition.id, &definition.targets());
    let ctx = RequirementContext::new(player_id, world);

    info!("Player {} started quest {}", player_id, definition.id);
    updates.push(QuestUpdate::Activated {
        player_id: player_id.to_string(),
        quest_id: definition.id.clone(),
    });

    for (index, (requirement, progress)) in definition
        .requirements
        .iter()
        .zip(instance.requirements.iter_mut())
        .enumerate()
    {
        let before = progress.current;
        match requirement {
            Requirement::Counted(counted) => {
                progress.observe(counted_initial(counted, &ctx));
            }
            Requirement::Equip(equip) => {
                if equip_initial(equip, &ctx) {
                    progress.force_satisfy();
                }
            }
            Requirement::Trigger(trigger) => {
                if registry.trigger(*trigger).evaluate_initial(&ctx) {
                    progress.force_satisfy();
                }
            }
        }

        if progress.current != before {
            debug!(
                "Player {} quest {} requirement {} already at {}/{}",
                player_id, definition.id, index, progress.current, progress.target
            );
            updates.push(QuestUpdate::Progressed {
                player_id: player_id.to_string(),
                quest_id: definition.id.clone(),
                requirement: index,
                current: progress.current,
                target: progress.target,
                satisfied: progress.satisfied,
            });
        }
    }

    instance
}

fn complete_instance(
    registry: &QuestRegistry,
    set: &mut PlayerQuestSet,
    player_id: &str,
    handle: QuestHandle,
    queue: &mut VecDeque<Step>,
    updates: &mut Vec<QuestUpdate>,
) {
    let definition = registry.get(handle);
    let Some(instance) = set.get_mut(&definition.id) else {
        return;
    };
    if !instance.complete() {
        return;
    }

    info!(
        "Player {} completed quest {} ({}s)",
        player_id,
        definition.id,
        instance.duration_secs().unwrap_or(0)
    );
    updates.push(QuestUpdate::Completed {
        player_id: player_id.to_string(),
        quest_id: definition.id.clone(),
    });
    queue.extend(definition.children.iter().copied().map(Step::Activate));
}

/// Steps that bring a conformed set back in line with the graph: completion
/// checks for satisfied active quests and child activation for completed ones
fn resume_steps(registry: &QuestRegistry, set: &PlayerQuestSet) -> VecDeque<Step> {
    let mut queue = VecDeque::new();
    for instance in &set.instances {
        let Ok(handle) = registry.quest(&instance.quest_id) else {
            continue;
        };
        match instance.status {
            QuestStatus::Active => queue.push_back(Step::TryComplete(handle)),
            QuestStatus::Complete => queue.extend(
                registry
                    .get(handle)
                    .children
                    .iter()
                    .copied()
                    .map(Step::Activate),
            ),
            QuestStatus::NotStarted => {}
        }
    }
    queue
}

fn conform_set(registry: &QuestRegistry, player_id: &str, set: &mut PlayerQuestSet) {
    for instance in &mut set.instances {
        match registry.get_by_id(&instance.quest_id) {
            Some(definition) => instance.conform(&definition.targets()),
            None => warn!(
                "Player {} has quest {} which is no longer defined",
                player_id, instance.quest_id
            ),
        }
    }
}
