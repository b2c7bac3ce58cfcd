//! Script Replay
//!
//! Drives the engine from a JSON-lines script: each line is a step that
//! configures the session, edits the in-memory host world, or delivers a
//! host event.

use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::Result;
use crate::quest::adapter::{HostEvent, Normalized, normalize};
use crate::quest::events::QuestUpdate;
use crate::quest::host::{Doodad, InMemoryWorld, TilePos};
use crate::quest::manager::QuestManager;
use crate::quest::registry::QuestRegistry;
use crate::quest::session::{GameMode, MultiplayerRole, SessionContext};
use crate::quest::state::PlayerQuestSet;

/// One line of a replay script
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    Session {
        #[serde(default)]
        game_mode: GameMode,
        #[serde(default)]
        role: MultiplayerRole,
        #[serde(default)]
        local_player: Option<String>,
    },
    /// Replace the whole host world
    World { world: InMemoryWorld },
    Doodad {
        tile: TilePos,
        #[serde(default)]
        doodad: Option<Doodad>,
    },
    Facing {
        player_id: String,
        #[serde(default)]
        tile: Option<TilePos>,
    },
    Event { event: HostEvent },
    Complete { player_id: String, quest_id: String },
    /// Log the player's quest set as a save snapshot
    Save { player_id: String },
}

/// Engine plus the session and host world a script manipulates
pub struct Replay {
    manager: QuestManager,
    world: InMemoryWorld,
    game_mode: GameMode,
    role: MultiplayerRole,
    local_player: Option<String>,
}

impl Replay {
    pub fn new(manager: QuestManager) -> Self {
        Self {
            manager,
            world: InMemoryWorld::new(),
            game_mode: GameMode::default(),
            role: MultiplayerRole::default(),
            local_player: None,
        }
    }

    pub fn manager(&self) -> &QuestManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut QuestManager {
        &mut self.manager
    }

    pub fn world(&self) -> &InMemoryWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut InMemoryWorld {
        &mut self.world
    }

    /// Swap in a re-linked registry against the current session
    pub fn replace_registry(&mut self, registry: Arc<QuestRegistry>) -> Vec<QuestUpdate> {
        let ctx = SessionContext {
            game_mode: self.game_mode,
            role: self.role,
            local_player: self.local_player.as_deref(),
            world: &self.world,
        };
        self.manager.replace_registry(&ctx, registry)
    }

    /// Restore a saved quest set against the current session
    pub fn load_player(&mut self, player_id: &str, set: PlayerQuestSet) -> Vec<QuestUpdate> {
        let ctx = SessionContext {
            game_mode: self.game_mode,
            role: self.role,
            local_player: self.local_player.as_deref(),
            world: &self.world,
        };
        self.manager.load_player(&ctx, player_id, set)
    }

    /// Apply one step and return the quest updates it caused
    pub fn apply(&mut self, step: ScriptStep) -> Result<Vec<QuestUpdate>> {
        let ctx = SessionContext {
            game_mode: self.game_mode,
            role: self.role,
            local_player: self.local_player.as_deref(),
            world: &self.world,
        };

        match step {
            ScriptStep::Event { event } => match normalize(event) {
                Some(Normalized::Quest(event)) => Ok(self.manager.handle_event(&ctx, &event)),
                Some(Normalized::Lifecycle(event)) => self.manager.on_lifecycle(&ctx, &event),
                None => Ok(Vec::new()),
            },
            ScriptStep::Complete { player_id, quest_id } => {
                self.manager.complete_quest(&ctx, &player_id, &quest_id)
            }
            ScriptStep::Save { player_id } => {
                match self.manager.player_quests(&player_id) {
                    Some(set) => info!("Player {} quest state: {}", player_id, set.to_json()?),
                    None => info!("Player {} has no quest state", player_id),
                }
                Ok(Vec::new())
            }
            ScriptStep::Session {
                game_mode,
                role,
                local_player,
            } => {
                debug!("Session: {:?} {:?} local={:?}", game_mode, role, local_player);
                self.game_mode = game_mode;
                self.role = role;
                self.local_player = local_player;
                Ok(Vec::new())
            }
            ScriptStep::World { world } => {
                self.world = world;
                Ok(Vec::new())
            }
            ScriptStep::Doodad { tile, doodad } => {
                self.world.set_doodad(tile, doodad);
                Ok(Vec::new())
            }
            ScriptStep::Facing { player_id, tile } => {
                self.world.set_facing(&player_id, tile);
                Ok(Vec::new())
            }
        }
    }
}

/// Parse script lines from `reader` and forward them until EOF.
///
/// Blank lines and lines starting with `#` are skipped. Returns the number of
/// steps sent.
pub async fn stream_script<R>(reader: R, tx: mpsc::Sender<ScriptStep>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut sent = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step: ScriptStep = serde_json::from_str(line)?;
        if tx.send(step).await.is_err() {
            // Replay loop stopped
            break;
        }
        sent += 1;
    }

    Ok(sent)
}
