//! Bootstrap Hook
//!
//! Hands the root quest to players when they join or when the game starts.

use tracing::{debug, info, warn};

use super::adapter::LifecycleEvent;
use super::events::QuestUpdate;
use super::manager::QuestManager;
use super::session::SessionContext;
use crate::error::{QuestError, Result};

impl QuestManager {
    /// Give `player_id` the root quest unless they already have it or the
    /// game mode does not allow tutorial quests
    pub fn ensure_started(&mut self, ctx: &SessionContext<'_>, player_id: &str) -> Result<Vec<QuestUpdate>> {
        let root = self
            .registry()
            .root()
            .ok_or_else(|| QuestError::Config("No root quest designated".to_string()))?;

        if !ctx.game_mode.permits_tutorial() {
            debug!("Game mode {:?} does not hand out tutorial quests", ctx.game_mode);
            return Ok(Vec::new());
        }

        let root_id = self.registry().get(root).id.clone();
        if self.has_instance(player_id, &root_id) {
            return Ok(Vec::new());
        }

        info!("Giving player {} the starter quest {}", player_id, root_id);
        Ok(self.activate(ctx, player_id, root))
    }

    /// React to a player join or game start
    pub fn on_lifecycle(&mut self, ctx: &SessionContext<'_>, event: &LifecycleEvent) -> Result<Vec<QuestUpdate>> {
        match event {
            LifecycleEvent::PlayerJoined { player_id } => {
                if !ctx.is_authoritative() {
                    debug!("Not authoritative; leaving quests for {} to the host", player_id);
                    return Ok(Vec::new());
                }
                self.ensure_started(ctx, player_id)
            }
            LifecycleEvent::GameStarted { is_loading_save } => {
                if !ctx.is_authoritative() {
                    return Ok(Vec::new());
                }
                match ctx.local_player {
                    Some(player_id) => {
                        debug!("Game started (loading save: {})", is_loading_save);
                        self.ensure_started(ctx, player_id)
                    }
                    None => {
                        warn!("Game started without a local player");
                        Ok(Vec::new())
                    }
                }
            }
        }
    }
}
