//! Session Context
//!
//! Everything the engine needs to know about the running game that is not
//! part of a single event: game mode, multiplayer role, local player and the
//! host world to query.

use serde::{Deserialize, Serialize};

use super::host::HostWorld;

/// Game modes the host can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    Hardcore,
    #[default]
    Casual,
    Challenge,
    Custom,
}

impl GameMode {
    /// Tutorial quests are handed out in every mode except Challenge
    pub fn permits_tutorial(&self) -> bool {
        !matches!(self, GameMode::Challenge)
    }
}

/// Role of this process in a multiplayer session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MultiplayerRole {
    /// Not connected to anyone
    #[default]
    Offline,
    /// Hosting a session; owns quest state for every player
    Host,
    /// Connected to someone else's session
    Client,
}

impl MultiplayerRole {
    /// Whether this process owns quest state mutation
    pub fn is_authoritative(&self) -> bool {
        !matches!(self, MultiplayerRole::Client)
    }
}

/// Context threaded through bootstrap and event dispatch
#[derive(Clone, Copy)]
pub struct SessionContext<'a> {
    pub game_mode: GameMode,
    pub role: MultiplayerRole,
    /// Player controlled by this process, if any
    pub local_player: Option<&'a str>,
    pub world: &'a dyn HostWorld,
}

impl<'a> SessionContext<'a> {
    pub fn new(world: &'a dyn HostWorld) -> Self {
        Self {
            game_mode: GameMode::default(),
            role: MultiplayerRole::default(),
            local_player: None,
            world,
        }
    }

    pub fn with_game_mode(mut self, game_mode: GameMode) -> Self {
        self.game_mode = game_mode;
        self
    }

    pub fn with_role(mut self, role: MultiplayerRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_local_player(mut self, player_id: &'a str) -> Self {
        self.local_player = Some(player_id);
        self
    }

    pub fn is_authoritative(&self) -> bool {
        self.role.is_authoritative()
    }
}

impl std::fmt::Debug for SessionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("game_mode", &self.game_mode)
            .field("role", &self.role)
            .field("local_player", &self.local_player)
            .finish_non_exhaustive()
    }
}
