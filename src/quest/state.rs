//! Quest State Tracking
//!
//! Tracks per-player quest instances, requirement progress and status, and
//! serializes them for the host save system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Status of a quest for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestStatus {
    /// No instance exists yet
    NotStarted,
    /// Quest is active and in progress
    Active,
    /// Quest has been completed
    Complete,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::NotStarted => "not_started",
            QuestStatus::Active => "active",
            QuestStatus::Complete => "complete",
        }
    }
}

/// Progress on a single requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementProgress {
    pub current: u32,
    pub target: u32,
    pub satisfied: bool,
}

impl RequirementProgress {
    pub fn new(target: u32) -> Self {
        Self {
            current: 0,
            target,
            satisfied: false,
        }
    }

    /// Add progress and return true if newly satisfied
    pub fn add_progress(&mut self, amount: u32) -> bool {
        if self.satisfied || amount == 0 {
            return false;
        }
        self.current = self.current.saturating_add(amount).min(self.target);
        if self.current >= self.target {
            self.satisfied = true;
            true
        } else {
            false
        }
    }

    /// Raise progress to an observed total; never lowers it
    pub fn observe(&mut self, total: u32) -> bool {
        let amount = total.min(self.target).saturating_sub(self.current);
        self.add_progress(amount)
    }

    /// Mark as satisfied regardless of count
    pub fn force_satisfy(&mut self) -> bool {
        if self.satisfied {
            return false;
        }
        self.current = self.target;
        self.satisfied = true;
        true
    }
}

/// Progress of one quest for one player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestInstance {
    pub quest_id: String,
    pub status: QuestStatus,
    /// Progress on each requirement, in declaration order
    pub requirements: Vec<RequirementProgress>,
    /// When the quest was activated
    pub started_at: Option<DateTime<Utc>>,
    /// When the quest was completed
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuestInstance {
    /// A freshly activated instance
    pub fn new(quest_id: &str, targets: &[u32]) -> Self {
        Self {
            quest_id: quest_id.to_string(),
            status: QuestStatus::Active,
            requirements: targets.iter().map(|t| RequirementProgress::new(*t)).collect(),
            started_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == QuestStatus::Active
    }

    /// Every requirement satisfied (vacuously true without requirements)
    pub fn all_satisfied(&self) -> bool {
        self.requirements.iter().all(|r| r.satisfied)
    }

    /// Mark quest as complete; returns false if it already was
    pub fn complete(&mut self) -> bool {
        if self.status == QuestStatus::Complete {
            return false;
        }
        self.status = QuestStatus::Complete;
        self.completed_at = Some(Utc::now());
        true
    }

    /// Reshape progress to match a (possibly reloaded) definition
    pub fn conform(&mut self, targets: &[u32]) {
        self.requirements.truncate(targets.len());
        for (progress, target) in self.requirements.iter_mut().zip(targets) {
            if progress.target != *target {
                progress.target = *target;
                progress.current = progress.current.min(*target);
                progress.satisfied = progress.satisfied || progress.current >= *target;
            }
        }
        for target in targets.iter().skip(self.requirements.len()) {
            self.requirements.push(RequirementProgress::new(*target));
        }
    }

    /// Get duration in seconds (if started)
    pub fn duration_secs(&self) -> Option<i64> {
        self.started_at.map(|start| {
            let end = self.completed_at.unwrap_or_else(Utc::now);
            (end - start).num_seconds()
        })
    }
}

/// All quest instances of a single player, in activation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerQuestSet {
    pub instances: Vec<QuestInstance>,
}

impl PlayerQuestSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, quest_id: &str) -> Option<&QuestInstance> {
        self.instances.iter().find(|i| i.quest_id == quest_id)
    }

    pub fn get_mut(&mut self, quest_id: &str) -> Option<&mut QuestInstance> {
        self.instances.iter_mut().find(|i| i.quest_id == quest_id)
    }

    /// Check if any instance of a quest exists
    pub fn contains(&self, quest_id: &str) -> bool {
        self.get(quest_id).is_some()
    }

    pub fn status(&self, quest_id: &str) -> QuestStatus {
        self.get(quest_id)
            .map(|i| i.status)
            .unwrap_or(QuestStatus::NotStarted)
    }

    pub fn is_quest_active(&self, quest_id: &str) -> bool {
        self.status(quest_id) == QuestStatus::Active
    }

    pub fn is_quest_completed(&self, quest_id: &str) -> bool {
        self.status(quest_id) == QuestStatus::Complete
    }

    /// Add an instance; an existing instance of the same quest wins
    pub fn insert(&mut self, instance: QuestInstance) -> bool {
        if self.contains(&instance.quest_id) {
            return false;
        }
        self.instances.push(instance);
        true
    }

    pub fn active(&self) -> impl Iterator<Item = &QuestInstance> {
        self.instances.iter().filter(|i| i.is_active())
    }

    pub fn completed_ids(&self) -> Vec<&str> {
        self.instances
            .iter()
            .filter(|i| i.status == QuestStatus::Complete)
            .map(|i| i.quest_id.as_str())
            .collect()
    }

    /// Serialize to JSON for the host save system
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
