//! Quest Registry
//!
//! Two-phase construction of the quest graph: declarations are collected
//! first (from code or TOML files under `quests/`), then `link` resolves every
//! child and named requirement reference and rejects cycles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::definition::{
    QuestDeclaration, QuestDefinition, QuestHandle, RawQuestFile, Requirement, RequirementHandle,
    RequirementSpec,
};
use super::requirement::TriggerRequirement;
use crate::error::{QuestError, Result};

/// Collects declarations before linking
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    requirements: Vec<TriggerRequirement>,
    quests: Vec<QuestDeclaration>,
    root: Option<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requirement(&mut self, requirement: TriggerRequirement) -> &mut Self {
        self.requirements.push(requirement);
        self
    }

    pub fn quest(&mut self, quest: QuestDeclaration) -> &mut Self {
        self.quests.push(quest);
        self
    }

    /// Designate the quest bootstrap hands out
    pub fn root(&mut self, quest_id: &str) -> &mut Self {
        self.root = Some(quest_id.to_string());
        self
    }

    /// Load quest declarations from `<data_dir>/quests/**/*.toml`.
    ///
    /// A missing directory is not an error. A file that fails to parse is.
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<usize> {
        let quests_dir = data_dir.join("quests");
        info!("Loading quests from {:?}", quests_dir);

        if !quests_dir.exists() {
            warn!("Quest directory does not exist: {:?}", quests_dir);
            return Ok(0);
        }

        let mut paths = Vec::new();
        collect_toml_files(&quests_dir, &mut paths)?;
        paths.sort();

        for path in &paths {
            let quest = load_quest_file(path)?;
            debug!("Loaded quest declaration: {} from {:?}", quest.id, path);
            self.quests.push(quest);
        }

        info!("Loaded {} quest declarations from files", paths.len());
        Ok(paths.len())
    }

    /// Resolve every reference and build the registry
    pub fn link(self) -> Result<QuestRegistry> {
        let mut requirement_index = HashMap::new();
        for (i, requirement) in self.requirements.iter().enumerate() {
            if requirement_index.insert(requirement.id.clone(), RequirementHandle(i)).is_some() {
                return Err(QuestError::DuplicateDefinition(requirement.id.clone()));
            }
        }

        let mut quest_index = HashMap::new();
        for (i, quest) in self.quests.iter().enumerate() {
            if quest_index.insert(quest.id.clone(), QuestHandle(i)).is_some() {
                return Err(QuestError::DuplicateDefinition(quest.id.clone()));
            }
        }

        let unresolved = |quest: &str, reference: &str| QuestError::UnresolvedReference {
            quest: quest.to_string(),
            reference: reference.to_string(),
        };

        let mut quests = Vec::with_capacity(self.quests.len());
        for decl in &self.quests {
            let requirements = decl
                .requirements
                .iter()
                .map(|spec| match spec {
                    RequirementSpec::Named(id) => requirement_index
                        .get(id)
                        .map(|h| Requirement::Trigger(*h))
                        .ok_or_else(|| unresolved(&decl.id, id)),
                    RequirementSpec::Counted(counted) => Ok(Requirement::Counted(counted.clone())),
                    RequirementSpec::Equip(equip) => Ok(Requirement::Equip(equip.clone())),
                })
                .collect::<Result<Vec<_>>>()?;

            let children = decl
                .children
                .iter()
                .map(|id| quest_index.get(id).copied().ok_or_else(|| unresolved(&decl.id, id)))
                .collect::<Result<Vec<_>>>()?;

            quests.push(QuestDefinition {
                id: decl.id.clone(),
                requirements,
                children,
                needs_manual_completion: decl.needs_manual_completion,
            });
        }

        let root = match &self.root {
            Some(id) => Some(
                quest_index
                    .get(id)
                    .copied()
                    .ok_or_else(|| unresolved("<root>", id))?,
            ),
            None => None,
        };

        check_acyclic(&quests)?;

        info!(
            "Linked {} quests and {} named requirements",
            quests.len(),
            self.requirements.len()
        );

        Ok(QuestRegistry {
            quests,
            requirements: self.requirements,
            quest_index,
            requirement_index,
            root,
        })
    }
}

fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_toml_files(&path, paths)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    Ok(())
}

fn load_quest_file(path: &Path) -> Result<QuestDeclaration> {
    let content = std::fs::read_to_string(path)?;
    let raw: RawQuestFile = toml::from_str(&content).map_err(|source| QuestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    QuestDeclaration::from_raw(&raw.quest).map_err(|message| QuestError::InvalidQuestFile {
        path: path.to_path_buf(),
        message,
    })
}

/// Depth-first search over child edges; reports the first cycle found
fn check_acyclic(quests: &[QuestDefinition]) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; quests.len()];

    for start in 0..quests.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // (node, next child index)
        let mut stack = vec![(start, 0usize)];
        marks[start] = Mark::InProgress;

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(child) = quests[node].children.get(top.1) {
                top.1 += 1;
                let child = child.0;
                match marks[child] {
                    Mark::Unvisited => {
                        marks[child] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                    Mark::InProgress => {
                        let from = stack.iter().position(|(n, _)| *n == child).unwrap_or(0);
                        let mut path: Vec<String> =
                            stack[from..].iter().map(|(n, _)| quests[*n].id.clone()).collect();
                        path.push(quests[child].id.clone());
                        return Err(QuestError::CycleDetected(path));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    Ok(())
}

/// Linked, immutable quest graph
#[derive(Debug)]
pub struct QuestRegistry {
    quests: Vec<QuestDefinition>,
    requirements: Vec<TriggerRequirement>,
    quest_index: HashMap<String, QuestHandle>,
    requirement_index: HashMap<String, RequirementHandle>,
    root: Option<QuestHandle>,
}

impl QuestRegistry {
    /// Look up a quest handle by ID
    pub fn quest(&self, quest_id: &str) -> Result<QuestHandle> {
        self.quest_index
            .get(quest_id)
            .copied()
            .ok_or_else(|| QuestError::UnknownDefinition(quest_id.to_string()))
    }

    /// Look up a named requirement handle by ID
    pub fn requirement(&self, requirement_id: &str) -> Result<RequirementHandle> {
        self.requirement_index
            .get(requirement_id)
            .copied()
            .ok_or_else(|| QuestError::UnknownDefinition(requirement_id.to_string()))
    }

    pub fn get(&self, handle: QuestHandle) -> &QuestDefinition {
        &self.quests[handle.0]
    }

    pub fn get_by_id(&self, quest_id: &str) -> Option<&QuestDefinition> {
        self.quest_index.get(quest_id).map(|h| self.get(*h))
    }

    pub fn trigger(&self, handle: RequirementHandle) -> &TriggerRequirement {
        &self.requirements[handle.0]
    }

    /// Quest bootstrap hands out
    pub fn root(&self) -> Option<QuestHandle> {
        self.root
    }

    /// Quests no other quest lists as a child
    pub fn roots(&self) -> Vec<QuestHandle> {
        let mut has_parent = vec![false; self.quests.len()];
        for quest in &self.quests {
            for child in &quest.children {
                has_parent[child.0] = true;
            }
        }
        (0..self.quests.len())
            .filter(|i| !has_parent[*i])
            .map(QuestHandle)
            .collect()
    }

    /// All quests in declaration order
    pub fn handles(&self) -> impl Iterator<Item = QuestHandle> + '_ {
        (0..self.quests.len()).map(QuestHandle)
    }

    /// Quests reachable from `start`, breadth first, each listed once
    pub fn reachable_from(&self, start: QuestHandle) -> Vec<QuestHandle> {
        let mut seen = vec![false; self.quests.len()];
        let mut order = Vec::new();
        let mut queue = std::collections::VecDeque::from([start]);
        while let Some(handle) = queue.pop_front() {
            if std::mem::replace(&mut seen[handle.0], true) {
                continue;
            }
            order.push(handle);
            queue.extend(self.get(handle).children.iter().copied());
        }
        order
    }

    /// Get count of linked quests
    pub fn count(&self) -> usize {
        self.quests.len()
    }
}

/// Events from the hot-reload watcher
#[derive(Debug, Clone)]
pub enum HotReloadEvent {
    /// A quest file changed and the registry should be rebuilt
    Changed(PathBuf),
    /// The watcher reported an error
    Error(String),
}

/// Start a file watcher on `<data_dir>/quests`.
///
/// The watcher lives on its own thread for as long as the returned receiver
/// is open.
pub fn start_file_watcher(data_dir: &Path) -> Result<mpsc::Receiver<HotReloadEvent>> {
    use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

    let quests_dir = data_dir.join("quests");
    if !quests_dir.exists() {
        return Err(QuestError::Config(format!(
            "Quest directory does not exist: {:?}",
            quests_dir
        )));
    }

    let (tx, rx) = mpsc::channel(32);
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            let _ = notify_tx.send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(1)),
    )?;
    watcher.watch(&quests_dir, RecursiveMode::Recursive)?;

    info!("Quest hot-reload watcher started for {:?}", quests_dir);

    std::thread::spawn(move || {
        // Keep the watcher alive for the lifetime of this thread
        let _watcher = watcher;

        while let Ok(res) = notify_rx.recv() {
            let message = match res {
                Ok(event) => match event.kind {
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => event
                        .paths
                        .into_iter()
                        .find(|p| p.extension().is_some_and(|ext| ext == "toml"))
                        .map(HotReloadEvent::Changed),
                    _ => None,
                },
                Err(e) => Some(HotReloadEvent::Error(e.to_string())),
            };

            if let Some(message) = message {
                if tx.blocking_send(message).is_err() {
                    // Receiver dropped
                    break;
                }
            }
        }
        debug!("Quest hot-reload watcher stopped");
    });

    Ok(rx)
}
