use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use starter_quest::config::EngineConfig;
use starter_quest::quest::events::QuestUpdate;
use starter_quest::quest::registry::{HotReloadEvent, start_file_watcher};
use starter_quest::quest::QuestManager;
use starter_quest::replay::{Replay, ScriptStep, stream_script};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match EngineConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    let registry = match config.build_registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!("Failed to build quest registry: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded {} quests", registry.count());

    let mut replay = Replay::new(QuestManager::new(Arc::new(registry)));

    // Script from the first argument, or stdin
    let (step_tx, mut step_rx) = mpsc::channel::<ScriptStep>(64);
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match tokio::fs::File::open(&path).await {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                error!("Failed to open script {:?}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let reader_task = tokio::spawn(stream_script(reader, step_tx));

    let mut reload_rx = if config.hot_reload {
        match start_file_watcher(&config.data_dir) {
            Ok(rx) => {
                info!("Quest hot-reload enabled");
                Some(rx)
            }
            Err(e) => {
                warn!("Failed to start quest hot-reload: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut failed = false;
    loop {
        tokio::select! {
            step = step_rx.recv() => {
                let Some(step) = step else { break };
                match replay.apply(step) {
                    Ok(updates) => updates.iter().for_each(log_update),
                    Err(e) => {
                        error!("Step failed: {}", e);
                        failed = true;
                    }
                }
            }
            Some(event) = next_reload(&mut reload_rx) => match event {
                HotReloadEvent::Changed(path) => {
                    info!("Quest hot-reload: {:?}", path);
                    match config.build_registry() {
                        Ok(registry) => replay
                            .replace_registry(Arc::new(registry))
                            .iter()
                            .for_each(log_update),
                        Err(e) => error!("Keeping previous quest registry: {}", e),
                    }
                }
                HotReloadEvent::Error(e) => error!("Quest hot-reload error: {}", e),
            },
        }
    }

    match reader_task.await {
        Ok(Ok(count)) => info!("Replayed {} steps", count),
        Ok(Err(e)) => {
            error!("Failed to read script: {}", e);
            failed = true;
        }
        Err(e) => {
            error!("Script reader panicked: {}", e);
            failed = true;
        }
    }

    let manager = replay.manager();
    let mut players: Vec<&str> = manager.player_ids().collect();
    players.sort_unstable();
    for player_id in players {
        if let Some(set) = manager.player_quests(player_id) {
            let active: Vec<&str> = set.active().map(|i| i.quest_id.as_str()).collect();
            info!(
                "Player {}: {} completed, active {:?}",
                player_id,
                set.completed_ids().len(),
                active
            );
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

/// Next hot-reload event, or never when hot reload is off
async fn next_reload(rx: &mut Option<mpsc::Receiver<HotReloadEvent>>) -> Option<HotReloadEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn log_update(update: &QuestUpdate) {
    match update {
        QuestUpdate::Activated { player_id, quest_id } => {
            info!("Player {} activated quest {}", player_id, quest_id)
        }
        QuestUpdate::Progressed {
            player_id,
            quest_id,
            requirement,
            current,
            target,
            ..
        } => info!(
            "Player {} quest {} requirement {}: {}/{}",
            player_id, quest_id, requirement, current, target
        ),
        QuestUpdate::Completed { player_id, quest_id } => {
            info!("Player {} completed quest {}", player_id, quest_id)
        }
    }
}
