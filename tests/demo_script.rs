//! Runs the bundled demo config and script end to end.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::BufReader;
use tokio::sync::mpsc;

use starter_quest::config::EngineConfig;
use starter_quest::quest::QuestManager;
use starter_quest::quest::state::QuestStatus;
use starter_quest::replay::{Replay, stream_script};

fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos")
}

fn demo_config() -> EngineConfig {
    let mut config = EngineConfig::from_file(&demos_dir().join("quest-engine.toml")).unwrap();
    config.data_dir = demos_dir().join("data");
    config
}

#[test]
fn demo_quest_files_link_with_the_starter_chain() {
    let registry = demo_config().build_registry().unwrap();
    assert_eq!(registry.count(), 25);

    let cook = registry.quest("campfireCook").unwrap();
    let keeper = registry.quest("fireKeeper").unwrap();
    assert_eq!(registry.reachable_from(cook), vec![cook, keeper]);
    assert!(registry.get(keeper).needs_manual_completion);
}

#[tokio::test]
async fn demo_script_reaches_dismantle() {
    let registry = demo_config().build_registry().unwrap();
    let mut replay = Replay::new(QuestManager::new(Arc::new(registry)));

    let file = tokio::fs::File::open(demos_dir().join("tutorial.jsonl")).await.unwrap();
    let (tx, mut rx) = mpsc::channel(16);
    let reader = tokio::spawn(stream_script(BufReader::new(file), tx));

    while let Some(step) = rx.recv().await {
        replay.apply(step).unwrap();
    }
    assert_eq!(reader.await.unwrap().unwrap(), 12);

    let manager = replay.manager();
    assert_eq!(manager.status("p1", "crafting"), QuestStatus::Complete);
    assert_eq!(manager.status("p1", "dismantle"), QuestStatus::Active);
    assert_eq!(manager.status("p1", "fire"), QuestStatus::NotStarted);
}
