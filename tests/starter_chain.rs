//! Integration Tests: the tutorial chain driven through the host adapter.

use std::sync::Arc;

use starter_quest::quest::adapter::HostEvent;
use starter_quest::quest::events::{ActionArgument, ActionType, EquipSlot, ItemRef, QuestUpdate};
use starter_quest::quest::host::{Doodad, DoodadType, InMemoryWorld, TilePos};
use starter_quest::quest::state::{PlayerQuestSet, QuestStatus};
use starter_quest::quest::{QuestDeclaration, QuestManager, RegistryBuilder, RequirementSpec, starter};
use starter_quest::replay::{Replay, ScriptStep};

const P1: &str = "p1";
const P2: &str = "p2";

fn starter_replay() -> Replay {
    let mut builder = RegistryBuilder::new();
    starter::register(&mut builder);
    let mut replay = Replay::new(QuestManager::new(Arc::new(builder.link().unwrap())));
    *replay.world_mut() = tutorial_world();
    replay
        .apply(ScriptStep::Session {
            game_mode: Default::default(),
            role: Default::default(),
            local_player: Some(P1.to_string()),
        })
        .unwrap();
    replay
}

fn tutorial_world() -> InMemoryWorld {
    let mut world = InMemoryWorld::new();
    for (group, item) in [
        ("Tool", "StoneAxe"),
        ("Sharpened", "SharpenedStick"),
        ("RawMeat", "RawChicken"),
        ("Tinder", "DryGrass"),
        ("Kindling", "SmallBranch"),
        ("Rock", "SmallRock"),
        ("CookingEquipment", "Skewer"),
        ("CookedMeat", "CookedChicken"),
        ("Pole", "WoodenPole"),
        ("ContainerOfSeawater", "GlassBottleOfSeawater"),
        ("ContainerOfDesalinatedWater", "GlassBottleOfDesalinatedWater"),
    ] {
        world.add_to_group(group, item);
    }
    world
}

fn send(replay: &mut Replay, event: HostEvent) -> Vec<QuestUpdate> {
    replay.apply(ScriptStep::Event { event }).unwrap()
}

fn collect(player: &str, item_type: &str, count: u32) -> HostEvent {
    HostEvent::InventoryItemAdd {
        player: player.to_string(),
        item_type: item_type.to_string(),
        count,
    }
}

fn craft(player: &str, item_type: &str) -> HostEvent {
    HostEvent::Craft {
        player: player.to_string(),
        item_type: item_type.to_string(),
        count: 1,
    }
}

fn build(player: &str, item_type: &str) -> HostEvent {
    HostEvent::BuildDoodad {
        player: player.to_string(),
        item_type: item_type.to_string(),
    }
}

fn action(player: &str, action: ActionType, args: Vec<ActionArgument>) -> HostEvent {
    HostEvent::PostExecuteAction {
        executor: player.to_string(),
        action,
        args,
    }
}

fn item(item_type: &str, valid: bool) -> ActionArgument {
    ActionArgument::Item(ItemRef {
        item_type: item_type.to_string(),
        valid,
    })
}

fn face(replay: &mut Replay, player: &str, tile: TilePos, doodad: Doodad) {
    replay.world_mut().set_facing(player, Some(tile));
    replay.world_mut().set_doodad(tile, Some(doodad));
}

/// Start the game and finish everything up to `resourceGathering`
fn reach_resource_gathering(replay: &mut Replay) {
    send(replay, HostEvent::GamePlay { is_loading_save: false });
    replay
        .apply(ScriptStep::Complete {
            player_id: P1.to_string(),
            quest_id: "welcome".to_string(),
        })
        .unwrap();
    send(
        replay,
        HostEvent::Equip {
            player: P1.to_string(),
            slot: EquipSlot::RightHand,
            item_type: "StoneAxe".to_string(),
        },
    );
    send(
        replay,
        HostEvent::UpdatedQuickslotInfo {
            player: P1.to_string(),
            slot: 0,
        },
    );
}

// ---------------------------------------------------------------------------
// Counted requirements gate the next quest
// ---------------------------------------------------------------------------

#[test]
fn collecting_resources_completes_resource_gathering() {
    let mut replay = starter_replay();
    reach_resource_gathering(&mut replay);
    let manager = replay.manager();
    assert_eq!(manager.status(P1, "quickslots"), QuestStatus::Complete);
    assert_eq!(manager.status(P1, "resourceGathering"), QuestStatus::Active);

    send(&mut replay, collect(P1, "Branch", 1));
    send(&mut replay, collect(P1, "Branch", 1));
    send(&mut replay, collect(P1, "LargeRock", 2));

    let manager = replay.manager();
    assert_eq!(manager.status(P1, "resourceGathering"), QuestStatus::Complete);
    assert_eq!(manager.status(P1, "crafting"), QuestStatus::Active);
}

#[test]
fn crafting_early_does_not_skip_ahead() {
    let mut replay = starter_replay();
    reach_resource_gathering(&mut replay);

    send(&mut replay, collect(P1, "Branch", 1));
    let updates = send(&mut replay, craft(P1, "SharpRock"));
    assert!(updates.is_empty());

    let manager = replay.manager();
    assert_eq!(manager.status(P1, "resourceGathering"), QuestStatus::Active);
    assert_eq!(manager.status(P1, "crafting"), QuestStatus::NotStarted);
}

#[test]
fn activation_snapshots_cascade_through_satisfied_quests() {
    let mut replay = starter_replay();
    {
        let world = replay.world_mut();
        let player = world.player_mut(P1);
        player.equipped.insert(EquipSlot::LeftHand, "StoneAxe".to_string());
        player.quickslots = vec![None, Some("StoneAxe".to_string())];
        player.inventory.insert("Branch".to_string(), 3);
        player.inventory.insert("LargeRock".to_string(), 2);
    }

    send(&mut replay, HostEvent::GamePlay { is_loading_save: false });
    let updates = replay
        .apply(ScriptStep::Complete {
            player_id: P1.to_string(),
            quest_id: "welcome".to_string(),
        })
        .unwrap();

    let completed: Vec<&str> = updates
        .iter()
        .filter(|u| matches!(u, QuestUpdate::Completed { .. }))
        .map(QuestUpdate::quest_id)
        .collect();
    assert_eq!(completed, vec!["welcome", "gearUp", "quickslots", "resourceGathering"]);

    let manager = replay.manager();
    assert_eq!(manager.status(P1, "crafting"), QuestStatus::Active);
    // Crafting has no snapshot; it waits for a craft event
    assert_eq!(manager.status(P1, "dismantle"), QuestStatus::NotStarted);
}

// ---------------------------------------------------------------------------
// Actor isolation
// ---------------------------------------------------------------------------

#[test]
fn only_the_acting_player_lights_their_campfire() {
    let mut builder = RegistryBuilder::new();
    starter::register_requirements(&mut builder);
    builder
        .quest(QuestDeclaration::new("fire").requires(RequirementSpec::named("lightCampfire")))
        .root("fire");
    let mut replay = Replay::new(QuestManager::new(Arc::new(builder.link().unwrap())));
    replay
        .apply(ScriptStep::Session {
            game_mode: Default::default(),
            role: starter_quest::quest::MultiplayerRole::Host,
            local_player: Some(P1.to_string()),
        })
        .unwrap();

    send(&mut replay, HostEvent::PlayerJoin { player: P1.to_string() });
    send(&mut replay, HostEvent::PlayerJoin { player: P2.to_string() });
    face(&mut replay, P1, TilePos::new(1, 0, 0), Doodad::new(DoodadType::LitStoneCampfire));
    face(&mut replay, P2, TilePos::new(9, 9, 0), Doodad::new(DoodadType::StoneCampfire));

    send(&mut replay, action(P1, ActionType::StartFire, vec![]));
    assert_eq!(replay.manager().status(P1, "fire"), QuestStatus::Complete);
    assert_eq!(replay.manager().status(P2, "fire"), QuestStatus::Active);

    // P2's own fire failed to light
    send(&mut replay, action(P2, ActionType::StartFire, vec![]));
    assert_eq!(replay.manager().status(P2, "fire"), QuestStatus::Active);

    // Once lit, P2 completes too
    replay
        .world_mut()
        .set_doodad(TilePos::new(9, 9, 0), Some(Doodad::new(DoodadType::LitClayCampfire)));
    send(&mut replay, action(P2, ActionType::StartFire, vec![]));
    assert_eq!(replay.manager().status(P2, "fire"), QuestStatus::Complete);
}

// ---------------------------------------------------------------------------
// Bootstrap and manual completion
// ---------------------------------------------------------------------------

#[test]
fn challenge_mode_never_bootstraps() {
    let mut replay = starter_replay();
    replay
        .apply(ScriptStep::Session {
            game_mode: starter_quest::quest::GameMode::Challenge,
            role: starter_quest::quest::MultiplayerRole::Host,
            local_player: Some(P1.to_string()),
        })
        .unwrap();

    send(&mut replay, HostEvent::GamePlay { is_loading_save: false });
    send(&mut replay, HostEvent::PlayerJoin { player: P2.to_string() });

    assert_eq!(replay.manager().player_ids().count(), 0);
    assert_eq!(replay.manager().status(P1, "welcome"), QuestStatus::NotStarted);
    assert_eq!(replay.manager().status(P2, "welcome"), QuestStatus::NotStarted);
}

#[test]
fn manual_quest_waits_for_explicit_completion() {
    let mut replay = starter_replay();
    send(&mut replay, HostEvent::GamePlay { is_loading_save: false });
    send(&mut replay, collect(P1, "Branch", 5));
    send(
        &mut replay,
        HostEvent::Equip {
            player: P1.to_string(),
            slot: EquipSlot::RightHand,
            item_type: "StoneAxe".to_string(),
        },
    );

    let set = replay.manager().player_quests(P1).unwrap();
    assert!(set.get("welcome").unwrap().all_satisfied());
    assert_eq!(set.status("welcome"), QuestStatus::Active);
    assert_eq!(set.status("gearUp"), QuestStatus::NotStarted);
}

#[test]
fn saved_progress_survives_a_rejoin() {
    let mut replay = starter_replay();
    reach_resource_gathering(&mut replay);
    send(&mut replay, collect(P1, "Branch", 2));

    let saved = replay.manager_mut().remove_player(P1).unwrap().to_json().unwrap();
    assert_eq!(replay.manager().status(P1, "resourceGathering"), QuestStatus::NotStarted);

    let set = PlayerQuestSet::from_json(&saved).unwrap();
    replay.load_player(P1, set);
    // Rejoining must not reissue the root
    send(&mut replay, HostEvent::PlayerJoin { player: P1.to_string() });
    assert_eq!(replay.manager().status(P1, "welcome"), QuestStatus::Complete);

    send(&mut replay, collect(P1, "LargeRock", 2));
    assert_eq!(replay.manager().status(P1, "resourceGathering"), QuestStatus::Complete);
    assert_eq!(replay.manager().status(P1, "crafting"), QuestStatus::Active);
}

// ---------------------------------------------------------------------------
// The whole chain
// ---------------------------------------------------------------------------

#[test]
fn full_tutorial_chain() {
    let mut replay = starter_replay();
    let campfire = TilePos::new(2, 0, 0);
    let still = TilePos::new(3, 0, 0);

    reach_resource_gathering(&mut replay);
    send(&mut replay, collect(P1, "Branch", 2));
    send(&mut replay, collect(P1, "LargeRock", 2));
    send(&mut replay, craft(P1, "SharpRock"));
    send(
        &mut replay,
        HostEvent::Dismantle {
            player: P1.to_string(),
            item_type: "Log".to_string(),
        },
    );
    send(
        &mut replay,
        HostEvent::UpdateOption {
            player: P1.to_string(),
            key: "leftHand".to_string(),
        },
    );
    assert_eq!(replay.manager().status(P1, "hunting"), QuestStatus::Active);

    send(&mut replay, collect(P1, "SharpenedStick", 1));
    send(
        &mut replay,
        HostEvent::KillCreature {
            player: P1.to_string(),
            creature: "Rabbit".to_string(),
        },
    );
    send(&mut replay, collect(P1, "RawChicken", 1));
    send(&mut replay, collect(P1, "WoodenPole", 2));
    send(&mut replay, craft(P1, "HandDrill"));
    send(&mut replay, collect(P1, "DryGrass", 1));
    send(&mut replay, collect(P1, "SmallBranch", 1));
    send(&mut replay, collect(P1, "SmallRock", 5));
    send(&mut replay, craft(P1, "StoneCampfire"));
    send(&mut replay, build(P1, "StoneCampfire"));
    assert_eq!(replay.manager().status(P1, "fire"), QuestStatus::Active);

    face(&mut replay, P1, campfire, Doodad::new(DoodadType::LitStoneCampfire));
    send(&mut replay, action(P1, ActionType::StartFire, vec![]));
    // Stoking only counts once the fuel is consumed
    send(&mut replay, action(P1, ActionType::StokeFire, vec![item("Log", true)]));
    assert_eq!(replay.manager().status(P1, "stokeFire"), QuestStatus::Active);
    send(&mut replay, action(P1, ActionType::StokeFire, vec![item("Log", false)]));
    assert_eq!(replay.manager().status(P1, "cooking"), QuestStatus::Active);

    send(&mut replay, collect(P1, "Skewer", 1));
    send(&mut replay, craft(P1, "CookedChicken"));
    send(&mut replay, collect(P1, "SmallRock", 2));
    send(&mut replay, collect(P1, "SharpenedStick", 1));
    send(&mut replay, collect(P1, "String", 1));
    send(&mut replay, collect(P1, "WoodenPole", 1));
    send(&mut replay, craft(P1, "StoneWaterStill"));
    send(&mut replay, build(P1, "StoneWaterStill"));
    assert_eq!(replay.manager().status(P1, "fillStill"), QuestStatus::Active);

    send(&mut replay, collect(P1, "GlassBottleOfSeawater", 1));
    face(
        &mut replay,
        P1,
        still,
        Doodad {
            doodad_type: DoodadType::StoneWaterStill,
            gather_ready: Some(1),
            still_container: None,
        },
    );
    send(&mut replay, action(P1, ActionType::Pour, vec![]));

    face(
        &mut replay,
        P1,
        still,
        Doodad {
            doodad_type: DoodadType::StoneWaterStill,
            gather_ready: Some(1),
            still_container: Some("GlassBottle".to_string()),
        },
    );
    send(&mut replay, action(P1, ActionType::AttachContainer, vec![]));
    assert_eq!(replay.manager().status(P1, "desalination"), QuestStatus::Active);

    face(&mut replay, P1, still, Doodad::new(DoodadType::LitStoneWaterStill));
    send(&mut replay, action(P1, ActionType::StartFire, vec![]));
    send(&mut replay, action(P1, ActionType::StokeFire, vec![item("Log", false)]));
    assert_eq!(replay.manager().status(P1, "desalination"), QuestStatus::Complete);

    send(
        &mut replay,
        action(
            P1,
            ActionType::GatherLiquid,
            vec![item("GlassBottleOfDesalinatedWater", true)],
        ),
    );
    send(
        &mut replay,
        HostEvent::TameCreature {
            player: P1.to_string(),
            creature: "Rabbit".to_string(),
        },
    );
    send(&mut replay, craft(P1, "WoodenChest"));
    send(&mut replay, build(P1, "WoodenChest"));
    assert_eq!(replay.manager().status(P1, "survivalistTraining"), QuestStatus::Active);

    replay
        .apply(ScriptStep::Complete {
            player_id: P1.to_string(),
            quest_id: "survivalistTraining".to_string(),
        })
        .unwrap();

    let set = replay.manager().player_quests(P1).unwrap();
    assert_eq!(set.completed_ids().len(), 23);
    assert_eq!(set.active().count(), 0);
}
