//! Starter Quest Chain
//!
//! The survival tutorial: a linear chain from `welcome` to
//! `survivalistTraining`, plus the named requirements it uses.

use super::definition::{ItemMatcher, QuestDeclaration, RequirementSpec};
use super::events::{ActionType, EquipSlot, EventName, QuestEvent};
use super::registry::RegistryBuilder;
use super::requirement::{RequirementContext, TriggerRequirement};

pub const ROOT_QUEST: &str = "welcome";

/// Register the named requirements, the chain and its root
pub fn register(builder: &mut RegistryBuilder) {
    register_requirements(builder);
    register_quests(builder);
    builder.root(ROOT_QUEST);
}

/// The owner executed `action`
fn performed(ctx: &RequirementContext<'_>, event: &QuestEvent, action: ActionType) -> bool {
    event.actor == ctx.owner && event.action().is_some_and(|(a, _)| a == action)
}

/// Item stoked into the fire was consumed
fn stoked_item_consumed(event: &QuestEvent) -> bool {
    event.first_item_arg().is_some_and(|item| !item.valid)
}

pub fn register_requirements(builder: &mut RegistryBuilder) {
    builder
        .requirement(
            TriggerRequirement::new("quickslot")
                .on_event(EventName::QuickslotUpdated, |ctx, event| event.actor == ctx.owner)
                .on_initialize(|ctx| ctx.world.quickslots(ctx.owner).iter().any(Option::is_some))
                .with_relation("#quick-slots ul"),
        )
        .requirement(
            TriggerRequirement::new("changeHand")
                .on_host_state(|_, key| key == "leftHand" || key == "rightHand")
                .with_relation("#equipment .checkbox-option[data-checkbox-id='leftHand']")
                .with_relation("#equipment .checkbox-option[data-checkbox-id='rightHand']"),
        )
        .requirement(
            TriggerRequirement::new("lightCampfire")
                .on_event(EventName::ActionExecuted, |ctx, event| {
                    performed(ctx, event, ActionType::StartFire)
                        && ctx
                            .world
                            .facing_doodad(ctx.owner)
                            .is_some_and(|d| d.doodad_type.is_lit_campfire())
                })
                .with_relation("#inventory .group-FireStarter"),
        )
        .requirement(
            TriggerRequirement::new("lightWaterStill")
                .on_event(EventName::ActionExecuted, |ctx, event| {
                    performed(ctx, event, ActionType::StartFire)
                        && ctx
                            .world
                            .facing_doodad(ctx.owner)
                            .is_some_and(|d| d.doodad_type.is_lit_water_still())
                })
                .with_relation("#inventory .group-FireStarter"),
        )
        .requirement(
            TriggerRequirement::new("gatherFromWaterStill")
                .on_event(EventName::ActionExecuted, gathered_from_water_still),
        )
        .requirement(
            TriggerRequirement::new("stokeCampfire")
                .on_event(EventName::ActionExecuted, |ctx, event| {
                    performed(ctx, event, ActionType::StokeFire)
                        && ctx
                            .world
                            .facing_doodad(ctx.owner)
                            .is_some_and(|d| d.doodad_type.is_lit_campfire())
                        && stoked_item_consumed(event)
                })
                .with_relation("#inventory .use-StokeFire"),
        )
        .requirement(
            TriggerRequirement::new("fillStill")
                .on_event(EventName::ActionExecuted, |ctx, event| {
                    performed(ctx, event, ActionType::Pour)
                        && ctx.world.facing_doodad(ctx.owner).is_some_and(|d| {
                            d.doodad_type.is_unlit_water_still()
                                && d.gather_ready.is_some_and(|ready| ready > 0)
                        })
                })
                .with_relation("#inventory .group-ContainerOfSeawater"),
        )
        .requirement(
            TriggerRequirement::new("attachContainer")
                .on_event(EventName::ActionExecuted, |ctx, event| {
                    performed(ctx, event, ActionType::AttachContainer)
                        && ctx.world.facing_doodad(ctx.owner).is_some_and(|d| {
                            d.doodad_type.is_unlit_water_still() && d.still_container.is_some()
                        })
                })
                .with_relation("#inventory .use-AttachContainer"),
        )
        .requirement(
            TriggerRequirement::new("stokeWaterStill")
                .on_event(EventName::ActionExecuted, |ctx, event| {
                    performed(ctx, event, ActionType::StokeFire)
                        && ctx
                            .world
                            .facing_doodad(ctx.owner)
                            .is_some_and(|d| d.doodad_type.is_water_still())
                        && stoked_item_consumed(event)
                })
                .with_relation("#inventory .use-StokeFire"),
        );
}

/// Gathering, drinking from, or detaching the container of a still that has
/// finished desalinating. DetachContainer only counts when no container is
/// attached any more.
fn gathered_from_water_still(ctx: &RequirementContext<'_>, event: &QuestEvent) -> bool {
    if event.actor != ctx.owner {
        return false;
    }
    let Some((action, _)) = event.action() else {
        return false;
    };
    if !matches!(
        action,
        ActionType::GatherLiquid | ActionType::DrinkInFront | ActionType::DetachContainer
    ) {
        return false;
    }

    let Some(doodad) = ctx.world.facing_doodad(ctx.owner) else {
        return false;
    };

    match action {
        ActionType::GatherLiquid => {
            let in_group = event
                .first_item_arg()
                .is_some_and(|item| ctx.world.is_in_group(&item.item_type, "ContainerOfDesalinatedWater"));
            if !in_group {
                return false;
            }
        }
        ActionType::DrinkInFront if doodad.gather_ready.is_some_and(|ready| ready <= 0) => {
            return false;
        }
        ActionType::DetachContainer if doodad.still_container.is_some() => {
            return false;
        }
        _ => {}
    }

    doodad.gather_ready.is_none()
}

pub fn register_quests(builder: &mut RegistryBuilder) {
    use ItemMatcher as M;
    use RequirementSpec as R;

    builder
        .quest(QuestDeclaration::new("welcome").manual_completion().child("gearUp"))
        .quest(
            QuestDeclaration::new("gearUp")
                .requires(R::equip(
                    vec![EquipSlot::RightHand, EquipSlot::LeftHand],
                    vec![M::group("Weapon"), M::group("Tool")],
                ))
                .child("quickslots"),
        )
        .quest(
            QuestDeclaration::new("quickslots")
                .requires(R::named("quickslot"))
                .child("resourceGathering"),
        )
        .quest(
            QuestDeclaration::new("resourceGathering")
                .requires(R::collect(vec![M::item("Branch")], 2))
                .requires(R::collect(vec![M::item("LargeRock")], 2))
                .child("crafting"),
        )
        .quest(
            QuestDeclaration::new("crafting")
                .requires(R::craft(vec![M::item("SharpRock")], 1))
                .child("dismantle"),
        )
        .quest(
            QuestDeclaration::new("dismantle")
                .requires(R::dismantle(
                    vec![M::item("Branch"), M::item("Log"), M::item("LargeRock")],
                    1,
                ))
                .child("changeHands"),
        )
        .quest(
            QuestDeclaration::new("changeHands")
                .requires(R::named("changeHand"))
                .child("hunting"),
        )
        .quest(
            QuestDeclaration::new("hunting")
                .requires(R::collect(vec![M::group("Sharpened")], 1))
                .requires(R::kill(1))
                .requires(R::collect(vec![M::group("RawMeat")], 1))
                .child("woodenPoles"),
        )
        .quest(
            QuestDeclaration::new("woodenPoles")
                .requires(R::collect(vec![M::item("WoodenPole")], 2))
                .child("handDrill"),
        )
        .quest(
            QuestDeclaration::new("handDrill")
                .requires(R::craft(vec![M::item("HandDrill")], 1))
                .child("kindlingTinder"),
        )
        .quest(
            QuestDeclaration::new("kindlingTinder")
                .requires(R::collect(vec![M::group("Tinder")], 1))
                .requires(R::collect(vec![M::group("Kindling")], 1))
                .child("campfire"),
        )
        .quest(
            QuestDeclaration::new("campfire")
                .requires(R::collect(vec![M::group("Rock")], 5))
                .requires(R::craft(vec![M::item("StoneCampfire")], 1))
                .requires(R::build(vec![M::item("StoneCampfire")]))
                .child("fire"),
        )
        .quest(
            QuestDeclaration::new("fire")
                .requires(R::named("lightCampfire"))
                .child("stokeFire"),
        )
        .quest(
            QuestDeclaration::new("stokeFire")
                .requires(R::named("stokeCampfire"))
                .child("cooking"),
        )
        .quest(
            QuestDeclaration::new("cooking")
                .requires(R::collect(vec![M::group("CookingEquipment")], 1))
                .requires(R::craft(vec![M::group("CookedMeat")], 1))
                .child("waterStill"),
        )
        .quest(
            QuestDeclaration::new("waterStill")
                .requires(R::collect(vec![M::group("Rock")], 2))
                .requires(R::collect(vec![M::group("Sharpened")], 1))
                .requires(R::collect(vec![M::item("String")], 1))
                .requires(R::collect(vec![M::group("Pole")], 1))
                .requires(R::craft(vec![M::item("StoneWaterStill")], 1))
                .requires(R::build(vec![M::item("StoneWaterStill")]))
                .child("fillStill"),
        )
        .quest(
            QuestDeclaration::new("fillStill")
                .requires(R::collect(vec![M::group("ContainerOfSeawater")], 1))
                .requires(R::named("fillStill"))
                .child("attachContainer"),
        )
        .quest(
            QuestDeclaration::new("attachContainer")
                .requires(R::named("attachContainer"))
                .child("desalination"),
        )
        .quest(
            QuestDeclaration::new("desalination")
                .requires(R::named("lightWaterStill"))
                .requires(R::named("stokeWaterStill"))
                .child("gatherLiquid"),
        )
        .quest(
            QuestDeclaration::new("gatherLiquid")
                .requires(R::named("gatherFromWaterStill"))
                .child("taming"),
        )
        .quest(
            QuestDeclaration::new("taming")
                .requires(R::tame(1))
                .child("extraStorage"),
        )
        .quest(
            QuestDeclaration::new("extraStorage")
                .requires(R::craft(vec![M::item("WoodenChest")], 1))
                .requires(R::build(vec![M::item("WoodenChest")]))
                .child("survivalistTraining"),
        )
        .quest(QuestDeclaration::new("survivalistTraining").manual_completion());
}
