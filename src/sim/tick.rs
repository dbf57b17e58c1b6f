//! Fixed timestep simulation tick
//!
//! One call advances the world by a single deterministic step. Each tick
//! runs three phases in a fixed order: intents are latched against
//! start-of-tick state, everything moves, then collisions and deaths
//! resolve. Latched shots leave the muzzle only after the shooter has
//! moved, so a bullet is always born at the transform a viewer sees.

use log::info;

use super::bullet::{Bullet, BulletOwner, TargetId};
use super::entity::collide;
use super::pipes::impact_normal;
use super::player::MovementMode;
use super::state::{DeathCause, GameEvent, RoundPhase, World};
use crate::consts;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Flap; also starts the round from the ready screen
    pub flap: bool,
    /// Fire the held gun
    pub fire: bool,
    /// Start a manual reload
    pub reload: bool,
    /// Gun aim delta for this tick, radians
    pub rotate_gun: f32,
    /// Activate an inventory slot: 0 fires, 1 reloads, 2+ consumes
    pub use_slot: Option<usize>,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();
    world.time_ticks += 1;

    match world.phase {
        RoundPhase::Ready => {
            // Bobbing on the ready screen; the first flap starts the round
            world.player.integrate(world.time_ticks);
            if input.flap {
                world.phase = RoundPhase::Playing;
                world.player.start_flying();
                world.player.flap();
                events.push(GameEvent::RoundStarted { round: world.round });
                events.push(GameEvent::Flapped);
            }
            return events;
        }
        RoundPhase::Over => {
            // The body falls and stray bullets drain; nothing else moves
            world.player.integrate(world.time_ticks);
            for (_, bullet) in world.bullets.iter_mut() {
                bullet.integrate();
            }
            let player_left = world.player.entity.left();
            let extent = world.enemies.right_extent();
            world.bullets.retain(|_, b| !b.is_spent(player_left, extent));
            return events;
        }
        RoundPhase::Playing => {}
    }

    // --- INTENT ---
    // Decisions read start-of-tick state; nothing moves yet.
    let player_center = world.player.entity.center();
    if input.flap && world.player.flap() {
        events.push(GameEvent::Flapped);
    }
    if input.rotate_gun != 0.0 {
        if let Some(gun) = world.player.inventory.gun_mut() {
            gun.rotate_by(input.rotate_gun);
        }
    }
    if input.fire {
        world.player.inventory.queue_fire();
    }
    if input.reload && world.player.inventory.start_reload() {
        events.push(GameEvent::ReloadStarted);
    }
    match input.use_slot {
        Some(0) => {
            world.player.inventory.queue_fire();
        }
        Some(1) => {
            if world.player.inventory.start_reload() {
                events.push(GameEvent::ReloadStarted);
            }
        }
        Some(slot) => {
            world.player.use_item(slot);
        }
        None => {}
    }
    world.enemies.decide(&mut world.rng, player_center);

    // --- APPLY ---
    if world.player.mode() == MovementMode::Train {
        if let Some(hook) = world.train_hook {
            hook(&mut world.player);
        }
    } else {
        world.player.integrate(world.time_ticks);
    }
    world.pipes.scroll(&mut world.rng);
    let gap_y = world.pipes.last_gap_center().y;
    world.pickups.update(
        &mut world.rng,
        &world.config.spawn_weights,
        world.config.item_cooldown,
        gap_y,
    );
    world.enemies.update_spawner(
        &mut world.rng,
        world.config.enemy_cooldown,
        world.config.skimmer_gun,
    );
    world.enemies.advance();

    // Latched shots resolve against the post-move transforms
    let anchor = world.player.gun_anchor();
    if let Some(shot) = world.player.inventory.resolve_pending_fire(anchor) {
        world.bullets.spawn(Bullet::new(shot, BulletOwner::Player));
        events.push(GameEvent::GunFired {
            by: BulletOwner::Player,
        });
    }
    for (owner, shot) in world.enemies.resolve_shots() {
        world.bullets.spawn(Bullet::new(shot, owner));
        events.push(GameEvent::GunFired { by: owner });
    }
    if world.player.inventory.tick_gun().auto_reload_started {
        events.push(GameEvent::ReloadStarted);
    }
    for (_, bullet) in world.bullets.iter_mut() {
        bullet.integrate();
    }

    // --- RESOLVE ---
    // Statics first: one pipe bounce per bullet, then the ground strip
    for (_, bullet) in world.bullets.iter_mut() {
        if bullet.stopped {
            continue;
        }
        if !bullet.bounced {
            if let Some(pipe) = world.pipes.first_hit(&bullet.entity) {
                bullet.reflect(impact_normal(&bullet.entity, pipe));
                events.push(GameEvent::BulletBounced);
            }
        }
        if bullet.entity.bottom() >= consts::GROUND_Y {
            bullet.settle(consts::GROUND_Y);
        }
    }

    // Hit detection against every live target
    let targets = world.enemies.live_targets();
    let mut enemy_hits: Vec<(TargetId, f32)> = Vec::new();
    let mut player_hits: Vec<f32> = Vec::new();
    for (_, bullet) in world.bullets.iter_mut() {
        if bullet.stopped {
            continue;
        }
        if bullet.can_damage(TargetId::Player) && collide(&bullet.entity, &world.player.entity) {
            if let Some(damage) = bullet.register_hit(TargetId::Player) {
                player_hits.push(damage);
            }
        }
        for (target, entity) in &targets {
            if bullet.can_damage(*target) && collide(&bullet.entity, entity) {
                if let Some(damage) = bullet.register_hit(*target) {
                    enemy_hits.push((*target, damage));
                }
            }
        }
    }
    for (target, damage) in enemy_hits {
        events.push(GameEvent::EnemyHit { damage });
        if let Some(kind) = world.enemies.apply_damage(target, damage) {
            events.push(GameEvent::EnemyKilled { kind });
        }
    }
    for damage in player_hits {
        let landed = world.player.take_damage(damage);
        if landed > 0.0 {
            events.push(GameEvent::PlayerHit { damage: landed });
        }
    }
    for damage in world.enemies.dart_strikes(&world.player.entity) {
        let landed = world.player.take_damage(damage);
        if landed > 0.0 {
            events.push(GameEvent::PlayerHit { damage: landed });
        }
    }

    // Pickups: refused items (ammo without a gun) keep floating
    let player = &mut world.player;
    let inventory = &mut player.inventory;
    for kind in world
        .pickups
        .collect(&player.entity, |kind| inventory.acquire(kind))
    {
        events.push(GameEvent::PickupCollected { kind });
    }

    // Scoring
    let crossed = world.pipes.check_crossings(world.player.entity.left());
    for _ in 0..crossed {
        world.score += 1;
        events.push(GameEvent::Scored { total: world.score });
    }

    world.player.tick_timers();

    // Fatalities. Pipe and ground contact kill outright, invincible or not;
    // the totem only shields the health bar.
    let mode = world.player.mode();
    if mode == MovementMode::Normal || mode == MovementMode::Train {
        let cause = if world.pipes.hits(&world.player.entity) {
            Some(DeathCause::Pipe)
        } else if world.player.entity.bottom() >= consts::GROUND_Y {
            Some(DeathCause::Ground)
        } else if world.player.hp().is_empty() {
            Some(DeathCause::OutOfHealth)
        } else {
            None
        };
        if let Some(cause) = cause {
            world.phase = RoundPhase::Over;
            world.player.crash();
            events.push(GameEvent::PlayerDied { cause });
            info!(
                "round {} over ({:?}), score {}",
                world.round, cause, world.score
            );
        }
    }

    if let Some(kind) = world.enemies.clear_finished() {
        events.push(GameEvent::GroupCleared { kind });
    }

    // Cull spent bullets last so every event above saw them
    let player_left = world.player.entity.left();
    let extent = world.enemies.right_extent();
    world.bullets.retain(|_, b| !b.is_spent(player_left, extent));

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::gun::{self, GunKind};
    use crate::sim::item::ItemKind;

    fn flap() -> TickInput {
        TickInput {
            flap: true,
            ..Default::default()
        }
    }

    /// Keep the bird mid-screen so tests exercise combat, not gravity
    fn hover_input(world: &World) -> TickInput {
        if world.player.entity.center().y > consts::GROUND_Y / 2.0 {
            flap()
        } else {
            TickInput::default()
        }
    }

    /// Chase the next gap center, the same bang-bang rule the autopilot
    /// binary uses. Keeps the bird alive through pipes indefinitely.
    fn gap_pilot(world: &World) -> TickInput {
        if world.phase == RoundPhase::Ready {
            return flap();
        }
        let player_left = world.player.entity.left();
        let target_y = world
            .pipes
            .pairs()
            .iter()
            .find(|p| p.right() >= player_left)
            .map(|p| p.gap_center().y)
            .unwrap_or(consts::GROUND_Y / 2.0);
        TickInput {
            flap: world.player.entity.center().y > target_y,
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_ready_to_playing() {
        let mut world = World::new(12345);
        assert_eq!(world.phase, RoundPhase::Ready);

        // Tick without flap - stays on the ready screen
        let events = world.tick(&TickInput::default());
        assert_eq!(world.phase, RoundPhase::Ready);
        assert!(events.is_empty());

        let events = world.tick(&flap());
        assert_eq!(world.phase, RoundPhase::Playing);
        assert!(events.contains(&GameEvent::RoundStarted { round: 1 }));
        assert!(events.contains(&GameEvent::Flapped));
    }

    #[test]
    fn test_ready_freezes_the_world() {
        let mut world = World::new(7);
        let xs: Vec<f32> = world.pipes.pairs().iter().map(|p| p.x()).collect();
        for _ in 0..90 {
            world.tick(&TickInput::default());
        }
        let after: Vec<f32> = world.pipes.pairs().iter().map(|p| p.x()).collect();
        assert_eq!(xs, after);
        assert!(world.pickups.pickups().is_empty());
        assert!(world.enemies.group().is_none());
    }

    #[test]
    fn test_ready_bird_bobs_in_place() {
        let mut world = World::new(7);
        let x = world.player.entity.pos.x;
        let base = world.player.entity.pos.y;
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        for _ in 0..120 {
            world.tick(&TickInput::default());
            min_y = min_y.min(world.player.entity.pos.y);
            max_y = max_y.max(world.player.entity.pos.y);
        }
        assert_eq!(world.player.entity.pos.x, x);
        assert!(max_y - base <= consts::SHM_AMPLITUDE + 0.01);
        assert!(base - min_y <= consts::SHM_AMPLITUDE + 0.01);
    }

    #[test]
    fn test_free_fall_ends_on_the_ground() {
        let mut world = World::new(3);
        world.tick(&flap());
        let mut died = Vec::new();
        for _ in 0..600 {
            let events = world.tick(&TickInput::default());
            died.extend(events.iter().copied().filter(|e| {
                matches!(e, GameEvent::PlayerDied { .. })
            }));
            if world.phase == RoundPhase::Over {
                break;
            }
        }
        assert_eq!(
            died,
            vec![GameEvent::PlayerDied {
                cause: DeathCause::Ground
            }]
        );
        assert_eq!(world.player.mode(), MovementMode::Crash);
        // The body comes to rest on the ground strip
        for _ in 0..60 {
            world.tick(&TickInput::default());
        }
        assert_eq!(
            world.player.entity.bottom(),
            consts::GROUND_Y,
        );
    }

    #[test]
    fn test_fire_spawns_bullet_from_post_move_muzzle() {
        let mut world = World::new(11);
        world.tick(&flap());
        assert!(world.player.inventory.acquire(ItemKind::Deagle));

        let events = world.tick(&TickInput {
            fire: true,
            ..Default::default()
        });
        assert!(events.contains(&GameEvent::GunFired {
            by: BulletOwner::Player
        }));
        assert_eq!(world.bullets.len(), 1);

        // Born at the muzzle of the post-move transform, one step along
        let (_, bullet) = world.bullets.iter().next().unwrap();
        let gun = world.player.inventory.gun().unwrap();
        let muzzle = gun.muzzle_world(world.player.gun_anchor());
        let expected = muzzle + gun::velocity_from_angle(GunKind::Deagle.muzzle_speed(), gun.rotation());
        let center = bullet.entity.center();
        assert!((center - expected).length() < 1e-3);
        assert_eq!(bullet.owner, BulletOwner::Player);
    }

    #[test]
    fn test_fire_intent_latches_through_reload() {
        let mut world = World::new(11);
        world.tick(&flap());
        assert!(world.player.inventory.acquire(ItemKind::Deagle));
        assert!(world.player.inventory.acquire(ItemKind::AmmoBox));

        // Empty the magazine
        let mut fired = 0;
        for _ in 0..200 {
            let events = world.tick(&TickInput {
                fire: true,
                ..hover_input(&world)
            });
            fired += events
                .iter()
                .filter(|e| matches!(e, GameEvent::GunFired { .. }))
                .count();
            if world.player.inventory.gun().is_some_and(|g| g.quantity() == 0) {
                break;
            }
        }
        assert_eq!(fired, GunKind::Deagle.magazine_size() as usize);

        // The empty magazine arms an auto reload once the shot cooldown ends
        let mut reload_started = false;
        for _ in 0..=GunKind::Deagle.shoot_cooldown() + 1 {
            let events = world.tick(&hover_input(&world));
            if events.contains(&GameEvent::ReloadStarted) {
                reload_started = true;
                break;
            }
        }
        assert!(reload_started);

        // Reserve refills the magazine when the reload lands
        for _ in 0..=GunKind::Deagle.reload_cooldown() {
            world.tick(&hover_input(&world));
        }
        let gun = world.player.inventory.gun().unwrap();
        assert_eq!(gun.quantity(), GunKind::Deagle.magazine_size());
        assert_eq!(
            world.player.inventory.reserve_ammo(),
            GunKind::Deagle.ammo_batch() - GunKind::Deagle.magazine_size()
        );
    }

    #[test]
    fn test_totem_via_slot_input() {
        let mut world = World::new(19);
        world.tick(&flap());
        assert!(world.player.inventory.acquire(ItemKind::Totem));
        let slot = ItemKind::Totem.category().slot_index();

        world.tick(&TickInput {
            use_slot: Some(slot),
            ..hover_input(&world)
        });
        assert!(world.player.is_invincible());
        // Consumed on use
        assert!(world.player.inventory.slot(slot).is_some_and(|s| s.is_empty()));
    }

    #[test]
    fn test_determinism() {
        let mut a = World::new(99999);
        let mut b = World::new(99999);
        for i in 0..900u32 {
            let input = TickInput {
                flap: i % 17 == 0,
                fire: i % 29 == 0,
                rotate_gun: if i % 5 == 0 { 0.05 } else { 0.0 },
                ..Default::default()
            };
            let ea = a.tick(&input);
            let eb = b.tick(&input);
            assert_eq!(ea, eb);
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.score, b.score);
        assert_eq!(a.round, b.round);
        assert_eq!(a.player.entity.pos, b.player.entity.pos);
        assert_eq!(a.bullets.len(), b.bullets.len());
        let xs_a: Vec<f32> = a.pipes.pairs().iter().map(|p| p.x()).collect();
        let xs_b: Vec<f32> = b.pipes.pairs().iter().map(|p| p.x()).collect();
        assert_eq!(xs_a, xs_b);
    }

    #[test]
    fn test_gap_pilot_scores_the_first_pipe() {
        let mut world = World::new(4242);
        let mut scored = false;
        for _ in 0..600 {
            let events = world.tick(&gap_pilot(&world));
            if events.contains(&GameEvent::Scored { total: 1 }) {
                scored = true;
                break;
            }
            assert_eq!(world.phase, RoundPhase::Playing, "pilot died early");
        }
        assert!(scored);
        assert_eq!(world.score, 1);
    }

    #[test]
    fn test_long_run_field_invariants() {
        let mut world = World::new(777);
        let mut saw_pickup = false;
        let mut saw_enemy = false;
        for _ in 0..2500 {
            world.tick(&gap_pilot(&world));
            if world.phase == RoundPhase::Over {
                world.reset();
            }
            saw_pickup |= !world.pickups.pickups().is_empty();
            saw_enemy |= world.enemies.group().is_some();

            // The pipe field is recycled, never drained or reallocated
            let pairs = world.pipes.pairs();
            assert_eq!(pairs.len(), consts::PIPE_PAIRS);
            for pair in pairs {
                assert!(pair.gap_top() >= 0.2 * consts::PLAYFIELD_H - 1e-3);
                assert!(pair.gap_top() <= 0.8 * consts::PLAYFIELD_H - consts::PIPE_VGAP + 1e-3);
            }
            for window in pairs.windows(2) {
                assert_eq!(window[1].x() - window[0].x(), consts::PIPE_HGAP);
            }
        }
        assert!(saw_pickup);
        assert!(saw_enemy);
    }

    #[test]
    fn test_skimmer_group_engages_the_player() {
        let mut world = World::new(31);
        world.tick(&flap());

        // Burn the spawn gate down; the first group is always skimmers
        let skimmer_gun = world.config().skimmer_gun;
        let window = world.config().enemy_cooldown;
        let mut spawned = None;
        for _ in 0..=consts::ENEMY_CD_MAX {
            spawned = world
                .enemies
                .update_spawner(&mut world.rng, window, skimmer_gun);
            if spawned.is_some() {
                break;
            }
        }
        assert_eq!(spawned, Some(EnemyKind::CloudSkimmer));

        let mut enemy_fired = false;
        for _ in 0..900 {
            let events = world.tick(&gap_pilot(&world));
            if events.iter().any(|e| {
                matches!(
                    e,
                    GameEvent::GunFired {
                        by: BulletOwner::Enemy { .. }
                    }
                )
            }) {
                enemy_fired = true;
                break;
            }
        }
        assert!(enemy_fired);
        assert!(
            world
                .bullets
                .iter()
                .any(|(_, b)| matches!(b.owner, BulletOwner::Enemy { .. }))
        );
    }

    #[test]
    fn test_over_phase_only_drops_the_body() {
        let mut world = World::new(3);
        world.tick(&flap());
        // Fall to the ground
        for _ in 0..600 {
            world.tick(&TickInput::default());
            if world.phase == RoundPhase::Over {
                break;
            }
        }
        assert_eq!(world.phase, RoundPhase::Over);
        let xs: Vec<f32> = world.pipes.pairs().iter().map(|p| p.x()).collect();
        let score = world.score;
        // Inputs are dead; the world stays put
        for _ in 0..60 {
            let events = world.tick(&TickInput {
                flap: true,
                fire: true,
                ..Default::default()
            });
            assert!(events.is_empty());
        }
        let after: Vec<f32> = world.pipes.pairs().iter().map(|p| p.x()).collect();
        assert_eq!(xs, after);
        assert_eq!(world.score, score);
        assert_eq!(world.phase, RoundPhase::Over);
    }
}
