//! Floating pickups: cooldown-gated weighted spawning, scrolling, collection.

use glam::Vec2;
use log::debug;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::SpawnWeights;
use crate::consts;
use crate::sim::entity::{Entity, collide};
use crate::sim::item::ItemKind;

/// A lootable item drifting across the playfield with the pipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: ItemKind,
    pub entity: Entity,
}

/// Spawn scheduler and container for floating pickups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupField {
    pickups: Vec<Pickup>,
    cooldown: u32,
}

impl PickupField {
    pub fn new(rng: &mut Pcg32, window: (u32, u32)) -> Self {
        Self {
            pickups: Vec::new(),
            cooldown: roll_cooldown(rng, window),
        }
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// One tick: scroll with the pipes, despawn strays off the left edge,
    /// and spawn a new pickup when the cooldown expires. Returns the kind
    /// spawned this tick, if any.
    pub fn update(
        &mut self,
        rng: &mut Pcg32,
        weights: &SpawnWeights,
        window: (u32, u32),
        gap_center_y: f32,
    ) -> Option<ItemKind> {
        for pickup in &mut self.pickups {
            pickup.entity.pos.x += consts::PIPE_VEL_X;
        }
        self.pickups
            .retain(|p| p.entity.right() >= -consts::PIPE_RECYCLE_MARGIN);

        self.cooldown = self.cooldown.saturating_sub(1);
        if self.cooldown > 0 {
            return None;
        }
        self.cooldown = roll_cooldown(rng, window);

        let kind = weights.sample(rng);
        // Vertically near the most recent pipe gap so loot stays reachable
        let jitter = rng.random_range(-0.35..0.35) * consts::PIPE_VGAP;
        let y = (gap_center_y + jitter).clamp(
            20.0,
            consts::GROUND_Y - consts::PICKUP_SIZE - 20.0,
        );
        let size = Vec2::splat(consts::PICKUP_SIZE);
        self.pickups.push(Pickup {
            kind,
            entity: Entity::new(Vec2::new(consts::PLAYFIELD_W + 40.0, y), size),
        });
        debug!("pickup spawned: {} at y={y:.0}", kind.name());
        Some(kind)
    }

    /// Hand every pickup overlapping `player` to `accept`; those accepted
    /// are removed and reported. A refused pickup (ammo without a gun)
    /// keeps floating.
    pub fn collect(
        &mut self,
        player: &Entity,
        mut accept: impl FnMut(ItemKind) -> bool,
    ) -> Vec<ItemKind> {
        let mut taken = Vec::new();
        self.pickups.retain(|pickup| {
            if collide(player, &pickup.entity) && accept(pickup.kind) {
                taken.push(pickup.kind);
                false
            } else {
                true
            }
        });
        taken
    }

    /// Round reset: drop everything, restart the spawn clock
    pub fn reset(&mut self, rng: &mut Pcg32, window: (u32, u32)) {
        self.pickups.clear();
        self.cooldown = roll_cooldown(rng, window);
    }
}

fn roll_cooldown(rng: &mut Pcg32, (min, max): (u32, u32)) -> u32 {
    rng.random_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const WINDOW: (u32, u32) = (consts::ITEM_CD_MIN, consts::ITEM_CD_MAX);

    fn run_until_spawn(
        field: &mut PickupField,
        rng: &mut Pcg32,
        weights: &SpawnWeights,
    ) -> (u32, ItemKind) {
        for waited in 1..=consts::ITEM_CD_MAX + 1 {
            if let Some(kind) = field.update(rng, weights, WINDOW, 300.0) {
                return (waited, kind);
            }
        }
        panic!("no pickup spawned within the cooldown window");
    }

    #[test]
    fn test_spawn_cadence_within_window() {
        let mut rng = Pcg32::seed_from_u64(11);
        let weights = SpawnWeights::default();
        let mut field = PickupField::new(&mut rng, WINDOW);
        for _ in 0..10 {
            let (waited, _) = run_until_spawn(&mut field, &mut rng, &weights);
            assert!(waited >= consts::ITEM_CD_MIN);
            assert!(waited <= consts::ITEM_CD_MAX);
        }
    }

    #[test]
    fn test_spawn_position() {
        let mut rng = Pcg32::seed_from_u64(3);
        let weights = SpawnWeights::default();
        let mut field = PickupField::new(&mut rng, WINDOW);
        run_until_spawn(&mut field, &mut rng, &weights);
        let p = &field.pickups()[0];
        assert_eq!(p.entity.pos.x, consts::PLAYFIELD_W + 40.0);
        let dy = (p.entity.pos.y - 300.0).abs();
        assert!(dy <= 0.35 * consts::PIPE_VGAP + 1.0);
    }

    #[test]
    fn test_despawn_off_left_edge() {
        let mut rng = Pcg32::seed_from_u64(5);
        let weights = SpawnWeights::default();
        let mut field = PickupField::new(&mut rng, WINDOW);
        run_until_spawn(&mut field, &mut rng, &weights);
        // Drag it off screen
        field.pickups[0].entity.pos.x = -consts::PIPE_RECYCLE_MARGIN - 60.0;
        field.update(&mut rng, &weights, WINDOW, 300.0);
        assert!(field.pickups().is_empty() || field.pickups()[0].entity.pos.x > 0.0);
    }

    #[test]
    fn test_collect_accepted_only() {
        let mut rng = Pcg32::seed_from_u64(8);
        let mut field = PickupField::new(&mut rng, WINDOW);
        field.pickups.push(Pickup {
            kind: ItemKind::Apple,
            entity: Entity::new(Vec2::new(100.0, 100.0), Vec2::splat(28.0)),
        });
        field.pickups.push(Pickup {
            kind: ItemKind::AmmoBox,
            entity: Entity::new(Vec2::new(110.0, 100.0), Vec2::splat(28.0)),
        });
        field.pickups.push(Pickup {
            kind: ItemKind::Medkit,
            entity: Entity::new(Vec2::new(600.0, 100.0), Vec2::splat(28.0)),
        });
        let player = Entity::new(Vec2::new(95.0, 95.0), Vec2::new(34.0, 24.0));
        // Refuse ammo (no gun), accept the rest
        let taken = field.collect(&player, |kind| kind != ItemKind::AmmoBox);
        assert_eq!(taken, vec![ItemKind::Apple]);
        // Ammo box still floating, medkit untouched out of range
        assert_eq!(field.pickups().len(), 2);
        assert_eq!(field.pickups()[0].kind, ItemKind::AmmoBox);
    }
}
