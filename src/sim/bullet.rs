//! Bullets and the generational pool that owns them.
//!
//! The pool hands out `BulletId { index, generation }`; a freed slot bumps
//! its generation, so stale handles resolve to `None` instead of aliasing a
//! later bullet. Iteration is in slot order, which keeps the sim
//! deterministic.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts;
use crate::sim::entity::Entity;
use crate::sim::gun::ShotSpawn;

/// Handle into the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BulletId {
    index: u32,
    generation: u32,
}

/// Who fired the bullet. A bullet never collides with its owner until it
/// has bounced; enemy members are addressed by group sequence + member slot
/// so the id survives group turnover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Enemy { group: u32, member: u32 },
}

/// Damageable targets, for owner checks and per-target hit memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetId {
    Player,
    Enemy { group: u32, member: u32 },
}

impl BulletOwner {
    fn as_target(self) -> TargetId {
        match self {
            BulletOwner::Player => TargetId::Player,
            BulletOwner::Enemy { group, member } => TargetId::Enemy { group, member },
        }
    }
}

/// What the bullet struck most recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitEntity {
    #[default]
    None,
    Player,
    Enemy,
    Pipe,
    Floor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub entity: Entity,
    pub vel: Vec2,
    pub damage: f32,
    pub owner: BulletOwner,
    pub bounced: bool,
    pub stopped: bool,
    pub hit_entity: HitEntity,
    pub frame_count: u32,
    settle_ticks: u32,
    hits: Vec<TargetId>,
}

impl Bullet {
    pub fn new(shot: ShotSpawn, owner: BulletOwner) -> Self {
        let size = Vec2::new(consts::BULLET_W, consts::BULLET_H);
        Self {
            entity: Entity::new(shot.pos - size * 0.5, size),
            vel: shot.vel,
            damage: shot.damage,
            owner,
            bounced: false,
            stopped: false,
            hit_entity: HitEntity::None,
            frame_count: 0,
            settle_ticks: 0,
            hits: Vec::new(),
        }
    }

    /// One tick of motion. Settled bullets only age toward removal.
    pub fn integrate(&mut self) {
        self.frame_count += 1;
        if self.stopped {
            self.settle_ticks += 1;
        } else {
            self.entity.pos += self.vel;
        }
    }

    /// Mirror the velocity component along `normal` (unit, axis-aligned for
    /// pipe faces). `bounced` latches true on the first reflection; after
    /// that the bullet ignores pipe geometry entirely, which is what makes
    /// the past-everything removal rule sound.
    pub fn reflect(&mut self, normal: Vec2) {
        self.vel = self.vel - 2.0 * self.vel.dot(normal) * normal;
        self.bounced = true;
        self.hit_entity = HitEntity::Pipe;
    }

    /// Settle on the ground strip; removed after the grace period.
    pub fn settle(&mut self, ground_y: f32) {
        self.entity.pos.y = ground_y - self.entity.size.y;
        self.vel = Vec2::ZERO;
        self.stopped = true;
        self.hit_entity = HitEntity::Floor;
    }

    /// Whether this bullet may damage `target` (owner shielded until bounce,
    /// one hit per target ever).
    pub fn can_damage(&self, target: TargetId) -> bool {
        if self.stopped {
            return false;
        }
        if !self.bounced && target == self.owner.as_target() {
            return false;
        }
        !self.hits.contains(&target)
    }

    /// Record a landed hit. Returns the damage to apply, or `None` when the
    /// single-hit rule forbids it.
    pub fn register_hit(&mut self, target: TargetId) -> Option<f32> {
        if !self.can_damage(target) {
            return None;
        }
        self.hits.push(target);
        self.hit_entity = match target {
            TargetId::Player => HitEntity::Player,
            TargetId::Enemy { .. } => HitEntity::Enemy,
        };
        Some(self.damage)
    }

    pub fn has_hit(&self, target: TargetId) -> bool {
        self.hits.contains(&target)
    }

    /// Removal predicate. `player_left` is the player's left edge;
    /// `enemy_right_extent` is the rightmost right-edge among live enemies,
    /// if any are on screen.
    pub fn is_spent(&self, player_left: f32, enemy_right_extent: Option<f32>) -> bool {
        let e = &self.entity;
        // Exited the top of the screen
        if e.bottom() < 0.0 {
            return true;
        }
        if self.stopped {
            return self.settle_ticks > consts::BULLET_SETTLE_TICKS;
        }
        // Off-screen in any remaining direction, with margin
        let m = consts::BULLET_OFFSCREEN_MARGIN;
        if e.left() > consts::PLAYFIELD_W + m || e.right() < -m || e.top() > consts::PLAYFIELD_H + m
        {
            return true;
        }
        // Bounced and past everything it could still interact with
        if self.bounced {
            if self.vel.x > 0.0 {
                let extent = enemy_right_extent.unwrap_or(consts::PLAYFIELD_W);
                if e.left() > extent {
                    return true;
                }
            } else if self.vel.x < 0.0 && e.right() < player_left {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    bullet: Option<Bullet>,
}

/// Index-stable bullet arena.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulletPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl BulletPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, bullet: Bullet) -> BulletId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.bullet = Some(bullet);
            BulletId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                bullet: Some(bullet),
            });
            BulletId {
                index,
                generation: 0,
            }
        }
    }

    pub fn get(&self, id: BulletId) -> Option<&Bullet> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.bullet.as_ref()
    }

    pub fn get_mut(&mut self, id: BulletId) -> Option<&mut Bullet> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.bullet.as_mut()
    }

    /// Free a slot; its generation bumps so existing handles go stale.
    pub fn despawn(&mut self, id: BulletId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return false;
        };
        if slot.generation != id.generation || slot.bullet.is_none() {
            return false;
        }
        slot.bullet = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        true
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live bullets in slot order
    pub fn iter(&self) -> impl Iterator<Item = (BulletId, &Bullet)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.bullet.as_ref().map(|b| {
                (
                    BulletId {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    b,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BulletId, &mut Bullet)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.bullet.as_mut().map(move |b| {
                (
                    BulletId {
                        index: i as u32,
                        generation,
                    },
                    b,
                )
            })
        })
    }

    /// Despawn every bullet failing the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(BulletId, &Bullet) -> bool) {
        let doomed: Vec<BulletId> = self
            .iter()
            .filter(|(id, b)| !keep(*id, b))
            .map(|(id, _)| id)
            .collect();
        for id in doomed {
            self.despawn(id);
        }
    }

    pub fn clear(&mut self) {
        let all: Vec<BulletId> = self.iter().map(|(id, _)| id).collect();
        for id in all {
            self.despawn(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn shot(x: f32, y: f32, vx: f32, vy: f32) -> ShotSpawn {
        ShotSpawn {
            pos: Vec2::new(x, y),
            vel: Vec2::new(vx, vy),
            damage: 10.0,
        }
    }

    #[test]
    fn test_pool_spawn_get() {
        let mut pool = BulletPool::new();
        let id = pool.spawn(Bullet::new(shot(100.0, 100.0, 5.0, 0.0), BulletOwner::Player));
        assert_eq!(pool.len(), 1);
        assert!(pool.get(id).is_some());
    }

    #[test]
    fn test_stale_handle_goes_invalid() {
        let mut pool = BulletPool::new();
        let a = pool.spawn(Bullet::new(shot(0.0, 0.0, 1.0, 0.0), BulletOwner::Player));
        assert!(pool.despawn(a));
        // Slot is reused, old handle must not alias the newcomer
        let b = pool.spawn(Bullet::new(shot(9.0, 9.0, 1.0, 0.0), BulletOwner::Player));
        assert_eq!(a.index, b.index);
        assert!(pool.get(a).is_none());
        assert!(pool.get(b).is_some());
        // Double despawn through the stale handle is refused
        assert!(!pool.despawn(a));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_iteration_order_is_slot_order() {
        let mut pool = BulletPool::new();
        let a = pool.spawn(Bullet::new(shot(1.0, 0.0, 1.0, 0.0), BulletOwner::Player));
        let _b = pool.spawn(Bullet::new(shot(2.0, 0.0, 1.0, 0.0), BulletOwner::Player));
        let _c = pool.spawn(Bullet::new(shot(3.0, 0.0, 1.0, 0.0), BulletOwner::Player));
        pool.despawn(a);
        pool.spawn(Bullet::new(shot(4.0, 0.0, 1.0, 0.0), BulletOwner::Player));
        let xs: Vec<f32> = pool.iter().map(|(_, b)| b.entity.center().x).collect();
        // Slot 0 was recycled for the fourth bullet
        assert_eq!(xs, vec![4.0, 2.0, 3.0]);
    }

    #[test]
    fn test_reflect_mirrors_normal_component() {
        let mut b = Bullet::new(shot(0.0, 0.0, 6.0, 2.0), BulletOwner::Player);
        b.reflect(Vec2::new(-1.0, 0.0)); // left face of a pipe
        assert_relative_eq!(b.vel.x, -6.0);
        assert_relative_eq!(b.vel.y, 2.0);
        assert!(b.bounced);
        assert_eq!(b.hit_entity, HitEntity::Pipe);
    }

    #[test]
    fn test_single_hit_per_target() {
        let mut b = Bullet::new(shot(0.0, 0.0, 5.0, 0.0), BulletOwner::Player);
        let target = TargetId::Enemy { group: 1, member: 0 };
        assert_eq!(b.register_hit(target), Some(10.0));
        assert_eq!(b.register_hit(target), None);
        // A different member of the same group is still fair game
        let other = TargetId::Enemy { group: 1, member: 1 };
        assert_eq!(b.register_hit(other), Some(10.0));
    }

    #[test]
    fn test_owner_immune_until_bounce() {
        let owner = BulletOwner::Enemy { group: 3, member: 1 };
        let mut b = Bullet::new(shot(0.0, 0.0, -5.0, 0.0), owner);
        let self_target = TargetId::Enemy { group: 3, member: 1 };
        assert!(!b.can_damage(self_target));
        b.reflect(Vec2::new(1.0, 0.0));
        assert!(b.can_damage(self_target));
    }

    #[test]
    fn test_settle_and_grace_removal() {
        let mut b = Bullet::new(shot(500.0, 630.0, 3.0, 4.0), BulletOwner::Player);
        b.settle(consts::GROUND_Y);
        assert!(b.stopped);
        assert_eq!(b.hit_entity, HitEntity::Floor);
        assert_eq!(b.vel, Vec2::ZERO);
        for _ in 0..consts::BULLET_SETTLE_TICKS {
            b.integrate();
            assert!(!b.is_spent(0.0, None));
        }
        b.integrate();
        assert!(b.is_spent(0.0, None));
    }

    #[test]
    fn test_spent_past_top() {
        let mut b = Bullet::new(shot(500.0, 10.0, 0.0, -20.0), BulletOwner::Player);
        b.integrate();
        assert!(b.is_spent(0.0, None));
    }

    #[test]
    fn test_bounced_spent_past_player_left() {
        let mut b = Bullet::new(shot(300.0, 300.0, -8.0, 0.0), BulletOwner::Player);
        assert!(!b.is_spent(200.0, None));
        b.bounced = true;
        // Still right of the player: relevant
        assert!(!b.is_spent(200.0, None));
        b.entity.pos.x = 100.0;
        assert!(b.is_spent(200.0, None));
    }

    #[test]
    fn test_bounced_spent_past_enemies_right() {
        let mut b = Bullet::new(shot(600.0, 300.0, 8.0, 0.0), BulletOwner::Player);
        b.bounced = true;
        assert!(!b.is_spent(200.0, Some(900.0)));
        b.entity.pos.x = 901.0;
        assert!(b.is_spent(200.0, Some(900.0)));
        // With no enemies left, anything past the right edge is spent
        b.entity.pos.x = consts::PLAYFIELD_W + 1.0;
        assert!(b.is_spent(200.0, None));
    }
}
