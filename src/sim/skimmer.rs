//! CloudSkimmers: a trio of hovering gunners.
//!
//! They drift left slowly with their height pinned to a sine of their own x,
//! so the hover path is a pure function of horizontal position. Each member
//! carries its own gun and reserve, tracks the player with a rate-limited
//! aim, and fires on an independently rolled cadence.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sim::bullet::{BulletOwner, TargetId};
use crate::sim::enemy::{Enemy, EnemyBody, EnemyKind, live_members};
use crate::sim::entity::{Entity, Mask};
use crate::sim::gun::{Gun, GunKind, ShotSpawn, aim_angle};
use crate::{consts, normalize_angle};

/// Hover contract: height depends on nothing but x.
#[inline]
fn hover_y(initial_y: f32, x: f32) -> f32 {
    initial_y + consts::SKIMMER_AMPLITUDE * (consts::SKIMMER_FREQUENCY * x).sin()
}

fn roll_trigger(rng: &mut Pcg32) -> u32 {
    rng.random_range(consts::SKIMMER_FIRE_CD_MIN..=consts::SKIMMER_FIRE_CD_MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudSkimmer {
    body: EnemyBody,
    gun: Gun,
    reserve: u32,
    initial_y: f32,
    trigger_cooldown: u32,
}

impl Enemy for CloudSkimmer {
    fn body(&self) -> &EnemyBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut EnemyBody {
        &mut self.body
    }
}

impl CloudSkimmer {
    fn new(x: f32, initial_y: f32, gun_kind: GunKind, rng: &mut Pcg32) -> Self {
        let size = Vec2::splat(consts::SKIMMER_SIZE);
        let pos = Vec2::new(x, hover_y(initial_y, x));
        let mask = Mask::ellipse(size.x as u32, size.y as u32);
        Self {
            body: EnemyBody::new(
                Entity::with_mask(pos, size, mask),
                EnemyKind::CloudSkimmer.member_hp(),
            ),
            gun: Gun::new(gun_kind),
            reserve: consts::SKIMMER_RESERVE_AMMO,
            initial_y,
            trigger_cooldown: roll_trigger(rng),
        }
    }

    #[inline]
    pub fn gun(&self) -> &Gun {
        &self.gun
    }

    pub fn reserve_ammo(&self) -> u32 {
        self.reserve
    }

    fn gun_anchor(&self) -> Vec2 {
        self.body.entity.center()
    }

    /// No shooting from past the right edge
    fn on_screen(&self) -> bool {
        self.body.entity.right() <= consts::PLAYFIELD_W
    }

    /// Intent step against the start-of-tick snapshot: slew the aim toward
    /// the player and pull the trigger when the cadence allows. The fire
    /// intent stays latched in the gun until after this tick's movement.
    fn decide(&mut self, rng: &mut Pcg32, target: Vec2) {
        let desired = aim_angle(self.gun_anchor(), target);
        let delta = normalize_angle(desired - self.gun.rotation());
        self.gun
            .rotate_by(delta.clamp(-consts::SKIMMER_TURN_RATE, consts::SKIMMER_TURN_RATE));
        if !self.on_screen() {
            return;
        }
        self.trigger_cooldown = self.trigger_cooldown.saturating_sub(1);
        if self.trigger_cooldown == 0 && self.gun.can_fire() {
            self.gun.queue_fire();
            self.trigger_cooldown = roll_trigger(rng);
        }
    }

    /// Movement plus gun upkeep: constant drift, height from the hover
    /// contract, cooldown countdown, and the automatic reload answer.
    fn advance(&mut self) {
        let x = self.body.entity.pos.x + consts::SKIMMER_VEL_X;
        self.body.entity.pos.x = x;
        self.body.entity.pos.y = hover_y(self.initial_y, x);
        self.cull_offscreen();
        self.gun.update();
        if self.gun.wants_auto_reload() {
            if let Some(taken) = self.gun.start_reload(self.reserve) {
                self.reserve -= taken;
            }
        }
    }

    /// Consume the latched intent at the post-move transform
    fn resolve_fire(&mut self) -> Option<ShotSpawn> {
        self.gun.resolve_pending_fire(self.gun_anchor())
    }
}

/// The formation: three skimmers stacked around the baseline row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkimmerGroup {
    group_id: u32,
    members: Vec<CloudSkimmer>,
}

impl SkimmerGroup {
    pub fn spawn(rng: &mut Pcg32, group_id: u32, gun_kind: GunKind) -> Self {
        let mut members = Vec::with_capacity(consts::ENEMY_GROUP_SIZE);
        for row in 0..consts::ENEMY_GROUP_SIZE {
            let initial_y = consts::SKIMMER_BASELINE_Y
                + (row as f32 - 1.0) * consts::SKIMMER_FORMATION_STEP;
            members.push(CloudSkimmer::new(
                consts::SKIMMER_SPAWN_X,
                initial_y,
                gun_kind,
                rng,
            ));
        }
        Self { group_id, members }
    }

    #[inline]
    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    pub fn members(&self) -> &[CloudSkimmer] {
        &self.members
    }

    pub fn is_cleared(&self) -> bool {
        self.members.iter().all(|m| m.is_gone())
    }

    pub fn decide(&mut self, rng: &mut Pcg32, player_center: Vec2) {
        for member in self.members.iter_mut().filter(|m| !m.is_gone()) {
            member.decide(rng, player_center);
        }
    }

    pub fn advance(&mut self) {
        for member in self.members.iter_mut().filter(|m| !m.is_gone()) {
            member.advance();
        }
    }

    /// Drain every latched fire intent into tagged bullet spawns
    pub fn resolve_shots(&mut self) -> Vec<(BulletOwner, ShotSpawn)> {
        let group = self.group_id;
        let mut shots = Vec::new();
        for (i, member) in self.members.iter_mut().enumerate() {
            if member.is_gone() {
                continue;
            }
            if let Some(shot) = member.resolve_fire() {
                let owner = BulletOwner::Enemy {
                    group,
                    member: i as u32,
                };
                shots.push((owner, shot));
            }
        }
        shots
    }

    pub fn live_targets(&self) -> Vec<(TargetId, &Entity)> {
        let group = self.group_id;
        live_members(&self.members)
            .map(|(i, m)| (TargetId::Enemy { group, member: i }, &m.body().entity))
            .collect()
    }

    /// Returns true when the hit was a kill
    pub fn apply_damage(&mut self, member: u32, damage: f32) -> bool {
        self.members
            .get_mut(member as usize)
            .is_some_and(|m| m.take_damage(damage))
    }

    pub fn right_extent(&self) -> Option<f32> {
        live_members(&self.members)
            .map(|(_, m)| m.body().entity.right())
            .fold(None, |acc, r| Some(acc.map_or(r, |a: f32| a.max(r))))
    }
}
