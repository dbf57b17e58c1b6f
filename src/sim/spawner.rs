//! Enemy lifecycle: one group in the sky at a time, kinds alternating.
//!
//! A rolled cooldown gates each spawn and only counts down while no group is
//! active, so pressure resumes a beat after the last group clears rather
//! than stacking up behind it.

use glam::Vec2;
use log::info;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sim::bullet::{BulletOwner, TargetId};
use crate::sim::dart::DartGroup;
use crate::sim::enemy::EnemyKind;
use crate::sim::entity::Entity;
use crate::sim::gun::{GunKind, ShotSpawn};
use crate::sim::skimmer::SkimmerGroup;

/// The active formation, whichever kind it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnemyGroup {
    Skimmers(SkimmerGroup),
    Darts(DartGroup),
}

impl EnemyGroup {
    pub fn kind(&self) -> EnemyKind {
        match self {
            EnemyGroup::Skimmers(_) => EnemyKind::CloudSkimmer,
            EnemyGroup::Darts(_) => EnemyKind::SkyDart,
        }
    }

    pub fn group_id(&self) -> u32 {
        match self {
            EnemyGroup::Skimmers(g) => g.group_id(),
            EnemyGroup::Darts(g) => g.group_id(),
        }
    }

    fn is_cleared(&self) -> bool {
        match self {
            EnemyGroup::Skimmers(g) => g.is_cleared(),
            EnemyGroup::Darts(g) => g.is_cleared(),
        }
    }

    fn decide(&mut self, rng: &mut Pcg32, player_center: Vec2) {
        match self {
            EnemyGroup::Skimmers(g) => g.decide(rng, player_center),
            EnemyGroup::Darts(g) => g.decide(rng, player_center),
        }
    }

    fn advance(&mut self) {
        match self {
            EnemyGroup::Skimmers(g) => g.advance(),
            EnemyGroup::Darts(g) => g.advance(),
        }
    }

    fn live_targets(&self) -> Vec<(TargetId, &Entity)> {
        match self {
            EnemyGroup::Skimmers(g) => g.live_targets(),
            EnemyGroup::Darts(g) => g.live_targets(),
        }
    }

    fn apply_damage(&mut self, member: u32, damage: f32) -> bool {
        match self {
            EnemyGroup::Skimmers(g) => g.apply_damage(member, damage),
            EnemyGroup::Darts(g) => g.apply_damage(member, damage),
        }
    }

    fn right_extent(&self) -> Option<f32> {
        match self {
            EnemyGroup::Skimmers(g) => g.right_extent(),
            EnemyGroup::Darts(g) => g.right_extent(),
        }
    }
}

fn roll_cooldown(rng: &mut Pcg32, window: (u32, u32)) -> u32 {
    rng.random_range(window.0..=window.1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyManager {
    group: Option<EnemyGroup>,
    cooldown: u32,
    next_kind: EnemyKind,
    /// Monotonic spawn counter; tags bullets and targets so ids from a
    /// previous group never alias the current one
    group_seq: u32,
}

impl EnemyManager {
    pub fn new(rng: &mut Pcg32, window: (u32, u32)) -> Self {
        Self {
            group: None,
            cooldown: roll_cooldown(rng, window),
            next_kind: EnemyKind::CloudSkimmer,
            group_seq: 0,
        }
    }

    pub fn group(&self) -> Option<&EnemyGroup> {
        self.group.as_ref()
    }

    pub fn active_kind(&self) -> Option<EnemyKind> {
        self.group.as_ref().map(|g| g.kind())
    }

    /// Count the spawn gate down and open it when due. At most one group is
    /// ever active; the alternation advances on each spawn.
    pub fn update_spawner(
        &mut self,
        rng: &mut Pcg32,
        window: (u32, u32),
        skimmer_gun: GunKind,
    ) -> Option<EnemyKind> {
        if self.group.is_some() {
            return None;
        }
        self.cooldown = self.cooldown.saturating_sub(1);
        if self.cooldown > 0 {
            return None;
        }
        let kind = self.next_kind;
        self.next_kind = kind.other();
        self.group_seq += 1;
        self.group = Some(match kind {
            EnemyKind::CloudSkimmer => {
                EnemyGroup::Skimmers(SkimmerGroup::spawn(rng, self.group_seq, skimmer_gun))
            }
            EnemyKind::SkyDart => EnemyGroup::Darts(DartGroup::spawn(rng, self.group_seq)),
        });
        self.cooldown = roll_cooldown(rng, window);
        info!("enemy group {} inbound: {}", self.group_seq, kind.name());
        Some(kind)
    }

    pub fn decide(&mut self, rng: &mut Pcg32, player_center: Vec2) {
        if let Some(group) = &mut self.group {
            group.decide(rng, player_center);
        }
    }

    pub fn advance(&mut self) {
        if let Some(group) = &mut self.group {
            group.advance();
        }
    }

    /// Latched enemy fire, resolved at the post-move transforms
    pub fn resolve_shots(&mut self) -> Vec<(BulletOwner, ShotSpawn)> {
        match &mut self.group {
            Some(EnemyGroup::Skimmers(g)) => g.resolve_shots(),
            _ => Vec::new(),
        }
    }

    /// Live member hitboxes, tagged for bullet hit memory
    pub fn live_targets(&self) -> Vec<(TargetId, &Entity)> {
        self.group.as_ref().map_or_else(Vec::new, |g| g.live_targets())
    }

    /// Route damage to a tagged member. Hits addressed to a previous group
    /// fall through harmlessly. Returns the kind on a kill.
    pub fn apply_damage(&mut self, target: TargetId, damage: f32) -> Option<EnemyKind> {
        let TargetId::Enemy { group, member } = target else {
            return None;
        };
        let active = self.group.as_mut()?;
        if active.group_id() != group {
            return None;
        }
        active.apply_damage(member, damage).then(|| active.kind())
    }

    /// Rightmost live enemy edge, for bullet removal
    pub fn right_extent(&self) -> Option<f32> {
        self.group.as_ref().and_then(|g| g.right_extent())
    }

    /// Dive contacts against the player this tick
    pub fn dart_strikes(&mut self, player: &Entity) -> Vec<f32> {
        match &mut self.group {
            Some(EnemyGroup::Darts(g)) => g.strikes(player),
            _ => Vec::new(),
        }
    }

    /// Drop the group once every member is gone. Returns its kind so the
    /// caller can report the clear.
    pub fn clear_finished(&mut self) -> Option<EnemyKind> {
        let cleared = self.group.as_ref().is_some_and(|g| g.is_cleared());
        if cleared {
            let kind = self.group.take().map(|g| g.kind());
            if let Some(kind) = kind {
                info!("enemy group cleared: {}", kind.name());
            }
            return kind;
        }
        None
    }

    /// Round reset: clear the sky, restart the gate and the alternation
    pub fn reset(&mut self, rng: &mut Pcg32, window: (u32, u32)) {
        self.group = None;
        self.cooldown = roll_cooldown(rng, window);
        self.next_kind = EnemyKind::CloudSkimmer;
    }
}
