//! Shared enemy plumbing: hit points, gone-flags, kind taxonomy.

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::sim::attribute::AttributeBar;
use crate::sim::entity::Entity;

/// Closed set of enemy group types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    CloudSkimmer,
    SkyDart,
}

impl EnemyKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cloud_skimmer" => Some(EnemyKind::CloudSkimmer),
            "sky_dart" => Some(EnemyKind::SkyDart),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::CloudSkimmer => "cloud_skimmer",
            EnemyKind::SkyDart => "sky_dart",
        }
    }

    /// Successor in the spawn alternation
    pub fn other(self) -> Self {
        match self {
            EnemyKind::CloudSkimmer => EnemyKind::SkyDart,
            EnemyKind::SkyDart => EnemyKind::CloudSkimmer,
        }
    }

    pub fn member_hp(self) -> f32 {
        match self {
            EnemyKind::CloudSkimmer => 70.0,
            EnemyKind::SkyDart => 40.0,
        }
    }
}

/// State every enemy variant composes: geometry, hit points, gone-flag.
/// `gone` latches true on death or once the enemy scrolls off the left edge;
/// groups are removed when every member is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyBody {
    pub entity: Entity,
    pub hp: AttributeBar,
    gone: bool,
}

impl EnemyBody {
    pub fn new(entity: Entity, hp_max: f32) -> Self {
        Self {
            entity,
            hp: AttributeBar::new(hp_max),
            gone: false,
        }
    }

    #[inline]
    pub fn is_gone(&self) -> bool {
        self.gone
    }

    /// Apply damage. Returns true when this hit emptied the bar (a kill);
    /// hits on an already-gone enemy are no-ops.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.gone {
            return false;
        }
        let changed = self.hp.change_by(-amount);
        if changed && self.hp.is_empty() {
            self.gone = true;
            return true;
        }
        false
    }

    fn cull_offscreen(&mut self) {
        if self.entity.right() < -consts::PIPE_RECYCLE_MARGIN {
            self.gone = true;
        }
    }
}

/// Behavior common to every enemy variant.
pub trait Enemy {
    fn body(&self) -> &EnemyBody;
    fn body_mut(&mut self) -> &mut EnemyBody;

    fn is_gone(&self) -> bool {
        self.body().is_gone()
    }

    fn take_damage(&mut self, amount: f32) -> bool {
        self.body_mut().take_damage(amount)
    }

    /// Shared off-screen culling, run after each movement update
    fn cull_offscreen(&mut self) {
        self.body_mut().cull_offscreen();
    }
}

/// Live members of a group slice, with their slot indices
pub fn live_members<E: Enemy>(members: &[E]) -> impl Iterator<Item = (u32, &E)> {
    members
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.is_gone())
        .map(|(i, m)| (i as u32, m))
}
