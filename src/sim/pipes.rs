//! Scrolling pipe obstacles, recycled in place.
//!
//! The field always holds `PIPE_PAIRS` pairs. When the leftmost pair drifts
//! `PIPE_RECYCLE_MARGIN` past the left edge it is respawned after the
//! rightmost pair with a freshly rolled gap, never reallocated, so anything
//! holding a scroll reference (pickup spawn heights, bullets mid-bounce)
//! stays valid.

use glam::Vec2;
use log::warn;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts;
use crate::sim::entity::{Entity, Mask};

/// Upper or lower half of a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub entity: Entity,
}

impl Pipe {
    fn new(pos: Vec2, size: Vec2) -> Self {
        let mask = Mask::filled(size.x as u32, size.y as u32);
        Self {
            entity: Entity::with_mask(pos, size, mask),
        }
    }
}

/// A pair of pipes with a fixed vertical gap between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipePair {
    pub upper: Pipe,
    pub lower: Pipe,
    gap_top: f32,
    scored: bool,
}

impl PipePair {
    fn new(x: f32, gap_top: f32) -> Self {
        let gap_bottom = gap_top + consts::PIPE_VGAP;
        Self {
            upper: Pipe::new(Vec2::new(x, 0.0), Vec2::new(consts::PIPE_W, gap_top)),
            lower: Pipe::new(
                Vec2::new(x, gap_bottom),
                Vec2::new(consts::PIPE_W, consts::GROUND_Y - gap_bottom),
            ),
            gap_top,
            scored: false,
        }
    }

    /// Reuse this pair at a new position with a new gap (recycling)
    fn respawn(&mut self, x: f32, gap_top: f32) {
        *self = Self::new(x, gap_top);
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.upper.entity.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.upper.entity.right()
    }

    #[inline]
    pub fn gap_top(&self) -> f32 {
        self.gap_top
    }

    #[inline]
    pub fn gap_center(&self) -> Vec2 {
        Vec2::new(
            self.x() + consts::PIPE_W / 2.0,
            self.gap_top + consts::PIPE_VGAP / 2.0,
        )
    }

    pub fn is_scored(&self) -> bool {
        self.scored
    }

    fn scroll(&mut self) {
        self.upper.entity.pos.x += consts::PIPE_VEL_X;
        self.lower.entity.pos.x += consts::PIPE_VEL_X;
    }

    /// True if `entity` touches either pipe of the pair
    pub fn hits(&self, entity: &Entity) -> bool {
        super::entity::collide(entity, &self.upper.entity)
            || super::entity::collide(entity, &self.lower.entity)
    }
}

/// The scrolling obstacle field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeField {
    pairs: Vec<PipePair>,
}

impl PipeField {
    /// Seed the steady-state field: pairs start just off the right edge,
    /// spaced a horizontal gap apart.
    pub fn new(rng: &mut Pcg32) -> Self {
        let mut pairs = Vec::with_capacity(consts::PIPE_PAIRS);
        for i in 0..consts::PIPE_PAIRS {
            let x = consts::PLAYFIELD_W + 40.0 + i as f32 * consts::PIPE_HGAP;
            pairs.push(PipePair::new(x, roll_gap_top(rng)));
        }
        Self { pairs }
    }

    /// Pairs in left-to-right order
    pub fn pairs(&self) -> &[PipePair] {
        &self.pairs
    }

    /// Gap center of the most recently (re)spawned pair, the vertical
    /// reference for pickup placement
    pub fn last_gap_center(&self) -> Vec2 {
        // Rightmost pair is always last: recycling pushes to the back
        self.pairs[self.pairs.len() - 1].gap_center()
    }

    /// Scroll one tick and recycle the leftmost pair if it has left the
    /// screen. Returns true when a recycle happened.
    pub fn scroll(&mut self, rng: &mut Pcg32) -> bool {
        for pair in &mut self.pairs {
            pair.scroll();
        }

        let offscreen = self
            .pairs
            .iter()
            .filter(|p| p.right() < -consts::PIPE_RECYCLE_MARGIN)
            .count();
        // More than one pair off-screen at once means the scroll math broke
        debug_assert!(offscreen <= 1, "{offscreen} pipe pairs off-screen");
        if offscreen > 1 {
            warn!("{offscreen} pipe pairs off-screen simultaneously");
        }

        if offscreen == 0 {
            return false;
        }
        let last_x = self.pairs[self.pairs.len() - 1].x();
        let gap_top = roll_gap_top(rng);
        self.pairs[0].respawn(last_x + consts::PIPE_HGAP, gap_top);
        // Keep left-to-right order
        self.pairs.rotate_left(1);
        true
    }

    /// Latch crossings: a pair scores once when its right edge passes the
    /// player's left edge. Returns how many pairs were newly crossed.
    pub fn check_crossings(&mut self, player_left: f32) -> u32 {
        let mut crossed = 0;
        for pair in &mut self.pairs {
            if !pair.scored && pair.right() < player_left {
                pair.scored = true;
                crossed += 1;
            }
        }
        crossed
    }

    /// True if `entity` touches any pipe
    pub fn hits(&self, entity: &Entity) -> bool {
        self.pairs.iter().any(|p| p.hits(entity))
    }

    /// The first pipe entity overlapping `entity`, for reflection geometry
    pub fn first_hit(&self, entity: &Entity) -> Option<&Entity> {
        for pair in &self.pairs {
            if super::entity::collide(entity, &pair.upper.entity) {
                return Some(&pair.upper.entity);
            }
            if super::entity::collide(entity, &pair.lower.entity) {
                return Some(&pair.lower.entity);
            }
        }
        None
    }
}

fn roll_gap_top(rng: &mut Pcg32) -> f32 {
    rng.random_range(0.2 * consts::PLAYFIELD_H..0.8 * consts::PLAYFIELD_H - consts::PIPE_VGAP)
}

/// Outward normal of the pipe face an incoming entity struck, chosen by
/// smallest penetration. Axis-aligned by construction.
pub fn impact_normal(moving: &Entity, pipe: &Entity) -> Vec2 {
    let pen_left = moving.right() - pipe.left();
    let pen_right = pipe.right() - moving.left();
    let pen_top = moving.bottom() - pipe.top();
    let pen_bottom = pipe.bottom() - moving.top();

    let min = pen_left.min(pen_right).min(pen_top).min(pen_bottom);
    if min == pen_left {
        Vec2::new(-1.0, 0.0)
    } else if min == pen_right {
        Vec2::new(1.0, 0.0)
    } else if min == pen_top {
        Vec2::new(0.0, -1.0)
    } else {
        Vec2::new(0.0, 1.0)
    }
}
