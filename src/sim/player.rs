//! The bird: movement state machine, resource bars, held inventory.
//!
//! Horizontal position is fixed; the world scrolls past. Vertical motion
//! depends on the movement mode: a sine bob before the round starts, gravity
//! plus flap impulses while flying, a dead ballistic fall after a fatal hit,
//! and an externally driven mode where the caller's hook owns the transform.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::attribute::AttributeBar;
use crate::sim::entity::{Entity, Mask};
use crate::sim::inventory::Inventory;
use crate::sim::item::UseEffect;
use crate::{consts, lerp};

/// Which rule set moves the bird this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// Pre-round idle bob on a fixed sine
    Shm,
    /// Flying: gravity, flaps, fatal contact
    Normal,
    /// Post-death fall; ignores input, stops on the ground
    Crash,
    /// Transform owned by an external per-tick hook
    Train,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub entity: Entity,
    pub inventory: Inventory,
    mode: MovementMode,
    hp: AttributeBar,
    shield: AttributeBar,
    food: AttributeBar,
    vel_y: f32,
    rotation: f32,
    base_y: f32,
    invincibility: u32,
}

impl Player {
    /// Fresh bird at the fixed column, mid-sky. Health and food start full;
    /// shield starts empty and only potions raise it.
    pub fn new() -> Self {
        let size = Vec2::new(consts::BIRD_W, consts::BIRD_H);
        let base_y = (consts::GROUND_Y - consts::BIRD_H) / 2.0;
        let mask = Mask::ellipse(consts::BIRD_W as u32, consts::BIRD_H as u32);
        Self {
            entity: Entity::with_mask(Vec2::new(consts::BIRD_X, base_y), size, mask),
            inventory: Inventory::new(),
            mode: MovementMode::Shm,
            hp: AttributeBar::new(consts::PLAYER_HP),
            shield: AttributeBar::with_value(consts::PLAYER_SHIELD, 0.0),
            food: AttributeBar::new(consts::PLAYER_FOOD),
            vel_y: 0.0,
            rotation: 0.0,
            base_y,
            invincibility: 0,
        }
    }

    #[inline]
    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    #[inline]
    pub fn hp(&self) -> &AttributeBar {
        &self.hp
    }

    #[inline]
    pub fn shield(&self) -> &AttributeBar {
        &self.shield
    }

    #[inline]
    pub fn food(&self) -> &AttributeBar {
        &self.food
    }

    #[inline]
    pub fn vel_y(&self) -> f32 {
        self.vel_y
    }

    /// Body tilt in radians, positive = nose down
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[inline]
    pub fn is_invincible(&self) -> bool {
        self.invincibility > 0
    }

    pub fn invincibility_remaining(&self) -> u32 {
        self.invincibility
    }

    /// World anchor the held gun pivots around
    #[inline]
    pub fn gun_anchor(&self) -> Vec2 {
        self.entity.center()
    }

    pub fn set_mode(&mut self, mode: MovementMode) {
        self.mode = mode;
    }

    /// Leave the pre-round bob and start flying
    pub fn start_flying(&mut self) {
        self.mode = MovementMode::Normal;
        self.vel_y = 0.0;
    }

    /// Fatal hit: the bird becomes a falling body
    pub fn crash(&mut self) {
        self.mode = MovementMode::Crash;
        self.vel_y = self.vel_y.max(0.0);
    }

    /// Flap impulse. Only meaningful while flying; returns whether it took.
    pub fn flap(&mut self) -> bool {
        if self.mode != MovementMode::Normal {
            return false;
        }
        self.vel_y = consts::FLAP_IMPULSE;
        true
    }

    /// One movement step. `tick` drives the idle bob; Train mode moves
    /// nothing here because the external hook owns the transform.
    pub fn integrate(&mut self, tick: u64) {
        match self.mode {
            MovementMode::Shm => {
                self.entity.pos.y = self.base_y
                    + consts::SHM_AMPLITUDE * (consts::SHM_FREQUENCY * tick as f32).sin();
            }
            MovementMode::Normal => {
                self.vel_y = (self.vel_y + consts::GRAVITY).min(consts::MAX_FALL_SPEED);
                self.entity.pos.y += self.vel_y;
                // The ceiling is solid, not fatal
                if self.entity.pos.y < 0.0 {
                    self.entity.pos.y = 0.0;
                    self.vel_y = 0.0;
                }
                let target = if self.vel_y < 0.0 {
                    consts::ROT_UP
                } else {
                    consts::ROT_DOWN
                };
                self.rotation = lerp(self.rotation, target, consts::ROT_LERP);
            }
            MovementMode::Crash => {
                self.vel_y = (self.vel_y + consts::GRAVITY).min(consts::MAX_FALL_SPEED);
                self.entity.pos.y += self.vel_y;
                let rest = consts::GROUND_Y - self.entity.size.y;
                if self.entity.pos.y >= rest {
                    self.entity.pos.y = rest;
                    self.vel_y = 0.0;
                }
                self.rotation = lerp(self.rotation, consts::ROT_DOWN, consts::ROT_LERP);
            }
            MovementMode::Train => {}
        }
    }

    /// Combat damage: shield soaks first, the remainder comes out of health.
    /// Ignored entirely while invincible. Returns the damage that landed.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 || self.is_invincible() {
            return 0.0;
        }
        let absorbed = self.shield.current().min(amount);
        if absorbed > 0.0 {
            self.shield.change_by(-absorbed);
        }
        let remainder = amount - absorbed;
        if remainder > 0.0 {
            self.hp.change_by(-remainder);
        }
        amount
    }

    pub fn grant_invincibility(&mut self, ticks: u32) {
        self.invincibility = self.invincibility.max(ticks);
    }

    /// Apply a consumable's effect. Restores are guarded no-ops on a full
    /// bar so the item is not wasted; returns whether anything changed.
    pub fn apply_use_effect(&mut self, effect: UseEffect) -> bool {
        match effect {
            UseEffect::RestoreFood(amount) => self.food.change_by(amount),
            UseEffect::RestoreShield(amount) => self.shield.change_by(amount),
            UseEffect::RestoreHp(amount) => self.hp.change_by(amount),
            UseEffect::GrantInvincibility(ticks) => {
                self.grant_invincibility(ticks);
                true
            }
        }
    }

    /// Use one item from a consumable slot. Nothing is consumed unless the
    /// effect actually applied.
    pub fn use_item(&mut self, slot: usize) -> bool {
        let Some(effect) = self.inventory.slot_effect(slot) else {
            return false;
        };
        if !self.apply_use_effect(effect) {
            return false;
        }
        self.inventory.consume_one(slot)
    }

    /// Per-tick upkeep: invincibility countdown with its regen, hunger decay
    /// while flying, and the starvation drain. Starvation bites health
    /// directly (the shield is for gunfire), but never through invincibility.
    pub fn tick_timers(&mut self) {
        if self.invincibility > 0 {
            self.invincibility -= 1;
            self.hp.change_by(consts::REGEN_PER_TICK);
        }
        if self.mode == MovementMode::Normal {
            self.food.change_by(-consts::FOOD_DECAY);
            if self.food.is_empty() && !self.is_invincible() {
                self.hp.change_by(-consts::STARVE_DRAIN);
            }
        }
    }

    /// Round reset: bars back to their starting values, transform
    /// re-centered, inventory emptied. The struct itself is reused so
    /// handles held by the caller stay valid.
    pub fn reset(&mut self) {
        self.entity.pos = Vec2::new(consts::BIRD_X, self.base_y);
        self.inventory.reset();
        self.mode = MovementMode::Shm;
        self.hp.refill();
        self.shield.set(0.0);
        self.food.refill();
        self.vel_y = 0.0;
        self.rotation = 0.0;
        self.invincibility = 0;
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}
