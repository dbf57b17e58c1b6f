//! Gun state machine: cooldowns, reload, latched fire intent, recoil.
//!
//! A gun is always in exactly one interaction state (idle, firing cooldown,
//! or reloading); firing and reloading block each other. Fire intents are
//! never resolved at registration time: they sit in a one-slot latch and are
//! consumed at the start of the holder's next transform update, so bullets
//! spawn from the already-updated muzzle for that tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{consts, normalize_angle, rotate_vec};

/// Closed set of gun models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GunKind {
    Deagle,
    Ak47,
    Uzi,
}

impl GunKind {
    pub const ALL: [GunKind; 3] = [GunKind::Deagle, GunKind::Ak47, GunKind::Uzi];

    /// Factory from a config-file name; unknown names are the caller's error.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "deagle" => Some(GunKind::Deagle),
            "ak47" => Some(GunKind::Ak47),
            "uzi" => Some(GunKind::Uzi),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GunKind::Deagle => "deagle",
            GunKind::Ak47 => "ak47",
            GunKind::Uzi => "uzi",
        }
    }

    pub fn magazine_size(self) -> u32 {
        match self {
            GunKind::Deagle => 7,
            GunKind::Ak47 => 30,
            GunKind::Uzi => 25,
        }
    }

    pub fn damage(self) -> f32 {
        match self {
            GunKind::Deagle => 35.0,
            GunKind::Ak47 => 12.0,
            GunKind::Uzi => 8.0,
        }
    }

    /// Bullet speed in pixels per tick
    pub fn muzzle_speed(self) -> f32 {
        match self {
            GunKind::Deagle => 18.0,
            GunKind::Ak47 => 22.0,
            GunKind::Uzi => 16.0,
        }
    }

    /// Ticks between shots
    pub fn shoot_cooldown(self) -> u32 {
        match self {
            GunKind::Deagle => 15,
            GunKind::Ak47 => 5,
            GunKind::Uzi => 3,
        }
    }

    /// Ticks a reload takes
    pub fn reload_cooldown(self) -> u32 {
        match self {
            GunKind::Deagle => 45,
            GunKind::Ak47 => 75,
            GunKind::Uzi => 60,
        }
    }

    /// Rounds granted per ammo pickup while this gun is held
    pub fn ammo_batch(self) -> u32 {
        match self {
            GunKind::Deagle => 14,
            GunKind::Ak47 => 30,
            GunKind::Uzi => 25,
        }
    }

    /// Vector from the gun pivot to the barrel end at rotation zero
    pub fn pivot_to_barrel(self) -> Vec2 {
        match self {
            GunKind::Deagle => Vec2::new(22.0, 0.0),
            GunKind::Ak47 => Vec2::new(34.0, 0.0),
            GunKind::Uzi => Vec2::new(26.0, 0.0),
        }
    }
}

/// Bullet spawn velocity for an aim angle, screen coordinates (+y down):
/// positive angles aim upward.
#[inline]
pub fn velocity_from_angle(speed: f32, angle: f32) -> Vec2 {
    Vec2::new(speed * (-angle).cos(), speed * (-angle).sin())
}

/// Aim angle whose [`velocity_from_angle`] direction points from `from`
/// toward `to`.
#[inline]
pub fn aim_angle(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    (-d.y).atan2(d.x)
}

/// At most one interaction runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum Interaction {
    Idle,
    Firing { remaining: u32 },
    Reloading { remaining: u32, quantity_after: u32 },
}

/// Transient visual kick after each shot. Triangular envelope: out over the
/// first half of the animation, back over the second. Never touches
/// ballistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Recoil {
    remaining: u32,
}

impl Recoil {
    fn start(&mut self) {
        self.remaining = consts::RECOIL_TICKS;
    }

    fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Envelope in [0,1]
    pub fn envelope(&self) -> f32 {
        if self.remaining == 0 {
            return 0.0;
        }
        let total = consts::RECOIL_TICKS as f32;
        let elapsed = total - self.remaining as f32;
        let half = total / 2.0;
        if elapsed < half {
            elapsed / half
        } else {
            (total - elapsed) / half
        }
    }
}

/// Everything needed to spawn one bullet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSpawn {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
}

/// A held gun. Reserve ammunition lives in the holder's inventory, not here;
/// reload transfers are negotiated through `start_reload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gun {
    kind: GunKind,
    quantity: u32,
    rotation: f32,
    interaction: Interaction,
    pending_fire: bool,
    auto_reload_armed: bool,
    recoil: Recoil,
}

impl Gun {
    /// Fresh gun with a full magazine
    pub fn new(kind: GunKind) -> Self {
        Self {
            kind,
            quantity: kind.magazine_size(),
            rotation: 0.0,
            interaction: Interaction::Idle,
            pending_fire: false,
            auto_reload_armed: false,
            recoil: Recoil::default(),
        }
    }

    #[inline]
    pub fn kind(&self) -> GunKind {
        self.kind
    }

    /// Rounds currently in the magazine
    #[inline]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Aim angle in radians, positive = up
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn remaining_shoot_cooldown(&self) -> u32 {
        match self.interaction {
            Interaction::Firing { remaining } => remaining,
            _ => 0,
        }
    }

    pub fn remaining_reload_cooldown(&self) -> u32 {
        match self.interaction {
            Interaction::Reloading { remaining, .. } => remaining,
            _ => 0,
        }
    }

    /// Magazine size the reload in progress will land on, if any
    pub fn pending_reload_target(&self) -> Option<u32> {
        match self.interaction {
            Interaction::Reloading { quantity_after, .. } => Some(quantity_after),
            _ => None,
        }
    }

    #[inline]
    pub fn interaction_in_progress(&self) -> bool {
        self.interaction != Interaction::Idle
    }

    pub fn is_reloading(&self) -> bool {
        matches!(self.interaction, Interaction::Reloading { .. })
    }

    pub fn can_fire(&self) -> bool {
        self.quantity > 0 && !self.interaction_in_progress()
    }

    pub fn can_reload(&self, reserve: u32) -> bool {
        !self.interaction_in_progress()
            && self.quantity < self.kind.magazine_size()
            && reserve > 0
    }

    pub fn rotate_by(&mut self, delta: f32) {
        self.rotation = normalize_angle(self.rotation + delta);
    }

    pub fn set_rotation(&mut self, angle: f32) {
        self.rotation = normalize_angle(angle);
    }

    /// Latch a fire intent. One slot: a second intent in the same tick is
    /// absorbed. Resolved by `resolve_pending_fire` on the next transform
    /// update.
    pub fn queue_fire(&mut self) {
        self.pending_fire = true;
    }

    pub fn has_pending_fire(&self) -> bool {
        self.pending_fire
    }

    /// Consume the latched intent against the holder's updated transform.
    /// Guarded no-op (returning `None`) when the gun cannot fire.
    pub fn resolve_pending_fire(&mut self, gun_pos: Vec2) -> Option<ShotSpawn> {
        if !self.pending_fire {
            return None;
        }
        self.pending_fire = false;
        self.fire_now(gun_pos)
    }

    fn fire_now(&mut self, gun_pos: Vec2) -> Option<ShotSpawn> {
        if !self.can_fire() {
            return None;
        }
        self.quantity -= 1;
        self.interaction = Interaction::Firing {
            remaining: self.kind.shoot_cooldown(),
        };
        self.recoil.start();
        if self.quantity == 0 {
            self.auto_reload_armed = true;
        }
        Some(ShotSpawn {
            pos: self.muzzle_world(gun_pos),
            vel: velocity_from_angle(self.kind.muzzle_speed(), self.rotation),
            damage: self.kind.damage(),
        })
    }

    /// Begin a reload against the holder's reserve. Returns the rounds taken
    /// from reserve (deducted by the caller immediately); the magazine is
    /// credited only when the cooldown completes. Guarded no-op when blocked.
    pub fn start_reload(&mut self, reserve: u32) -> Option<u32> {
        if !self.can_reload(reserve) {
            return None;
        }
        let quantity_after = (self.quantity + reserve).min(self.kind.magazine_size());
        let taken = quantity_after - self.quantity;
        self.interaction = Interaction::Reloading {
            remaining: self.kind.reload_cooldown(),
            quantity_after,
        };
        self.auto_reload_armed = false;
        Some(taken)
    }

    /// True when a shot emptied the magazine and the cooldown has elapsed;
    /// the holder answers by calling `start_reload` with its reserve.
    pub fn wants_auto_reload(&self) -> bool {
        self.auto_reload_armed && !self.interaction_in_progress()
    }

    /// Per-tick countdown. Returns true when a reload completed this tick.
    pub fn update(&mut self) -> bool {
        self.recoil.tick();
        match self.interaction {
            Interaction::Idle => false,
            Interaction::Firing { remaining } => {
                let remaining = remaining.saturating_sub(1);
                self.interaction = if remaining == 0 {
                    Interaction::Idle
                } else {
                    Interaction::Firing { remaining }
                };
                false
            }
            Interaction::Reloading {
                remaining,
                quantity_after,
            } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.quantity = quantity_after;
                    self.interaction = Interaction::Idle;
                    true
                } else {
                    self.interaction = Interaction::Reloading {
                        remaining,
                        quantity_after,
                    };
                    false
                }
            }
        }
    }

    /// Ballistic muzzle point: pivot-to-barrel rotated by the aim angle,
    /// added to the gun's world position. Recoil is excluded here.
    pub fn muzzle_world(&self, gun_pos: Vec2) -> Vec2 {
        gun_pos + rotate_vec(self.kind.pivot_to_barrel(), -self.rotation)
    }

    /// Draw-transform rotation: aim plus the transient recoil kick
    pub fn visual_rotation(&self) -> f32 {
        self.rotation + consts::RECOIL_KICK * self.recoil.envelope()
    }

    /// Draw-transform muzzle point, pulled back along the barrel by recoil
    pub fn visual_muzzle_world(&self, gun_pos: Vec2) -> Vec2 {
        let barrel = self.kind.pivot_to_barrel()
            - Vec2::new(consts::RECOIL_OFFSET * self.recoil.envelope(), 0.0);
        gun_pos + rotate_vec(barrel, -self.visual_rotation())
    }

    /// Round-reset: full magazine, neutral transform, no pending state
    pub fn reset(&mut self) {
        self.quantity = self.kind.magazine_size();
        self.rotation = 0.0;
        self.interaction = Interaction::Idle;
        self.pending_fire = false;
        self.auto_reload_armed = false;
        self.recoil = Recoil::default();
    }
}
