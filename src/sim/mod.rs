//! Deterministic simulation core
//!
//! Everything that affects gameplay lives here and must replay identically
//! from a seed:
//! - One fixed timestep, integer tick counters
//! - A single world-owned RNG, no ambient entropy
//! - Slot-order iteration everywhere state mutates
//! - No rendering, no clocks, no platform calls

pub mod attribute;
pub mod bullet;
pub mod dart;
pub mod enemy;
pub mod entity;
pub mod gun;
pub mod inventory;
pub mod item;
pub mod pickups;
pub mod pipes;
pub mod player;
pub mod skimmer;
pub mod spawner;
pub mod state;
pub mod tick;

pub use attribute::AttributeBar;
pub use bullet::{Bullet, BulletId, BulletOwner, BulletPool, HitEntity};
pub use dart::{DartGroup, DartPhase, SkyDart};
pub use enemy::{EnemyBody, EnemyKind};
pub use entity::{Entity, Mask, collide};
pub use gun::{Gun, GunKind};
pub use inventory::{Inventory, SlotContent};
pub use item::{ItemCategory, ItemKind, UseEffect};
pub use pickups::{Pickup, PickupField};
pub use pipes::{PipeField, PipePair};
pub use player::{MovementMode, Player};
pub use skimmer::{CloudSkimmer, SkimmerGroup};
pub use spawner::{EnemyGroup, EnemyManager};
pub use state::{DeathCause, GameEvent, RoundPhase, World};
pub use tick::{TickInput, tick};
