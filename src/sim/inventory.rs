//! Six fixed typed slots: weapon, ammo, food, potion, heal, special.
//!
//! Slot 0 holds a gun or nothing, slot 1 the reserve ammunition for that
//! gun, slots 2-5 hold consumable stacks. Bullets already in flight belong
//! to the world's bullet pool, so weapon swaps never orphan them.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::sim::gun::{Gun, ShotSpawn};
use crate::sim::item::{ItemCategory, ItemKind, UseEffect};
use glam::Vec2;

/// Contents of one slot. `Empty` is the per-category sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotContent {
    Empty,
    Gun(Gun),
    Ammo { quantity: u32 },
    Stack { kind: ItemKind, quantity: u32 },
}

impl SlotContent {
    pub fn is_empty(&self) -> bool {
        matches!(self, SlotContent::Empty)
    }

    fn category(&self) -> Option<ItemCategory> {
        match self {
            SlotContent::Empty => None,
            SlotContent::Gun(_) => Some(ItemCategory::Weapon),
            SlotContent::Ammo { .. } => Some(ItemCategory::Ammo),
            SlotContent::Stack { kind, .. } => Some(kind.category()),
        }
    }
}

/// Result of the per-tick gun maintenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GunTick {
    pub reload_completed: bool,
    pub auto_reload_started: bool,
}

/// Reserve conversion on weapon swap: reserve is measured in pickup batches
/// of the old gun and re-priced in magazines of the new one.
fn convert_reserve(old_reserve: u32, old_batch: u32, new_magazine: u32) -> u32 {
    if old_reserve == 0 || old_batch == 0 {
        return 0;
    }
    (old_reserve as f32 / old_batch as f32 * new_magazine as f32).ceil() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    slots: [SlotContent; ItemCategory::COUNT],
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            slots: [
                SlotContent::Empty,
                SlotContent::Empty,
                SlotContent::Empty,
                SlotContent::Empty,
                SlotContent::Empty,
                SlotContent::Empty,
            ],
        }
    }

    pub fn slot(&self, index: usize) -> Option<&SlotContent> {
        self.slots.get(index)
    }

    pub fn gun(&self) -> Option<&Gun> {
        match &self.slots[0] {
            SlotContent::Gun(gun) => Some(gun),
            _ => None,
        }
    }

    pub fn gun_mut(&mut self) -> Option<&mut Gun> {
        match &mut self.slots[0] {
            SlotContent::Gun(gun) => Some(gun),
            _ => None,
        }
    }

    pub fn reserve_ammo(&self) -> u32 {
        match &self.slots[1] {
            SlotContent::Ammo { quantity } => *quantity,
            _ => 0,
        }
    }

    fn set_reserve(&mut self, quantity: u32) {
        self.slots[1] = if quantity == 0 {
            SlotContent::Empty
        } else {
            SlotContent::Ammo { quantity }
        };
        self.debug_check();
    }

    /// Take a pickup into the matching slot. Returns false when the item
    /// cannot be accepted (ammo without a gun), in which case the pickup
    /// stays in the world.
    pub fn acquire(&mut self, kind: ItemKind) -> bool {
        let accepted = match kind.category() {
            ItemCategory::Weapon => {
                // Exhaustive by construction: every weapon kind maps to a gun
                let Some(gun_kind) = kind.gun_kind() else {
                    debug_assert!(false, "weapon kind without gun mapping");
                    return false;
                };
                if let SlotContent::Gun(old) = &self.slots[0] {
                    let converted = convert_reserve(
                        self.reserve_ammo(),
                        old.kind().ammo_batch(),
                        gun_kind.magazine_size(),
                    );
                    debug!(
                        "weapon swap {} -> {}: reserve {} -> {}",
                        old.kind().name(),
                        gun_kind.name(),
                        self.reserve_ammo(),
                        converted
                    );
                    self.set_reserve(converted);
                }
                self.slots[0] = SlotContent::Gun(Gun::new(gun_kind));
                true
            }
            ItemCategory::Ammo => match self.gun() {
                Some(gun) => {
                    let batch = gun.kind().ammo_batch();
                    self.set_reserve(self.reserve_ammo() + batch);
                    true
                }
                None => false,
            },
            cat @ (ItemCategory::Food
            | ItemCategory::Potion
            | ItemCategory::Heal
            | ItemCategory::Special) => {
                let index = cat.slot_index();
                let batch = kind.spawn_batch();
                match &mut self.slots[index] {
                    SlotContent::Stack { kind: held, quantity } if *held == kind => {
                        *quantity += batch;
                    }
                    slot => {
                        *slot = SlotContent::Stack {
                            kind,
                            quantity: batch,
                        };
                    }
                }
                true
            }
        };
        self.debug_check();
        accepted
    }

    /// Slot-0 action: latch a fire intent on the held gun
    pub fn queue_fire(&mut self) -> bool {
        match self.gun_mut() {
            Some(gun) => {
                gun.queue_fire();
                true
            }
            None => false,
        }
    }

    /// Slot-1 action: start reloading from reserve. Guarded no-op when there
    /// is no gun, the magazine is full, reserve is empty, or a cooldown runs.
    pub fn start_reload(&mut self) -> bool {
        let reserve = self.reserve_ammo();
        let Some(gun) = self.gun_mut() else {
            return false;
        };
        match gun.start_reload(reserve) {
            Some(taken) => {
                self.set_reserve(reserve - taken);
                true
            }
            None => false,
        }
    }

    /// Consume the latched fire intent against the holder's updated
    /// transform; `gun_pos` is the gun pivot in world space.
    pub fn resolve_pending_fire(&mut self, gun_pos: Vec2) -> Option<ShotSpawn> {
        self.gun_mut()?.resolve_pending_fire(gun_pos)
    }

    /// Per-tick cooldown bookkeeping plus the internal auto-reload.
    pub fn tick_gun(&mut self) -> GunTick {
        let mut result = GunTick::default();
        if let Some(gun) = self.gun_mut() {
            result.reload_completed = gun.update();
        }
        if self.gun().is_some_and(|g| g.wants_auto_reload()) && self.start_reload() {
            result.auto_reload_started = true;
        }
        result
    }

    /// What using a consumable slot would do. `None` for empty slots and
    /// for the weapon/ammo slots (those map to fire/reload).
    pub fn slot_effect(&self, index: usize) -> Option<UseEffect> {
        match self.slots.get(index)? {
            SlotContent::Stack { kind, .. } => kind.use_effect(),
            _ => None,
        }
    }

    /// Remove one unit from a consumable stack; the slot reverts to its
    /// empty sentinel at zero.
    pub fn consume_one(&mut self, index: usize) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        let SlotContent::Stack { quantity, .. } = slot else {
            return false;
        };
        *quantity = quantity.saturating_sub(1);
        if *quantity == 0 {
            *slot = SlotContent::Empty;
        }
        self.debug_check();
        true
    }

    /// Round reset: back to the unarmed starting state
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = SlotContent::Empty;
        }
    }

    /// Slot/category pairing is a structural invariant; a mismatch is a
    /// logic bug, not a runtime condition.
    fn debug_check(&self) {
        #[cfg(debug_assertions)]
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(cat) = slot.category() {
                debug_assert_eq!(
                    cat.slot_index(),
                    index,
                    "slot {index} holds {cat:?} content"
                );
            }
        }
        // Ammo with no gun can only arise from a logic bug
        debug_assert!(
            !(self.gun().is_none() && self.reserve_ammo() > 0),
            "reserve ammo without a gun"
        );
    }
}
