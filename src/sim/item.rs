//! Item taxonomy: everything lootable, as closed sum types.
//!
//! `ItemKind` is the full set of concrete pickups; `ItemCategory` is the
//! inventory slot taxonomy. Construction from config names goes through
//! `ItemKind::from_name`, which refuses unknown names instead of falling
//! through to a default.

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::sim::gun::GunKind;

/// Inventory slot categories, in slot order 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Weapon,
    Ammo,
    Food,
    Potion,
    Heal,
    Special,
}

impl ItemCategory {
    pub const COUNT: usize = 6;

    #[inline]
    pub fn slot_index(self) -> usize {
        match self {
            ItemCategory::Weapon => 0,
            ItemCategory::Ammo => 1,
            ItemCategory::Food => 2,
            ItemCategory::Potion => 3,
            ItemCategory::Heal => 4,
            ItemCategory::Special => 5,
        }
    }

    pub fn from_slot_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ItemCategory::Weapon),
            1 => Some(ItemCategory::Ammo),
            2 => Some(ItemCategory::Food),
            3 => Some(ItemCategory::Potion),
            4 => Some(ItemCategory::Heal),
            5 => Some(ItemCategory::Special),
            _ => None,
        }
    }
}

/// Concrete item kinds. Closed set: adding a kind means updating every
/// match below, which is the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Deagle,
    Ak47,
    Uzi,
    AmmoBox,
    Apple,
    ShieldPotion,
    Medkit,
    Totem,
}

/// Applying one unit of a consumable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UseEffect {
    RestoreFood(f32),
    RestoreShield(f32),
    RestoreHp(f32),
    GrantInvincibility(u32),
}

impl ItemKind {
    pub const ALL: [ItemKind; 8] = [
        ItemKind::Deagle,
        ItemKind::Ak47,
        ItemKind::Uzi,
        ItemKind::AmmoBox,
        ItemKind::Apple,
        ItemKind::ShieldPotion,
        ItemKind::Medkit,
        ItemKind::Totem,
    ];

    /// Factory from a config-file name. Unknown names return `None`; the
    /// config layer turns that into a fatal error rather than substituting.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "deagle" => Some(ItemKind::Deagle),
            "ak47" => Some(ItemKind::Ak47),
            "uzi" => Some(ItemKind::Uzi),
            "ammo_box" => Some(ItemKind::AmmoBox),
            "apple" => Some(ItemKind::Apple),
            "shield_potion" => Some(ItemKind::ShieldPotion),
            "medkit" => Some(ItemKind::Medkit),
            "totem" => Some(ItemKind::Totem),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ItemKind::Deagle => "deagle",
            ItemKind::Ak47 => "ak47",
            ItemKind::Uzi => "uzi",
            ItemKind::AmmoBox => "ammo_box",
            ItemKind::Apple => "apple",
            ItemKind::ShieldPotion => "shield_potion",
            ItemKind::Medkit => "medkit",
            ItemKind::Totem => "totem",
        }
    }

    pub fn category(self) -> ItemCategory {
        match self {
            ItemKind::Deagle | ItemKind::Ak47 | ItemKind::Uzi => ItemCategory::Weapon,
            ItemKind::AmmoBox => ItemCategory::Ammo,
            ItemKind::Apple => ItemCategory::Food,
            ItemKind::ShieldPotion => ItemCategory::Potion,
            ItemKind::Medkit => ItemCategory::Heal,
            ItemKind::Totem => ItemCategory::Special,
        }
    }

    /// Units granted per pickup. Ammo boxes defer to the held gun's batch.
    pub fn spawn_batch(self) -> u32 {
        match self {
            ItemKind::Deagle | ItemKind::Ak47 | ItemKind::Uzi => 1,
            ItemKind::AmmoBox => 0,
            ItemKind::Apple => 2,
            ItemKind::ShieldPotion => 1,
            ItemKind::Medkit => 1,
            ItemKind::Totem => 1,
        }
    }

    pub fn gun_kind(self) -> Option<GunKind> {
        match self {
            ItemKind::Deagle => Some(GunKind::Deagle),
            ItemKind::Ak47 => Some(GunKind::Ak47),
            ItemKind::Uzi => Some(GunKind::Uzi),
            _ => None,
        }
    }

    /// Consumable effect; weapons and ammo map to fire/reload instead.
    pub fn use_effect(self) -> Option<UseEffect> {
        match self {
            ItemKind::Apple => Some(UseEffect::RestoreFood(30.0)),
            ItemKind::ShieldPotion => Some(UseEffect::RestoreShield(50.0)),
            ItemKind::Medkit => Some(UseEffect::RestoreHp(40.0)),
            ItemKind::Totem => Some(UseEffect::GrantInvincibility(
                consts::TOTEM_INVINCIBILITY_TICKS,
            )),
            ItemKind::Deagle | ItemKind::Ak47 | ItemKind::Uzi | ItemKind::AmmoBox => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for kind in ItemKind::ALL {
            assert_eq!(ItemKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert_eq!(ItemKind::from_name("bazooka"), None);
        assert_eq!(ItemKind::from_name(""), None);
        assert_eq!(ItemKind::from_name("Deagle"), None); // names are lowercase
    }

    #[test]
    fn test_slot_index_round_trip() {
        for i in 0..ItemCategory::COUNT {
            let cat = ItemCategory::from_slot_index(i).unwrap();
            assert_eq!(cat.slot_index(), i);
        }
        assert_eq!(ItemCategory::from_slot_index(6), None);
    }

    #[test]
    fn test_weapons_have_gun_kinds() {
        for kind in ItemKind::ALL {
            assert_eq!(
                kind.gun_kind().is_some(),
                kind.category() == ItemCategory::Weapon
            );
        }
    }

    #[test]
    fn test_consumables_have_effects() {
        for kind in ItemKind::ALL {
            let consumable = !matches!(
                kind.category(),
                ItemCategory::Weapon | ItemCategory::Ammo
            );
            assert_eq!(kind.use_effect().is_some(), consumable);
        }
    }
}
