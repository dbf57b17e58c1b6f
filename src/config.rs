//! Data-driven balance configuration.
//!
//! The sim ships usable defaults; hosts may override them with a JSON
//! document. Validation is strict: unknown item or gun names, empty weight
//! tables, and non-positive weights are construction errors, never silently
//! substituted.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::gun::GunKind;
use crate::sim::item::ItemKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown item kind `{name}`")]
    UnknownItem { name: String },
    #[error("unknown gun kind `{name}`")]
    UnknownGun { name: String },
    #[error("spawn weight table is empty")]
    EmptyWeightTable,
    #[error("non-positive weight {weight} for `{name}`")]
    NonPositiveWeight { name: String, weight: f32 },
    #[error("invalid tuning: {what}")]
    BadTuning { what: String },
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// Weighted item table, sampled by cumulative-distribution walk.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnWeights {
    entries: Vec<(ItemKind, f32)>,
    total: f32,
}

impl SpawnWeights {
    pub fn new(entries: Vec<(ItemKind, f32)>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyWeightTable);
        }
        for (kind, weight) in &entries {
            if !(*weight > 0.0) {
                return Err(ConfigError::NonPositiveWeight {
                    name: kind.name().to_string(),
                    weight: *weight,
                });
            }
        }
        let total = entries.iter().map(|(_, w)| w).sum();
        Ok(Self { entries, total })
    }

    pub fn entries(&self) -> &[(ItemKind, f32)] {
        &self.entries
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    /// Draw `u ∈ [0, total)` and walk the cumulative weights until exceeded.
    pub fn sample(&self, rng: &mut Pcg32) -> ItemKind {
        let u = rng.random_range(0.0..self.total);
        let mut cumulative = 0.0;
        for (kind, weight) in &self.entries {
            cumulative += weight;
            if u < cumulative {
                return *kind;
            }
        }
        // Rounding can leave u a hair past the final cumulative sum
        self.entries[self.entries.len() - 1].0
    }
}

impl Default for SpawnWeights {
    fn default() -> Self {
        // The ammo-heavy table; weights are relative, not percentages
        let entries = vec![
            (ItemKind::Deagle, 6.0),
            (ItemKind::Ak47, 4.0),
            (ItemKind::Uzi, 5.0),
            (ItemKind::AmmoBox, 26.0),
            (ItemKind::Apple, 20.0),
            (ItemKind::ShieldPotion, 12.0),
            (ItemKind::Medkit, 14.0),
            (ItemKind::Totem, 3.0),
        ];
        let total = entries.iter().map(|(_, w)| w).sum();
        Self { entries, total }
    }
}

/// Validated balance knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceConfig {
    pub spawn_weights: SpawnWeights,
    /// What CloudSkimmers carry
    pub skimmer_gun: GunKind,
    /// Pickup spawn cooldown window in ticks (inclusive)
    pub item_cooldown: (u32, u32),
    /// Enemy group spawn cooldown window in ticks (inclusive)
    pub enemy_cooldown: (u32, u32),
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            spawn_weights: SpawnWeights::default(),
            skimmer_gun: GunKind::Deagle,
            item_cooldown: (crate::consts::ITEM_CD_MIN, crate::consts::ITEM_CD_MAX),
            enemy_cooldown: (crate::consts::ENEMY_CD_MIN, crate::consts::ENEMY_CD_MAX),
        }
    }
}

/// On-disk form. Names are validated through the kind factories on load.
#[derive(Debug, Serialize, Deserialize)]
struct RawConfig {
    spawn_weights: Vec<RawWeight>,
    skimmer_gun: String,
    item_cooldown: [u32; 2],
    enemy_cooldown: [u32; 2],
}

#[derive(Debug, Serialize, Deserialize)]
struct RawWeight {
    item: String,
    weight: f32,
}

impl BalanceConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        let raw = RawConfig {
            spawn_weights: self
                .spawn_weights
                .entries()
                .iter()
                .map(|(kind, weight)| RawWeight {
                    item: kind.name().to_string(),
                    weight: *weight,
                })
                .collect(),
            skimmer_gun: self.skimmer_gun.name().to_string(),
            item_cooldown: [self.item_cooldown.0, self.item_cooldown.1],
            enemy_cooldown: [self.enemy_cooldown.0, self.enemy_cooldown.1],
        };
        Ok(serde_json::to_string_pretty(&raw)?)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let entries = raw
            .spawn_weights
            .into_iter()
            .map(|rw| {
                let kind = ItemKind::from_name(&rw.item).ok_or(ConfigError::UnknownItem {
                    name: rw.item.clone(),
                })?;
                Ok((kind, rw.weight))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let spawn_weights = SpawnWeights::new(entries)?;

        let skimmer_gun =
            GunKind::from_name(&raw.skimmer_gun).ok_or(ConfigError::UnknownGun {
                name: raw.skimmer_gun.clone(),
            })?;

        let item_cooldown = window(raw.item_cooldown, "item_cooldown")?;
        let enemy_cooldown = window(raw.enemy_cooldown, "enemy_cooldown")?;

        Ok(Self {
            spawn_weights,
            skimmer_gun,
            item_cooldown,
            enemy_cooldown,
        })
    }
}

fn window(bounds: [u32; 2], what: &str) -> Result<(u32, u32), ConfigError> {
    let [min, max] = bounds;
    if min == 0 || min > max {
        return Err(ConfigError::BadTuning {
            what: format!("{what} window [{min}, {max}]"),
        });
    }
    Ok((min, max))
}
