//! World composition root: every subsystem plus the seeded RNG.
//!
//! Construction with the same seed and the same per-tick inputs replays the
//! same run bit for bit; all randomness flows through the one `Pcg32` owned
//! here, in a fixed draw order.

use log::info;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::BalanceConfig;
use crate::sim::bullet::{BulletOwner, BulletPool};
use crate::sim::enemy::EnemyKind;
use crate::sim::item::ItemKind;
use crate::sim::pickups::PickupField;
use crate::sim::pipes::PipeField;
use crate::sim::player::Player;
use crate::sim::spawner::EnemyManager;
use crate::sim::tick::{self, TickInput};

/// Where the round is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Pre-round: the bird bobs in place, the world is frozen
    Ready,
    /// Live: scrolling, combat, scoring
    Playing,
    /// Post-death: the body falls, nothing else moves
    Over,
}

/// What ended the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Pipe,
    Ground,
    OutOfHealth,
}

/// Everything observable that happened in one tick, in the order it
/// happened. Returned by value so callers can drive sound, UI, or reward
/// shaping without diffing state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    RoundStarted { round: u32 },
    Flapped,
    Scored { total: u32 },
    PickupCollected { kind: ItemKind },
    GunFired { by: BulletOwner },
    ReloadStarted,
    BulletBounced,
    EnemyHit { damage: f32 },
    EnemyKilled { kind: EnemyKind },
    GroupCleared { kind: EnemyKind },
    PlayerHit { damage: f32 },
    PlayerDied { cause: DeathCause },
}

/// Complete simulation state.
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    /// The one RNG; draw order is part of the determinism contract
    pub(crate) rng: Pcg32,
    /// Simulation tick counter, survives round resets
    pub time_ticks: u64,
    /// 1-based round counter
    pub round: u32,
    /// Pipes crossed this round
    pub score: u32,
    /// Current phase
    pub phase: RoundPhase,
    /// The bird, its bars, its inventory
    pub player: Player,
    /// Recycled pipe obstacles
    pub pipes: PipeField,
    /// Floating items and their spawn clock
    pub pickups: PickupField,
    /// Live bullets from every shooter
    pub bullets: BulletPool,
    /// Enemy group lifecycle
    pub enemies: EnemyManager,
    pub(crate) config: BalanceConfig,
    pub(crate) train_hook: Option<fn(&mut Player)>,
}

impl World {
    /// New world on default balance
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, BalanceConfig::default())
    }

    /// New world with explicit balance knobs
    pub fn with_config(seed: u64, config: BalanceConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let pipes = PipeField::new(&mut rng);
        let pickups = PickupField::new(&mut rng, config.item_cooldown);
        let enemies = EnemyManager::new(&mut rng, config.enemy_cooldown);
        info!("world seeded: {seed}");
        Self {
            seed,
            rng,
            time_ticks: 0,
            round: 1,
            score: 0,
            phase: RoundPhase::Ready,
            player: Player::new(),
            pipes,
            pickups,
            bullets: BulletPool::new(),
            enemies,
            config,
            train_hook: None,
        }
    }

    pub fn config(&self) -> &BalanceConfig {
        &self.config
    }

    /// Advance one fixed step. Input intents are one-shot: the caller clears
    /// them after each call and re-raises as needed.
    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        tick::tick(self, input)
    }

    /// Start the next round. Bars, position, and inventory reset in place;
    /// pipes are re-seeded; bullets, pickups, and enemies are cleared. The
    /// tick counter and RNG stream continue so rounds within a run stay on
    /// one deterministic timeline.
    pub fn reset(&mut self) {
        self.round += 1;
        self.score = 0;
        self.phase = RoundPhase::Ready;
        self.player.reset();
        self.pipes = PipeField::new(&mut self.rng);
        self.pickups.reset(&mut self.rng, self.config.item_cooldown);
        self.bullets.clear();
        self.enemies.reset(&mut self.rng, self.config.enemy_cooldown);
        info!("round {} ready", self.round);
    }

    /// Install the external per-tick hook that owns the player transform
    /// while the movement mode is `Train`.
    pub fn set_train_hook(&mut self, hook: fn(&mut Player)) {
        self.train_hook = Some(hook);
    }

    pub fn clear_train_hook(&mut self) {
        self.train_hook = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts;
    use crate::sim::player::MovementMode;

    #[test]
    fn test_new_world_is_ready_and_seeded() {
        let world = World::new(7);
        assert_eq!(world.phase, RoundPhase::Ready);
        assert_eq!(world.round, 1);
        assert_eq!(world.score, 0);
        assert_eq!(world.time_ticks, 0);
        assert_eq!(world.pipes.pairs().len(), consts::PIPE_PAIRS);
        assert!(world.bullets.is_empty());
        assert!(world.enemies.group().is_none());
    }

    #[test]
    fn test_same_seed_same_initial_layout() {
        let a = World::new(99);
        let b = World::new(99);
        for (pa, pb) in a.pipes.pairs().iter().zip(b.pipes.pairs()) {
            assert_eq!(pa.x(), pb.x());
            assert_eq!(pa.gap_top(), pb.gap_top());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = World::new(1);
        let b = World::new(2);
        let gaps_a: Vec<f32> = a.pipes.pairs().iter().map(|p| p.gap_top()).collect();
        let gaps_b: Vec<f32> = b.pipes.pairs().iter().map(|p| p.gap_top()).collect();
        assert_ne!(gaps_a, gaps_b);
    }

    #[test]
    fn test_reset_advances_round_and_clears() {
        let mut world = World::new(5);
        world.tick(&TickInput {
            flap: true,
            ..TickInput::default()
        });
        for _ in 0..120 {
            world.tick(&TickInput::default());
        }
        let ticks_before = world.time_ticks;
        world.reset();
        assert_eq!(world.round, 2);
        assert_eq!(world.score, 0);
        assert_eq!(world.phase, RoundPhase::Ready);
        assert_eq!(world.player.mode(), MovementMode::Shm);
        assert!(world.bullets.is_empty());
        assert!(world.enemies.group().is_none());
        assert!(world.pickups.pickups().is_empty());
        // The timeline continues
        assert_eq!(world.time_ticks, ticks_before);
        world.tick(&TickInput::default());
        assert_eq!(world.time_ticks, ticks_before + 1);
    }

    #[test]
    fn test_train_hook_owns_the_transform() {
        fn nudge(player: &mut Player) {
            player.entity.pos.y += 2.0;
        }
        let mut world = World::new(3);
        world.tick(&TickInput {
            flap: true,
            ..TickInput::default()
        });
        world.set_train_hook(nudge);
        world.player.set_mode(MovementMode::Train);
        let y = world.player.entity.pos.y;
        world.tick(&TickInput::default());
        assert_eq!(world.player.entity.pos.y, y + 2.0);
        world.clear_train_hook();
        world.tick(&TickInput::default());
        assert_eq!(world.player.entity.pos.y, y + 2.0);
    }
}
