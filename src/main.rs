//! Birdstrike entry point
//!
//! Headless autopilot session: a scripted pilot flies seeded rounds, paced
//! by the fixed-timestep accumulator, and the run tally prints at the end.
//! Doubles as a balance smoke check and as a wiring example for hosts
//! embedding the simulation.
//!
//! Usage: `birdstrike [seed] [ticks]`

use std::thread;
use std::time::{Duration, Instant};

use birdstrike::consts::{GROUND_Y, MAX_SUBSTEPS, SIM_DT};
use birdstrike::normalize_angle;
use birdstrike::sim::gun::aim_angle;
use birdstrike::sim::{
    BulletOwner, DeathCause, GameEvent, ItemCategory, RoundPhase, TickInput, World,
};

/// One decision per tick, from observable state only.
fn pilot(world: &World) -> TickInput {
    let mut input = TickInput::default();
    match world.phase {
        RoundPhase::Ready => {
            input.flap = true;
            return input;
        }
        RoundPhase::Over => return input,
        RoundPhase::Playing => {}
    }

    let player = &world.player;
    let center = player.entity.center();

    // Chase the next gap; hold mid-screen when no pipe is near
    let target_y = world
        .pipes
        .pairs()
        .iter()
        .find(|p| p.right() >= player.entity.left())
        .map(|p| p.gap_center().y)
        .unwrap_or(GROUND_Y / 2.0);
    input.flap = center.y > target_y;

    // Track the nearest live enemy and keep the trigger held
    if let Some(gun) = player.inventory.gun() {
        let targets = world.enemies.live_targets();
        let nearest = targets.iter().min_by(|(_, a), (_, b)| {
            let da = (a.center() - center).length_squared();
            let db = (b.center() - center).length_squared();
            da.total_cmp(&db)
        });
        if let Some((_, entity)) = nearest {
            let desired = aim_angle(player.gun_anchor(), entity.center());
            let delta = normalize_angle(desired - gun.rotation());
            input.rotate_gun = delta.clamp(-0.2, 0.2);
            input.fire = true;
        }
        if gun.quantity() == 0 {
            input.reload = true;
        }
    }

    // Consumables when the matching bar runs low; empty slots refuse quietly
    if player.hp().fraction() < 0.5 {
        input.use_slot = Some(ItemCategory::Heal.slot_index());
    } else if player.shield().is_empty() {
        input.use_slot = Some(ItemCategory::Potion.slot_index());
    } else if player.food().fraction() < 0.3 {
        input.use_slot = Some(ItemCategory::Food.slot_index());
    }

    input
}

#[derive(Default)]
struct Tally {
    rounds: u32,
    best_score: u32,
    shots: u32,
    bounces: u32,
    pickups: u32,
    kills: u32,
    groups: u32,
    deaths_pipe: u32,
    deaths_ground: u32,
    deaths_health: u32,
}

impl Tally {
    fn record(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::RoundStarted { .. } => self.rounds += 1,
                GameEvent::Scored { total } => self.best_score = self.best_score.max(*total),
                GameEvent::GunFired {
                    by: BulletOwner::Player,
                } => self.shots += 1,
                GameEvent::BulletBounced => self.bounces += 1,
                GameEvent::PickupCollected { .. } => self.pickups += 1,
                GameEvent::EnemyKilled { .. } => self.kills += 1,
                GameEvent::GroupCleared { .. } => self.groups += 1,
                GameEvent::PlayerDied { cause } => match cause {
                    DeathCause::Pipe => self.deaths_pipe += 1,
                    DeathCause::Ground => self.deaths_ground += 1,
                    DeathCause::OutOfHealth => self.deaths_health += 1,
                },
                _ => {}
            }
        }
    }
}

/// One demo run: the world plus the pacing state wrapped around it.
struct Session {
    world: World,
    tally: Tally,
    accumulator: f32,
    crash_timer: u32,
    ticked: u64,
}

impl Session {
    fn new(seed: u64) -> Self {
        Self {
            world: World::new(seed),
            tally: Tally::default(),
            // The first frame runs one tick straight away
            accumulator: SIM_DT,
            crash_timer: 0,
            ticked: 0,
        }
    }

    /// Drain the whole sim steps the elapsed time has paid for. Stalls clamp
    /// to a quarter second and at most `MAX_SUBSTEPS` steps run per call;
    /// leftover time stays in the accumulator for the next frame.
    fn update(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.min(0.25);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = pilot(&self.world);
            let events = self.world.tick(&input);
            self.tally.record(&events);
            self.accumulator -= SIM_DT;
            substeps += 1;
            self.ticked += 1;

            // Let the body hit the floor before the next round
            if self.world.phase == RoundPhase::Over {
                self.crash_timer += 1;
                if self.crash_timer >= 45 {
                    self.crash_timer = 0;
                    self.world.reset();
                }
            }
        }
        substeps
    }
}

fn default_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0x5eed)
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(default_seed);
    let ticks: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(2700);
    log::info!("autopilot starting: seed {seed}, tick budget {ticks}");

    let mut session = Session::new(seed);
    let mut last = Instant::now();
    while session.ticked < ticks {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;
        session.update(dt);
        thread::sleep(Duration::from_secs_f32(SIM_DT));
    }

    let tally = &session.tally;
    println!(
        "--- autopilot summary (seed {seed}, {} ticks) ---",
        session.ticked
    );
    println!("rounds started:  {}", tally.rounds);
    println!("best score:      {}", tally.best_score);
    println!("shots fired:     {}", tally.shots);
    println!("bullets bounced: {}", tally.bounces);
    println!("pickups taken:   {}", tally.pickups);
    println!("enemies killed:  {}", tally.kills);
    println!("groups cleared:  {}", tally.groups);
    println!(
        "deaths:          {} pipe, {} ground, {} health",
        tally.deaths_pipe, tally.deaths_ground, tally.deaths_health
    );
}
