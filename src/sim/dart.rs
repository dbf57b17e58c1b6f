//! SkyDarts: diving strikers.
//!
//! A dart crosses the screen fast, brakes to a per-instance holding column,
//! then waits for its group's launch cadence. A launched dive is a two-leg
//! cubic Bézier: holding point to the player's launch-time position (with
//! jitter), then onward to an off-screen exit. While diving it plays the
//! curve back by arc length and picks up speed like a falling body whenever
//! the local tangent points downhill.

use glam::Vec2;
use log::debug;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts;
use crate::sim::bullet::TargetId;
use crate::sim::enemy::{Enemy, EnemyBody, EnemyKind, live_members};
use crate::sim::entity::{Entity, Mask, collide};

/// Where a dart is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DartPhase {
    /// Flying in from the right, braking toward the holding column
    Approach,
    /// Parked, waiting for the group to launch it
    Hold,
    /// Committed to the dive curve
    Dive,
}

const ARC_STEPS: u32 = 16;

/// One cubic Bézier leg with its arc length fixed at construction from a
/// 16-step polyline, so playback cost per tick is constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct FlightSegment {
    p0: Vec2,
    p1: Vec2,
    p2: Vec2,
    p3: Vec2,
    arc_length: f32,
}

impl FlightSegment {
    fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        let mut length = 0.0;
        let mut prev = p0;
        for i in 1..=ARC_STEPS {
            let t = i as f32 / ARC_STEPS as f32;
            let next = cubic_point(p0, p1, p2, p3, t);
            length += prev.distance(next);
            prev = next;
        }
        Self {
            p0,
            p1,
            p2,
            p3,
            arc_length: length.max(1.0),
        }
    }

    fn position(&self, t: f32) -> Vec2 {
        cubic_point(self.p0, self.p1, self.p2, self.p3, t)
    }

    fn tangent(&self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        let d = 3.0 * u * u * (self.p1 - self.p0)
            + 6.0 * u * t * (self.p2 - self.p1)
            + 3.0 * t * t * (self.p3 - self.p2);
        d.normalize_or_zero()
    }
}

fn cubic_point(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Dive geometry. The strike leg launches level and arrives moving along
/// the vertical offset, so the bow scales with the vertical gap and flips
/// when the target sits above the dart. The exit leg mirrors the arrival
/// tangent and levels off toward a waypoint far enough left that finishing
/// the curve guarantees the off-screen cull.
fn build_dive(start: Vec2, target: Vec2) -> Vec<FlightSegment> {
    let dy = target.y - start.y;
    let p1 = Vec2::new(start.x + (target.x - start.x) / 3.0, start.y);
    let p2 = target - Vec2::new(0.0, dy / 3.0);
    let strike = FlightSegment::new(start, p1, p2, target);

    let exit = Vec2::new(
        -(consts::PIPE_RECYCLE_MARGIN + consts::DART_W),
        (target.y + dy * 0.5).clamp(40.0, consts::GROUND_Y - 40.0),
    );
    let q1 = target + (target - p2);
    let q2 = Vec2::new(exit.x + (target.x - exit.x) / 3.0, exit.y);
    vec![strike, FlightSegment::new(target, q1, q2, exit)]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyDart {
    body: EnemyBody,
    phase: DartPhase,
    stop_x: f32,
    vel: Vec2,
    rotation: f32,
    speed: f32,
    target_is_above: bool,
    segments: Vec<FlightSegment>,
    segment_index: usize,
    t: f32,
    has_hit: bool,
}

impl Enemy for SkyDart {
    fn body(&self) -> &EnemyBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut EnemyBody {
        &mut self.body
    }
}

impl SkyDart {
    fn new(pos: Vec2, stop_x: f32) -> Self {
        let size = Vec2::new(consts::DART_W, consts::DART_H);
        let mask = Mask::ellipse(size.x as u32, size.y as u32);
        Self {
            body: EnemyBody::new(
                Entity::with_mask(pos, size, mask),
                EnemyKind::SkyDart.member_hp(),
            ),
            phase: DartPhase::Approach,
            stop_x,
            vel: Vec2::new(consts::DART_VEL_X, 0.0),
            rotation: std::f32::consts::PI,
            speed: 0.0,
            target_is_above: false,
            segments: Vec::new(),
            segment_index: 0,
            t: 0.0,
            has_hit: false,
        }
    }

    #[inline]
    pub fn phase(&self) -> DartPhase {
        self.phase
    }

    /// Facing angle, same convention as gun aim (positive = up)
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[inline]
    pub fn vel(&self) -> Vec2 {
        self.vel
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn has_hit(&self) -> bool {
        self.has_hit
    }

    /// Commit to a dive at `target` (the player's position at launch time,
    /// pre-jittered by the group).
    fn launch(&mut self, target: Vec2) {
        let start = self.body.entity.center();
        self.target_is_above = target.y < start.y;
        self.segments = build_dive(start, target);
        self.segment_index = 0;
        self.t = 0.0;
        self.speed = consts::DART_DIVE_SPEED;
        self.phase = DartPhase::Dive;
    }

    fn advance(&mut self) {
        match self.phase {
            DartPhase::Approach => {
                let remaining = (self.body.entity.pos.x - self.stop_x).max(0.0);
                if remaining <= 1.5 {
                    self.body.entity.pos.x = self.stop_x;
                    self.vel = Vec2::ZERO;
                    self.phase = DartPhase::Hold;
                } else {
                    // Full speed until the brake window, then scaled by the
                    // remaining-distance ratio
                    let scale = (remaining / consts::DART_BRAKE_DIST).min(1.0);
                    let step = consts::DART_VEL_X * scale;
                    self.body.entity.pos.x += step;
                    self.vel = Vec2::new(step, 0.0);
                }
            }
            DartPhase::Hold => {}
            DartPhase::Dive => self.advance_dive(),
        }
        self.cull_offscreen();
    }

    fn advance_dive(&mut self) {
        let Some(seg) = self.segments.get(self.segment_index) else {
            return;
        };
        let tangent = seg.tangent(self.t.min(1.0));
        self.t += self.speed / seg.arc_length;
        // Pseudo-gravity: strong when the path points downhill, a weak
        // constant when the whole dive climbs to a target overhead
        self.speed += if self.target_is_above {
            consts::DART_GRAV_WEAK
        } else {
            consts::DART_GRAV * tangent.y.max(0.0)
        };
        let before = self.body.entity.center();
        let center = seg.position(self.t.min(1.0));
        self.vel = center - before;
        if self.vel.length_squared() > 1e-6 {
            self.rotation = (-self.vel.y).atan2(self.vel.x);
        }
        self.body.entity.pos = center - self.body.entity.size * 0.5;
        if self.t >= 1.0 {
            self.segment_index += 1;
            self.t = 0.0;
        }
    }

    /// Dive contact check; the hit latches so one dive lands at most one
    /// strike no matter how many ticks the shapes stay overlapped.
    fn strike(&mut self, player: &Entity) -> Option<f32> {
        if self.has_hit || self.phase != DartPhase::Dive || self.is_gone() {
            return None;
        }
        if collide(&self.body.entity, player) {
            self.has_hit = true;
            return Some(consts::DART_DAMAGE);
        }
        None
    }
}

/// Three darts entering staggered, launched one at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartGroup {
    group_id: u32,
    members: Vec<SkyDart>,
    launch_timer: u32,
}

impl DartGroup {
    pub fn spawn(rng: &mut Pcg32, group_id: u32) -> Self {
        let mut members = Vec::with_capacity(consts::ENEMY_GROUP_SIZE);
        for i in 0..consts::ENEMY_GROUP_SIZE {
            let x = consts::DART_SPAWN_X + i as f32 * consts::DART_SPAWN_STAGGER;
            let y = consts::DART_SPAWN_Y_BASE
                + i as f32 * consts::DART_SPAWN_Y_STEP
                + rng.random_range(0.0..consts::DART_SPAWN_Y_SPAN);
            let stop_x = rng.random_range(consts::DART_STOP_X_MIN..=consts::DART_STOP_X_MAX);
            members.push(SkyDart::new(Vec2::new(x, y), stop_x));
        }
        Self {
            group_id,
            members,
            launch_timer: consts::DART_LAUNCH_GAP,
        }
    }

    #[inline]
    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    pub fn members(&self) -> &[SkyDart] {
        &self.members
    }

    pub fn is_cleared(&self) -> bool {
        self.members.iter().all(|m| m.is_gone())
    }

    /// Launch cadence against the start-of-tick player position. When the
    /// gap elapses before anyone is parked, the next dart to reach its
    /// column goes immediately.
    pub fn decide(&mut self, rng: &mut Pcg32, player_center: Vec2) {
        self.launch_timer = self.launch_timer.saturating_sub(1);
        if self.launch_timer > 0 {
            return;
        }
        let Some(next) = self
            .members
            .iter_mut()
            .find(|m| !m.is_gone() && m.phase() == DartPhase::Hold)
        else {
            return;
        };
        let jitter = Vec2::new(
            rng.random_range(-consts::DART_TARGET_JITTER..=consts::DART_TARGET_JITTER),
            rng.random_range(-consts::DART_TARGET_JITTER..=consts::DART_TARGET_JITTER),
        );
        next.launch(player_center + jitter);
        debug!("dart dive launched toward ({:.0}, {:.0})", player_center.x, player_center.y);
        self.launch_timer = consts::DART_LAUNCH_GAP;
    }

    pub fn advance(&mut self) {
        for member in self.members.iter_mut().filter(|m| !m.is_gone()) {
            member.advance();
        }
    }

    pub fn live_targets(&self) -> Vec<(TargetId, &Entity)> {
        let group = self.group_id;
        live_members(&self.members)
            .map(|(i, m)| (TargetId::Enemy { group, member: i }, &m.body().entity))
            .collect()
    }

    /// Returns true when the hit was a kill
    pub fn apply_damage(&mut self, member: u32, damage: f32) -> bool {
        self.members
            .get_mut(member as usize)
            .is_some_and(|m| m.take_damage(damage))
    }

    pub fn right_extent(&self) -> Option<f32> {
        live_members(&self.members)
            .map(|(_, m)| m.body().entity.right())
            .fold(None, |acc, r| Some(acc.map_or(r, |a: f32| a.max(r))))
    }

    /// Resolve dive contacts against the player; each dart lands at most
    /// one. Returns the damage amounts that connected this tick.
    pub fn strikes(&mut self, player: &Entity) -> Vec<f32> {
        self.members
            .iter_mut()
            .filter(|m| !m.is_gone())
            .filter_map(|m| m.strike(player))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn parked_dart(stop_x: f32) -> SkyDart {
        let mut dart = SkyDart::new(Vec2::new(consts::DART_SPAWN_X, 200.0), stop_x);
        for _ in 0..2000 {
            dart.advance();
            if dart.phase() == DartPhase::Hold {
                break;
            }
        }
        assert_eq!(dart.phase(), DartPhase::Hold);
        dart
    }

    #[test]
    fn test_approach_brakes_into_holding_column() {
        let mut dart = SkyDart::new(Vec2::new(consts::DART_SPAWN_X, 200.0), 700.0);
        let mut slowed = false;
        let mut last_x = dart.body().entity.pos.x;
        for _ in 0..2000 {
            dart.advance();
            let x = dart.body().entity.pos.x;
            let step = last_x - x;
            let remaining = x - 700.0;
            if remaining < consts::DART_BRAKE_DIST && remaining > 10.0 {
                assert!(step < -consts::DART_VEL_X, "no braking inside the window");
                slowed = true;
            }
            last_x = x;
            if dart.phase() == DartPhase::Hold {
                break;
            }
        }
        assert!(slowed);
        assert_eq!(dart.phase(), DartPhase::Hold);
        assert_relative_eq!(dart.body().entity.pos.x, 700.0);
        // Parked darts stay parked
        dart.advance();
        assert_relative_eq!(dart.body().entity.pos.x, 700.0);
    }

    #[test]
    fn test_dive_below_is_a_downward_curve() {
        let mut dart = parked_dart(800.0);
        let start = dart.body().entity.center();
        let target = Vec2::new(consts::BIRD_X, start.y + 250.0);
        dart.launch(target);
        assert!(!dart.target_is_above);
        let mut last_y = dart.body().entity.center().y;
        while dart.segment_index == 0 && dart.phase() == DartPhase::Dive {
            dart.advance();
            let y = dart.body().entity.center().y;
            assert!(y >= last_y - 1e-3, "strike leg must never climb");
            last_y = y;
        }
        // Arrived at the jinked target before heading for the exit
        assert_relative_eq!(last_y, target.y, epsilon = 1.0);
    }

    #[test]
    fn test_dive_above_reverses_curvature_and_uses_weak_gravity() {
        let mut dart = parked_dart(800.0);
        let start = dart.body().entity.center();
        dart.launch(Vec2::new(consts::BIRD_X, start.y - 150.0));
        assert!(dart.target_is_above);
        let mut speed = dart.speed();
        let mut last_y = dart.body().entity.center().y;
        for _ in 0..10 {
            dart.advance();
            assert_relative_eq!(dart.speed(), speed + consts::DART_GRAV_WEAK, epsilon = 1e-5);
            speed = dart.speed();
            let y = dart.body().entity.center().y;
            assert!(y <= last_y + 1e-3, "climbing leg must never sink");
            last_y = y;
        }
    }

    #[test]
    fn test_dive_accelerates_downhill() {
        let mut dart = parked_dart(820.0);
        let start = dart.body().entity.center();
        dart.launch(Vec2::new(consts::BIRD_X, start.y + 300.0));
        for _ in 0..25 {
            dart.advance();
        }
        assert!(
            dart.speed() > consts::DART_DIVE_SPEED,
            "downhill tangent should have fed the speed"
        );
    }

    #[test]
    fn test_velocity_and_rotation_follow_the_path() {
        let mut dart = parked_dart(780.0);
        let start = dart.body().entity.center();
        dart.launch(Vec2::new(consts::BIRD_X, start.y + 200.0));
        for _ in 0..5 {
            let before = dart.body().entity.center();
            dart.advance();
            let delta = dart.body().entity.center() - before;
            assert_relative_eq!(dart.vel().x, delta.x, epsilon = 1e-4);
            assert_relative_eq!(dart.vel().y, delta.y, epsilon = 1e-4);
            assert_relative_eq!(dart.rotation(), (-delta.y).atan2(delta.x), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_dive_exits_the_screen() {
        let mut dart = parked_dart(700.0);
        let start = dart.body().entity.center();
        dart.launch(Vec2::new(consts::BIRD_X, start.y + 220.0));
        for _ in 0..2000 {
            dart.advance();
            if dart.is_gone() {
                break;
            }
        }
        assert!(dart.is_gone(), "a finished dive must cull itself");
    }

    #[test]
    fn test_strike_lands_once() {
        let mut dart = parked_dart(700.0);
        let start = dart.body().entity.center();
        dart.launch(Vec2::new(consts::BIRD_X, start.y + 100.0));
        dart.advance();
        // Park the player directly on the dart
        let player = Entity::new(
            dart.body().entity.pos,
            Vec2::new(consts::BIRD_W, consts::BIRD_H),
        );
        assert_eq!(dart.strike(&player), Some(consts::DART_DAMAGE));
        assert!(dart.has_hit());
        assert_eq!(dart.strike(&player), None);
    }

    #[test]
    fn test_no_strike_while_parked() {
        let mut dart = parked_dart(700.0);
        let player = Entity::new(
            dart.body().entity.pos,
            Vec2::new(consts::BIRD_W, consts::BIRD_H),
        );
        assert_eq!(dart.strike(&player), None);
    }

    #[test]
    fn test_group_spawns_staggered_and_banded() {
        let mut rng = Pcg32::seed_from_u64(11);
        let g = DartGroup::spawn(&mut rng, 2);
        let xs: Vec<f32> = g.members().iter().map(|m| m.body().entity.pos.x).collect();
        assert!(xs.windows(2).all(|w| w[1] - w[0] == consts::DART_SPAWN_STAGGER));
        for (i, m) in g.members().iter().enumerate() {
            let y = m.body().entity.pos.y;
            let base = consts::DART_SPAWN_Y_BASE + i as f32 * consts::DART_SPAWN_Y_STEP;
            assert!(y >= base && y < base + consts::DART_SPAWN_Y_SPAN);
            assert!(m.stop_x >= consts::DART_STOP_X_MIN && m.stop_x <= consts::DART_STOP_X_MAX);
        }
    }

    #[test]
    fn test_group_launches_one_dive_per_gap() {
        let mut rng = Pcg32::seed_from_u64(12);
        let mut g = DartGroup::spawn(&mut rng, 3);
        // Let everyone park
        for _ in 0..800 {
            g.advance();
        }
        assert!(g.members().iter().all(|m| m.phase() == DartPhase::Hold));
        let player = Vec2::new(consts::BIRD_X, 320.0);
        let diving = |g: &DartGroup| {
            g.members()
                .iter()
                .filter(|m| m.phase() == DartPhase::Dive)
                .count()
        };
        for _ in 0..consts::DART_LAUNCH_GAP - 1 {
            g.decide(&mut rng, player);
        }
        assert_eq!(diving(&g), 0);
        g.decide(&mut rng, player);
        assert_eq!(diving(&g), 1);
        for _ in 0..consts::DART_LAUNCH_GAP {
            g.decide(&mut rng, player);
        }
        assert_eq!(diving(&g), 2);
    }

    #[test]
    fn test_launch_target_jitter_is_bounded() {
        let mut rng = Pcg32::seed_from_u64(13);
        for seed in 0..20u64 {
            let mut g = DartGroup::spawn(&mut Pcg32::seed_from_u64(seed), 4);
            for _ in 0..800 {
                g.advance();
            }
            let player = Vec2::new(consts::BIRD_X, 320.0);
            for _ in 0..consts::DART_LAUNCH_GAP {
                g.decide(&mut rng, player);
            }
            let dive = g
                .members()
                .iter()
                .find(|m| m.phase() == DartPhase::Dive)
                .unwrap();
            // The strike leg ends at the jittered target
            let end = dive.segments[0].p3;
            assert!((end.x - player.x).abs() <= consts::DART_TARGET_JITTER);
            assert!((end.y - player.y).abs() <= consts::DART_TARGET_JITTER);
        }
    }

    #[test]
    fn test_damage_and_clearing() {
        let mut rng = Pcg32::seed_from_u64(14);
        let mut g = DartGroup::spawn(&mut rng, 5);
        let hp = EnemyKind::SkyDart.member_hp();
        for i in 0..consts::ENEMY_GROUP_SIZE as u32 {
            assert!(g.apply_damage(i, hp));
        }
        assert!(g.is_cleared());
        assert!(g.right_extent().is_none());
    }
}
