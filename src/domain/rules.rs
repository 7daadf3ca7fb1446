/// Player kinematics and scoring rules.
///
/// Pure functions on entity state. Collision is not consulted here;
/// `sim::step` feeds the results through the collision resolver.
///
/// ## Horizontal intent (per tick)
/// ┌──────────────────────────┬──────────────────────────────┐
/// │ Input                     │ Effect on vx                  │
/// ├──────────────────────────┼──────────────────────────────┤
/// │ left only                 │ vx -= accel, face left        │
/// │ right only                │ vx += accel, face right       │
/// │ neither / both            │ vx *= friction (ground | air) │
/// │ always, afterward         │ clamp to ±max (walk | run)    │
/// └──────────────────────────┴──────────────────────────────┘
///
/// ## Jump
/// Only from the ground. vy = jump_velocity (× run_jump_scale when
/// running); on_ground is cleared immediately.

use crate::config::PhysicsConfig;
use super::entity::{Facing, FrameInput, Player};

pub const SCORE_BLOCK: u32 = 100;
pub const SCORE_COIN: u32 = 200;
pub const SCORE_STOMP: u32 = 100;

/// Speed cap currently in effect.
#[inline]
pub fn max_speed(input: &FrameInput, cfg: &PhysicsConfig) -> f32 {
    if input.run { cfg.run_speed } else { cfg.walk_speed }
}

pub fn apply_horizontal_intent(p: &mut Player, input: &FrameInput, cfg: &PhysicsConfig) {
    let max = max_speed(input, cfg);
    if input.left && !input.right {
        p.vx -= cfg.accel;
        p.facing = Facing::Left;
    } else if input.right && !input.left {
        p.vx += cfg.accel;
        p.facing = Facing::Right;
    } else {
        p.vx *= if p.on_ground { cfg.friction_ground } else { cfg.friction_air };
    }
    p.vx = p.vx.clamp(-max, max);
}

/// Start a jump if allowed. Returns true when a jump began.
pub fn try_jump(p: &mut Player, input: &FrameInput, cfg: &PhysicsConfig) -> bool {
    if !input.jump || !p.on_ground {
        return false;
    }
    let scale = if input.run { cfg.run_jump_scale } else { 1.0 };
    p.vy = cfg.jump_velocity * scale;
    p.on_ground = false;
    true
}

/// Add gravity to a vertical velocity, capped at terminal velocity.
#[inline]
pub fn apply_gravity(vy: f32, gravity: f32, terminal: f32) -> f32 {
    (vy + gravity).min(terminal)
}

/// A falling player lands on an enemy fast enough to defeat it.
#[inline]
pub fn is_stomp(player_vy: f32, cfg: &PhysicsConfig) -> bool {
    player_vy > cfg.stomp_threshold
}

/// Bonus for clearing the course with time left.
#[inline]
pub fn time_bonus(time_left: u32, per_second: u32) -> u32 {
    time_left.saturating_mul(per_second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cfg() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    fn held(left: bool, right: bool, run: bool) -> FrameInput {
        FrameInput { left, right, jump: false, run }
    }

    #[test]
    fn at_rest_with_no_input_stays_at_rest() {
        let mut p = Player::new(0.0, 0.0);
        p.on_ground = true;
        for _ in 0..100 {
            apply_horizontal_intent(&mut p, &FrameInput::default(), &cfg());
        }
        assert_eq!(p.vx, 0.0);
    }

    #[test]
    fn accelerates_toward_walk_cap() {
        let mut p = Player::new(0.0, 0.0);
        for _ in 0..20 {
            apply_horizontal_intent(&mut p, &held(false, true, false), &cfg());
        }
        assert_eq!(p.vx, cfg().walk_speed);
        assert_eq!(p.facing, Facing::Right);
    }

    #[test]
    fn releasing_run_reclamps_to_walk() {
        let mut p = Player::new(0.0, 0.0);
        for _ in 0..20 {
            apply_horizontal_intent(&mut p, &held(true, false, true), &cfg());
        }
        assert_eq!(p.vx, -cfg().run_speed);
        apply_horizontal_intent(&mut p, &held(true, false, false), &cfg());
        assert_eq!(p.vx, -cfg().walk_speed);
    }

    #[test]
    fn ground_friction_stronger_than_air() {
        let mut ground = Player::new(0.0, 0.0);
        ground.vx = 1.0;
        ground.on_ground = true;
        let mut air = ground.clone();
        air.on_ground = false;
        apply_horizontal_intent(&mut ground, &FrameInput::default(), &cfg());
        apply_horizontal_intent(&mut air, &FrameInput::default(), &cfg());
        assert!(ground.vx < air.vx);
    }

    #[test]
    fn jump_requires_ground() {
        let mut p = Player::new(0.0, 0.0);
        let input = FrameInput { jump: true, ..Default::default() };
        assert!(!try_jump(&mut p, &input, &cfg()));
        p.on_ground = true;
        assert!(try_jump(&mut p, &input, &cfg()));
        assert_eq!(p.vy, cfg().jump_velocity);
        assert!(!p.on_ground);
    }

    #[test]
    fn running_jump_is_higher() {
        let mut p = Player::new(0.0, 0.0);
        p.on_ground = true;
        let input = FrameInput { jump: true, run: true, ..Default::default() };
        try_jump(&mut p, &input, &cfg());
        assert!(p.vy < cfg().jump_velocity);
    }

    #[test]
    fn gravity_caps_at_terminal() {
        assert_eq!(apply_gravity(9.9, 0.36, 10.0), 10.0);
        assert!((apply_gravity(0.0, 0.36, 10.0) - 0.36).abs() < 1e-6);
    }

    #[test]
    fn bonus_is_time_times_multiplier() {
        assert_eq!(time_bonus(123, 10), 1230);
        assert_eq!(time_bonus(0, 10), 0);
    }

    proptest! {
        #[test]
        fn speed_never_exceeds_cap(
            steps in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()), 1..200),
        ) {
            let c = cfg();
            let mut p = Player::new(0.0, 0.0);
            for (left, right, run, ground) in steps {
                p.on_ground = ground;
                let input = held(left, right, run);
                apply_horizontal_intent(&mut p, &input, &c);
                prop_assert!(p.vx.abs() <= max_speed(&input, &c));
            }
        }
    }
}
