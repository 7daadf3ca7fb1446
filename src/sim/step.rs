/// The step functions: advance the world by one physics tick or one
/// clock second.
///
/// Physics tick order:
///   1. Player intent (accelerate / friction / clamp), jump, gravity
///   2. Player collision: horizontal, then vertical (+ head strike)
///   3. Coin pickup at the player's center cell
///   4. Enemies: patrol, then contact with the player (stomp or hurt)
///   5. Goal check → Won
///   6. Fall-out check → hurt
///   7. Camera
///
/// A hurt player is frozen (`alive == false`) until `respawn`; while
/// frozen nothing else can cost a life.

use crate::domain::ai;
use crate::domain::entity::FrameInput;
use crate::domain::physics::Aabb;
use crate::domain::rules::{self, SCORE_BLOCK, SCORE_COIN, SCORE_STOMP};
use crate::sim::level::BlockStrike;
use super::event::{GameEvent, HurtCause};
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry points
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: &FrameInput) -> Vec<GameEvent> {
    if world.phase != Phase::Running { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    if world.player.alive {
        resolve_player_movement(world, input, &mut events);
        resolve_coin_pickup(world, &mut events);
    }
    if resolve_enemies(world, &mut events) {
        hurt_player(world, HurtCause::Enemy, &mut events);
    }
    if resolve_goal(world, &mut events) { return events; }
    resolve_fall_out(world, &mut events);

    let px = world.player.x;
    world.camera.follow(px, &world.camera_cfg);

    events
}

/// One second of run time. Counts down to zero and stays there; at zero a
/// living player loses a life.
pub fn tick_clock(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase != Phase::Running { return vec![]; }

    let mut events = Vec::new();
    world.run.time_left = world.run.time_left.saturating_sub(1);
    if world.run.time_left == 0 && world.player.alive {
        hurt_player(world, HurtCause::TimeUp, &mut events);
    }
    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    let WorldState { player, level, physics, run, .. } = world;

    rules::apply_horizontal_intent(player, input, physics);
    if rules::try_jump(player, input, physics) {
        events.push(GameEvent::Jumped);
    }
    player.vy = rules::apply_gravity(player.vy, physics.gravity, physics.terminal_velocity);

    let solids = level.solid_view(physics.tile_size);
    let mut body = Aabb::new(player.x, player.y, player.w, player.h);

    if solids.resolve_x(&mut body, player.vx) {
        player.vx = 0.0;
    }

    let vy = player.vy;
    let mut head_cell = None;
    if !solids.resolve_y(&mut body, vy) {
        player.on_ground = false;
    } else if vy > 0.0 {
        player.vy = 0.0;
        player.on_ground = true;
    } else if vy < 0.0 {
        player.vy = physics.head_bump_velocity;
        head_cell = Some(solids.cell_at(body.x + body.w / 2.0, body.y - 1.0));
    }

    player.x = body.x;
    player.y = body.y;

    let Some(cell) = head_cell else { return };
    match level.strike(cell) {
        BlockStrike::Reward => {
            run.score = run.score.saturating_add(SCORE_BLOCK);
            run.coins = run.coins.saturating_add(1);
            events.push(GameEvent::BlockRewarded { cell });
        }
        BlockStrike::Bump => events.push(GameEvent::BlockBumped { cell }),
        BlockStrike::Nothing => {}
    }
}

fn resolve_coin_pickup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let cell = world.player.center_cell(world.physics.tile_size);
    if world.level.collect_coin(cell) {
        world.run.score = world.run.score.saturating_add(SCORE_COIN);
        world.run.coins = world.run.coins.saturating_add(1);
        events.push(GameEvent::CoinCollected { cell });
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies: patrol and contact
// ══════════════════════════════════════════════════════════════

/// Returns true if an enemy hurt the player this tick.
fn resolve_enemies(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let WorldState { player, level, enemies, physics, run, .. } = world;
    let solids = level.solid_view(physics.tile_size);
    let mut hurt = false;

    for enemy in enemies.iter_mut() {
        if !enemy.alive { continue; }
        ai::update_enemy(enemy, &solids, physics);

        if !player.alive || hurt { continue; }
        let pbox = Aabb::new(player.x, player.y, player.w, player.h);
        let ebox = Aabb::new(enemy.x, enemy.y, enemy.w, enemy.h);
        if !pbox.overlaps(&ebox) { continue; }

        if rules::is_stomp(player.vy, physics) {
            enemy.alive = false;
            player.vy = physics.stomp_bounce;
            run.score = run.score.saturating_add(SCORE_STOMP);
            events.push(GameEvent::EnemyStomped { id: enemy.id });
        } else {
            hurt = true;
        }
    }

    hurt
}

// ══════════════════════════════════════════════════════════════
// Goal & fall-out
// ══════════════════════════════════════════════════════════════

/// Returns true if the course was cleared this tick.
fn resolve_goal(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if !world.player.alive { return false; }
    let Some(flag) = world.flag else { return false };
    let p = &world.player;
    let tol = world.rules.goal_tolerance;

    let reached = p.x + p.w > flag.x - tol
        && p.x < flag.x + tol
        && p.y + p.h > flag.y - world.rules.goal_band;
    if !reached { return false; }

    let bonus = rules::time_bonus(world.run.time_left, world.rules.time_bonus);
    world.run.score = world.run.score.saturating_add(bonus);
    world.run.status = String::from("Course Clear!");
    world.phase = Phase::Won;
    events.push(GameEvent::CourseCleared { bonus });
    true
}

fn resolve_fall_out(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.player.alive { return; }
    let floor = world.level.height_px(world.physics.tile_size) + world.physics.fall_margin;
    if world.player.y > floor {
        hurt_player(world, HurtCause::Fall, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Life loss & respawn
// ══════════════════════════════════════════════════════════════

/// Shared life-loss path for enemies, falls and time-outs.
/// No-op while a respawn is already pending.
pub fn hurt_player(world: &mut WorldState, cause: HurtCause, events: &mut Vec<GameEvent>) {
    if !world.player.alive || world.phase != Phase::Running { return; }

    world.player.alive = false;
    world.player.vx = 0.0;
    world.player.vy = 0.0;
    world.run.lives = world.run.lives.saturating_sub(1);
    world.death_generation = world.death_generation.wrapping_add(1);
    world.run.status = String::from("Ouch!");
    events.push(GameEvent::PlayerHurt { cause });

    if world.run.lives == 0 {
        world.phase = Phase::Lost;
        world.run.status = String::from("Game Over");
    }
}

/// Put the player back at the checkpoint. Refills the clock if it ran out.
pub fn respawn(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase != Phase::Running { return vec![]; }

    let (cx, cy) = world.player.checkpoint;
    let p = &mut world.player;
    p.x = cx;
    p.y = cy;
    p.vx = 0.0;
    p.vy = 0.0;
    p.on_ground = false;
    p.alive = true;

    if world.run.time_left == 0 {
        world.run.time_left = world.rules.time_limit;
    }
    world.camera.recenter(cx, &world.camera_cfg);
    world.run.status = String::from("Respawned");
    vec![GameEvent::Respawned]
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::Enemy;
    use crate::sim::level::build;

    fn running(rows: &[&str]) -> WorldState {
        let mut w = WorldState::new(build(rows), &GameConfig::default());
        w.phase = Phase::Running;
        w
    }

    fn run_ticks(w: &mut WorldState, input: FrameInput, n: usize) -> Vec<GameEvent> {
        let mut all = vec![];
        for _ in 0..n { all.extend(step(w, &input)); }
        all
    }

    fn idle() -> FrameInput { FrameInput::default() }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    // ── Player kinematics ──

    #[test]
    fn at_rest_on_ground_stays_put() {
        let mut w = running(&["-----", "-----", "-S---", "====="]);
        run_ticks(&mut w, idle(), 30);
        assert!(w.player.on_ground);
        let (x, y) = (w.player.x, w.player.y);
        run_ticks(&mut w, idle(), 200);
        assert_eq!(w.player.vx, 0.0);
        assert_eq!(w.player.vy, 0.0);
        assert_eq!((w.player.x, w.player.y), (x, y));
    }

    #[test]
    fn landing_rests_flush_on_floor() {
        let mut w = running(&["--S--", "-----", "-----", "====="]);
        run_ticks(&mut w, idle(), 60);
        // Floor top at 48, box height 14: bottom pixel y + 13 stays above it.
        assert!(w.player.on_ground);
        assert!(w.player.y + 13.0 < 48.0);
        assert!(w.player.y + 14.0 >= 48.0);
    }

    #[test]
    fn wall_stops_horizontal_motion() {
        let mut w = running(&["------", "------", "-S--#-", "======"]);
        let right = FrameInput { right: true, ..Default::default() };
        run_ticks(&mut w, right, 120);
        // Wall at column 4 starts at x = 64: last free pixel column is 63.
        assert!(w.player.x + 9.0 < 64.0);
        assert!(w.player.x + 10.0 >= 64.0);
    }

    #[test]
    fn speed_cap_holds_while_running() {
        let mut w = running(&[
            "S-----------------------------------------------------------",
            "============================================================",
        ]);
        let input = FrameInput { right: true, run: true, ..Default::default() };
        for _ in 0..100 {
            step(&mut w, &input);
            assert!(w.player.vx.abs() <= w.physics.run_speed);
        }
    }

    // ── Question blocks ──

    #[test]
    fn question_block_pays_once_then_bumps() {
        let mut w = running(&["-----", "--?--", "-----", "--S--", "====="]);
        let jump = FrameInput { jump: true, ..Default::default() };
        let events = run_ticks(&mut w, jump, 240);

        assert_eq!(count(&events, |e| matches!(e, GameEvent::BlockRewarded { cell: (2, 1) })), 1);
        assert!(count(&events, |e| matches!(e, GameEvent::BlockBumped { cell: (2, 1) })) >= 1);
        assert_eq!(w.run.score, SCORE_BLOCK);
        assert_eq!(w.run.coins, 1);
        assert!(w.level.block_spent((2, 1)));
    }

    // ── Coins ──

    #[test]
    fn coin_awarded_exactly_once() {
        let mut w = running(&["-----", "-----", "--o--", "====="]);
        w.player.x = 32.0;
        w.player.y = 30.0;
        let events = run_ticks(&mut w, idle(), 50);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::CoinCollected { .. })), 1);
        assert_eq!(w.run.score, SCORE_COIN);
        assert_eq!(w.run.coins, 1);
        assert!(!w.level.coin_present((2, 2)));
    }

    // ── Enemies ──

    fn parked_enemy(x: f32, y: f32) -> Enemy {
        let mut e = Enemy::spawn(0, 0, 0, 16.0, 0.0);
        e.x = x;
        e.y = y;
        e
    }

    #[test]
    fn falling_player_stomps_enemy_once() {
        let mut w = running(&["------", "------", "------", "======"]);
        w.player.x = 20.0;
        w.player.y = 10.0;
        w.player.vy = 2.0;
        w.enemies.push(parked_enemy(20.0, 24.0));

        let events = step(&mut w, &idle());
        assert!(!w.enemies[0].alive);
        assert_eq!(w.player.vy, w.physics.stomp_bounce);
        assert_eq!(w.run.score, SCORE_STOMP);
        assert!(events.contains(&GameEvent::EnemyStomped { id: 0 }));

        let later = run_ticks(&mut w, idle(), 60);
        assert!(!w.enemies[0].alive);
        assert_eq!(w.enemies.len(), 1);
        assert_eq!(w.run.score, SCORE_STOMP);
        assert_eq!(count(&later, |e| matches!(e, GameEvent::EnemyStomped { .. })), 0);
        assert_eq!(w.run.lives, 3);
    }

    #[test]
    fn side_contact_costs_one_life() {
        let mut w = running(&["-----", "-----", "-S---", "====="]);
        run_ticks(&mut w, idle(), 20);
        let (px, py) = (w.player.x, w.player.y);
        w.enemies.push(parked_enemy(px + 4.0, py + 2.0));

        let events = step(&mut w, &idle());
        assert!(events.contains(&GameEvent::PlayerHurt { cause: HurtCause::Enemy }));
        assert!(!w.player.alive);
        assert_eq!(w.run.lives, 2);
        assert_eq!(w.run.status, "Ouch!");
        assert_eq!(w.death_generation, 1);

        // Still overlapping, but a pending respawn shields further losses.
        run_ticks(&mut w, idle(), 30);
        assert_eq!(w.run.lives, 2);
        assert!(w.enemies[0].alive);
    }

    #[test]
    fn last_life_lost_ends_run() {
        let mut w = running(&["-----", "-----", "-S---", "====="]);
        w.run.lives = 1;
        let mut events = vec![];
        hurt_player(&mut w, HurtCause::Enemy, &mut events);
        assert_eq!(w.run.lives, 0);
        assert_eq!(w.phase, Phase::Lost);
        assert_eq!(w.run.status, "Game Over");
        assert!(step(&mut w, &idle()).is_empty());
        assert!(respawn(&mut w).is_empty());
    }

    // ── Goal ──

    #[test]
    fn reaching_flag_wins_with_time_bonus() {
        let mut w = running(&["--------", "--------", "-S---F--", "========"]);
        let right = FrameInput { right: true, ..Default::default() };
        let events = run_ticks(&mut w, right, 120);

        assert_eq!(w.phase, Phase::Won);
        assert!(events.contains(&GameEvent::CourseCleared { bonus: 4000 }));
        assert_eq!(w.run.score, 4000);
        assert_eq!(w.run.status, "Course Clear!");

        let (x, y, tick) = (w.player.x, w.player.y, w.tick);
        assert!(run_ticks(&mut w, right, 30).is_empty());
        assert_eq!((w.player.x, w.player.y, w.tick), (x, y, tick));
        assert!(tick_clock(&mut w).is_empty());
        assert_eq!(w.run.time_left, 400);
    }

    #[test]
    fn huge_time_bonus_saturates_score() {
        let mut cfg = GameConfig::default();
        cfg.rules.time_limit = 500_000_000;
        let level = build(&["--------", "--------", "-S---F--", "========"]);
        let mut w = WorldState::new(level, &cfg);
        w.phase = Phase::Running;
        w.run.score = 200;

        let right = FrameInput { right: true, ..Default::default() };
        let events = run_ticks(&mut w, right, 120);

        assert_eq!(w.phase, Phase::Won);
        assert!(events.contains(&GameEvent::CourseCleared { bonus: u32::MAX }));
        assert_eq!(w.run.score, u32::MAX);
    }

    #[test]
    fn coin_at_max_score_does_not_wrap() {
        let mut w = running(&["-----", "-----", "--o--", "====="]);
        w.player.x = 32.0;
        w.player.y = 30.0;
        w.run.score = u32::MAX - 1;
        w.run.coins = u32::MAX;
        let events = run_ticks(&mut w, idle(), 50);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::CoinCollected { .. })), 1);
        assert_eq!(w.run.score, u32::MAX);
        assert_eq!(w.run.coins, u32::MAX);
    }

    // ── Fall-out ──

    #[test]
    fn falling_out_of_level_hurts_once() {
        let mut w = running(&["--S--", "-----"]);
        let events = run_ticks(&mut w, idle(), 200);
        assert_eq!(count(&events, |e| *e == GameEvent::PlayerHurt { cause: HurtCause::Fall }), 1);
        assert_eq!(w.run.lives, 2);
    }

    // ── Clock ──

    #[test]
    fn clock_counts_down_and_stops_at_zero() {
        let mut w = running(&["-----", "-----", "-S---", "====="]);
        w.run.time_left = 3;
        assert!(tick_clock(&mut w).is_empty());
        assert!(tick_clock(&mut w).is_empty());
        assert_eq!(w.run.time_left, 1);
        assert_eq!(tick_clock(&mut w), vec![GameEvent::PlayerHurt { cause: HurtCause::TimeUp }]);
        assert_eq!(w.run.time_left, 0);

        assert!(tick_clock(&mut w).is_empty());
        assert_eq!(w.run.time_left, 0);
        assert_eq!(w.run.lives, 2);

        respawn(&mut w);
        assert_eq!(w.run.time_left, 400);
    }

    // ── Respawn ──

    #[test]
    fn respawn_returns_to_checkpoint() {
        let mut w = running(&["-----", "-----", "-S---", "====="]);
        w.set_checkpoint(40.0, 8.0);
        w.player.x = 70.0;
        w.player.vx = 1.5;
        let mut events = vec![];
        hurt_player(&mut w, HurtCause::Fall, &mut events);

        assert_eq!(respawn(&mut w), vec![GameEvent::Respawned]);
        assert!(w.player.alive);
        assert_eq!((w.player.x, w.player.y), (40.0, 8.0));
        assert_eq!((w.player.vx, w.player.vy), (0.0, 0.0));
        assert_eq!(w.run.status, "Respawned");
        assert_eq!(w.camera.x, 40.0);
    }

    #[test]
    fn ready_phase_does_not_simulate() {
        let mut w = WorldState::new(build(&["--S--", "====="]), &GameConfig::default());
        assert!(step(&mut w, &idle()).is_empty());
        assert_eq!(w.tick, 0);
        assert_eq!(w.player.vy, 0.0);
    }
}
