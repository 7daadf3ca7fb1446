/// Enemy patrol: walk, fall, turn at walls and ledges.
///
/// Per tick for a living enemy:
///   1. Gravity (scaled down from the player's), capped at terminal.
///   2. Horizontal: move if free, otherwise reverse direction.
///   3. Vertical: move if free, otherwise stop descending (landed).
///   4. Edge probe: the tile one step ahead at foot level must be solid,
///      otherwise reverse (keeps enemies on their platform).
///
/// Enemies do not walk up to contact like the player does; a blocked
/// move is simply skipped for that tick.

use crate::config::PhysicsConfig;
use super::entity::Enemy;
use super::physics::SolidView;
use super::rules;

/// Probe offsets from the enemy's x, by direction of travel.
const PROBE_AHEAD_RIGHT: f32 = 8.0;
const PROBE_AHEAD_LEFT: f32 = -2.0;
/// Foot probe depth below the enemy's top edge.
const PROBE_FOOT: f32 = 14.0;

pub fn update_enemy(e: &mut Enemy, solids: &SolidView, cfg: &PhysicsConfig) {
    if !e.alive { return; }

    e.vy = rules::apply_gravity(
        e.vy,
        cfg.gravity * cfg.enemy_gravity_scale,
        cfg.terminal_velocity,
    );

    let nx = e.x + e.vx;
    if !solids.blocked(nx, e.y, e.w, e.h) {
        e.x = nx;
    } else {
        e.vx = -e.vx;
    }

    let ny = e.y + e.vy;
    if !solids.blocked(e.x, ny, e.w, e.h) {
        e.y = ny;
    } else if e.vy > 0.0 {
        e.vy = 0.0;
    }

    if !ground_ahead(e, solids) {
        e.vx = -e.vx;
    }
}

/// Is there solid floor one step ahead in the direction of travel?
pub fn ground_ahead(e: &Enemy, solids: &SolidView) -> bool {
    let ahead = e.x + if e.vx > 0.0 { PROBE_AHEAD_RIGHT } else { PROBE_AHEAD_LEFT };
    solids.is_solid(solids.cell_at(ahead, e.y + PROBE_FOOT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::domain::physics::Cell;

    const T: f32 = 16.0;

    /// Build a solid set from a diagram: '#' solid, anything else open.
    fn solids_from(rows: &[&str]) -> HashSet<Cell> {
        let mut s = HashSet::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' { s.insert((x as i32, y as i32)); }
            }
        }
        s
    }

    fn settle(e: &mut Enemy, view: &SolidView, ticks: usize) {
        for _ in 0..ticks { update_enemy(e, view, &PhysicsConfig::default()); }
    }

    #[test]
    fn falls_and_lands_on_floor() {
        let s = solids_from(&[
            "      ",
            "      ",
            "######",
        ]);
        let view = SolidView::new(&s, T);
        let mut e = Enemy::spawn(0, 2, 1, T, 0.0);
        settle(&mut e, &view, 60);
        assert_eq!(e.vy, 0.0);
        assert!(!view.blocked(e.x, e.y, e.w, e.h));
        // Resting within one gravity step of the floor top at y = 32.
        assert!(e.y > 20.0 && e.y < 21.0, "y = {}", e.y);
    }

    #[test]
    fn reverses_at_wall() {
        let s = solids_from(&[
            "       ",
            "#     #",
            "#######",
        ]);
        let view = SolidView::new(&s, T);
        let mut e = Enemy::spawn(0, 2, 1, T, 0.5);
        let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);
        for _ in 0..600 {
            update_enemy(&mut e, &view, &PhysicsConfig::default());
            min_x = min_x.min(e.x);
            max_x = max_x.max(e.x);
        }
        // Bounces between the walls at columns 0 and 6.
        assert_eq!(min_x, 16.0);
        assert_eq!(max_x, 84.5);
    }

    #[test]
    fn turns_at_ledge() {
        let s = solids_from(&[
            "        ",
            "        ",
            "   ###  ",
        ]);
        let view = SolidView::new(&s, T);
        let mut e = Enemy::spawn(0, 4, 2, T, 0.5);
        settle(&mut e, &view, 400);
        // Never walks off the three-tile platform.
        assert!(e.y < 32.0);
        assert!(e.x > 40.0 && e.x < 96.0, "x = {}", e.x);
    }

    #[test]
    fn dead_enemy_is_inert() {
        let s = solids_from(&["   "]);
        let view = SolidView::new(&s, T);
        let mut e = Enemy::spawn(0, 1, 0, T, 0.5);
        e.alive = false;
        let (x, y) = (e.x, e.y);
        settle(&mut e, &view, 10);
        assert_eq!((e.x, e.y), (x, y));
    }
}
