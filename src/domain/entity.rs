/// Entities: Player, Enemy, Flag.
/// Positions are continuous logical pixels; (x, y) is the top-left
/// corner of the bounding box, y grows downward.

pub const PLAYER_W: f32 = 10.0;
pub const PLAYER_H: f32 = 14.0;
pub const ENEMY_SIZE: f32 = 12.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Held-key state for one tick. Refreshed by the loop from the event
/// source and passed into the step; the core never reads keys itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub run: bool,
}

impl FrameInput {
    /// Any input that should wake a run waiting in Ready.
    pub fn any_action(&self) -> bool {
        self.left || self.right || self.jump
    }

    /// Combine two sources (keyboard + gamepad): held in either = held.
    pub fn merge(self, other: FrameInput) -> FrameInput {
        FrameInput {
            left: self.left || other.left,
            right: self.right || other.right,
            jump: self.jump || other.jump,
            run: self.run || other.run,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
    pub on_ground: bool,
    /// False between a death and the respawn that follows it.
    pub alive: bool,
    /// Last safe respawn point.
    pub checkpoint: (f32, f32),
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x, y,
            w: PLAYER_W,
            h: PLAYER_H,
            vx: 0.0,
            vy: 0.0,
            facing: Facing::Right,
            on_ground: false,
            alive: true,
            checkpoint: (x, y),
        }
    }

    /// Tile under the center of the box.
    pub fn center_cell(&self, tile: f32) -> (i32, i32) {
        (
            ((self.x + self.w / 2.0) / tile).floor() as i32,
            ((self.y + self.h / 2.0) / tile).floor() as i32,
        )
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub vx: f32,
    pub vy: f32,
    /// Defeated enemies stay in the collection as inert corpses.
    pub alive: bool,
}

impl Enemy {
    /// Spawn from a grid marker at (col, row).
    pub fn spawn(id: usize, col: i32, row: i32, tile: f32, speed: f32) -> Self {
        Enemy {
            id,
            x: col as f32 * tile + 2.0,
            y: row as f32 * tile - 8.0,
            w: ENEMY_SIZE,
            h: ENEMY_SIZE,
            vx: -speed,
            vy: 0.0,
            alive: true,
        }
    }
}

/// Course goal. Static after load.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flag {
    /// Pole x (center of its tile).
    pub x: f32,
    /// Top of the flag's tile (the pole base row).
    pub y: f32,
}

impl Flag {
    pub fn at_cell(col: i32, row: i32, tile: f32) -> Self {
        Flag { x: col as f32 * tile + tile / 2.0, y: row as f32 * tile }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_spawns_offset_from_marker() {
        let e = Enemy::spawn(0, 4, 10, 16.0, 0.5);
        assert_eq!(e.x, 66.0);
        assert_eq!(e.y, 152.0);
        assert_eq!(e.vx, -0.5);
        assert!(e.alive);
    }

    #[test]
    fn player_center_cell() {
        let p = Player::new(32.0, 16.0);
        assert_eq!(p.center_cell(16.0), (2, 1));
        assert_eq!(p.checkpoint, (32.0, 16.0));
    }

    #[test]
    fn flag_centered_in_tile() {
        let f = Flag::at_cell(10, 5, 16.0);
        assert_eq!(f.x, 168.0);
        assert_eq!(f.y, 80.0);
    }

    #[test]
    fn frame_input_wakes_on_movement_only() {
        assert!(!FrameInput::default().any_action());
        assert!(!FrameInput { run: true, ..Default::default() }.any_action());
        assert!(FrameInput { jump: true, ..Default::default() }.any_action());
    }

    #[test]
    fn merge_is_held_in_either() {
        let kb = FrameInput { left: true, ..Default::default() };
        let pad = FrameInput { run: true, jump: true, ..Default::default() };
        assert_eq!(kb.merge(pad), FrameInput { left: true, right: false, jump: true, run: true });
    }
}
