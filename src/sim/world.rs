/// WorldState: the complete state of a running course.
///
/// ## Ownership
///
/// Everything a tick reads or writes lives here and is passed by `&mut`
/// into `step`: the level (with its coin / question-block overlays), the
/// player, the enemies, the run counters, the camera and the phase.
/// Nothing is captured in closures or globals.
///
/// ## Camera
///
/// `camera.x` is in screen pixels (world pixels × scale). It eases toward
/// a target that keeps the player a third of the way into the view, and
/// never goes negative.

use crate::config::{CameraConfig, GameConfig, PhysicsConfig, RunRules};
use crate::domain::entity::{Enemy, Flag, Player};
use crate::sim::level::LevelState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Ready,
    Running,
    Won,
    Lost,
}

/// Session-wide counters, published to the output sink on change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunState {
    pub score: u32,
    pub coins: u32,
    pub lives: u32,
    pub time_left: u32,
    pub world: String,
    pub status: String,
}

impl RunState {
    pub fn new(rules: &RunRules, world: &str) -> Self {
        RunState {
            score: 0,
            coins: 0,
            lives: rules.lives,
            time_left: rules.time_limit,
            world: world.to_string(),
            status: String::from("Ready"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Camera {
    pub x: f32,
}

impl Camera {
    pub fn new() -> Self {
        Camera { x: 0.0 }
    }

    /// Ease a fixed fraction of the remaining distance toward the target.
    /// Asymptotic: never overshoots, never quite arrives.
    pub fn follow(&mut self, player_x: f32, cfg: &CameraConfig) {
        let target = (player_x * cfg.scale - cfg.view_width / 3.0).max(0.0);
        self.x += (target - self.x) * cfg.smoothing;
        self.x = self.x.max(0.0);
    }

    /// Snap near the player (used on respawn).
    pub fn recenter(&mut self, player_x: f32, cfg: &CameraConfig) {
        self.x = (player_x * cfg.scale - cfg.respawn_offset).max(0.0);
    }

    /// Leftmost visible tile column.
    pub fn first_column(&self, tile_size: f32, scale: f32) -> i32 {
        (self.x / (tile_size * scale)).floor() as i32
    }
}

pub struct WorldState {
    // ── Level ──
    pub level: LevelState,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub flag: Option<Flag>,

    // ── Run ──
    pub run: RunState,
    pub phase: Phase,
    pub tick: u64,
    /// Bumped on every death and manual respawn; a scheduled respawn
    /// carrying an older value is stale.
    pub death_generation: u32,

    // ── Camera ──
    pub camera: Camera,

    // ── Tuning ──
    pub physics: PhysicsConfig,
    pub rules: RunRules,
    pub camera_cfg: CameraConfig,
}

impl WorldState {
    pub fn new(level: LevelState, config: &GameConfig) -> Self {
        let tile = config.physics.tile_size;

        // Default start: column 3, five rows above the bottom.
        let (sc, sr) = level.player_start
            .unwrap_or((3, level.height.saturating_sub(5) as i32));
        let player = Player::new(sc as f32 * tile, sr as f32 * tile);

        let enemies = level.enemy_spawns.iter()
            .enumerate()
            .map(|(id, &(c, r))| Enemy::spawn(id, c, r, tile, config.physics.enemy_speed))
            .collect();
        let flag = level.flag.map(|(c, r)| Flag::at_cell(c, r, tile));
        let run = RunState::new(&config.rules, &level.world);

        let mut camera = Camera::new();
        camera.recenter(player.x, &config.camera);

        WorldState {
            level,
            player,
            enemies,
            flag,
            run,
            phase: Phase::Ready,
            tick: 0,
            death_generation: 0,
            camera,
            physics: config.physics.clone(),
            rules: config.rules.clone(),
            camera_cfg: config.camera.clone(),
        }
    }

    /// Record a new safe respawn point.
    pub fn set_checkpoint(&mut self, x: f32, y: f32) {
        self.player.checkpoint = (x, y);
    }

    pub fn living_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }
}
