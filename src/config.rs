/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Problems found while loading are kept in `warnings` and logged once
/// the logger is up (the log target itself comes from this file).

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub rules: RunRules,
    pub camera: CameraConfig,
    pub audio: AudioConfig,
    pub gamepad: GamepadConfig,
    pub level_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Per-tick physics tuning, in logical pixels.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub tile_size: f32,
    pub tick_rate_ms: u64,
    pub gravity: f32,
    pub terminal_velocity: f32,
    pub friction_ground: f32,
    pub friction_air: f32,
    pub accel: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub jump_velocity: f32,      // negative = up
    pub run_jump_scale: f32,
    pub head_bump_velocity: f32, // downward kick after hitting a ceiling
    pub enemy_gravity_scale: f32,
    pub enemy_speed: f32,
    pub stomp_threshold: f32,
    pub stomp_bounce: f32,
    pub fall_margin: f32,        // below the level bottom = death
}

/// Run-state rules: counters, timers, goal geometry.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RunRules {
    pub lives: u32,
    pub time_limit: u32,
    pub respawn_delay_ms: u64,
    pub time_bonus: u32,       // score per remaining second on clear
    pub goal_tolerance: f32,   // horizontal reach around the pole
    pub goal_band: f32,        // vertical reach above the pole base
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub scale: f32,
    pub view_width: f32,
    pub smoothing: f32,
    pub respawn_offset: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub start_muted: bool,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub run: Vec<String>,
    pub mute: Vec<String>,
    pub respawn: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: PhysicsConfig,
    #[serde(default)]
    rules: RunRules,
    #[serde(default)]
    camera: CameraConfig,
    #[serde(default)]
    audio: AudioConfig,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_run")]
    run: Vec<String>,
    #[serde(default = "default_mute")]
    mute: Vec<String>,
    #[serde(default = "default_respawn")]
    respawn: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    level_file: Option<String>,
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            tile_size: 16.0,
            tick_rate_ms: 16,        // ~60 Hz
            gravity: 0.36,
            terminal_velocity: 10.0,
            friction_ground: 0.82,
            friction_air: 0.98,
            accel: 0.3,
            walk_speed: 1.8,
            run_speed: 2.4,
            jump_velocity: -6.6,
            run_jump_scale: 1.1,
            head_bump_velocity: 0.2,
            enemy_gravity_scale: 0.9,
            enemy_speed: 0.5,
            stomp_threshold: 0.5,
            stomp_bounce: -4.5,
            fall_margin: 200.0,
        }
    }
}

impl Default for RunRules {
    fn default() -> Self {
        RunRules {
            lives: 3,
            time_limit: 400,
            respawn_delay_ms: 600,
            time_bonus: 10,
            goal_tolerance: 4.0,
            goal_band: 60.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            scale: 3.0,
            view_width: 960.0, // 20 tiles × 16 px × 3
            smoothing: 0.08,
            respawn_offset: 80.0,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig { start_muted: true }
    }
}

fn default_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_run() -> Vec<String> { vec!["X".into(), "Y".into(), "R1".into()] }
fn default_mute() -> Vec<String> { vec!["Select".into()] }
fn default_respawn() -> Vec<String> { vec!["Start".into()] }

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            run: default_run(),
            mute: default_mute(),
            respawn: default_respawn(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        let mut cfg = GameConfig::from_toml(toml_cfg, &search_dirs);
        cfg.warnings = warnings;
        cfg
    }

    /// Parse config text directly (no file search).
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(toml_cfg, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            physics: toml_cfg.physics,
            rules: toml_cfg.rules,
            camera: toml_cfg.camera,
            audio: toml_cfg.audio,
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                run: toml_cfg.gamepad.run,
                mute: toml_cfg.gamepad.mute,
                respawn: toml_cfg.gamepad.respawn,
            },
            level_file: toml_cfg.general.level_file
                .map(|p| resolve_path(&p, search_dirs)),
            log_file: toml_cfg.general.log_file.map(PathBuf::from),
            warnings: Vec::new(),
        }
    }
}

/// Relative paths are looked up in the candidate dirs; first hit wins.
fn resolve_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(path))
        .find(|p| p.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!(
                            "{} parse error, using default settings: {e}",
                            path.display()
                        ));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.physics.tile_size, 16.0);
        assert_eq!(cfg.rules.lives, 3);
        assert_eq!(cfg.rules.time_limit, 400);
        assert!(cfg.audio.start_muted);
        assert!(cfg.level_file.is_none());
        assert_eq!(cfg.gamepad.respawn, vec!["Start".to_string()]);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = GameConfig::parse(
            "[physics]\nrun_speed = 3.0\n\n[rules]\nlives = 5\n",
        ).unwrap();
        assert_eq!(cfg.physics.run_speed, 3.0);
        assert_eq!(cfg.physics.walk_speed, 1.8);
        assert_eq!(cfg.rules.lives, 5);
        assert_eq!(cfg.rules.respawn_delay_ms, 600);
    }

    #[test]
    fn general_paths() {
        let cfg = GameConfig::parse(
            "[general]\nlevel_file = \"/tmp/course.txt\"\nlog_file = \"dash.log\"\n",
        ).unwrap();
        assert_eq!(cfg.level_file, Some(PathBuf::from("/tmp/course.txt")));
        assert_eq!(cfg.log_file, Some(PathBuf::from("dash.log")));
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(GameConfig::parse("[physics\ngravity = ").is_err());
    }
}
