//! Game configuration.
//!
//! Everything has a default, so a missing or partial `config.json` is fine.
//! The [`Tuning`] block holds the gameplay constants; its defaults are the
//! values the game is balanced around.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "DINO_TUI_CONFIG";
/// Overrides the log file location.
pub const LOG_ENV: &str = "DINO_TUI_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed frame rate of the simulation.
    pub fps: u32,
    pub sound: bool,
    pub volume: f32,
    /// Seeds the spawn RNG. Random when absent.
    pub seed: Option<u64>,
    pub tuning: Tuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fps: 60,
            sound: true,
            volume: 0.6,
            seed: None,
            tuning: Tuning::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Distance of the ground line above the bottom of the viewport.
    pub ground_margin: f32,
    pub player_x: f32,
    /// Units/s².
    pub gravity: f32,
    /// Units/s, negative is up.
    pub jump_velocity: f32,
    /// Units/s, negative is left.
    pub obstacle_velocity: f32,
    pub obstacle_spawn_x: f32,
    /// Obstacles left of this are destroyed.
    pub obstacle_despawn_x: f32,
    /// Inclusive bounds in milliseconds.
    pub obstacle_delay_ms: (u64, u64),
    pub cloud_delay_ms: (u64, u64),
    /// Units per frame, leftward.
    pub cloud_speed: (f32, f32),
    pub cloud_min_y: f32,
    pub animation_interval_ms: u64,
    pub score_divisor: u32,
    pub point_sound_every: u32,
    pub palette_swap_every: u32,
    pub fade_ms: u64,
    /// Player hitbox size as a fraction of the sprite.
    pub hitbox_size: (f32, f32),
    /// Player hitbox offset from the sprite's top-left, as a fraction.
    pub hitbox_offset: (f32, f32),
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            viewport_width: 1920.0,
            viewport_height: 1080.0,
            ground_margin: 10.0,
            player_x: 150.0,
            gravity: 2000.0,
            jump_velocity: -900.0,
            obstacle_velocity: -500.0,
            obstacle_spawn_x: 2000.0,
            obstacle_despawn_x: -50.0,
            obstacle_delay_ms: (700, 1800),
            cloud_delay_ms: (1200, 2500),
            cloud_speed: (1.0, 3.0),
            cloud_min_y: 50.0,
            animation_interval_ms: 120,
            score_divisor: 10,
            point_sound_every: 50,
            palette_swap_every: 100,
            fade_ms: 500,
            hitbox_size: (0.6, 0.7),
            hitbox_offset: (0.2, 0.3),
        }
    }
}

impl Tuning {
    pub fn ground_y(&self) -> f32 {
        self.viewport_height - self.ground_margin
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            return Err(GameError::InvalidTuning("viewport must be positive"));
        }
        if self.gravity <= 0.0 {
            return Err(GameError::InvalidTuning("gravity must be positive"));
        }
        if self.jump_velocity >= 0.0 {
            return Err(GameError::InvalidTuning("jump velocity must point up"));
        }
        if self.obstacle_velocity >= 0.0 {
            return Err(GameError::InvalidTuning("obstacles must move left"));
        }
        if self.obstacle_delay_ms.0 > self.obstacle_delay_ms.1
            || self.cloud_delay_ms.0 > self.cloud_delay_ms.1
        {
            return Err(GameError::InvalidTuning("delay range is empty"));
        }
        if self.cloud_speed.0 > self.cloud_speed.1 || self.cloud_speed.0 <= 0.0 {
            return Err(GameError::InvalidTuning("cloud speed range is invalid"));
        }
        if self.cloud_min_y > self.viewport_height / 2.0 {
            return Err(GameError::InvalidTuning("cloud band is empty"));
        }
        if self.animation_interval_ms == 0 || self.fade_ms == 0 {
            return Err(GameError::InvalidTuning("intervals must be non-zero"));
        }
        if self.score_divisor == 0 || self.point_sound_every == 0 || self.palette_swap_every == 0 {
            return Err(GameError::InvalidTuning("score thresholds must be non-zero"));
        }
        let ratios = [
            self.hitbox_size.0,
            self.hitbox_size.1,
            self.hitbox_offset.0 + self.hitbox_size.0,
            self.hitbox_offset.1 + self.hitbox_size.1,
        ];
        if ratios.iter().any(|r| *r <= 0.0 || *r > 1.0)
            || self.hitbox_offset.0 < 0.0
            || self.hitbox_offset.1 < 0.0
        {
            return Err(GameError::InvalidTuning("hitbox must fit inside the sprite"));
        }
        Ok(())
    }
}

impl Config {
    /// Reads `path`. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(GameError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_json(&text).map_err(|e| match e {
            GameError::ConfigParse { source, .. } => GameError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(text).map_err(|source| GameError::ConfigParse {
                path: PathBuf::new(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 || self.fps > 240 {
            return Err(GameError::InvalidTuning("fps must be between 1 and 240"));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(GameError::InvalidTuning("volume must be between 0 and 1"));
        }
        self.tuning.validate()
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "dino-tui")
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
}

pub fn log_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(LOG_ENV) {
        return Some(PathBuf::from(path));
    }
    project_dirs().map(|dirs| dirs.data_local_dir().join("dino-tui.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
        assert_eq!(Tuning::default().ground_y(), 1070.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            Config::from_json(r#"{ "fps": 30, "tuning": { "gravity": 1500.0 } }"#).unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.tuning.gravity, 1500.0);
        assert_eq!(config.tuning.jump_velocity, -900.0);
        assert!(config.sound);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_json(r#"{ "fps": 0 }"#),
            Err(GameError::InvalidTuning(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "tuning": { "obstacle_delay_ms": [1800, 700] } }"#),
            Err(GameError::InvalidTuning(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "tuning": { "hitbox_offset": [0.5, 0.3] } }"#),
            Err(GameError::InvalidTuning(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Config::from_json("{ fps: 60"),
            Err(GameError::ConfigParse { .. })
        ));
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join("dino-tui-does-not-exist/config.json");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }
}
