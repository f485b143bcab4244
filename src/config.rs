/// Tunables for the simulation, the classifier and the outer loop.
///
/// Every struct deserializes with `#[serde(default)]`, so a JSON config file
/// only needs the keys it wants to override.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gesture::GestureConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Frame geometry ───────────────────────────────────────────────────────────

/// Pixel size of the play field.  Normalized landmark coordinates are scaled
/// by this, and every clamp and wall bounce is measured against it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameGeometry {
    pub width: f32,
    pub height: f32,
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

// ── Gameplay constants ───────────────────────────────────────────────────────

/// Width and height of a sprite, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn square(side: f32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

/// Speeds are pixels per reference frame; see [`GameConfig::reference_fps`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_size: Size,
    /// Distance from the bottom edge to the player's top.
    pub player_bottom_margin: f32,
    pub player_bullet_size: Size,
    pub player_bullet_speed: f32,

    pub enemy_size: Size,
    pub enemy_speed: f32,
    /// How far an enemy drops each time it bounces off a side wall.
    pub enemy_row_step: f32,
    pub enemy_spawn_y_min: f32,
    pub enemy_spawn_y_max: f32,
    pub enemy_bullet_size: Size,
    pub enemy_bullet_speed: f32,
    pub max_enemies: usize,
    /// Seconds; a fresh whole-second threshold is drawn from this range on
    /// every tick.
    pub spawn_interval_min: u32,
    pub spawn_interval_max: u32,

    pub boss_size: Size,
    pub boss_start_y: f32,
    pub boss_dx_choices: Vec<f32>,
    pub boss_dy_choices: Vec<f32>,
    pub homing_bullet_size: Size,
    pub homing_speed: f32,
    pub boss_score_threshold: u32,
    pub boss_life: u32,

    pub starting_life: u32,
    pub kill_reward: u32,
    pub hit_penalty: u32,
    pub boss_reward: u32,

    /// Frame rate the per-frame speeds above were tuned at.  A step of `dt`
    /// seconds integrates `speed * dt * reference_fps` pixels.
    pub reference_fps: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_size: Size::square(64.0),
            player_bottom_margin: 100.0,
            player_bullet_size: Size::square(32.0),
            player_bullet_speed: 5.0,

            enemy_size: Size::square(64.0),
            enemy_speed: 1.0,
            enemy_row_step: 40.0,
            enemy_spawn_y_min: 50.0,
            enemy_spawn_y_max: 150.0,
            enemy_bullet_size: Size::square(16.0),
            enemy_bullet_speed: 5.0,
            max_enemies: 6,
            spawn_interval_min: 5,
            spawn_interval_max: 15,

            boss_size: Size::square(128.0),
            boss_start_y: 50.0,
            boss_dx_choices: vec![-3.0, -2.0, -1.0, 1.0, 2.0, 3.0],
            boss_dy_choices: vec![-2.0, -1.0, 1.0, 2.0],
            homing_bullet_size: Size::square(24.0),
            homing_speed: 2.0,
            boss_score_threshold: 300,
            boss_life: 15,

            starting_life: 3,
            kill_reward: 100,
            hit_penalty: 200,
            boss_reward: 500,

            reference_fps: 144.0,
        }
    }
}

impl GameConfig {
    pub fn validate(&self, frame: &FrameGeometry) -> Result<(), ConfigError> {
        let sprites = [
            ("player_size", self.player_size),
            ("player_bullet_size", self.player_bullet_size),
            ("enemy_size", self.enemy_size),
            ("enemy_bullet_size", self.enemy_bullet_size),
            ("boss_size", self.boss_size),
            ("homing_bullet_size", self.homing_bullet_size),
        ];
        for (name, size) in sprites {
            if !(size.width > 0.0 && size.height > 0.0) {
                return Err(invalid(format!("{name} must be positive")));
            }
            if size.width > frame.width || size.height > frame.height {
                return Err(invalid(format!("{name} does not fit in the frame")));
            }
        }
        let scalars = [
            ("player_bottom_margin", self.player_bottom_margin),
            ("player_bullet_speed", self.player_bullet_speed),
            ("enemy_speed", self.enemy_speed),
            ("enemy_row_step", self.enemy_row_step),
            ("enemy_spawn_y_min", self.enemy_spawn_y_min),
            ("enemy_spawn_y_max", self.enemy_spawn_y_max),
            ("enemy_bullet_speed", self.enemy_bullet_speed),
            ("boss_start_y", self.boss_start_y),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(invalid(format!("{name} must be finite")));
            }
        }
        if self.spawn_interval_min > self.spawn_interval_max {
            return Err(invalid(format!(
                "spawn interval {}..={} is empty",
                self.spawn_interval_min, self.spawn_interval_max
            )));
        }
        if self.enemy_spawn_y_min > self.enemy_spawn_y_max {
            return Err(invalid("enemy spawn row range is empty"));
        }
        if self.boss_dx_choices.is_empty() || self.boss_dy_choices.is_empty() {
            return Err(invalid("boss velocity choices must not be empty"));
        }
        let mut headings = self.boss_dx_choices.iter().chain(&self.boss_dy_choices);
        if !headings.all(|v| v.is_finite()) {
            return Err(invalid("boss velocity choices must be finite"));
        }
        if !(self.homing_speed.is_finite() && self.homing_speed > 0.0) {
            return Err(invalid("homing_speed must be positive"));
        }
        if !(self.reference_fps.is_finite() && self.reference_fps > 0.0) {
            return Err(invalid("reference_fps must be positive"));
        }
        if self.starting_life == 0 || self.boss_life == 0 {
            return Err(invalid("starting_life and boss_life must be at least 1"));
        }
        Ok(())
    }
}

// ── Top-level config ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub frame: FrameGeometry,
    pub game: GameConfig,
    pub gesture: GestureConfig,
    /// Loop ceiling; one camera read, classification, step and render per
    /// iteration.
    pub max_fps: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frame: FrameGeometry::default(),
            game: GameConfig::default(),
            gesture: GestureConfig::default(),
            max_fps: 144,
        }
    }
}

impl AppConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let frame = &self.frame;
        if !(frame.width.is_finite() && frame.width > 0.0)
            || !(frame.height.is_finite() && frame.height > 0.0)
        {
            return Err(invalid("frame width and height must be positive"));
        }
        if self.max_fps == 0 {
            return Err(invalid("max_fps must be at least 1"));
        }
        self.game.validate(frame)?;
        self.gesture.validate()
    }
}

pub(crate) fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}
