use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const FPS: u32 = 60;
pub const FPS_MAX: u32 = 240;

pub const CELL_PX_W: f32 = 8.0;
pub const CELL_PX_H: f32 = 16.0;

pub const GRAVITY: f32 = 0.4;
pub const BOUNCE: f32 = 0.85;
pub const WALL_DAMP: f32 = 0.8;
pub const REST_SPEED: f32 = 0.5;
pub const GROUND_EPSILON: f32 = 1.0e-3;

pub const MIN_RADIUS: f32 = 5.0;
pub const SPAWN_CAP: usize = 5000;

pub const CHILD_SCALE: f32 = 0.8;
pub const CHILD_OFFSET_X: f32 = 20.0;
pub const CHILD_SPEED_X: f32 = 2.0;

pub const SEED_RADIUS: f32 = 25.0;
pub const SEED_Y: f32 = 20.0;

pub const IMPACT_CUE_COOLDOWN_MS: u64 = 500;

pub const BACKGROUND_SIZE: f32 = 300.0;

/// Runtime settings. Every field falls back to the constants above.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub physics: PhysicsSettings,
    pub population: PopulationSettings,
    pub display: DisplaySettings,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsSettings {
    pub gravity: f32,
    pub bounce: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            bounce: BOUNCE,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationSettings {
    pub spawn_cap: usize,
    pub infinite: bool,
}

impl Default for PopulationSettings {
    fn default() -> Self {
        Self {
            spawn_cap: SPAWN_CAP,
            infinite: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySettings {
    pub fps: u32,
    pub background: Option<PathBuf>,
    pub sound: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            fps: FPS,
            background: None,
            sound: true,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).context("invalid settings file")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let gravity = self.physics.gravity;
        if !gravity.is_finite() {
            bail!("physics.gravity must be finite, got {gravity}");
        }
        let bounce = self.physics.bounce;
        if !(bounce > 0.0 && bounce < 1.0) {
            bail!("physics.bounce must be in (0, 1), got {bounce}");
        }
        if self.population.spawn_cap == 0 {
            bail!("population.spawn_cap must be at least 1");
        }
        let fps = self.display.fps;
        if fps == 0 || fps > FPS_MAX {
            bail!("display.fps must be in 1..={FPS_MAX}, got {fps}");
        }
        Ok(())
    }
}
