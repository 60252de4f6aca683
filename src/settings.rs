use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::SettingsError;
use crate::types::Rect;

// --- Game settings: defaults from constants, any subset overridable from JSON ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window_width: u32,
    pub window_height: u32,
    /// Strip at the bottom of the window that the playground leaves to the HUD
    pub hud_margin: u32,
    pub fps: u32,
    /// Degrees per heading step
    pub d_angle: f64,
    pub max_big_rocks: usize,
    pub rock_spawn_interval_ms: u64,
    pub ship_thrust_interval_ms: u64,
    pub spawn_margin: f64,
    pub max_spawn_attempts: u32,
    pub background_frame_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            hud_margin: HUD_MARGIN,
            fps: FPS,
            d_angle: SHIP_D_ANGLE,
            max_big_rocks: MAX_BIG_ROCKS,
            rock_spawn_interval_ms: ROCK_SPAWN_INTERVAL_MS,
            ship_thrust_interval_ms: SHIP_THRUST_INTERVAL_MS,
            spawn_margin: ROCK_SPAWN_MARGIN,
            max_spawn_attempts: MAX_SPAWN_ATTEMPTS,
            background_frame_ms: BACKGROUND_FRAME_MS,
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io { path: path.to_path_buf(), source })?;
        let settings = Self::from_json(&json)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.window_width == 0 || self.window_width > MAX_EXTENT {
            return Err(invalid("window_width", format!("{} is not in 1..={}", self.window_width, MAX_EXTENT)));
        }
        if self.window_height > MAX_EXTENT {
            return Err(invalid("window_height", format!("{} exceeds {}", self.window_height, MAX_EXTENT)));
        }
        if self.window_height <= self.hud_margin {
            return Err(invalid(
                "window_height",
                format!("{} leaves no playground above a {} px HUD", self.window_height, self.hud_margin),
            ));
        }
        if self.fps == 0 {
            return Err(invalid("fps", "must be positive"));
        }
        if !self.d_angle.is_finite() || self.d_angle <= 0.0 || self.d_angle >= 360.0 {
            return Err(invalid("d_angle", format!("{} is not in (0, 360)", self.d_angle)));
        }
        if !self.spawn_margin.is_finite() || self.spawn_margin < 0.0 {
            return Err(invalid("spawn_margin", "must be a non-negative number"));
        }
        if self.max_spawn_attempts == 0 {
            return Err(invalid("max_spawn_attempts", "must be at least 1"));
        }
        for (field, ms) in [
            ("rock_spawn_interval_ms", self.rock_spawn_interval_ms),
            ("ship_thrust_interval_ms", self.ship_thrust_interval_ms),
            ("background_frame_ms", self.background_frame_ms),
        ] {
            if ms > MAX_INTERVAL_MS {
                return Err(invalid(field, format!("{} ms exceeds {} ms", ms, MAX_INTERVAL_MS)));
            }
        }
        Ok(())
    }

    /// Area the entities live and wrap in: the window minus the HUD strip.
    pub fn playground(&self) -> Rect {
        Rect::new(
            0,
            0,
            self.window_width as i32,
            self.window_height.saturating_sub(self.hud_margin) as i32,
        )
    }

    pub fn window(&self) -> Rect {
        Rect::new(0, 0, self.window_width as i32, self.window_height as i32)
    }

    /// Length of one tick at the configured frame rate.
    pub fn tick_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

// Rects are i32 pixels
const MAX_EXTENT: u32 = i32::MAX as u32;
// One day
const MAX_INTERVAL_MS: u64 = 86_400_000;

fn invalid(field: &'static str, reason: impl Into<String>) -> SettingsError {
    SettingsError::Invalid { field, reason: reason.into() }
}
