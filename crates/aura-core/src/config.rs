//! Animation configuration and the one-time settings snapshot.
//!
//! All numeric setters clamp silently rather than erroring: this is a
//! continuously-driven visual system, so malformed input degrades to the
//! nearest valid value instead of interrupting the animation.

use crate::color::Palette;
use crate::constants::{
    ANIMATION_SPEED_MAX, ANIMATION_SPEED_MIN, PARTICLE_COUNT_MAX, PARTICLE_COUNT_MIN,
};

/// Live animation parameters owned by the engine.
#[derive(Clone, Debug)]
pub struct AnimationConfig {
    animation_speed: f64,
    particle_count: usize,
    pub palette: Palette,
}

impl AnimationConfig {
    pub fn new(animation_speed: f64, particle_count: usize, palette: Palette) -> Self {
        let mut config = Self {
            animation_speed: 1.0,
            particle_count: PARTICLE_COUNT_MIN,
            palette,
        };
        config.set_animation_speed(animation_speed);
        config.set_particle_count(particle_count);
        config
    }

    pub fn animation_speed(&self) -> f64 {
        self.animation_speed
    }

    pub fn set_animation_speed(&mut self, speed: f64) {
        self.animation_speed = speed.clamp(ANIMATION_SPEED_MIN, ANIMATION_SPEED_MAX);
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Returns true when the clamped value differs from the previous count,
    /// i.e. when the particle field needs recreating.
    pub fn set_particle_count(&mut self, count: usize) -> bool {
        let clamped = count.clamp(PARTICLE_COUNT_MIN, PARTICLE_COUNT_MAX);
        let changed = clamped != self.particle_count;
        self.particle_count = clamped;
        changed
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self::new(1.0, 120, Palette::default())
    }
}

/// Snapshot of persisted user settings, read once at startup. The engine
/// never writes settings back; persistence belongs to the hosting layer.
#[derive(Clone, Debug)]
pub struct OrbSettings {
    pub color_preset: String,
    pub orb_style: String,
    pub animation_speed: f64,
    pub particle_count: usize,
}

impl Default for OrbSettings {
    fn default() -> Self {
        Self {
            color_preset: "aurora".to_owned(),
            orb_style: "soft".to_owned(),
            animation_speed: 1.0,
            particle_count: 120,
        }
    }
}

/// Seam to whatever stores user settings (a config file, the hosting app's
/// preference store). Consumed exactly once when the engine is built.
pub trait SettingsProvider {
    fn orb_settings(&self) -> OrbSettings;
}

/// Provider used when the host has no settings store.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSettings;

impl SettingsProvider for DefaultSettings {
    fn orb_settings(&self) -> OrbSettings {
        OrbSettings::default()
    }
}
