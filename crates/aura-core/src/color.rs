//! Colors, per-particle fades, and the named preset registry.
//!
//! Colors are plain `[f32; 3]` RGB triples in linear \[0, 1\] space so sinks
//! can upload them directly. A `ColorFade` animates one particle's fill color
//! between palettes over a fixed duration; all particles affected by a state
//! change are triggered at the same tick but advance independently.

use crate::constants::COLOR_FADE_SECS;
use fnv::FnvHashMap;

pub type Rgb = [f32; 3];

/// Linear interpolation between two colors.
pub fn mix(a: Rgb, b: Rgb, t: f32) -> Rgb {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Which palette entry a particle draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Primary,
    Alternate,
}

/// The three palette values a running engine carries. `thinking` is the
/// alternate color used while the assistant is reasoning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub thinking: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        AURORA
    }
}

const AURORA: Palette = Palette {
    primary: [0.35, 0.78, 0.95],
    secondary: [0.55, 0.45, 0.95],
    thinking: [0.95, 0.62, 0.30],
};

const EMBER: Palette = Palette {
    primary: [0.95, 0.45, 0.25],
    secondary: [0.95, 0.70, 0.30],
    thinking: [0.60, 0.30, 0.85],
};

const VIOLET: Palette = Palette {
    primary: [0.62, 0.40, 0.95],
    secondary: [0.85, 0.40, 0.85],
    thinking: [0.30, 0.85, 0.75],
};

const MONO: Palette = Palette {
    primary: [0.85, 0.88, 0.92],
    secondary: [0.55, 0.58, 0.64],
    thinking: [0.98, 0.98, 1.00],
};

/// An in-flight fill-color animation on one particle.
#[derive(Clone, Copy, Debug)]
pub struct ColorFade {
    from: Rgb,
    to: Rgb,
    elapsed: f32,
}

impl ColorFade {
    pub fn new(from: Rgb, to: Rgb) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
        }
    }

    /// Advance by `dt` seconds. Returns the current color and whether the
    /// fade has completed.
    pub fn advance(&mut self, dt: f32) -> (Rgb, bool) {
        self.elapsed += dt;
        let t = (self.elapsed / COLOR_FADE_SECS).clamp(0.0, 1.0);
        (mix(self.from, self.to, t), t >= 1.0)
    }
}

/// Built-in palettes addressable by name from the settings snapshot or
/// `apply_color_preset`.
pub struct PresetRegistry {
    presets: FnvHashMap<&'static str, Palette>,
}

impl PresetRegistry {
    pub fn builtin() -> Self {
        let mut presets = FnvHashMap::default();
        presets.insert("aurora", AURORA);
        presets.insert("ember", EMBER);
        presets.insert("violet", VIOLET);
        presets.insert("mono", MONO);
        Self { presets }
    }

    pub fn get(&self, name: &str) -> Option<Palette> {
        self.presets.get(name.to_ascii_lowercase().as_str()).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.presets.keys().copied()
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
