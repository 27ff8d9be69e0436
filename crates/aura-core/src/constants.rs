// Shared tuning constants for the particle engine. The easing coefficients
// below are deliberately tiny and fixed: they are the entire source of the
// engine's slow, breathing transitions. They must never become state- or
// count-dependent.

// Scheduler cadence (~30 Hz)
pub const TICK_INTERVAL_MS: u64 = 33;
pub const TICK_SECS: f32 = TICK_INTERVAL_MS as f32 / 1000.0;

// Per-tick easing toward state targets
pub const CONVERGENCE_EASE: f32 = 0.008;
pub const ORBIT_SPEED_EASE: f32 = 0.012;
pub const TIME_STEP: f64 = 0.012; // multiplied by animation_speed^2 per tick

// Particle generation ranges
pub const ORBIT_RADIUS_MIN: f32 = 20.0;
pub const ORBIT_RADIUS_MAX: f32 = 90.0;
pub const ORBIT_SPEED_MIN: f32 = 0.005;
pub const ORBIT_SPEED_MAX: f32 = 0.02;
pub const SIZE_MIN: f32 = 2.0;
pub const SIZE_MAX: f32 = 6.0;
pub const BLOOM_SIZE_MIN: f32 = 5.0; // bloom particles render with blur
pub const BLOOM_SIZE_MAX: f32 = 8.0;
pub const BLOOM_CHANCE: f32 = 0.15;
pub const BASE_OPACITY_MIN: f32 = 0.4;
pub const BASE_OPACITY_MAX: f32 = 0.9;

// Orbit motion
pub const IDLE_BASE_ROTATION: f32 = 0.08;
pub const ACTIVE_BASE_ROTATION: f32 = 0.5;
pub const IDLE_POSITION_SMOOTHING: f32 = 0.015;
pub const ACTIVE_POSITION_SMOOTHING: f32 = 0.04;
pub const TIGHT_RADIUS_BASE: f32 = 6.0; // cluster radius at full convergence
pub const TIGHT_RADIUS_PHASE_SPAN: f32 = 2.0;
pub const ENERGY_RADIUS_SPAN: f32 = 40.0;

// Breathing wobble
pub const IDLE_BREATHE_AMPLITUDE: f32 = 0.5;
pub const ACTIVE_BREATHE_BASE: f32 = 1.0;
pub const ACTIVE_BREATHE_ENERGY_SPAN: f32 = 4.0;

// Per-tick appearance
pub const OPACITY_MIN: f32 = 0.25;
pub const OPACITY_MAX: f32 = 1.0;
pub const OPACITY_SHIMMER: f32 = 0.06;
pub const OPACITY_ENERGY_SPAN: f32 = 0.2;
pub const SCALE_ENERGY_SPAN: f32 = 0.6;
pub const SCALE_SMOOTHING: f32 = 0.05;

// Energy envelope
pub const ENERGY_NOISE_GATE: f32 = 0.08; // amplitudes below this read as silence
pub const ENERGY_BOOST: f32 = 1.4;
pub const ENERGY_ATTACK: f32 = 0.35; // fast in
pub const ENERGY_DECAY: f32 = 0.08; // slow out
pub const EASE_OUT_SECS: f32 = 0.5;
pub const SYNTH_FLOOR: f32 = 0.3; // guaranteed motion while speaking

// Color fades
pub const COLOR_FADE_SECS: f32 = 0.3;

// Glow renderable
pub const GLOW_BASE_OPACITY: f32 = 0.35;
pub const GLOW_ENERGY_OPACITY_SPAN: f32 = 0.45;
pub const GLOW_EASE: f32 = 0.1;
pub const GLOW_BASE_SIZE: f32 = 120.0;
pub const GLOW_ENERGY_SIZE_SPAN: f32 = 80.0;

// Config clamps
pub const ANIMATION_SPEED_MIN: f64 = 0.1;
pub const ANIMATION_SPEED_MAX: f64 = 3.0;
pub const PARTICLE_COUNT_MIN: usize = 50;
pub const PARTICLE_COUNT_MAX: usize = 300;
