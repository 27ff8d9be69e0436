//! The particle field: generation, per-tick orbit mechanics, and the
//! renderable attributes handed to the external sink.
//!
//! The field never draws anything. Each tick it mutates its particle records
//! in place and rewrites a flat buffer of `RenderParticle` values that a
//! rendering sink can upload verbatim.

use glam::Vec2;
use rand::prelude::*;
use std::f32::consts::TAU;

use crate::color::{ColorFade, ColorMode, Palette, Rgb, mix};
use crate::constants::*;
use crate::state::VisualState;

/// One orbiting particle. Generated on field (re)creation, mutated every
/// tick, discarded wholesale on recreation.
#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec2,
    pub size: f32,
    pub base_opacity: f32,
    pub orbit_angle: f32,
    pub orbit_radius: f32,
    pub orbit_speed: f32,
    pub pulse_phase: f32,
    pub color_mode: ColorMode,
    pub bloom: bool,
    /// Per-particle blend between the primary and secondary palette colors,
    /// rolled at creation for variety.
    tint: f32,
    scale: f32,
    opacity: f32,
    color: Rgb,
    fade: Option<ColorFade>,
}

impl Particle {
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn rendered_size(&self) -> f32 {
        self.size * self.scale
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    fn step(&mut self, params: &TickParams, center: Vec2) {
        let idle = params.state == VisualState::Idle;
        let base_rotation = if idle {
            IDLE_BASE_ROTATION
        } else {
            ACTIVE_BASE_ROTATION
        } * params.animation_speed;
        self.orbit_angle += self.orbit_speed * params.orbit_speed_mult * base_rotation;

        let base_radius = self.orbit_radius + params.energy * ENERGY_RADIUS_SPAN;
        let tight_radius = TIGHT_RADIUS_BASE + self.pulse_phase * TIGHT_RADIUS_PHASE_SPAN;
        let target_radius = base_radius + (tight_radius - base_radius) * params.convergence;
        let target =
            center + Vec2::new(self.orbit_angle.cos(), self.orbit_angle.sin()) * target_radius;

        let smoothing = if idle {
            IDLE_POSITION_SMOOTHING
        } else {
            ACTIVE_POSITION_SMOOTHING
        };
        self.position += (target - self.position) * smoothing;

        let breathe = if idle {
            IDLE_BREATHE_AMPLITUDE
        } else {
            ACTIVE_BREATHE_BASE + ACTIVE_BREATHE_ENERGY_SPAN * params.energy
        };
        let t = params.time as f32;
        self.position += breathe
            * Vec2::new(
                (t * 0.2 + self.pulse_phase).sin(),
                (t * 0.15 + self.pulse_phase * 0.7).cos(),
            );

        self.opacity = (self.base_opacity
            + (t * 0.5 + self.pulse_phase).sin() * OPACITY_SHIMMER
            + params.energy * OPACITY_ENERGY_SPAN)
            .clamp(OPACITY_MIN, OPACITY_MAX);

        let target_scale = 1.0 + SCALE_ENERGY_SPAN * params.energy;
        self.scale += (target_scale - self.scale) * SCALE_SMOOTHING;
    }
}

/// Per-particle renderable attributes, laid out for direct buffer upload.
/// `bloom` is 1.0 for particles the sink should draw with blur.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderParticle {
    pub position: [f32; 2],
    pub size: f32,
    pub opacity: f32,
    pub color: [f32; 3],
    pub bloom: f32,
}

/// The single glow renderable behind the field, visible while speaking.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlowRenderable {
    pub opacity: f32,
    pub size: f32,
}

/// Inputs to one field tick, assembled by the engine.
#[derive(Clone, Copy, Debug)]
pub struct TickParams {
    pub dt: f32,
    pub convergence: f32,
    pub orbit_speed_mult: f32,
    pub energy: f32,
    pub state: VisualState,
    pub time: f64,
    pub animation_speed: f32,
}

pub struct ParticleField {
    particles: Vec<Particle>,
    render: Vec<RenderParticle>,
    rng: StdRng,
    center: Vec2,
    color_mode: ColorMode,
    pending_mode: Option<ColorMode>,
}

impl ParticleField {
    /// Build a field of `count` particles. The seed makes generation
    /// reproducible; production callers pass entropy, tests pass a constant.
    pub fn new(count: usize, seed: u64, palette: &Palette) -> Self {
        let mut field = Self {
            particles: Vec::new(),
            render: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            center: Vec2::ZERO,
            color_mode: ColorMode::Primary,
            pending_mode: None,
        };
        field.recreate(count, palette);
        field
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// The renderable buffer as of the last tick.
    pub fn render(&self) -> &[RenderParticle] {
        &self.render
    }

    /// Discard every particle and generate `count` fresh ones. The current
    /// color mode is preserved. The vector is built aside and swapped in one
    /// step, so a tick never observes a partially rebuilt field.
    pub fn recreate(&mut self, count: usize, palette: &Palette) {
        let mode = self.color_mode;
        let mut next = Vec::with_capacity(count);
        for _ in 0..count {
            next.push(Self::spawn(&mut self.rng, palette, mode, self.center));
        }
        self.particles = next;
        self.render.clear();
        self.render.reserve(count);
        log::debug!("particle field recreated with {count} particles");
    }

    /// Ask for a palette switch. The request is drained at the start of the
    /// next tick; every particle whose mode differs starts a fade then.
    pub fn request_color_mode(&mut self, mode: ColorMode) {
        self.pending_mode = Some(mode);
    }

    /// Re-apply the palette to every particle not currently mid-fade.
    pub fn reapply_palette(&mut self, palette: &Palette) {
        for p in &mut self.particles {
            if p.fade.is_none() {
                p.color = palette_color(palette, p.color_mode, p.tint);
            }
        }
    }

    /// Advance every particle and rewrite the render buffer.
    pub fn tick(&mut self, params: &TickParams, palette: &Palette) {
        if let Some(mode) = self.pending_mode.take() {
            if mode != self.color_mode {
                self.color_mode = mode;
                for p in &mut self.particles {
                    if p.color_mode != mode {
                        let to = palette_color(palette, mode, p.tint);
                        p.fade = Some(ColorFade::new(p.color, to));
                        p.color_mode = mode;
                    }
                }
            }
        }

        self.render.clear();
        for p in &mut self.particles {
            p.step(params, self.center);
            if let Some(fade) = &mut p.fade {
                let (color, done) = fade.advance(params.dt);
                p.color = color;
                if done {
                    p.fade = None;
                }
            }
            self.render.push(RenderParticle {
                position: p.position.to_array(),
                size: p.rendered_size(),
                opacity: p.opacity,
                color: p.color,
                bloom: if p.bloom { 1.0 } else { 0.0 },
            });
        }
    }

    fn spawn(rng: &mut StdRng, palette: &Palette, mode: ColorMode, center: Vec2) -> Particle {
        let orbit_angle = rng.gen::<f32>() * TAU;
        let orbit_radius = rng.gen_range(ORBIT_RADIUS_MIN..ORBIT_RADIUS_MAX);
        let bloom = rng.gen::<f32>() < BLOOM_CHANCE;
        let size = if bloom {
            rng.gen_range(BLOOM_SIZE_MIN..BLOOM_SIZE_MAX)
        } else {
            rng.gen_range(SIZE_MIN..SIZE_MAX)
        };
        let tint = rng.gen::<f32>();
        Particle {
            position: center + Vec2::new(orbit_angle.cos(), orbit_angle.sin()) * orbit_radius,
            size,
            base_opacity: rng.gen_range(BASE_OPACITY_MIN..BASE_OPACITY_MAX),
            orbit_angle,
            orbit_radius,
            orbit_speed: rng.gen_range(ORBIT_SPEED_MIN..ORBIT_SPEED_MAX),
            pulse_phase: rng.gen::<f32>() * TAU,
            color_mode: mode,
            bloom,
            tint,
            scale: 1.0,
            opacity: 0.0,
            color: palette_color(palette, mode, tint),
            fade: None,
        }
    }
}

/// A particle's resting fill color. Primary-mode particles sit on a
/// per-particle blend between the primary and secondary palette entries;
/// alternate mode is the flat thinking color.
fn palette_color(palette: &Palette, mode: ColorMode, tint: f32) -> Rgb {
    match mode {
        ColorMode::Primary => mix(palette.primary, palette.secondary, tint),
        ColorMode::Alternate => palette.thinking,
    }
}
