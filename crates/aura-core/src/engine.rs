//! The engine facade: owns the state machine, particle field, energy
//! envelope and configuration, applies the per-tick easing, and feeds the
//! rendering sink.
//!
//! The engine itself is synchronous and single-threaded; `AuraVisual` in
//! `scheduler` wraps it in the timer loops and the cross-thread handoffs.

use smallvec::SmallVec;
use std::sync::Arc;
use thiserror::Error;

use crate::color::{Palette, PresetRegistry, Rgb};
use crate::config::{AnimationConfig, SettingsProvider};
use crate::constants::*;
use crate::energy::{AmplitudeCell, EnergyEnvelope, EnergyTick};
use crate::particle::{GlowRenderable, ParticleField, RenderParticle, TickParams};
use crate::state::{StateController, VisualState};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown color preset '{0}'")]
    UnknownPreset(String),
    #[error(transparent)]
    Sink(#[from] anyhow::Error),
}

/// Notifications surfaced to the host, drained once per visual tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    StateChanged(VisualState),
    EaseOutFinished,
}

pub type EventQueue = SmallVec<[EngineEvent; 4]>;

/// One tick's worth of renderable output for the external sink.
pub struct FrameSnapshot<'a> {
    pub particles: &'a [RenderParticle],
    pub glow: GlowRenderable,
    pub state: VisualState,
    /// Present when the host enabled the state label.
    pub label: Option<&'static str>,
}

/// The external rendering sink. The engine computes attributes; the sink
/// draws them.
pub trait FrameSink: Send {
    /// Called whenever the particle set is (re)created, before any frame of
    /// the new size is presented. A failure here surfaces to whoever asked
    /// for the (re)creation; the engine keeps its previous field.
    fn prepare(&mut self, particle_count: usize) -> anyhow::Result<()>;

    /// Receive one frame of renderable attributes.
    fn present(&mut self, frame: &FrameSnapshot<'_>);
}

pub struct AuraEngine {
    controller: StateController,
    field: ParticleField,
    envelope: EnergyEnvelope,
    config: AnimationConfig,
    presets: PresetRegistry,
    sink: Box<dyn FrameSink>,
    orb_style: String,
    show_state_label: bool,
    time: f64,
    convergence: f32,
    orbit_speed_mult: f32,
    glow_opacity: f32,
    glow_size: f32,
    events: EventQueue,
}

impl AuraEngine {
    /// Build an engine from the one-time settings snapshot. The sink is
    /// prepared for the initial particle count; a sink failure here is the
    /// caller's to handle, never a half-initialized engine.
    pub fn new(
        settings: &dyn SettingsProvider,
        mut sink: Box<dyn FrameSink>,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let snapshot = settings.orb_settings();
        let presets = PresetRegistry::builtin();
        let palette = match presets.get(&snapshot.color_preset) {
            Some(p) => p,
            None => {
                log::warn!(
                    "unknown color preset '{}' in settings, using default",
                    snapshot.color_preset
                );
                Palette::default()
            }
        };
        let config = AnimationConfig::new(snapshot.animation_speed, snapshot.particle_count, palette);
        sink.prepare(config.particle_count())?;
        let field = ParticleField::new(config.particle_count(), seed, &config.palette);
        Ok(Self {
            controller: StateController::new(),
            field,
            envelope: EnergyEnvelope::new(),
            config,
            presets,
            sink,
            orb_style: snapshot.orb_style,
            show_state_label: false,
            time: 0.0,
            convergence: 0.0,
            orbit_speed_mult: 1.0,
            glow_opacity: 0.0,
            glow_size: GLOW_BASE_SIZE,
            events: EventQueue::new(),
        })
    }

    // --- state machine ---

    pub fn state(&self) -> VisualState {
        self.controller.state()
    }

    pub fn set_state(&mut self, new: VisualState) {
        let prev = self.controller.set_state(new);
        let targets = self.controller.targets();
        // Same request twice is harmless: the drain only fades particles
        // whose mode actually differs.
        self.field.request_color_mode(targets.color_mode);
        match new {
            VisualState::Idle => self.envelope.reset(),
            VisualState::Speaking => self.envelope.start_ingestion(),
            _ => self.envelope.stop_ingestion(),
        }
        if prev != new {
            self.events.push(EngineEvent::StateChanged(new));
        }
    }

    pub fn set_idle(&mut self) {
        self.set_state(VisualState::Idle);
    }

    pub fn set_listening(&mut self) {
        self.set_state(VisualState::Listening);
    }

    pub fn set_thinking(&mut self) {
        self.set_state(VisualState::Thinking);
    }

    pub fn set_speaking(&mut self) {
        self.set_state(VisualState::Speaking);
    }

    pub fn cycle_state(&mut self) {
        let next = self.controller.state().next();
        self.set_state(next);
    }

    // --- energy ---

    /// Clamped amplitude ingestion. Single-threaded hosts call this; a
    /// producer on another thread writes through `amplitude_cell()` instead
    /// and never takes the engine lock.
    pub fn update_speaking_energy(&mut self, amplitude: f64) {
        self.envelope.ingest(amplitude);
    }

    pub fn amplitude_cell(&self) -> Arc<AmplitudeCell> {
        self.envelope.amplitude_cell()
    }

    /// Start the timed decay back to Idle. Ignored outside Speaking.
    pub fn end_speaking(&mut self) {
        if self.controller.state() == VisualState::Speaking {
            self.envelope.begin_ease_out();
        } else {
            log::debug!("end_speaking ignored outside Speaking");
        }
    }

    pub fn smoothed_energy(&self) -> f32 {
        self.envelope.smoothed()
    }

    pub fn is_easing_out(&self) -> bool {
        self.envelope.is_easing_out()
    }

    // --- colors ---

    pub fn set_primary_color(&mut self, color: Rgb) {
        self.config.palette.primary = color;
        self.field.reapply_palette(&self.config.palette);
    }

    pub fn set_secondary_color(&mut self, color: Rgb) {
        self.config.palette.secondary = color;
        self.field.reapply_palette(&self.config.palette);
    }

    pub fn set_thinking_color(&mut self, color: Rgb) {
        self.config.palette.thinking = color;
        self.field.reapply_palette(&self.config.palette);
    }

    /// Re-apply the current palette to every particle not mid-fade.
    pub fn update_particle_colors(&mut self) {
        self.field.reapply_palette(&self.config.palette);
    }

    pub fn apply_color_preset(&mut self, name: &str) -> Result<(), EngineError> {
        let palette = self
            .presets
            .get(name)
            .ok_or_else(|| EngineError::UnknownPreset(name.to_owned()))?;
        self.config.palette = palette;
        self.field.reapply_palette(&palette);
        log::info!("applied color preset '{name}'");
        Ok(())
    }

    // --- configuration ---

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn orb_style(&self) -> &str {
        &self.orb_style
    }

    pub fn set_show_state_label(&mut self, show: bool) {
        self.show_state_label = show;
    }

    pub fn show_state_label(&self) -> bool {
        self.show_state_label
    }

    pub fn set_animation_speed(&mut self, speed: f64) {
        self.config.set_animation_speed(speed);
    }

    /// Clamp the count and recreate the field when it changed. A sink
    /// failure keeps the previous field and is logged, not propagated: the
    /// property surface degrades gracefully.
    pub fn set_particle_count(&mut self, count: usize) {
        let clamped = count.clamp(PARTICLE_COUNT_MIN, PARTICLE_COUNT_MAX);
        if clamped == self.config.particle_count() {
            return;
        }
        if let Err(err) = self.recreate_particles(clamped) {
            log::error!("particle field recreation failed: {err}");
        }
    }

    pub fn particle_count(&self) -> usize {
        self.field.len()
    }

    /// Explicit recreation. The sink sizes its buffers first; if that fails
    /// the old field stays intact and the error goes to the caller.
    pub fn recreate_particles(&mut self, count: usize) -> Result<(), EngineError> {
        let count = count.clamp(PARTICLE_COUNT_MIN, PARTICLE_COUNT_MAX);
        self.sink.prepare(count)?;
        self.field.recreate(count, &self.config.palette);
        self.config.set_particle_count(count);
        Ok(())
    }

    // --- ticking ---

    /// One visual tick: ease live values toward the state targets, advance
    /// time, step every particle, update the glow.
    pub fn tick_visual(&mut self, dt: f32) {
        let targets = self.controller.targets();
        self.convergence += (targets.convergence - self.convergence) * CONVERGENCE_EASE;
        self.orbit_speed_mult += (targets.orbit_speed - self.orbit_speed_mult) * ORBIT_SPEED_EASE;

        let speed = self.config.animation_speed();
        // Quadratic on purpose: the perceived tempo change of the speed
        // setting is much stronger than a linear mapping gives.
        self.time += TIME_STEP * speed * speed;

        let state = self.controller.state();
        let energy = self.envelope.effective(state, self.time);
        let params = TickParams {
            dt,
            convergence: self.convergence,
            orbit_speed_mult: self.orbit_speed_mult,
            energy,
            state,
            time: self.time,
            animation_speed: speed as f32,
        };
        self.field.tick(&params, &self.config.palette);

        let glow_target = if targets.glow {
            GLOW_BASE_OPACITY + GLOW_ENERGY_OPACITY_SPAN * energy
        } else {
            0.0
        };
        self.glow_opacity += (glow_target - self.glow_opacity) * GLOW_EASE;
        self.glow_size = GLOW_BASE_SIZE + GLOW_ENERGY_SIZE_SPAN * energy;
    }

    /// One energy tick. Runs only while Speaking; completing the ease-out
    /// fires the single automatic transition back to Idle.
    pub fn tick_energy(&mut self, dt: f32) {
        if self.controller.state() != VisualState::Speaking {
            return;
        }
        if self.envelope.tick(dt) == EnergyTick::EaseOutFinished {
            self.events.push(EngineEvent::EaseOutFinished);
            self.set_state(VisualState::Idle);
        }
    }

    /// Hand the current frame to the sink.
    pub fn present(&mut self) {
        let frame = FrameSnapshot {
            particles: self.field.render(),
            glow: GlowRenderable {
                opacity: self.glow_opacity,
                size: self.glow_size,
            },
            state: self.controller.state(),
            label: self
                .show_state_label
                .then(|| self.controller.state().label()),
        };
        self.sink.present(&frame);
    }

    /// Move pending notifications into `out`.
    pub fn drain_events(&mut self, out: &mut EventQueue) {
        out.extend(self.events.drain(..));
    }

    // --- inspection (used by hosts and tests) ---

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn convergence(&self) -> f32 {
        self.convergence
    }

    pub fn orbit_speed_multiplier(&self) -> f32 {
        self.orbit_speed_mult
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn glow(&self) -> GlowRenderable {
        GlowRenderable {
            opacity: self.glow_opacity,
            size: self.glow_size,
        }
    }
}
