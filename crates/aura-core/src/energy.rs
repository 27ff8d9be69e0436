//! Speech-energy envelope: raw amplitude ingestion, asymmetric smoothing,
//! a synthesized organic floor while speaking, and the timed ease-out that
//! hands the engine back to Idle.
//!
//! Amplitude arrives from an audio-playback or TTS callback on another
//! thread, so the handoff is a single lock-free scalar: newest value wins,
//! read once per energy tick. Everything else in here runs on the animation
//! thread.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::constants::{
    EASE_OUT_SECS, ENERGY_ATTACK, ENERGY_BOOST, ENERGY_DECAY, ENERGY_NOISE_GATE, SYNTH_FLOOR,
};
use crate::state::VisualState;

/// Lock-free mailbox for the latest speech amplitude.
///
/// Writes are gated on ingestion being active: an amplitude delivered after
/// leaving Speaking is discarded here, at write time, rather than buffered.
#[derive(Debug, Default)]
pub struct AmplitudeCell {
    bits: AtomicU32,
    active: AtomicBool,
}

impl AmplitudeCell {
    /// Producer-side write, callable from any thread. Clamped to \[0, 1\].
    pub fn ingest(&self, amplitude: f64) {
        if !self.active.load(Ordering::Acquire) {
            log::trace!("amplitude {amplitude:.3} dropped: ingestion inactive");
            return;
        }
        let clamped = amplitude.clamp(0.0, 1.0) as f32;
        self.bits.store(clamped.to_bits(), Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn set_active(&self, on: bool) {
        self.active.store(on, Ordering::Release);
        if !on {
            self.bits.store(0f32.to_bits(), Ordering::Release);
        }
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }
}

/// Outcome of one energy tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnergyTick {
    Running,
    /// The 500 ms ease-out just completed; the engine should transition to
    /// Idle exactly once.
    EaseOutFinished,
}

pub struct EnergyEnvelope {
    raw: Arc<AmplitudeCell>,
    smoothed: f32,
    ease_out_elapsed: Option<f32>,
}

impl EnergyEnvelope {
    pub fn new() -> Self {
        Self {
            raw: Arc::new(AmplitudeCell::default()),
            smoothed: 0.0,
            ease_out_elapsed: None,
        }
    }

    /// Shared handle for the producer thread.
    pub fn amplitude_cell(&self) -> Arc<AmplitudeCell> {
        Arc::clone(&self.raw)
    }

    pub fn smoothed(&self) -> f32 {
        self.smoothed
    }

    pub fn is_easing_out(&self) -> bool {
        self.ease_out_elapsed.is_some()
    }

    pub fn is_ingesting(&self) -> bool {
        self.raw.is_active()
    }

    /// Engine-side ingestion path; same gate as the cross-thread handle.
    pub fn ingest(&self, amplitude: f64) {
        self.raw.ingest(amplitude);
    }

    /// Entering Speaking: open the gate. The smoothed value is deliberately
    /// carried over so back-to-back utterances don't restart from zero. A
    /// pending ease-out is cancelled.
    pub fn start_ingestion(&mut self) {
        self.ease_out_elapsed = None;
        self.raw.set_active(true);
    }

    /// Leaving Speaking for Listening/Thinking: close the gate, keep the
    /// smoothed value, abandon any ease-out.
    pub fn stop_ingestion(&mut self) {
        self.ease_out_elapsed = None;
        self.raw.set_active(false);
    }

    /// Entering Idle: everything back to zero.
    pub fn reset(&mut self) {
        self.stop_ingestion();
        self.smoothed = 0.0;
    }

    /// Begin the timed decay to zero. Only meaningful while Speaking; the
    /// engine enforces that. Calling it again while already easing keeps the
    /// original start.
    pub fn begin_ease_out(&mut self) {
        if self.ease_out_elapsed.is_none() {
            self.ease_out_elapsed = Some(0.0);
        }
    }

    /// One energy tick. `dt` is the elapsed time since the previous tick.
    pub fn tick(&mut self, dt: f32) -> EnergyTick {
        if let Some(elapsed) = &mut self.ease_out_elapsed {
            *elapsed += dt;
            let progress = (*elapsed / EASE_OUT_SECS).clamp(0.0, 1.0);
            self.smoothed *= 1.0 - progress;
            if progress >= 1.0 {
                self.smoothed = 0.0;
                self.ease_out_elapsed = None;
                return EnergyTick::EaseOutFinished;
            }
            return EnergyTick::Running;
        }

        let raw = self.raw.load();
        let processed = if raw < ENERGY_NOISE_GATE {
            0.0
        } else {
            (raw * ENERGY_BOOST).min(1.0)
        };
        // Fast attack, slow decay: speech onsets read immediately, tails
        // linger.
        let rate = if processed > self.smoothed {
            ENERGY_ATTACK
        } else {
            ENERGY_DECAY
        };
        self.smoothed += (processed - self.smoothed) * rate;
        self.smoothed = self.smoothed.clamp(0.0, 1.0);
        EnergyTick::Running
    }

    /// The per-tick modulation value the particle field consumes.
    ///
    /// Outside Speaking this is just the smoothed amplitude. While Speaking,
    /// a layered sine wave provides an organic floor so the orb visibly
    /// pulses even when no real amplitude arrives, while a loud real signal
    /// still dominates.
    pub fn effective(&self, state: VisualState, time: f64) -> f32 {
        if state != VisualState::Speaking {
            return self.smoothed;
        }
        let t = time;
        let wave = 0.6
            + 0.25 * (3.0 * t).sin()
            + 0.15 * (7.0 * t).sin()
            + 0.1 * (13.0 * t).sin();
        self.smoothed.max((wave as f32).clamp(SYNTH_FLOOR, 1.0))
    }
}

impl Default for EnergyEnvelope {
    fn default() -> Self {
        Self::new()
    }
}
