//! Fixed-cadence animation scheduler and the host-facing handle.
//!
//! Two independent ~33 ms loops: the visual loop eases targets, ticks the
//! particle field and color fades, and presents each frame; the energy loop
//! ticks the envelope, which only does work while Speaking. All engine
//! mutation happens under one mutex on these loops' threads; the only
//! lock-free path is amplitude ingestion, which producers write through
//! `AmplitudeCell` so an audio callback never contends with a tick.

use instant::Instant;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::color::Rgb;
use crate::constants::TICK_INTERVAL_MS;
use crate::energy::AmplitudeCell;
use crate::engine::{AuraEngine, EngineError, EngineEvent, EventQueue};
use crate::state::VisualState;

pub type EventObserver = Box<dyn FnMut(EngineEvent) + Send>;

/// Running engine plus its scheduler threads. Dropping (or `stop`) shuts the
/// loops down and joins them.
pub struct AuraVisual {
    engine: Arc<Mutex<AuraEngine>>,
    amplitude: Arc<AmplitudeCell>,
    running: Arc<AtomicBool>,
    visual_loop: Option<JoinHandle<()>>,
    energy_loop: Option<JoinHandle<()>>,
}

impl AuraVisual {
    /// Take ownership of an engine and start both loops. Events the engine
    /// queues (state changes, ease-out completion) are handed to `observer`
    /// from the visual loop.
    pub fn start(engine: AuraEngine, observer: Option<EventObserver>) -> Self {
        let amplitude = engine.amplitude_cell();
        let engine = Arc::new(Mutex::new(engine));
        let running = Arc::new(AtomicBool::new(true));
        let tick = Duration::from_millis(TICK_INTERVAL_MS);

        let visual_loop = {
            let engine = Arc::clone(&engine);
            let running = Arc::clone(&running);
            let mut observer = observer;
            thread::spawn(move || {
                let mut last = Instant::now();
                let mut events = EventQueue::new();
                while running.load(Ordering::Relaxed) {
                    {
                        let mut engine = engine.lock().unwrap();
                        let now = Instant::now();
                        let dt = (now - last).as_secs_f32();
                        last = now;
                        engine.tick_visual(dt);
                        engine.present();
                        engine.drain_events(&mut events);
                    }
                    for event in events.drain(..) {
                        log::debug!("engine event: {event:?}");
                        if let Some(cb) = observer.as_mut() {
                            cb(event);
                        }
                    }
                    thread::sleep(tick);
                }
                log::debug!("visual loop stopped");
            })
        };

        let energy_loop = {
            let engine = Arc::clone(&engine);
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let mut last = Instant::now();
                while running.load(Ordering::Relaxed) {
                    {
                        let mut engine = engine.lock().unwrap();
                        let now = Instant::now();
                        let dt = (now - last).as_secs_f32();
                        last = now;
                        engine.tick_energy(dt);
                    }
                    thread::sleep(tick);
                }
                log::debug!("energy loop stopped");
            })
        };

        Self {
            engine,
            amplitude,
            running,
            visual_loop: Some(visual_loop),
            energy_loop: Some(energy_loop),
        }
    }

    // --- host surface; each call takes effect before the next tick ---

    pub fn state(&self) -> VisualState {
        self.engine.lock().unwrap().state()
    }

    pub fn set_state(&self, state: VisualState) {
        self.engine.lock().unwrap().set_state(state);
    }

    pub fn set_idle(&self) {
        self.set_state(VisualState::Idle);
    }

    pub fn set_listening(&self) {
        self.set_state(VisualState::Listening);
    }

    pub fn set_thinking(&self) {
        self.set_state(VisualState::Thinking);
    }

    pub fn set_speaking(&self) {
        self.set_state(VisualState::Speaking);
    }

    pub fn cycle_state(&self) {
        self.engine.lock().unwrap().cycle_state();
    }

    /// Lock-free amplitude ingestion, safe from any thread.
    pub fn update_speaking_energy(&self, amplitude: f64) {
        self.amplitude.ingest(amplitude);
    }

    /// Handle a producer thread can own outright (a TTS or playback
    /// callback), bypassing this struct entirely.
    pub fn amplitude_handle(&self) -> Arc<AmplitudeCell> {
        Arc::clone(&self.amplitude)
    }

    pub fn end_speaking(&self) {
        self.engine.lock().unwrap().end_speaking();
    }

    /// Smoothed energy as of the last tick, for host-side meters.
    pub fn smoothed_energy(&self) -> f32 {
        self.engine.lock().unwrap().smoothed_energy()
    }

    pub fn particle_count(&self) -> usize {
        self.engine.lock().unwrap().particle_count()
    }

    pub fn set_show_state_label(&self, show: bool) {
        self.engine.lock().unwrap().set_show_state_label(show);
    }

    pub fn show_state_label(&self) -> bool {
        self.engine.lock().unwrap().show_state_label()
    }

    pub fn set_primary_color(&self, color: Rgb) {
        self.engine.lock().unwrap().set_primary_color(color);
    }

    pub fn set_secondary_color(&self, color: Rgb) {
        self.engine.lock().unwrap().set_secondary_color(color);
    }

    pub fn set_thinking_color(&self, color: Rgb) {
        self.engine.lock().unwrap().set_thinking_color(color);
    }

    pub fn update_particle_colors(&self) {
        self.engine.lock().unwrap().update_particle_colors();
    }

    pub fn apply_color_preset(&self, name: &str) -> Result<(), EngineError> {
        self.engine.lock().unwrap().apply_color_preset(name)
    }

    pub fn set_animation_speed(&self, speed: f64) {
        self.engine.lock().unwrap().set_animation_speed(speed);
    }

    pub fn set_particle_count(&self, count: usize) {
        self.engine.lock().unwrap().set_particle_count(count);
    }

    pub fn recreate_particles(&self, count: usize) -> Result<(), EngineError> {
        self.engine.lock().unwrap().recreate_particles(count)
    }

    /// Stop both loops and join them. Called automatically on drop.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }
        if let Some(handle) = self.visual_loop.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.energy_loop.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AuraVisual {
    fn drop(&mut self) {
        self.stop();
    }
}
