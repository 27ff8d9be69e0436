// Engine-level tests: target easing, the public surface, the ease-out
// round trip, and sink failure handling.

use std::sync::{Arc, Mutex};

use aura_core::{
    AuraEngine, ColorMode, EngineError, EngineEvent, EventQueue, FrameSink, FrameSnapshot,
    OrbSettings, SettingsProvider, VisualState,
};

const DT: f32 = 0.033;

struct NullSink;

impl FrameSink for NullSink {
    fn prepare(&mut self, _particle_count: usize) -> anyhow::Result<()> {
        Ok(())
    }
    fn present(&mut self, _frame: &FrameSnapshot<'_>) {}
}

struct TestSettings(OrbSettings);

impl SettingsProvider for TestSettings {
    fn orb_settings(&self) -> OrbSettings {
        self.0.clone()
    }
}

fn make_engine(particle_count: usize) -> AuraEngine {
    let settings = TestSettings(OrbSettings {
        color_preset: "aurora".to_owned(),
        orb_style: "soft".to_owned(),
        animation_speed: 1.0,
        particle_count,
    });
    AuraEngine::new(&settings, Box::new(NullSink), 42).expect("engine construction")
}

fn drain(engine: &mut AuraEngine) -> Vec<EngineEvent> {
    let mut queue = EventQueue::new();
    engine.drain_events(&mut queue);
    queue.into_iter().collect()
}

#[test]
fn convergence_approaches_the_thinking_target_monotonically() {
    let mut engine = make_engine(120);
    engine.set_thinking();
    let mut prev = engine.convergence();
    for _ in 0..600 {
        engine.tick_visual(DT);
        let c = engine.convergence();
        assert!(c >= prev - 1e-6, "convergence regressed from {prev} to {c}");
        assert!(c <= 0.85 + 1e-6, "convergence overshot to {c}");
        prev = c;
    }
    assert!(
        (0.85 - engine.convergence()) < 0.0085,
        "convergence should be within 1% of its target, got {}",
        engine.convergence()
    );
}

#[test]
fn orbit_speed_multiplier_never_overshoots_from_either_side() {
    // rising: Idle 1.0 -> Thinking 3.0
    let mut engine = make_engine(120);
    engine.set_thinking();
    let mut prev = engine.orbit_speed_multiplier();
    for _ in 0..600 {
        engine.tick_visual(DT);
        let m = engine.orbit_speed_multiplier();
        assert!(m >= prev - 1e-6 && m <= 3.0 + 1e-6);
        prev = m;
    }
    assert!((3.0 - prev) < 0.03);

    // falling: Thinking 3.0 -> Listening 0.6
    engine.set_listening();
    for _ in 0..600 {
        engine.tick_visual(DT);
        let m = engine.orbit_speed_multiplier();
        assert!(m <= prev + 1e-6 && m >= 0.6 - 1e-6);
        prev = m;
    }
}

#[test]
fn time_accumulates_with_the_square_of_animation_speed() {
    let mut engine = make_engine(120);
    engine.set_animation_speed(2.0);
    engine.tick_visual(DT);
    assert!((engine.time() - 0.048).abs() < 1e-9, "got {}", engine.time());

    // out-of-range speed clamps to 3.0 first
    engine.set_animation_speed(99.0);
    let before = engine.time();
    engine.tick_visual(DT);
    assert!((engine.time() - before - 0.108).abs() < 1e-9);
}

#[test]
fn numeric_setters_clamp_silently() {
    let mut engine = make_engine(120);
    engine.set_animation_speed(0.0);
    assert_eq!(engine.config().animation_speed(), 0.1);
    engine.set_animation_speed(99.0);
    assert_eq!(engine.config().animation_speed(), 3.0);

    engine.set_particle_count(10);
    assert_eq!(engine.particle_count(), 50);
    engine.set_particle_count(10_000);
    assert_eq!(engine.particle_count(), 300);
}

#[test]
fn repeated_set_state_emits_a_single_event() {
    let mut engine = make_engine(120);
    engine.set_thinking();
    assert_eq!(drain(&mut engine), vec![EngineEvent::StateChanged(VisualState::Thinking)]);
    engine.set_thinking();
    assert!(drain(&mut engine).is_empty(), "same state twice must be silent");
}

#[test]
fn cycling_walks_the_four_states_and_returns_to_idle() {
    let mut engine = make_engine(120);
    let mut seen = Vec::new();
    for _ in 0..4 {
        engine.cycle_state();
        seen.push(engine.state());
    }
    assert_eq!(
        seen,
        vec![
            VisualState::Listening,
            VisualState::Thinking,
            VisualState::Speaking,
            VisualState::Idle
        ]
    );
}

#[test]
fn growing_the_field_replaces_it_and_keeps_the_color_mode() {
    let mut engine = make_engine(50);
    engine.set_thinking();
    engine.tick_visual(DT); // drain the mode request into the particles
    assert_eq!(engine.field().color_mode(), ColorMode::Alternate);

    engine.set_particle_count(300);
    assert_eq!(engine.particle_count(), 300);
    assert_eq!(engine.field().color_mode(), ColorMode::Alternate);
    assert!(engine
        .field()
        .particles()
        .iter()
        .all(|p| p.color_mode == ColorMode::Alternate));
}

#[test]
fn ease_out_lands_on_idle_exactly_once() {
    let mut engine = make_engine(120);
    engine.set_speaking();
    engine.update_speaking_energy(0.9);
    for _ in 0..5 {
        engine.tick_energy(DT);
    }
    assert!(engine.smoothed_energy() > 0.5);
    drain(&mut engine);

    engine.end_speaking();
    assert!(engine.is_easing_out());
    for _ in 0..25 {
        engine.tick_energy(DT);
    }
    assert_eq!(engine.state(), VisualState::Idle);
    assert_eq!(engine.smoothed_energy(), 0.0);
    let events = drain(&mut engine);
    assert_eq!(
        events,
        vec![
            EngineEvent::EaseOutFinished,
            EngineEvent::StateChanged(VisualState::Idle)
        ]
    );
}

#[test]
fn end_speaking_outside_speaking_is_ignored() {
    let mut engine = make_engine(120);
    engine.set_thinking();
    engine.end_speaking();
    assert!(!engine.is_easing_out());
}

#[test]
fn smoothed_energy_carries_over_between_utterances() {
    let mut engine = make_engine(120);
    engine.set_speaking();
    engine.update_speaking_energy(1.0);
    for _ in 0..5 {
        engine.tick_energy(DT);
    }
    let carried = engine.smoothed_energy();
    assert!(carried > 0.5);

    engine.set_listening();
    assert_eq!(engine.smoothed_energy(), carried, "leaving Speaking keeps the value");
    engine.set_speaking();
    assert_eq!(engine.smoothed_energy(), carried, "re-entering Speaking must not reset");

    engine.set_idle();
    assert_eq!(engine.smoothed_energy(), 0.0, "Idle resets the envelope");
}

#[test]
fn late_amplitude_after_leaving_speaking_is_discarded() {
    let mut engine = make_engine(120);
    engine.set_speaking();
    engine.set_idle();
    engine.update_speaking_energy(0.9);
    engine.set_speaking();
    engine.tick_energy(DT);
    assert_eq!(
        engine.smoothed_energy(),
        0.0,
        "the stale write must not leak into the next utterance"
    );
}

#[test]
fn unknown_preset_is_an_error_and_changes_nothing() {
    let mut engine = make_engine(120);
    let before = engine.config().palette;
    let err = engine.apply_color_preset("sparkle").unwrap_err();
    assert!(matches!(err, EngineError::UnknownPreset(_)));
    assert_eq!(engine.config().palette, before);

    engine.apply_color_preset("ember").expect("built-in preset");
    assert_ne!(engine.config().palette, before);
}

struct FlakySink {
    calls: usize,
}

impl FrameSink for FlakySink {
    fn prepare(&mut self, _particle_count: usize) -> anyhow::Result<()> {
        self.calls += 1;
        if self.calls > 1 {
            anyhow::bail!("buffer allocation refused");
        }
        Ok(())
    }
    fn present(&mut self, _frame: &FrameSnapshot<'_>) {}
}

#[test]
fn sink_failure_keeps_the_previous_field_intact() {
    let settings = TestSettings(OrbSettings {
        color_preset: "aurora".to_owned(),
        orb_style: "soft".to_owned(),
        animation_speed: 1.0,
        particle_count: 120,
    });
    let mut engine =
        AuraEngine::new(&settings, Box::new(FlakySink { calls: 0 }), 42).expect("first prepare");

    let err = engine.recreate_particles(200);
    assert!(matches!(err, Err(EngineError::Sink(_))));
    assert_eq!(engine.particle_count(), 120, "old field must survive a sink failure");
    // the engine still ticks normally afterwards
    engine.tick_visual(DT);
    assert_eq!(engine.field().render().len(), 120);
}

#[derive(Clone, Default)]
struct Captured {
    state: Option<VisualState>,
    label: Option<&'static str>,
    particles: usize,
    glow_opacity: f32,
}

struct CaptureSink(Arc<Mutex<Captured>>);

impl FrameSink for CaptureSink {
    fn prepare(&mut self, _particle_count: usize) -> anyhow::Result<()> {
        Ok(())
    }
    fn present(&mut self, frame: &FrameSnapshot<'_>) {
        *self.0.lock().unwrap() = Captured {
            state: Some(frame.state),
            label: frame.label,
            particles: frame.particles.len(),
            glow_opacity: frame.glow.opacity,
        };
    }
}

fn make_capturing_engine() -> (AuraEngine, Arc<Mutex<Captured>>) {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let settings = TestSettings(OrbSettings {
        color_preset: "aurora".to_owned(),
        orb_style: "soft".to_owned(),
        animation_speed: 1.0,
        particle_count: 80,
    });
    let engine = AuraEngine::new(&settings, Box::new(CaptureSink(Arc::clone(&captured))), 42)
        .expect("engine construction");
    (engine, captured)
}

#[test]
fn snapshots_carry_the_label_only_when_enabled() {
    let (mut engine, captured) = make_capturing_engine();
    engine.tick_visual(DT);
    engine.present();
    {
        let frame = captured.lock().unwrap().clone();
        assert_eq!(frame.state, Some(VisualState::Idle));
        assert_eq!(frame.label, None);
        assert_eq!(frame.particles, 80);
    }

    engine.set_show_state_label(true);
    engine.set_thinking();
    engine.tick_visual(DT);
    engine.present();
    let frame = captured.lock().unwrap().clone();
    assert_eq!(frame.label, Some("Thinking"));
}

#[test]
fn glow_appears_while_speaking_and_fades_elsewhere() {
    let (mut engine, captured) = make_capturing_engine();
    engine.set_speaking();
    for _ in 0..100 {
        engine.tick_visual(DT);
    }
    engine.present();
    assert!(
        captured.lock().unwrap().glow_opacity > 0.3,
        "speaking should light the glow"
    );

    engine.set_thinking();
    for _ in 0..100 {
        engine.tick_visual(DT);
    }
    engine.present();
    assert!(
        captured.lock().unwrap().glow_opacity < 0.05,
        "glow should ease out after leaving Speaking"
    );
}
