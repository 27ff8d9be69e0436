//! Headless native host for the aura engine.
//!
//! Walks the engine through its four states with a synthetic speech
//! amplitude feed, the way a hosting assistant UI would drive it, and logs a
//! digest of each second of frames. Rendering proper belongs to the host
//! application; the sink here only observes the renderable attributes.

use std::thread;
use std::time::Duration;

use aura_core::{
    AuraEngine, AuraVisual, DefaultSettings, EngineEvent, FrameSink, FrameSnapshot,
};

/// Sink that summarizes frames instead of drawing them.
#[derive(Default)]
struct LogSink {
    frames: u64,
}

impl FrameSink for LogSink {
    fn prepare(&mut self, particle_count: usize) -> anyhow::Result<()> {
        log::info!("sink sized for {particle_count} particles");
        Ok(())
    }

    fn present(&mut self, frame: &FrameSnapshot<'_>) {
        self.frames += 1;
        // one digest per second at ~30 Hz
        if self.frames % 30 != 0 {
            return;
        }
        let lead = &frame.particles[0];
        log::info!(
            "frame {}: state={:?} particles={} lead=({:.1},{:.1}) size={:.2} glow={:.2}{}",
            self.frames,
            frame.state,
            frame.particles.len(),
            lead.position[0],
            lead.position[1],
            lead.size,
            frame.glow.opacity,
            frame.label.map(|l| format!(" label={l}")).unwrap_or_default(),
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let engine = AuraEngine::new(&DefaultSettings, Box::new(LogSink::default()), rand::random())?;
    let mut visual = AuraVisual::start(
        engine,
        Some(Box::new(|event: EngineEvent| {
            log::info!("event: {event:?}");
        })),
    );
    visual.set_show_state_label(true);

    log::info!("listening...");
    visual.set_listening();
    thread::sleep(Duration::from_secs(2));

    log::info!("thinking...");
    visual.set_thinking();
    thread::sleep(Duration::from_secs(3));

    log::info!("speaking with a synthetic amplitude feed...");
    visual.set_speaking();
    let amplitude = visual.amplitude_handle();
    let feeder = thread::spawn(move || {
        // Roughly syllabic: bursts of loudness with short gaps, delivered
        // the way a playback callback would.
        for i in 0..60u32 {
            let t = i as f64 * 0.05;
            let burst = (t * 4.0).sin().max(0.0);
            amplitude.ingest(0.2 + 0.7 * burst);
            thread::sleep(Duration::from_millis(50));
        }
    });
    feeder.join().expect("amplitude feeder panicked");

    log::info!("ending speech, waiting for the ease-out to land on Idle...");
    visual.end_speaking();
    thread::sleep(Duration::from_secs(1));
    log::info!("state after ease-out: {:?}", visual.state());

    visual.apply_color_preset("ember")?;
    visual.set_particle_count(200);
    visual.set_animation_speed(1.6);
    for _ in 0..4 {
        visual.cycle_state();
        thread::sleep(Duration::from_millis(400));
    }

    thread::sleep(Duration::from_secs(1));
    visual.stop();
    Ok(())
}
