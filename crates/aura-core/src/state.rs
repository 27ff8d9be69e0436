//! The four-state machine driving the visual targets.
//!
//! States pin target parameters; the scheduler eases the live values toward
//! them over many ticks, which is what gives transitions their slow,
//! breathing character.

use crate::color::ColorMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisualState {
    Idle,
    Listening,
    Thinking,
    Speaking,
}

impl VisualState {
    /// Successor in the fixed cycle Idle → Listening → Thinking → Speaking → Idle.
    pub fn next(self) -> Self {
        match self {
            VisualState::Idle => VisualState::Listening,
            VisualState::Listening => VisualState::Thinking,
            VisualState::Thinking => VisualState::Speaking,
            VisualState::Speaking => VisualState::Idle,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VisualState::Idle => "Idle",
            VisualState::Listening => "Listening",
            VisualState::Thinking => "Thinking",
            VisualState::Speaking => "Speaking",
        }
    }
}

/// Target parameters a state pins for the easing loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateTargets {
    pub convergence: f32,
    pub orbit_speed: f32,
    pub color_mode: ColorMode,
    pub glow: bool,
}

impl StateTargets {
    pub fn for_state(state: VisualState) -> Self {
        match state {
            VisualState::Idle => Self {
                convergence: 0.0,
                orbit_speed: 1.0,
                color_mode: ColorMode::Primary,
                glow: false,
            },
            VisualState::Listening => Self {
                convergence: 0.3,
                orbit_speed: 0.6,
                color_mode: ColorMode::Primary,
                glow: false,
            },
            VisualState::Thinking => Self {
                convergence: 0.85,
                orbit_speed: 3.0,
                color_mode: ColorMode::Alternate,
                glow: false,
            },
            VisualState::Speaking => Self {
                convergence: 0.2,
                orbit_speed: 1.3,
                color_mode: ColorMode::Primary,
                glow: true,
            },
        }
    }
}

/// Holds the current state and its targets. Setting the same state twice is
/// a no-op beyond re-pinning identical targets.
#[derive(Clone, Copy, Debug)]
pub struct StateController {
    state: VisualState,
    targets: StateTargets,
}

impl StateController {
    pub fn new() -> Self {
        Self {
            state: VisualState::Idle,
            targets: StateTargets::for_state(VisualState::Idle),
        }
    }

    pub fn state(&self) -> VisualState {
        self.state
    }

    pub fn targets(&self) -> StateTargets {
        self.targets
    }

    /// Pin the targets for `new`. Returns the previous state so callers can
    /// react to edges (energy reset, ingestion gating).
    pub fn set_state(&mut self, new: VisualState) -> VisualState {
        let prev = self.state;
        self.state = new;
        self.targets = StateTargets::for_state(new);
        if prev != new {
            log::debug!("visual state {} -> {}", prev.label(), new.label());
        }
        prev
    }

    pub fn cycle(&mut self) -> VisualState {
        self.set_state(self.state.next())
    }
}

impl Default for StateController {
    fn default() -> Self {
        Self::new()
    }
}
