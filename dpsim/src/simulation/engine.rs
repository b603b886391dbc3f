//! High-level runtime engine settings
//!
//! Playback controls the user changes while the animation runs:
//! pause state, simulation speed and the frame-rate cap.

/// Slowest and fastest playback speed; one sub-step per started unit of speed
pub const SPEED_RANGE: (f64, f64) = (0.1, 5.0);

#[derive(Debug, Clone)]
pub struct Engine {
    pub paused: bool, // true = integration suspended, state kept
    pub simulation_speed: f64, // playback speed multiplier
    pub target_fps: u32, // frame-rate cap
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            paused: false,
            simulation_speed: 1.0,
            target_fps: 60,
        }
    }
}

impl Engine {
    /// Flip between running and paused, returns the new pause state
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }
}
