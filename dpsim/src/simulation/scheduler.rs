//! Frame pacing for the animation loop
//!
//! - `substeps` splits one rendered frame into integration sub-steps
//! - `scaled_dt` applies the playback speed to a sub-step
//! - `FrameClock` caps the frame rate
//! - `FpsCounter` measures the frame rate actually achieved
//!
//! Times handed to the clock and the counter are in milliseconds.

/// Simulated time covered by one frame at speed 1
pub const BASE_FRAME_DT: f64 = 1.0 / 60.0;

/// Upper bound on the time a single sub-step may integrate over
pub const MAX_STEP_DT: f64 = 1.0 / 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubSteps {
    pub dt: f64, // size of each sub-step
    pub count: u32, // number of sub-steps in the frame
}

/// Split a frame of `base_frame_dt` into `ceil(requested_speed)` equal sub-steps
/// A non-positive or non-finite speed yields no sub-steps at all.
pub fn substeps(requested_speed: f64, base_frame_dt: f64) -> SubSteps {
    if !requested_speed.is_finite() || requested_speed <= 0.0 {
        return SubSteps { dt: 0.0, count: 0 };
    }

    let count = requested_speed.ceil() as u32;
    SubSteps {
        dt: base_frame_dt / f64::from(count),
        count,
    }
}

/// Time a sub-step actually integrates over at the given playback speed
pub fn scaled_dt(sub_dt: f64, speed: f64) -> f64 {
    (sub_dt * speed).min(MAX_STEP_DT)
}

/// Frame-rate cap driven by externally supplied timestamps
#[derive(Debug, Clone)]
pub struct FrameClock {
    target_fps: u32,
    last_frame_time: f64,
}

impl FrameClock {
    pub fn new(target_fps: u32, start_time: f64) -> Self {
        Self {
            target_fps: target_fps.max(1),
            last_frame_time: start_time,
        }
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Takes effect on the next call to [`FrameClock::tick`]
    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.target_fps = target_fps.max(1);
    }

    /// Minimum time between two frames, in milliseconds
    pub fn frame_interval(&self) -> f64 {
        1000.0 / f64::from(self.target_fps)
    }

    /// Decide whether a frame runs at `current_time`
    ///
    /// The overshoot past the interval is carried into the next frame so the
    /// average rate stays at the target even when the host ticks unevenly.
    pub fn tick(&mut self, current_time: f64) -> bool {
        let interval = self.frame_interval();
        let elapsed = current_time - self.last_frame_time;
        if elapsed < interval {
            return false;
        }

        self.last_frame_time = current_time - (elapsed % interval);
        true
    }
}

/// Counts frames and publishes a new rate once per second
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    fps: u32,
    frame_count: u32,
    last_update: f64,
}

impl FpsCounter {
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Count one frame; returns the fresh rate when a second has passed
    pub fn record(&mut self, current_time: f64) -> Option<u32> {
        self.frame_count += 1;
        if current_time - self.last_update < 1000.0 {
            return None;
        }

        self.fps = self.frame_count;
        self.frame_count = 0;
        self.last_update = current_time;
        Some(self.fps)
    }
}
