//! Build a fully-initialized pendulum scenario from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) plus the persisted `Settings` and
//! produces the runtime bundle `Scenario` containing:
//! - engine settings (`Engine`)
//! - physical constants (`SimulationConfig`) and initial conditions
//! - the pendulum state (`PhysicsState`)
//! - presentation style (`Style`)
//! - frame pacing (`FrameClock`, `FpsCounter`)
//!
//! The scenario is inserted into Bevy as a `Resource`; the physics system is
//! the only writer, the render systems read it after the physics system ran.

use std::f64::consts::TAU;

use bevy::log::{debug, info, warn};
use bevy::prelude::Resource;
use rand::Rng;

use crate::configuration::config::{validate_color, ScenarioConfig};
use crate::configuration::settings::Settings;
use crate::error::{DpsimError, Result};
use crate::simulation::engine::{Engine, SPEED_RANGE};
use crate::simulation::integrator::euler_step;
use crate::simulation::kinematics::positions;
use crate::simulation::params::{InitialConditions, SimulationConfig};
use crate::simulation::scheduler::{scaled_dt, substeps, FpsCounter, FrameClock, BASE_FRAME_DT};
use crate::simulation::states::{Geometry, NVec2, PhysicsState};

/// Viewport edge length at which configured rod lengths are used unscaled
pub const REFERENCE_SIZE: f64 = 800.0;

/// The pivot sits at `height / PIVOT_HEIGHT_DIVISOR` from the top
const PIVOT_HEIGHT_DIVISOR: f64 = 2.5;

/// Presentation-only parameters, never read by the physics
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub bob1_radius: f64,
    pub bob2_radius: f64,
    pub color1: String, // hex color of link 1
    pub color2: String, // hex color of link 2
    pub dark_mode: bool,
}

/// What a call to [`Scenario::advance`] did with the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Skipped, // frame-rate cap not reached yet
    Paused, // frame ran but integration is suspended
    Stepped(Geometry), // state advanced, geometry to render
}

/// Bevy resource representing a fully-initialized pendulum scenario
#[derive(Resource, Debug, Clone)]
pub struct Scenario {
    engine: Engine, // written through the setters so the clock stays in sync
    pub config: SimulationConfig,
    pub initial: InitialConditions,
    pub state: PhysicsState,
    pub style: Style,
    pub trail_length: usize,
    base_lengths: [f64; 2], // rod lengths at the reference viewport size
    length_scale: f64, // viewport size / reference size
    clock: FrameClock,
    fps: FpsCounter,
    defaults: ScenarioConfig, // what reset to defaults goes back to
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig, settings: &Settings) -> Self {
        let config = SimulationConfig::from(&cfg.physics);
        let initial = InitialConditions::from(&cfg.initial);

        let engine = Engine {
            simulation_speed: cfg.engine.simulation_speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1),
            target_fps: cfg.engine.target_fps,
            ..Default::default()
        };

        let style = Style {
            bob1_radius: cfg.pendulum.bob1_radius,
            bob2_radius: cfg.pendulum.bob2_radius,
            color1: cfg.pendulum.color1.clone(),
            color2: cfg.pendulum.color2.clone(),
            dark_mode: false,
        };

        // Initial state: reference viewport until the renderer reports its size
        let base_lengths = [cfg.pendulum.rod_length1, cfg.pendulum.rod_length2];
        let state = PhysicsState {
            angle1: initial.angle1,
            angle2: initial.angle2,
            angular_velocity1: initial.angular_velocity1,
            angular_velocity2: initial.angular_velocity2,
            rod_length1: base_lengths[0],
            rod_length2: base_lengths[1],
            pivot: pivot_for(REFERENCE_SIZE, REFERENCE_SIZE),
        };

        let mut scenario = Self {
            clock: FrameClock::new(engine.target_fps, 0.0),
            fps: FpsCounter::default(),
            engine,
            config,
            initial,
            state,
            style,
            trail_length: cfg.pendulum.trail_length,
            base_lengths,
            length_scale: 1.0,
            defaults: cfg,
        };
        scenario.apply_settings(settings);
        scenario
    }

    /// Overlay persisted values; anything out of range is logged and skipped
    fn apply_settings(&mut self, settings: &Settings) {
        if let Some(speed) = settings.simulation_speed {
            self.set_simulation_speed(speed).unwrap_or_else(|e| warn!("settings: {e}"));
        }
        if let Some(fps) = settings.target_fps {
            self.set_target_fps(fps).unwrap_or_else(|e| warn!("settings: {e}"));
        }
        let l1 = settings.rod_length1.unwrap_or(self.base_lengths[0]);
        let l2 = settings.rod_length2.unwrap_or(self.base_lengths[1]);
        self.set_rod_lengths(l1, l2).unwrap_or_else(|e| warn!("settings: {e}"));

        let r1 = settings.bob1_radius.unwrap_or(self.style.bob1_radius);
        let r2 = settings.bob2_radius.unwrap_or(self.style.bob2_radius);
        self.set_bob_radii(r1, r2).unwrap_or_else(|e| warn!("settings: {e}"));

        let c1 = settings.color1.clone().unwrap_or_else(|| self.style.color1.clone());
        let c2 = settings.color2.clone().unwrap_or_else(|| self.style.color2.clone());
        self.set_colors(c1, c2).unwrap_or_else(|e| warn!("settings: {e}"));

        if let Some(dark) = settings.dark_mode {
            self.style.dark_mode = dark;
        }
    }

    /// Snapshot of everything the user can change, for persistence
    pub fn settings(&self) -> Settings {
        Settings {
            simulation_speed: Some(self.engine.simulation_speed),
            target_fps: Some(self.engine.target_fps),
            color1: Some(self.style.color1.clone()),
            color2: Some(self.style.color2.clone()),
            rod_length1: Some(self.base_lengths[0]),
            rod_length2: Some(self.base_lengths[1]),
            bob1_radius: Some(self.style.bob1_radius),
            bob2_radius: Some(self.style.bob2_radius),
            dark_mode: Some(self.style.dark_mode),
        }
    }

    // =========================================================================================
    // Frame loop
    // =========================================================================================

    /// Run one host frame at `current_time` (ms)
    ///
    /// Frames arriving faster than the frame-rate cap are skipped. A paused
    /// scenario keeps its state and does not catch up after resuming.
    pub fn advance(&mut self, current_time: f64) -> Result<FrameOutcome> {
        if !self.clock.tick(current_time) {
            return Ok(FrameOutcome::Skipped);
        }
        if let Some(fps) = self.fps.record(current_time) {
            debug!("fps: {fps}");
        }
        if self.engine.paused {
            return Ok(FrameOutcome::Paused);
        }
        self.step_frame().map(FrameOutcome::Stepped)
    }

    /// Integrate one frame worth of sub-steps, ignoring the frame-rate cap
    pub fn step_frame(&mut self) -> Result<Geometry> {
        let speed = self.engine.simulation_speed;
        let plan = substeps(speed, BASE_FRAME_DT);
        let dt = scaled_dt(plan.dt, speed);
        let config = self.config.for_speed(speed);

        for _ in 0..plan.count {
            euler_step(&mut self.state, dt, &config)?;
        }

        Ok(positions(&self.state))
    }

    /// Playback controls; change them through the setters
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn geometry(&self) -> Geometry {
        positions(&self.state)
    }

    /// Frame rate measured over the last full second
    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    pub fn length_scale(&self) -> f64 {
        self.length_scale
    }

    /// Rod lengths before viewport scaling
    pub fn base_lengths(&self) -> [f64; 2] {
        self.base_lengths
    }

    // =========================================================================================
    // User commands
    // =========================================================================================

    /// Returns the new pause state
    pub fn toggle_pause(&mut self) -> bool {
        let paused = self.engine.toggle_pause();
        info!("{}", if paused { "paused" } else { "resumed" });
        paused
    }

    /// Suspend or resume integration
    pub fn set_paused(&mut self, paused: bool) {
        self.engine.paused = paused;
    }

    /// Put angles and angular velocities back to the initial conditions
    pub fn restart(&mut self) {
        self.state.angle1 = self.initial.angle1;
        self.state.angle2 = self.initial.angle2;
        self.state.angular_velocity1 = self.initial.angular_velocity1;
        self.state.angular_velocity2 = self.initial.angular_velocity2;
        info!("restarted");
    }

    /// Speed, frame-rate cap, colors, lengths and radii back to the scenario
    /// file, then restart. The theme is left alone.
    pub fn reset_to_defaults(&mut self) {
        let d = &self.defaults;
        self.engine.simulation_speed = d.engine.simulation_speed;
        self.engine.target_fps = d.engine.target_fps;
        self.clock.set_target_fps(d.engine.target_fps);
        self.style.color1 = d.pendulum.color1.clone();
        self.style.color2 = d.pendulum.color2.clone();
        self.style.bob1_radius = d.pendulum.bob1_radius;
        self.style.bob2_radius = d.pendulum.bob2_radius;
        self.base_lengths = [d.pendulum.rod_length1, d.pendulum.rod_length2];
        self.apply_lengths();
        self.restart();
    }

    /// New random lengths, radii, colors, speed and angles, velocities zeroed
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        self.style.color1 = random_color(rng);
        self.style.color2 = random_color(rng);

        self.base_lengths = [f64::from(rng.gen_range(50u32..300)), f64::from(rng.gen_range(50u32..300))];
        self.apply_lengths();

        self.style.bob1_radius = f64::from(rng.gen_range(5u32..30));
        self.style.bob2_radius = f64::from(rng.gen_range(5u32..30));

        // 0.1 to 2.0 in steps of 0.1
        let speed = rng.gen::<f64>() * 1.9 + 0.1;
        self.engine.simulation_speed = (speed * 10.0).round() / 10.0;

        self.state.angle1 = rng.gen_range(0.0..TAU);
        self.state.angle2 = rng.gen_range(0.0..TAU);
        self.state.angular_velocity1 = 0.0;
        self.state.angular_velocity2 = 0.0;

        info!(
            "randomized: lengths {:?}, speed {}x, angles ({:.3}, {:.3})",
            self.base_lengths, self.engine.simulation_speed, self.state.angle1, self.state.angle2
        );
    }

    /// Resize of the drawing area: rescale the rods and move the pivot
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        if !(width > 0.0 && height > 0.0) {
            return;
        }
        self.length_scale = width.min(height) / REFERENCE_SIZE;
        self.state.pivot = pivot_for(width, height);
        self.apply_lengths();
    }

    /// Base (unscaled) rod lengths; applied on the next step
    pub fn set_rod_lengths(&mut self, length1: f64, length2: f64) -> Result<()> {
        check_positive("rod length", length1)?;
        check_positive("rod length", length2)?;
        self.base_lengths = [length1, length2];
        self.apply_lengths();
        Ok(())
    }

    /// Playback speed within `SPEED_RANGE`; it sets the sub-step count per frame
    pub fn set_simulation_speed(&mut self, speed: f64) -> Result<()> {
        check_speed(speed)?;
        self.engine.simulation_speed = speed;
        Ok(())
    }

    pub fn set_target_fps(&mut self, target_fps: u32) -> Result<()> {
        if target_fps == 0 {
            return Err(DpsimError::InvalidParameter("target fps must be at least 1".to_string()));
        }
        self.engine.target_fps = target_fps;
        self.clock.set_target_fps(target_fps);
        Ok(())
    }

    pub fn set_bob_radii(&mut self, radius1: f64, radius2: f64) -> Result<()> {
        check_positive("bob radius", radius1)?;
        check_positive("bob radius", radius2)?;
        self.style.bob1_radius = radius1;
        self.style.bob2_radius = radius2;
        Ok(())
    }

    pub fn set_colors(&mut self, color1: String, color2: String) -> Result<()> {
        validate_color("color1", &color1)?;
        validate_color("color2", &color2)?;
        self.style.color1 = color1;
        self.style.color2 = color2;
        Ok(())
    }

    /// Returns the new theme
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.style.dark_mode = !self.style.dark_mode;
        self.style.dark_mode
    }

    fn apply_lengths(&mut self) {
        self.state.rod_length1 = self.base_lengths[0] * self.length_scale;
        self.state.rod_length2 = self.base_lengths[1] * self.length_scale;
    }
}

fn pivot_for(width: f64, height: f64) -> NVec2 {
    NVec2::new(width / 2.0, height / PIVOT_HEIGHT_DIVISOR)
}

/// Random `#rrggbb` color
pub fn random_color<R: Rng>(rng: &mut R) -> String {
    format!("#{:06x}", rng.gen_range(0u32..0xFF_FFFF))
}

/// Speed must be finite and within `SPEED_RANGE`
fn check_speed(speed: f64) -> Result<()> {
    let (min, max) = SPEED_RANGE;
    if (min..=max).contains(&speed) {
        Ok(())
    } else {
        Err(DpsimError::InvalidParameter(format!("simulation speed must be in [{min}, {max}], got {speed}")))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DpsimError::InvalidParameter(format!("{name} must be a positive finite number, got {value}")))
    }
}
