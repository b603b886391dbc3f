//! Configuration types for loading pendulum scenarios from YAML.
//!
//! A scenario consists of:
//!
//! - [`PhysicsConfig`]   – constants read by the integrator every step
//! - [`InitialConfig`]   – angles and angular velocities restored on restart
//! - [`PendulumConfig`]  – rod lengths, bob radii, colors and trail length
//! - [`EngineConfig`]    – playback speed and frame-rate cap
//! - [`ScenarioConfig`]  – top-level wrapper used to load a scenario from YAML
//!
//! Every section and field is optional; anything left out takes the value of
//! the built-in default scenario.
//!
//! # YAML format
//!
//! ```yaml
//! physics:
//!   g: 981.0                  # gravity in screen units
//!   target_energy: 2500.0
//!   energy_adjust_rate: 0.0005
//!   max_velocity: 25.0        # rad/s clamp
//!   mass1: 2.0
//!   mass2: 1.0
//!   damping: 0.9995
//!
//! initial:
//!   angle1: 2.670353755551324 # 0.85 pi
//!   angle2: 1.727875959474386 # 0.55 pi
//!   angular_velocity1: 0.0
//!   angular_velocity2: 0.0
//!
//! pendulum:
//!   rod_length1: 180.0        # at the 800px reference viewport
//!   rod_length2: 140.0
//!   bob1_radius: 15.0
//!   bob2_radius: 15.0
//!   color1: "#3498db"
//!   color2: "#e74c3c"
//!   trail_length: 500
//!
//! engine:
//!   simulation_speed: 1.0    # 0.1 to 5.0
//!   target_fps: 60
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bevy::color::Srgba;
use serde::{Deserialize, Serialize};

use crate::error::{DpsimError, Result};
use crate::simulation::engine::SPEED_RANGE;
use crate::simulation::params::{InitialConditions, SimulationConfig};

/// Constants of the equations of motion and the energy regulation
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub g: f64,                  // gravity
    pub target_energy: f64,      // energy the correction pulls toward
    pub energy_adjust_rate: f64, // correction strength, in [0, 1]
    pub max_velocity: f64,       // angular velocity clamp at speed 1
    pub mass1: f64,              // mass of bob 1
    pub mass2: f64,              // mass of bob 2
    pub damping: f64,            // velocity multiplier per step, in (0, 1]
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        SimulationConfig::default().into()
    }
}

impl From<SimulationConfig> for PhysicsConfig {
    fn from(c: SimulationConfig) -> Self {
        Self {
            g: c.g,
            target_energy: c.target_energy,
            energy_adjust_rate: c.energy_adjust_rate,
            max_velocity: c.max_velocity,
            mass1: c.mass1,
            mass2: c.mass2,
            damping: c.damping,
        }
    }
}

impl From<&PhysicsConfig> for SimulationConfig {
    fn from(c: &PhysicsConfig) -> Self {
        Self {
            g: c.g,
            target_energy: c.target_energy,
            energy_adjust_rate: c.energy_adjust_rate,
            max_velocity: c.max_velocity,
            mass1: c.mass1,
            mass2: c.mass2,
            damping: c.damping,
        }
    }
}

/// Initial angles (rad) and angular velocities (rad/s)
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct InitialConfig {
    pub angle1: f64,
    pub angle2: f64,
    pub angular_velocity1: f64,
    pub angular_velocity2: f64,
}

impl Default for InitialConfig {
    fn default() -> Self {
        let ic = InitialConditions::default();
        Self {
            angle1: ic.angle1,
            angle2: ic.angle2,
            angular_velocity1: ic.angular_velocity1,
            angular_velocity2: ic.angular_velocity2,
        }
    }
}

impl From<&InitialConfig> for InitialConditions {
    fn from(c: &InitialConfig) -> Self {
        Self {
            angle1: c.angle1,
            angle2: c.angle2,
            angular_velocity1: c.angular_velocity1,
            angular_velocity2: c.angular_velocity2,
        }
    }
}

/// Shape and look of the pendulum
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PendulumConfig {
    pub rod_length1: f64,    // length of link 1 at the reference viewport size
    pub rod_length2: f64,    // length of link 2 at the reference viewport size
    pub bob1_radius: f64,    // drawn radius of bob 1
    pub bob2_radius: f64,    // drawn radius of bob 2
    pub color1: String,      // hex color of link 1, bob 1 and its trail
    pub color2: String,      // hex color of link 2, bob 2 and its trail
    pub trail_length: usize, // samples kept per trail
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            rod_length1: 180.0,
            rod_length2: 140.0,
            bob1_radius: 15.0,
            bob2_radius: 15.0,
            color1: "#3498db".to_string(),
            color2: "#e74c3c".to_string(),
            trail_length: 500,
        }
    }
}

/// Playback settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub simulation_speed: f64, // playback speed multiplier
    pub target_fps: u32,       // frame-rate cap
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulation_speed: 1.0,
            target_fps: 60,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    pub physics: PhysicsConfig,   // constants of the motion
    pub initial: InitialConfig,   // state restored on restart
    pub pendulum: PendulumConfig, // lengths, radii, colors, trail length
    pub engine: EngineConfig,     // speed and frame-rate cap
}

impl ScenarioConfig {
    /// Read and validate a scenario file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let cfg: ScenarioConfig = serde_yaml::from_reader(reader)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a scenario from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: ScenarioConfig = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the integrator assumes never happen
    pub fn validate(&self) -> Result<()> {
        let p = &self.physics;
        positive("physics.g", p.g)?;
        positive("physics.mass1", p.mass1)?;
        positive("physics.mass2", p.mass2)?;
        positive("physics.max_velocity", p.max_velocity)?;
        finite("physics.target_energy", p.target_energy)?;
        if !(0.0..=1.0).contains(&p.energy_adjust_rate) {
            return Err(invalid(format!("physics.energy_adjust_rate must be in [0, 1], got {}", p.energy_adjust_rate)));
        }
        if !(p.damping > 0.0 && p.damping <= 1.0) {
            return Err(invalid(format!("physics.damping must be in (0, 1], got {}", p.damping)));
        }

        let i = &self.initial;
        finite("initial.angle1", i.angle1)?;
        finite("initial.angle2", i.angle2)?;
        finite("initial.angular_velocity1", i.angular_velocity1)?;
        finite("initial.angular_velocity2", i.angular_velocity2)?;

        let pc = &self.pendulum;
        positive("pendulum.rod_length1", pc.rod_length1)?;
        positive("pendulum.rod_length2", pc.rod_length2)?;
        positive("pendulum.bob1_radius", pc.bob1_radius)?;
        positive("pendulum.bob2_radius", pc.bob2_radius)?;
        validate_color("pendulum.color1", &pc.color1)?;
        validate_color("pendulum.color2", &pc.color2)?;
        if pc.trail_length == 0 {
            return Err(invalid("pendulum.trail_length must be at least 1".to_string()));
        }

        let (min_speed, max_speed) = SPEED_RANGE;
        if !(min_speed..=max_speed).contains(&self.engine.simulation_speed) {
            return Err(invalid(format!(
                "engine.simulation_speed must be in [{min_speed}, {max_speed}], got {}",
                self.engine.simulation_speed
            )));
        }
        if self.engine.target_fps == 0 {
            return Err(invalid("engine.target_fps must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Check a `#rrggbb` style color string
pub fn validate_color(name: &str, color: &str) -> Result<()> {
    Srgba::hex(color)
        .map(|_| ())
        .map_err(|e| invalid(format!("{name} is not a hex color ({color}): {e}")))
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be a positive finite number, got {value}")))
    }
}

fn finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite, got {value}")))
    }
}

fn invalid(msg: String) -> DpsimError {
    DpsimError::InvalidParameter(msg)
}
