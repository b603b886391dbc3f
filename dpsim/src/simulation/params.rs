//! Physical constants and initial conditions for the simulation
//!
//! `SimulationConfig` holds the constants the integrator reads every step:
//! - gravity and the two bob masses,
//! - damping applied to both angular velocities,
//! - target energy and adjustment rate of the energy correction,
//! - the angular velocity clamp
//!
//! `InitialConditions` is what restart puts back into the state.

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub g: f64, // gravity, in screen units
    pub target_energy: f64, // energy the correction pulls toward
    pub energy_adjust_rate: f64, // strength of the correction per step
    pub max_velocity: f64, // clamp for both angular velocities
    pub mass1: f64, // mass of bob 1
    pub mass2: f64, // mass of bob 2
    pub damping: f64, // multiplier applied to velocities every step
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            g: 9.81 * 100.0,
            target_energy: 2500.0,
            energy_adjust_rate: 0.0005,
            max_velocity: 25.0,
            mass1: 2.0,
            mass2: 1.0,
            damping: 0.9995,
        }
    }
}

impl SimulationConfig {
    /// Copy of this config with the velocity clamp tightened for playback
    /// faster than real time: `max_velocity / max(speed, 1)`
    pub fn for_speed(&self, speed: f64) -> Self {
        Self {
            max_velocity: self.max_velocity / speed.max(1.0),
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialConditions {
    pub angle1: f64,
    pub angle2: f64,
    pub angular_velocity1: f64,
    pub angular_velocity2: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            angle1: PI * 0.85,
            angle2: PI * 0.55,
            angular_velocity1: 0.0,
            angular_velocity2: 0.0,
        }
    }
}
