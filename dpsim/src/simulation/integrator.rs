//! Fixed-step time integrator for the double pendulum
//!
//! Provides the explicit Euler step driven by `SimulationConfig`, plus the
//! energy and acceleration terms it is built from. The step is first order
//! on purpose: damping, the energy correction and the velocity clamp keep
//! the motion bounded, not the integrator order.
//!
//! Rod lengths and masses must be positive finite reals. Nothing here checks
//! that; `ScenarioConfig::validate` does before a scenario is built.

use super::params::SimulationConfig;
use super::states::PhysicsState;
use crate::error::{DpsimError, Result};

/// Empirical scale applied to both potential energy terms
const POTENTIAL_SCALE: f64 = 60.0;

/// Instantaneous mechanical energy of the pendulum
///
/// Kinetic energy of both bobs from their linear speeds plus gravitational
/// potential of both bobs measured from the pivot, each potential term
/// divided by 60.
pub fn mechanical_energy(state: &PhysicsState, config: &SimulationConfig) -> f64 {
    let (m1, m2, g) = (config.mass1, config.mass2, config.g);

    // linear speeds of the bobs
    let velocity1 = state.angular_velocity1 * state.rod_length1;
    let velocity2 = state.angular_velocity2 * state.rod_length2;

    // heights above the lowest reachable point of each bob
    let height1 = state.rod_length1 * (1.0 - state.angle1.cos());
    let height2 = height1 + state.rod_length2 * (1.0 - state.angle2.cos());

    0.5 * m1 * velocity1 * velocity1
        + 0.5 * m2 * velocity2 * velocity2
        + (m1 * g * height1) / POTENTIAL_SCALE
        + (m2 * g * height2) / POTENTIAL_SCALE
}

/// Multiplier that nudges the energy toward `config.target_energy`
/// `1 + (target / E - 1) * rate`, with `E` replaced by 1 when it is exactly zero
pub fn energy_correction(energy: f64, config: &SimulationConfig) -> f64 {
    let safe_energy = if energy == 0.0 { 1.0 } else { energy };
    let energy_ratio = config.target_energy / safe_energy;
    1.0 + (energy_ratio - 1.0) * config.energy_adjust_rate
}

/// Angular accelerations `(alpha1, alpha2)` of both links
pub fn angular_accelerations(state: &PhysicsState, config: &SimulationConfig) -> (f64, f64) {
    let (m1, m2, g) = (config.mass1, config.mass2, config.g);
    let (a1, a2) = (state.angle1, state.angle2);
    let (w1, w2) = (state.angular_velocity1, state.angular_velocity2);
    let (l1, l2) = (state.rod_length1, state.rod_length2);

    // shared by both inertia terms
    let inertia_bracket = 2.0 * m1 + m2 - m2 * (2.0 * a1 - 2.0 * a2).cos();

    // link 1
    let torque1 = -g * (2.0 * m1 + m2) * a1.sin();
    let torque2 = -m2 * g * (a1 - 2.0 * a2).sin();
    let centrifugal_force = -2.0 * (a1 - a2).sin() * m2;
    let coupling_term = w2 * w2 * l2 + w1 * w1 * l1 * (a1 - a2).cos();
    let inertia1 = l1 * inertia_bracket;
    let alpha1 = (torque1 + torque2 + centrifugal_force * coupling_term) / inertia1;

    // link 2
    let coupling_angle = 2.0 * (a1 - a2).sin();
    let pendulum1_energy = w1 * w1 * l1 * (m1 + m2);
    let gravity_torque = g * (m1 + m2) * a1.cos();
    let transferred_energy = w2 * w2 * l2 * m2 * (a1 - a2).cos();
    let inertia2 = l2 * inertia_bracket;
    let alpha2 = (coupling_angle * (pendulum1_energy + gravity_torque + transferred_energy)) / inertia2;

    (alpha1, alpha2)
}

/// Advance the pendulum by one step of `dt` seconds using explicit Euler
///
/// Velocities are updated first, then damped and scaled by the square root of
/// the energy correction, then clamped to `±config.max_velocity`. Angles are
/// advanced with the new velocities. Returns `DpsimError::NonFinite` if the
/// resulting state holds a NaN or infinity; the state is left as computed.
pub fn euler_step(state: &mut PhysicsState, dt: f64, config: &SimulationConfig) -> Result<()> {
    let energy = mechanical_energy(state, config);
    let sqrt_correction = energy_correction(energy, config).sqrt();

    let (alpha1, alpha2) = angular_accelerations(state, config);

    // v_n+1 = (v_n + a_n * dt) * damping * sqrt(correction), multiplied left to
    // right so trajectories reproduce bit for bit
    let w1 = (state.angular_velocity1 + alpha1 * dt) * config.damping * sqrt_correction;
    let w2 = (state.angular_velocity2 + alpha2 * dt) * config.damping * sqrt_correction;

    state.angular_velocity1 = w1.clamp(-config.max_velocity, config.max_velocity);
    state.angular_velocity2 = w2.clamp(-config.max_velocity, config.max_velocity);

    // x_n+1 = x_n + v_n+1 * dt
    state.angle1 += state.angular_velocity1 * dt;
    state.angle2 += state.angular_velocity2 * dt;

    if state.is_finite() {
        Ok(())
    } else {
        Err(DpsimError::NonFinite(*state))
    }
}
