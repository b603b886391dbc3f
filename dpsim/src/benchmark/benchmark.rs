use std::time::Instant;

use crate::configuration::config::ScenarioConfig;
use crate::configuration::settings::Settings;
use crate::simulation::integrator::euler_step;
use crate::simulation::params::{InitialConditions, SimulationConfig};
use crate::simulation::scenario::Scenario;
use crate::simulation::scheduler::BASE_FRAME_DT;
use crate::simulation::states::{NVec2, PhysicsState};

/// Helper to build the default starting state
fn make_state() -> PhysicsState {
    let ic = InitialConditions::default();
    PhysicsState {
        angle1: ic.angle1,
        angle2: ic.angle2,
        angular_velocity1: ic.angular_velocity1,
        angular_velocity2: ic.angular_velocity2,
        rod_length1: 180.0,
        rod_length2: 140.0,
        pivot: NVec2::new(400.0, 320.0),
    }
}

/// Raw cost of a single Euler step
pub fn bench_euler_step() {
    let counts = [1_000, 10_000, 100_000, 1_000_000];
    let config = SimulationConfig::default();

    for steps in counts {
        let mut state = make_state();

        // Warm up
        if let Err(e) = euler_step(&mut state, BASE_FRAME_DT, &config) {
            println!("warm-up step failed: {e}");
            return;
        }

        let t0 = Instant::now();
        for _ in 0..steps {
            if let Err(e) = euler_step(&mut state, BASE_FRAME_DT, &config) {
                println!("steps = {steps}: aborted, {e}");
                return;
            }
        }
        let per_step = t0.elapsed().as_secs_f64() / steps as f64;

        println!("steps = {steps:8}, per step = {:10.3} ns", per_step * 1e9);
    }
}

/// Cost of a whole frame (sub-step loop plus kinematics) per playback speed
/// Paste output directly into a spreadsheet to graph
pub fn bench_frame_speeds() {
    let frames = 100_000;

    println!("speed,substeps,us_per_frame");

    for tenths in (5..=50).step_by(5) {
        let speed = f64::from(tenths) / 10.0;

        let mut scenario = Scenario::build_scenario(ScenarioConfig::default(), &Settings::default());
        if let Err(e) = scenario.set_simulation_speed(speed) {
            println!("{speed}: {e}");
            continue;
        }

        let t0 = Instant::now();
        for _ in 0..frames {
            if let Err(e) = scenario.step_frame() {
                println!("{speed}: aborted, {e}");
                break;
            }
        }
        let us_per_frame = t0.elapsed().as_secs_f64() * 1e6 / f64::from(frames);

        println!("{},{},{:.4}", speed, speed.ceil(), us_per_frame);
    }
}
