//! Windowless run: steps the scenario a fixed number of frames as fast as
//! possible and logs how the energy evolves.

use std::time::Duration;

use bevy::app::{AppExit, ScheduleRunnerPlugin};
use bevy::log::LogPlugin;
use bevy::prelude::*;

use crate::simulation::integrator::mechanical_energy;
use crate::simulation::scenario::Scenario;

/// Frames between two progress lines
const LOG_EVERY: u64 = 600;

/// Progress of a headless run
#[derive(Resource, Debug, Default)]
struct HeadlessRun {
    frames: u64, // frames to run
    done: u64, // frames run so far
    energy_min: f64,
    energy_max: f64,
    energy_sum: f64,
    peak_velocity: f64, // largest |angular velocity| seen
}

impl HeadlessRun {
    fn new(frames: u64) -> Self {
        Self {
            frames,
            energy_min: f64::INFINITY,
            energy_max: f64::NEG_INFINITY,
            ..Default::default()
        }
    }

    fn record(&mut self, energy: f64, w1: f64, w2: f64) {
        self.done += 1;
        self.energy_min = self.energy_min.min(energy);
        self.energy_max = self.energy_max.max(energy);
        self.energy_sum += energy;
        self.peak_velocity = self.peak_velocity.max(w1.abs()).max(w2.abs());
    }
}

/// Run `frames` frames without a window; the returned exit code is an error
/// if the state became non-finite
pub fn run_headless(scenario: Scenario, frames: u64) -> AppExit {
    println!("run_headless: stepping {frames} frames");

    App::new()
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)),
            LogPlugin::default(),
        ))
        .insert_resource(scenario)
        .insert_resource(HeadlessRun::new(frames))
        .add_systems(Update, headless_step_system)
        .run()
}

fn headless_step_system(
    mut scenario: ResMut<Scenario>,
    mut run: ResMut<HeadlessRun>,
    mut exit: EventWriter<AppExit>,
) {
    if run.done >= run.frames {
        let mean = if run.done > 0 { run.energy_sum / run.done as f64 } else { 0.0 };
        info!(
            "done after {} frames: energy min {:.1} / mean {:.1} / max {:.1} (target {}), peak |w| {:.3}",
            run.done, run.energy_min, mean, run.energy_max, scenario.config.target_energy, run.peak_velocity
        );
        exit.send(AppExit::Success);
        return;
    }

    if let Err(e) = scenario.step_frame() {
        error!("frame {}: {e}", run.done);
        exit.send(AppExit::error());
        return;
    }

    let state = scenario.state;
    let energy = mechanical_energy(&state, &scenario.config);
    run.record(energy, state.angular_velocity1, state.angular_velocity2);

    if run.done % LOG_EVERY == 0 {
        info!(
            "frame {}: energy {:.1}, angles ({:.3}, {:.3}), w ({:.3}, {:.3})",
            run.done, energy, state.angle1, state.angle2, state.angular_velocity1, state.angular_velocity2
        );
    }
}
