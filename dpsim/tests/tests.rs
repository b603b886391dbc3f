use std::f64::consts::PI;
use std::path::PathBuf;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dpsim::simulation::integrator::{euler_step, mechanical_energy};
use dpsim::simulation::kinematics::positions;
use dpsim::simulation::params::SimulationConfig;
use dpsim::simulation::scheduler::{scaled_dt, substeps, FpsCounter, FrameClock, BASE_FRAME_DT, MAX_STEP_DT};
use dpsim::simulation::states::{NVec2, PhysicsState};
use dpsim::simulation::trail::TrailBuffer;
use dpsim::{DpsimError, FrameOutcome, Scenario, ScenarioConfig, Settings, SettingsStore};

/// The default starting state: 0.85 pi / 0.55 pi at rest, rods 180 / 140
pub fn initial_state() -> PhysicsState {
    PhysicsState {
        angle1: PI * 0.85,
        angle2: PI * 0.55,
        angular_velocity1: 0.0,
        angular_velocity2: 0.0,
        rod_length1: 180.0,
        rod_length2: 140.0,
        pivot: NVec2::new(400.0, 320.0),
    }
}

/// Default physical constants for tests
pub fn test_config() -> SimulationConfig {
    SimulationConfig::default()
}

/// Scenario built from the built-in defaults, nothing persisted
pub fn default_scenario() -> Scenario {
    Scenario::build_scenario(ScenarioConfig::default(), &Settings::default())
}

fn assert_finite(state: &PhysicsState, step: usize) {
    assert!(state.is_finite(), "non-finite state at step {step}: {:?}", state);
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn euler_step_is_deterministic() {
    let config = test_config();
    let mut a = initial_state();
    let mut b = initial_state();

    for _ in 0..500 {
        euler_step(&mut a, BASE_FRAME_DT, &config).unwrap();
        euler_step(&mut b, BASE_FRAME_DT, &config).unwrap();
    }

    assert_eq!(a, b, "identical inputs diverged");
}

#[test]
fn velocities_never_exceed_clamp() {
    let config = test_config();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..2000 {
        let mut state = PhysicsState {
            angle1: rng.gen_range(-10.0..10.0),
            angle2: rng.gen_range(-10.0..10.0),
            angular_velocity1: rng.gen_range(-200.0..200.0),
            angular_velocity2: rng.gen_range(-200.0..200.0),
            rod_length1: rng.gen_range(20.0..300.0),
            rod_length2: rng.gen_range(20.0..300.0),
            pivot: NVec2::new(400.0, 320.0),
        };
        euler_step(&mut state, BASE_FRAME_DT, &config).unwrap();

        assert!(state.angular_velocity1.abs() <= config.max_velocity, "w1 = {}", state.angular_velocity1);
        assert!(state.angular_velocity2.abs() <= config.max_velocity, "w2 = {}", state.angular_velocity2);
    }
}

#[test]
fn rest_at_bottom_is_a_fixed_point() {
    let config = test_config();
    let mut state = PhysicsState {
        angle1: 0.0,
        angle2: 0.0,
        ..initial_state()
    };

    // energy is exactly zero here, so the correction uses the fallback denominator
    assert_eq!(mechanical_energy(&state, &config), 0.0);

    for step in 0..100 {
        euler_step(&mut state, BASE_FRAME_DT, &config).unwrap();
        assert_finite(&state, step);
    }

    assert_eq!(state.angle1, 0.0);
    assert_eq!(state.angle2, 0.0);
    assert_eq!(state.angular_velocity1, 0.0);
    assert_eq!(state.angular_velocity2, 0.0);
}

#[test]
fn long_run_stays_finite_and_bounded() {
    let config = SimulationConfig {
        g: 981.0,
        target_energy: 2500.0,
        ..test_config()
    };
    let mut state = initial_state();

    for step in 0..10_000 {
        euler_step(&mut state, 1.0 / 60.0, &config).unwrap();
        assert_finite(&state, step);
        assert!((-25.0..=25.0).contains(&state.angular_velocity1), "step {step}: w1 = {}", state.angular_velocity1);
        assert!((-25.0..=25.0).contains(&state.angular_velocity2), "step {step}: w2 = {}", state.angular_velocity2);
    }
}

#[test]
fn energy_rises_from_near_rest() {
    let config = test_config();
    let mut state = PhysicsState {
        angle1: 0.05,
        angle2: 0.05,
        ..initial_state()
    };
    let e0 = mechanical_energy(&state, &config);

    let mut late_sum = 0.0;
    for step in 0..6000 {
        euler_step(&mut state, BASE_FRAME_DT, &config).unwrap();
        if step >= 5000 {
            late_sum += mechanical_energy(&state, &config);
        }
    }
    let late_mean = late_sum / 1000.0;

    assert!(late_mean > 10.0 * e0, "energy did not grow: start {e0}, late mean {late_mean}");
    assert!(
        (late_mean - config.target_energy).abs() < (e0 - config.target_energy).abs(),
        "energy did not approach the target: start {e0}, late mean {late_mean}"
    );
}

#[test]
fn energy_falls_from_far_above_target() {
    let config = SimulationConfig {
        energy_adjust_rate: 0.01,
        ..test_config()
    };
    let mut state = PhysicsState {
        angular_velocity1: 10.0,
        angular_velocity2: -10.0,
        ..initial_state()
    };
    let e0 = mechanical_energy(&state, &config);
    assert!(e0 > 100.0 * config.target_energy);

    let mut late_sum = 0.0;
    for step in 0..5000 {
        euler_step(&mut state, BASE_FRAME_DT, &config).unwrap();
        if step >= 4000 {
            late_sum += mechanical_energy(&state, &config);
        }
    }
    let late_mean = late_sum / 1000.0;

    assert!(late_mean < e0 / 10.0, "energy did not fall: start {e0}, late mean {late_mean}");
    assert!((late_mean - config.target_energy).abs() < (e0 - config.target_energy).abs());
}

/// One frame of the pendulum written out term by term, every product
/// evaluated left to right
fn reference_step(s: &mut PhysicsState, dt: f64, c: &SimulationConfig) {
    let (a1, a2) = (s.angle1, s.angle2);
    let (w1, w2) = (s.angular_velocity1, s.angular_velocity2);
    let (l1, l2) = (s.rod_length1, s.rod_length2);
    let (m1, m2, g) = (c.mass1, c.mass2, c.g);

    let v1 = w1 * l1;
    let v2 = w2 * l2;
    let h1 = l1 * (1.0 - a1.cos());
    let h2 = h1 + l2 * (1.0 - a2.cos());
    let energy = 0.5 * m1 * v1 * v1 + 0.5 * m2 * v2 * v2 + (m1 * g * h1) / 60.0 + (m2 * g * h2) / 60.0;
    let ratio = c.target_energy / if energy == 0.0 { 1.0 } else { energy };
    let correction = 1.0 + (ratio - 1.0) * c.energy_adjust_rate;

    let torque1 = -g * (2.0 * m1 + m2) * a1.sin();
    let torque2 = -m2 * g * (a1 - 2.0 * a2).sin();
    let centrifugal = -2.0 * (a1 - a2).sin() * m2;
    let coupling = w2 * w2 * l2 + w1 * w1 * l1 * (a1 - a2).cos();
    let inertia1 = l1 * (2.0 * m1 + m2 - m2 * (2.0 * a1 - 2.0 * a2).cos());
    let alpha1 = (torque1 + torque2 + centrifugal * coupling) / inertia1;

    let coupling_angle = 2.0 * (a1 - a2).sin();
    let p1_energy = w1 * w1 * l1 * (m1 + m2);
    let gravity_torque = g * (m1 + m2) * a1.cos();
    let transferred = w2 * w2 * l2 * m2 * (a1 - a2).cos();
    let inertia2 = l2 * (2.0 * m1 + m2 - m2 * (2.0 * a1 - 2.0 * a2).cos());
    let alpha2 = (coupling_angle * (p1_energy + gravity_torque + transferred)) / inertia2;

    let nw1 = (w1 + alpha1 * dt) * c.damping * correction.sqrt();
    let nw2 = (w2 + alpha2 * dt) * c.damping * correction.sqrt();
    s.angular_velocity1 = nw1.min(c.max_velocity).max(-c.max_velocity);
    s.angular_velocity2 = nw2.min(c.max_velocity).max(-c.max_velocity);
    s.angle1 = a1 + s.angular_velocity1 * dt;
    s.angle2 = a2 + s.angular_velocity2 * dt;
}

#[test]
fn euler_step_follows_reference_trajectory() {
    let config = test_config();
    let mut state = initial_state();
    let mut reference = initial_state();

    for step in 0..300 {
        euler_step(&mut state, BASE_FRAME_DT, &config).unwrap();
        reference_step(&mut reference, BASE_FRAME_DT, &config);

        assert_relative_eq!(state.angle1, reference.angle1, epsilon = 1e-12);
        assert_relative_eq!(state.angle2, reference.angle2, epsilon = 1e-12);
        assert_relative_eq!(state.angular_velocity1, reference.angular_velocity1, epsilon = 1e-12);
        assert_relative_eq!(state.angular_velocity2, reference.angular_velocity2, epsilon = 1e-12);
        assert_finite(&state, step);
    }
}

#[test]
fn euler_step_matches_recorded_values() {
    let config = test_config();
    let mut state = initial_state();

    euler_step(&mut state, BASE_FRAME_DT, &config).unwrap();
    assert_relative_eq!(state.angle1, 2.669908423216051, epsilon = 1e-12);
    assert_relative_eq!(state.angle2, 1.7262914225225088, epsilon = 1e-12);
    assert_relative_eq!(state.angular_velocity1, -0.02671994011638442, epsilon = 1e-12);
    assert_relative_eq!(state.angular_velocity2, -0.09507221711265396, epsilon = 1e-12);

    for _ in 1..60 {
        euler_step(&mut state, BASE_FRAME_DT, &config).unwrap();
    }
    assert_relative_eq!(state.angle1, 0.9151969412471262, epsilon = 1e-9);
    assert_relative_eq!(state.angle2, 0.4474859743625352, epsilon = 1e-9);
    assert_relative_eq!(state.angular_velocity1, -4.725441627533449, epsilon = 1e-9);
    assert_relative_eq!(state.angular_velocity2, 2.2376168618002077, epsilon = 1e-9);
}

#[test]
fn non_finite_state_is_reported() {
    let config = test_config();
    let mut state = PhysicsState {
        angle1: f64::NAN,
        ..initial_state()
    };

    let result = euler_step(&mut state, BASE_FRAME_DT, &config);

    assert!(matches!(result, Err(DpsimError::NonFinite(_))), "got {:?}", result);
}

// ==================================================================================
// Kinematics tests
// ==================================================================================

#[test]
fn rods_keep_their_lengths() {
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..500 {
        let state = PhysicsState {
            angle1: rng.gen_range(-50.0..50.0),
            angle2: rng.gen_range(-50.0..50.0),
            rod_length1: rng.gen_range(1.0..400.0),
            rod_length2: rng.gen_range(1.0..400.0),
            ..initial_state()
        };
        let g = positions(&state);

        assert_relative_eq!(g.pivot, state.pivot);
        assert_relative_eq!((g.rod1_end - g.pivot).norm(), state.rod_length1, epsilon = 1e-9);
        assert_relative_eq!((g.rod2_end - g.rod1_end).norm(), state.rod_length2, epsilon = 1e-9);
    }
}

#[test]
fn zero_angle_hangs_down_and_angles_turn_clockwise() {
    let down = PhysicsState {
        angle1: 0.0,
        angle2: 0.0,
        ..initial_state()
    };
    let g = positions(&down);
    assert_relative_eq!(g.rod1_end, NVec2::new(400.0, 500.0), epsilon = 1e-9);
    assert_relative_eq!(g.rod2_end, NVec2::new(400.0, 640.0), epsilon = 1e-9);

    // a quarter turn swings link 1 to the right of the pivot
    let right = PhysicsState {
        angle1: PI / 2.0,
        angle2: 0.0,
        ..initial_state()
    };
    let g = positions(&right);
    assert_relative_eq!(g.rod1_end, NVec2::new(580.0, 320.0), epsilon = 1e-9);
}

// ==================================================================================
// Scheduler tests
// ==================================================================================

#[test]
fn speed_three_splits_frame_in_three() {
    let plan = substeps(3.0, 1.0 / 60.0);

    assert_eq!(plan.count, 3);
    assert_relative_eq!(plan.dt, (1.0 / 60.0) / 3.0, epsilon = 1e-15);
}

#[test]
fn fractional_speeds_round_up() {
    assert_eq!(substeps(0.5, BASE_FRAME_DT).count, 1);
    assert_relative_eq!(substeps(0.5, BASE_FRAME_DT).dt, BASE_FRAME_DT);
    assert_eq!(substeps(1.0, BASE_FRAME_DT).count, 1);
    assert_eq!(substeps(2.1, BASE_FRAME_DT).count, 3);
}

#[test]
fn non_positive_speed_runs_no_substeps() {
    for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let plan = substeps(speed, BASE_FRAME_DT);
        assert_eq!(plan.count, 0, "speed {speed}");
        assert_eq!(plan.dt, 0.0, "speed {speed}");
    }
}

#[test]
fn scaled_dt_is_capped() {
    let plan = substeps(3.0, BASE_FRAME_DT);
    assert_relative_eq!(scaled_dt(plan.dt, 3.0), BASE_FRAME_DT, epsilon = 1e-15);
    assert_relative_eq!(scaled_dt(BASE_FRAME_DT, 0.5), BASE_FRAME_DT / 2.0, epsilon = 1e-15);
    assert_eq!(scaled_dt(BASE_FRAME_DT, 3.0), MAX_STEP_DT);
}

#[test]
fn three_substeps_track_one_full_step() {
    let config = test_config();
    let plan = substeps(3.0, BASE_FRAME_DT);

    let mut reference = initial_state();
    euler_step(&mut reference, BASE_FRAME_DT, &config).unwrap();

    let mut split = initial_state();
    for _ in 0..plan.count {
        euler_step(&mut split, plan.dt, &config).unwrap();
    }

    assert!((reference.angle1 - split.angle1).abs() < 1e-3);
    assert!((reference.angle2 - split.angle2).abs() < 1e-3);
    assert!((reference.angular_velocity1 - split.angular_velocity1).abs() < 1e-3);
    assert!((reference.angular_velocity2 - split.angular_velocity2).abs() < 1e-3);
}

#[test]
fn scenario_frame_at_speed_three_runs_three_scaled_substeps() {
    let mut scenario = default_scenario();
    scenario.set_simulation_speed(3.0).unwrap();
    let start = scenario.state;
    scenario.step_frame().unwrap();

    // each sub-step covers (1/180) * 3 seconds with the clamp cut to a third
    let config = test_config().for_speed(3.0);
    let mut manual = start;
    for _ in 0..3 {
        euler_step(&mut manual, scaled_dt(BASE_FRAME_DT / 3.0, 3.0), &config).unwrap();
    }

    assert_eq!(scenario.state, manual);
}

#[test]
fn faster_playback_tightens_velocity_clamp() {
    let config = test_config();
    assert_eq!(config.for_speed(2.0).max_velocity, 12.5);
    assert_eq!(config.for_speed(0.5).max_velocity, 25.0);

    let mut scenario = default_scenario();
    scenario.set_simulation_speed(4.0).unwrap();
    for _ in 0..2000 {
        scenario.step_frame().unwrap();
        assert!(scenario.state.angular_velocity1.abs() <= 25.0 / 4.0);
        assert!(scenario.state.angular_velocity2.abs() <= 25.0 / 4.0);
    }
}

#[test]
fn frame_clock_gates_and_carries_remainder() {
    let mut clock = FrameClock::new(60, 0.0);

    assert!(!clock.tick(10.0));
    assert!(clock.tick(20.0)); // 3.33 ms overshoot carried
    assert!(!clock.tick(30.0));
    assert!(clock.tick(34.0));
}

#[test]
fn frame_clock_picks_up_new_cap() {
    let mut clock = FrameClock::new(60, 0.0);
    clock.set_target_fps(30);

    assert_eq!(clock.target_fps(), 30);
    assert_relative_eq!(clock.frame_interval(), 1000.0 / 30.0);
    assert!(!clock.tick(20.0));
    assert!(clock.tick(40.0));
}

#[test]
fn fps_counter_reports_once_per_second() {
    let mut counter = FpsCounter::default();

    for i in 0..10 {
        assert_eq!(counter.record(f64::from(i) * 100.0), None);
    }
    assert_eq!(counter.record(1000.0), Some(11));
    assert_eq!(counter.fps(), 11);
    assert_eq!(counter.record(1500.0), None);
}

// ==================================================================================
// Trail tests
// ==================================================================================

#[test]
fn trail_drops_oldest_sample() {
    let mut trail = TrailBuffer::new(3);
    for i in 0..5 {
        trail.push(NVec2::new(f64::from(i), 0.0));
    }

    assert_eq!(trail.len(), 3);
    let xs: Vec<f64> = trail.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![2.0, 3.0, 4.0]);

    trail.clear();
    assert!(trail.is_empty());
    assert_eq!(trail.capacity(), 3);
}

// ==================================================================================
// Scenario tests
// ==================================================================================

#[test]
fn default_scenario_uses_default_conditions() {
    let scenario = default_scenario();

    assert_relative_eq!(scenario.state.angle1, PI * 0.85);
    assert_relative_eq!(scenario.state.angle2, PI * 0.55);
    assert_eq!(scenario.state.rod_length1, 180.0);
    assert_eq!(scenario.state.rod_length2, 140.0);
    assert_eq!(scenario.length_scale(), 1.0);
    assert_eq!(scenario.engine().simulation_speed, 1.0);
    assert_eq!(scenario.engine().target_fps, 60);
    assert_eq!(scenario.style.color1, "#3498db");
    assert_eq!(scenario.trail_length, 500);
}

#[test]
fn saved_settings_override_scenario_file() {
    let settings = Settings {
        simulation_speed: Some(2.0),
        rod_length1: Some(200.0),
        rod_length2: Some(-5.0), // invalid, so the stored pair is ignored
        color1: Some("#00ff00".to_string()),
        dark_mode: Some(true),
        ..Default::default()
    };
    let scenario = Scenario::build_scenario(ScenarioConfig::default(), &settings);

    assert_eq!(scenario.engine().simulation_speed, 2.0);
    assert_eq!(scenario.base_lengths(), [180.0, 140.0]);
    assert_eq!(scenario.style.color1, "#00ff00");
    assert!(scenario.style.dark_mode);

    let valid = Settings {
        rod_length1: Some(200.0),
        ..Default::default()
    };
    let scenario = Scenario::build_scenario(ScenarioConfig::default(), &valid);
    assert_eq!(scenario.base_lengths(), [200.0, 140.0]);
    assert_eq!(scenario.state.rod_length1, 200.0);
}

#[test]
fn restart_restores_initial_conditions() {
    let mut scenario = default_scenario();
    for _ in 0..120 {
        scenario.step_frame().unwrap();
    }
    assert_ne!(scenario.state.angle1, PI * 0.85);

    scenario.restart();

    assert_eq!(scenario.state.angle1, scenario.initial.angle1);
    assert_eq!(scenario.state.angle2, scenario.initial.angle2);
    assert_eq!(scenario.state.angular_velocity1, 0.0);
    assert_eq!(scenario.state.angular_velocity2, 0.0);
    assert_eq!(scenario.state.rod_length1, 180.0);
}

#[test]
fn randomize_stays_within_ranges() {
    let mut scenario = default_scenario();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        scenario.step_frame().unwrap();
        scenario.randomize(&mut rng);

        let [l1, l2] = scenario.base_lengths();
        for l in [l1, l2] {
            assert!((50.0..300.0).contains(&l) && l.fract() == 0.0, "length {l}");
        }
        for r in [scenario.style.bob1_radius, scenario.style.bob2_radius] {
            assert!((5.0..30.0).contains(&r) && r.fract() == 0.0, "radius {r}");
        }
        for c in [&scenario.style.color1, &scenario.style.color2] {
            assert_eq!(c.len(), 7, "color {c}");
            assert!(c.starts_with('#') && c[1..].chars().all(|ch| ch.is_ascii_hexdigit()), "color {c}");
        }

        let speed = scenario.engine().simulation_speed;
        assert!((0.1..=2.0).contains(&speed), "speed {speed}");
        assert!(((speed * 10.0).round() - speed * 10.0).abs() < 1e-9, "speed {speed}");

        assert!((0.0..2.0 * PI).contains(&scenario.state.angle1));
        assert!((0.0..2.0 * PI).contains(&scenario.state.angle2));
        assert_eq!(scenario.state.angular_velocity1, 0.0);
        assert_eq!(scenario.state.angular_velocity2, 0.0);
        assert_eq!(scenario.state.rod_length1, l1);
    }
}

#[test]
fn reset_to_defaults_undoes_randomize() {
    let mut scenario = default_scenario();
    scenario.toggle_dark_mode();
    scenario.set_target_fps(144).unwrap();
    scenario.randomize(&mut StdRng::seed_from_u64(3));

    scenario.reset_to_defaults();

    assert_eq!(scenario.base_lengths(), [180.0, 140.0]);
    assert_eq!(scenario.state.rod_length2, 140.0);
    assert_eq!(scenario.engine().simulation_speed, 1.0);
    assert_eq!(scenario.engine().target_fps, 60);
    assert_eq!(scenario.style.color1, "#3498db");
    assert_eq!(scenario.style.color2, "#e74c3c");
    assert_eq!(scenario.style.bob1_radius, 15.0);
    assert_eq!(scenario.state.angle1, scenario.initial.angle1);
    assert!(scenario.style.dark_mode, "theme is kept");
}

#[test]
fn paused_frames_keep_state_and_do_not_catch_up() {
    let mut scenario = default_scenario();
    assert!(scenario.toggle_pause());
    let frozen = scenario.state;

    for i in 1..=10 {
        let outcome = scenario.advance(f64::from(i) * 100.0).unwrap();
        assert_eq!(outcome, FrameOutcome::Paused);
    }
    assert_eq!(scenario.state, frozen);

    assert!(!scenario.toggle_pause());
    let outcome = scenario.advance(1100.0).unwrap();

    // exactly one frame of motion after a second of pause
    let mut expected = frozen;
    euler_step(&mut expected, BASE_FRAME_DT, &test_config()).unwrap();
    assert_eq!(outcome, FrameOutcome::Stepped(positions(&expected)));
    assert_eq!(scenario.state, expected);
}

#[test]
fn frames_faster_than_cap_are_skipped() {
    let mut scenario = default_scenario();
    let before = scenario.state;

    assert_eq!(scenario.advance(5.0).unwrap(), FrameOutcome::Skipped);
    assert_eq!(scenario.state, before);
    assert!(matches!(scenario.advance(20.0).unwrap(), FrameOutcome::Stepped(_)));
}

#[test]
fn viewport_rescales_rods_and_moves_pivot() {
    let mut scenario = default_scenario();
    scenario.set_viewport(1600.0, 1000.0);

    assert_relative_eq!(scenario.length_scale(), 1.25);
    assert_relative_eq!(scenario.state.rod_length1, 225.0);
    assert_relative_eq!(scenario.state.rod_length2, 175.0);
    assert_relative_eq!(scenario.state.pivot, NVec2::new(800.0, 400.0));

    // live length change keeps the scale and the angles
    let angle1 = scenario.state.angle1;
    scenario.set_rod_lengths(100.0, 200.0).unwrap();
    assert_relative_eq!(scenario.state.rod_length1, 125.0);
    assert_relative_eq!(scenario.state.rod_length2, 250.0);
    assert_eq!(scenario.state.angle1, angle1);

    // degenerate sizes are ignored
    scenario.set_viewport(0.0, 500.0);
    assert_relative_eq!(scenario.length_scale(), 1.25);
}

#[test]
fn invalid_live_updates_are_rejected() {
    let mut scenario = default_scenario();

    assert!(scenario.set_target_fps(0).is_err());
    assert!(scenario.set_simulation_speed(-1.0).is_err());
    assert!(scenario.set_simulation_speed(f64::NAN).is_err());
    assert!(scenario.set_rod_lengths(0.0, 100.0).is_err());
    assert!(scenario.set_bob_radii(10.0, -1.0).is_err());
    assert!(scenario.set_colors("#123456".to_string(), "not a color".to_string()).is_err());

    assert_eq!(scenario.engine().target_fps, 60);
    assert_eq!(scenario.base_lengths(), [180.0, 140.0]);
    assert_eq!(scenario.style.color1, "#3498db");
}

#[test]
fn speed_outside_playback_range_is_rejected() {
    let mut scenario = default_scenario();

    for speed in [0.0, 0.05, 5.5, 1e9, f64::INFINITY] {
        assert!(scenario.set_simulation_speed(speed).is_err(), "speed {speed} accepted");
    }
    assert_eq!(scenario.engine().simulation_speed, 1.0);
    scenario.set_simulation_speed(5.0).unwrap();
    scenario.set_simulation_speed(0.1).unwrap();

    // a corrupted settings file cannot blow up the per-frame work
    let settings = Settings {
        simulation_speed: Some(1e9),
        ..Default::default()
    };
    let mut scenario = Scenario::build_scenario(ScenarioConfig::default(), &settings);
    assert_eq!(scenario.engine().simulation_speed, 1.0);

    let mut expected = scenario.state;
    euler_step(&mut expected, BASE_FRAME_DT, &test_config()).unwrap();
    scenario.step_frame().unwrap();
    assert_eq!(scenario.state, expected);
}

#[test]
fn frame_rate_setter_retunes_the_clock() {
    let mut scenario = default_scenario();
    scenario.set_target_fps(30).unwrap();
    assert_eq!(scenario.engine().target_fps, 30);

    // 33.3 ms between frames now
    assert_eq!(scenario.advance(20.0).unwrap(), FrameOutcome::Skipped);
    assert!(matches!(scenario.advance(34.0).unwrap(), FrameOutcome::Stepped(_)));

    scenario.set_paused(true);
    assert!(scenario.engine().paused);
    assert_eq!(scenario.advance(70.0).unwrap(), FrameOutcome::Paused);
}

// ==================================================================================
// Configuration tests
// ==================================================================================

fn scenarios_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios")
}

#[test]
fn default_scenario_file_matches_builtin_defaults() {
    let cfg = ScenarioConfig::from_yaml_file(&scenarios_dir().join("default.yaml")).unwrap();
    let builtin = ScenarioConfig::default();

    assert_eq!(cfg.physics, builtin.physics);
    assert_eq!(cfg.pendulum, builtin.pendulum);
    assert_eq!(cfg.engine, builtin.engine);
    assert_relative_eq!(cfg.initial.angle1, builtin.initial.angle1, epsilon = 1e-12);
    assert_relative_eq!(cfg.initial.angle2, builtin.initial.angle2, epsilon = 1e-12);
}

#[test]
fn every_bundled_scenario_loads() {
    let mut count = 0;
    for entry in std::fs::read_dir(scenarios_dir()).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().map_or(false, |e| e == "yaml") {
            let cfg = ScenarioConfig::from_yaml_file(&path);
            assert!(cfg.is_ok(), "{}: {:?}", path.display(), cfg.err());
            count += 1;
        }
    }
    assert!(count >= 1);
}

#[test]
fn partial_yaml_falls_back_to_defaults() {
    let cfg = ScenarioConfig::from_yaml_str("physics:\n  g: 500.0\nengine:\n  target_fps: 30\n").unwrap();

    assert_eq!(cfg.physics.g, 500.0);
    assert_eq!(cfg.physics.mass1, 2.0);
    assert_eq!(cfg.engine.target_fps, 30);
    assert_eq!(cfg.engine.simulation_speed, 1.0);
    assert_eq!(cfg.pendulum.rod_length1, 180.0);
}

#[test]
fn invalid_scenarios_are_rejected() {
    let bad = [
        "physics:\n  mass2: 0.0\n",
        "physics:\n  damping: 1.5\n",
        "physics:\n  energy_adjust_rate: -0.1\n",
        "pendulum:\n  rod_length1: -10.0\n",
        "pendulum:\n  color2: \"blue-ish\"\n",
        "pendulum:\n  trail_length: 0\n",
        "engine:\n  target_fps: 0\n",
        "engine:\n  simulation_speed: 0.0\n",
        "engine:\n  simulation_speed: 1000000000.0\n",
    ];

    for yaml in bad {
        let result = ScenarioConfig::from_yaml_str(yaml);
        assert!(matches!(result, Err(DpsimError::InvalidParameter(_))), "{yaml:?} gave {:?}", result);
    }

    assert!(matches!(ScenarioConfig::from_yaml_str("physics: [1, 2"), Err(DpsimError::Yaml(_))));
}

// ==================================================================================
// Settings tests
// ==================================================================================

#[test]
fn settings_survive_a_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.yaml"));

    // nothing saved yet
    assert_eq!(store.load().unwrap(), Settings::default());

    let mut scenario = default_scenario();
    scenario.randomize(&mut StdRng::seed_from_u64(9));
    store.save(&scenario.settings()).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, scenario.settings());

    // a fresh session picks the saved values up
    let restored = Scenario::build_scenario(ScenarioConfig::default(), &loaded);
    assert_eq!(restored.base_lengths(), scenario.base_lengths());
    assert_eq!(restored.style, scenario.style);
    assert_eq!(restored.engine().simulation_speed, scenario.engine().simulation_speed);

    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), Settings::default());
    store.clear().unwrap();
}
