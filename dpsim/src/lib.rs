pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;
pub mod error;

pub use simulation::states::{PhysicsState, Geometry, NVec2};
pub use simulation::params::{SimulationConfig, InitialConditions};
pub use simulation::integrator::{euler_step, mechanical_energy, energy_correction, angular_accelerations};
pub use simulation::kinematics::positions;
pub use simulation::scheduler::{substeps, scaled_dt, SubSteps, FrameClock, FpsCounter, BASE_FRAME_DT, MAX_STEP_DT};
pub use simulation::scenario::{Scenario, FrameOutcome, Style};
pub use simulation::trail::TrailBuffer;

pub use configuration::config::{ScenarioConfig, PhysicsConfig, InitialConfig, PendulumConfig, EngineConfig};
pub use configuration::settings::{Settings, SettingsStore};

pub use error::{DpsimError, Result};

pub use visualization::{pendulum_vis2d::run_2d, headless::run_headless};

pub use benchmark::benchmark::{bench_euler_step, bench_frame_speeds};
