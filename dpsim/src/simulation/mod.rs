pub mod states;
pub mod params;
pub mod engine;
pub mod integrator;
pub mod kinematics;
pub mod scheduler;
pub mod trail;
pub mod scenario;
