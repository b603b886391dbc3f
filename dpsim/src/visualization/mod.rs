pub mod pendulum_vis2d;
pub mod headless;
