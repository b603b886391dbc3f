//! Core state types for the double pendulum.
//!
//! Defines:
//! - `PhysicsState` the two angles, angular velocities, rod lengths and pivot
//! - `Geometry` the derived cartesian end points of both rods
//!
//! Positions are in screen units with y growing downward, so an angle of
//! zero hangs straight down from the pivot.

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsState {
    pub angle1: f64, // angle of link 1 from the downward vertical (rad)
    pub angle2: f64, // angle of link 2 from the downward vertical (rad)
    pub angular_velocity1: f64, // rad/s
    pub angular_velocity2: f64, // rad/s
    pub rod_length1: f64, // effective (screen scaled) length of link 1
    pub rod_length2: f64, // effective (screen scaled) length of link 2
    pub pivot: NVec2, // anchor of link 1
}

impl PhysicsState {
    /// True when every scalar field and the pivot are finite
    pub fn is_finite(&self) -> bool {
        self.angle1.is_finite()
            && self.angle2.is_finite()
            && self.angular_velocity1.is_finite()
            && self.angular_velocity2.is_finite()
            && self.rod_length1.is_finite()
            && self.rod_length2.is_finite()
            && self.pivot.iter().all(|c| c.is_finite())
    }
}

/// Snapshot of the rod end points handed to the renderer.
/// Bob 1 sits at `rod1_end`, bob 2 at `rod2_end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub pivot: NVec2,
    pub rod1_end: NVec2,
    pub rod2_end: NVec2,
}
