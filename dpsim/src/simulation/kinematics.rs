//! Forward kinematics: angles to rod end points.

use super::states::{Geometry, NVec2, PhysicsState};

/// Cartesian end points of both rods for the current state
///
/// `rod1_end = pivot + L1 (sin a1, cos a1)` and
/// `rod2_end = rod1_end + L2 (sin a2, cos a2)`.
pub fn positions(state: &PhysicsState) -> Geometry {
    let rod1_end = state.pivot + state.rod_length1 * NVec2::new(state.angle1.sin(), state.angle1.cos());
    let rod2_end = rod1_end + state.rod_length2 * NVec2::new(state.angle2.sin(), state.angle2.cos());

    Geometry {
        pivot: state.pivot,
        rod1_end,
        rod2_end,
    }
}
