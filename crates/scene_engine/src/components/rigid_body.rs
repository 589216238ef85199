//! Rigid body integration

use crate::foundation::math::Vec3;
use crate::scene::TransformNode;
use serde::{Deserialize, Serialize};

/// Mass properties and integration parameters
///
/// Integration is semi-implicit Euler: the velocity is updated from gravity
/// and the accumulated force first, then the position from the new velocity.
/// The accumulated force is cleared after every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBody {
    /// Mass in kilograms; zero or less means immovable by forces
    pub mass: f32,
    /// Multiplier on world gravity
    pub gravity_scale: f32,
    /// Fraction of velocity lost per second
    pub linear_damping: f32,
    /// Bounciness applied by collision response, 0 = inelastic
    pub restitution: f32,
    /// Rotation axis scaled by radians per second
    pub angular_velocity: Vec3,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            restitution: 1.0,
            angular_velocity: Vec3::zeros(),
        }
    }
}

impl RigidBody {
    /// Body of the given mass with default parameters
    pub fn with_mass(mass: f32) -> Self {
        Self {
            mass,
            ..Default::default()
        }
    }

    /// Inverse mass, zero for immovable bodies
    pub fn inverse_mass(&self) -> f32 {
        if self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Advance the node by `delta_time` seconds
    pub fn integrate(&self, node: &mut TransformNode, gravity: Vec3, delta_time: f32) {
        let acceleration = node.force() * self.inverse_mass() + gravity * self.gravity_scale;
        let damping = (1.0 - self.linear_damping * delta_time).clamp(0.0, 1.0);
        let velocity = (node.velocity() + acceleration * delta_time) * damping;
        node.set_velocity(velocity);
        node.clear_force();

        if velocity != Vec3::zeros() {
            node.translate(velocity * delta_time);
        }

        let spin = self.angular_velocity.magnitude();
        if spin > 0.0 {
            node.rotate(spin * delta_time, self.angular_velocity);
        }
    }
}
