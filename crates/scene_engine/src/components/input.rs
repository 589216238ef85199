//! Input-driven movement

use crate::foundation::math::Vec3;
use crate::input::{InputState, KeyCode};
use crate::scene::TransformNode;
use serde::{Deserialize, Serialize};

/// Reacts to the frame's input snapshot
pub trait InputController {
    /// Called once when the owning entity is initialized
    fn init(&mut self, _node: &TransformNode) {}

    /// Apply this frame's input to the node
    fn handle_input(&mut self, node: &mut TransformNode, input: &InputState, delta_time: f32);
}

/// Free-flying movement: WASD in the XZ plane, Space/Shift vertical, mouse X yaws
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyController {
    /// Units per second
    pub speed: f32,
    /// Radians per unit of horizontal mouse motion
    pub turn_rate: f32,
}

impl Default for FlyController {
    fn default() -> Self {
        Self {
            speed: 5.0,
            turn_rate: 0.002,
        }
    }
}

impl FlyController {
    /// Create a controller moving at `speed` units per second
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            ..Default::default()
        }
    }

    fn direction(input: &InputState) -> Vec3 {
        let bindings = [
            (KeyCode::W, Vec3::new(0.0, 0.0, -1.0)),
            (KeyCode::S, Vec3::new(0.0, 0.0, 1.0)),
            (KeyCode::A, Vec3::new(-1.0, 0.0, 0.0)),
            (KeyCode::D, Vec3::new(1.0, 0.0, 0.0)),
            (KeyCode::Space, Vec3::new(0.0, 1.0, 0.0)),
            (KeyCode::LeftShift, Vec3::new(0.0, -1.0, 0.0)),
        ];
        bindings
            .iter()
            .filter(|(key, _)| input.is_key_pressed(*key))
            .fold(Vec3::zeros(), |acc, (_, dir)| acc + dir)
    }
}

impl InputController for FlyController {
    fn handle_input(&mut self, node: &mut TransformNode, input: &InputState, delta_time: f32) {
        let direction = Self::direction(input);
        if let Some(direction) = direction.try_normalize(f32::EPSILON) {
            // Move relative to the current heading
            let heading = node.local_orientation() * direction;
            node.translate(heading * self.speed * delta_time);
        }

        let yaw = -input.mouse_delta().0 * self.turn_rate;
        if yaw != 0.0 {
            node.rotate(yaw, Vec3::y());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forward_moves_along_negative_z() {
        let mut node = TransformNode::default();
        let mut input = InputState::default();
        input.press(KeyCode::W);

        let mut controller = FlyController::new(2.0);
        controller.handle_input(&mut node, &input, 0.5);
        assert_relative_eq!(node.local_position(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut node = TransformNode::default();
        let mut input = InputState::default();
        input.press(KeyCode::A);
        input.press(KeyCode::D);

        FlyController::default().handle_input(&mut node, &input, 1.0);
        assert_eq!(node.local_position(), Vec3::zeros());
        assert!(!node.clone().take_changed());
    }

    #[test]
    fn test_mouse_yaw() {
        let mut node = TransformNode::default();
        let mut input = InputState::default();
        input.set_mouse_delta(100.0, 0.0);

        FlyController::default().handle_input(&mut node, &input, 1.0);
        assert!(node.local_orientation().angle() > 0.0);
    }
}
