//! Renderer contract
//!
//! Drawing happens outside the engine. Each frame the render stage builds a
//! [`FrameContext`] (view and projection from the active camera) and hands
//! every visible entity to the host [`Renderer`] as a [`RenderView`].

use crate::components::{Capabilities, Graphics, Particle};
use crate::foundation::math::{utils, Mat4};
use crate::scene::{EntityId, EntityKind, Scene};
use serde::{Deserialize, Serialize};

/// Perspective projection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Width over height
    pub aspect: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl ProjectionConfig {
    /// Projection matrix
    pub fn matrix(&self) -> Mat4 {
        utils::perspective(utils::deg_to_rad(self.fov_y_degrees), self.aspect, self.near, self.far)
    }
}

/// Per-frame data shared by every draw
#[derive(Debug, Clone, PartialEq)]
pub struct FrameContext {
    /// Camera entity the view was taken from
    pub camera: Option<EntityId>,
    /// World to view transform
    pub view: Mat4,
    /// View to clip transform
    pub projection: Mat4,
    /// Seconds covered by this frame
    pub delta_time: f32,
    /// Frames run so far, starting at zero
    pub frame_index: u64,
}

impl FrameContext {
    /// Build the context from the first enabled camera of `scene`
    ///
    /// Without a camera (or with a singular camera transform) the view is
    /// the identity.
    pub fn from_scene(scene: &Scene, projection: &ProjectionConfig, delta_time: f32, frame_index: u64) -> Self {
        let camera = scene.ids().find(|&id| {
            scene
                .entity(id)
                .is_some_and(|entity| entity.is_enabled() && entity.kind() == EntityKind::Camera)
        });
        let view = camera
            .and_then(|id| scene.world_matrix(id))
            .and_then(|world| world.try_inverse())
            .unwrap_or_else(Mat4::identity);
        Self {
            camera,
            view,
            projection: projection.matrix(),
            delta_time,
            frame_index,
        }
    }
}

/// One entity to draw
#[derive(Debug, Clone, Copy)]
pub struct RenderView<'a> {
    /// Entity being drawn
    pub entity: EntityId,
    /// Entity identifier
    pub name: &'a str,
    /// Current world transform
    pub world: Mat4,
    /// World transform of the previous frame, for motion blur
    pub previous_world: Mat4,
    /// What to draw
    pub graphics: &'a Graphics,
    /// Live particles of the entity's emitter
    pub particles: &'a [Particle],
}

/// External renderer
pub trait Renderer {
    /// Called once per frame before any draw
    fn begin_frame(&mut self, _frame: &FrameContext) {}

    /// Draw one entity
    fn render(&mut self, view: &RenderView<'_>, frame: &FrameContext);

    /// Called once per frame after every draw
    fn end_frame(&mut self, _frame: &FrameContext) {}
}

/// Renderer that draws nothing, for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _view: &RenderView<'_>, _frame: &FrameContext) {}
}

/// Draw every enabled, visible entity with graphics; returns the draw count
pub fn render_scene(scene: &Scene, renderer: &mut dyn Renderer, frame: &FrameContext) -> usize {
    renderer.begin_frame(frame);
    let mut drawn = 0;
    for id in scene.ids() {
        let Some(entity) = scene.entity(id) else {
            continue;
        };
        if !entity.participates(Capabilities::GRAPHICS) {
            continue;
        }
        let Some(graphics) = entity.graphics().filter(|g| g.visible) else {
            continue;
        };
        let Some(world) = scene.world_matrix(id) else {
            continue;
        };
        let view = RenderView {
            entity: id,
            name: entity.name(),
            world,
            previous_world: entity.transform().previous_world_matrix(),
            graphics,
            particles: entity.particles().map(|emitter| emitter.particles()).unwrap_or(&[]),
        };
        renderer.render(&view, frame);
        drawn += 1;
    }
    renderer.end_frame(frame);
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Recorder {
        drawn: Vec<String>,
        frames: usize,
    }

    impl Renderer for Recorder {
        fn begin_frame(&mut self, _frame: &FrameContext) {
            self.frames += 1;
        }

        fn render(&mut self, view: &RenderView<'_>, _frame: &FrameContext) {
            self.drawn.push(view.name.to_string());
        }
    }

    #[test]
    fn test_camera_defines_view() {
        let mut scene = Scene::with_capacity(4);
        let camera = scene.create_entity("camera", None, EntityKind::Camera).unwrap();
        scene.reposition(camera, Vec3::new(0.0, 0.0, 5.0)).unwrap();

        let frame = FrameContext::from_scene(&scene, &ProjectionConfig::default(), 0.016, 3);
        assert_eq!(frame.camera, Some(camera));
        assert_relative_eq!(frame.view.m34, -5.0);
        assert_eq!(frame.frame_index, 3);
    }

    #[test]
    fn test_no_camera_identity_view() {
        let scene = Scene::with_capacity(1);
        let frame = FrameContext::from_scene(&scene, &ProjectionConfig::default(), 0.0, 0);
        assert_eq!(frame.camera, None);
        assert_eq!(frame.view, Mat4::identity());
    }

    #[test]
    fn test_only_visible_graphics_are_drawn() {
        let mut scene = Scene::with_capacity(4);
        for name in ["shown", "hidden", "bare", "disabled"] {
            scene.create_entity(name, None, EntityKind::Default).unwrap();
        }
        for name in ["shown", "hidden", "disabled"] {
            let id = scene.find_entity(name).unwrap();
            scene.entity_mut(id).unwrap().attach_graphics(Graphics::default()).unwrap();
        }
        let hidden = scene.find_entity("hidden").unwrap();
        scene.entity_mut(hidden).unwrap().graphics_mut().unwrap().visible = false;
        scene.set_enabled(scene.find_entity("disabled").unwrap(), false).unwrap();

        let mut recorder = Recorder::default();
        let frame = FrameContext::from_scene(&scene, &ProjectionConfig::default(), 0.0, 0);
        assert_eq!(render_scene(&scene, &mut recorder, &frame), 1);
        assert_eq!(recorder.drawn, vec!["shown".to_string()]);
        assert_eq!(recorder.frames, 1);
    }
}
