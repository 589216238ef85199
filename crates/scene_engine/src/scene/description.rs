//! Serializable scene descriptions
//!
//! A scene file lists entities in creation order; parents must appear
//! before their children. Loaded through the [`Config`] trait, so both TOML
//! and RON files work.

use super::{EntityId, EntityKind, Scene, SceneError};
use crate::components::{Collider, ColliderShape, RigidBody, Spin};
use crate::config::Config;
use crate::foundation::math::{utils, Vec3};
use serde::{Deserialize, Serialize};

/// Collider entry of an entity description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderDescription {
    /// Local geometry
    pub shape: ColliderShape,
    /// Offset from the entity origin
    #[serde(default = "Vec3::zeros")]
    pub origin: Vec3,
    /// Immovable collider
    #[serde(default)]
    pub is_static: bool,
}

/// One entity of a scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDescription {
    /// Unique identifier
    pub id: String,
    /// Identifier of the parent entity
    pub parent: Option<String>,
    /// Entity role
    pub kind: EntityKind,
    /// Initial enabled state
    pub enabled: bool,
    /// Local position
    pub position: Vec3,
    /// Rotation axis of the initial orientation
    pub rotation_axis: Vec3,
    /// Rotation angle of the initial orientation, in degrees
    pub rotation_degrees: f32,
    /// Local scale
    pub scale: Vec3,
    /// Initial linear velocity
    pub velocity: Vec3,
    /// Optional collider
    pub collider: Option<ColliderDescription>,
    /// Optional rigid body
    pub rigid_body: Option<RigidBody>,
    /// Continuous spin as axis scaled by radians per second
    pub spin: Option<Vec3>,
}

impl Default for EntityDescription {
    fn default() -> Self {
        Self {
            id: String::new(),
            parent: None,
            kind: EntityKind::Default,
            enabled: true,
            position: Vec3::zeros(),
            rotation_axis: Vec3::y(),
            rotation_degrees: 0.0,
            scale: Vec3::repeat(1.0),
            velocity: Vec3::zeros(),
            collider: None,
            rigid_body: None,
            spin: None,
        }
    }
}

/// Entities to create, in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// Entity list; parents first
    pub entities: Vec<EntityDescription>,
}

impl Config for SceneDescription {}

impl SceneDescription {
    /// Create every described entity in `scene`
    ///
    /// Stops at the first failure; entities created before it remain.
    pub fn build_into(&self, scene: &mut Scene) -> Result<Vec<EntityId>, SceneError> {
        let mut created = Vec::with_capacity(self.entities.len());
        for description in &self.entities {
            created.push(description.build_into(scene)?);
        }
        log::debug!("Built {} entities from description", created.len());
        Ok(created)
    }

    /// Build a new scene of the given capacity
    pub fn build(&self, capacity: usize) -> Result<Scene, SceneError> {
        let mut scene = Scene::with_capacity(capacity);
        self.build_into(&mut scene)?;
        Ok(scene)
    }
}

impl EntityDescription {
    fn build_into(&self, scene: &mut Scene) -> Result<EntityId, SceneError> {
        let id = scene.create_entity(&self.id, self.parent.as_deref(), self.kind)?;
        let rotation = utils::axis_angle(self.rotation_axis, utils::deg_to_rad(self.rotation_degrees));
        scene.update_transform(id, |node| {
            node.reposition(self.position);
            node.reorient(rotation);
            node.rescale(self.scale);
            node.set_velocity(self.velocity);
        })?;

        let mut entity = scene.entity_mut(id).ok_or(SceneError::UnknownEntity(id))?;
        entity.set_enabled(self.enabled);
        if let Some(collider) = &self.collider {
            entity.attach_collider(
                Collider::new(collider.shape)
                    .with_origin(collider.origin)
                    .with_static(collider.is_static),
            )?;
        }
        if let Some(body) = self.rigid_body {
            entity.attach_rigid_body(body)?;
        }
        if let Some(spin) = self.spin {
            let rate = spin.magnitude();
            if rate > 0.0 {
                entity.attach_animation(Box::new(Spin::new(spin, rate)))?;
            }
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SCENE_RON: &str = r#"(
        entities: [
            (id: "ground", collider: Some((shape: Box(half_extents: (10.0, 0.5, 10.0)), is_static: true))),
            (id: "ball", position: (0.0, 3.0, 0.0), velocity: (0.0, -1.0, 0.0),
             collider: Some((shape: Sphere(radius: 0.5))), rigid_body: Some((mass: 2.0))),
            (id: "marker", parent: Some("ball"), position: (0.0, 1.0, 0.0), spin: Some((0.0, 1.0, 0.0))),
        ],
    )"#;

    #[test]
    fn test_build_from_ron() {
        let description = SceneDescription::load_from_str(SCENE_RON, crate::config::ConfigFormat::Ron).unwrap();
        let scene = description.build(8).unwrap();

        let ball = scene.find_entity("ball").unwrap();
        let marker = scene.find_entity("marker").unwrap();
        assert_eq!(scene.parent(marker), Some(ball));
        assert_relative_eq!(scene.world_position(marker).unwrap(), Vec3::new(0.0, 4.0, 0.0));

        let ball_entity = scene.entity(ball).unwrap();
        assert_eq!(ball_entity.rigid_body().map(|b| b.mass), Some(2.0));
        assert_eq!(ball_entity.transform().velocity(), Vec3::new(0.0, -1.0, 0.0));
        assert!(scene.entity(scene.find_entity("ground").unwrap()).unwrap().collider().unwrap().is_static());
    }

    #[test]
    fn test_build_reports_unknown_parent() {
        let description = SceneDescription {
            entities: vec![EntityDescription {
                id: "orphan".into(),
                parent: Some("nobody".into()),
                ..Default::default()
            }],
        };
        assert_eq!(description.build(4).err(), Some(SceneError::UnknownParent("nobody".into())));
    }
}
