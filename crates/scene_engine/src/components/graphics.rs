//! Graphics component: what the external renderer draws for an entity

use crate::assets::AssetHandle;
use crate::foundation::math::Vec3;

/// Mesh/material references plus visibility
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Graphics {
    /// Mesh asset, if one was requested
    pub mesh: Option<AssetHandle>,
    /// Diffuse texture; missing means untextured rendering
    pub texture: Option<AssetHandle>,
    /// Base color multiplier
    pub tint: Vec3,
    /// Hidden entities are skipped by the render stage
    pub visible: bool,
}

impl Default for Graphics {
    fn default() -> Self {
        Self {
            mesh: None,
            texture: None,
            tint: Vec3::repeat(1.0),
            visible: true,
        }
    }
}

impl Graphics {
    /// Graphics drawing `mesh`
    pub fn with_mesh(mesh: AssetHandle) -> Self {
        Self {
            mesh: Some(mesh),
            ..Default::default()
        }
    }

    /// Attach a diffuse texture (builder pattern)
    pub fn with_texture(mut self, texture: AssetHandle) -> Self {
        self.texture = Some(texture);
        self
    }
}
