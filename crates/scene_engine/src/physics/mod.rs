//! Collision detection and response
//!
//! - [`primitives`]: boxes and spheres
//! - [`broad_phase`]: incremental three-axis sweep and prune
//! - [`narrow_phase`]: sphere and box tests plus the response rules
//! - [`collision_system`]: the per-frame pipeline tying them to a scene

pub mod broad_phase;
pub mod collision_system;
pub mod narrow_phase;
pub mod primitives;

pub use broad_phase::{SweepAndPrune, SweepStats};
pub use collision_system::{CollisionPair, CollisionSystem};
pub use narrow_phase::Contact;
pub use primitives::{Aabb, Axis, BoundingSphere, CollisionVolume, OrientedBox};
