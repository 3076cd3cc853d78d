//! ECS components for scene content.
//!
//! A scene's content root is a `hecs` world. Every node carries a
//! [`Transform`] and a [`ShadowCaps`]; drawable nodes additionally carry a
//! [`Quad`] that samples a texture from the session's texture bank.
//!
//! # Example
//!
//! ```ignore
//! use crossmask::*;
//!
//! let mut world = hecs::World::new();
//! world.spawn((
//!     Transform::new().uniform_scale(2.0),
//!     ShadowCaps::default(),
//!     Quad::new(texture_id, Vec2::new(1280.0, 720.0), 16.0 / 9.0),
//! ));
//! ```

use glam::{Mat4, Quat, Vec2, Vec3};

/// Type-safe handle to a texture stored in a [`TextureBank`](crate::TextureBank).
///
/// Scene content and mask selection refer to textures through this handle
/// only; the GPU resources stay with the bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

/// Position, rotation and scale of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space position (translation).
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Scale factors for each axis.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Creates a new identity transform (origin, no rotation, unit scale).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a transform from position, scale and Euler XYZ rotation
    /// triples, the form scene configuration supplies them in.
    pub fn from_triples(position: [f32; 3], scale: [f32; 3], rotation: [f32; 3]) -> Self {
        Self {
            position: Vec3::from(position),
            rotation: Quat::from_euler(glam::EulerRot::XYZ, rotation[0], rotation[1], rotation[2]),
            scale: Vec3::from(scale),
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Converts this transform to a 4×4 matrix in SRT order.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Shadow capabilities of a node.
///
/// Set once for every node when a content root is built, never inferred
/// per node afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowCaps {
    pub casts_shadow: bool,
    pub receives_shadow: bool,
}

impl ShadowCaps {
    /// Both casting and receiving enabled.
    pub const ALL: Self = Self {
        casts_shadow: true,
        receives_shadow: true,
    };

    /// Neither casting nor receiving.
    pub const NONE: Self = Self {
        casts_shadow: false,
        receives_shadow: false,
    };
}

/// A textured rectangle centred on its node's origin.
///
/// `size` is in world units. `texture_aspect` is the source image's
/// width / height and drives the cover fit in the host shader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub texture: TextureId,
    pub size: Vec2,
    pub texture_aspect: f32,
}

impl Quad {
    pub fn new(texture: TextureId, size: Vec2, texture_aspect: f32) -> Self {
        Self {
            texture,
            size,
            texture_aspect,
        }
    }

    /// The quad's own width / height.
    pub fn aspect(&self) -> f32 {
        self.size.x / self.size.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triples_build_expected_matrix() {
        let t = Transform::from_triples([1.0, 2.0, 3.0], [2.0, 2.0, 2.0], [0.0, 0.0, 0.0]);
        let p = t.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(3.0, 2.0, 3.0));
    }

    #[test]
    fn quad_aspect_is_width_over_height() {
        let quad = Quad::new(TextureId(0), Vec2::new(1600.0, 900.0), 1.0);
        assert!((quad.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}
