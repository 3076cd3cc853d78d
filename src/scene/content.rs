//! Scene content roots.

use glam::Vec2;
use hecs::{Entity, World};

use crate::ecs::{Quad, ShadowCaps, TextureId, Transform};

/// Visitor over every node of a [`ContentRoot`].
///
/// Nodes expose their transform read-only and their shadow capabilities
/// mutably; that is the only per-node state a traversal may change.
pub trait NodeVisitor {
    fn visit(&mut self, entity: Entity, transform: &Transform, caps: &mut ShadowCaps);
}

/// Sets the same shadow capabilities on every node it visits.
pub struct ShadowCasting(pub ShadowCaps);

impl NodeVisitor for ShadowCasting {
    fn visit(&mut self, _entity: Entity, _transform: &Transform, caps: &mut ShadowCaps) {
        *caps = self.0;
    }
}

/// The drawable content of a scene host.
///
/// Nodes live in a `hecs` world. Every node spawned through
/// [`ContentRoot::spawn_quad`] carries a [`Transform`] and a
/// [`ShadowCaps`], so a traversal always reaches all of them.
#[derive(Default)]
pub struct ContentRoot {
    world: World,
}

impl ContentRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A root holding a single full-size backdrop quad, the shape of a
    /// video or still-image scene.
    pub fn backdrop(texture: TextureId, texture_aspect: f32, size: Vec2, placement: Transform) -> Self {
        let mut root = Self::new();
        root.spawn_quad(placement, Quad::new(texture, size, texture_aspect));
        root
    }

    /// Add a textured quad node. Shadow capabilities start disabled.
    pub fn spawn_quad(&mut self, transform: Transform, quad: Quad) -> Entity {
        self.world.spawn((transform, ShadowCaps::NONE, quad))
    }

    /// Walk every node once, in storage order.
    pub fn traverse<V: NodeVisitor>(&mut self, visitor: &mut V) -> usize {
        let mut visited = 0;
        for (entity, (transform, caps)) in self.world.query_mut::<(&Transform, &mut ShadowCaps)>() {
            visitor.visit(entity, transform, caps);
            visited += 1;
        }
        visited
    }

    /// Apply `caps` to every node. Returns how many nodes were updated.
    pub fn apply_shadow_caps(&mut self, caps: ShadowCaps) -> usize {
        self.traverse(&mut ShadowCasting(caps))
    }

    /// Number of nodes in the root.
    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.world.len() == 0
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_quads() -> ContentRoot {
        let mut root = ContentRoot::new();
        root.spawn_quad(Transform::new(), Quad::new(TextureId(0), Vec2::ONE, 1.0));
        root.spawn_quad(
            Transform::new().uniform_scale(2.0),
            Quad::new(TextureId(1), Vec2::ONE, 1.0),
        );
        root
    }

    #[test]
    fn shadow_caps_reach_every_node() {
        let mut root = two_quads();

        let visited = root.apply_shadow_caps(ShadowCaps::ALL);

        assert_eq!(visited, 2);
        for (_, caps) in root.world().query::<&ShadowCaps>().iter() {
            assert_eq!(*caps, ShadowCaps::ALL);
        }
    }

    #[test]
    fn new_nodes_start_without_shadows() {
        let root = two_quads();
        for (_, caps) in root.world().query::<&ShadowCaps>().iter() {
            assert_eq!(*caps, ShadowCaps::NONE);
        }
    }

    #[test]
    fn visitor_sees_node_transforms() {
        struct ScaleSum(f32);
        impl NodeVisitor for ScaleSum {
            fn visit(&mut self, _: Entity, transform: &Transform, _: &mut ShadowCaps) {
                self.0 += transform.scale.x;
            }
        }

        let mut root = two_quads();
        let mut sum = ScaleSum(0.0);
        root.traverse(&mut sum);

        assert_eq!(sum.0, 3.0);
    }

    #[test]
    fn backdrop_has_one_quad() {
        let root = ContentRoot::backdrop(TextureId(3), 2.0, Vec2::new(16.0, 9.0), Transform::new());
        assert_eq!(root.len(), 1);
        let mut query = root.world().query::<&Quad>();
        let (_, quad) = query.iter().next().unwrap();
        assert_eq!(quad.texture, TextureId(3));
        assert_eq!(quad.texture_aspect, 2.0);
    }
}
