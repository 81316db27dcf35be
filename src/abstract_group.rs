//! Abstract groups: invisible containers that mirror their children's
//! absolute geometry onto externally owned "linked" nodes.
//!
//! Adding a fresh node to an abstract group stores a duplicate of it as a
//! child and keeps the original as the linked node of that child. On every
//! scene pass the group decomposes each child's absolute transform and writes
//! position, size and rotation onto the paired linked node. The group itself
//! never paints and never takes part in hit testing.
//!
//! # Example
//! ```
//! use easel::prelude::*;
//!
//! let mut scene = Scene::new();
//! let layer = scene.create_layer(NodeConfig::default());
//! let group = scene.create_abstract_group(NodeConfig {
//!     x: 10.0,
//!     ..Default::default()
//! });
//! scene.add(layer, group).unwrap();
//!
//! let target = scene.create_shape(NodeConfig {
//!     width: 5.0,
//!     height: 5.0,
//!     ..Default::default()
//! });
//! scene.abstract_group(group).unwrap().add(target).unwrap().draw_scene().unwrap();
//!
//! assert_eq!(scene.attrs(target).unwrap().x, 10.0);
//! assert_eq!(scene.abstract_parent(target), Some(group));
//! ```

use log::{debug, trace, warn};

use crate::error::{Result, SceneError};
use crate::events::SceneEvent;
use crate::node::NodeType;
use crate::scene::Scene;
use crate::transform::Transform;
use crate::tree::NodeId;

/// A child owned by an abstract group and the linked node it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    /// Duplicate stored as the group's child
    pub child: NodeId,
    /// Externally owned node receiving the child's geometry
    pub linked: NodeId,
}

/// Per-node state of an abstract group.
#[derive(Debug, Clone, Default)]
pub struct AbstractGroup {
    links: Vec<Link>,
}

impl AbstractGroup {
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub(crate) fn push(&mut self, link: Link) {
        self.links.push(link);
    }

    pub(crate) fn take_links(&mut self) -> Vec<Link> {
        std::mem::take(&mut self.links)
    }

    /// Drop the pair whose child is `child`, if any.
    pub(crate) fn unlink_child(&mut self, child: NodeId) -> Option<Link> {
        let pos = self.links.iter().position(|link| link.child == child)?;
        Some(self.links.remove(pos))
    }
}

/// Geometry written onto a linked node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirroredGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees
    pub rotation: f32,
}

/// Geometry of a `width` x `height` node placed by `absolute`.
pub fn mirror_geometry(absolute: &Transform, width: f32, height: f32) -> MirroredGeometry {
    let dec = absolute.decompose();
    MirroredGeometry {
        x: dec.translation[0],
        y: dec.translation[1],
        width: width * dec.scale[0],
        height: height * dec.scale[1],
        rotation: dec.rotation_degrees(),
    }
}

/// Mutable access to one abstract group of a [`Scene`].
///
/// Obtained from [`Scene::abstract_group`]. Operations return `&mut Self` so
/// calls can be chained.
pub struct AbstractGroupMut<'a> {
    scene: &'a mut Scene,
    id: NodeId,
}

impl<'a> AbstractGroupMut<'a> {
    pub(crate) fn new(scene: &'a mut Scene, id: NodeId) -> Self {
        Self { scene, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn links(&self) -> &[Link] {
        self.scene
            .group(self.id)
            .map(AbstractGroup::links)
            .unwrap_or(&[])
    }

    /// All children, paired or moved in.
    pub fn children(&self) -> &[NodeId] {
        self.scene.children(self.id)
    }

    /// Linked nodes in pair order.
    pub fn linked_nodes(&self) -> Vec<NodeId> {
        self.links().iter().map(|link| link.linked).collect()
    }

    /// Add a group or shape.
    ///
    /// A node without a parent is duplicated: the duplicate becomes the next
    /// child, the original becomes its linked node and gets this group as its
    /// abstract parent, and an `Add` event carrying the duplicate fires.
    /// A node that already has a parent is moved here as a plain child with
    /// no link. A node that is already a child of this group is left as is.
    ///
    /// Fails with [`SceneError::InvalidChild`] for any other node type,
    /// leaving the group untouched.
    pub fn add(&mut self, node: NodeId) -> Result<&mut Self> {
        let node_type = self.scene.node_type(node)?;
        if !node_type.is_group_or_shape() {
            return Err(SceneError::InvalidChild {
                parent: self.id,
                parent_type: NodeType::AbstractGroup,
                child: node,
                child_type: node_type,
            });
        }

        if self.scene.parent(node) == Some(self.id) {
            trace!("{} {} is already a child of {}", node_type, node, self.id);
            return Ok(self);
        }
        if self.scene.parent(node).is_some() {
            debug!("Moving {} {} into abstract group {}", node_type, node, self.id);
            self.scene.move_to(node, self.id)?;
            return Ok(self);
        }

        let duplicate = self.scene.clone_node(node)?;
        self.scene.adopt(self.id, duplicate);

        if let Some(previous) = self.scene.abstract_parent(node) {
            if previous != self.id {
                debug!(
                    "Node {} was linked to abstract group {}, relinking to {}",
                    node, previous, self.id
                );
            }
        }
        self.scene.set_abstract_parent(node, Some(self.id));
        if let Some(group) = self.scene.group_mut(self.id) {
            group.push(Link {
                child: duplicate,
                linked: node,
            });
        }
        self.scene.request_draw(self.id)?;

        debug!(
            "Abstract group {} linked {} through duplicate {}",
            self.id, node, duplicate
        );
        self.scene.fire(
            self.id,
            SceneEvent::Add {
                parent: self.id,
                child: duplicate,
            },
        );
        Ok(self)
    }

    /// Add several nodes in order. Stops at the first failure; nodes added
    /// before it stay added.
    pub fn add_all<I>(&mut self, nodes: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = NodeId>,
    {
        for node in nodes {
            self.add(node)?;
        }
        Ok(self)
    }

    /// Remove every child and release every linked node.
    ///
    /// Paired duplicates are destroyed; children that were moved in are only
    /// detached. Linked nodes lose their back-reference to this group.
    pub fn remove_children(&mut self) -> &mut Self {
        let links = self
            .scene
            .group_mut(self.id)
            .map(AbstractGroup::take_links)
            .unwrap_or_default();

        for child in self.scene.children(self.id).to_vec() {
            self.scene.detach(child);
        }
        for link in &links {
            if !self.scene.contains(link.child) {
                continue;
            }
            if let Err(err) = self.scene.destroy(link.child) {
                warn!(
                    "Abstract group {}: failed to destroy {}: {}",
                    self.id, link.child, err
                );
            }
        }
        for link in &links {
            self.scene.release_linked(self.id, link.linked);
        }

        if !links.is_empty() {
            debug!(
                "Abstract group {} released {} linked nodes",
                self.id,
                links.len()
            );
        }
        self
    }

    /// Mirror each child's absolute geometry onto its linked node.
    ///
    /// Paints nothing. A linked node that no longer exists is skipped.
    pub fn draw_scene(&mut self) -> Result<&mut Self> {
        for link in self.links().to_vec() {
            let absolute = self.scene.absolute_transform(link.child)?;
            let attrs = self.scene.attrs(link.child)?;
            let geometry = mirror_geometry(&absolute, attrs.width, attrs.height);

            if !self.scene.contains(link.linked) {
                warn!(
                    "Abstract group {}: linked node {} no longer exists",
                    self.id, link.linked
                );
                continue;
            }

            trace!("Mirroring {} onto {}: {:?}", link.child, link.linked, geometry);
            self.scene.update_attrs(link.linked, |a| {
                a.x = geometry.x;
                a.y = geometry.y;
                a.width = geometry.width;
                a.height = geometry.height;
                a.rotation = geometry.rotation;
            })?;
        }
        Ok(self)
    }

    /// Abstract groups take no part in hit testing.
    pub fn draw_hit(&mut self) -> &mut Self {
        self
    }

    /// Kept for callers driving the legacy update hook.
    pub fn update(&mut self) -> &mut Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeConfig;
    use std::f32::consts::FRAC_PI_2;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn setup() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let layer = scene.create_layer(NodeConfig::default());
        let group = scene.create_abstract_group(NodeConfig::default());
        scene.add(layer, group).unwrap();
        (scene, layer, group)
    }

    #[test]
    fn test_mirror_geometry() {
        let absolute = Transform::translate(10.0, 20.0)
            .then(&Transform::rotate(FRAC_PI_2))
            .then(&Transform::scale_xy(2.0, 1.0));
        let g = mirror_geometry(&absolute, 5.0, 10.0);

        assert!(approx_eq(g.x, 10.0));
        assert!(approx_eq(g.y, 20.0));
        assert!(approx_eq(g.rotation, 90.0));
        assert!(approx_eq(g.width, 10.0));
        assert!(approx_eq(g.height, 10.0));
    }

    #[test]
    fn test_mirror_geometry_identity() {
        let g = mirror_geometry(&Transform::identity(), 3.0, 4.0);
        assert_eq!(
            g,
            MirroredGeometry {
                x: 0.0,
                y: 0.0,
                width: 3.0,
                height: 4.0,
                rotation: 0.0,
            }
        );
    }

    #[test]
    fn test_fresh_add_pairs_duplicate_with_original() {
        let (mut scene, _, group) = setup();
        let shape = scene.create_shape(NodeConfig {
            width: 2.0,
            ..Default::default()
        });

        let mut handle = scene.abstract_group(group).unwrap();
        handle.add(shape).unwrap();

        let links = handle.links().to_vec();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].linked, shape);
        assert_ne!(links[0].child, shape);
        assert_eq!(handle.children(), &[links[0].child]);

        assert_eq!(scene.parent(shape), None);
        assert_eq!(scene.parent(links[0].child), Some(group));
        assert_eq!(scene.abstract_parent(shape), Some(group));
        assert_eq!(scene.attrs(links[0].child).unwrap().width, 2.0);
    }

    #[test]
    fn test_add_rejects_layers_and_abstract_groups() {
        let (mut scene, _, group) = setup();
        let layer = scene.create_layer(NodeConfig::default());
        let other = scene.create_abstract_group(NodeConfig::default());

        let mut handle = scene.abstract_group(group).unwrap();
        assert!(matches!(
            handle.add(layer).err(),
            Some(SceneError::InvalidChild {
                child_type: NodeType::Layer,
                ..
            })
        ));
        assert!(matches!(
            handle.add(other).err(),
            Some(SceneError::InvalidChild { .. })
        ));
        assert!(handle.links().is_empty());
        assert!(handle.children().is_empty());
    }

    #[test]
    fn test_add_all_keeps_earlier_nodes_on_failure() {
        let (mut scene, _, group) = setup();
        let a = scene.create_shape(NodeConfig::default());
        let bad = scene.create_layer(NodeConfig::default());
        let c = scene.create_shape(NodeConfig::default());

        let mut handle = scene.abstract_group(group).unwrap();
        assert!(handle.add_all([a, bad, c]).is_err());
        assert_eq!(handle.linked_nodes(), vec![a]);
        assert_eq!(handle.children().len(), 1);
    }

    #[test]
    fn test_readding_own_child_keeps_pair() {
        let (mut scene, _, group) = setup();
        let shape = scene.create_shape(NodeConfig::default());
        scene.abstract_group(group).unwrap().add(shape).unwrap();
        let duplicate = scene.links(group).unwrap()[0].child;

        let mut handle = scene.abstract_group(group).unwrap();
        handle.add(duplicate).unwrap();
        assert_eq!(handle.links(), &[Link { child: duplicate, linked: shape }]);
        assert_eq!(handle.children(), &[duplicate]);

        assert_eq!(scene.abstract_parent(shape), Some(group));
    }

    #[test]
    fn test_removing_paired_child_releases_link() {
        let (mut scene, _, group) = setup();
        let shape = scene.create_shape(NodeConfig::default());
        scene.abstract_group(group).unwrap().add(shape).unwrap();
        let duplicate = scene.links(group).unwrap()[0].child;

        scene.remove(duplicate).unwrap();

        assert!(scene.links(group).unwrap().is_empty());
        assert_eq!(scene.abstract_parent(shape), None);
    }

    #[test]
    fn test_destroying_group_releases_links() {
        let (mut scene, _, group) = setup();
        let shape = scene.create_shape(NodeConfig::default());
        scene.abstract_group(group).unwrap().add(shape).unwrap();

        scene.destroy(group).unwrap();

        assert!(scene.contains(shape));
        assert_eq!(scene.abstract_parent(shape), None);
    }

    #[test]
    fn test_relinking_keeps_newer_back_reference() {
        let (mut scene, layer, first) = setup();
        let second = scene.create_abstract_group(NodeConfig::default());
        scene.add(layer, second).unwrap();
        let shape = scene.create_shape(NodeConfig::default());

        scene.abstract_group(first).unwrap().add(shape).unwrap();
        scene.abstract_group(second).unwrap().add(shape).unwrap();
        assert_eq!(scene.abstract_parent(shape), Some(second));

        // Clearing the first group must not clear the second group's link
        scene.abstract_group(first).unwrap().remove_children();
        assert_eq!(scene.abstract_parent(shape), Some(second));
    }

    #[test]
    fn test_draw_scene_skips_destroyed_linked_node() {
        let (mut scene, _, group) = setup();
        let kept = scene.create_shape(NodeConfig::default());
        let gone = scene.create_shape(NodeConfig::default());
        scene
            .abstract_group(group)
            .unwrap()
            .add_all([gone, kept])
            .unwrap();
        scene.set_position(group, 7.0, 0.0).unwrap();
        scene.destroy(gone).unwrap();

        scene.abstract_group(group).unwrap().draw_scene().unwrap();
        assert_eq!(scene.attrs(kept).unwrap().x, 7.0);
    }
}
