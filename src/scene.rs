//! The scene graph: node storage, container operations and draw passes.
//!
//! A [`Scene`] owns every node. Nodes are addressed by [`NodeId`] and arranged
//! in trees whose roots are normally [`NodeType::Layer`]s. Geometry changes
//! mark the containing layer dirty and [`Scene::batch_draw`] redraws dirty
//! layers into a [`PaintContext`].

use log::{debug, trace, warn};

use crate::abstract_group::{AbstractGroup, AbstractGroupMut, Link};
use crate::error::{Result, SceneError};
use crate::events::{ListenerId, Listeners, SceneEvent};
use crate::node::{Attrs, NodeConfig, NodeData, NodeKind, NodeType};
use crate::paint::{DrawCommand, HitRegion, PaintContext};
use crate::transform::Transform;
use crate::tree::{DirtyFlags, NodeId, Tree};

pub struct Scene {
    tree: Tree,
    listeners: Listeners,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(),
            listeners: Listeners::default(),
        }
    }

    /// Create a parentless node.
    pub fn create(&mut self, node_type: NodeType, config: NodeConfig) -> NodeId {
        if node_type == NodeType::AbstractGroup && config.opacity != 0.0 {
            debug!(
                "Abstract groups are never drawn, ignoring opacity {}",
                config.opacity
            );
        }
        let id = self.tree.register(NodeData::new(node_type, config));
        trace!("Created {} {}", node_type, id);
        id
    }

    pub fn create_layer(&mut self, config: NodeConfig) -> NodeId {
        self.create(NodeType::Layer, config)
    }

    pub fn create_group(&mut self, config: NodeConfig) -> NodeId {
        self.create(NodeType::Group, config)
    }

    pub fn create_shape(&mut self, config: NodeConfig) -> NodeId {
        self.create(NodeType::Shape, config)
    }

    /// Create an abstract group. Its opacity is always 0 whatever `config` says.
    pub fn create_abstract_group(&mut self, config: NodeConfig) -> NodeId {
        self.create(NodeType::AbstractGroup, config)
    }

    /// Borrow an abstract group for its group-specific operations.
    pub fn abstract_group(&mut self, id: NodeId) -> Result<AbstractGroupMut<'_>> {
        match self.node_type(id)? {
            NodeType::AbstractGroup => Ok(AbstractGroupMut::new(self, id)),
            found => Err(SceneError::WrongType {
                node: id,
                expected: NodeType::AbstractGroup,
                found,
            }),
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.tree.contains(id)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    fn data(&self, id: NodeId) -> Result<&NodeData> {
        self.tree.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    pub(crate) fn group(&self, id: NodeId) -> Option<&AbstractGroup> {
        match self.tree.get(id).map(|data| &data.kind) {
            Some(NodeKind::AbstractGroup(group)) => Some(group),
            _ => None,
        }
    }

    pub(crate) fn group_mut(&mut self, id: NodeId) -> Option<&mut AbstractGroup> {
        match self.tree.get_mut(id).map(|data| &mut data.kind) {
            Some(NodeKind::AbstractGroup(group)) => Some(group),
            _ => None,
        }
    }

    pub fn node_type(&self, id: NodeId) -> Result<NodeType> {
        self.data(id).map(NodeData::node_type)
    }

    pub fn name(&self, id: NodeId) -> Result<&str> {
        self.data(id).map(|data| data.name.as_str())
    }

    pub fn attrs(&self, id: NodeId) -> Result<Attrs> {
        self.data(id).map(|data| data.attrs)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.parent(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.tree.children(id)
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.tree.index_of(id)
    }

    /// The abstract group mirroring geometry onto `id`, if it still exists.
    pub fn abstract_parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree
            .get(id)
            .and_then(|data| data.abstract_parent)
            .filter(|&group| self.tree.contains(group))
    }

    pub(crate) fn set_abstract_parent(&mut self, id: NodeId, group: Option<NodeId>) {
        if let Some(data) = self.tree.get_mut(id) {
            data.abstract_parent = group;
        }
    }

    /// Clear `linked`'s back-reference if it still points at `group`.
    pub(crate) fn release_linked(&mut self, group: NodeId, linked: NodeId) {
        if let Some(data) = self.tree.get_mut(linked) {
            if data.abstract_parent == Some(group) {
                data.abstract_parent = None;
            }
        }
    }

    /// Pairs of an abstract group.
    pub fn links(&self, group: NodeId) -> Result<&[Link]> {
        let found = self.node_type(group)?;
        self.group(group)
            .map(AbstractGroup::links)
            .ok_or(SceneError::WrongType {
                node: group,
                expected: NodeType::AbstractGroup,
                found,
            })
    }

    // -- attributes --------------------------------------------------------

    /// Apply `f` to the node's attributes and request a redraw if they changed.
    /// Returns whether anything changed.
    pub(crate) fn update_attrs(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut Attrs),
    ) -> Result<bool> {
        let data = self
            .tree
            .get_mut(id)
            .ok_or(SceneError::NodeNotFound(id))?;
        let before = data.attrs;
        f(&mut data.attrs);
        let changed = data.attrs != before;
        if changed {
            self.tree.mark_needs_draw(id, DirtyFlags::all());
        }
        Ok(changed)
    }

    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32) -> Result<()> {
        self.update_attrs(id, |a| {
            a.x = x;
            a.y = y;
        })
        .map(drop)
    }

    pub fn set_size(&mut self, id: NodeId, width: f32, height: f32) -> Result<()> {
        self.update_attrs(id, |a| {
            a.width = width;
            a.height = height;
        })
        .map(drop)
    }

    /// Rotation in degrees.
    pub fn set_rotation(&mut self, id: NodeId, rotation: f32) -> Result<()> {
        self.update_attrs(id, |a| a.rotation = rotation).map(drop)
    }

    pub fn set_scale(&mut self, id: NodeId, scale_x: f32, scale_y: f32) -> Result<()> {
        self.update_attrs(id, |a| {
            a.scale_x = scale_x;
            a.scale_y = scale_y;
        })
        .map(drop)
    }

    pub fn set_offset(&mut self, id: NodeId, offset_x: f32, offset_y: f32) -> Result<()> {
        self.update_attrs(id, |a| {
            a.offset_x = offset_x;
            a.offset_y = offset_y;
        })
        .map(drop)
    }

    /// Set opacity, clamped to `0.0..=1.0`. Abstract groups stay at 0.
    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) -> Result<()> {
        if self.node_type(id)? == NodeType::AbstractGroup {
            warn!(
                "Abstract group {} is never drawn, ignoring opacity {}",
                id, opacity
            );
            return Ok(());
        }
        self.update_attrs(id, |a| a.opacity = opacity.clamp(0.0, 1.0))
            .map(drop)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.update_attrs(id, |a| a.visible = visible).map(drop)
    }

    pub fn set_listening(&mut self, id: NodeId, listening: bool) -> Result<()> {
        self.update_attrs(id, |a| a.listening = listening).map(drop)
    }

    pub fn local_transform(&self, id: NodeId) -> Result<Transform> {
        self.data(id).map(|data| data.attrs.local_transform())
    }

    /// Transform from the node's local space to scene space, composed with
    /// every ancestor.
    pub fn absolute_transform(&self, id: NodeId) -> Result<Transform> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            chain.push(self.data(node)?.attrs.local_transform());
            current = self.tree.parent(node);
        }
        Ok(chain
            .iter()
            .rev()
            .fold(Transform::identity(), |acc, local| acc.then(local)))
    }

    /// Opacity multiplied through every ancestor.
    pub fn absolute_opacity(&self, id: NodeId) -> Result<f32> {
        let mut opacity = 1.0;
        let mut current = Some(id);
        while let Some(node) = current {
            opacity *= self.data(node)?.attrs.opacity;
            current = self.tree.parent(node);
        }
        Ok(opacity)
    }

    // -- container operations ----------------------------------------------

    /// Add `child` to `parent`.
    ///
    /// Abstract groups duplicate fresh children and link the original; see
    /// [`AbstractGroupMut::add`]. Other containers attach `child` directly,
    /// moving it out of any previous parent.
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> Result<&mut Self> {
        if self.node_type(parent)? == NodeType::AbstractGroup {
            self.abstract_group(parent)?.add(child)?;
        } else {
            self.attach(parent, child)?;
        }
        Ok(self)
    }

    /// Move `node` under `new_parent` without duplicating it, whatever the
    /// container type.
    pub fn move_to(&mut self, node: NodeId, new_parent: NodeId) -> Result<()> {
        self.attach(new_parent, node)
    }

    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_type = self.node_type(parent)?;
        let child_type = self.node_type(child)?;

        if !parent_type.accepts(child_type) {
            return Err(SceneError::InvalidChild {
                parent,
                parent_type,
                child,
                child_type,
            });
        }
        if self.tree.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }

        self.detach(child);
        self.tree.set_parent(child, parent);
        self.tree.mark_needs_draw(parent, DirtyFlags::all());

        debug!("Attached {} {} to {} {}", child_type, child, parent_type, parent);
        self.fire(parent, SceneEvent::Add { parent, child });
        Ok(())
    }

    /// Append `child` to `parent` with no validation and no event.
    /// Used for duplicates that are not yet visible to anyone.
    pub(crate) fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.tree.set_parent(child, parent);
        self.tree.mark_needs_draw(parent, DirtyFlags::all());
    }

    /// Detach a node from its parent without destroying it.
    /// Returns the former parent.
    pub fn remove(&mut self, child: NodeId) -> Result<Option<NodeId>> {
        if !self.contains(child) {
            return Err(SceneError::NodeNotFound(child));
        }
        Ok(self.detach(child))
    }

    /// Detach from the current parent. Removing a paired child of an abstract
    /// group also drops the pair and releases its linked node.
    pub(crate) fn detach(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.tree.clear_parent(child)?;
        self.tree.mark_needs_draw(parent, DirtyFlags::all());

        let unlinked = self.group_mut(parent).and_then(|g| g.unlink_child(child));
        if let Some(link) = unlinked {
            self.release_linked(parent, link.linked);
        }

        debug!("Detached {} from {}", child, parent);
        self.fire(parent, SceneEvent::Remove { parent, child });
        Some(parent)
    }

    /// Detach every child of `parent`. Abstract groups also destroy their
    /// duplicates and release linked nodes.
    pub fn remove_children(&mut self, parent: NodeId) -> Result<&mut Self> {
        if self.node_type(parent)? == NodeType::AbstractGroup {
            self.abstract_group(parent)?.remove_children();
        } else {
            for child in self.tree.children(parent).to_vec() {
                self.detach(child);
            }
        }
        Ok(self)
    }

    /// Detach a node and free it together with its whole subtree.
    ///
    /// Destroyed abstract groups release their linked nodes. Ids of destroyed
    /// nodes become stale and fail every lookup.
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        if !self.contains(id) {
            return Err(SceneError::NodeNotFound(id));
        }
        self.detach(id);

        let nodes = self.tree.subtree(id);
        for &node in &nodes {
            let links = match self.group_mut(node) {
                Some(group) => group.take_links(),
                None => continue,
            };
            for link in links {
                self.release_linked(node, link.linked);
            }
        }
        for &node in nodes.iter().rev() {
            self.tree.unregister(node);
            self.listeners.forget(node);
        }

        debug!("Destroyed {} ({} nodes)", id, nodes.len());
        Ok(())
    }

    /// Deep copy of a subtree. The copy has no parent and no back-reference.
    ///
    /// An abstract group is copied without children or links, since its
    /// children only exist as duplicates of its linked nodes.
    pub fn clone_node(&mut self, id: NodeId) -> Result<NodeId> {
        let data = self.data(id)?.duplicate();
        let copy_children = data.node_type() != NodeType::AbstractGroup;
        let copy = self.tree.register(data);

        if copy_children {
            for child in self.tree.children(id).to_vec() {
                let child_copy = self.clone_node(child)?;
                self.tree.set_parent(child_copy, copy);
            }
        }

        trace!("Cloned {} into {}", id, copy);
        Ok(copy)
    }

    // -- events ------------------------------------------------------------

    /// Subscribe to structural events fired on `node`.
    pub fn on(
        &mut self,
        node: NodeId,
        callback: impl FnMut(&SceneEvent) + 'static,
    ) -> Result<ListenerId> {
        if !self.contains(node) {
            return Err(SceneError::NodeNotFound(node));
        }
        Ok(self.listeners.on(node, Box::new(callback)))
    }

    pub fn off(&mut self, node: NodeId, listener: ListenerId) -> bool {
        self.listeners.off(node, listener)
    }

    pub(crate) fn fire(&mut self, target: NodeId, event: SceneEvent) {
        self.listeners.fire(target, &event);
    }

    // -- drawing -----------------------------------------------------------

    /// Queue the layer containing `id` for the next [`batch_draw`](Self::batch_draw).
    pub fn request_draw(&mut self, id: NodeId) -> Result<()> {
        if !self.contains(id) {
            return Err(SceneError::NodeNotFound(id));
        }
        self.tree.mark_needs_draw(id, DirtyFlags::all());
        Ok(())
    }

    pub fn needs_draw(&self) -> bool {
        self.tree.has_draw_roots()
    }

    /// Draw every layer marked dirty since the last pass.
    ///
    /// Mirroring may change linked nodes in other layers; those layers are
    /// queued again and picked up by the next call.
    pub fn batch_draw(&mut self, ctx: &mut PaintContext) -> Result<()> {
        for root in self.tree.take_draw_roots() {
            let Some(data) = self.tree.get(root) else {
                continue;
            };
            let is_layer = data.node_type() == NodeType::Layer;
            let flags = self.tree.dirty_flags(root);
            self.tree.clear_dirty(root);

            if !is_layer {
                continue;
            }
            trace!("Drawing layer {} ({:?})", root, flags);
            if flags.contains(DirtyFlags::SCENE) {
                self.draw_scene(root, ctx)?;
            }
            if flags.contains(DirtyFlags::HIT) {
                self.draw_hit(root, ctx)?;
            }
        }
        Ok(())
    }

    /// Scene pass over a subtree.
    ///
    /// Invisible subtrees are skipped, shapes with no resulting opacity emit
    /// nothing. Abstract groups mirror their children onto their linked nodes
    /// even when hidden, and never paint or descend into them.
    pub fn draw_scene(&mut self, root: NodeId, ctx: &mut PaintContext) -> Result<()> {
        let (transform, opacity) = self.parent_context(root)?;
        self.draw_scene_node(root, transform, opacity, ctx)
    }

    fn draw_scene_node(
        &mut self,
        id: NodeId,
        parent_transform: Transform,
        parent_opacity: f32,
        ctx: &mut PaintContext,
    ) -> Result<()> {
        let data = self.data(id)?;
        // Abstract groups mirror whether or not they are visible
        if data.node_type() == NodeType::AbstractGroup {
            self.abstract_group(id)?.draw_scene()?;
            return Ok(());
        }
        if !data.attrs.visible {
            return Ok(());
        }
        let transform = parent_transform.then(&data.attrs.local_transform());
        let opacity = parent_opacity * data.attrs.opacity;
        let (width, height) = (data.attrs.width, data.attrs.height);

        match data.node_type() {
            NodeType::AbstractGroup => {}
            NodeType::Shape => {
                if opacity > 0.0 {
                    ctx.draw_shape(DrawCommand {
                        node: id,
                        transform,
                        width,
                        height,
                        opacity,
                    });
                }
            }
            NodeType::Layer | NodeType::Group => {
                for child in self.tree.children(id).to_vec() {
                    self.draw_scene_node(child, transform, opacity, ctx)?;
                }
            }
        }
        Ok(())
    }

    /// Hit pass over a subtree: visible, listening shapes become hit regions.
    pub fn draw_hit(&mut self, root: NodeId, ctx: &mut PaintContext) -> Result<()> {
        let (transform, _) = self.parent_context(root)?;
        self.draw_hit_node(root, transform, ctx)
    }

    fn draw_hit_node(
        &mut self,
        id: NodeId,
        parent_transform: Transform,
        ctx: &mut PaintContext,
    ) -> Result<()> {
        let data = self.data(id)?;
        if !data.attrs.visible || !data.attrs.listening {
            return Ok(());
        }
        let transform = parent_transform.then(&data.attrs.local_transform());
        let (width, height) = (data.attrs.width, data.attrs.height);

        match data.node_type() {
            NodeType::AbstractGroup => {
                self.abstract_group(id)?.draw_hit();
            }
            NodeType::Shape => ctx.add_hit_region(HitRegion {
                node: id,
                transform,
                width,
                height,
            }),
            NodeType::Layer | NodeType::Group => {
                for child in self.tree.children(id).to_vec() {
                    self.draw_hit_node(child, transform, ctx)?;
                }
            }
        }
        Ok(())
    }

    /// Absolute transform and opacity of the node's parent.
    fn parent_context(&self, id: NodeId) -> Result<(Transform, f32)> {
        if !self.contains(id) {
            return Err(SceneError::NodeNotFound(id));
        }
        match self.tree.parent(id) {
            Some(parent) => Ok((
                self.absolute_transform(parent)?,
                self.absolute_opacity(parent)?,
            )),
            None => Ok((Transform::identity(), 1.0)),
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.tree.len())
            .field("needs_draw", &self.tree.has_draw_roots())
            .finish()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
