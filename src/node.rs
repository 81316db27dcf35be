//! Node kinds, construction config and per-node attributes.

use crate::abstract_group::AbstractGroup;
use crate::transform::Transform;
use crate::tree::NodeId;

/// The kind of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Top-level container; the unit the draw scheduler redraws
    Layer,
    /// Plain container of groups and shapes
    Group,
    /// Drawable leaf
    Shape,
    /// Invisible container mirroring its children onto linked nodes
    AbstractGroup,
}

impl NodeType {
    /// Whether a node of this type may be placed inside a group.
    pub fn is_group_or_shape(self) -> bool {
        matches!(self, NodeType::Group | NodeType::Shape)
    }

    /// Whether a container of this type accepts a child of type `child`.
    pub fn accepts(self, child: NodeType) -> bool {
        match self {
            NodeType::Layer => child.is_group_or_shape() || child == NodeType::AbstractGroup,
            NodeType::Group | NodeType::AbstractGroup => child.is_group_or_shape(),
            NodeType::Shape => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Layer => "Layer",
            NodeType::Group => "Group",
            NodeType::Shape => "Shape",
            NodeType::AbstractGroup => "AbstractGroup",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construction options shared by every node type.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rotation in degrees
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Pivot offset subtracted before scale and rotation
    pub offset_x: f32,
    pub offset_y: f32,
    /// 0.0 (transparent) to 1.0 (opaque)
    pub opacity: f32,
    pub visible: bool,
    /// Whether the node takes part in hit testing
    pub listening: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            opacity: 1.0,
            visible: true,
            listening: true,
        }
    }
}

/// Mutable geometry and visual state of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attrs {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub opacity: f32,
    pub visible: bool,
    pub listening: bool,
}

impl Attrs {
    fn from_config(config: &NodeConfig) -> Self {
        Self {
            x: config.x,
            y: config.y,
            width: config.width,
            height: config.height,
            rotation: config.rotation,
            scale_x: config.scale_x,
            scale_y: config.scale_y,
            offset_x: config.offset_x,
            offset_y: config.offset_y,
            opacity: config.opacity.clamp(0.0, 1.0),
            visible: config.visible,
            listening: config.listening,
        }
    }

    /// `translate(x, y) * rotate(rotation) * scale(sx, sy) * translate(-offset)`
    pub fn local_transform(&self) -> Transform {
        let mut t = Transform::identity();
        if self.x != 0.0 || self.y != 0.0 {
            t = t.then(&Transform::translate(self.x, self.y));
        }
        if self.rotation != 0.0 {
            t = t.then(&Transform::rotate_degrees(self.rotation));
        }
        if self.scale_x != 1.0 || self.scale_y != 1.0 {
            t = t.then(&Transform::scale_xy(self.scale_x, self.scale_y));
        }
        if self.offset_x != 0.0 || self.offset_y != 0.0 {
            t = t.then(&Transform::translate(-self.offset_x, -self.offset_y));
        }
        t
    }
}

impl Default for Attrs {
    fn default() -> Self {
        Self::from_config(&NodeConfig::default())
    }
}

/// Type-specific payload of a node.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Layer,
    Group,
    Shape,
    AbstractGroup(AbstractGroup),
}

impl NodeKind {
    fn new(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Layer => NodeKind::Layer,
            NodeType::Group => NodeKind::Group,
            NodeType::Shape => NodeKind::Shape,
            NodeType::AbstractGroup => NodeKind::AbstractGroup(AbstractGroup::default()),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Layer => NodeType::Layer,
            NodeKind::Group => NodeType::Group,
            NodeKind::Shape => NodeType::Shape,
            NodeKind::AbstractGroup(_) => NodeType::AbstractGroup,
        }
    }
}

/// Everything the arena stores for one node apart from its tree links.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub name: String,
    pub attrs: Attrs,
    /// Non-owning link to the abstract group mirroring geometry onto this node
    pub abstract_parent: Option<NodeId>,
}

impl NodeData {
    pub fn new(node_type: NodeType, config: NodeConfig) -> Self {
        let mut attrs = Attrs::from_config(&config);
        if node_type == NodeType::AbstractGroup {
            attrs.opacity = 0.0;
        }
        Self {
            kind: NodeKind::new(node_type),
            name: config.name,
            attrs,
            abstract_parent: None,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// A parentless copy: same attributes, no back-reference.
    /// An abstract group copy starts without links.
    pub fn duplicate(&self) -> Self {
        let kind = match &self.kind {
            NodeKind::AbstractGroup(_) => NodeKind::AbstractGroup(AbstractGroup::default()),
            other => other.clone(),
        };
        Self {
            kind,
            name: self.name.clone(),
            attrs: self.attrs,
            abstract_parent: None,
        }
    }
}
