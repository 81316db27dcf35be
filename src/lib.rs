//! A small 2D scene graph with abstract groups.
//!
//! Nodes live in a [`Scene`] and are addressed by [`NodeId`]. Layers hold
//! groups and shapes; an [`AbstractGroup`](abstract_group::AbstractGroup)
//! holds duplicates of caller-supplied nodes and, on every draw pass, writes
//! each duplicate's absolute position, size and rotation back onto the
//! original ("linked") node without ever being drawn itself.

pub mod abstract_group;
pub mod error;
pub mod events;
pub mod node;
pub mod paint;
pub mod scene;
pub mod transform;
mod tree;

pub use abstract_group::{mirror_geometry, AbstractGroupMut, Link, MirroredGeometry};
pub use error::{Result, SceneError};
pub use events::{ListenerId, SceneEvent};
pub use node::{Attrs, NodeConfig, NodeType};
pub use paint::{DrawCommand, HitRegion, PaintContext};
pub use scene::Scene;
pub use transform::{Decomposition, Transform};
pub use tree::{DirtyFlags, NodeId};

pub mod prelude {
    pub use crate::abstract_group::{AbstractGroupMut, Link};
    pub use crate::error::{Result, SceneError};
    pub use crate::events::SceneEvent;
    pub use crate::node::{Attrs, NodeConfig, NodeType};
    pub use crate::paint::PaintContext;
    pub use crate::scene::Scene;
    pub use crate::transform::Transform;
    pub use crate::tree::NodeId;
}
