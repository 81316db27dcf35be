//! Output of the draw passes.
//!
//! The scene does not rasterise anything itself. A draw pass records what
//! would be painted into a [`PaintContext`], which a backend can consume.

use crate::transform::Transform;
use crate::tree::NodeId;

/// A shape to paint, with its absolute transform applied to a
/// `width` x `height` box anchored at the local origin.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub node: NodeId,
    pub transform: Transform,
    pub width: f32,
    pub height: f32,
    /// Opacity composed with every ancestor
    pub opacity: f32,
}

/// A region that responds to pointer hits.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRegion {
    pub node: NodeId,
    pub transform: Transform,
    pub width: f32,
    pub height: f32,
}

impl HitRegion {
    /// Check whether a point in scene coordinates falls inside the region.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let (lx, ly) = self.transform.inverse().transform_point(x, y);
        lx >= 0.0 && lx < self.width && ly >= 0.0 && ly < self.height
    }
}

#[derive(Debug, Default)]
pub struct PaintContext {
    commands: Vec<DrawCommand>,
    hit_regions: Vec<HitRegion>,
}

impl PaintContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all buffers for reuse, preserving allocated capacity
    pub fn clear(&mut self) {
        self.commands.clear();
        self.hit_regions.clear();
    }

    pub fn draw_shape(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn add_hit_region(&mut self, region: HitRegion) {
        self.hit_regions.push(region);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn hit_regions(&self) -> &[HitRegion] {
        &self.hit_regions
    }

    /// Topmost node whose hit region contains the point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<NodeId> {
        self.hit_regions
            .iter()
            .rev()
            .find(|region| region.contains(x, y))
            .map(|region| region.node)
    }
}
