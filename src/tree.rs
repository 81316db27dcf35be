//! Arena-based node storage for the scene graph.
//!
//! The Tree stores every node of a [`Scene`](crate::Scene) using a sparse-set
//! architecture with generational indices.
//!
//! ## Key Features
//!
//! - **Generational Indices**: NodeId contains index + generation, so a stale
//!   id (for example a back-reference to a destroyed node) never aliases a
//!   node allocated later in the same slot.
//!
//! - **Dense Storage**: Nodes stored contiguously for cache-friendly iteration.
//!
//! - **Sparse Map**: O(1) lookup from stable NodeId to dense array index.
//!
//! - **Swap-Remove**: O(1) removal without creating holes in dense storage.
//!
//! - **Redraw Queue**: Marking a node dirty bubbles the flag up to its root,
//!   which is queued for the next draw pass.

use std::collections::HashSet;

use bitflags::bitflags;

use crate::node::NodeData;

bitflags! {
    /// Flags indicating which draw passes a subtree needs
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct DirtyFlags: u8 {
        /// Visible output changed
        const SCENE = 0b01;
        /// Hit regions changed
        const HIT   = 0b10;
    }
}

/// Unique identifier for a node in the scene.
///
/// Uses a generational index design:
/// - `index`: Position in the sparse array (reusable after removal)
/// - `generation`: Version counter that increments when a slot is reused
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Entry in the sparse map, pointing to a dense array slot.
struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

/// A slot in the dense array: the node payload plus its tree links.
struct Entry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    dirty: DirtyFlags,
    /// Back-pointer to sparse array index (for swap-remove fixup)
    sparse_index: u32,
}

/// Central storage for scene nodes.
pub(crate) struct Tree {
    dense: Vec<Entry>,
    sparse: Vec<Option<SparseEntry>>,
    free_indices: Vec<u32>,
    /// Roots that need a draw pass
    draw_roots: HashSet<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            free_indices: Vec::new(),
            draw_roots: HashSet::new(),
        }
    }

    /// Store a node and return its id. The node starts without a parent.
    pub fn register(&mut self, data: NodeData) -> NodeId {
        let (sparse_index, generation) = if let Some(idx) = self.free_indices.pop() {
            let old_gen = self.sparse[idx as usize]
                .as_ref()
                .map(|e| e.generation)
                .unwrap_or(0);
            (idx, old_gen.wrapping_add(1))
        } else {
            let idx = self.sparse.len() as u32;
            self.sparse.push(None);
            (idx, 0)
        };

        let dense_index = self.dense.len();
        self.dense.push(Entry {
            data,
            parent: None,
            children: Vec::new(),
            dirty: DirtyFlags::empty(),
            sparse_index,
        });
        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });

        NodeId::new(sparse_index, generation)
    }

    /// Remove a single node and return its payload.
    ///
    /// The node is detached from its parent. Its children are left in the
    /// arena with a dangling parent id; callers remove subtrees bottom-up.
    pub fn unregister(&mut self, id: NodeId) -> Option<NodeData> {
        let dense_index = self.get_dense_index(id)?;

        self.clear_parent(id);

        let last_dense_index = self.dense.len() - 1;
        let removed = self.dense.swap_remove(dense_index);

        if dense_index != last_dense_index {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            if let Some(ref mut entry) = self.sparse[moved_sparse_idx as usize] {
                entry.dense_index = dense_index;
            }
        }

        // Keep the generation in the free slot so the next allocation bumps it
        self.sparse[id.index as usize] = Some(SparseEntry {
            dense_index: usize::MAX,
            generation: id.generation,
        });
        self.free_indices.push(id.index);
        self.draw_roots.remove(&id);

        Some(removed.data)
    }

    /// Get the dense array index for a NodeId, validating generation.
    fn get_dense_index(&self, id: NodeId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation && e.dense_index != usize::MAX)
            .map(|e| e.dense_index)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get_dense_index(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.get_dense_index(id).map(|idx| &self.dense[idx].data)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let idx = self.get_dense_index(id)?;
        Some(&mut self.dense[idx].data)
    }

    /// Append `child` to the children of `parent`.
    ///
    /// The child must not currently have a parent.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        if let Some(child_dense) = self.get_dense_index(child) {
            self.dense[child_dense].parent = Some(parent);
        }

        if let Some(parent_dense) = self.get_dense_index(parent) {
            let children = &mut self.dense[parent_dense].children;
            if !children.contains(&child) {
                children.push(child);
            }
        }
    }

    /// Detach `child` from its parent, if any. Returns the old parent.
    pub fn clear_parent(&mut self, child: NodeId) -> Option<NodeId> {
        let child_dense = self.get_dense_index(child)?;
        let parent = self.dense[child_dense].parent.take()?;

        if let Some(parent_dense) = self.get_dense_index(parent) {
            self.dense[parent_dense].children.retain(|&c| c != child);
        }

        Some(parent)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_dense_index(id)
            .and_then(|idx| self.dense[idx].parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get_dense_index(id)
            .map(|idx| self.dense[idx].children.as_slice())
            .unwrap_or(&[])
    }

    /// Position of `id` among its parent's children.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// `id` followed by all of its descendants, depth-first pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if !self.contains(node) {
                continue;
            }
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Mark a node as needing a draw pass.
    ///
    /// The flags bubble up to the root, which is added to the draw queue.
    /// Stops early once an ancestor already carries all of `flags`, since its
    /// root must already be queued.
    pub fn mark_needs_draw(&mut self, id: NodeId, flags: DirtyFlags) {
        let mut current = id;

        loop {
            let dense_idx = match self.get_dense_index(current) {
                Some(idx) => idx,
                None => return,
            };

            if self.dense[dense_idx].dirty.contains(flags) {
                return;
            }
            self.dense[dense_idx].dirty |= flags;

            match self.dense[dense_idx].parent {
                Some(parent) => current = parent,
                None => {
                    self.draw_roots.insert(current);
                    return;
                }
            }
        }
    }

    pub fn dirty_flags(&self, id: NodeId) -> DirtyFlags {
        self.get_dense_index(id)
            .map(|idx| self.dense[idx].dirty)
            .unwrap_or_default()
    }

    /// Clear dirty flags for a whole subtree.
    pub fn clear_dirty(&mut self, root: NodeId) {
        for id in self.subtree(root) {
            if let Some(idx) = self.get_dense_index(id) {
                self.dense[idx].dirty = DirtyFlags::empty();
            }
        }
    }

    /// Take all queued roots (clears the queue), in id order.
    pub fn take_draw_roots(&mut self) -> Vec<NodeId> {
        let mut roots: Vec<NodeId> = self.draw_roots.drain().collect();
        roots.sort();
        roots
    }

    pub fn has_draw_roots(&self) -> bool {
        !self.draw_roots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
