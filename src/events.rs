//! Synchronous structural-change notifications.

use std::collections::HashMap;

use crate::tree::NodeId;

/// A structural change, delivered to listeners of the container it happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    /// `child` was attached to `parent`
    Add { parent: NodeId, child: NodeId },
    /// `child` was detached from `parent`
    Remove { parent: NodeId, child: NodeId },
}

impl SceneEvent {
    pub fn parent(&self) -> NodeId {
        match self {
            SceneEvent::Add { parent, .. } | SceneEvent::Remove { parent, .. } => *parent,
        }
    }

    pub fn child(&self) -> NodeId {
        match self {
            SceneEvent::Add { child, .. } | SceneEvent::Remove { child, .. } => *child,
        }
    }
}

/// Handle returned by [`Scene::on`](crate::Scene::on), used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&SceneEvent)>;

/// Per-node listener lists.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    by_node: HashMap<NodeId, Vec<(ListenerId, Callback)>>,
}

impl Listeners {
    pub fn on(&mut self, node: NodeId, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.by_node.entry(node).or_default().push((id, callback));
        id
    }

    pub fn off(&mut self, node: NodeId, listener: ListenerId) -> bool {
        let Some(list) = self.by_node.get_mut(&node) else {
            return false;
        };
        let before = list.len();
        list.retain(|(id, _)| *id != listener);
        let removed = list.len() != before;
        if list.is_empty() {
            self.by_node.remove(&node);
        }
        removed
    }

    /// Call every listener registered on `target`, in registration order.
    pub fn fire(&mut self, target: NodeId, event: &SceneEvent) {
        if let Some(list) = self.by_node.get_mut(&target) {
            for (_, callback) in list.iter_mut() {
                callback(event);
            }
        }
    }

    pub fn forget(&mut self, node: NodeId) {
        self.by_node.remove(&node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeConfig, NodeData, NodeType};
    use crate::tree::Tree;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ids() -> (NodeId, NodeId) {
        let mut tree = Tree::new();
        let a = tree.register(NodeData::new(NodeType::Group, NodeConfig::default()));
        let b = tree.register(NodeData::new(NodeType::Shape, NodeConfig::default()));
        (a, b)
    }

    #[test]
    fn test_fire_in_registration_order() {
        let (parent, child) = ids();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();

        let first = log.clone();
        listeners.on(parent, Box::new(move |_| first.borrow_mut().push(1)));
        let second = log.clone();
        listeners.on(parent, Box::new(move |_| second.borrow_mut().push(2)));

        listeners.fire(parent, &SceneEvent::Add { parent, child });
        assert_eq!(*log.borrow(), vec![1, 2]);

        // Other nodes have no listeners
        listeners.fire(child, &SceneEvent::Add { parent, child });
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_off() {
        let (parent, child) = ids();
        let count = Rc::new(RefCell::new(0));
        let mut listeners = Listeners::default();

        let counter = count.clone();
        let id = listeners.on(parent, Box::new(move |_| *counter.borrow_mut() += 1));

        assert!(listeners.off(parent, id));
        assert!(!listeners.off(parent, id));

        listeners.fire(parent, &SceneEvent::Remove { parent, child });
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_event_accessors() {
        let (parent, child) = ids();
        let event = SceneEvent::Remove { parent, child };
        assert_eq!(event.parent(), parent);
        assert_eq!(event.child(), child);
    }
}
