use std::sync::Arc;

use ahash::AHashMap;
use glam::Mat4;
use orrery_ids::NodeID;
use orrery_nodes::{NodeData, SceneNode};

use crate::{NodeArena, SceneError};

/// Owning tree of scene nodes plus the name index.
///
/// The root is created with the graph and never removed. Every other node is
/// owned by exactly one parent through its `children` list.
pub struct SceneGraph {
    nodes: NodeArena,
    root: NodeID,
    names: AHashMap<Arc<str>, NodeID>,
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = NodeArena::new();
        let root = nodes.insert(SceneNode::new(NodeData::Root));
        Self {
            nodes,
            root,
            names: AHashMap::default(),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeID {
        self.root
    }

    #[inline]
    pub fn get(&self, id: NodeID) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeID) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    #[inline]
    pub fn contains(&self, id: NodeID) -> bool {
        self.nodes.contains(id)
    }

    /// Node count, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeID, &SceneNode)> {
        self.nodes.iter()
    }

    pub fn find(&self, name: &str) -> Option<NodeID> {
        self.names.get(name).copied()
    }

    pub fn node_by_name(&self, name: &str) -> Option<&SceneNode> {
        self.find(name).and_then(|id| self.nodes.get(id))
    }

    pub fn children(&self, id: NodeID) -> &[NodeID] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Inserts a detached node. Call [`SceneGraph::attach`] to place it.
    pub fn insert(&mut self, node: SceneNode) -> NodeID {
        self.nodes.insert(node)
    }

    /// Binds `name` to `id`. Rebinding a name to the node that already holds it
    /// is a no-op.
    pub fn bind_name(&mut self, name: &str, id: NodeID) -> Result<(), SceneError> {
        match self.names.get(name) {
            Some(existing) if *existing != id => Err(SceneError::DuplicateName(name.to_string())),
            Some(_) => Ok(()),
            None => {
                let name: Arc<str> = Arc::from(name);
                if let Some(node) = self.nodes.get_mut(id) {
                    node.name = Some(name.clone());
                }
                self.names.insert(name, id);
                Ok(())
            }
        }
    }

    /// True when `ancestor` is `id` itself or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeID, id: NodeID) -> bool {
        let mut cursor = id;
        while let Some(node) = self.nodes.get(cursor) {
            if cursor == ancestor {
                return true;
            }
            cursor = node.parent;
        }
        false
    }

    /// Moves `child` under `parent`, detaching it from its previous parent.
    /// Returns false (and changes nothing) if either id is stale or the move
    /// would create a cycle.
    pub fn attach(&mut self, parent: NodeID, child: NodeID) -> bool {
        if child == self.root
            || !self.nodes.contains(parent)
            || !self.nodes.contains(child)
            || self.is_ancestor(child, parent)
        {
            return false;
        }

        self.detach(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = parent;
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.add_child(child);
        }
        true
    }

    pub fn detach(&mut self, child: NodeID) {
        let Some(old_parent) = self.nodes.get(child).map(|n| n.parent) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(old_parent) {
            parent.remove_child(child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = NodeID::nil();
        }
    }

    /// Removes `id` and all its descendants, unbinding their names.
    /// Returns the number of removed nodes.
    pub fn remove_subtree(&mut self, id: NodeID) -> usize {
        if id == self.root || !self.nodes.contains(id) {
            return 0;
        }
        self.detach(id);

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            if let Some(name) = &node.name
                && self.names.get(name) == Some(&current)
            {
                self.names.remove(name);
            }
            stack.extend(node.children);
            removed += 1;
        }
        removed
    }

    /// True when the parent chain of `id` ends at the root.
    pub fn is_reachable(&self, id: NodeID) -> bool {
        self.nodes.contains(id) && self.is_ancestor(self.root, id)
    }

    /// Product of the local transforms from the root down to `id`.
    pub fn world_transform(&self, id: NodeID) -> Option<Mat4> {
        let mut node = self.nodes.get(id)?;
        let mut world = node.transform.to_mat4();
        while let Some(parent) = self.nodes.get(node.parent) {
            world = parent.transform.to_mat4() * world;
            node = parent;
        }
        Some(world)
    }

    /// Effective visibility: a node is shown only if it and all its ancestors are.
    pub fn is_visible_in_tree(&self, id: NodeID) -> bool {
        let mut cursor = id;
        while let Some(node) = self.nodes.get(cursor) {
            if !node.visible {
                return false;
            }
            cursor = node.parent;
        }
        true
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
