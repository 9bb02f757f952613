use orrery_ids::NodeID;
use orrery_nodes::SceneNode;

/// Slot arena with generation checked handles. Index 0 is the nil sentinel.
pub struct NodeArena {
    nodes: Vec<Option<SceneNode>>,
    generations: Vec<u32>,
    free_indices: Vec<usize>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: vec![None],
            generations: vec![0],
            free_indices: Vec::new(),
        }
    }

    pub fn insert(&mut self, node: SceneNode) -> NodeID {
        if let Some(index) = self.free_indices.pop() {
            self.nodes[index] = Some(node);
            return NodeID::from_parts(index as u32, self.generations[index]);
        }

        let index = self.nodes.len();
        self.nodes.push(Some(node));
        self.generations.push(0);
        NodeID::from_parts(index as u32, 0)
    }

    #[inline]
    fn slot(&self, id: NodeID) -> Option<usize> {
        let index = id.index() as usize;
        if id.is_nil()
            || index == 0
            || index >= self.nodes.len()
            || self.generations[index] != id.generation()
        {
            return None;
        }
        Some(index)
    }

    pub fn get(&self, id: NodeID) -> Option<&SceneNode> {
        self.slot(id).and_then(|i| self.nodes[i].as_ref())
    }

    pub fn get_mut(&mut self, id: NodeID) -> Option<&mut SceneNode> {
        self.slot(id).and_then(|i| self.nodes[i].as_mut())
    }

    /// Frees the slot and bumps its generation so stale ids stop resolving.
    pub fn remove(&mut self, id: NodeID) -> Option<SceneNode> {
        let index = self.slot(id)?;
        let removed = self.nodes[index].take();
        if removed.is_some() {
            self.generations[index] = self.generations[index].wrapping_add(1);
            self.free_indices.push(index);
        }
        removed
    }

    pub fn contains(&self, id: NodeID) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeID, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, node)| {
                node.as_ref()
                    .map(|n| (NodeID::from_parts(index as u32, self.generations[index]), n))
            })
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|n| n.is_none())
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}
