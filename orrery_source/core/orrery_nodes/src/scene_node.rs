use std::sync::Arc;

use orrery_ids::NodeID;
use orrery_structs::Transform3D;

use crate::NodeData;

/// Arena resident scene element. Parent is a non-owning link; `children`
/// is the owning, ordered edge list.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: Option<Arc<str>>,
    pub parent: NodeID,
    pub children: Vec<NodeID>,
    pub transform: Transform3D,
    pub visible: bool,
    /// Group created on demand for an undeclared parent name.
    pub implicit: bool,
    pub data: NodeData,
}

impl SceneNode {
    pub fn new(data: NodeData) -> Self {
        Self {
            name: None,
            parent: NodeID::nil(),
            children: Vec::new(),
            transform: Transform3D::IDENTITY,
            visible: true,
            implicit: false,
            data,
        }
    }

    pub fn group() -> Self {
        Self::new(NodeData::Group)
    }

    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        self.data.type_name()
    }

    pub fn add_child(&mut self, child: NodeID) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub fn remove_child(&mut self, child: NodeID) {
        self.children.retain(|c| *c != child);
    }
}
