mod node_data;
mod scene_node;

pub use node_data::{Axes, Model, NodeData, PointLight, ScreenSurface};
pub use scene_node::SceneNode;

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_ids::NodeID;

    #[test]
    fn new_node_defaults() {
        let node = SceneNode::new(NodeData::Axes(Axes::default()));
        assert!(node.name().is_none());
        assert!(node.parent.is_nil());
        assert!(node.visible);
        assert!(!node.implicit);
        assert!(node.transform.is_identity());
        assert_eq!(node.type_name(), "Axes");
    }

    #[test]
    fn add_child_keeps_order_and_ignores_duplicates() {
        let mut node = SceneNode::group().with_name("g1");
        let a = NodeID::from_parts(1, 0);
        let b = NodeID::from_parts(2, 0);
        node.add_child(a);
        node.add_child(b);
        node.add_child(a);
        assert_eq!(node.children, vec![a, b]);

        node.remove_child(a);
        assert_eq!(node.children, vec![b]);
    }

    #[test]
    fn custom_type_name_is_tag() {
        let data = NodeData::Custom {
            type_tag: "DataViz".into(),
            fields: Default::default(),
        };
        assert_eq!(data.type_name(), "DataViz");
        assert!(!data.is_group());
        assert!(NodeData::Group.is_group());
    }
}
