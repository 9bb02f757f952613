use orrery_nodes::{Axes, Model, NodeData, PointLight, SceneNode};
use orrery_variant::Variant;

use crate::{Built, NodeRegistry, SceneError};

/// Registers the structural and static visual types.
pub fn register_builtin_types(registry: &mut NodeRegistry) -> Result<(), SceneError> {
    registry.register("Group", |_, _| Ok(Built::node(SceneNode::group())))?;
    // Pure container for spliced-in child lists.
    registry.register("Inline", |_, _| Ok(Built::node(SceneNode::group())))?;

    registry.register("Model", |ctx, spec| {
        let source = spec
            .str_field("path")
            .or_else(|| spec.str_field("url"))
            .or_else(|| spec.str_field("source"))
            .map(|p| ctx.resolve_path(p).to_string_lossy().into_owned().into());
        Ok(Built::node(SceneNode::new(NodeData::Model(Model { source }))))
    })?;

    registry.register("PointLight", |_, spec| {
        let mut light = PointLight::new();
        if let Some(color) = spec.vec3_field("color") {
            light.color = color.to_array();
        } else if let Some(packed) = spec.f64_field("color") {
            light.color = unpack_rgb(packed as u32);
        }
        if let Some(intensity) = spec.f64_field("intensity") {
            light.intensity = intensity as f32;
        }
        if let Some(range) = spec.f64_field("range").or_else(|| spec.f64_field("distance")) {
            light.range = range as f32;
        }
        Ok(Built::node(SceneNode::new(NodeData::PointLight(light))))
    })?;

    registry.register("Axes", |_, spec| {
        let mut axes = Axes::default();
        if let Some(size) = spec.get("size").and_then(Variant::as_f64_lossy) {
            axes.size = size as f32;
        }
        Ok(Built::node(SceneNode::new(NodeData::Axes(axes))))
    })?;

    Ok(())
}

/// `0xRRGGBB` to linear components in `[0, 1]`.
fn unpack_rgb(packed: u32) -> [f32; 3] {
    let channel = |shift: u32| ((packed >> shift) & 0xFF) as f32 / 255.0;
    [channel(16), channel(8), channel(0)]
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use orrery_state::StateBus;

    use super::*;
    use crate::{FactoryContext, Spec};

    fn build(spec: &Spec) -> SceneNode {
        let mut registry = NodeRegistry::new();
        register_builtin_types(&mut registry).unwrap();
        let ctx = FactoryContext::new(Rc::new(StateBus::new()), "/show");
        registry
            .create(spec.type_tag().unwrap(), &ctx, spec)
            .unwrap()
            .node
    }

    #[test]
    fn light_accepts_packed_and_array_colors() {
        let node = build(&Spec::new("PointLight").with("color", 0xff0080_i64).with("distance", 5000.0));
        let NodeData::PointLight(light) = node.data else {
            panic!("expected a light");
        };
        assert_eq!(light.color[0], 1.0);
        assert_eq!(light.color[1], 0.0);
        assert!((light.color[2] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(light.range, 5000.0);

        let array = Variant::from(vec![Variant::from(0.5), Variant::from(0.25), Variant::from(1.0)]);
        let node = build(&Spec::new("PointLight").with("color", array));
        let NodeData::PointLight(light) = node.data else {
            panic!("expected a light");
        };
        assert_eq!(light.color, [0.5, 0.25, 1.0]);
    }

    #[test]
    fn model_resolves_res_paths() {
        let node = build(&Spec::new("Model").with("path", "res://models/dome.glb"));
        let NodeData::Model(model) = node.data else {
            panic!("expected a model");
        };
        assert_eq!(model.source.as_deref(), Some("/show/models/dome.glb"));
    }
}
