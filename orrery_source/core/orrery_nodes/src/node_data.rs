use std::collections::BTreeMap;
use std::sync::Arc;

use orrery_variant::Variant;

/// Type-specific payload of a scene node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    Root,
    Group,
    Model(Model),
    Screen(ScreenSurface),
    PointLight(PointLight),
    Axes(Axes),
    /// Node built by an externally registered type, keeping its raw fields.
    Custom {
        type_tag: Arc<str>,
        fields: BTreeMap<Arc<str>, Variant>,
    },
}

impl NodeData {
    pub fn type_name(&self) -> &str {
        match self {
            NodeData::Root => "Root",
            NodeData::Group => "Group",
            NodeData::Model(_) => "Model",
            NodeData::Screen(_) => "Screen",
            NodeData::PointLight(_) => "PointLight",
            NodeData::Axes(_) => "Axes",
            NodeData::Custom { type_tag, .. } => type_tag,
        }
    }

    #[inline]
    pub const fn is_group(&self) -> bool {
        matches!(self, NodeData::Group | NodeData::Root)
    }
}

/// External model reference. Geometry loading happens in the render backend.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Model {
    pub source: Option<Arc<str>>,
}

/// Flat surface that displays a media source chosen by a screen controller.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenSurface {
    pub width: f32,
    pub height: f32,
    pub channel: Arc<str>,
}

impl ScreenSurface {
    pub fn new(channel: impl Into<Arc<str>>) -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            channel: channel.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: f32,
}

impl PointLight {
    pub const fn new() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            range: 10.0,
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new()
    }
}

/// Debug axes helper.
#[derive(Clone, Debug, PartialEq)]
pub struct Axes {
    pub size: f32,
}

impl Default for Axes {
    fn default() -> Self {
        Self { size: 1.0 }
    }
}
