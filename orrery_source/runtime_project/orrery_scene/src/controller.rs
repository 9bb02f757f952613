use std::any::Any;

use orrery_ids::NodeID;
use orrery_state::StateBus;

use crate::SceneGraph;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerFlags(u8);

impl ControllerFlags {
    pub const NONE: u8 = 0;
    pub const UPDATE: u8 = 1 << 0;

    #[inline(always)]
    pub const fn new(flags: u8) -> Self {
        ControllerFlags(flags)
    }

    #[inline(always)]
    pub const fn has_update(self) -> bool {
        self.0 & Self::UPDATE != 0
    }
}

/// Everything a per-frame callback may touch.
pub struct FrameContext<'a> {
    /// Timestamp handed to the frame, milliseconds.
    pub time_ms: f64,
    /// Time since the previous frame, milliseconds.
    pub delta_ms: f64,
    pub graph: &'a mut SceneGraph,
    pub bus: &'a StateBus,
}

/// Non-visual behaviour driven once per frame by the animation loop.
pub trait Controller: Any {
    fn flags(&self) -> ControllerFlags {
        ControllerFlags::new(ControllerFlags::UPDATE)
    }

    /// Called once the node built alongside this controller is placed.
    fn attach(&mut self, _node: NodeID) {}

    fn update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
