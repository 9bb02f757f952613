mod animation_loop;
mod program_clock;
mod render;
mod runtime;
mod screen;

pub use animation_loop::{AnimationLoop, LoopError, LoopStats, UpdateHandler};
pub use program_clock::{ClockConfig, ProgramClock};
pub use render::{CameraRig, NullRenderer, RenderBackend};
pub use runtime::{CLOCK_CONTROLLER, Runtime, RuntimeError};
pub use screen::{MediaPlayback, ScreenController, ScreenState};

use orrery_scene::{NodeRegistry, SceneError};

/// Registers `Screen` and its `Screen2` alias.
pub fn register_node_types(registry: &mut NodeRegistry) -> Result<(), SceneError> {
    registry.register("Screen", screen::build_screen)?;
    registry.register("Screen2", screen::build_screen)?;
    Ok(())
}
