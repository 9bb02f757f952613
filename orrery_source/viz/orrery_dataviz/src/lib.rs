//! Time-synchronized scenario visualization: two climate projections blended
//! by year, played back against program time.

mod blend_policy;
mod blender;
mod controller;
mod dataset;
mod error;
mod feed;
mod playback;

pub use blend_policy::{BlendPolicy, BlendWindow};
pub use blender::ScenarioBlender;
pub use controller::{DEFAULT_DATA_PATH, DataVizController};
pub use dataset::{Dataset, Parameter, ScenarioData};
pub use error::DataError;
pub use feed::{JsonFileSource, PendingFeed, ScenarioSource};
pub use playback::{PlaybackConfig, PlaybackEngine, PlaybackState, StaggeredCurve};

use orrery_scene::{NodeRegistry, SceneError};

/// Registers `DataViz` and its `CMPDataViz` alias.
pub fn register_node_types(registry: &mut NodeRegistry) -> Result<(), SceneError> {
    registry.register("DataViz", controller::build_dataviz)?;
    registry.register("CMPDataViz", controller::build_dataviz)?;
    Ok(())
}
