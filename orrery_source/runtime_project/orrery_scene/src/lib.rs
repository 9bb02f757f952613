mod assembler;
mod builtins;
mod controller;
mod error;
mod node_arena;
mod registry;
mod scene_graph;
mod spec;

pub use assembler::{AssembledController, Assembly, SceneAssembler};
pub use builtins::register_builtin_types;
pub use controller::{Controller, ControllerFlags, FrameContext};
pub use error::{SceneError, SpecIssue};
pub use node_arena::NodeArena;
pub use registry::{Built, FactoryContext, NodeFactory, NodeRegistry};
pub use scene_graph::SceneGraph;
pub use spec::{Spec, flatten_specs};
