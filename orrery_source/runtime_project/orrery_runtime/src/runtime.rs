use std::path::PathBuf;
use std::rc::Rc;

use ahash::AHashSet;
use log::{info, warn};
use orrery_scene::{
    Assembly, FactoryContext, NodeRegistry, SceneAssembler, SceneError, SceneGraph,
    register_builtin_types,
};
use orrery_state::StateBus;
use orrery_variant::Variant;
use thiserror::Error;

use crate::{AnimationLoop, ClockConfig, LoopError, ProgramClock, RenderBackend, register_node_types};

pub const CLOCK_CONTROLLER: &str = "clock";

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Loop(#[from] LoopError),
}

/// Scene graph, state bus, type registry and animation loop of one
/// presentation.
pub struct Runtime {
    pub graph: SceneGraph,
    pub bus: Rc<StateBus>,
    pub registry: NodeRegistry,
    pub animation: AnimationLoop,
    project_root: PathBuf,
    elapsed_ms: f64,
}

impl Runtime {
    /// Runtime with the structural types and screens registered.
    pub fn new(project_root: impl Into<PathBuf>) -> Result<Self, RuntimeError> {
        let mut registry = NodeRegistry::new();
        register_builtin_types(&mut registry)?;
        register_node_types(&mut registry)?;

        Ok(Self {
            graph: SceneGraph::new(),
            bus: StateBus::shared(),
            registry,
            animation: AnimationLoop::new(),
            project_root: project_root.into(),
            elapsed_ms: 0.0,
        })
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn factory_context(&self) -> FactoryContext {
        FactoryContext::new(self.bus.clone(), self.project_root.clone())
    }

    /// Registers the program clock as the `clock` controller. Install it before
    /// loading the scene so components see an initial `time`.
    pub fn install_clock(&mut self, config: ClockConfig) -> Result<(), RuntimeError> {
        let clock = ProgramClock::new(&self.bus, config);
        self.animation
            .register_controller(CLOCK_CONTROLLER, Box::new(clock))?;
        Ok(())
    }

    pub fn clock_mut(&mut self) -> Option<&mut ProgramClock> {
        self.animation.controller_as::<ProgramClock>(CLOCK_CONTROLLER)
    }

    /// Scrubs program time through the clock.
    pub fn seek_to(&mut self, t: f64) -> bool {
        let bus = self.bus.clone();
        match self.clock_mut() {
            Some(clock) => {
                clock.seek_to(&bus, t);
                true
            }
            None => false,
        }
    }

    /// Assembles `document` into the graph, then hands every produced
    /// controller to the animation loop. A controller the loop would refuse
    /// reverts the whole assembly before anything is registered.
    pub fn load_scene(&mut self, document: &Variant) -> Result<Assembly, RuntimeError> {
        let ctx = self.factory_context();
        let mut assembly =
            SceneAssembler::new(&self.registry, &ctx).assemble(&mut self.graph, document)?;

        if let Err(err) = self.check_controllers(&assembly) {
            warn!("[runtime] scene rejected: {err}");
            assembly.revert(&mut self.graph);
            return Err(err.into());
        }
        for assembled in assembly.controllers.drain(..) {
            self.animation
                .register_controller(&assembled.name, assembled.controller)?;
        }
        info!(
            "[runtime] scene loaded: {} nodes, {} frame steps",
            self.graph.len(),
            self.animation.step_count()
        );
        Ok(assembly)
    }

    fn check_controllers(&self, assembly: &Assembly) -> Result<(), LoopError> {
        let mut seen = AHashSet::new();
        for assembled in &assembly.controllers {
            let name = assembled.name.as_ref();
            if !assembled.controller.flags().has_update() {
                return Err(LoopError::UnsupportedController(name.to_string()));
            }
            if self.animation.controller_id(name).is_some() || !seen.insert(name) {
                return Err(LoopError::DuplicateController(name.to_string()));
            }
        }
        Ok(())
    }

    pub fn frame(&mut self, delta_ms: f64, renderer: &mut dyn RenderBackend) {
        self.elapsed_ms += delta_ms.max(0.0);
        self.animation.frame(
            self.elapsed_ms,
            delta_ms,
            &mut self.graph,
            &self.bus,
            renderer,
        );
    }
}
