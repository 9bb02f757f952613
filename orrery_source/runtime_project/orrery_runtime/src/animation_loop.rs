use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, warn};
use orrery_ids::{ControllerID, HandlerID};
use orrery_scene::{Controller, FrameContext, SceneGraph};
use orrery_state::StateBus;
use thiserror::Error;

use crate::{CameraRig, RenderBackend};

/// Per-frame callback. Closures are the only handler shape, so a
/// non-callable handler cannot be registered at all.
pub type UpdateHandler = Box<dyn FnMut(&mut FrameContext<'_>) -> anyhow::Result<()>>;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("controller `{0}` does not declare an update step")]
    UnsupportedController(String),

    #[error("controller `{0}` is already registered")]
    DuplicateController(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames: u64,
    pub step_errors: u64,
    pub step_panics: u64,
}

enum StepKind {
    Handler(UpdateHandler),
    Controller {
        id: ControllerID,
        controller: Box<dyn Controller>,
    },
}

struct Step {
    label: Arc<str>,
    kind: StepKind,
    failures: u32,
}

impl Step {
    fn run(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        match &mut self.kind {
            StepKind::Handler(handler) => handler(ctx),
            StepKind::Controller { controller, .. } => controller.update(ctx),
        }
    }
}

/// Ordered list of frame steps. Each frame: camera rig, every step in
/// registration order, then render.
#[derive(Default)]
pub struct AnimationLoop {
    steps: Vec<Step>,
    controllers: AHashMap<Arc<str>, usize>,
    next_handler: u32,
    next_controller: u32,
    rig: Option<Box<dyn CameraRig>>,
    stats: LoopStats,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_update_handler<F>(&mut self, handler: F) -> HandlerID
    where
        F: FnMut(&mut FrameContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.next_handler += 1;
        let id = HandlerID::from_parts(self.next_handler, 0);
        self.steps.push(Step {
            label: Arc::from(format!("handler#{id}")),
            kind: StepKind::Handler(Box::new(handler)),
            failures: 0,
        });
        id
    }

    pub fn register_controller(
        &mut self,
        name: &str,
        controller: Box<dyn Controller>,
    ) -> Result<ControllerID, LoopError> {
        if !controller.flags().has_update() {
            return Err(LoopError::UnsupportedController(name.to_string()));
        }
        if self.controllers.contains_key(name) {
            return Err(LoopError::DuplicateController(name.to_string()));
        }

        self.next_controller += 1;
        let id = ControllerID::from_parts(self.next_controller, 0);
        let label: Arc<str> = Arc::from(name);
        self.controllers.insert(label.clone(), self.steps.len());
        self.steps.push(Step {
            label,
            kind: StepKind::Controller { id, controller },
            failures: 0,
        });
        debug!("[loop] controller `{name}` registered as {id}");
        Ok(id)
    }

    pub fn set_camera_rig(&mut self, rig: impl CameraRig + 'static) {
        self.rig = Some(Box::new(rig));
    }

    pub fn controller_id(&self, name: &str) -> Option<ControllerID> {
        let &index = self.controllers.get(name)?;
        match &self.steps[index].kind {
            StepKind::Controller { id, .. } => Some(*id),
            StepKind::Handler(_) => None,
        }
    }

    pub fn controller(&self, name: &str) -> Option<&dyn Controller> {
        let &index = self.controllers.get(name)?;
        match &self.steps[index].kind {
            StepKind::Controller { controller, .. } => Some(controller.as_ref()),
            StepKind::Handler(_) => None,
        }
    }

    pub fn controller_mut(&mut self, name: &str) -> Option<&mut dyn Controller> {
        let &index = self.controllers.get(name)?;
        match &mut self.steps[index].kind {
            StepKind::Controller { controller, .. } => Some(controller.as_mut()),
            StepKind::Handler(_) => None,
        }
    }

    /// Downcasts a named controller to its concrete type.
    pub fn controller_as<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.controller_mut(name)?.as_any_mut().downcast_mut::<T>()
    }

    pub fn controller_names(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(|k| k.as_ref())
    }

    #[inline]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Failures recorded for the step registered under `label`
    /// (controller name, or `handler#<id>`).
    pub fn failures(&self, label: &str) -> u32 {
        self.steps
            .iter()
            .find(|s| s.label.as_ref() == label)
            .map_or(0, |s| s.failures)
    }

    /// Runs one frame. A step that errors or panics is logged and counted;
    /// the remaining steps and the render still run.
    pub fn frame(
        &mut self,
        time_ms: f64,
        delta_ms: f64,
        graph: &mut SceneGraph,
        bus: &StateBus,
        renderer: &mut dyn RenderBackend,
    ) {
        if let Some(rig) = self.rig.as_mut() {
            rig.update(time_ms, graph);
        }

        let mut ctx = FrameContext {
            time_ms,
            delta_ms,
            graph,
            bus,
        };
        for step in &mut self.steps {
            match catch_unwind(AssertUnwindSafe(|| step.run(&mut ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    step.failures = step.failures.saturating_add(1);
                    self.stats.step_errors += 1;
                    warn!("[loop] `{}` failed: {err:#}", step.label);
                }
                Err(payload) => {
                    step.failures = step.failures.saturating_add(1);
                    self.stats.step_panics += 1;
                    warn!("[loop] `{}` panicked: {}", step.label, panic_message(&*payload));
                }
            }
        }

        renderer.draw_frame(ctx.graph);
        self.stats.frames += 1;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic>"
    }
}
