use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use ahash::AHashMap;
use log::debug;
use orrery_nodes::SceneNode;
use orrery_project::resolve_res_path;
use orrery_state::StateBus;

use crate::{Controller, SceneError, Spec};

/// Shared services handed to every factory.
#[derive(Clone)]
pub struct FactoryContext {
    pub bus: Rc<StateBus>,
    /// Directory that `res://` paths resolve against.
    pub project_root: PathBuf,
}

impl FactoryContext {
    pub fn new(bus: Rc<StateBus>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            bus,
            project_root: project_root.into(),
        }
    }

    /// `res://a/b.json` → `<project_root>/a/b.json`; anything else, URLs
    /// included, is passed through.
    #[inline]
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        resolve_res_path(path, &self.project_root)
    }
}

/// Result of a factory call: the visual node plus an optional controller that
/// the loop will drive once assembly succeeds.
pub struct Built {
    pub node: SceneNode,
    pub controller: Option<Box<dyn Controller>>,
}

impl Built {
    pub fn node(node: SceneNode) -> Self {
        Self {
            node,
            controller: None,
        }
    }

    pub fn with_controller(mut self, controller: impl Controller) -> Self {
        self.controller = Some(Box::new(controller));
        self
    }
}

pub type NodeFactory = Box<dyn Fn(&FactoryContext, &Spec) -> anyhow::Result<Built>>;

/// Type tag → factory. Tags are unique; registering one twice is an error.
#[derive(Default)]
pub struct NodeRegistry {
    factories: AHashMap<Arc<str>, NodeFactory>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, tag: &str, factory: F) -> Result<(), SceneError>
    where
        F: Fn(&FactoryContext, &Spec) -> anyhow::Result<Built> + 'static,
    {
        if self.factories.contains_key(tag) {
            return Err(SceneError::DuplicateType(tag.to_string()));
        }
        self.factories.insert(Arc::from(tag), Box::new(factory));
        debug!("[scene] registered node type `{tag}`");
        Ok(())
    }

    pub fn create(&self, tag: &str, ctx: &FactoryContext, spec: &Spec) -> Result<Built, SceneError> {
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| SceneError::UnknownType(tag.to_string()))?;
        factory(ctx, spec).map_err(|source| SceneError::Factory {
            tag: tag.to_string(),
            source,
        })
    }

    #[inline]
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(|k| k.as_ref()).collect();
        tags.sort_unstable();
        tags
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
