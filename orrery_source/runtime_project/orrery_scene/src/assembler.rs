use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use orrery_ids::NodeID;
use orrery_nodes::SceneNode;
use orrery_structs::{Transform3D, Vector3};
use orrery_variant::Variant;

use crate::{
    Controller, FactoryContext, NodeRegistry, SceneError, SceneGraph, Spec, SpecIssue,
    flatten_specs,
};

/// Controller produced by a factory, not yet handed to the animation loop.
pub struct AssembledController {
    pub name: Arc<str>,
    pub node: NodeID,
    pub controller: Box<dyn Controller>,
}

#[derive(Default)]
pub struct Assembly {
    /// Nodes built from top-level entries, in document order.
    pub roots: Vec<NodeID>,
    pub controllers: Vec<AssembledController>,
    /// Configuration mistakes that were logged and skipped.
    pub issues: Vec<SpecIssue>,
    undo: Journal,
}

impl Assembly {
    /// Every node this assembly created, implicit groups included.
    #[inline]
    pub fn created(&self) -> &[NodeID] {
        &self.undo.created
    }

    /// Drops the controllers still held here and takes every node this
    /// assembly created back out of `graph`. Claimed groups become implicit
    /// placeholders again.
    pub fn revert(mut self, graph: &mut SceneGraph) {
        self.controllers.clear();
        rollback(graph, std::mem::take(&mut self.undo));
    }
}

impl fmt::Debug for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembly")
            .field("roots", &self.roots)
            .field("controllers", &self.controllers)
            .field("issues", &self.issues)
            .field("created", &self.undo.created.len())
            .finish()
    }
}

impl fmt::Debug for AssembledController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembledController")
            .field("name", &self.name)
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

// Group that existed before this entry and was claimed by a `Group` spec.
struct Claimed {
    id: NodeID,
    parent: NodeID,
    transform: Transform3D,
    visible: bool,
}

// Everything one top-level entry changed, for rollback.
#[derive(Default)]
struct Journal {
    created: Vec<NodeID>,
    claimed: Vec<Claimed>,
    controllers: Vec<AssembledController>,
    issues: Vec<SpecIssue>,
}

/// Builds scene graph subtrees from declarative specs.
pub struct SceneAssembler<'a> {
    registry: &'a NodeRegistry,
    ctx: &'a FactoryContext,
}

impl<'a> SceneAssembler<'a> {
    pub fn new(registry: &'a NodeRegistry, ctx: &'a FactoryContext) -> Self {
        Self { registry, ctx }
    }

    /// Walks `document` depth first. On a fatal error the failing top-level
    /// entry is rolled back and the error returned; entries assembled before it
    /// stay in the graph.
    pub fn assemble(&self, graph: &mut SceneGraph, document: &Variant) -> Result<Assembly, SceneError> {
        let mut entries = Vec::new();
        flatten_specs(document, &mut entries);

        let mut assembly = Assembly::default();
        for entry in entries {
            let mut journal = Journal::default();
            match self.build(graph, entry, None, &mut journal) {
                Ok(id) => {
                    if let Some(id) = id {
                        assembly.roots.push(id);
                    }
                    assembly.controllers.append(&mut journal.controllers);
                    assembly.issues.append(&mut journal.issues);
                    assembly.undo.created.append(&mut journal.created);
                    assembly.undo.claimed.append(&mut journal.claimed);
                }
                Err(err) => {
                    rollback(graph, journal);
                    return Err(err);
                }
            }
        }

        debug!(
            "[scene] assembled {} top-level entries, {} controllers, {} issues",
            assembly.roots.len(),
            assembly.controllers.len(),
            assembly.issues.len()
        );
        Ok(assembly)
    }

    fn build(
        &self,
        graph: &mut SceneGraph,
        value: &Variant,
        implicit_parent: Option<NodeID>,
        journal: &mut Journal,
    ) -> Result<Option<NodeID>, SceneError> {
        let spec = match Spec::from_variant(value) {
            Ok(spec) => spec,
            Err(issue) => {
                report(journal, issue);
                return Ok(None);
            }
        };
        let Some(tag) = spec.type_tag() else {
            report(journal, SpecIssue::MissingType);
            return Ok(None);
        };

        let id = match self.claim_implicit_group(graph, &spec, tag, journal) {
            Some(id) => id,
            None => self.construct(graph, &spec, tag, journal)?,
        };

        if let Some(node) = graph.get_mut(id) {
            apply_common(node, &spec, journal);
        }

        let parent = match spec.parent() {
            Some(parent_name) => group_for(graph, parent_name, journal)?,
            None => implicit_parent.unwrap_or(graph.root()),
        };
        if !graph.attach(parent, id) {
            let parent_label = graph
                .get(parent)
                .and_then(|n| n.name())
                .unwrap_or("<root>")
                .to_string();
            report(
                journal,
                SpecIssue::ParentCycle {
                    child: spec.label().to_string(),
                    parent: parent_label,
                },
            );
            graph.attach(graph.root(), id);
        }

        if let Some(children) = spec.children() {
            let mut nested = Vec::new();
            flatten_specs(children, &mut nested);
            for child in nested {
                self.build(graph, child, Some(id), journal)?;
            }
        }

        Ok(Some(id))
    }

    fn claim_implicit_group(
        &self,
        graph: &mut SceneGraph,
        spec: &Spec,
        tag: &str,
        journal: &mut Journal,
    ) -> Option<NodeID> {
        if tag != "Group" {
            return None;
        }
        let id = graph.find(spec.name()?)?;
        let node = graph.get_mut(id)?;
        if !node.implicit {
            return None;
        }
        journal.claimed.push(Claimed {
            id,
            parent: node.parent,
            transform: node.transform,
            visible: node.visible,
        });
        node.implicit = false;
        debug!("[scene] group `{}` claims its implicit placeholder", spec.label());
        Some(id)
    }

    fn construct(
        &self,
        graph: &mut SceneGraph,
        spec: &Spec,
        tag: &str,
        journal: &mut Journal,
    ) -> Result<NodeID, SceneError> {
        if let Some(name) = spec.name()
            && graph.find(name).is_some()
        {
            return Err(SceneError::DuplicateName(name.to_string()));
        }

        let built = self.registry.create(tag, self.ctx, spec)?;
        let id = graph.insert(built.node);
        journal.created.push(id);
        if let Some(name) = spec.name() {
            graph.bind_name(name, id)?;
        }

        if let Some(mut controller) = built.controller {
            controller.attach(id);
            let name: Arc<str> = match spec.name() {
                Some(name) => Arc::from(name),
                None => Arc::from(format!("{tag}#{id}")),
            };
            journal.controllers.push(AssembledController {
                name,
                node: id,
                controller,
            });
        }

        debug!("[scene] built `{}` ({tag}) as {id}", spec.label());
        Ok(id)
    }
}

/// Named node to parent under; an unknown name gets an implicit group placed
/// under the root and reused by later references.
fn group_for(graph: &mut SceneGraph, name: &str, journal: &mut Journal) -> Result<NodeID, SceneError> {
    if let Some(id) = graph.find(name) {
        return Ok(id);
    }
    let mut group = SceneNode::group();
    group.implicit = true;
    let id = graph.insert(group);
    journal.created.push(id);
    graph.bind_name(name, id)?;
    graph.attach(graph.root(), id);
    debug!("[scene] created implicit group `{name}`");
    Ok(id)
}

fn apply_common(node: &mut SceneNode, spec: &Spec, journal: &mut Journal) {
    match spec.read("position", "a 3-element array", Variant::as_vec3) {
        Ok(Some(v)) => node.transform.position = v,
        Ok(None) => {}
        Err(issue) => report(journal, issue),
    }

    // `rotation` is radians; `rot` is the degree form and loses to `rotation`.
    match spec.read("rotation", "a 3-element array", Variant::as_vec3) {
        Ok(Some(v)) => node.transform.rotation = v,
        Ok(None) => match spec.read("rot", "a 3-element array of degrees", Variant::as_vec3) {
            Ok(Some(v)) => node.transform.rotation = v.to_radians(),
            Ok(None) => {}
            Err(issue) => report(journal, issue),
        },
        Err(issue) => report(journal, issue),
    }

    match spec.read("scale", "a 3-element array or a number", scale_from) {
        Ok(Some(v)) => node.transform.scale = v,
        Ok(None) => {}
        Err(issue) => report(journal, issue),
    }

    match spec.read("visible", "a boolean", Variant::as_bool) {
        Ok(Some(v)) => node.visible = v,
        Ok(None) => {}
        Err(issue) => report(journal, issue),
    }
}

fn scale_from(value: &Variant) -> Option<Vector3> {
    value
        .as_vec3()
        .or_else(|| value.as_f64_lossy().map(|s| Vector3::splat(s as f32)))
}

fn report(journal: &mut Journal, issue: SpecIssue) {
    warn!("[scene] {issue}; skipped");
    journal.issues.push(issue);
}

fn rollback(graph: &mut SceneGraph, journal: Journal) {
    for claimed in journal.claimed.iter().rev() {
        graph.attach(claimed.parent, claimed.id);
        if let Some(node) = graph.get_mut(claimed.id) {
            node.implicit = true;
            node.transform = claimed.transform;
            node.visible = claimed.visible;
        }
    }
    let mut removed = 0;
    for id in journal.created.iter().rev() {
        removed += graph.remove_subtree(*id);
    }
    warn!("[scene] rolled back {removed} node(s)");
}
