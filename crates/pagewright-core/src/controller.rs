//! Element controllers: the binders between model objects and nodes of the
//! rendered document.
//!
//! A controller owns exactly one model object and claims at most one live
//! node. Model changes flow into the node through `update`, deferred behind
//! a dirty flag so several attribute changes within one logical edit flush
//! as a single write pass.

use crate::dom::NodeId;
use crate::error::{EditorError, EditorResult};
use crate::item::ItemId;
use crate::surface::DocumentSurface;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// The application-side model object a controller pushes into the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementModel {
    /// Identity of the model object.
    pub id: Uuid,
    /// The `id` attribute of the element representing this model in the
    /// rendered document. Used for top-down location.
    pub element_id: String,
    /// Attributes to mirror onto the element.
    pub attributes: Map<String, Value>,
    /// Text content to mirror, for models with character data.
    pub text: Option<String>,
}

impl ElementModel {
    /// Create a model bound to the element carrying `element_id`.
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            element_id: element_id.into(),
            attributes: Map::new(),
            text: None,
        }
    }

    /// Set one attribute.
    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
}

/// Binds one [`ElementModel`] to one node of the rendered document.
#[derive(Debug, Clone)]
pub struct ElementController {
    model: ElementModel,
    node: Option<NodeId>,
    needs_update: bool,
}

impl ElementController {
    /// Create an unbound controller for `model`.
    pub fn new(model: ElementModel) -> Self {
        Self {
            model,
            node: None,
            needs_update: false,
        }
    }

    /// The owned model object.
    pub fn model(&self) -> &ElementModel {
        &self.model
    }

    /// Mutable access to the owned model object. Callers that change it
    /// should follow up with [`set_needs_update`](Self::set_needs_update).
    pub fn model_mut(&mut self) -> &mut ElementModel {
        &mut self.model
    }

    /// The bound node, once located or attached.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Whether the controller has claimed a node.
    pub fn is_located(&self) -> bool {
        self.node.is_some()
    }

    /// Find this controller's node in the loaded document by its `id`
    /// attribute. A no-op when already located.
    pub fn locate(&mut self, surface: &dyn DocumentSurface) -> EditorResult<NodeId> {
        if let Some(node) = self.node {
            return Ok(node);
        }
        let node = surface
            .find_node_by_attribute("id", &self.model.element_id)
            .ok_or_else(|| EditorError::NodeNotFound(self.model.element_id.clone()))?;
        self.node = Some(node);
        Ok(node)
    }

    /// Bind directly to `node`, replacing any prior binding. Used when
    /// nodes are discovered bottom-up while enumerating a loaded document.
    pub fn attach_to_element(&mut self, node: NodeId) {
        self.node = Some(node);
    }

    /// Drop the node binding, e.g. when the document unloads.
    pub fn unbind(&mut self) {
        self.node = None;
        self.needs_update = false;
    }

    /// Push the model's current state into the bound node. Safe to call
    /// redundantly; clears the dirty flag.
    pub fn update(&mut self, surface: &mut dyn DocumentSurface) -> EditorResult<()> {
        let node = self.node.ok_or(EditorError::NotLoaded)?;
        if surface.node_range(node).is_none() {
            // The bound node is gone; the content was removed externally.
            return Err(EditorError::NodeNotFound(self.model.element_id.clone()));
        }
        for (name, value) in &self.model.attributes {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            surface.set_node_attribute(node, name, &rendered);
        }
        if let Some(text) = &self.model.text
            && let Some(range) = surface.node_range(node)
        {
            surface.set_text_in_range(&range, text);
        }
        self.needs_update = false;
        Ok(())
    }

    /// Mark the controller for a later [`update`](Self::update). Redundant
    /// marks coalesce; the flush happens at the editor's per-turn flush
    /// point, never synchronously.
    pub fn set_needs_update(&mut self) {
        self.needs_update = true;
    }

    /// Whether a flush is pending.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Read the bound node's attributes and text back into the model. The
    /// read path of the round trip, used during resync.
    pub fn resync_from_element(&mut self, surface: &dyn DocumentSurface) -> EditorResult<()> {
        let node = self.node.ok_or(EditorError::NotLoaded)?;
        for (name, value) in self.model.attributes.iter_mut() {
            if let Some(current) = surface.node_attribute(node, name) {
                *value = Value::String(current);
            }
        }
        if self.model.text.is_some() {
            let text = surface
                .node_range(node)
                .and_then(|range| surface.text_in_range(&range));
            if let Some(text) = text {
                self.model.text = Some(text);
            }
        }
        Ok(())
    }
}

/// Registry of controllers, one per item.
///
/// Upholds the invariant that at most one controller claims a given live
/// node. A late claim wins: discovering a node bottom-up evicts whichever
/// controller previously held it, since the previous binding is stale by
/// then.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<ItemId, ElementController>,
    by_node: HashMap<NodeId, ItemId>,
}

impl ControllerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an unbound controller for `item`, replacing any existing
    /// one.
    pub fn register(&mut self, item: ItemId, controller: ElementController) {
        if let Some(old) = self.controllers.insert(item, controller)
            && let Some(node) = old.node()
        {
            self.by_node.remove(&node);
        }
    }

    /// The controller for `item`.
    pub fn get(&self, item: ItemId) -> Option<&ElementController> {
        self.controllers.get(&item)
    }

    /// Mutable controller access.
    pub fn get_mut(&mut self, item: ItemId) -> Option<&mut ElementController> {
        self.controllers.get_mut(&item)
    }

    /// The item whose controller claims `node`.
    pub fn item_for_node(&self, node: NodeId) -> Option<ItemId> {
        self.by_node.get(&node).copied()
    }

    /// Locate `item`'s controller in the loaded document and record its
    /// node claim.
    pub fn locate(&mut self, item: ItemId, surface: &dyn DocumentSurface) -> EditorResult<NodeId> {
        let controller = self
            .controllers
            .get_mut(&item)
            .ok_or(EditorError::NotLoaded)?;
        let node = controller.locate(surface)?;
        self.claim(item, node);
        Ok(node)
    }

    /// Bind `item`'s controller to a node discovered bottom-up.
    pub fn attach(&mut self, item: ItemId, node: NodeId) -> EditorResult<()> {
        let controller = self
            .controllers
            .get_mut(&item)
            .ok_or(EditorError::NotLoaded)?;
        if let Some(old) = controller.node() {
            self.by_node.remove(&old);
        }
        controller.attach_to_element(node);
        self.claim(item, node);
        Ok(())
    }

    fn claim(&mut self, item: ItemId, node: NodeId) {
        if let Some(previous) = self.by_node.insert(node, item)
            && previous != item
        {
            log::warn!(
                "node {:?} reclaimed from item {:?} by item {:?}",
                node,
                previous,
                item
            );
            if let Some(stale) = self.controllers.get_mut(&previous) {
                stale.unbind();
            }
        }
    }

    /// Mark `item`'s controller dirty.
    pub fn set_needs_update(&mut self, item: ItemId) {
        if let Some(controller) = self.controllers.get_mut(&item) {
            controller.set_needs_update();
        }
    }

    /// Flush every dirty controller. Returns the items whose nodes turned
    /// out to be gone so the caller can prune them.
    pub fn flush(&mut self, surface: &mut dyn DocumentSurface) -> Vec<ItemId> {
        let mut failed = Vec::new();
        for (&item, controller) in self.controllers.iter_mut() {
            if !controller.needs_update() {
                continue;
            }
            if let Err(err) = controller.update(surface) {
                log::warn!("update of item {:?} failed: {err}", item);
                failed.push(item);
            }
        }
        failed
    }

    /// Remove `item`'s controller and release its node claim.
    pub fn remove(&mut self, item: ItemId) {
        if let Some(controller) = self.controllers.remove(&item)
            && let Some(node) = controller.node()
            && self.by_node.get(&node) == Some(&item)
        {
            self.by_node.remove(&node);
        }
    }

    /// Release every node binding, keeping the controllers and their
    /// models. Called when the document unloads.
    pub fn unbind_all(&mut self) {
        for controller in self.controllers.values_mut() {
            controller.unbind();
        }
        self.by_node.clear();
    }

    /// Number of registered controllers.
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether no controllers are registered.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
