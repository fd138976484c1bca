//! Region registry.
//!
//! Maps region ids to their [`ModalController`] and document nodes to the
//! controller they report to. Elements never hold a reference to a
//! controller; the page looks the binding up by node id when an event fires.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut registry = ModalRegistry::new();
//! registry.attach(ModalController::new("cart", ZLayer::DEFAULT));
//!
//! registry.bind_region(&document, "cart");
//! let bound = registry.bind_all(&document, &Scope::Document);
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::document::{Document, NodeId, Scope};
use crate::modal::ModalController;

/// What a bound node reports to its controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A form: submit and request hooks.
    Form { region: String },
    /// A link or button: click hooks.
    Navigation { region: String },
    /// The region node itself: request, response and error hooks.
    Region { region: String },
}

impl Binding {
    pub fn region(&self) -> &str {
        match self {
            Self::Form { region } | Self::Navigation { region } | Self::Region { region } => region,
        }
    }
}

#[derive(Debug, Default)]
pub struct ModalRegistry {
    controllers: BTreeMap<String, ModalController>,
    bindings: HashMap<NodeId, Binding>,
}

impl ModalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller, replacing any previous one for the region.
    pub fn attach(&mut self, controller: ModalController) -> Option<ModalController> {
        self.controllers
            .insert(controller.region().to_string(), controller)
    }

    /// Remove a controller and every binding that reports to it.
    pub fn detach(&mut self, region: &str) -> Option<ModalController> {
        self.bindings.retain(|_, binding| binding.region() != region);
        self.controllers.remove(region)
    }

    pub fn get(&self, region: &str) -> Option<&ModalController> {
        self.controllers.get(region)
    }

    pub fn get_mut(&mut self, region: &str) -> Option<&mut ModalController> {
        self.controllers.get_mut(region)
    }

    pub fn contains(&self, region: &str) -> bool {
        self.controllers.contains_key(region)
    }

    /// Region ids in a stable order.
    pub fn regions(&self) -> Vec<String> {
        self.controllers.keys().cloned().collect()
    }

    pub fn controllers(&self) -> impl Iterator<Item = &ModalController> {
        self.controllers.values()
    }

    pub fn binding(&self, node: NodeId) -> Option<&Binding> {
        self.bindings.get(&node)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Bind every trigger in `scope` that targets a registered region.
    /// Nodes already bound are left alone. Returns the number of new bindings.
    pub fn bind_all(&mut self, document: &Document, scope: &Scope) -> usize {
        let mut bound = 0;
        for element in document.triggers(scope) {
            let Some(region) = element.declared_target() else {
                continue;
            };
            if !self.controllers.contains_key(region) || self.bindings.contains_key(&element.node) {
                continue;
            }

            let region = region.to_string();
            let binding = if element.is_form() {
                Binding::Form { region }
            } else {
                Binding::Navigation { region }
            };
            self.bindings.insert(element.node, binding);
            bound += 1;
        }
        bound
    }

    /// Bind the current node of `region` to its controller.
    pub fn bind_region(&mut self, document: &Document, region: &str) -> bool {
        if !self.controllers.contains_key(region) {
            return false;
        }
        let Some(node) = document.region(region).map(|region| region.node) else {
            return false;
        };

        self.bindings
            .insert(
                node,
                Binding::Region {
                    region: region.to_string(),
                },
            )
            .is_none()
    }

    /// Forget bindings of nodes that left the document.
    pub fn prune(&mut self, document: &Document) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|node, _| document.contains(*node));
        before - self.bindings.len()
    }
}
