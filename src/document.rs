//! Headless document model.
//!
//! The page is kept as a flat set of dialogs, content regions and interactive
//! elements parsed from server markup. Controllers mutate it, the terminal
//! renders it, and watchers subscribe to its revision instead of polling
//! blindly.

mod node;
mod parse;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

pub use node::{
    DialogNode, Element, ElementKind, NodeId, RegionMarkup, RegionNode, Scope, TriggerFlags, ZLayer,
};
pub use parse::{extract_region, region_markup};

/// Attribute names understood by the document and the controllers.
pub mod attr {
    pub const TARGET_REGION: &str = "data-target-region";
    pub const DISABLE_ON_REQUEST: &str = "data-disable-on-request";
    pub const KEEP_DISABLED: &str = "data-keep-disabled";
    pub const OPEN_ON_RESPONSE: &str = "data-open-on-response";
    pub const RESOLVE_BY_TARGET: &str = "data-resolve-by-target";

    pub const CONTENT_REGION: &str = "data-content-region";
    pub const MODAL: &str = "data-modal";
    pub const LAYER: &str = "data-layer";
    pub const MODAL_TARGET: &str = "data-modal-target";

    pub const AWAITING_REPLACEMENT: &str = "data-awaiting-replacement";
    /// Set on a region once a load rendered into it.
    pub const COMPLETE: &str = "complete";
}

/// Cloneable handle to the shared document.
#[derive(Debug, Clone)]
pub struct Document {
    state: Arc<Mutex<DocumentState>>,
    revision: Arc<watch::Sender<u64>>,
}

#[derive(Debug, Default)]
struct DocumentState {
    next_node: u64,
    dialogs: Vec<DialogNode>,
    regions: BTreeMap<String, RegionNode>,
    elements: BTreeMap<NodeId, Element>,
}

impl DocumentState {
    const fn allocate(&mut self) -> NodeId {
        self.next_node += 1;
        NodeId::new(self.next_node)
    }

    fn insert_dialogs(&mut self, parsed: Vec<parse::ParsedDialog>) {
        for dialog in parsed {
            let node = self.allocate();
            self.dialogs.push(DialogNode {
                node,
                region: dialog.region,
                parent: dialog.parent,
                layer: dialog.layer,
                hidden: dialog.hidden,
                banners_visible: false,
            });
        }
    }

    fn insert_regions(&mut self, parsed: Vec<parse::ParsedRegion>) {
        for region in parsed {
            let node = self.allocate();
            self.regions.insert(
                region.id.clone(),
                RegionNode {
                    node,
                    id: region.id,
                    parent: region.parent,
                    content: region.content,
                    attributes: region.attributes,
                },
            );
        }
    }

    fn insert_elements(&mut self, parsed: Vec<parse::ParsedElement>) {
        for element in parsed {
            let node = self.allocate();
            self.elements.insert(
                node,
                Element {
                    node,
                    kind: element.kind,
                    id: element.id,
                    label: element.label,
                    region: element.region,
                    target: element.target,
                    action: element.action,
                    method: element.method,
                    fields: element.fields,
                    flags: element.flags,
                    disabled: element.disabled,
                    attributes: element.attributes,
                },
            );
        }
    }

    /// `region` and every region nested in its content, at any depth.
    fn subtree(&self, region: &str) -> BTreeSet<String> {
        let mut subtree = BTreeSet::from([region.to_string()]);
        loop {
            let nested: Vec<String> = self
                .regions
                .values()
                .filter(|node| {
                    !subtree.contains(&node.id)
                        && node.parent.as_ref().is_some_and(|parent| subtree.contains(parent))
                })
                .map(|node| node.id.clone())
                .collect();
            if nested.is_empty() {
                return subtree;
            }
            subtree.extend(nested);
        }
    }

    /// Drop everything rendered inside `region` and parse `html` in its place.
    fn rerender(&mut self, region: &str, html: &str) {
        let dropped = self.subtree(region);
        let inside = |owner: Option<&String>| owner.is_some_and(|owner| dropped.contains(owner));

        self.regions
            .retain(|id, _| id == region || !dropped.contains(id));
        self.dialogs.retain(|dialog| !inside(dialog.parent.as_ref()));
        self.elements
            .retain(|_, element| !inside(element.region.as_ref()));

        let mut fragment = parse::parse_fragment(html, region);
        fragment.regions.retain(|nested| nested.id != region);
        self.insert_dialogs(fragment.dialogs);
        self.insert_regions(fragment.regions);
        self.insert_elements(fragment.elements);
    }

    fn dialog_mut(&mut self, region: &str) -> Option<&mut DialogNode> {
        self.dialogs.iter_mut().find(|dialog| dialog.region == region)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(DocumentState::default())),
            revision: Arc::new(revision),
        }
    }

    pub fn parse(html: &str) -> Self {
        let document = Self::new();
        document.load(html);
        document
    }

    /// Replace the whole document with a freshly parsed page.
    pub fn load(&self, html: &str) {
        let page = parse::parse_page(html);
        self.mutate(|state| {
            state.dialogs.clear();
            state.regions.clear();
            state.elements.clear();

            state.insert_dialogs(page.dialogs);
            state.insert_regions(page.regions);
            state.insert_elements(page.elements);
        });
    }

    /// Subscribe to mutations. The value is a revision counter.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn state(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut DocumentState) -> R) -> R {
        let result = {
            let mut state = self.state();
            apply(&mut state)
        };
        self.revision.send_modify(|revision| *revision += 1);
        result
    }

    // ===== Dialogs =====

    pub fn dialogs(&self) -> Vec<DialogNode> {
        self.state().dialogs.clone()
    }

    pub fn dialog(&self, region: &str) -> Option<DialogNode> {
        self.state()
            .dialogs
            .iter()
            .find(|dialog| dialog.region == region)
            .cloned()
    }

    /// Missing dialogs count as hidden.
    pub fn is_dialog_hidden(&self, region: &str) -> bool {
        self.dialog(region).is_none_or(|dialog| dialog.hidden)
    }

    pub fn set_dialog_hidden(&self, region: &str, hidden: bool) -> bool {
        self.mutate(|state| {
            state
                .dialog_mut(region)
                .map(|dialog| dialog.hidden = hidden)
                .is_some()
        })
    }

    pub fn set_banners_visible(&self, region: &str, visible: bool) -> bool {
        self.mutate(|state| {
            state
                .dialog_mut(region)
                .map(|dialog| dialog.banners_visible = visible)
                .is_some()
        })
    }

    // ===== Regions =====

    pub fn region(&self, id: &str) -> Option<RegionNode> {
        self.state().regions.get(id).cloned()
    }

    pub fn region_content(&self, id: &str) -> Option<String> {
        self.state()
            .regions
            .get(id)
            .map(|region| region.content.clone())
    }

    pub fn region_has_attribute(&self, id: &str, name: &str) -> bool {
        self.state()
            .regions
            .get(id)
            .is_some_and(|region| region.has_attribute(name))
    }

    pub fn set_region_attribute(&self, id: &str, name: &str, value: &str) -> bool {
        self.mutate(|state| {
            state
                .regions
                .get_mut(id)
                .map(|region| region.attributes.insert(name.to_string(), value.to_string()))
                .is_some()
        })
    }

    pub fn remove_region_attribute(&self, id: &str, name: &str) -> bool {
        self.mutate(|state| {
            state
                .regions
                .get_mut(id)
                .and_then(|region| region.attributes.remove(name))
                .is_some()
        })
    }

    /// Replace the inner content of a region, keeping the region node.
    pub fn set_region_content(&self, id: &str, html: &str) -> bool {
        self.mutate(|state| {
            let Some(region) = state.regions.get_mut(id) else {
                return false;
            };
            region.content = html.to_string();
            state.rerender(id, html);
            true
        })
    }

    /// Replace the whole region node. The new node gets a fresh id and its
    /// attributes from the markup's wrapper, so markers set on the old node
    /// are gone afterwards.
    pub fn replace_region(&self, id: &str, markup: &RegionMarkup) -> Option<NodeId> {
        self.mutate(|state| {
            let parent = state.regions.get(id)?.parent.clone();
            let node = state.allocate();
            let mut attributes = markup.wrapper.clone().unwrap_or_default();
            attributes.insert("id".to_string(), id.to_string());
            attributes
                .entry(attr::CONTENT_REGION.to_string())
                .or_default();

            state.regions.insert(
                id.to_string(),
                RegionNode {
                    node,
                    id: id.to_string(),
                    parent,
                    content: markup.content.clone(),
                    attributes,
                },
            );
            state.rerender(id, &markup.content);
            Some(node)
        })
    }

    // ===== Elements =====

    pub fn element(&self, node: NodeId) -> Option<Element> {
        self.state().elements.get(&node).cloned()
    }

    /// Whether `node` is still part of the document.
    pub fn contains(&self, node: NodeId) -> bool {
        let state = self.state();
        state.elements.contains_key(&node)
            || state.regions.values().any(|region| region.node == node)
    }

    /// Triggers in document order, restricted to `scope`.
    pub fn triggers(&self, scope: &Scope) -> Vec<Element> {
        self.state()
            .elements
            .values()
            .filter(|element| match scope {
                Scope::Document => true,
                Scope::Region(region) => element.region.as_deref() == Some(region.as_str()),
            })
            .cloned()
            .collect()
    }

    pub fn set_disabled(&self, node: NodeId, disabled: bool) -> bool {
        self.mutate(|state| {
            state
                .elements
                .get_mut(&node)
                .map(|element| element.disabled = disabled)
                .is_some()
        })
    }
}
