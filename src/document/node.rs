use std::collections::BTreeMap;
use std::fmt;

use http::Method;

use super::attr;

/// Identity of a node in the document. Never reused: a replaced node comes
/// back with a fresh id and has to be bound again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub(super) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stacking layer of a dialog. Accepts `50` as well as `z-50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZLayer(u16);

impl ZLayer {
    pub const DEFAULT: Self = Self(40);

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let digits = value.strip_prefix("z-").unwrap_or(value);
        digits.parse().ok().map(Self)
    }

    pub const fn value(self) -> u16 {
        self.0
    }
}

impl Default for ZLayer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ZLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "z-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Document,
    Region(String),
}

/// Per-trigger behaviour switches, read from `data-*` attributes set to `"true"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerFlags {
    pub disable_on_request: bool,
    pub keep_disabled: bool,
    pub open_on_response: bool,
    pub resolve_by_target: bool,
}

impl TriggerFlags {
    pub fn from_attributes(attributes: &BTreeMap<String, String>) -> Self {
        let flag = |name: &str| attributes.get(name).is_some_and(|value| value == "true");
        Self {
            disable_on_request: flag(attr::DISABLE_ON_REQUEST),
            keep_disabled: flag(attr::KEEP_DISABLED),
            open_on_response: flag(attr::OPEN_ON_RESPONSE),
            resolve_by_target: flag(attr::RESOLVE_BY_TARGET),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Form,
    Link,
    Button,
    Other,
}

impl ElementKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "form" => Self::Form,
            "a" => Self::Link,
            "button" => Self::Button,
            _ => Self::Other,
        }
    }
}

/// An interactive element that can start a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub node: NodeId,
    pub kind: ElementKind,
    pub id: Option<String>,
    pub label: String,
    /// The content region the element sits in.
    pub region: Option<String>,
    /// Where a load started by this element renders.
    pub target: Option<String>,
    pub action: Option<String>,
    pub method: Method,
    pub fields: Vec<(String, String)>,
    pub flags: TriggerFlags,
    pub disabled: bool,
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    /// The explicitly declared target region, ignoring the implicit one of forms.
    pub fn declared_target(&self) -> Option<&str> {
        self.attributes
            .get(attr::TARGET_REGION)
            .map(String::as_str)
    }

    pub const fn is_form(&self) -> bool {
        matches!(self.kind, ElementKind::Form)
    }

    /// Whether `other` is the same trigger rendered again under a new node.
    pub fn same_trigger(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.id == other.id
            && self.action == other.action
            && self.target == other.target
            && self.method == other.method
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionNode {
    pub node: NodeId,
    pub id: String,
    /// Region whose content holds this one.
    pub parent: Option<String>,
    pub content: String,
    pub attributes: BTreeMap<String, String>,
}

impl RegionNode {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogNode {
    pub node: NodeId,
    pub region: String,
    pub parent: Option<String>,
    pub layer: Option<ZLayer>,
    pub hidden: bool,
    pub banners_visible: bool,
}

/// Markup that replaces a whole region node: the wrapper's attributes (when the
/// payload carries its own region element) and the inner content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionMarkup {
    pub wrapper: Option<BTreeMap<String, String>>,
    pub content: String,
}

impl RegionMarkup {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            wrapper: None,
            content: content.into(),
        }
    }

    /// Make sure the markup is wrapped by a region node for `region` that is
    /// marked as a modal target.
    pub fn wrap_for(&mut self, region: &str) {
        let wrapper = self.wrapper.get_or_insert_with(|| {
            BTreeMap::from([
                (attr::CONTENT_REGION.to_string(), String::new()),
                ("id".to_string(), region.to_string()),
            ])
        });
        if wrapper.get("id").map(String::as_str) == Some(region) {
            wrapper
                .entry(attr::MODAL_TARGET.to_string())
                .or_default();
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.wrapper
            .as_ref()
            .is_some_and(|wrapper| wrapper.contains_key(name))
    }
}
