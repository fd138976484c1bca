//! Markup parsing into document parts.

use std::collections::BTreeMap;

use http::Method;
use scraper::{ElementRef, Html, Selector};

use super::attr;
use super::node::{ElementKind, RegionMarkup, TriggerFlags, ZLayer};

pub(super) struct ParsedPage {
    pub dialogs: Vec<ParsedDialog>,
    pub regions: Vec<ParsedRegion>,
    pub elements: Vec<ParsedElement>,
}

pub(super) struct ParsedDialog {
    pub region: String,
    pub parent: Option<String>,
    pub layer: Option<ZLayer>,
    pub hidden: bool,
}

pub(super) struct ParsedRegion {
    pub id: String,
    pub parent: Option<String>,
    pub content: String,
    pub attributes: BTreeMap<String, String>,
}

pub(super) struct ParsedElement {
    pub kind: ElementKind,
    pub id: Option<String>,
    pub label: String,
    pub region: Option<String>,
    pub target: Option<String>,
    pub action: Option<String>,
    pub method: Method,
    pub fields: Vec<(String, String)>,
    pub flags: TriggerFlags,
    pub disabled: bool,
    pub attributes: BTreeMap<String, String>,
}

pub(super) fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    let root = document.root_element();
    ParsedPage {
        dialogs: dialogs(root, None),
        regions: regions(root, None),
        elements: elements(root, None),
    }
}

/// Dialogs, regions and triggers of a fragment rendered into `region`.
pub(super) fn parse_fragment(html: &str, region: &str) -> ParsedPage {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();
    ParsedPage {
        dialogs: dialogs(root, Some(region)),
        regions: regions(root, Some(region)),
        elements: elements(root, Some(region)),
    }
}

/// Inner markup of the region `id` when `html` is a full page carrying it.
pub fn extract_region(html: &str, id: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let regions = region_selector()?;
    document
        .root_element()
        .select(&regions)
        .find(|region| region.value().id() == Some(id))
        .map(|region| region.inner_html())
}

/// Split replacement markup into its region wrapper (if any) and content.
///
/// Only a lone top-level region element counts as wrapper. Regions nested
/// deeper are content.
pub fn region_markup(html: &str) -> RegionMarkup {
    let fragment = Html::parse_fragment(html);
    let mut top_level = fragment.root_element().children().filter_map(ElementRef::wrap);
    let wrapper = match (top_level.next(), top_level.next()) {
        (Some(only), None) if only.value().attr(attr::CONTENT_REGION).is_some() => Some(only),
        _ => None,
    };

    match wrapper {
        Some(wrapper) => RegionMarkup {
            wrapper: Some(attributes_of(wrapper)),
            content: wrapper.inner_html(),
        },
        None => RegionMarkup::new(html.trim()),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn region_selector() -> Option<Selector> {
    selector(&format!("[{}][id]", attr::CONTENT_REGION))
}

fn dialogs(root: ElementRef<'_>, fallback_region: Option<&str>) -> Vec<ParsedDialog> {
    let (Some(dialogs), Some(regions)) = (
        selector(&format!("[{}]", attr::MODAL)),
        region_selector(),
    ) else {
        return Vec::new();
    };

    root.select(&dialogs)
        .filter_map(|dialog| {
            let value = dialog.value();
            let region = value
                .attr(attr::MODAL)
                .filter(|declared| !declared.is_empty())
                .or_else(|| {
                    dialog
                        .select(&regions)
                        .next()
                        .and_then(|region| region.value().id())
                })?;

            Some(ParsedDialog {
                region: region.to_string(),
                parent: enclosing_region(dialog).or_else(|| fallback_region.map(str::to_string)),
                layer: value.attr(attr::LAYER).and_then(ZLayer::parse),
                hidden: value.attr("aria-hidden") != Some("false"),
            })
        })
        .collect()
}

fn regions(root: ElementRef<'_>, fallback_region: Option<&str>) -> Vec<ParsedRegion> {
    let Some(regions) = region_selector() else {
        return Vec::new();
    };

    root.select(&regions)
        .filter_map(|region| {
            Some(ParsedRegion {
                id: region.value().id()?.to_string(),
                parent: enclosing_region(region).or_else(|| fallback_region.map(str::to_string)),
                content: region.inner_html(),
                attributes: attributes_of(region),
            })
        })
        .collect()
}

fn elements(root: ElementRef<'_>, fallback_region: Option<&str>) -> Vec<ParsedElement> {
    let Some(triggers) = selector(&format!("[{}], form", attr::TARGET_REGION)) else {
        return Vec::new();
    };

    root.select(&triggers)
        .filter_map(|element| parse_element(element, fallback_region))
        .collect()
}

fn parse_element(element: ElementRef<'_>, fallback_region: Option<&str>) -> Option<ParsedElement> {
    let value = element.value();
    let kind = ElementKind::from_tag(value.name());
    let attributes = attributes_of(element);

    let region = enclosing_region(element).or_else(|| fallback_region.map(str::to_string));
    let declared = value.attr(attr::TARGET_REGION).map(str::to_string);
    // Forms without an explicit target render into the region they sit in.
    let target = match kind {
        ElementKind::Form => declared.or_else(|| region.clone()),
        _ => declared,
    }?;

    let action = match kind {
        ElementKind::Form => value.attr("action"),
        ElementKind::Link => value.attr("href"),
        ElementKind::Button | ElementKind::Other => {
            value.attr("formaction").or_else(|| value.attr("data-href"))
        }
    };
    let method = value
        .attr("method")
        .or_else(|| value.attr("data-method"))
        .and_then(|method| Method::from_bytes(method.to_ascii_uppercase().as_bytes()).ok())
        .unwrap_or(Method::GET);
    let fields = match kind {
        ElementKind::Form => form_fields(element),
        _ => Vec::new(),
    };

    Some(ParsedElement {
        kind,
        id: value.id().map(str::to_string),
        label: label_of(element),
        region,
        target: Some(target),
        action: action.map(str::to_string),
        method,
        fields,
        flags: TriggerFlags::from_attributes(&attributes),
        disabled: value.attr("disabled").is_some(),
        attributes,
    })
}

fn enclosing_region(element: ElementRef<'_>) -> Option<String> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().attr(attr::CONTENT_REGION).is_some())
        .and_then(|region| region.value().id().map(str::to_string))
}

fn label_of(element: ElementRef<'_>) -> String {
    let value = element.value();
    if let Some(label) = value.attr("data-label") {
        return label.to_string();
    }

    let text = normalize_whitespace(&element.text().collect::<String>());
    if !text.is_empty() {
        return text;
    }

    ["aria-label", "title", "value", "action", "href"]
        .into_iter()
        .find_map(|name| value.attr(name))
        .map_or_else(|| "(unnamed)".to_string(), str::to_string)
}

fn form_fields(form: ElementRef<'_>) -> Vec<(String, String)> {
    let Some(controls) = selector("input[name], textarea[name]") else {
        return Vec::new();
    };

    form.select(&controls)
        .filter_map(|control| {
            let value = control.value();
            let name = value.attr("name")?.to_string();
            if value.name() == "textarea" {
                return Some((name, control.text().collect()));
            }

            let kind = value.attr("type").unwrap_or("text");
            match kind {
                "submit" | "button" | "reset" | "file" | "image" => None,
                "checkbox" | "radio" if value.attr("checked").is_none() => None,
                _ => Some((name, value.attr("value").unwrap_or_default().to_string())),
            }
        })
        .collect()
}

fn attributes_of(element: ElementRef<'_>) -> BTreeMap<String, String> {
    element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

pub(super) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <a href="/cart" data-target-region="cart" data-disable-on-request="true">Open cart</a>
          <a href="/plain">Not a trigger</a>
          <div data-modal data-layer="z-50" aria-hidden="true">
            <section data-content-region id="cart">
              <form action="/cart/items" method="post">
                <input type="hidden" name="sku" value="42">
                <input type="checkbox" name="gift">
                <button type="submit">Add</button>
              </form>
            </section>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_page_finds_dialogs_regions_and_triggers() {
        let page = parse_page(PAGE);

        assert_eq!(page.dialogs.len(), 1);
        assert_eq!(page.dialogs[0].region, "cart");
        assert_eq!(page.dialogs[0].layer, ZLayer::parse("50"));
        assert!(page.dialogs[0].hidden);

        assert_eq!(page.regions.len(), 1);
        assert_eq!(page.regions[0].id, "cart");

        assert_eq!(page.elements.len(), 2);
        let link = &page.elements[0];
        assert_eq!(link.kind, ElementKind::Link);
        assert_eq!(link.label, "Open cart");
        assert_eq!(link.target.as_deref(), Some("cart"));
        assert!(link.flags.disable_on_request);
        assert_eq!(link.region, None);
    }

    #[test]
    fn test_form_inside_region_targets_it_implicitly() {
        let page = parse_page(PAGE);
        let form = &page.elements[1];

        assert_eq!(form.kind, ElementKind::Form);
        assert_eq!(form.region.as_deref(), Some("cart"));
        assert_eq!(form.target.as_deref(), Some("cart"));
        assert_eq!(form.method, Method::POST);
        assert_eq!(form.fields, vec![("sku".to_string(), "42".to_string())]);
        assert_eq!(form.label, "Add");
    }

    #[test]
    fn test_fragment_triggers_belong_to_region() {
        let fragment = parse_fragment(r#"<a href="/next" data-target-region="cart">Next</a>"#, "cart");

        assert_eq!(fragment.elements.len(), 1);
        assert_eq!(fragment.elements[0].region.as_deref(), Some("cart"));
        assert!(fragment.dialogs.is_empty());
    }

    #[test]
    fn test_fragment_dialogs_and_regions_nest_under_target() {
        let fragment = parse_fragment(
            r#"
            <div data-modal aria-hidden="true">
              <section data-content-region id="help">
                <div data-content-region id="faq"></div>
              </section>
            </div>
            <a id="open-help" href="/help" data-target-region="help">Help</a>
            "#,
            "orders",
        );

        assert_eq!(fragment.dialogs.len(), 1);
        assert_eq!(fragment.dialogs[0].region, "help");
        assert_eq!(fragment.dialogs[0].parent.as_deref(), Some("orders"));

        let parents: Vec<_> = fragment
            .regions
            .iter()
            .map(|region| (region.id.as_str(), region.parent.as_deref()))
            .collect();
        assert_eq!(parents, vec![("help", Some("orders")), ("faq", Some("help"))]);

        assert_eq!(fragment.elements[0].region.as_deref(), Some("orders"));
        assert_eq!(fragment.elements[0].target.as_deref(), Some("help"));
    }

    #[test]
    fn test_region_markup_splits_wrapper() {
        let markup = region_markup(r#"<div data-content-region id="cart" class="p-4"><p>Two items</p></div>"#);

        let wrapper = markup.wrapper.unwrap();
        assert_eq!(wrapper.get("class").map(String::as_str), Some("p-4"));
        assert_eq!(markup.content, "<p>Two items</p>");

        let bare = region_markup("<p>Only content</p>");
        assert!(bare.wrapper.is_none());
        assert_eq!(bare.content, "<p>Only content</p>");

        let nested = region_markup(r#"<div data-modal><section data-content-region id="help"></section></div>"#);
        assert!(nested.wrapper.is_none());
    }

    #[test]
    fn test_extract_region_from_full_page() {
        let html = r#"<html><body><div data-content-region id="cart"><b>Hi</b></div></body></html>"#;

        assert_eq!(extract_region(html, "cart").as_deref(), Some("<b>Hi</b>"));
        assert_eq!(extract_region(html, "profile"), None);
    }
}
