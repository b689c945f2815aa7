use super::NormalizeError;
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use stepwise_common::element::{Element, ElementPath, Rect, Role};
use stepwise_common::platform::Platform;

/// Plain tag → role table. `<input>` is resolved separately from its
/// `type` attribute, and ARIA roles override both.
const ROLE_MAP: &[(&str, Role)] = &[
    ("button", Role::Button),
    ("a", Role::Link),
    ("textarea", Role::TextField),
    ("select", Role::Picker),
    ("img", Role::Image),
    ("li", Role::Cell),
    ("tr", Role::Cell),
    ("p", Role::StaticText),
    ("span", Role::StaticText),
    ("label", Role::StaticText),
    ("h1", Role::StaticText),
    ("h2", Role::StaticText),
    ("h3", Role::StaticText),
    ("h4", Role::StaticText),
    ("h5", Role::StaticText),
    ("h6", Role::StaticText),
];

/// ARIA `role` attribute → normalized role.
const ARIA_ROLE_MAP: &[(&str, Role)] = &[
    ("button", Role::Button),
    ("link", Role::Link),
    ("textbox", Role::TextField),
    ("searchbox", Role::SearchField),
    ("checkbox", Role::Checkbox),
    ("radio", Role::Checkbox),
    ("switch", Role::Switch),
    ("slider", Role::Slider),
    ("listbox", Role::Picker),
    ("progressbar", Role::LoadingIndicator),
];

/// Identifying attributes kept from the DOM.
const KEPT_ATTRS: &[&str] = &[
    "id",
    "class",
    "name",
    "type",
    "placeholder",
    "value",
    "aria-label",
    "href",
    "title",
];

/// Non-content subtrees that never yield actionable elements.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "head", "meta", "link", "title", "noscript", "template", "br",
];

/// Class tokens that mark a busy/loading placeholder.
const LOADING_CLASS_TOKENS: &[&str] = &["spinner", "loader", "loading"];

pub(super) fn parse(raw: &str) -> Result<Vec<Element>, NormalizeError> {
    // The HTML parser is error-tolerant like a browser, so "malformed"
    // here means the input is not markup at all.
    if raw.trim().is_empty() || !raw.contains('<') {
        return Err(NormalizeError::EmptyDocument);
    }
    let document = Html::parse_document(raw);
    let root = document.root_element();
    let mut out = Vec::new();
    walk(root, ElementPath::default().child(root.value().name(), 1), &mut out);
    if out.is_empty() {
        return Err(NormalizeError::EmptyDocument);
    }
    Ok(out)
}

fn walk(element: ElementRef<'_>, path: ElementPath, out: &mut Vec<Element>) {
    out.push(to_element(element, &path));
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for child in element.children().filter_map(ElementRef::wrap) {
        let tag = child.value().name();
        if SKIPPED_TAGS.contains(&tag) {
            continue;
        }
        let index = seen.entry(tag).or_insert(0);
        *index += 1;
        walk(child, path.child(tag, *index), out);
    }
}

fn to_element(element: ElementRef<'_>, path: &ElementPath) -> Element {
    let native_type = element.value().name().to_string();
    let role = map_role(element, &native_type);

    let mut attributes = HashMap::new();
    for key in KEPT_ATTRS {
        if let Some(value) = element.value().attr(key) {
            if !value.trim().is_empty() {
                attributes.insert((*key).to_string(), value.to_string());
            }
        }
    }
    if let Some(text) = own_text(element) {
        attributes.insert("text".to_string(), text);
    }

    // Layout info is normally absent from serialized DOM; drivers that do
    // have it attach a corner-encoded `bounds` attribute.
    let bounds = element
        .value()
        .attr("bounds")
        .and_then(Rect::parse_corners);

    let hidden = element.value().attr("hidden").is_some()
        || element.value().attr("type") == Some("hidden");

    Element {
        platform: Platform::Web,
        role,
        native_type,
        attributes,
        bounds,
        enabled: element.value().attr("disabled").is_none(),
        clickable: !hidden,
        path: path.clone(),
    }
}

fn map_role(element: ElementRef<'_>, tag: &str) -> Role {
    if let Some(aria) = element.value().attr("role") {
        if let Some((_, role)) = ARIA_ROLE_MAP.iter().find(|(name, _)| *name == aria) {
            return *role;
        }
    }
    if element
        .value()
        .classes()
        .any(|c| LOADING_CLASS_TOKENS.contains(&c.to_lowercase().as_str()))
    {
        return Role::LoadingIndicator;
    }
    if tag == "input" {
        return input_role(element.value().attr("type").unwrap_or("text"));
    }
    ROLE_MAP
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, role)| *role)
        .unwrap_or(Role::Container)
}

fn input_role(input_type: &str) -> Role {
    match input_type {
        "checkbox" | "radio" => Role::Checkbox,
        "range" => Role::Slider,
        "submit" | "button" | "reset" | "image" => Role::Button,
        "search" => Role::SearchField,
        "hidden" => Role::Container,
        _ => Role::TextField,
    }
}

/// Direct text content with collapsed whitespace; descendant text belongs
/// to the descendants.
fn own_text(element: ElementRef<'_>) -> Option<String> {
    let joined = element
        .children()
        .filter_map(|c| c.value().as_text())
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}
