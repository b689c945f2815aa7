use super::NormalizeError;
use std::collections::HashMap;
use stepwise_common::element::{Element, ElementPath, Rect, Role};
use stepwise_common::platform::Platform;

/// Native `XCUIElementType*` node names → normalized roles. Anything not
/// listed is a plain container.
const ROLE_MAP: &[(&str, Role)] = &[
    ("XCUIElementTypeButton", Role::Button),
    ("XCUIElementTypeLink", Role::Link),
    ("XCUIElementTypeTextField", Role::TextField),
    ("XCUIElementTypeSecureTextField", Role::TextField),
    ("XCUIElementTypeTextView", Role::TextField),
    ("XCUIElementTypeSearchField", Role::SearchField),
    ("XCUIElementTypeCheckBox", Role::Checkbox),
    ("XCUIElementTypeSwitch", Role::Switch),
    ("XCUIElementTypeSlider", Role::Slider),
    ("XCUIElementTypePicker", Role::Picker),
    ("XCUIElementTypePickerWheel", Role::Picker),
    ("XCUIElementTypeStaticText", Role::StaticText),
    ("XCUIElementTypeImage", Role::Image),
    ("XCUIElementTypeCell", Role::Cell),
    ("XCUIElementTypeScrollView", Role::ScrollView),
    ("XCUIElementTypeTable", Role::ScrollView),
    ("XCUIElementTypeCollectionView", Role::ScrollView),
    ("XCUIElementTypeActivityIndicator", Role::LoadingIndicator),
    ("XCUIElementTypeProgressIndicator", Role::LoadingIndicator),
];

/// Attributes worth keeping from an accessibility dump. Geometry and the
/// enabled/visible flags map to dedicated fields instead.
const KEPT_ATTRS: &[&str] = &["name", "label", "value", "accessible"];

pub(super) fn parse(raw: &str) -> Result<Vec<Element>, NormalizeError> {
    let doc = roxmltree::Document::parse(raw).map_err(|source| NormalizeError::MalformedXml {
        platform: Platform::Ios,
        source,
    })?;
    let root = doc.root_element();
    let mut out = Vec::new();
    walk(
        root,
        ElementPath::default().child(root.tag_name().name(), 1),
        &mut out,
    );
    Ok(out)
}

fn walk(node: roxmltree::Node<'_, '_>, path: ElementPath, out: &mut Vec<Element>) {
    out.push(to_element(node, &path));
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for child in node.children().filter(|c| c.is_element()) {
        let tag = child.tag_name().name();
        let index = seen.entry(tag).or_insert(0);
        *index += 1;
        walk(child, path.child(tag, *index), out);
    }
}

fn to_element(node: roxmltree::Node<'_, '_>, path: &ElementPath) -> Element {
    let native_type = node.tag_name().name().to_string();
    let role = map_role(&native_type);

    let mut attributes = HashMap::new();
    for key in KEPT_ATTRS {
        if let Some(value) = node.attribute(*key) {
            if !value.trim().is_empty() {
                attributes.insert((*key).to_string(), value.to_string());
            }
        }
    }

    // iOS supplies geometry directly as x/y/width/height.
    let bounds = match (num(node, "x"), num(node, "y"), num(node, "width"), num(node, "height")) {
        (Some(x), Some(y), Some(w), Some(h)) => Some(Rect::new(x, y, w.max(0.0), h.max(0.0))),
        _ => None,
    };

    Element {
        platform: Platform::Ios,
        role,
        native_type,
        attributes,
        bounds,
        enabled: flag(node, "enabled"),
        clickable: flag(node, "visible"),
        path: path.clone(),
    }
}

fn map_role(native: &str) -> Role {
    ROLE_MAP
        .iter()
        .find(|(name, _)| *name == native)
        .map(|(_, role)| *role)
        .unwrap_or(Role::Container)
}

fn flag(node: roxmltree::Node<'_, '_>, name: &str) -> bool {
    node.attribute(name).map(|v| v != "false").unwrap_or(true)
}

fn num(node: roxmltree::Node<'_, '_>, name: &str) -> Option<f32> {
    node.attribute(name).and_then(|v| v.trim().parse().ok())
}
