use super::NormalizeError;
use std::collections::HashMap;
use stepwise_common::element::{Element, ElementPath, Rect, Role};
use stepwise_common::platform::Platform;

/// Widget class suffixes → normalized roles, matched by `ends_with` on the
/// final class-name segment so vendor subclasses (AppCompatButton,
/// MaterialCheckBox...) land on the right role. Longer, more specific
/// suffixes come first.
const ROLE_MAP: &[(&str, Role)] = &[
    ("RadioButton", Role::Checkbox),
    ("ImageButton", Role::Button),
    ("ToggleButton", Role::Switch),
    ("Button", Role::Button),
    ("AutoCompleteTextView", Role::TextField),
    ("MultiAutoCompleteTextView", Role::TextField),
    ("EditText", Role::TextField),
    ("SearchView", Role::SearchField),
    ("CheckBox", Role::Checkbox),
    ("CheckedTextView", Role::Checkbox),
    ("Switch", Role::Switch),
    ("SeekBar", Role::Slider),
    ("Spinner", Role::Picker),
    ("NumberPicker", Role::Picker),
    ("TextView", Role::StaticText),
    ("ImageView", Role::Image),
    ("RecyclerView", Role::ScrollView),
    ("ListView", Role::ScrollView),
    ("GridView", Role::ScrollView),
    ("ScrollView", Role::ScrollView),
    ("ViewPager", Role::ScrollView),
    ("WebView", Role::Container),
    ("ProgressBar", Role::LoadingIndicator),
];

/// Identifying attributes kept from a hierarchy dump. Bounds and the
/// clickable/enabled flags map to dedicated fields.
const KEPT_ATTRS: &[&str] = &["text", "resource-id", "content-desc", "package", "scrollable"];

pub(super) fn parse(raw: &str) -> Result<Vec<Element>, NormalizeError> {
    let doc = roxmltree::Document::parse(raw).map_err(|source| NormalizeError::MalformedXml {
        platform: Platform::Android,
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
    // The dump tags every widget as <node>; the class attribute carries
    // the real type.
    let native_type = node
        .attribute("class")
        .unwrap_or_else(|| node.tag_name().name())
        .to_string();
    let role = map_role(&native_type);

    let mut attributes = HashMap::new();
    for key in KEPT_ATTRS {
        if let Some(value) = node.attribute(*key) {
            if !value.trim().is_empty() {
                attributes.insert((*key).to_string(), value.to_string());
            }
        }
    }

    // Android encodes bounds as opposite corners.
    let bounds = node.attribute("bounds").and_then(Rect::parse_corners);

    Element {
        platform: Platform::Android,
        role,
        native_type,
        attributes,
        bounds,
        enabled: flag(node, "enabled"),
        clickable: flag(node, "clickable"),
        path: path.clone(),
    }
}

fn map_role(class: &str) -> Role {
    // Inner classes come after `$`, package segments after `.`.
    let segment = class
        .rsplit(|c| c == '.' || c == '$')
        .next()
        .unwrap_or(class);
    ROLE_MAP
        .iter()
        .find(|(suffix, _)| segment.ends_with(suffix))
        .map(|(_, role)| *role)
        .unwrap_or(Role::Container)
}

fn flag(node: roxmltree::Node<'_, '_>, name: &str) -> bool {
    node.attribute(name).map(|v| v != "false").unwrap_or(true)
}
