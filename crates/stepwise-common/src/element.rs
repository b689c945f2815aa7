use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Axis-aligned rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from opposite corners, the encoding Android `bounds`
    /// attributes use.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Rect {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Parse the `[x1,y1][x2,y2]` corner encoding. Rejects inverted
    /// corners so width and height stay non-negative.
    pub fn parse_corners(s: &str) -> Option<Rect> {
        let (first, second) = s.split_once("][")?;
        let first = first.strip_prefix('[')?;
        let second = second.strip_suffix(']')?;
        let (x1, y1) = parse_pair(first)?;
        let (x2, y2) = parse_pair(second)?;
        if x2 < x1 || y2 < y1 {
            return None;
        }
        Some(Rect::from_corners(x1, y1, x2, y2))
    }

    /// Render back to the corner encoding, rounded to whole pixels.
    pub fn corner_string(&self) -> String {
        format!(
            "[{},{}][{},{}]",
            self.x.round() as i64,
            self.y.round() as i64,
            (self.x + self.width).round() as i64,
            (self.y + self.height).round() as i64
        )
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

fn parse_pair(s: &str) -> Option<(f32, f32)> {
    let (a, b) = s.split_once(',')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

/// Normalized semantic type of a node, mapped from platform-native types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Button,
    Link,
    TextField,
    SearchField,
    Checkbox,
    Switch,
    Slider,
    Picker,
    StaticText,
    Image,
    Cell,
    ScrollView,
    LoadingIndicator,
    Container,
}

impl Role {
    /// Roles that accept typed text.
    pub fn is_text_input(&self) -> bool {
        matches!(self, Role::TextField | Role::SearchField)
    }

    /// Roles a user acts on directly.
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            Role::Button
                | Role::Link
                | Role::TextField
                | Role::SearchField
                | Role::Checkbox
                | Role::Switch
                | Role::Slider
                | Role::Picker
                | Role::Cell
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Button => "button",
            Role::Link => "link",
            Role::TextField => "text_field",
            Role::SearchField => "search_field",
            Role::Checkbox => "checkbox",
            Role::Switch => "switch",
            Role::Slider => "slider",
            Role::Picker => "picker",
            Role::StaticText => "static_text",
            Role::Image => "image",
            Role::Cell => "cell",
            Role::ScrollView => "scroll_view",
            Role::LoadingIndicator => "loading_indicator",
            Role::Container => "container",
        }
    }
}

/// One step of a structural locator: a native tag plus its 1-based index
/// among same-tag siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub tag: String,
    pub index: usize,
}

/// Structural locator: the ancestor chain from the root down to the node.
/// Usable as a last-resort selector when no attribute identifies the
/// element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPath {
    pub segments: Vec<PathSegment>,
}

impl ElementPath {
    /// Extend the path with one more level.
    pub fn child(&self, tag: &str, index: usize) -> ElementPath {
        let mut segments = self.segments.clone();
        segments.push(PathSegment {
            tag: tag.to_string(),
            index,
        });
        ElementPath { segments }
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Render as an absolute XPath, e.g. `/hierarchy/node[2]/node[1]`.
    pub fn to_xpath(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for seg in &self.segments {
            let _ = write!(out, "/{}[{}]", seg.tag, seg.index);
        }
        out
    }

    /// Render as a CSS descendant chain, e.g.
    /// `html:nth-of-type(1) > body:nth-of-type(1) > button:nth-of-type(2)`.
    pub fn to_css(&self) -> String {
        self.segments
            .iter()
            .map(|seg| format!("{}:nth-of-type({})", seg.tag, seg.index))
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

/// A node in the normalized tree. Every element carries exactly one
/// platform and a non-empty role; bounds, when present, have
/// non-negative width and height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub platform: Platform,
    pub role: Role,
    /// Platform-native node type the role was mapped from.
    pub native_type: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub bounds: Option<Rect>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub clickable: bool,
    pub path: ElementPath,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

fn default_true() -> bool {
    true
}
