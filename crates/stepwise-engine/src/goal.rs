//! Task goals: an opaque description, a step sequence, and a
//! caller-supplied completion predicate.
//!
//! The resolver never interprets natural language; the goal arrives
//! already broken into steps, each naming a semantic target. The
//! predicate is data rather than code so whole runs stay serializable
//! and replayable.

use serde::{Deserialize, Serialize};
use stepwise_common::element::{Element, Rect, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSpec {
    /// Free-form task descriptor. Carried into explanations, never parsed.
    pub description: String,
    #[serde(default)]
    pub steps: Vec<GoalStep>,
    /// Completion predicate, checked before anything else each invocation.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub done_when: Predicate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalStep {
    pub target: TargetSpec,
    /// Text to type. Presence makes this an input step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Explicit request to scroll the target into view instead of acting
    /// on it.
    #[serde(default)]
    pub reveal: bool,
}

/// Semantic description of the element a step needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Identifying text: visible label, resource id, DOM id...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Bounds recorded when the target was located on a previous step;
    /// reused as the highest-priority locator while they stay stable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_bounds: Option<Rect>,
}

impl TargetSpec {
    pub fn text(text: impl Into<String>) -> Self {
        TargetSpec {
            text: Some(text.into()),
            ..TargetSpec::default()
        }
    }

    pub fn describe(&self) -> String {
        match (&self.text, &self.role) {
            (Some(t), Some(r)) => format!("{} \"{}\"", r.as_str(), t),
            (Some(t), None) => format!("\"{}\"", t),
            (None, Some(r)) => r.as_str().to_string(),
            (None, None) => "<unspecified target>".to_string(),
        }
    }
}

/// Caller-supplied completion predicate, evaluated against the
/// normalized tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Never satisfied; the run ends by exhausting its steps.
    #[default]
    Never,
    /// Some element carries the given text as an attribute value,
    /// matched exactly.
    TextPresent(String),
    /// No element carries the given text.
    TextAbsent(String),
    /// An element matching the spec exists.
    ElementPresent(TargetSpec),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn eval(&self, elements: &[Element]) -> bool {
        match self {
            Predicate::Never => false,
            Predicate::TextPresent(text) => elements.iter().any(|e| has_text(e, text)),
            Predicate::TextAbsent(text) => !elements.iter().any(|e| has_text(e, text)),
            Predicate::ElementPresent(spec) => elements.iter().any(|e| matches_spec(e, spec)),
            Predicate::All(preds) => preds.iter().all(|p| p.eval(elements)),
            Predicate::Any(preds) => preds.iter().any(|p| p.eval(elements)),
        }
    }
}

fn has_text(element: &Element, text: &str) -> bool {
    element.attributes.values().any(|v| v == text)
}

fn matches_spec(element: &Element, spec: &TargetSpec) -> bool {
    spec.role.map_or(true, |r| element.role == r)
        && spec
            .text
            .as_deref()
            .map_or(true, |t| has_text(element, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use stepwise_common::element::ElementPath;
    use stepwise_common::platform::Platform;

    fn element(role: Role, text: &str) -> Element {
        let mut attributes = HashMap::new();
        attributes.insert("text".to_string(), text.to_string());
        Element {
            platform: Platform::Web,
            role,
            native_type: "div".to_string(),
            attributes,
            bounds: None,
            enabled: true,
            clickable: true,
            path: ElementPath::default(),
        }
    }

    #[test]
    fn text_present_matches_exactly() {
        let elements = vec![element(Role::StaticText, "Welcome back")];
        assert!(Predicate::TextPresent("Welcome back".into()).eval(&elements));
        assert!(!Predicate::TextPresent("Welcome".into()).eval(&elements));
    }

    #[test]
    fn combinators_nest() {
        let elements = vec![
            element(Role::StaticText, "Order placed"),
            element(Role::Button, "Continue"),
        ];
        let done = Predicate::All(vec![
            Predicate::TextPresent("Order placed".into()),
            Predicate::ElementPresent(TargetSpec {
                role: Some(Role::Button),
                ..TargetSpec::default()
            }),
        ]);
        assert!(done.eval(&elements));
        let not_done = Predicate::Any(vec![
            Predicate::TextPresent("Error".into()),
            Predicate::TextAbsent("Order placed".into()),
        ]);
        assert!(!not_done.eval(&elements));
    }

    #[test]
    fn goal_parses_from_yaml() {
        let yaml = r#"
description: submit login form
steps:
  - target: { text: "username" }
    value: "bob"
  - target: { text: "Sign in", role: button }
done_when:
  text_present: "Welcome back"
"#;
        let goal: GoalSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(goal.steps.len(), 2);
        assert_eq!(goal.steps[0].value.as_deref(), Some("bob"));
        assert_eq!(goal.steps[1].target.role, Some(Role::Button));
        assert!(matches!(goal.done_when, Predicate::TextPresent(_)));
    }
}
