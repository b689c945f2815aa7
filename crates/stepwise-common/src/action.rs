use crate::element::Rect;
use serde::{Deserialize, Serialize};

/// Where on screen an action applies. Serializes as exactly one of the
/// `bounds` / `xpath` / `css` keys of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Locator {
    Bounds {
        #[serde(with = "corner_bounds")]
        bounds: Rect,
    },
    Xpath {
        xpath: String,
    },
    Css {
        css: String,
    },
}

impl Locator {
    pub fn bounds(rect: Rect) -> Self {
        Locator::Bounds { bounds: rect }
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::Xpath { xpath: expr.into() }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            css: selector.into(),
        }
    }

    pub fn rect(&self) -> Option<Rect> {
        match self {
            Locator::Bounds { bounds } => Some(*bounds),
            _ => None,
        }
    }
}

mod corner_bounds {
    use crate::element::Rect;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(rect: &Rect, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&rect.corner_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rect, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Rect::parse_corners(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid bounds string: {}", raw)))
    }
}

/// The resolver's single output per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Tap(TapAction),
    Input(InputAction),
    Swipe(SwipeAction),
    Wait(WaitAction),
    Error(ErrorAction),
    Finish(FinishAction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapAction {
    #[serde(flatten)]
    pub locator: Locator,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAction {
    #[serde(flatten)]
    pub locator: Locator,
    pub value: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeAction {
    pub swipe_start_x: i32,
    pub swipe_start_y: i32,
    pub swipe_end_x: i32,
    pub swipe_end_y: i32,
    /// Gesture duration in milliseconds.
    pub duration: u64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitAction {
    /// How long the external driver should wait before re-invoking, in
    /// milliseconds. The resolver never sleeps itself.
    pub timeout: u64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorAction {
    pub message: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishAction {
    pub explanation: String,
}

impl Action {
    pub fn tap(locator: Locator, explanation: impl Into<String>) -> Self {
        Action::Tap(TapAction {
            locator,
            explanation: explanation.into(),
        })
    }

    pub fn input(
        locator: Locator,
        value: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Action::Input(InputAction {
            locator,
            value: value.into(),
            explanation: explanation.into(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn swipe(
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        duration: u64,
        explanation: impl Into<String>,
    ) -> Self {
        Action::Swipe(SwipeAction {
            swipe_start_x: start_x,
            swipe_start_y: start_y,
            swipe_end_x: end_x,
            swipe_end_y: end_y,
            duration,
            explanation: explanation.into(),
        })
    }

    pub fn wait(timeout: u64, explanation: impl Into<String>) -> Self {
        Action::Wait(WaitAction {
            timeout,
            explanation: explanation.into(),
        })
    }

    pub fn error(message: impl Into<String>, explanation: impl Into<String>) -> Self {
        Action::Error(ErrorAction {
            message: message.into(),
            explanation: explanation.into(),
        })
    }

    pub fn finish(explanation: impl Into<String>) -> Self {
        Action::Finish(FinishAction {
            explanation: explanation.into(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Tap(_) => "tap",
            Action::Input(_) => "input",
            Action::Swipe(_) => "swipe",
            Action::Wait(_) => "wait",
            Action::Error(_) => "error",
            Action::Finish(_) => "finish",
        }
    }

    /// FINISH and ERROR are absorbing: the run ends there.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Error(_) | Action::Finish(_))
    }

    /// Whether a successful execution of this action advances the goal's
    /// step sequence. Waits keep the run on the same step.
    pub fn advances_step(&self) -> bool {
        matches!(self, Action::Tap(_) | Action::Input(_) | Action::Swipe(_))
    }

    pub fn explanation(&self) -> &str {
        match self {
            Action::Tap(a) => &a.explanation,
            Action::Input(a) => &a.explanation,
            Action::Swipe(a) => &a.explanation,
            Action::Wait(a) => &a.explanation,
            Action::Error(a) => &a.explanation,
            Action::Finish(a) => &a.explanation,
        }
    }

    /// Identity used for loop detection: the (type, locator, value)
    /// triple. Explanations and timeouts are presentation, not identity.
    pub fn same_effect(&self, other: &Action) -> bool {
        match (self, other) {
            (Action::Tap(a), Action::Tap(b)) => a.locator == b.locator,
            (Action::Input(a), Action::Input(b)) => a.locator == b.locator && a.value == b.value,
            (Action::Swipe(a), Action::Swipe(b)) => {
                a.swipe_start_x == b.swipe_start_x
                    && a.swipe_start_y == b.swipe_start_y
                    && a.swipe_end_x == b.swipe_end_x
                    && a.swipe_end_y == b.swipe_end_y
            }
            (Action::Wait(_), Action::Wait(_)) => true,
            (Action::Error(_), Action::Error(_)) => true,
            (Action::Finish(_), Action::Finish(_)) => true,
            _ => false,
        }
    }
}
