//! Selector Strategy Engine: rank candidate locators for a target, most
//! reliable first.
//!
//! Tier order is fixed per platform: previously recorded bounds, the
//! platform's primary identifying attribute, its secondary attribute,
//! then the structural path. Fuzzy text matching is an explicit opt-in
//! tier after every exact tier, so a partial match can never silently
//! outrank an exact one. An empty result means "not found" — there is
//! no arbitrary-element fallback.

use crate::goal::TargetSpec;
use std::cmp::Ordering;
use std::fmt;
use stepwise_common::action::Locator;
use stepwise_common::element::{Element, Rect, Role};
use stepwise_common::platform::Platform;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StrategyError {
    /// Two or more elements matched identically and no tie-break could
    /// order them; resolution refuses to guess.
    #[error("ambiguous match for {target}: {count} elements tie at the {tier} tier")]
    Ambiguous {
        target: String,
        tier: Tier,
        count: usize,
    },
}

/// Resolution tier, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    KnownBounds,
    Primary,
    Secondary,
    Structural,
    Fuzzy,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::KnownBounds => "known bounds",
            Tier::Primary => "primary attribute",
            Tier::Secondary => "secondary attribute",
            Tier::Structural => "structural path",
            Tier::Fuzzy => "fuzzy text",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One ranked way of addressing the target on screen.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub locator: Locator,
    pub tier: Tier,
    pub role: Role,
    pub bounds: Option<Rect>,
    /// What the match was made on, for explanations.
    pub matched_on: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyOptions {
    /// Enable the lowest-priority fuzzy text tier.
    pub fuzzy: bool,
}

/// Minimum jaro-winkler similarity for the fuzzy tier.
const FUZZY_THRESHOLD: f64 = 0.85;

/// Identifying attribute keys per platform and tier.
fn tier_attrs(platform: Platform, tier: Tier) -> &'static [&'static str] {
    match (platform, tier) {
        (Platform::Ios, Tier::Primary) => &["name"],
        (Platform::Ios, Tier::Secondary) => &["label", "value"],
        (Platform::Android, Tier::Primary) => &["text", "resource-id"],
        (Platform::Android, Tier::Secondary) => &["content-desc"],
        (Platform::Web, Tier::Primary) => &["id", "text"],
        (Platform::Web, Tier::Secondary) => &["class", "name"],
        _ => &[],
    }
}

/// Build the ordered candidate list for a target.
///
/// A tie inside one tier only surfaces as an error when no other tier
/// resolves the target; otherwise the ambiguous tier is dropped from the
/// list and resolution proceeds on the unambiguous ones.
pub fn resolve(
    target: &TargetSpec,
    elements: &[Element],
    platform: Platform,
    opts: StrategyOptions,
) -> Result<Vec<Candidate>, StrategyError> {
    let mut out = Vec::new();
    let mut first_ambiguous: Option<StrategyError> = None;

    let mut collect = |result: Result<Option<Candidate>, StrategyError>| match result {
        Ok(Some(candidate)) => out.push(candidate),
        Ok(None) => {}
        Err(err) => {
            if first_ambiguous.is_none() {
                first_ambiguous = Some(err);
            }
        }
    };

    if let Some(rect) = target.known_bounds {
        collect(match_known_bounds(target, rect, elements));
    }
    collect(match_attribute_tier(target, elements, platform, Tier::Primary));
    collect(match_attribute_tier(target, elements, platform, Tier::Secondary));
    collect(match_structural(target, elements, platform));
    if opts.fuzzy {
        collect(match_fuzzy(target, elements, platform));
    }

    if out.is_empty() {
        if let Some(err) = first_ambiguous {
            return Err(err);
        }
    }
    debug!(wanted = %target.describe(), candidates = out.len(), "strategy resolution");
    Ok(out)
}

fn match_known_bounds(
    target: &TargetSpec,
    rect: Rect,
    elements: &[Element],
) -> Result<Option<Candidate>, StrategyError> {
    let matches: Vec<(&Element, &'static str)> = elements
        .iter()
        .filter(|e| e.bounds == Some(rect))
        .filter(|e| target.role.map_or(true, |r| e.role == r))
        .map(|e| (e, "bounds"))
        .collect();
    let best = pick_best(matches, target, Tier::KnownBounds)?;
    Ok(best.map(|(element, _)| Candidate {
        locator: Locator::bounds(rect),
        tier: Tier::KnownBounds,
        role: element.role,
        bounds: element.bounds,
        matched_on: "stable bounds".to_string(),
    }))
}

fn match_attribute_tier(
    target: &TargetSpec,
    elements: &[Element],
    platform: Platform,
    tier: Tier,
) -> Result<Option<Candidate>, StrategyError> {
    let Some(wanted) = target.text.as_deref() else {
        return Ok(None);
    };
    let keys = tier_attrs(platform, tier);
    let mut matches: Vec<(&Element, &'static str)> = Vec::new();
    for element in elements {
        if let Some(role) = target.role {
            if element.role != role {
                continue;
            }
        }
        for key in keys {
            if attr_matches(element, key, wanted, platform) {
                matches.push((element, key));
                break;
            }
        }
    }
    let best = pick_best(matches, target, tier)?;
    Ok(best.map(|(element, key)| Candidate {
        locator: attribute_locator(element, key, wanted, platform),
        tier,
        role: element.role,
        bounds: element.bounds,
        matched_on: format!("{}=\"{}\"", key, wanted),
    }))
}

/// Exact, case-sensitive attribute comparison. The web `class` attribute
/// is a token list, so the match is per token.
fn attr_matches(element: &Element, key: &str, wanted: &str, platform: Platform) -> bool {
    match element.attr(key) {
        None => false,
        Some(value) => {
            if platform == Platform::Web && key == "class" {
                value.split_whitespace().any(|token| token == wanted)
            } else {
                value == wanted
            }
        }
    }
}

fn match_structural(
    target: &TargetSpec,
    elements: &[Element],
    platform: Platform,
) -> Result<Option<Candidate>, StrategyError> {
    let matches: Vec<(&Element, &'static str)> = elements
        .iter()
        .filter(|e| match (target.role, target.text.as_deref()) {
            (Some(role), _) => e.role == role,
            (None, Some(text)) => e.attributes.values().any(|v| v == text),
            (None, None) => false,
        })
        .map(|e| (e, "path"))
        .collect();
    let best = pick_best(matches, target, Tier::Structural)?;
    Ok(best.map(|(element, _)| Candidate {
        locator: structural_locator(element, platform),
        tier: Tier::Structural,
        role: element.role,
        bounds: element.bounds,
        matched_on: "document position".to_string(),
    }))
}

fn match_fuzzy(
    target: &TargetSpec,
    elements: &[Element],
    platform: Platform,
) -> Result<Option<Candidate>, StrategyError> {
    let Some(wanted) = target.text.as_deref() else {
        return Ok(None);
    };
    let needle = wanted.to_lowercase();
    let mut keys: Vec<&'static str> = Vec::new();
    keys.extend_from_slice(tier_attrs(platform, Tier::Primary));
    keys.extend_from_slice(tier_attrs(platform, Tier::Secondary));

    struct Scored<'a> {
        element: &'a Element,
        key: &'static str,
        value: String,
        score: f64,
    }

    let mut scored: Vec<Scored<'_>> = Vec::new();
    for element in elements {
        if let Some(role) = target.role {
            if element.role != role {
                continue;
            }
        }
        for key in &keys {
            let Some(value) = element.attr(key) else {
                continue;
            };
            let haystack = value.to_lowercase();
            let mut score = strsim::jaro_winkler(&haystack, &needle);
            if !needle.is_empty() && haystack.contains(&needle) {
                score = score.max(0.9);
            }
            if score >= FUZZY_THRESHOLD {
                scored.push(Scored {
                    element,
                    key,
                    value: value.to_string(),
                    score,
                });
                break;
            }
        }
    }

    if scored.is_empty() {
        return Ok(None);
    }
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                rank(a.element)
                    .partial_cmp(&rank(b.element))
                    .unwrap_or(Ordering::Equal)
            })
    });
    if scored.len() > 1
        && scored[0].score == scored[1].score
        && rank(scored[0].element) == rank(scored[1].element)
    {
        return Err(StrategyError::Ambiguous {
            target: target.describe(),
            tier: Tier::Fuzzy,
            count: scored.len(),
        });
    }
    let top = &scored[0];
    Ok(Some(Candidate {
        // Exact locator on the element's own full value; the fuzziness is
        // only in how the element was chosen.
        locator: attribute_locator(top.element, top.key, &top.value, platform),
        tier: Tier::Fuzzy,
        role: top.element.role,
        bounds: top.element.bounds,
        matched_on: format!("{} ~ \"{}\"", top.key, top.value),
    }))
}

/// Tie-break key: actionable elements first, then smaller bounds area
/// (the specific widget over its containing panel), then the shallower
/// structural path. Elements without bounds sort after bounded ones.
fn rank(element: &Element) -> (u8, f32, usize) {
    let actionable = if element.enabled && element.clickable { 0 } else { 1 };
    let area = element.bounds.map(|b| b.area()).unwrap_or(f32::MAX);
    (actionable, area, element.path.depth())
}

fn pick_best<'a>(
    mut matches: Vec<(&'a Element, &'static str)>,
    target: &TargetSpec,
    tier: Tier,
) -> Result<Option<(&'a Element, &'static str)>, StrategyError> {
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches.remove(0))),
        _ => {
            matches.sort_by(|a, b| {
                rank(a.0)
                    .partial_cmp(&rank(b.0))
                    .unwrap_or(Ordering::Equal)
            });
            if rank(matches[0].0) == rank(matches[1].0) {
                let top = rank(matches[0].0);
                let count = matches.iter().filter(|(e, _)| rank(e) == top).count();
                return Err(StrategyError::Ambiguous {
                    target: target.describe(),
                    tier,
                    count,
                });
            }
            Ok(Some(matches.remove(0)))
        }
    }
}

fn attribute_locator(
    element: &Element,
    key: &str,
    value: &str,
    platform: Platform,
) -> Locator {
    match platform {
        Platform::Ios => Locator::xpath(format!(
            "//{}[@{}={}]",
            element.native_type,
            key,
            xpath_literal(value)
        )),
        Platform::Android => Locator::xpath(format!("//*[@{}={}]", key, xpath_literal(value))),
        Platform::Web => match key {
            "id" if css_identifier(value) => Locator::css(format!("#{}", value)),
            "id" => Locator::css(format!("[id={}]", css_string(value))),
            "class" if css_identifier(value) => Locator::css(format!(".{}", value)),
            "class" => Locator::css(format!("[class~={}]", css_string(value))),
            "name" => Locator::css(format!("[name={}]", css_string(value))),
            "text" => Locator::xpath(format!(
                "//{}[text()={}]",
                element.native_type,
                xpath_literal(value)
            )),
            _ => Locator::css(element.path.to_css()),
        },
    }
}

/// XPath 1.0 string literals have no escape sequences; quote with
/// whichever mark the value lacks, or stitch mixed-quote values together
/// with concat().
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Whether the value can appear verbatim in a `#id` / `.class` selector.
fn css_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Double-quoted CSS string with `"` and `\` escaped.
fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn structural_locator(element: &Element, platform: Platform) -> Locator {
    match platform {
        Platform::Web => Locator::css(element.path.to_css()),
        _ => Locator::xpath(element.path.to_xpath()),
    }
}
