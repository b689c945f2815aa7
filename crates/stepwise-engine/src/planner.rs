//! The action planner: one invocation in, exactly one action out.
//!
//! The planner is a pure function of (tree, platform, goal, history,
//! config). It holds no state between invocations and never returns an
//! error across the boundary; every failure mode becomes an `error`
//! action so the caller always has something executable to report.
//!
//! Decision order per invocation:
//!   1. detect the platform and normalize the tree,
//!   2. check the completion predicate,
//!   3. enforce the step and retry budgets,
//!   4. resolve the current step's target through the strategy tiers,
//!   5. on a miss, wait with exponential backoff or give up,
//!   6. on a hit, emit the step's action from the best non-looping
//!      candidate.

use crate::config::PlannerConfig;
use crate::goal::{GoalSpec, GoalStep};
use crate::normalize::normalize;
use crate::strategy::{self, Candidate, StrategyOptions};
use stepwise_common::action::Action;
use stepwise_common::element::{Element, Rect, Role};
use stepwise_common::history::History;
use stepwise_common::platform::Platform;
use tracing::debug;

/// Fallback viewport when the tree carries no geometry at all.
const DEFAULT_VIEWPORT: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 1080.0,
    height: 1920.0,
};

pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Planner { config }
    }

    pub fn with_defaults() -> Self {
        Planner::new(PlannerConfig::default())
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Decide the single next action for the run.
    pub fn next_action(
        &self,
        source: &str,
        platform: Option<Platform>,
        goal: &GoalSpec,
        history: &History,
    ) -> Action {
        let Some(platform) = platform.or_else(|| Platform::detect(source)) else {
            return Action::error(
                "platform not specified and not detectable from the tree",
                "cannot normalize a tree of unknown format",
            );
        };

        let elements = match normalize(source, platform) {
            Ok(elements) => elements,
            Err(err) => {
                return Action::error(
                    err.to_string(),
                    format!("{} tree could not be normalized", platform),
                )
            }
        };
        debug!(%platform, elements = elements.len(), step = history.completed_steps(), "planning");

        if goal.done_when.eval(&elements) {
            return Action::finish(format!(
                "completion condition satisfied for \"{}\"",
                goal.description
            ));
        }

        if history.len() >= self.config.max_steps {
            return Action::error(
                format!("step budget of {} exhausted", self.config.max_steps),
                format!("\"{}\" did not complete in time", goal.description),
            );
        }

        let step_index = history.completed_steps();
        let Some(step) = goal.steps.get(step_index) else {
            return Action::error(
                "all goal steps executed but completion condition still unsatisfied",
                format!(
                    "\"{}\" ran out of steps at index {}",
                    goal.description, step_index
                ),
            );
        };
        let target = step.target.describe();

        let failures = history.consecutive_failures();
        if failures >= self.config.max_retries {
            return Action::error(
                format!(
                    "giving up on {} after {} consecutive failed attempts",
                    target, failures
                ),
                "the retry budget for this step is spent".to_string(),
            );
        }

        let opts = StrategyOptions {
            fuzzy: self.config.fuzzy_matching,
        };
        let candidates = match strategy::resolve(&step.target, &elements, platform, opts) {
            Ok(candidates) => candidates,
            Err(err) => {
                return Action::error(
                    err.to_string(),
                    format!("{}: refusing to guess between tied matches", platform),
                )
            }
        };

        if candidates.is_empty() {
            return self.handle_not_found(&target, &elements, history);
        }

        for candidate in &candidates {
            let action = self.action_for(step, candidate, platform, &elements, &target);
            if action.is_terminal() {
                return action;
            }
            if history.is_repeating(&action, self.config.loop_window)
                || self.burned(history, &action)
            {
                debug!(tier = %candidate.tier, "skipping looping candidate");
                continue;
            }
            return action;
        }

        Action::error(
            format!("loop detected: all selector tiers exhausted for {}", target),
            "every remaining locator was already tried repeatedly without progress".to_string(),
        )
    }

    /// Whether this locator already burned through the loop window during
    /// the current run of failures. `History::is_repeating` only sees the
    /// trailing window, so without this a long failure run could rotate
    /// back to a tier that was already abandoned.
    fn burned(&self, history: &History, action: &Action) -> bool {
        if self.config.loop_window < 2 {
            return false;
        }
        let entries = history.entries();
        let failed_tail = &entries[entries.len() - history.consecutive_failures()..];
        failed_tail
            .iter()
            .filter(|e| e.action.same_effect(action))
            .count()
            >= self.config.loop_window - 1
    }

    fn handle_not_found(&self, target: &str, elements: &[Element], history: &History) -> Action {
        let loading = elements.iter().any(|e| e.role == Role::LoadingIndicator);
        let waits = history.trailing_waits();
        if loading || waits == 0 {
            let explanation = if loading {
                format!("waiting for {}: a loading indicator is on screen", target)
            } else {
                format!("waiting for {}: not on screen yet", target)
            };
            return Action::wait(self.backoff(waits), explanation);
        }
        Action::error(
            format!("{} not found after {} waits", target, waits),
            "the screen settled without the target appearing".to_string(),
        )
    }

    /// Doubling backoff: base, 2x, 4x... capped.
    fn backoff(&self, waits: usize) -> u64 {
        let doubled = if waits >= 63 {
            u64::MAX
        } else {
            self.config.wait_base_ms.saturating_mul(1 << waits)
        };
        doubled.min(self.config.wait_cap_ms)
    }

    fn action_for(
        &self,
        step: &GoalStep,
        candidate: &Candidate,
        platform: Platform,
        elements: &[Element],
        target: &str,
    ) -> Action {
        if step.reveal {
            return self.swipe_toward(candidate, elements, platform, target);
        }
        let explanation = format!(
            "{}: {} match for {} via {}",
            platform, candidate.tier, target, candidate.matched_on
        );
        if candidate.role.is_text_input() {
            return match &step.value {
                Some(value) => Action::input(candidate.locator.clone(), value.clone(), explanation),
                None => Action::error(
                    format!("input step for {} carries no value to type", target),
                    "a text field target requires a value".to_string(),
                ),
            };
        }
        // A value on a non-input role is still typed; custom widgets often
        // accept keystrokes without reporting a text-field type.
        if let Some(value) = &step.value {
            return Action::input(candidate.locator.clone(), value.clone(), explanation);
        }
        Action::tap(candidate.locator.clone(), explanation)
    }

    /// Scroll gesture that moves the target toward the viewport. The root
    /// element's bounds stand in for the viewport; a target below it means
    /// dragging content upward.
    fn swipe_toward(
        &self,
        candidate: &Candidate,
        elements: &[Element],
        platform: Platform,
        target: &str,
    ) -> Action {
        let viewport = elements
            .first()
            .and_then(|e| e.bounds)
            .unwrap_or(DEFAULT_VIEWPORT);
        let x = (viewport.x + viewport.width / 2.0) as i32;
        let below = candidate
            .bounds
            .map(|b| b.center().1 > viewport.y + viewport.height)
            .unwrap_or(true);
        let near = (viewport.y + viewport.height / 3.0) as i32;
        let far = (viewport.y + viewport.height * 2.0 / 3.0) as i32;
        let (start_y, end_y) = if below { (far, near) } else { (near, far) };
        Action::swipe(
            x,
            start_y,
            x,
            end_y,
            self.config.swipe_duration_ms,
            format!("{}: scrolling {} into view", platform, target),
        )
    }
}
