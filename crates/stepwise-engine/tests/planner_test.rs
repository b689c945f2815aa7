//! End-to-end planner runs over real tree dumps, driving the full
//! normalize → strategy → plan pipeline the way an external driver would.

use stepwise_engine::action::{Action, Locator};
use stepwise_engine::config::PlannerConfig;
use stepwise_engine::goal::{GoalSpec, GoalStep, Predicate, TargetSpec};
use stepwise_engine::history::History;
use stepwise_engine::planner::Planner;
use stepwise_engine::platform::Platform;

const LOGIN_PAGE: &str = r#"
    <!DOCTYPE html>
    <html>
      <body>
        <form>
          <input type="text" id="username" name="username" placeholder="Username">
          <button type="submit" id="submit-btn">Sign in</button>
        </form>
      </body>
    </html>
"#;

const WELCOME_PAGE: &str = r#"
    <html><body><h1>Welcome back</h1></body></html>
"#;

const LOADING_PAGE: &str = r#"
    <html><body><div class="spinner"></div></body></html>
"#;

const ANDROID_CHECKOUT: &str = r#"
    <hierarchy rotation="0">
      <node class="android.widget.FrameLayout" bounds="[0,0][1080,1920]">
        <node class="android.widget.Button" text="Checkout" resource-id="com.shop:id/checkout"
              content-desc="Checkout" clickable="true" enabled="true" bounds="[40,400][1040,520]"/>
      </node>
    </hierarchy>
"#;

fn login_goal() -> GoalSpec {
    GoalSpec {
        description: "log in as bob".to_string(),
        steps: vec![
            GoalStep {
                target: TargetSpec::text("username"),
                value: Some("bob".to_string()),
                reveal: false,
            },
            GoalStep {
                target: TargetSpec::text("submit-btn"),
                value: None,
                reveal: false,
            },
        ],
        done_when: Predicate::TextPresent("Welcome back".to_string()),
    }
}

#[test]
fn login_flow_runs_to_finish() {
    let planner = Planner::with_defaults();
    let goal = login_goal();
    let mut history = History::new();

    let action = planner.next_action(LOGIN_PAGE, None, &goal, &history);
    let Action::Input(input) = &action else {
        panic!("expected input, got {:?}", action);
    };
    assert_eq!(input.locator, Locator::css("#username"));
    assert_eq!(input.value, "bob");
    history.push(action, true);

    let action = planner.next_action(LOGIN_PAGE, None, &goal, &history);
    let Action::Tap(tap) = &action else {
        panic!("expected tap, got {:?}", action);
    };
    assert_eq!(tap.locator, Locator::css("#submit-btn"));
    history.push(action, true);

    let action = planner.next_action(WELCOME_PAGE, None, &goal, &history);
    assert!(matches!(action, Action::Finish(_)));
}

#[test]
fn identical_inputs_produce_identical_output_bytes() {
    let goal = login_goal();
    let mut history = History::new();
    history.push(Action::wait(1000, "warming up"), true);

    let first = Planner::with_defaults().next_action(LOGIN_PAGE, None, &goal, &history);
    let second = Planner::with_defaults().next_action(LOGIN_PAGE, None, &goal, &history);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn wire_format_carries_exactly_one_locator_key() {
    let planner = Planner::with_defaults();
    let goal = GoalSpec {
        description: "checkout".to_string(),
        steps: vec![GoalStep {
            target: TargetSpec::text("Checkout"),
            value: None,
            reveal: false,
        }],
        done_when: Predicate::Never,
    };
    let action = planner.next_action(ANDROID_CHECKOUT, None, &goal, &History::new());
    let value = serde_json::to_value(&action).unwrap();
    assert_eq!(value["action"], "tap");
    assert_eq!(value["xpath"], "//*[@text='Checkout']");
    assert!(value.get("css").is_none());
    assert!(value.get("bounds").is_none());
    assert!(value["explanation"].as_str().unwrap().starts_with("android:"));
}

#[test]
fn waits_back_off_while_a_spinner_is_on_screen() {
    let planner = Planner::with_defaults();
    let goal = login_goal();
    let mut history = History::new();

    for expected in [1000, 2000, 4000, 8000, 8000] {
        let action = planner.next_action(LOADING_PAGE, None, &goal, &history);
        let Action::Wait(wait) = &action else {
            panic!("expected wait, got {:?}", action);
        };
        assert_eq!(wait.timeout, expected);
        history.push(action, true);
    }
}

#[test]
fn malformed_tree_becomes_an_error_action_not_a_panic() {
    let planner = Planner::with_defaults();
    let action = planner.next_action(
        "<hierarchy><node bounds=",
        Some(Platform::Android),
        &login_goal(),
        &History::new(),
    );
    let Action::Error(err) = &action else {
        panic!("expected error, got {:?}", action);
    };
    assert!(err.message.contains("android"));
}

#[test]
fn ambiguous_targets_abort_instead_of_guessing() {
    let page = r#"
        <html><body>
          <button class="cta">Buy</button>
          <button class="cta">Buy</button>
        </body></html>
    "#;
    let planner = Planner::with_defaults();
    let goal = GoalSpec {
        description: "buy".to_string(),
        steps: vec![GoalStep {
            target: TargetSpec::text("Buy"),
            value: None,
            reveal: false,
        }],
        done_when: Predicate::Never,
    };
    let action = planner.next_action(page, None, &goal, &History::new());
    let Action::Error(err) = &action else {
        panic!("expected error, got {:?}", action);
    };
    assert!(err.message.contains("ambiguous"));
}

#[test]
fn step_budget_caps_runaway_runs() {
    let config = PlannerConfig {
        max_steps: 4,
        ..PlannerConfig::default()
    };
    let planner = Planner::new(config);
    let goal = login_goal();
    let mut history = History::new();
    for _ in 0..4 {
        history.push(Action::wait(1000, "w"), true);
    }
    let action = planner.next_action(LOGIN_PAGE, None, &goal, &history);
    let Action::Error(err) = &action else {
        panic!("expected error, got {:?}", action);
    };
    assert!(err.message.contains("budget"));
}

#[test]
fn exhausting_every_tier_reports_a_loop() {
    // A large retry budget keeps the retry check out of the way so the
    // run walks every selector tier before giving up.
    let config = PlannerConfig {
        max_retries: 20,
        ..PlannerConfig::default()
    };
    let planner = Planner::new(config);
    let goal = GoalSpec {
        description: "checkout".to_string(),
        steps: vec![GoalStep {
            target: TargetSpec::text("Checkout"),
            value: None,
            reveal: false,
        }],
        done_when: Predicate::Never,
    };
    let mut history = History::new();
    let mut seen = Vec::new();
    loop {
        let action = planner.next_action(ANDROID_CHECKOUT, None, &goal, &history);
        match action {
            Action::Tap(ref tap) => {
                seen.push(tap.locator.clone());
                history.push(action, false);
            }
            Action::Error(err) => {
                assert!(err.message.contains("loop detected"), "{}", err.message);
                break;
            }
            other => panic!("unexpected action {:?}", other),
        }
        assert!(history.len() < 20, "planner never gave up");
    }
    // Primary, secondary and structural locators were each tried before
    // the loop was declared.
    seen.dedup();
    assert_eq!(
        seen,
        vec![
            Locator::xpath("//*[@text='Checkout']"),
            Locator::xpath("//*[@content-desc='Checkout']"),
            Locator::xpath("/hierarchy[1]/node[1]/node[1]"),
        ]
    );
}

#[test]
fn quoted_labels_reach_the_wire_as_parsable_selectors() {
    let screen = r#"
        <hierarchy>
          <node class="android.widget.FrameLayout" bounds="[0,0][1080,1920]">
            <node class="android.widget.Button" text="Don&apos;t save"
                  clickable="true" bounds="[40,400][1040,520]"/>
          </node>
        </hierarchy>
    "#;
    let planner = Planner::with_defaults();
    let goal = GoalSpec {
        description: "discard changes".to_string(),
        steps: vec![GoalStep {
            target: TargetSpec::text("Don't save"),
            value: None,
            reveal: false,
        }],
        done_when: Predicate::Never,
    };
    let action = planner.next_action(screen, None, &goal, &History::new());
    let Action::Tap(tap) = &action else {
        panic!("expected tap, got {:?}", action);
    };
    // The apostrophe must not terminate the XPath string literal.
    assert_eq!(tap.locator, Locator::xpath(r#"//*[@text="Don't save"]"#));
}

#[test]
fn fallback_tier_is_named_in_the_explanation() {
    let screen = r#"
        <hierarchy>
          <node class="android.widget.FrameLayout" bounds="[0,0][1080,1920]">
            <node class="android.widget.ImageButton" content-desc="Share"
                  clickable="true" bounds="[900,100][1000,200]"/>
          </node>
        </hierarchy>
    "#;
    let planner = Planner::with_defaults();
    let goal = GoalSpec {
        description: "share".to_string(),
        steps: vec![GoalStep {
            target: TargetSpec::text("Share"),
            value: None,
            reveal: false,
        }],
        done_when: Predicate::Never,
    };
    let action = planner.next_action(screen, None, &goal, &History::new());
    let Action::Tap(tap) = &action else {
        panic!("expected tap, got {:?}", action);
    };
    assert_eq!(tap.locator, Locator::xpath("//*[@content-desc='Share']"));
    assert!(tap.explanation.contains("secondary attribute"));
}

#[test]
fn explicit_platform_overrides_detection() {
    let planner = Planner::with_defaults();
    // HTML passed as web works; the same text forced to Android fails to
    // parse as a hierarchy and surfaces as an error.
    let ok = planner.next_action(LOGIN_PAGE, Some(Platform::Web), &login_goal(), &History::new());
    assert!(matches!(ok, Action::Input(_)));
}
