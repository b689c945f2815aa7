//! Decision core for cross-platform UI automation: normalizes a UI tree,
//! ranks candidate locators for the current goal step, and emits exactly
//! one next action per invocation.

pub mod config;
pub mod goal;
pub mod normalize;
pub mod planner;
pub mod strategy;

pub use stepwise_common::{action, element, history, platform};
