//! Shared data model and wire protocol for the stepwise action resolver.

pub mod action;
pub mod element;
pub mod history;
pub mod platform;
