//! Application-level orchestration.
//!
//! Owns the view lifecycle (mount, submit, unmount) and submission processing.
//! The TUI drives a [`ViewController`]; headless `--add` calls
//! [`process_submission`] directly.

mod controller;
mod submission;

#[cfg_attr(not(feature = "tui"), allow(unused_imports))]
pub(crate) use controller::{UiCommand, ViewController};
pub(crate) use submission::process_submission;
