//! Application-level orchestration.
//!
//! This module owns the form's load/submit lifecycle and the presentation
//! interface it drives. UI layers (TUI, console) implement `FormView` and send
//! `UiCommand`s; they never talk to the remote endpoint directly.

mod controller;
#[cfg_attr(not(feature = "tui"), allow(dead_code))]
mod feedback;
mod view;

pub(crate) use controller::{run_controller, FormController, SubmitOutcome, UiCommand};
pub(crate) use feedback::clock_stamp;
#[cfg(feature = "tui")]
pub(crate) use feedback::MessageBox;
pub(crate) use view::{ChannelView, FormView};

#[cfg(test)]
pub(crate) use view::build_entries;
