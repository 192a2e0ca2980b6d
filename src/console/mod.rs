//! Operator console (the command bridge).
//!
//! A blocking stdin loop on its own thread feeds an action queue drained on
//! the bot's event loop. See [`bridge`] for the worker side and [`actions`]
//! for the loop side.

/// Loop-side action executor
pub mod actions;
/// Worker read loop
pub mod bridge;
/// Command grammar
pub mod parse;
/// Shared process context
pub mod state;

pub use actions::{Action, ActionReceiver, ActionSender, action_queue, run_dispatcher};
pub use bridge::spawn_worker;
pub use state::{ConsoleOutput, ProcessContext, ReloadReport, StdoutConsole};
