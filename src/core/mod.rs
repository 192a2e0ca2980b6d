//! Core logic, independent of the Discord client.

/// Message counting (all-time and sessions)
pub mod counter;
/// Shutdown delay parsing
pub mod duration;
/// Embed data and patches
pub mod embed;
/// Tenor search and GIF URL extraction
pub mod gif;
/// Help pages
pub mod help;
/// Recent-mentions log
pub mod mentions;
/// Text/structured command registry
pub mod registry;
/// JSON key-value store
pub mod store;
/// Template substitution engine
pub mod template;
