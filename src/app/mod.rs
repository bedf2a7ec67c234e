// Lovi - app/mod.rs
//
// Application layer: tailing, monitor sessions, scheduling, persistence,
// and GUI-facing state.
// Dependencies: core layer, platform (config values, file identity).
// Must NOT depend on: ui.

pub mod monitor;
pub mod persist;
pub mod registry;
pub mod scheduler;
pub mod state;
pub mod tail;
