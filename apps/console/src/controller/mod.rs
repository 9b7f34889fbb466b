//! Controller layer: typed commands, screen events, and the scenario screen.

pub mod commands;
pub mod events;
pub mod screen;
