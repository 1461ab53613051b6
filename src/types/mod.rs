// NeuroMark shared type definitions
// Each submodule defines types used across the application.

pub mod ai;
pub mod bookmark;
pub mod errors;
pub mod settings;
pub mod state;
pub mod view;
