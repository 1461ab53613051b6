//! NeuroMark: a personal bookmark library with projects, AI-assisted
//! metadata and optional cloud sync.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod host_bridge;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
