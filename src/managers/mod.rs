// NeuroMark state managers
// Managers own mutable application state behind a controlled mutation API.

pub mod library_manager;
