// NeuroMark services
// Services provide core functionality: persistence, migration, merging, derived views, cloud sync, AI, settings.

pub mod ai_assistant;
pub mod cloud_sync;
pub mod local_store;
pub mod merge;
pub mod migration;
pub mod seed_data;
pub mod settings_engine;
pub mod sync_session;
pub mod view_state;
