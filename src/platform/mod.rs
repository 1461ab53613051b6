// NeuroMark platform paths
// Provides the configuration and data directories for Windows, macOS, and Linux.
//
// Base directories come from the `dirs` crate; the application folder name follows each
// platform's convention (lowercase on Linux, capitalized elsewhere).

use std::path::PathBuf;

#[cfg(target_os = "linux")]
const APP_DIR_NAME: &str = "neuromark";

#[cfg(not(target_os = "linux"))]
const APP_DIR_NAME: &str = "NeuroMark";

/// Used when the platform reports no home directory at all.
fn fallback_base() -> PathBuf {
    std::env::temp_dir()
}

/// Returns the platform-specific configuration directory for NeuroMark.
///
/// - **Linux**: `~/.config/neuromark` (or `$XDG_CONFIG_HOME/neuromark`)
/// - **macOS**: `~/Library/Application Support/NeuroMark`
/// - **Windows**: `%APPDATA%/NeuroMark`
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(fallback_base)
        .join(APP_DIR_NAME)
}

/// Returns the platform-specific data directory for NeuroMark.
///
/// - **Linux**: `~/.local/share/neuromark` (or `$XDG_DATA_HOME/neuromark`)
/// - **macOS**: `~/Library/Application Support/NeuroMark`
/// - **Windows**: `%APPDATA%/NeuroMark`
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(fallback_base)
        .join(APP_DIR_NAME)
}
