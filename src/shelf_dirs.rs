//! Application directory paths for gameshelf.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/gameshelf/` | `~/.local/share/gameshelf/` |
//! | Config | `~/Library/Application Support/gameshelf/` | `~/.config/gameshelf/` |
//!
//! # Environment Overrides
//!
//! - `GAMESHELF_DATA_DIR` overrides [`data_dir`]
//! - `GAMESHELF_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root: holds the library file.
///
/// Resolves to `dirs::data_dir()/gameshelf/` by default.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("GAMESHELF_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("gameshelf"))
        .unwrap_or_else(|| PathBuf::from("/tmp/gameshelf-data"))
}

/// Application config directory: holds `config.toml`.
///
/// Resolves to `dirs::config_dir()/gameshelf/` by default.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("GAMESHELF_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("gameshelf"))
        .unwrap_or_else(|| PathBuf::from("/tmp/gameshelf-config"))
}

/// Default library file (`data_dir()/library.json`).
#[must_use]
pub fn library_path() -> PathBuf {
    data_dir().join("library.json")
}

/// Default config file (`config_dir()/config.toml`).
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}
