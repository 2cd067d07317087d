//! Shared path helpers.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Directory under `$HOME` holding the default config file.
pub const CONFIG_DIR_NAME: &str = ".ccenv";
/// File name of the default config file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns true if the path is non-empty and absolute.
pub fn is_nonempty_absolute(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_absolute()
}

/// Default config location derived from a home directory value.
pub fn default_config_path(home: Option<OsString>) -> Option<PathBuf> {
    home.filter(|value| !value.is_empty()).map(|home| {
        PathBuf::from(home)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    })
}
