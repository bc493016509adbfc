//! Module for searching for driver config files

use std::path::PathBuf;

/// Base system fallback path to use if one cannot be found with XDG
const FALLBACK_BASE_PATH: &str = "/usr/share/ds4driver";

/// Name of the driver config file
const CONFIG_FILE: &str = "driver.yaml";

/// Returns the base path for configuration data
pub fn get_base_path() -> PathBuf {
    let Ok(base_dirs) = xdg::BaseDirectories::with_prefix("ds4driver") else {
        log::warn!("Unable to determine config base path. Using fallback path.");
        return PathBuf::from(FALLBACK_BASE_PATH);
    };

    // Get the data directories in preference order
    let data_dirs = base_dirs.get_data_dirs();
    for dir in data_dirs {
        if dir.exists() {
            return dir;
        }
    }

    log::warn!("Config base path not found. Using fallback path.");
    PathBuf::from(FALLBACK_BASE_PATH)
}

/// Returns a list of config file paths in load order.
/// E.g. ["./rootfs/usr/share/ds4driver/driver.yaml", "/etc/ds4driver/driver.yaml", "/usr/share/ds4driver/driver.yaml"]
pub fn get_config_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("./rootfs/usr/share/ds4driver").join(CONFIG_FILE),
        PathBuf::from("/etc/ds4driver").join(CONFIG_FILE),
        get_base_path().join(CONFIG_FILE),
    ]
}

/// Returns the first config file that exists, if any
pub fn get_config_path() -> Option<PathBuf> {
    get_config_paths().into_iter().find(|path| {
        log::trace!("Checking for config at {path:?}");
        path.exists() && path.is_file()
    })
}
