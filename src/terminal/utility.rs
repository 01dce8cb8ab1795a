//! Application directory helpers.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Name of the per-user application folder
pub const APP_FOLDER: &str = ".chart_terminal";

/// Resolve the application directory.
///
/// A folder named `app_folder` in the current working directory wins;
/// otherwise the folder lives in the home directory and is created on demand.
fn resolve_app_dir(app_folder: &str) -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let local = cwd.join(app_folder);
    if local.exists() {
        return local;
    }

    let home = dirs::home_dir().unwrap_or(cwd);
    let path = home.join(app_folder);
    if let Err(e) = fs::create_dir_all(&path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to create app directory");
    }
    path
}

/// Application directory
pub static APP_DIR: LazyLock<PathBuf> = LazyLock::new(|| resolve_app_dir(APP_FOLDER));

/// Get path for a file in the application directory
pub fn get_file_path(filename: &str) -> PathBuf {
    APP_DIR.join(filename)
}

/// Get path for a folder in the application directory, creating it if needed
pub fn get_folder_path(folder_name: &str) -> PathBuf {
    folder_in(&APP_DIR, folder_name)
}

/// Get a sub folder of `base`, creating it if needed
pub fn folder_in(base: &Path, folder_name: &str) -> PathBuf {
    let folder_path = base.join(folder_name);
    if !folder_path.exists() {
        if let Err(e) = fs::create_dir_all(&folder_path) {
            tracing::warn!(path = %folder_path.display(), error = %e, "failed to create folder");
        }
    }
    folder_path
}
