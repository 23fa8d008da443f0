//! XDG-compliant path resolution for the tracker database.

use std::env;
use std::path::PathBuf;

const DATA_DIR_NAME: &str = "tracker";
const DB_FILE_NAME: &str = "tracker.db";

/// Data directory: `$XDG_DATA_HOME/tracker`, else `~/.local/share/tracker`.
///
/// Falls back to `./tracker` when neither variable is set.
pub fn get_data_dir() -> PathBuf {
    let data_home = env::var_os("XDG_DATA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_home.join(DATA_DIR_NAME)
}

/// Default database file: `<data dir>/tracker.db`
pub fn get_db_path() -> PathBuf {
    get_data_dir().join(DB_FILE_NAME)
}
