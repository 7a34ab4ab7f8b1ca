//! Default paths for rollcall components
//!
//! Paths are user-writable by default (no root required):
//! - Socket: `$XDG_RUNTIME_DIR/rollcall/rollcalld.sock` or `/tmp/rollcall-$USER/rollcalld.sock`
//! - Data: `$XDG_DATA_HOME/rollcall` or `~/.local/share/rollcall`
//! - Config: `$XDG_CONFIG_HOME/rollcall/config.toml` or `~/.config/rollcall/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const ROLLCALL_SOCKET_ENV: &str = "ROLLCALL_SOCKET";

/// Environment variable for overriding the data directory
pub const ROLLCALL_DATA_DIR_ENV: &str = "ROLLCALL_DATA_DIR";

const SOCKET_FILENAME: &str = "rollcalld.sock";
const CONFIG_FILENAME: &str = "config.toml";
const APP_DIR: &str = "rollcall";

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$ROLLCALL_SOCKET`
/// 2. `$XDG_RUNTIME_DIR/rollcall/rollcalld.sock`
/// 3. `/tmp/rollcall-$USER/rollcalld.sock`
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(ROLLCALL_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Socket path ignoring `$ROLLCALL_SOCKET`; clap checks the variable itself.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default data directory (holds the ledger database).
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(ROLLCALL_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Data directory ignoring `$ROLLCALL_DATA_DIR`.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share").join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default configuration file path.
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}
