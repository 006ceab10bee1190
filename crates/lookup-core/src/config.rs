//! Environment configuration loader
//!
//! Loads `KEY=VALUE` pairs from the first environment file found so that the
//! settings store and the CLI see the same overrides.
//!
//! ```rust
//! use lookup_core::config::load_environment;
//!
//! load_environment();
//! ```

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Variable naming a custom environment file
pub const ENV_FILE_VAR: &str = "LOOKUP_ENV_FILE";

/// Paths checked in order of priority
pub const ENV_FILE_PATHS: &[&str] = &["/etc/revit-lookup/environment", ".env"];

/// Load environment variables from the first file that exists.
///
/// Existing variables are never overridden. Returns the path that was loaded.
pub fn load_environment() -> Option<String> {
    if let Ok(custom_path) = std::env::var(ENV_FILE_VAR) {
        if let Some(path) = try_load_env_file(&custom_path) {
            return Some(path);
        }
    }

    let loaded = ENV_FILE_PATHS.iter().find_map(|path| try_load_env_file(path));
    if loaded.is_none() {
        debug!("No environment file found, using existing environment");
    }
    loaded
}

fn try_load_env_file(path: &str) -> Option<String> {
    let path_obj = Path::new(path);
    if !path_obj.exists() {
        return None;
    }

    let content = match fs::read_to_string(path_obj) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read environment file {}: {}", path, e);
            return None;
        }
    };

    let mut loaded = 0usize;
    for (key, value) in content.lines().filter_map(parse_env_line) {
        if std::env::var(&key).is_err() {
            std::env::set_var(&key, &value);
            loaded += 1;
        }
    }

    info!(path = %path, loaded, "Loaded environment file");
    Some(path.to_string())
}

/// Parse one `KEY=VALUE` line, ignoring blanks and `#` comments.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);

    Some((key.to_string(), value.to_string()))
}

/// Get an optional configuration value.
pub fn get_config_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Parse a boolean flag the way the environment file writes them.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Get a boolean configuration value, `None` when unset or unparseable.
pub fn get_config_bool(key: &str) -> Option<bool> {
    get_config_opt(key).and_then(|v| parse_bool(&v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_line_quoted() {
        let (k, v) = parse_env_line("LOOKUP_SETTINGS=\"/tmp/a b.json\"").unwrap();
        assert_eq!(k, "LOOKUP_SETTINGS");
        assert_eq!(v, "/tmp/a b.json");

        let (_, v) = parse_env_line("X='y'").unwrap();
        assert_eq!(v, "y");
    }

    #[test]
    fn test_parse_env_line_skips_noise() {
        assert!(parse_env_line("").is_none());
        assert!(parse_env_line("# comment").is_none());
        assert!(parse_env_line("=value").is_none());
        assert!(parse_env_line("no equals sign").is_none());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("On"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
