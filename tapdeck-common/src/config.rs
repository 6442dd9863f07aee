//! Configuration loading and engine endpoint resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Compiled-in default engine endpoint
pub const DEFAULT_ENGINE_URL: &str = "http://127.0.0.1:5720";

/// Engine endpoint resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`engine_url` key)
/// 4. Compiled default (fallback)
pub fn resolve_engine_url(cli_arg: Option<&str>, env_var_name: &str) -> Result<String> {
    // Priority 1: Command-line argument
    if let Some(url) = cli_arg {
        return validate_engine_url(url);
    }

    // Priority 2: Environment variable
    if let Ok(url) = std::env::var(env_var_name) {
        return validate_engine_url(&url);
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = load_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(url) = config.get("engine_url").and_then(|v| v.as_str()) {
                    tracing::debug!(path = %config_path.display(), "Engine URL from config file");
                    return validate_engine_url(url);
                }
            }
        }
    }

    // Priority 4: Compiled default
    Ok(DEFAULT_ENGINE_URL.to_string())
}

/// Read an optional integer setting from the config file (e.g. timing knobs).
///
/// Returns None when the file or key is absent or malformed; callers fall
/// back to their compiled defaults.
pub fn config_file_int(key: &str) -> Option<i64> {
    let config_path = load_config_file().ok()?;
    let toml_content = std::fs::read_to_string(&config_path).ok()?;
    let config = toml::from_str::<toml::Value>(&toml_content).ok()?;
    config.get(key).and_then(|v| v.as_integer())
}

fn validate_engine_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::Config("Engine URL is empty".to_string()));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(Error::Config(format!(
            "Engine URL must be http(s): {}",
            trimmed
        )));
    }
    // Strip a trailing slash so endpoint paths can be appended uniformly
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Get the configuration file path for the platform
fn load_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir()
        .map(|d| d.join("tapdeck").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if user_config.exists() {
        return Ok(user_config);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/tapdeck/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_cli_arg_wins() {
        std::env::set_var("TAPDECK_TEST_URL_A", "http://env:1");
        let url = resolve_engine_url(Some("http://cli:2"), "TAPDECK_TEST_URL_A").unwrap();
        assert_eq!(url, "http://cli:2");
        std::env::remove_var("TAPDECK_TEST_URL_A");
    }

    #[test]
    #[serial]
    fn test_env_var_second() {
        std::env::set_var("TAPDECK_TEST_URL_B", "http://env:1");
        let url = resolve_engine_url(None, "TAPDECK_TEST_URL_B").unwrap();
        assert_eq!(url, "http://env:1");
        std::env::remove_var("TAPDECK_TEST_URL_B");
    }

    #[test]
    #[serial]
    fn test_default_fallback() {
        std::env::remove_var("TAPDECK_TEST_URL_C");
        let url = resolve_engine_url(None, "TAPDECK_TEST_URL_C").unwrap();
        // Either the default or a value from a real config file on the host;
        // both must be valid http(s) endpoints.
        assert!(url.starts_with("http"));
    }

    #[test]
    fn test_rejects_empty_url() {
        assert!(resolve_engine_url(Some(""), "TAPDECK_TEST_URL_D").is_err());
        assert!(resolve_engine_url(Some("   "), "TAPDECK_TEST_URL_D").is_err());
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(resolve_engine_url(Some("ftp://x"), "TAPDECK_TEST_URL_D").is_err());
        assert!(resolve_engine_url(Some("localhost:5720"), "TAPDECK_TEST_URL_D").is_err());
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let url = resolve_engine_url(Some("http://host:5720/"), "TAPDECK_TEST_URL_D").unwrap();
        assert_eq!(url, "http://host:5720");
    }
}
