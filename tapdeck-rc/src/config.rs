//! tapdeck-rc specific configuration

use tapdeck_common::config::{config_file_int, resolve_engine_url};

use crate::error::{Error, Result};

/// Default bounded per-call timeout for engine commands and queries
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 2000;

/// Default progress bar width in pixels, used for smooth-refresh pacing
pub const DEFAULT_RENDER_WIDTH: u32 = 320;

/// Remote control configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the playback engine's control surface
    pub engine_url: String,
    /// Bounded per-call timeout in milliseconds
    pub call_timeout_ms: u64,
    /// Progress bar width in pixels (0 = unknown, fallback applies)
    pub render_width: u32,
}

impl Config {
    /// Resolve configuration from CLI argument, environment and config file
    pub fn resolve(cli_engine_url: Option<&str>, render_width: u32) -> Result<Self> {
        let engine_url = resolve_engine_url(cli_engine_url, "TAPDECK_ENGINE_URL")
            .map_err(|e| Error::Config(e.to_string()))?;

        let call_timeout_ms = config_file_int("call_timeout_ms")
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(DEFAULT_CALL_TIMEOUT_MS);

        Ok(Self {
            engine_url,
            call_timeout_ms,
            render_width,
        })
    }
}
