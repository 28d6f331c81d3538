// SPDX-License-Identifier: MIT

//! Process settings read from the environment

use std::path::PathBuf;
use std::time::Duration;

use super::error::StageError;

const DEFAULT_PORT: u16 = 7878;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Policy registry file (YAML or JSON); builtin registry when `None`
    pub policy_path: Option<PathBuf>,
    /// Port for `stagecraft serve`
    pub port: u16,
    /// Timeout applied to `Http` action steps
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            policy_path: None,
            port: DEFAULT_PORT,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Read `STAGECRAFT_POLICY`, `STAGECRAFT_PORT` and
    /// `STAGECRAFT_HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, StageError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, StageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(path) = lookup("STAGECRAFT_POLICY").filter(|p| !p.is_empty()) {
            settings.policy_path = Some(PathBuf::from(path));
        }

        if let Some(port) = lookup("STAGECRAFT_PORT") {
            settings.port = port
                .parse()
                .map_err(|_| StageError::config(format!("invalid STAGECRAFT_PORT: {}", port)))?;
        }

        if let Some(secs) = lookup("STAGECRAFT_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                StageError::config(format!("invalid STAGECRAFT_HTTP_TIMEOUT_SECS: {}", secs))
            })?;
            settings.http_timeout = Duration::from_secs(secs);
        }

        Ok(settings)
    }
}
