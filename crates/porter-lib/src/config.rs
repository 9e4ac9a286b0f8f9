//! Harness configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings for compiling and running ported code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Upper bound on any single compile or execute process
    #[serde(default = "default_process_timeout")]
    pub process_timeout_secs: u64,

    /// Parent directory of temporary workspaces (system temp dir when unset)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// Keep the workspace after a successful run
    #[serde(default)]
    pub keep_workspace: bool,
}

fn default_process_timeout() -> u64 {
    60
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            process_timeout_secs: default_process_timeout(),
            workspace_root: None,
            keep_workspace: false,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from `PORTER_*` environment variables
    pub fn load() -> Result<Self> {
        let config = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix("PORTER").try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.process_timeout(), Duration::from_secs(60));
        assert!(config.workspace_root.is_none());
        assert!(!config.keep_workspace);
    }

    #[test]
    fn test_load_reads_environment() {
        std::env::set_var("PORTER_PROCESS_TIMEOUT_SECS", "5");
        std::env::set_var("PORTER_KEEP_WORKSPACE", "true");
        let config = HarnessConfig::load().unwrap();
        std::env::remove_var("PORTER_PROCESS_TIMEOUT_SECS");
        std::env::remove_var("PORTER_KEEP_WORKSPACE");

        assert_eq!(config.process_timeout_secs, 5);
        assert!(config.keep_workspace);
        assert!(config.workspace_root.is_none());
    }
}
