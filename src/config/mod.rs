use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::CheckRegistry;
use crate::error::Result;

/// Top-level configuration from `.capguard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Additional capability-check functions beyond the built-in
/// `capable`/`ns_capable` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Callee name mapped to the argument index of the capability token.
    #[serde(default)]
    pub functions: HashMap<String, usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Exit with a failure code when any misplaced-check warning fires.
    #[serde(default)]
    pub deny_warnings: bool,
    /// Also record conditions without any capability check.
    /// Off by default: check-free conditions carry no signal downstream.
    #[serde(default)]
    pub include_absent: bool,
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Registry combining built-in and configured check functions.
    pub fn registry(&self) -> CheckRegistry {
        CheckRegistry::with_extra(self.checks.functions.clone())
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# capguard configuration

[checks]
# Extra capability-check functions: name = capability argument index.
# capable (arg 0) and ns_capable (arg 1) are always recognized.
# [checks.functions]
# file_ns_capable = 2
# sk_ns_capable = 2

[report]
# Exit non-zero when a misplaced capability check is found.
deny_warnings = false
# Also record conditions that contain no capability check.
include_absent = false
"#
    }
}
