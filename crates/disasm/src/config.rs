use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Environment variable naming the ildasm executable
pub const ILDASM_ENV: &str = "ILHASH_ILDASM";

const DEFAULT_TOOL: &str = "ildasm";

/// Where to find ildasm and where to put its output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IldasmConfig {
    /// Executable to run
    pub tool: PathBuf,

    /// Parent directory for per-module scratch directories
    /// (system temp dir when unset)
    pub scratch_root: Option<PathBuf>,
}

impl Default for IldasmConfig {
    fn default() -> Self {
        Self {
            tool: PathBuf::from(DEFAULT_TOOL),
            scratch_root: None,
        }
    }
}

impl IldasmConfig {
    /// Tool from [`ILDASM_ENV`] when set, otherwise `ildasm` on `PATH`
    pub fn from_env() -> Self {
        let tool = env::var_os(ILDASM_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL));
        Self {
            tool,
            ..Default::default()
        }
    }

    pub fn with_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tool_is_on_path() {
        let config = IldasmConfig::default();
        assert_eq!(config.tool, PathBuf::from("ildasm"));
        assert!(config.scratch_root.is_none());
    }

    #[test]
    fn builders_override_fields() {
        let config = IldasmConfig::default()
            .with_tool("/opt/dotnet/ildasm")
            .with_scratch_root("/var/tmp/ilhash");
        assert_eq!(config.tool, PathBuf::from("/opt/dotnet/ildasm"));
        assert_eq!(config.scratch_root, Some(PathBuf::from("/var/tmp/ilhash")));
    }
}
