//! Build metadata reported by `regsweep version`

use serde::{Deserialize, Serialize};

/// Package version plus whatever the build script could capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,

    /// Short commit hash, absent outside a git checkout
    pub commit: Option<String>,

    pub build_date: Option<String>,

    pub target: Option<String>,
}

impl VersionInfo {
    /// Version info baked in at build time
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("GIT_SHA").map(String::from),
            build_date: option_env!("BUILD_DATE").map(String::from),
            target: option_env!("TARGET").map(String::from),
        }
    }

    pub fn display(&self) -> String {
        let mut line = format!("regsweep {}", self.version);
        if let Some(commit) = &self.commit {
            line.push_str(&format!(" ({})", commit));
        }
        if let Some(target) = &self.target {
            line.push(' ');
            line.push_str(target);
        }
        line
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
