use crate::analysis::AnalyzerConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensConfig {
    pub analyzer: AnalyzerConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// fingerprint groups listed in the summary
    pub top_stacks: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_stacks: 5 }
    }
}

impl LensConfig {
    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Reads a TOML config; `None` gives the defaults.
pub fn load(path: Option<&Path>) -> Result<LensConfig> {
    match path {
        Some(p) => {
            let s = fs::read_to_string(p)?;
            log::debug!("loaded config from {}", p.display());
            LensConfig::from_toml(&s)
        }
        None => Ok(LensConfig::default()),
    }
}
