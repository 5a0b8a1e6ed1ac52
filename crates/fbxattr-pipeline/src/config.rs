//! Pipeline configuration
//!
//! Read from `fbxattr.yaml` at the project root:
//!
//! ```yaml
//! model_extension: fbx
//! asset_extension: asset
//! pretty_json: true
//! log_level: "warn,fbxattr=debug"
//! ```
//!
//! Every key is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use fbxattr_core::{Error, Result};

/// File name looked up at the project root
pub const CONFIG_FILE_NAME: &str = "fbxattr.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Extension of model files that trigger generation, compared case-insensitively
    pub model_extension: String,
    /// Extension of generated container assets
    pub asset_extension: String,
    /// Indent stored assets
    pub pretty_json: bool,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_extension: "fbx".to_string(),
            asset_extension: "asset".to_string(),
            pretty_json: true,
            log_level: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;

        Self::from_yaml(&text).map_err(|e| e.with_context(format!("loading {}", path.display())))
    }

    /// Load `fbxattr.yaml` from `root`, or the defaults when it is absent
    pub fn load_from_project(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "Loading pipeline configuration");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("model_extension", &self.model_extension),
            ("asset_extension", &self.asset_extension),
        ] {
            if value.trim_start_matches('.').is_empty() {
                return Err(Error::InvalidConfig {
                    message: format!("{key} must not be empty"),
                });
            }
        }
        Ok(())
    }
}
