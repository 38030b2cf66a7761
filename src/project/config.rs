use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "plume.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    pub runtime: RuntimeSection,
    pub modules: ModuleSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeSection {
    pub base_module: String,
    pub syntax_module: String,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            base_module: "plume.core".to_string(),
            syntax_module: "plume.syntax".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModuleSection {
    pub search_paths: Vec<PathBuf>,
    pub extension: String,
}

impl Default for ModuleSection {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from(".")],
            extension: "plm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSection {
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("Invalid configuration in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl RuntimeConfig {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    /// Walks up from `start` looking for a `plume.toml`.
    pub fn discover(start: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                let config = Self::load(&candidate)?;
                return Ok(Some((candidate, config)));
            }
        }
        Ok(None)
    }

    /// Search paths made absolute against the directory holding the config.
    pub fn resolved_search_paths(&self, root: &Path) -> Vec<PathBuf> {
        self.modules
            .search_paths
            .iter()
            .map(|path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    root.join(path)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = RuntimeConfig::parse("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.runtime.base_module, "plume.core");
        assert_eq!(config.modules.extension, "plm");
    }

    #[test]
    fn sections_override_individual_keys() {
        let config = RuntimeConfig::parse(
            r#"
            [modules]
            search_paths = ["lib", "/opt/plume"]

            [log]
            filter = "plume=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.runtime.syntax_module, "plume.syntax");
        assert_eq!(config.log.filter, "plume=debug");
        let resolved = config.resolved_search_paths(Path::new("/work"));
        assert_eq!(
            resolved,
            vec![PathBuf::from("/work/lib"), PathBuf::from("/opt/plume")]
        );
    }

    #[test]
    fn discover_walks_up_to_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[runtime]\nbase_module = \"my.core\"\n",
        )
        .unwrap();
        let nested = dir.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        let (path, config) = RuntimeConfig::discover(&nested).unwrap().unwrap();
        assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(config.runtime.base_module, "my.core");
    }

    #[test]
    fn malformed_config_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[runtime\n").unwrap();
        let err = RuntimeConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
