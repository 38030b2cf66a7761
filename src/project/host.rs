use crate::project::config::RuntimeConfig;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const BUNDLED_CORE: &str = include_str!("../../lib/plume/core.plm");
pub const BUNDLED_SYNTAX: &str = include_str!("../../lib/plume/syntax.plm");

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Where the text came from, for diagnostics only.
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Could not find module `{name}`")]
    NotFound { name: String, searched: Vec<PathBuf> },
    #[error("Failed to read module `{name}` from {}: {error}", path.display())]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

/// Supplies module source text by name. The runtime never touches storage
/// itself.
pub trait ModuleHost {
    fn load_module(&self, name: &str) -> Result<SourceFile, HostError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryHost {
    modules: HashMap<String, String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.modules.insert(name.into(), text.into());
    }
}

impl ModuleHost for MemoryHost {
    fn load_module(&self, name: &str) -> Result<SourceFile, HostError> {
        self.modules
            .get(name)
            .map(|text| SourceFile::new(format!("<{name}>"), text.clone()))
            .ok_or_else(|| HostError::NotFound {
                name: name.to_string(),
                searched: Vec::new(),
            })
    }
}

/// Maps `a.b.c` to `<root>/a/b/c.<extension>` over an ordered list of roots.
#[derive(Debug, Clone)]
pub struct FileSystemHost {
    search_paths: Vec<PathBuf>,
    extension: String,
}

impl FileSystemHost {
    pub fn new(search_paths: Vec<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            search_paths,
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &RuntimeConfig, root: &Path) -> Self {
        Self::new(
            config.resolved_search_paths(root),
            config.modules.extension.clone(),
        )
    }

    pub fn add_search_path(&mut self, path: PathBuf) {
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }

    pub fn module_path(&self, root: &Path, name: &str) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in name.split('.') {
            path.push(segment);
        }
        path.set_extension(&self.extension);
        path
    }
}

impl ModuleHost for FileSystemHost {
    fn load_module(&self, name: &str) -> Result<SourceFile, HostError> {
        let mut searched = Vec::with_capacity(self.search_paths.len());
        for root in &self.search_paths {
            let path = self.module_path(root, name);
            if path.is_file() {
                let text = fs::read_to_string(&path).map_err(|error| HostError::Io {
                    name: name.to_string(),
                    path: path.clone(),
                    error,
                })?;
                return Ok(SourceFile::new(path.display().to_string(), text));
            }
            searched.push(path);
        }
        Err(HostError::NotFound {
            name: name.to_string(),
            searched,
        })
    }
}

/// Serves the bundled core and syntax modules when the wrapped host does not
/// provide its own.
#[derive(Debug, Clone)]
pub struct BundledHost<H> {
    inner: H,
    core_name: String,
    syntax_name: String,
}

impl<H: ModuleHost> BundledHost<H> {
    pub fn new(inner: H, config: &RuntimeConfig) -> Self {
        Self {
            inner,
            core_name: config.runtime.base_module.clone(),
            syntax_name: config.runtime.syntax_module.clone(),
        }
    }
}

impl<H: ModuleHost> ModuleHost for BundledHost<H> {
    fn load_module(&self, name: &str) -> Result<SourceFile, HostError> {
        match self.inner.load_module(name) {
            Err(HostError::NotFound { .. }) if name == self.core_name => {
                Ok(SourceFile::new("<bundled core>", BUNDLED_CORE))
            }
            Err(HostError::NotFound { .. }) if name == self.syntax_name => {
                Ok(SourceFile::new("<bundled syntax>", BUNDLED_SYNTAX))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_host_reports_missing_modules() {
        let host = MemoryHost::new().with_module("app", "(print 1)");
        assert_eq!(host.load_module("app").unwrap().text, "(print 1)");
        assert!(matches!(
            host.load_module("other"),
            Err(HostError::NotFound { .. })
        ));
    }

    #[test]
    fn file_system_host_maps_dotted_names_to_paths() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::create_dir_all(second.path().join("geo")).unwrap();
        fs::write(second.path().join("geo").join("shapes.plm"), "(val x 1)").unwrap();

        let host = FileSystemHost::new(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            "plm",
        );
        let source = host.load_module("geo.shapes").unwrap();
        assert_eq!(source.text, "(val x 1)");
        assert!(source.path.ends_with("shapes.plm"));

        match host.load_module("geo.missing") {
            Err(HostError::NotFound { searched, .. }) => assert_eq!(searched.len(), 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn bundled_host_falls_back_to_shipped_modules() {
        let config = RuntimeConfig::default();
        let host = BundledHost::new(MemoryHost::new().with_module("plume.syntax", ""), &config);
        assert_eq!(host.load_module("plume.core").unwrap().text, BUNDLED_CORE);
        assert_eq!(host.load_module("plume.syntax").unwrap().text, "");
        assert!(host.load_module("app").is_err());
    }
}
