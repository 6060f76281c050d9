//! In-memory plugin modules for tests and embedding

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contentpipe_plugin::PluginModule;

use super::loader::{DeclaredModule, ModuleLoader};
use crate::error::DiscoveryError;

/// Loader serving modules registered in memory, keyed by path
#[derive(Default)]
pub struct MemoryModuleLoader {
    modules: HashMap<PathBuf, Result<Arc<dyn PluginModule>, String>>,
}

impl MemoryModuleLoader {
    /// Create a new empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `module` at `path`
    pub fn with_module(mut self, path: impl Into<PathBuf>, module: Arc<dyn PluginModule>) -> Self {
        self.modules.insert(path.into(), Ok(module));
        self
    }

    /// Serve a module declared in YAML at `path`.
    ///
    /// Unparseable YAML registers a module that fails to load.
    pub fn with_yaml(mut self, path: impl Into<PathBuf>, yaml: &str) -> Self {
        let path = path.into();
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let module = DeclaredModule::from_yaml(&fallback, yaml)
            .map(|m| Arc::new(m) as Arc<dyn PluginModule>)
            .map_err(|e| e.to_string());
        self.modules.insert(path, module);
        self
    }

    /// Register a module that fails to load with `reason`
    pub fn with_failure(mut self, path: impl Into<PathBuf>, reason: &str) -> Self {
        self.modules.insert(path.into(), Err(reason.to_string()));
        self
    }
}

impl ModuleLoader for MemoryModuleLoader {
    fn is_module(&self, path: &Path) -> bool {
        self.modules.contains_key(path)
    }

    fn load(&self, path: &Path) -> Result<Arc<dyn PluginModule>, DiscoveryError> {
        let module_name = path.display().to_string();
        match self.modules.get(path) {
            Some(Ok(module)) => Ok(module.clone()),
            Some(Err(reason)) => Err(DiscoveryError::new(module_name, reason)),
            None => Err(DiscoveryError::new(module_name, "module not found")),
        }
    }
}
