//! Plugin registry for discovering importer and processor types

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use contentpipe_plugin::{PluginModule, PluginType};

use super::descriptor::{ImporterDescriptor, ProcessorDescriptor, PropertyDescriptor, NONE};
use super::library::PipelineLibrary;
use super::loader::{expand_references, ModuleLoader};
use crate::error::{DiscoveryError, PartialLoadError};


/// Deduplicated importers and processors, sentinels first
#[derive(Debug, Clone)]
pub struct Catalog {
    importers: Vec<Arc<ImporterDescriptor>>,
    processors: Vec<Arc<ProcessorDescriptor>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::from_descriptors(Vec::new(), Vec::new())
    }
}

impl Catalog {
    /// Build a catalog, inserting the sentinels at index 0
    fn from_descriptors(
        mut importers: Vec<Arc<ImporterDescriptor>>,
        mut processors: Vec<Arc<ProcessorDescriptor>>,
    ) -> Self {
        importers.insert(0, Arc::new(ImporterDescriptor::none()));
        processors.insert(0, Arc::new(ProcessorDescriptor::none()));
        Self {
            importers,
            processors,
        }
    }

    pub fn importers(&self) -> &[Arc<ImporterDescriptor>] {
        &self.importers
    }

    pub fn processors(&self) -> &[Arc<ProcessorDescriptor>] {
        &self.processors
    }

    /// The "unresolved" importer
    pub fn none_importer(&self) -> Arc<ImporterDescriptor> {
        self.importers[0].clone()
    }

    /// The "unresolved" processor
    pub fn none_processor(&self) -> Arc<ProcessorDescriptor> {
        self.processors[0].clone()
    }

    /// Importer and default processor for a file extension.
    ///
    /// The first importer in catalog order listing `extension` wins. Falls
    /// back to the sentinels.
    pub fn lookup(&self, extension: &str) -> (Arc<ImporterDescriptor>, Arc<ProcessorDescriptor>) {
        match self.importers.iter().find(|i| i.handles(extension)) {
            Some(importer) => {
                let processor = self
                    .processor(&importer.default_processor)
                    .unwrap_or_else(|| self.none_processor());
                (importer.clone(), processor)
            }
            None => (self.none_importer(), self.none_processor()),
        }
    }

    /// Position of an importer by type name
    pub fn importer_index(&self, name: &str) -> Option<usize> {
        self.importers.iter().position(|i| i.type_name == name)
    }

    /// Position of a processor by display name or type name
    pub fn processor_index(&self, name: &str) -> Option<usize> {
        self.processors
            .iter()
            .position(|p| p.display_name == name || p.type_name == name)
    }

    pub fn importer(&self, name: &str) -> Option<Arc<ImporterDescriptor>> {
        self.importer_index(name).map(|i| self.importers[i].clone())
    }

    pub fn processor(&self, name: &str) -> Option<Arc<ProcessorDescriptor>> {
        self.processor_index(name).map(|i| self.processors[i].clone())
    }

    /// Importer by type name, or the sentinel
    pub fn importer_or_none(&self, name: &str) -> Arc<ImporterDescriptor> {
        self.importer(name).unwrap_or_else(|| self.none_importer())
    }

    /// Processor by name, or the sentinel
    pub fn processor_or_none(&self, name: &str) -> Arc<ProcessorDescriptor> {
        self.processor(name).unwrap_or_else(|| self.none_processor())
    }
}

/// Plugin registry owning the current catalog
pub struct PluginRegistry {
    /// Module always discovered first
    library: Arc<dyn PluginModule>,

    /// Loader for user-referenced modules
    loader: Arc<dyn ModuleLoader>,

    catalog: Catalog,

    /// Failures of the last load
    failures: Vec<DiscoveryError>,

    initialized: bool,
}

impl PluginRegistry {
    /// Create a new plugin registry with the built-in pipeline library
    pub fn new(loader: Arc<dyn ModuleLoader>) -> Self {
        Self::with_library(Arc::new(PipelineLibrary), loader)
    }

    /// Create a registry with a custom first module
    pub fn with_library(library: Arc<dyn PluginModule>, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            library,
            loader,
            catalog: Catalog::default(),
            failures: Vec::new(),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn loader(&self) -> Arc<dyn ModuleLoader> {
        self.loader.clone()
    }

    /// Failures recorded by the last load
    pub fn failures(&self) -> &[DiscoveryError] {
        &self.failures
    }

    /// Drop the catalog; the registry must be loaded again before use
    pub fn reset(&mut self) {
        self.catalog = Catalog::default();
        self.failures.clear();
        self.initialized = false;
    }

    /// Rebuild the catalog from manifest references.
    ///
    /// The registry is initialized afterwards even if some modules failed;
    /// the failures are returned alongside the partial catalog.
    pub fn load(&mut self, references: &[String], base_dir: &Path) -> Result<(), PartialLoadError> {
        let (paths, mut failures) = expand_references(references, base_dir, self.loader.as_ref());

        let result = self.discover(&paths);
        let catalog = match result {
            Ok(catalog) => catalog,
            Err(partial) => {
                failures.extend(partial.failures);
                *partial.catalog
            }
        };

        info!(
            "Plugin catalog loaded: {} importers, {} processors",
            catalog.importers.len() - 1,
            catalog.processors.len() - 1
        );

        self.catalog = catalog;
        self.failures = failures.clone();
        self.initialized = true;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PartialLoadError {
                catalog: Box::new(self.catalog.clone()),
                failures,
            })
        }
    }

    /// Discover every type of the library module plus the modules at
    /// `module_paths`, in order. Paths are deduplicated by file name.
    pub fn discover(&self, module_paths: &[PathBuf]) -> Result<Catalog, PartialLoadError> {
        let mut failures = Vec::new();
        let mut modules = vec![self.library.clone()];
        let mut seen = HashSet::new();

        for path in module_paths {
            let key = path.file_name().map(|n| n.to_os_string());
            if !seen.insert(key) {
                debug!("Skipping duplicate plugin module {:?}", path);
                continue;
            }

            match self.loader.load(path) {
                Ok(module) => modules.push(module),
                Err(e) => {
                    warn!("{}", e);
                    failures.push(e);
                }
            }
        }

        let mut importers = Vec::new();
        let mut processors = Vec::new();
        for module in &modules {
            for plugin_type in module.types() {
                if plugin_type.is_abstract() {
                    continue;
                }

                if plugin_type.describes_importer() {
                    importers.push(describe_importer(plugin_type.as_ref()));
                }

                if plugin_type.describes_processor() {
                    match describe_processor(plugin_type.as_ref()) {
                        Ok(processor) => processors.push(processor),
                        Err(reason) => {
                            let error = DiscoveryError::new(
                                module.name(),
                                format!("cannot instantiate {}: {}", plugin_type.type_name(), reason),
                            );
                            warn!("{}", error);
                            failures.push(error);
                        }
                    }
                }
            }
        }

        let importers = dedup(importers, "importer", |i| (&i.type_name, &i.display_name));
        let processors = dedup(processors, "processor", |p| (&p.type_name, &p.display_name));
        report_shadowed_extensions(&importers);

        let catalog = Catalog::from_descriptors(
            importers.into_iter().map(Arc::new).collect(),
            processors.into_iter().map(Arc::new).collect(),
        );

        if failures.is_empty() {
            Ok(catalog)
        } else {
            Err(PartialLoadError {
                catalog: Box::new(catalog),
                failures,
            })
        }
    }

    pub fn lookup(&self, extension: &str) -> (Arc<ImporterDescriptor>, Arc<ProcessorDescriptor>) {
        self.catalog.lookup(extension)
    }

    pub fn importer_index(&self, name: &str) -> Option<usize> {
        self.catalog.importer_index(name)
    }

    pub fn processor_index(&self, name: &str) -> Option<usize> {
        self.catalog.processor_index(name)
    }
}

fn describe_importer(plugin_type: &dyn PluginType) -> ImporterDescriptor {
    let type_name = plugin_type.type_name().to_string();

    match plugin_type.importer_metadata() {
        Some(metadata) => {
            let mut file_extensions: Vec<String> = Vec::new();
            for extension in metadata.file_extensions {
                let extension = if extension.starts_with('.') {
                    extension
                } else {
                    format!(".{}", extension)
                };
                if !file_extensions.contains(&extension) {
                    file_extensions.push(extension);
                }
            }

            ImporterDescriptor {
                display_name: metadata.display_name.unwrap_or_else(|| type_name.clone()),
                type_name,
                default_processor: metadata.default_processor,
                file_extensions,
                output_type: metadata.output_type,
                any_extension: false,
            }
        }
        None => ImporterDescriptor {
            display_name: type_name.clone(),
            type_name,
            default_processor: String::new(),
            file_extensions: Vec::new(),
            output_type: String::new(),
            any_extension: true,
        },
    }
}

fn describe_processor(plugin_type: &dyn PluginType) -> anyhow::Result<ProcessorDescriptor> {
    let instance = plugin_type.instantiate_processor()?;

    let properties = instance
        .properties()
        .into_iter()
        .map(|info| PropertyDescriptor {
            kind: info.value.kind(),
            name: info.name,
            display_name: info.display_name,
            default_value: info.value.clone(),
            value: info.value,
            browsable: info.browsable,
        })
        .collect();

    let type_name = plugin_type.type_name().to_string();
    Ok(ProcessorDescriptor {
        display_name: plugin_type
            .processor_display_name()
            .unwrap_or_else(|| type_name.clone()),
        type_name,
        input_type: instance.input_type(),
        properties,
    })
}

/// Keep the first of every type name and every display name
fn dedup<T>(items: Vec<T>, what: &str, names: impl Fn(&T) -> (&String, &String)) -> Vec<T> {
    let mut type_names = HashSet::new();
    let mut display_names = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let (type_name, display_name) = names(item);
            if type_name == NONE || display_name == NONE {
                warn!("Dropping {} named {:?}, the name is reserved", what, NONE);
                return false;
            }
            if type_names.contains(type_name) {
                warn!("Dropping duplicate {} type {:?}", what, type_name);
                return false;
            }
            if display_names.contains(display_name) {
                warn!("Dropping duplicate {} {:?}", what, display_name);
                return false;
            }
            type_names.insert(type_name.clone());
            display_names.insert(display_name.clone());
            true
        })
        .collect()
}

fn report_shadowed_extensions(importers: &[ImporterDescriptor]) {
    let mut owners: Vec<(&str, &str)> = Vec::new();
    for importer in importers {
        for extension in &importer.file_extensions {
            match owners.iter().find(|(ext, _)| ext == extension) {
                Some((_, owner)) => warn!(
                    "Importer {} is shadowed by {} for extension {}",
                    importer.type_name, owner, extension
                ),
                None => owners.push((extension, &importer.type_name)),
            }
        }
    }
}
