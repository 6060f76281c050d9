//! Content Pipeline Library
//!
//! Resolves declarative asset manifests against discovered importer and
//! processor plugins, and drives content builds over the resolved files.

pub mod build;
pub mod cli;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod plugin;
pub mod utils;

pub use build::{BuildHandle, BuildOptions, BuildOrchestrator, BuildReport, BuildState, ResolvedContent};
pub use config::{BuildAction, ContentEntry, ContentList, Manifest, ManifestSettings, MoveDirection};
pub use content::{ContentItem, ParameterBag};
pub use engine::{BuildEngine, BuildLogger, BuildRequest, BuildSummary, LocalBuildEngine};
pub use error::{PipelineError, PipelineResult};
pub use plugin::{Catalog, ManifestModuleLoader, ModuleLoader, PluginRegistry};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::utils::{ensure_no_escape, normalize_content_path};

/// An entry naming an importer or processor missing from the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMismatch {
    pub category: String,

    /// `"importer"` or `"processor"`
    pub kind: &'static str,

    pub name: String,
}

/// Session context owning the manifest, the plugin registry and the bound
/// content items
pub struct ContentPipeline {
    manifest: Manifest,

    /// File the manifest autosaves to after every edit
    manifest_path: Option<PathBuf>,

    /// Directory relative paths resolve against
    base_dir: PathBuf,

    registry: PluginRegistry,

    /// One item per manifest entry, in manifest order
    items: Vec<ContentItem>,

    orchestrator: BuildOrchestrator,
}

impl ContentPipeline {
    /// Open a manifest file. Edits are saved back to it.
    pub fn open(path: &Path, loader: Arc<dyn ModuleLoader>) -> PipelineResult<Self> {
        let manifest = Manifest::from_file(path)?;
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut pipeline = Self::from_manifest(manifest, base_dir, loader)?;
        pipeline.manifest_path = Some(path.to_path_buf());
        info!(
            "Opened {:?} with {} content entries",
            path,
            pipeline.items.len()
        );
        Ok(pipeline)
    }

    /// Create a pipeline over an in-memory manifest; nothing is saved
    /// until [`ContentPipeline::save_as`]
    pub fn from_manifest(
        manifest: Manifest,
        base_dir: impl Into<PathBuf>,
        loader: Arc<dyn ModuleLoader>,
    ) -> PipelineResult<Self> {
        let mut pipeline = Self {
            manifest,
            manifest_path: None,
            base_dir: base_dir.into(),
            registry: PluginRegistry::new(loader),
            items: Vec::new(),
            orchestrator: BuildOrchestrator::default(),
        };
        pipeline.reload_plugins()?;
        Ok(pipeline)
    }

    /// Reload the registry from the manifest references and rebind every item
    fn reload_plugins(&mut self) -> PipelineResult<()> {
        self.registry.reset();
        if let Err(e) = self
            .registry
            .load(&self.manifest.settings.references, &self.base_dir)
        {
            warn!("{}", e);
            for failure in &e.failures {
                warn!("  {}", failure);
            }
        }

        let catalog = self.registry.catalog();
        let mut items = Vec::with_capacity(self.manifest.content.len());
        for entry in self.manifest.content.iter() {
            let mut item = ContentItem::bind(entry.clone(), catalog);
            item.assign_from_extension(catalog);
            items.push(item);
        }

        for item in &items {
            self.manifest.content.replace(item.entry().clone())?;
        }
        self.items = items;
        Ok(())
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest_path.as_deref()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings(&self) -> &ManifestSettings {
        &self.manifest.settings
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &Catalog {
        self.registry.catalog()
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn item(&self, category: &str) -> Option<&ContentItem> {
        self.manifest
            .content
            .position(category)
            .and_then(|i| self.items.get(i))
    }

    /// Handle for observing and canceling builds
    pub fn build_handle(&self) -> BuildHandle {
        self.orchestrator.handle()
    }

    pub fn set_build_options(&mut self, options: BuildOptions) {
        self.orchestrator.set_options(options);
    }

    /// Entries naming plugins that are not in the catalog
    pub fn binding_mismatches(&self) -> Vec<BindingMismatch> {
        let mut mismatches = Vec::new();
        for item in &self.items {
            let entry = item.entry();
            if !entry.importer.is_empty() && item.importer().is_none() {
                mismatches.push(BindingMismatch {
                    category: entry.category.clone(),
                    kind: "importer",
                    name: entry.importer.clone(),
                });
            }
            if !entry.processor.is_empty() && item.processor().is_none() {
                mismatches.push(BindingMismatch {
                    category: entry.category.clone(),
                    kind: "processor",
                    name: entry.processor.clone(),
                });
            }
        }
        mismatches
    }

    /// Add a content entry, binding it by extension unless it names its
    /// importer or processor
    pub fn add_content(&mut self, entry: ContentEntry) -> PipelineResult<&ContentItem> {
        if self.manifest.content.contains(&entry.category) {
            return Err(PipelineError::DuplicateCategory(entry.category));
        }

        let mut entry = entry;
        entry.path = normalize_content_path(&entry.path);
        ensure_no_escape(&entry.path)?;
        for dependency in &mut entry.dependencies {
            *dependency = normalize_content_path(dependency);
            ensure_no_escape(dependency)?;
        }

        let catalog = self.registry.catalog();
        let mut item = ContentItem::bind(entry, catalog);
        if self.registry.is_initialized() {
            item.assign_from_extension(catalog);
        }

        let index = self.manifest.content.push(item.entry().clone())?;
        self.items.push(item);
        self.persist()?;
        Ok(&self.items[index])
    }

    /// Remove a content entry
    pub fn remove_content(&mut self, category: &str) -> PipelineResult<ContentEntry> {
        let index = self.index_of(category)?;
        let entry = self
            .manifest
            .content
            .remove(category)
            .ok_or_else(|| PipelineError::UnknownCategory(category.to_string()))?;
        self.items.remove(index);
        self.persist()?;
        Ok(entry)
    }

    /// Rename a content entry in place
    pub fn rename_content(&mut self, from: &str, to: &str) -> PipelineResult<()> {
        let index = self.index_of(from)?;
        self.manifest.content.rename(from, to)?;
        self.items[index].set_category(to);
        self.persist()
    }

    /// Set the path of an entry; returns whether its plugins were rebound
    pub fn set_path(&mut self, category: &str, path: &str) -> PipelineResult<bool> {
        let initialized = self.registry.is_initialized();
        self.edit(category, |item, catalog| {
            Ok(item.set_path(path, initialized.then_some(catalog))?)
        })
    }

    /// Set a processor parameter; returns whether the processor has it
    pub fn set_parameter(&mut self, category: &str, key: &str, value: &str) -> PipelineResult<bool> {
        self.edit(category, |item, _| item.set_parameter(key, value))
    }

    pub fn set_importer(&mut self, category: &str, importer: &str) -> PipelineResult<()> {
        self.edit(category, |item, catalog| {
            item.set_importer(importer, catalog);
            Ok(())
        })
    }

    pub fn set_processor(&mut self, category: &str, processor: &str) -> PipelineResult<()> {
        self.edit(category, |item, catalog| {
            item.set_processor(processor, catalog);
            Ok(())
        })
    }

    pub fn set_recursive(&mut self, category: &str, recursive: bool) -> PipelineResult<()> {
        self.edit(category, |item, _| {
            item.set_recursive(recursive);
            Ok(())
        })
    }

    pub fn set_action(&mut self, category: &str, action: BuildAction) -> PipelineResult<()> {
        self.edit(category, |item, _| {
            item.set_action(action);
            Ok(())
        })
    }

    pub fn set_dependencies(&mut self, category: &str, dependencies: Vec<String>) -> PipelineResult<()> {
        self.edit(category, |item, _| Ok(item.set_dependencies(dependencies)?))
    }

    /// Move the entry at `index` one step; returns its new index, or `None`
    /// when it cannot move
    pub fn reorder(&mut self, index: usize, direction: MoveDirection) -> PipelineResult<Option<usize>> {
        let moved = build::reorder(&mut self.manifest.content, &mut self.items, index, direction);
        if moved.is_some() {
            self.persist()?;
        }
        Ok(moved)
    }

    /// Replace the plugin references; the catalog is rebuilt and every item
    /// rebound
    pub fn set_references(&mut self, references: Vec<String>) -> PipelineResult<()> {
        self.update_settings(|settings| settings.references = references)
    }

    /// Edit the global settings. A change of references reloads the plugins.
    pub fn update_settings(&mut self, edit: impl FnOnce(&mut ManifestSettings)) -> PipelineResult<()> {
        let references = self.manifest.settings.references.clone();
        edit(&mut self.manifest.settings);

        if self.manifest.settings.references != references {
            info!("Plugin references changed, reloading plugins");
            self.reload_plugins()?;
        }
        self.persist()
    }

    /// Resolve every item into copy and build files
    pub fn resolve(&self) -> PipelineResult<ResolvedContent> {
        Ok(build::resolve(&self.items, &self.manifest.settings, &self.base_dir)?)
    }

    /// Resolve and build everything through `engine`
    pub async fn build(
        &self,
        engine: &dyn BuildEngine,
        logger: &dyn BuildLogger,
        rebuild_now: bool,
    ) -> PipelineResult<BuildReport> {
        self.orchestrator
            .build(
                &self.items,
                &self.manifest.settings,
                &self.base_dir,
                engine,
                logger,
                rebuild_now,
            )
            .await
    }

    /// Save to the file the manifest was opened from
    pub fn save(&self) -> PipelineResult<()> {
        match &self.manifest_path {
            Some(path) => self.manifest.save_to_file(path),
            None => Err(PipelineError::Manifest(
                "the manifest has no file, use save_as".to_string(),
            )),
        }
    }

    /// Save to `path`, which becomes the autosave target
    pub fn save_as(&mut self, path: &Path) -> PipelineResult<()> {
        self.manifest.save_to_file(path)?;
        self.manifest_path = Some(path.to_path_buf());
        Ok(())
    }

    fn index_of(&self, category: &str) -> PipelineResult<usize> {
        self.manifest
            .content
            .position(category)
            .ok_or_else(|| PipelineError::UnknownCategory(category.to_string()))
    }

    /// Apply an edit to a copy of the item; the item, the manifest and the
    /// file only change when the edit succeeds
    fn edit<T>(
        &mut self,
        category: &str,
        apply: impl FnOnce(&mut ContentItem, &Catalog) -> PipelineResult<T>,
    ) -> PipelineResult<T> {
        let index = self.index_of(category)?;
        let mut item = self.items[index].clone();
        let result = apply(&mut item, self.registry.catalog())?;

        self.manifest.content.replace(item.entry().clone())?;
        self.items[index] = item;
        self.persist()?;
        Ok(result)
    }

    fn persist(&self) -> PipelineResult<()> {
        if let Some(path) = &self.manifest_path {
            self.manifest.save_to_file(path)?;
        }
        Ok(())
    }
}
