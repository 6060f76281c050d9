//! Content items: manifest entries bound to the plugin catalog

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{BuildAction, ContentEntry};
use crate::error::{PathEscapeError, PipelineError, PipelineResult};
use crate::plugin::{Catalog, ImporterDescriptor, ProcessorDescriptor};
use crate::utils::{ensure_no_escape, extension_of, normalize_content_path};

mod parameters;

#[cfg(test)]
mod tests;

pub use parameters::ParameterBag;

/// A manifest entry joined against the plugin catalog.
///
/// The item owns its entry; every edit updates the entry so it can be written
/// back to the manifest as-is.
#[derive(Debug, Clone)]
pub struct ContentItem {
    entry: ContentEntry,
    importer: Arc<ImporterDescriptor>,
    processor: Arc<ProcessorDescriptor>,
    parameters: ParameterBag,
}

impl ContentItem {
    /// Resolve the entry's importer and processor names against `catalog`.
    ///
    /// Empty names stay unresolved. Names missing from the catalog resolve to
    /// the sentinels; the entry keeps the names so the manifest is not
    /// rewritten.
    pub fn bind(mut entry: ContentEntry, catalog: &Catalog) -> Self {
        let importer = resolve_importer(&entry, catalog);
        let processor = resolve_processor(&entry, catalog);

        let parameters = if processor.is_none() {
            ParameterBag::default()
        } else {
            let (bag, accepted) = ParameterBag::with_overrides(&processor, &entry.processor_params);
            entry.processor_params = accepted;
            bag
        };

        Self {
            entry,
            importer,
            processor,
            parameters,
        }
    }

    /// Re-resolve against a reloaded catalog
    pub fn rebind(&mut self, catalog: &Catalog) {
        *self = Self::bind(self.entry.clone(), catalog);
    }

    /// Bind importer and processor from the path's extension when the entry
    /// names neither. Returns whether anything was bound.
    pub fn assign_from_extension(&mut self, catalog: &Catalog) -> bool {
        if !self.entry.importer.is_empty() || !self.entry.processor.is_empty() {
            return false;
        }
        self.bind_by_extension(catalog)
    }

    fn bind_by_extension(&mut self, catalog: &Catalog) -> bool {
        let extension = extension_of(&self.entry.path);
        let (importer, processor) = catalog.lookup(&extension);
        if importer.is_none() {
            debug!(
                "No importer for {:?} ({}), leaving it unresolved",
                self.entry.category, extension
            );
        }

        self.entry.importer = persisted_name(importer.is_none(), &importer.type_name);
        self.entry.processor = persisted_name(processor.is_none(), &processor.type_name);
        self.importer = importer;
        self.use_processor_defaults(processor);
        true
    }

    fn use_processor_defaults(&mut self, processor: Arc<ProcessorDescriptor>) {
        self.parameters = ParameterBag::defaults(&processor);
        self.entry.processor_params = self.parameters.to_params();
        self.processor = processor;
    }

    /// Set a new path.
    ///
    /// Separators are normalized and one leading slash is stripped. When a
    /// catalog is given (the registry is initialized) and either the extension
    /// changed or the entry names no importer and no processor, importer and
    /// processor are looked up again and parameters are reset to the new
    /// processor's defaults. Returns whether the item was rebound. A path with
    /// `../` is rejected and leaves the item unchanged.
    pub fn set_path(
        &mut self,
        path: &str,
        catalog: Option<&Catalog>,
    ) -> Result<bool, PathEscapeError> {
        let normalized = normalize_content_path(path);
        ensure_no_escape(&normalized)?;

        let extension_changed = extension_of(&self.entry.path) != extension_of(&normalized);
        let unnamed = self.entry.importer.is_empty() && self.entry.processor.is_empty();
        self.entry.path = normalized;

        match catalog {
            Some(catalog) if extension_changed || unnamed => {
                Ok(self.bind_by_extension(catalog))
            }
            _ => Ok(false),
        }
    }

    /// Set one processor parameter from its string form.
    ///
    /// Returns `Ok(false)` when the bound processor has no such browsable
    /// property, including when the processor is unresolved.
    pub fn set_parameter(&mut self, key: &str, value: &str) -> PipelineResult<bool> {
        let parsed = match self.parameters.parse(key, value) {
            Some(parsed) => parsed,
            None => {
                debug!(
                    "Ignoring parameter {:?} for {:?}: processor {} has no such property",
                    key, self.entry.category, self.processor.type_name
                );
                return Ok(false);
            }
        };

        let value = parsed.map_err(|source| PipelineError::Parameter {
            key: key.to_string(),
            source,
        })?;
        self.entry
            .processor_params
            .insert(key.to_string(), value.to_string());
        self.parameters.store(key, value);
        Ok(true)
    }

    /// Bind another importer; the processor becomes the importer's default
    pub fn set_importer(&mut self, name: &str, catalog: &Catalog) {
        let importer = catalog.importer_or_none(name);
        if importer.is_none() && name != importer.type_name {
            warn!("Importer {:?} is not in the plugin catalog, using NONE", name);
        }

        let processor = catalog.processor_or_none(&importer.default_processor);
        self.entry.importer = persisted_name(importer.is_none(), &importer.type_name);
        self.entry.processor = persisted_name(processor.is_none(), &processor.type_name);
        self.importer = importer;
        self.use_processor_defaults(processor);
    }

    /// Bind another processor with its default parameters
    pub fn set_processor(&mut self, name: &str, catalog: &Catalog) {
        let processor = catalog.processor_or_none(name);
        if processor.is_none() && name != processor.type_name {
            warn!("Processor {:?} is not in the plugin catalog, using NONE", name);
        }

        if !processor.is_none() && !self.importer.is_none() {
            let output = &self.importer.output_type;
            if !output.is_empty() && *output != processor.input_type {
                debug!(
                    "Processor {} consumes {}, importer {} yields {}",
                    processor.type_name, processor.input_type, self.importer.type_name, output
                );
            }
        }

        self.entry.processor = persisted_name(processor.is_none(), &processor.type_name);
        self.use_processor_defaults(processor);
    }

    pub fn set_recursive(&mut self, recursive: bool) {
        self.entry.recursive = recursive;
    }

    pub fn set_action(&mut self, action: BuildAction) {
        self.entry.action = action;
    }

    /// Replace the watched dependency patterns
    pub fn set_dependencies(&mut self, dependencies: Vec<String>) -> Result<(), PathEscapeError> {
        let normalized: Vec<String> = dependencies
            .iter()
            .map(|d| normalize_content_path(d))
            .collect();
        for dependency in &normalized {
            ensure_no_escape(dependency)?;
        }
        self.entry.dependencies = normalized;
        Ok(())
    }

    pub(crate) fn set_category(&mut self, category: &str) {
        self.entry.category = category.to_string();
    }

    pub fn entry(&self) -> &ContentEntry {
        &self.entry
    }

    pub fn category(&self) -> &str {
        &self.entry.category
    }

    pub fn path(&self) -> &str {
        &self.entry.path
    }

    pub fn action(&self) -> BuildAction {
        self.entry.action
    }

    pub fn importer(&self) -> &Arc<ImporterDescriptor> {
        &self.importer
    }

    pub fn processor(&self) -> &Arc<ProcessorDescriptor> {
        &self.processor
    }

    pub fn parameters(&self) -> &ParameterBag {
        &self.parameters
    }
}

/// Sentinels are persisted as an absent name
fn persisted_name(is_none: bool, type_name: &str) -> String {
    if is_none {
        String::new()
    } else {
        type_name.to_string()
    }
}

fn resolve_importer(entry: &ContentEntry, catalog: &Catalog) -> Arc<ImporterDescriptor> {
    if entry.importer.is_empty() {
        return catalog.none_importer();
    }
    catalog.importer(&entry.importer).unwrap_or_else(|| {
        warn!(
            "Content {:?} uses importer {:?}, which is not in the plugin catalog",
            entry.category, entry.importer
        );
        catalog.none_importer()
    })
}

fn resolve_processor(entry: &ContentEntry, catalog: &Catalog) -> Arc<ProcessorDescriptor> {
    if entry.processor.is_empty() {
        return catalog.none_processor();
    }
    catalog.processor(&entry.processor).unwrap_or_else(|| {
        warn!(
            "Content {:?} uses processor {:?}, which is not in the plugin catalog",
            entry.category, entry.processor
        );
        catalog.none_processor()
    })
}
