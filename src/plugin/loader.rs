//! Plugin module loading
//!
//! Modules are declarative YAML files describing importer and processor
//! types. Each referenced file is one module.

use anyhow::{anyhow, Result};
use contentpipe_plugin::{
    ImporterMetadata, PluginModule, PluginType, ProcessorInstance, PropertyInfo, PropertyValue,
    ValueKind,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::DiscoveryError;

/// Loads plugin modules from paths
pub trait ModuleLoader: Send + Sync {
    /// Whether `path` looks like a module this loader understands.
    /// Used when a reference expands to a whole directory.
    fn is_module(&self, path: &Path) -> bool;

    /// Load the module at `path`
    fn load(&self, path: &Path) -> Result<Arc<dyn PluginModule>, DiscoveryError>;
}

/// Loader for declarative YAML plugin modules
#[derive(Debug, Clone, Default)]
pub struct ManifestModuleLoader;

impl ModuleLoader for ManifestModuleLoader {
    fn is_module(&self, path: &Path) -> bool {
        path.is_file()
            && matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
    }

    fn load(&self, path: &Path) -> Result<Arc<dyn PluginModule>, DiscoveryError> {
        let module_name = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DiscoveryError::new(&module_name, e))?;

        let fallback_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| module_name.clone());

        let module = DeclaredModule::from_yaml(&fallback_name, &content)
            .map_err(|e| DiscoveryError::new(&module_name, e))?;

        debug!(
            "Loaded plugin module {} ({} types) from {:?}",
            module.name,
            module.types.len(),
            path
        );
        Ok(Arc::new(module))
    }
}

/// Module file structure
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleFile {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Capability {
    Importer,
    Processor,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeDecl {
    #[serde(rename = "type")]
    type_name: String,

    #[serde(default, rename = "abstract")]
    is_abstract: bool,

    #[serde(default)]
    capabilities: Vec<Capability>,

    #[serde(default)]
    importer: Option<ImporterMetadata>,

    #[serde(default)]
    processor: Option<ProcessorDecl>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessorDecl {
    #[serde(default)]
    display_name: Option<String>,

    #[serde(default)]
    input_type: String,

    #[serde(default)]
    properties: Vec<PropertyDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyDecl {
    name: String,

    #[serde(default)]
    display_name: Option<String>,

    kind: ValueKind,

    #[serde(default)]
    value: Option<serde_yaml::Value>,

    #[serde(default)]
    variants: Vec<String>,

    #[serde(default = "default_browsable")]
    browsable: bool,
}

fn default_browsable() -> bool {
    true
}

impl PropertyDecl {
    fn to_property(&self) -> Result<PropertyInfo> {
        let raw = match &self.value {
            None | Some(serde_yaml::Value::Null) => None,
            Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
            Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
            Some(serde_yaml::Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(anyhow!(
                    "property {} has a non-scalar value: {:?}",
                    self.name,
                    other
                ))
            }
        };

        let value = match (self.kind, raw) {
            (ValueKind::Enum, raw) => {
                let current = raw
                    .or_else(|| self.variants.first().cloned())
                    .unwrap_or_default();
                PropertyValue::enumeration("", self.variants.clone()).parse_like(&current)?
            }
            (kind, Some(raw)) => PropertyValue::parse(kind, &raw)?,
            (kind, None) => zero_value(kind),
        };

        let mut info = PropertyInfo::new(&self.name, value);
        if let Some(display_name) = &self.display_name {
            info = info.with_display_name(display_name);
        }
        if !self.browsable {
            info = info.hidden();
        }
        Ok(info)
    }
}

fn zero_value(kind: ValueKind) -> PropertyValue {
    match kind {
        ValueKind::Bool => PropertyValue::Bool(false),
        ValueKind::Int => PropertyValue::Int(0),
        ValueKind::Double => PropertyValue::Double(0.0),
        ValueKind::Float => PropertyValue::Float(0.0),
        ValueKind::Color => PropertyValue::Color(contentpipe_plugin::Color::WHITE),
        ValueKind::Enum => PropertyValue::enumeration("", Vec::<String>::new()),
        ValueKind::String => PropertyValue::String(String::new()),
    }
}

/// A module parsed from a declarative description
pub struct DeclaredModule {
    name: String,
    types: Vec<Arc<dyn PluginType>>,
}

impl DeclaredModule {
    /// Parse a module from YAML text. `fallback_name` is used when the
    /// document has no `name`.
    pub fn from_yaml(fallback_name: &str, content: &str) -> Result<Self> {
        let file: ModuleFile = serde_yaml::from_str(content)?;
        let types = file
            .types
            .into_iter()
            .map(|decl| Arc::new(DeclaredType { decl }) as Arc<dyn PluginType>)
            .collect();

        Ok(Self {
            name: file.name.unwrap_or_else(|| fallback_name.to_string()),
            types,
        })
    }
}

impl PluginModule for DeclaredModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn types(&self) -> Vec<Arc<dyn PluginType>> {
        self.types.clone()
    }
}

struct DeclaredType {
    decl: TypeDecl,
}

impl PluginType for DeclaredType {
    fn type_name(&self) -> &str {
        &self.decl.type_name
    }

    fn is_abstract(&self) -> bool {
        self.decl.is_abstract
    }

    fn describes_importer(&self) -> bool {
        self.decl.capabilities.contains(&Capability::Importer)
    }

    fn describes_processor(&self) -> bool {
        self.decl.capabilities.contains(&Capability::Processor)
    }

    fn importer_metadata(&self) -> Option<ImporterMetadata> {
        self.decl.importer.clone()
    }

    fn processor_display_name(&self) -> Option<String> {
        self.decl
            .processor
            .as_ref()
            .and_then(|p| p.display_name.clone())
    }

    fn instantiate_processor(&self) -> Result<Box<dyn ProcessorInstance>> {
        if !self.describes_processor() {
            return Err(anyhow!("{} is not a processor", self.decl.type_name));
        }

        let decl = self.decl.processor.clone().unwrap_or_default();
        let properties = decl
            .properties
            .iter()
            .map(PropertyDecl::to_property)
            .collect::<Result<Vec<_>>>()?;

        Ok(Box::new(DeclaredProcessor {
            input_type: decl.input_type,
            properties,
        }))
    }
}

struct DeclaredProcessor {
    input_type: String,
    properties: Vec<PropertyInfo>,
}

impl ProcessorInstance for DeclaredProcessor {
    fn input_type(&self) -> String {
        self.input_type.clone()
    }

    fn properties(&self) -> Vec<PropertyInfo> {
        self.properties.clone()
    }
}

/// Expand manifest references into module paths.
///
/// `~` and environment variables are expanded, relative references resolve
/// against `base_dir`, and wildcard references expand to every module file
/// they match. Paths are deduplicated by file name, first one wins.
pub fn expand_references(
    references: &[String],
    base_dir: &Path,
    loader: &dyn ModuleLoader,
) -> (Vec<PathBuf>, Vec<DiscoveryError>) {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut failures = Vec::new();

    for reference in references {
        let expanded = match shellexpand::full(reference) {
            Ok(expanded) => expanded.into_owned(),
            Err(e) => {
                failures.push(DiscoveryError::new(reference, e));
                continue;
            }
        };

        let path = PathBuf::from(&expanded);
        let path = if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        };

        if expanded.contains('*') || expanded.contains('?') {
            match expand_wildcard(&path, loader) {
                Ok(matches) => paths.extend(matches),
                Err(e) => failures.push(DiscoveryError::new(reference, e)),
            }
        } else {
            paths.push(path);
        }
    }

    let mut seen = std::collections::HashSet::new();
    paths.retain(|path| {
        let key = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| path.as_os_str().to_os_string());
        let first = seen.insert(key);
        if !first {
            debug!("Skipping duplicate plugin reference {:?}", path);
        }
        first
    });

    (paths, failures)
}

fn expand_wildcard(pattern: &Path, loader: &dyn ModuleLoader) -> Result<Vec<PathBuf>> {
    let mut matches = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = entry?;
        if loader.is_module(&path) {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches)
}
