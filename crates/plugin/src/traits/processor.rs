//! Importer metadata and processor instance traits

use serde::{Deserialize, Serialize};

use crate::value::PropertyValue;

/// Capability metadata an importer type declares about itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImporterMetadata {
    /// Display name, falls back to the type name
    #[serde(default)]
    pub display_name: Option<String>,

    /// Processor selected when content is first bound to this importer
    #[serde(default)]
    pub default_processor: String,

    /// Extensions handled by the importer, including the leading dot
    #[serde(default)]
    pub file_extensions: Vec<String>,

    /// Opaque tag naming what the importer yields
    #[serde(default)]
    pub output_type: String,
}

/// A property read from a transient processor instance
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    /// Property identifier used in `processorParam`
    pub name: String,

    /// Label shown to users
    pub display_name: String,

    /// Current value of the transient instance
    pub value: PropertyValue,

    /// Hidden properties are kept in the descriptor but never parameterized
    pub browsable: bool,
}

impl PropertyInfo {
    /// Create a browsable property whose display name equals its name
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            value,
            browsable: true,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.browsable = false;
        self
    }
}

/// Live processor instance used to read property defaults
pub trait ProcessorInstance: Send {
    /// Opaque tag of the input this processor consumes
    fn input_type(&self) -> String;

    /// Properties in declaration order
    fn properties(&self) -> Vec<PropertyInfo>;
}
