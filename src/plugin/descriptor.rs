//! Descriptors of discovered importers and processors

use contentpipe_plugin::{PropertyValue, ValueKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Type name of the "unresolved" sentinel importer and processor
pub const NONE: &str = "NONE";

/// A discovered importer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImporterDescriptor {
    /// Unique id within a catalog
    pub type_name: String,

    pub display_name: String,

    /// Processor bound when content is first assigned to this importer
    pub default_processor: String,

    /// Extensions including the leading dot, compared case-sensitively
    pub file_extensions: Vec<String>,

    /// Opaque tag of what the importer yields
    pub output_type: String,

    /// Synthesized for importers that declare no metadata
    pub any_extension: bool,
}

impl ImporterDescriptor {
    /// The sentinel for "unresolved"
    pub fn none() -> Self {
        Self {
            type_name: NONE.to_string(),
            display_name: NONE.to_string(),
            default_processor: NONE.to_string(),
            file_extensions: Vec::new(),
            output_type: String::new(),
            any_extension: false,
        }
    }

    pub fn is_none(&self) -> bool {
        self.type_name == NONE
    }

    /// Whether `extension` is explicitly listed
    pub fn handles(&self, extension: &str) -> bool {
        self.file_extensions.iter().any(|e| e == extension)
    }

    /// Whether the importer may be bound to a file with `extension`
    pub fn accepts(&self, extension: &str) -> bool {
        self.any_extension || self.handles(extension)
    }
}

/// A processor property as shown to users
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub display_name: String,
    pub kind: ValueKind,

    /// Value read from the transient instance
    pub value: PropertyValue,

    /// Value content starts with when bound to the processor
    pub default_value: PropertyValue,

    pub browsable: bool,
}

impl Serialize for PropertyDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("PropertyDescriptor", 6)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("displayName", &self.display_name)?;
        state.serialize_field("valueKind", &self.kind)?;
        state.serialize_field("value", &self.value.to_string())?;
        state.serialize_field("defaultValue", &self.default_value.to_string())?;
        state.serialize_field("browsable", &self.browsable)?;
        state.end()
    }
}

/// A discovered processor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorDescriptor {
    pub type_name: String,
    pub display_name: String,

    /// Opaque tag of the input consumed; compatibility with importers is advisory
    pub input_type: String,

    /// Properties in declaration order
    pub properties: Vec<PropertyDescriptor>,
}

impl ProcessorDescriptor {
    /// The sentinel for "unresolved", with no properties
    pub fn none() -> Self {
        Self {
            type_name: NONE.to_string(),
            display_name: NONE.to_string(),
            input_type: String::new(),
            properties: Vec::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.type_name == NONE
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Browsable properties, in declaration order
    pub fn browsable_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.browsable)
    }

    /// Canonical default value of every browsable property
    pub fn default_params(&self) -> BTreeMap<String, String> {
        self.browsable_properties()
            .map(|p| (p.name.clone(), p.default_value.to_string()))
            .collect()
    }
}
