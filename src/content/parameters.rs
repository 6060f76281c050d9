//! Typed processor parameters

use contentpipe_plugin::{PropertyValue, ValueError};
use std::collections::BTreeMap;
use tracing::warn;

use crate::plugin::ProcessorDescriptor;

/// Live values of a processor's browsable properties, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBag {
    values: Vec<(String, PropertyValue)>,
}

impl ParameterBag {
    /// Default values of every browsable property of `processor`
    pub fn defaults(processor: &ProcessorDescriptor) -> Self {
        Self {
            values: processor
                .browsable_properties()
                .map(|p| (p.name.clone(), p.default_value.clone()))
                .collect(),
        }
    }

    /// Defaults of `processor` overlaid with persisted overrides.
    ///
    /// Returns the bag plus the canonical form of every override that was
    /// accepted. Unknown keys and values that do not parse are dropped.
    pub fn with_overrides(
        processor: &ProcessorDescriptor,
        overrides: &BTreeMap<String, String>,
    ) -> (Self, BTreeMap<String, String>) {
        let mut bag = Self::defaults(processor);
        let mut accepted = BTreeMap::new();

        for (key, raw) in overrides {
            match bag.parse(key, raw) {
                Some(Ok(value)) => {
                    accepted.insert(key.clone(), value.to_string());
                    bag.store(key, value);
                }
                Some(Err(e)) => warn!(
                    "Ignoring invalid value {:?} for {}.{}: {}",
                    raw, processor.type_name, key, e
                ),
                None => warn!(
                    "Dropping parameter {:?}, {} has no such property",
                    key, processor.type_name
                ),
            }
        }

        (bag, accepted)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Parse `raw` with the kind of the current value of `name`.
    /// `None` when there is no such parameter.
    pub fn parse(&self, name: &str, raw: &str) -> Option<Result<PropertyValue, ValueError>> {
        self.get(name).map(|current| current.parse_like(raw))
    }

    /// Replace the value of an existing parameter
    pub(crate) fn store(&mut self, name: &str, value: PropertyValue) {
        if let Some(slot) = self.values.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value;
        }
    }

    /// Canonical string form of every value
    pub fn to_params(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }
}
