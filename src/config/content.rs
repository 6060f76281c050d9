//! Content entries and the ordered content list

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::settings::bool_or_string;
use crate::error::{PipelineError, PipelineResult};

/// What the build does with files matched by an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildAction {
    /// Run through importer, processor and build engine
    #[default]
    Build,

    /// Pass through unchanged
    Copy,
}

impl fmt::Display for BuildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildAction::Build => f.write_str("build"),
            BuildAction::Copy => f.write_str("copy"),
        }
    }
}

impl FromStr for BuildAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("build") {
            Ok(BuildAction::Build)
        } else if s.eq_ignore_ascii_case("copy") {
            Ok(BuildAction::Copy)
        } else {
            Err(format!("unknown build action: {s}"))
        }
    }
}

/// One manifest record describing a path pattern and its build treatment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    /// Unique key, also the display name. Persisted as the map key.
    #[serde(skip)]
    pub category: String,

    /// File or glob pattern. A leading `$` disables root-prefixing.
    pub path: String,

    /// Search subdirectories of the pattern's directory
    #[serde(
        default,
        deserialize_with = "bool_or_string",
        serialize_with = "bool_as_string"
    )]
    pub recursive: bool,

    #[serde(default)]
    pub action: BuildAction,

    /// Importer type name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub importer: String,

    /// Processor type name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub processor: String,

    /// Serialized processor property overrides
    #[serde(
        default,
        rename = "processorParam",
        deserialize_with = "scalar_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub processor_params: BTreeMap<String, String>,

    /// Extra watched file patterns
    #[serde(default, alias = "watch", skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl ContentEntry {
    /// Create a build entry with no bindings
    pub fn new(category: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            path: path.into(),
            recursive: false,
            action: BuildAction::Build,
            importer: String::new(),
            processor: String::new(),
            processor_params: BTreeMap::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: BuildAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = processor.into();
        self
    }

    pub fn with_importer(mut self, importer: impl Into<String>) -> Self {
        self.importer = importer.into();
        self
    }
}

fn bool_as_string<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(if *value { "true" } else { "false" })
}

/// Read a map whose values may be any scalar, storing them as strings
fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Int(i64),
        Float(f64),
        String(String),
    }

    let raw: Option<BTreeMap<String, Scalar>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Scalar::Bool(b) => b.to_string(),
                Scalar::Int(i) => i.to_string(),
                Scalar::Float(f) => f.to_string(),
                Scalar::String(s) => s,
            };
            (key, value)
        })
        .collect())
}

/// Direction of a positional move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl FromStr for MoveDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(MoveDirection::Up),
            "down" => Ok(MoveDirection::Down),
            _ => Err(format!("unknown direction: {s}")),
        }
    }
}

/// Ordered content entries with a separate category index.
///
/// Position is only changed by [`ContentList::move_entry`]; renames keep it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentList {
    entries: Vec<ContentEntry>,
    index: HashMap<String, usize>,
}

impl ContentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ContentEntry] {
        &self.entries
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.category.as_str())
    }

    pub fn contains(&self, category: &str) -> bool {
        self.index.contains_key(category)
    }

    pub fn position(&self, category: &str) -> Option<usize> {
        self.index.get(category).copied()
    }

    pub fn get(&self, category: &str) -> Option<&ContentEntry> {
        self.position(category).map(|i| &self.entries[i])
    }

    pub fn get_index(&self, index: usize) -> Option<&ContentEntry> {
        self.entries.get(index)
    }

    /// Append an entry; categories must be unique
    pub fn push(&mut self, entry: ContentEntry) -> PipelineResult<usize> {
        if self.contains(&entry.category) {
            return Err(PipelineError::DuplicateCategory(entry.category));
        }
        let position = self.entries.len();
        self.index.insert(entry.category.clone(), position);
        self.entries.push(entry);
        Ok(position)
    }

    /// Remove an entry, shifting the ones after it
    pub fn remove(&mut self, category: &str) -> Option<ContentEntry> {
        let position = self.position(category)?;
        let entry = self.entries.remove(position);
        self.rebuild_index();
        Some(entry)
    }

    /// Replace the entry with the same category in place
    pub fn replace(&mut self, entry: ContentEntry) -> PipelineResult<()> {
        let position = self
            .position(&entry.category)
            .ok_or_else(|| PipelineError::UnknownCategory(entry.category.clone()))?;
        self.entries[position] = entry;
        Ok(())
    }

    /// Rename a category without changing its position
    pub fn rename(&mut self, from: &str, to: &str) -> PipelineResult<()> {
        if from == to {
            return Ok(());
        }
        if self.contains(to) {
            return Err(PipelineError::DuplicateCategory(to.to_string()));
        }
        let position = self
            .position(from)
            .ok_or_else(|| PipelineError::UnknownCategory(from.to_string()))?;

        self.entries[position].category = to.to_string();
        self.index.remove(from);
        self.index.insert(to.to_string(), position);
        Ok(())
    }

    /// Swap the entry at `index` with its neighbour.
    ///
    /// Returns the entry's new position, or `None` when it is already at the
    /// edge or `index` is out of range.
    pub fn move_entry(&mut self, index: usize, direction: MoveDirection) -> Option<usize> {
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1)?,
            MoveDirection::Down => index + 1,
        };
        if index >= self.entries.len() || target >= self.entries.len() {
            return None;
        }

        self.entries.swap(index, target);
        self.index.insert(self.entries[index].category.clone(), index);
        self.index.insert(self.entries[target].category.clone(), target);
        Some(target)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.category.clone(), i))
            .collect();
    }
}

impl<'a> IntoIterator for &'a ContentList {
    type Item = &'a ContentEntry;
    type IntoIter = std::slice::Iter<'a, ContentEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for ContentList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.category, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ContentList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ContentListVisitor;

        impl<'de> Visitor<'de> for ContentListVisitor {
            type Value = ContentList;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of content categories to entries")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ContentList::new())
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut list = ContentList::new();
                while let Some((category, mut entry)) =
                    access.next_entry::<String, ContentEntry>()?
                {
                    entry.category = category;
                    list.push(entry).map_err(serde::de::Error::custom)?;
                }
                Ok(list)
            }
        }

        deserializer.deserialize_any(ContentListVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(categories: &[&str]) -> ContentList {
        let mut list = ContentList::new();
        for category in categories {
            list.push(ContentEntry::new(*category, format!("{category}/*.png")))
                .unwrap();
        }
        list
    }

    fn order(list: &ContentList) -> Vec<&str> {
        list.categories().collect()
    }

    #[test]
    fn test_push_rejects_duplicates() {
        let mut list = list(&["tex"]);
        assert!(matches!(
            list.push(ContentEntry::new("tex", "other.png")),
            Err(PipelineError::DuplicateCategory(_))
        ));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_move_round_trip() {
        let mut list = list(&["a", "b", "c"]);
        assert_eq!(list.move_entry(0, MoveDirection::Down), Some(1));
        assert_eq!(order(&list), ["b", "a", "c"]);
        assert_eq!(list.position("a"), Some(1));

        assert_eq!(list.move_entry(1, MoveDirection::Up), Some(0));
        assert_eq!(order(&list), ["a", "b", "c"]);
        assert_eq!(list.position("b"), Some(1));
    }

    #[test]
    fn test_move_at_edges() {
        let mut list = list(&["a", "b"]);
        assert_eq!(list.move_entry(0, MoveDirection::Up), None);
        assert_eq!(list.move_entry(1, MoveDirection::Down), None);
        assert_eq!(list.move_entry(7, MoveDirection::Down), None);
        assert_eq!(order(&list), ["a", "b"]);
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut list = list(&["a", "b", "c"]);
        list.rename("b", "sprites").unwrap();
        assert_eq!(order(&list), ["a", "sprites", "c"]);
        assert!(list.get("b").is_none());
        assert!(list.rename("a", "c").is_err());
    }

    #[test]
    fn test_remove_reindexes() {
        let mut list = list(&["a", "b", "c"]);
        list.remove("a").unwrap();
        assert_eq!(list.position("c"), Some(1));
    }

    #[test]
    fn test_entry_dialect() {
        let yaml = r#"
path: levels/*.tmx
recursive: "true"
action: build
processorParam:
  Scale: 2
  Premultiply: true
watch:
  - levels/tilesets/*.tsx
"#;
        let entry: ContentEntry = serde_yaml::from_str(yaml).unwrap();
        assert!(entry.recursive);
        assert_eq!(entry.dependencies, ["levels/tilesets/*.tsx"]);
        assert_eq!(entry.processor_params["Scale"], "2");
        assert_eq!(entry.processor_params["Premultiply"], "true");
    }
}
