//! Tag data model.
//!
//! A tag is a named grouping of items or blocks. Providers declare tags into a
//! [`TagSet`]; each declared tag serializes to one JSON file:
//!
//! ```json
//! { "replace": false, "values": ["mymod:gear", "#forge:ingots", { "id": "other:x", "required": false }] }
//! ```

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::TagError;
use crate::location::ResourceLocation;

/// Registry a tag groups entries of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Items,
    Blocks,
}

impl TagKind {
    /// Display name of the stock provider for this registry.
    pub fn default_name(&self) -> &'static str {
        match self {
            TagKind::Items => "Item Tags",
            TagKind::Blocks => "Block Tags",
        }
    }

    /// Folder under `data/<namespace>/tags/`.
    pub fn folder(&self) -> &'static str {
        match self {
            TagKind::Items => "items",
            TagKind::Blocks => "blocks",
        }
    }
}

/// One value of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagEntry {
    /// A registry element, written as `ns:path`.
    Element(ResourceLocation),
    /// Another tag, written as `#ns:path`.
    Tag(ResourceLocation),
    /// An element that may be absent at load time.
    Optional(ResourceLocation),
}

impl TagEntry {
    /// Parses `ns:path`, `#ns:path`, or `?ns:path` (optional element).
    pub fn parse(input: &str) -> Result<Self, TagError> {
        let invalid = |source| TagError::InvalidEntry {
            entry: input.to_string(),
            source,
        };
        if let Some(rest) = input.strip_prefix('#') {
            ResourceLocation::parse(rest).map(TagEntry::Tag).map_err(invalid)
        } else if let Some(rest) = input.strip_prefix('?') {
            ResourceLocation::parse(rest)
                .map(TagEntry::Optional)
                .map_err(invalid)
        } else {
            ResourceLocation::parse(input)
                .map(TagEntry::Element)
                .map_err(invalid)
        }
    }
}

impl Serialize for TagEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TagEntry::Element(loc) => serializer.collect_str(loc),
            TagEntry::Tag(loc) => serializer.collect_str(&format_args!("#{}", loc)),
            TagEntry::Optional(loc) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("id", &loc.to_string())?;
                map.serialize_entry("required", &false)?;
                map.end()
            }
        }
    }
}

/// Contents of a single tag file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagBuilder {
    replace: bool,
    values: Vec<TagEntry>,
}

impl TagBuilder {
    /// Adds a registry element.
    pub fn add(&mut self, element: ResourceLocation) -> &mut Self {
        self.push(TagEntry::Element(element))
    }

    /// Adds a reference to another tag.
    pub fn add_tag(&mut self, tag: ResourceLocation) -> &mut Self {
        self.push(TagEntry::Tag(tag))
    }

    /// Adds an element that is allowed to be missing.
    pub fn add_optional(&mut self, element: ResourceLocation) -> &mut Self {
        self.push(TagEntry::Optional(element))
    }

    /// Parses and adds an entry (see [`TagEntry::parse`]).
    pub fn add_entry(&mut self, entry: &str) -> Result<&mut Self, TagError> {
        let entry = TagEntry::parse(entry)?;
        Ok(self.push(entry))
    }

    /// Whether this tag replaces lower-priority definitions instead of merging.
    pub fn replace(&mut self, replace: bool) -> &mut Self {
        self.replace = replace;
        self
    }

    pub fn values(&self) -> &[TagEntry] {
        &self.values
    }

    pub fn is_replace(&self) -> bool {
        self.replace
    }

    /// Serializes the tag file as pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn push(&mut self, entry: TagEntry) -> &mut Self {
        if !self.values.contains(&entry) {
            self.values.push(entry);
        }
        self
    }
}

/// All tags declared by one provider, ordered by identity.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    tags: BTreeMap<ResourceLocation, TagBuilder>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a new tag. Declaring the same tag twice is an error.
    pub fn declare(&mut self, id: ResourceLocation) -> Result<&mut TagBuilder, TagError> {
        use std::collections::btree_map::Entry;

        match self.tags.entry(id) {
            Entry::Occupied(entry) => Err(TagError::DuplicateTag(entry.key().clone())),
            Entry::Vacant(entry) => Ok(entry.insert(TagBuilder::default())),
        }
    }

    pub fn get(&self, id: &ResourceLocation) -> Option<&TagBuilder> {
        self.tags.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceLocation, &TagBuilder)> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
