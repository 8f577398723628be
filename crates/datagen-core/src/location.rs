//! Namespaced resource identities.
//!
//! A [`ResourceLocation`] names a logical resource as `namespace:path`. It is
//! the identity of a generated texture and of a tag, and it determines where
//! the corresponding file lives on disk.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LocationError;

/// Namespace used when a location is written without one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

const NAMESPACE_PATTERN: &str = r"^[a-z0-9_.-]+$";
const PATH_PATTERN: &str = r"^[a-z0-9_./-]+$";

static NAMESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
static PATH_REGEX: OnceLock<Regex> = OnceLock::new();

fn namespace_regex() -> &'static Regex {
    NAMESPACE_REGEX.get_or_init(|| Regex::new(NAMESPACE_PATTERN).expect("invalid regex pattern"))
}

fn path_regex() -> &'static Regex {
    PATH_REGEX.get_or_init(|| Regex::new(PATH_PATTERN).expect("invalid regex pattern"))
}

/// A `(namespace, path)` pair identifying a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocation {
    namespace: String,
    path: String,
}

impl ResourceLocation {
    /// Creates a location from its parts, validating both.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, LocationError> {
        let namespace = namespace.into();
        let path = path.into();

        if !namespace_regex().is_match(&namespace) {
            return Err(LocationError::InvalidNamespace {
                input: format!("{}:{}", namespace, path),
                namespace,
                pattern: NAMESPACE_PATTERN,
            });
        }
        if !path_regex().is_match(&path) {
            return Err(LocationError::InvalidPath {
                input: format!("{}:{}", namespace, path),
                path,
                pattern: PATH_PATTERN,
            });
        }

        if path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return Err(LocationError::InvalidSegment {
                input: format!("{}:{}", namespace, path),
                path,
            });
        }

        Ok(Self { namespace, path })
    }

    /// Parses `namespace:path`, or a bare `path` in the default namespace.
    ///
    /// # Example
    /// ```
    /// use datagen_core::ResourceLocation;
    ///
    /// let loc = ResourceLocation::parse("examplemod:item/ingot").unwrap();
    /// assert_eq!(loc.namespace(), "examplemod");
    /// assert_eq!(loc.path(), "item/ingot");
    ///
    /// let vanilla = ResourceLocation::parse("stone").unwrap();
    /// assert_eq!(vanilla.namespace(), "minecraft");
    /// ```
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        match input.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, input),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a location in the same namespace with `prefix` and `suffix`
    /// wrapped around the path.
    pub fn with_affixes(&self, prefix: &str, suffix: &str) -> Result<Self, LocationError> {
        Self::new(
            self.namespace.clone(),
            format!("{}{}{}", prefix, self.path, suffix),
        )
    }

    /// The resource this texture is read from: `namespace:textures/<path>.png`.
    pub fn texture_resource(&self) -> Result<Self, LocationError> {
        self.with_affixes("textures/", ".png")
    }

    /// Output path of a generated texture, relative to the output root.
    ///
    /// Always `/`-separated: `assets/<namespace>/textures/<path>.png`.
    pub fn texture_output_path(&self) -> String {
        format!("assets/{}/textures/{}.png", self.namespace, self.path)
    }

    /// Output path of a tag file, relative to the output root.
    pub fn tag_output_path(&self, folder: &str) -> String {
        format!("data/{}/tags/{}/{}.json", self.namespace, folder, self.path)
    }

    /// Path of this resource inside a resource root (`assets/<namespace>/<path>`).
    pub fn asset_path(&self) -> String {
        format!("assets/{}/{}", self.namespace, self.path)
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ResourceLocation {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
