//! Layered configuration
//!
//! A base document is loaded from disk and an optional profile overlay from
//! `<dir>/profiles/<profile>.<ext>` is deep-merged over it. The result is an
//! immutable [`Config`] that every task reads but none may write.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Supported on-disk formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
    Json,
}

impl Format {
    /// Detect the format of a path from its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yml" | "yaml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn parse(self, content: &str) -> std::result::Result<Value, String> {
        match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Effective configuration: a nested mapping with no fixed schema
///
/// Tasks interpret sub-trees by convention. All accessors take dotted paths
/// (`"apt.packages.present"`) and return `None` or an empty value when the
/// path is missing or holds a different type.
#[derive(Debug, Clone, PartialEq)]
pub struct Config(Value);

impl Default for Config {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl From<Value> for Config {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::default(),
            other => Self(other),
        }
    }
}

impl Config {
    /// The underlying document
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Look up a value by dotted path. An empty path is the root.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.0, |node, key| node.as_object()?.get(key))
    }

    /// Mapping at `path`
    pub fn section(&self, path: &str) -> Option<&Map<String, Value>> {
        self.get(path)?.as_object()
    }

    /// String at `path`
    pub fn str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    /// Scalar at `path` rendered as a string (`gpu_mem: 128` reads as `"128"`)
    pub fn scalar(&self, path: &str) -> Option<String> {
        self.get(path).and_then(scalar_to_string)
    }

    /// Sequence of scalars at `path`; non-scalar items are dropped
    pub fn str_list(&self, path: &str) -> Vec<String> {
        self.get(path)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(scalar_to_string).collect())
            .unwrap_or_default()
    }

    /// Boolean at `path`, or `default` when missing or not a boolean
    pub fn bool_or(&self, path: &str, default: bool) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Whether `path` holds something worth acting on.
    ///
    /// Missing, null, `false`, empty strings, empty sequences and empty
    /// mappings all count as "not requested".
    pub fn is_set(&self, path: &str) -> bool {
        self.get(path).is_some_and(is_truthy)
    }
}

/// Deep-merge `overlay` over `base`, returning a new value.
///
/// - mapping + mapping: merged key by key, recursively
/// - sequence + sequence: overlay items appended after base items (duplicates kept)
/// - anything else: overlay wins, including type mismatches
///
/// Keys present in only one side pass through unchanged. Neither input is
/// modified.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut out = base_map.clone();
            for (key, value) in overlay_map {
                let merged = match base_map.get(key) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        (Value::Array(base_items), Value::Array(overlay_items)) => Value::Array(
            base_items
                .iter()
                .chain(overlay_items.iter())
                .cloned()
                .collect(),
        ),
        _ => overlay.clone(),
    }
}

/// Path of the overlay file for `profile`, next to the base config
pub fn profile_path(base: &Path, profile: &str) -> PathBuf {
    let dir = base.parent().unwrap_or_else(|| Path::new("."));
    let ext = base.extension().and_then(|e| e.to_str()).unwrap_or("yml");
    dir.join("profiles").join(format!("{profile}.{ext}"))
}

/// Load the base config at `path` and merge the named profile over it.
///
/// A missing profile file is not an error; the base is used unmodified.
pub fn load(path: &Path, profile: &str) -> Result<Config> {
    let base = read_document(path)?;

    let overlay_path = profile_path(path, profile);
    if !overlay_path.is_file() {
        log::debug!(
            "No profile '{}' at {}, using base config",
            profile,
            overlay_path.display()
        );
        return Ok(Config(base));
    }

    log::debug!("Merging profile '{}' from {}", profile, overlay_path.display());
    let overlay = read_document(&overlay_path)?;
    Ok(Config(merge(&base, &overlay)))
}

fn read_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }

    let format = Format::from_path(path).ok_or_else(|| Error::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let content = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let value = format.parse(&content).map_err(|message| Error::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value),
        _ => Err(Error::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    }
}
