//! Durable key-path settings.
//!
//! The core needs only get/set semantics over dotted key paths (for the
//! active mode, thresholds, device choices); the storage mechanism behind
//! them is an implementation detail. [`JsonFileStore`] persists to a JSON
//! file on every write; [`MemoryStore`] backs tests.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::ConfigError;

/// Key-path get/set over JSON values.
pub trait SettingsStore: Send + Sync {
    /// Read the value at a dotted path, e.g. `"audio.input_device"`.
    fn get(&self, path: &str) -> Option<Value>;

    /// Write the value at a dotted path, creating intermediate objects.
    fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError>;
}

fn split_path(path: &str) -> Result<Vec<&str>, ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::InvalidKeyPath(path.to_string()));
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::InvalidKeyPath(path.to_string()));
    }
    Ok(segments)
}

fn get_at<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = root;
    for segment in split_path(path).ok()? {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

fn set_at(root: &mut Value, path: &str, value: Value) -> Result<(), ConfigError> {
    let segments = split_path(path)?;
    let mut node = root;
    for segment in &segments[..segments.len() - 1] {
        let map = node
            .as_object_mut()
            .ok_or_else(|| ConfigError::InvalidKeyPath(path.to_string()))?;
        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !node.is_object() {
            // A scalar in the middle of the path is replaced by an object.
            *node = Value::Object(Map::new());
        }
    }
    let map = node
        .as_object_mut()
        .ok_or_else(|| ConfigError::InvalidKeyPath(path.to_string()))?;
    map.insert(segments[segments.len() - 1].to_string(), value);
    Ok(())
}

/// In-memory settings, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: Value,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, path: &str) -> Option<Value> {
        get_at(&self.root, path).cloned()
    }

    fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        set_at(&mut self.root, path, value)
    }
}

/// Settings persisted to a JSON file; every `set` writes through.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    root: Value,
}

impl JsonFileStore {
    /// Open (or initialize) the store at `path`. A missing file starts
    /// empty; a present but unparsable file is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let root = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|err| ConfigError::Parse {
                    path: path.clone(),
                    message: err.to_string(),
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Value::Object(Map::new()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Ok(Self { path, root })
    }

    fn persist(&self) -> Result<(), ConfigError> {
        let contents =
            serde_json::to_string_pretty(&self.root).map_err(|err| ConfigError::Parse {
                path: self.path.clone(),
                message: err.to_string(),
            })?;
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, path: &str) -> Option<Value> {
        get_at(&self.root, path).cloned()
    }

    fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        set_at(&mut self.root, path, value)?;
        self.persist()?;
        debug!(key = %path, "setting persisted");
        Ok(())
    }
}
