// src/params.rs
//
// Key-value parameter stores. The real backends (on-disk params and the
// shared-memory fast store) live outside this crate; the scene only needs
// the read/put surface below.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, RwLock};
use tracing::debug;

pub trait ParamStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str);

    /// "1" is true, anything else (or missing) is false
    fn get_bool(&self, key: &str) -> bool {
        self.get(key).map(|v| v.trim() == "1").unwrap_or(false)
    }

    /// Missing or unparsable values read as 0
    fn get_int(&self, key: &str) -> i32 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    fn put_bool(&self, key: &str, value: bool) {
        self.put(key, if value { "1" } else { "0" });
    }
}

/// In-memory store. Clones share the same map, so a writer handle held by a
/// test or settings panel is seen by the reader inside the aggregator.
#[derive(Debug, Clone, Default)]
pub struct MemoryParams {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a flat YAML map. Booleans become "1"/"0".
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading params seed {}", path))?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let map: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(contents)?;
        let params = Self::new();
        for (key, value) in map {
            let text = match value {
                serde_yaml::Value::Bool(b) => (if b { "1" } else { "0" }).to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Null => continue,
                other => anyhow::bail!("param {} has unsupported value {:?}", key, other),
            };
            params.put(&key, &text);
        }
        debug!("Seeded {} params", params.len());
        Ok(params)
    }

    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ParamStore for MemoryParams {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value.to_string());
        }
    }
}
