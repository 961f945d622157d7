use anyhow::{bail, Result};
use async_trait::async_trait;
use crudbench_core::adapter::{Backend, ConnectionParams, Document, QueryParams};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{info, trace};

/// In-process document store with strict key semantics: creating a present
/// key and touching an absent one both fail.
#[derive(Default)]
pub struct MemoryBackend {
    docs: RwLock<HashMap<String, Document>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn get(&self, key: &str) -> Option<Document> {
        self.docs.read().await.get(key).cloned()
    }
}

/// Resolve a dotted path such as `city.f.f` inside a document.
fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn create(&self, key: &str, value: &Document) -> Result<()> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(key) {
            bail!("duplicate key {key}");
        }
        docs.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<()> {
        match self.docs.read().await.get(key) {
            Some(_) => Ok(()),
            None => bail!("key {key} not found"),
        }
    }

    async fn update(&self, key: &str, value: &Document) -> Result<()> {
        match self.docs.write().await.get_mut(key) {
            Some(doc) => {
                *doc = value.clone();
                Ok(())
            }
            None => bail!("key {key} not found"),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self.docs.write().await.remove(key) {
            Some(_) => Ok(()),
            None => bail!("key {key} not found"),
        }
    }

    async fn query(&self, params: &QueryParams) -> Result<()> {
        let docs = self.docs.read().await;
        let matches = docs
            .values()
            .filter(|doc| lookup(doc, &params.field).and_then(Value::as_str) == Some(params.value.as_str()))
            .take(params.limit)
            .count();
        trace!(field = %params.field, matches, "query");
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        let documents = self.len().await;
        info!(documents, "memory store closed");
        Ok(())
    }
}

pub struct MemoryFactory;

impl crudbench_core::AdapterFactory for MemoryFactory {
    fn name(&self) -> &'static str {
        "memory"
    }
    fn create(&self, _params: &ConnectionParams) -> Result<Box<dyn Backend>> {
        Ok(Box::new(MemoryBackend::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_follows_dotted_paths() {
        let doc = match json!({ "city": { "f": { "f": "90ac48" } }, "field0": "x" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(lookup(&doc, "city.f.f"), Some(&json!("90ac48")));
        assert_eq!(lookup(&doc, "field0"), Some(&json!("x")));
        assert_eq!(lookup(&doc, "city.g"), None);
        assert_eq!(lookup(&doc, "field0.f"), None);
    }
}
