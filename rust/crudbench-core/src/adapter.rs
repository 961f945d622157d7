use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A generated document: field name to JSON value.
pub type Document = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub uri: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

/// Secondary-index equality lookup: documents whose `field` equals `value`,
/// at most `limit` of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub field: String,
    pub value: String,
    pub limit: usize,
}

/// The data store under test.
///
/// Any `Err` counts as a failed operation of that type; the engine never
/// looks inside it and never retries.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn create(&self, key: &str, value: &Document) -> anyhow::Result<()>;

    async fn read(&self, key: &str) -> anyhow::Result<()>;

    async fn update(&self, key: &str, value: &Document) -> anyhow::Result<()>;

    async fn delete(&self, key: &str) -> anyhow::Result<()>;

    async fn query(&self, params: &QueryParams) -> anyhow::Result<()>;

    /// Close connections once every worker and periodic task has stopped.
    async fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Creates connected backend instances by name
pub trait AdapterFactory: Send + Sync {
    fn name(&self) -> &'static str;

    /// Default connection URI when none is given on the command line
    fn default_uri(&self) -> &'static str {
        ""
    }

    fn create(&self, params: &ConnectionParams) -> anyhow::Result<Box<dyn Backend>>;
}
