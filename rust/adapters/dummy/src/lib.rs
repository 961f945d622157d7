use anyhow::Result;
use async_trait::async_trait;
use crudbench_core::adapter::{Backend, ConnectionParams, Document, QueryParams};
use std::time::Duration;

/// Accepts every operation after a simulated round trip; measures the
/// harness itself.
pub struct DummyBackend {
    latency: Duration,
}

impl DummyBackend {
    pub fn new(params: &ConnectionParams) -> Result<Self> {
        let latency = match params.options.get("latency_us") {
            Some(v) => Duration::from_micros(v.parse()?),
            None => Duration::from_micros(10),
        };
        Ok(Self { latency })
    }

    async fn round_trip(&self) -> Result<()> {
        tokio::time::sleep(self.latency).await;
        Ok(())
    }
}

#[async_trait]
impl Backend for DummyBackend {
    async fn create(&self, _key: &str, _value: &Document) -> Result<()> {
        self.round_trip().await
    }
    async fn read(&self, _key: &str) -> Result<()> {
        self.round_trip().await
    }
    async fn update(&self, _key: &str, _value: &Document) -> Result<()> {
        self.round_trip().await
    }
    async fn delete(&self, _key: &str) -> Result<()> {
        self.round_trip().await
    }
    async fn query(&self, _params: &QueryParams) -> Result<()> {
        self.round_trip().await
    }
}

pub struct DummyFactory;

impl crudbench_core::AdapterFactory for DummyFactory {
    fn name(&self) -> &'static str {
        "dummy"
    }
    fn create(&self, params: &ConnectionParams) -> Result<Box<dyn Backend>> {
        Ok(Box::new(DummyBackend::new(params)?))
    }
}
