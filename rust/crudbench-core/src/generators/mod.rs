pub mod default;
pub mod entity;
pub mod hotspot;

pub use default::DefaultGenerator;
pub use entity::EntityGenerator;
pub use hotspot::HotSpotGenerator;

use crate::adapter::{Document, QueryParams};
use crate::error::ConfigError;
use crate::keyspace::KeySpace;
use crate::workload::{WorkloadConfig, WorkloadKind};
use rand::rngs::StdRng;
use std::sync::Arc;

/// Key and document synthesis for one workload variant.
///
/// Implementations hold no mutable state: the shared [`KeySpace`] is passed
/// in, so one generator can serve every worker.
pub trait KeyValueGenerator: Send + Sync {
    /// Key for record `id`; the same id always gives the same key.
    fn new_key(&self, id: u64) -> String;

    /// Key of a randomly chosen live record, `None` if nothing is live.
    fn existing_key(&self, keys: &KeySpace, rng: &mut StdRng) -> Option<String>;

    /// Key of the oldest live record, advancing the deletion boundary past it.
    fn key_for_removal(&self, keys: &KeySpace) -> Option<String> {
        keys.next_removal().map(|id| self.new_key(id))
    }

    fn value(&self, key: &str, rng: &mut StdRng) -> Document;

    /// Predicate matching a live record, `None` if nothing is live.
    fn query(&self, keys: &KeySpace, rng: &mut StdRng) -> Option<QueryParams>;
}

/// Build the generator for `config.kind`.
pub fn from_config(config: &WorkloadConfig) -> Result<Arc<dyn KeyValueGenerator>, ConfigError> {
    let generator: Arc<dyn KeyValueGenerator> = match config.kind {
        WorkloadKind::Default => Arc::new(DefaultGenerator::new(
            config.indexable_fields,
            config.value_size,
        )?),
        WorkloadKind::Hotspot => {
            let hot = config.hot_spot.ok_or(ConfigError::MissingHotSpot)?;
            Arc::new(HotSpotGenerator::new(
                DefaultGenerator::new(config.indexable_fields, config.value_size)?,
                hot.into(),
            ))
        }
        WorkloadKind::Entity => Arc::new(EntityGenerator::new(
            config.value_size,
            config.hot_spot.map(Into::into),
        )?),
    };
    Ok(generator)
}
