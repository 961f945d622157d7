use super::{DefaultGenerator, KeyValueGenerator};
use crate::adapter::{Document, QueryParams};
use crate::keyspace::{HotSpot, KeySelector, KeySpace};
use rand::rngs::StdRng;

/// The default workload with skewed access: most reads, updates and queries
/// land on the newest slice of the key space.
#[derive(Debug, Clone)]
pub struct HotSpotGenerator {
    base: DefaultGenerator,
    selector: HotSpot,
}

impl HotSpotGenerator {
    pub fn new(base: DefaultGenerator, selector: HotSpot) -> Self {
        Self { base, selector }
    }
}

impl KeyValueGenerator for HotSpotGenerator {
    fn new_key(&self, id: u64) -> String {
        self.base.new_key(id)
    }

    fn existing_key(&self, keys: &KeySpace, rng: &mut StdRng) -> Option<String> {
        let live = keys.live()?;
        Some(self.base.new_key(self.selector.existing_id(live, rng)))
    }

    fn value(&self, key: &str, rng: &mut StdRng) -> Document {
        self.base.value(key, rng)
    }

    fn query(&self, keys: &KeySpace, rng: &mut StdRng) -> Option<QueryParams> {
        let key = self.existing_key(keys, rng)?;
        self.base.query_for(&key, rng)
    }
}
