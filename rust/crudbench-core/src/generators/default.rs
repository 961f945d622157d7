use super::KeyValueGenerator;
use crate::adapter::{Document, QueryParams};
use crate::error::ConfigError;
use crate::keyspace::{KeySelector, KeySpace, Uniform};
use crate::synth::{self, MAX_INDEXABLE_FIELDS};
use rand::rngs::StdRng;
use rand::Rng;

/// Hashed keys drawn uniformly from the live range, documents made of
/// indexable key windows plus a digest-padded body.
#[derive(Debug, Clone)]
pub struct DefaultGenerator {
    indexable_fields: usize,
    value_size: usize,
}

impl DefaultGenerator {
    pub fn new(indexable_fields: usize, value_size: usize) -> Result<Self, ConfigError> {
        if indexable_fields > MAX_INDEXABLE_FIELDS {
            return Err(ConfigError::TooManyIndexableFields {
                requested: indexable_fields,
                max: MAX_INDEXABLE_FIELDS,
            });
        }
        Ok(Self {
            indexable_fields,
            value_size,
        })
    }

    /// Query on a random indexable field of the record `key`.
    pub(crate) fn query_for(&self, key: &str, rng: &mut StdRng) -> Option<QueryParams> {
        if self.indexable_fields == 0 {
            return None;
        }
        let i = rng.gen_range(0..self.indexable_fields);
        Some(QueryParams {
            field: synth::field_name(i),
            value: synth::field_value(key, i),
            limit: rng.gen_range(10..20),
        })
    }
}

impl KeyValueGenerator for DefaultGenerator {
    fn new_key(&self, id: u64) -> String {
        synth::hashed_key(id)
    }

    fn existing_key(&self, keys: &KeySpace, rng: &mut StdRng) -> Option<String> {
        let live = keys.live()?;
        Some(self.new_key(Uniform.existing_id(live, rng)))
    }

    fn value(&self, key: &str, _rng: &mut StdRng) -> Document {
        // field count is checked in `new` and hashed keys are always
        // DIGEST_LEN long
        synth::indexable_document(key, self.indexable_fields, self.value_size).unwrap_or_default()
    }

    fn query(&self, keys: &KeySpace, rng: &mut StdRng) -> Option<QueryParams> {
        let key = self.existing_key(keys, rng)?;
        self.query_for(&key, rng)
    }
}
