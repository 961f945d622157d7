use crate::adapter::{Backend, Document, QueryParams};
use crate::generators::KeyValueGenerator;
use crate::mix::OpKind;
use crate::state::RunState;
use rand::rngs::StdRng;

/// A fully synthesized operation, ready to send.
#[derive(Debug, Clone)]
pub enum PreparedOp {
    Create { key: String, value: Document },
    Read { key: String },
    Update { key: String, value: Document },
    Delete { key: String },
    Query(QueryParams),
}

impl PreparedOp {
    /// Derive keys and values for `op`, touching the shared key space.
    ///
    /// A create always advances the record counter, before the backend has
    /// seen anything; a failed create is not rolled back. Returns `None`
    /// when `op` needs a live record and there is none.
    pub fn prepare(
        op: OpKind,
        generator: &dyn KeyValueGenerator,
        state: &RunState,
        rng: &mut StdRng,
    ) -> Option<Self> {
        let keys = state.keys();
        match op {
            OpKind::Create => {
                let key = generator.new_key(keys.next_record());
                let value = generator.value(&key, rng);
                Some(Self::Create { key, value })
            }
            OpKind::Read => generator
                .existing_key(keys, rng)
                .map(|key| Self::Read { key }),
            OpKind::Update => generator.existing_key(keys, rng).map(|key| {
                let value = generator.value(&key, rng);
                Self::Update { key, value }
            }),
            OpKind::Delete => generator
                .key_for_removal(keys)
                .map(|key| Self::Delete { key }),
            OpKind::Query => generator.query(keys, rng).map(Self::Query),
        }
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Self::Create { .. } => OpKind::Create,
            Self::Read { .. } => OpKind::Read,
            Self::Update { .. } => OpKind::Update,
            Self::Delete { .. } => OpKind::Delete,
            Self::Query(_) => OpKind::Query,
        }
    }

    pub async fn issue(&self, backend: &dyn Backend) -> anyhow::Result<()> {
        match self {
            Self::Create { key, value } => backend.create(key, value).await,
            Self::Read { key } => backend.read(key).await,
            Self::Update { key, value } => backend.update(key, value).await,
            Self::Delete { key } => backend.delete(key).await,
            Self::Query(params) => backend.query(params).await,
        }
    }
}
