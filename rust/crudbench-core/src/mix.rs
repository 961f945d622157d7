use crate::error::ConfigError;
use crate::workload::Mix;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of operations in one batch
pub const BATCH_SIZE: usize = 100;

/// One CRUD-Q operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OpKind {
    Create,
    Read,
    Update,
    Delete,
    Query,
}

impl OpKind {
    pub const ALL: [OpKind; 5] = [
        OpKind::Create,
        OpKind::Read,
        OpKind::Update,
        OpKind::Delete,
        OpKind::Query,
    ];

    /// Single-character shorthand used in error reports
    pub fn tag(self) -> char {
        match self {
            OpKind::Create => 'c',
            OpKind::Read => 'r',
            OpKind::Update => 'u',
            OpKind::Delete => 'd',
            OpKind::Query => 'q',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OpKind::Create => "Create",
            OpKind::Read => "Read",
            OpKind::Update => "Update",
            OpKind::Delete => "Delete",
            OpKind::Query => "Query",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The unshuffled tag sequence for a mix, checked once at startup.
#[derive(Debug, Clone)]
pub struct OperationMix {
    template: Vec<OpKind>,
}

impl OperationMix {
    pub fn new(mix: &Mix) -> Result<Self, ConfigError> {
        let total = mix.total();
        if total as usize != BATCH_SIZE {
            return Err(ConfigError::MixSum(total));
        }
        let template = OpKind::ALL
            .iter()
            .flat_map(|op| std::iter::repeat(*op).take(mix.percentage(*op) as usize))
            .collect();
        Ok(Self { template })
    }

    /// A freshly shuffled batch of `BATCH_SIZE` tags.
    pub fn prepare_batch<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<OpKind> {
        let mut batch = self.template.clone();
        batch.shuffle(rng);
        batch
    }
}
