use crate::error::ConfigError;
use crate::generators::entity::OVERHEAD;
use crate::mix::OpKind;
use crate::synth::MAX_INDEXABLE_FIELDS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Operation percentages; must add up to exactly 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mix {
    #[serde(default)]
    pub create: u32,
    #[serde(default)]
    pub read: u32,
    #[serde(default)]
    pub update: u32,
    #[serde(default)]
    pub delete: u32,
    #[serde(default)]
    pub query: u32,
}

impl Mix {
    pub fn percentage(&self, op: OpKind) -> u32 {
        match op {
            OpKind::Create => self.create,
            OpKind::Read => self.read,
            OpKind::Update => self.update,
            OpKind::Delete => self.delete,
            OpKind::Query => self.query,
        }
    }

    pub fn total(&self) -> u32 {
        OpKind::ALL.iter().map(|op| self.percentage(*op)).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    /// Hashed keys, uniform access, indexable filler documents
    #[default]
    Default,
    /// Default documents with skewed access to the newest records
    Hotspot,
    /// Person/location documents with a skewed size distribution
    Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotSpotConfig {
    /// Share of the live key space that is hot, in percent
    pub data_percentage: u64,
    /// Share of accesses that go to the hot set, in percent
    pub access_percentage: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub name: String,
    #[serde(default)]
    pub kind: WorkloadKind,
    pub mix: Mix,
    /// Records assumed to exist before the run (ids `1..=records`)
    #[serde(default)]
    pub records: u64,
    /// Total operation budget
    #[serde(default)]
    pub operations: Option<u64>,
    /// Wall-clock deadline, used instead of (or on top of) the budget
    #[serde(default, with = "humantime_serde")]
    pub run_time: Option<Duration>,
    pub value_size: usize,
    #[serde(default)]
    pub indexable_fields: usize,
    pub workers: usize,
    /// Aggregate target in operations per second; unlimited when absent
    #[serde(default)]
    pub throughput: Option<u64>,
    #[serde(default)]
    pub hot_spot: Option<HotSpotConfig>,
}

impl WorkloadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let total = self.mix.total();
        if total != 100 {
            return Err(ConfigError::MixSum(total));
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.operations.is_none() && self.run_time.is_none() {
            return Err(ConfigError::NoBudget);
        }
        if self.throughput == Some(0) {
            return Err(ConfigError::ZeroThroughput);
        }
        if let Some(hot) = &self.hot_spot {
            if hot.data_percentage > 100 {
                return Err(ConfigError::PercentageOutOfRange {
                    name: "hot_spot.data_percentage",
                    value: hot.data_percentage,
                });
            }
            if hot.access_percentage > 100 {
                return Err(ConfigError::PercentageOutOfRange {
                    name: "hot_spot.access_percentage",
                    value: hot.access_percentage,
                });
            }
        }
        match self.kind {
            WorkloadKind::Default | WorkloadKind::Hotspot => {
                if self.kind == WorkloadKind::Hotspot && self.hot_spot.is_none() {
                    return Err(ConfigError::MissingHotSpot);
                }
                if self.indexable_fields > MAX_INDEXABLE_FIELDS {
                    return Err(ConfigError::TooManyIndexableFields {
                        requested: self.indexable_fields,
                        max: MAX_INDEXABLE_FIELDS,
                    });
                }
                if self.mix.query > 0 && self.indexable_fields == 0 {
                    return Err(ConfigError::QueryWithoutIndexableFields);
                }
            }
            WorkloadKind::Entity => {
                if self.value_size < OVERHEAD {
                    return Err(ConfigError::ValueTooSmall {
                        min: OVERHEAD,
                        got: self.value_size,
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WorkloadFile;

impl WorkloadFile {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<WorkloadConfig> {
        let s = std::fs::read_to_string(path)?;
        let wl: WorkloadConfig = serde_yaml::from_str(&s)?;
        Ok(wl)
    }
}

#[cfg(test)]
pub(crate) fn test_config(mix: Mix) -> WorkloadConfig {
    WorkloadConfig {
        name: "test".to_string(),
        kind: WorkloadKind::Default,
        mix,
        records: 1,
        operations: Some(400),
        run_time: None,
        value_size: 256,
        indexable_fields: 5,
        workers: 1,
        throughput: None,
        hot_spot: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced() -> Mix {
        Mix {
            create: 25,
            read: 25,
            update: 25,
            delete: 25,
            query: 0,
        }
    }

    #[test]
    fn accepts_balanced_mix() {
        assert_eq!(test_config(balanced()).validate(), Ok(()));
    }

    #[test]
    fn rejects_mix_not_summing_to_100() {
        let mut mix = balanced();
        mix.delete = 20;
        assert_eq!(test_config(mix).validate(), Err(ConfigError::MixSum(95)));
    }

    #[test]
    fn rejects_too_many_indexable_fields() {
        let mut cfg = test_config(balanced());
        cfg.indexable_fields = MAX_INDEXABLE_FIELDS + 1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TooManyIndexableFields { .. })
        ));
    }

    #[test]
    fn rejects_queries_without_fields() {
        let mut cfg = test_config(Mix {
            read: 50,
            query: 50,
            ..Mix::default()
        });
        cfg.indexable_fields = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::QueryWithoutIndexableFields));
    }

    #[test]
    fn hotspot_needs_parameters() {
        let mut cfg = test_config(balanced());
        cfg.kind = WorkloadKind::Hotspot;
        assert_eq!(cfg.validate(), Err(ConfigError::MissingHotSpot));
    }

    #[test]
    fn entity_needs_minimal_size() {
        let mut cfg = test_config(balanced());
        cfg.kind = WorkloadKind::Entity;
        cfg.value_size = 100;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ValueTooSmall { min: OVERHEAD, got: 100 })
        );
    }

    #[test]
    fn needs_budget_or_deadline() {
        let mut cfg = test_config(balanced());
        cfg.operations = None;
        assert_eq!(cfg.validate(), Err(ConfigError::NoBudget));
        cfg.run_time = Some(Duration::from_secs(5));
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn parses_yaml() {
        let yaml = r#"
name: hot
kind: hotspot
mix: { create: 10, read: 80, update: 10 }
records: 1000
run_time: 30s
value_size: 512
indexable_fields: 4
workers: 8
throughput: 4000
hot_spot: { data_percentage: 5, access_percentage: 95 }
"#;
        let cfg: WorkloadConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.kind, WorkloadKind::Hotspot);
        assert_eq!(cfg.mix.delete, 0);
        assert_eq!(cfg.run_time, Some(Duration::from_secs(30)));
        assert_eq!(cfg.operations, None);
        assert_eq!(cfg.validate(), Ok(()));
    }
}
