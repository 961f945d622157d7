pub mod adapter;
pub mod batch;
pub mod error;
pub mod generators;
pub mod keyspace;
pub mod metrics;
pub mod mix;
pub mod ops;
pub mod pacing;
pub mod runner;
pub mod state;
pub mod synth;
pub mod workload;

pub use adapter::{AdapterFactory, Backend, ConnectionParams, Document, QueryParams};
pub use error::ConfigError;
pub use generators::KeyValueGenerator;
pub use metrics::{LatencyStats, Summary, ThroughputSample};
pub use mix::{OpKind, OperationMix};
pub use runner::{run_workload, Run, RunContext, RunOptions};
pub use state::{RunSnapshot, RunState};
pub use workload::{HotSpotConfig, Mix, WorkloadConfig, WorkloadFile, WorkloadKind};
