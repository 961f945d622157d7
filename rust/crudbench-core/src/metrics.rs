use crate::mix::OpKind;
use chrono::{DateTime, Utc};
use hdrhistogram::Histogram;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Percentile `p` (0.0..=1.0) of `sorted`, interpolating linearly between
/// neighbouring order statistics. `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = p.clamp(0.0, 1.0) * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn mean(samples: &[f64]) -> Option<f64> {
    (!samples.is_empty()).then(|| samples.iter().sum::<f64>() / samples.len() as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    pub count: usize,
    pub p80_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub mean_ms: f64,
}

impl LatencyStats {
    /// `None` when there are no samples.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let mut ms: Vec<f64> = samples.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        ms.sort_by(|a, b| a.total_cmp(b));
        Some(Self {
            count: ms.len(),
            p80_ms: percentile(&ms, 0.80)?,
            p90_ms: percentile(&ms, 0.90)?,
            p95_ms: percentile(&ms, 0.95)?,
            p99_ms: percentile(&ms, 0.99)?,
            mean_ms: mean(&ms)?,
        })
    }
}

/// Batch execution times of one worker; merged across workers at the end.
pub struct BatchRecorder {
    pub hist: Histogram<u64>,
}

impl BatchRecorder {
    pub fn new() -> Self {
        Self {
            // 3 significant figures
            hist: Histogram::new(3).expect("hist"),
        }
    }

    pub fn record(&mut self, dur: Duration) {
        let us = dur.as_micros() as u64;
        let _ = self.hist.record(us.max(1));
    }

    pub fn merge(&mut self, other: &BatchRecorder) {
        let _ = self.hist.add(&other.hist);
    }

    pub fn to_stats(&self) -> BatchStats {
        BatchStats {
            batches: self.hist.len(),
            p50_ms: self.hist.value_at_quantile(0.50) as f64 / 1000.0,
            p95_ms: self.hist.value_at_quantile(0.95) as f64 / 1000.0,
            p99_ms: self.hist.value_at_quantile(0.99) as f64 / 1000.0,
            max_ms: self.hist.max() as f64 / 1000.0,
        }
    }
}

impl Default for BatchRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchStats {
    pub batches: u64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

/// One line of the periodic throughput report
#[derive(Debug, Clone, Serialize)]
pub struct ThroughputSample {
    pub elapsed_s: f64,
    pub ops_per_sec: f64,
    pub total_operations: u64,
    pub total_errors: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub workload: String,
    pub adapter: String,
    pub workers: usize,
    pub operations: u64,
    pub records: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    pub duration_s: f64,
    pub throughput_ops: f64,
    pub latency: BTreeMap<OpKind, LatencyStats>,
    pub errors: BTreeMap<String, u64>,
    pub batches: BatchStats,
    pub timeline: Vec<ThroughputSample>,
}

impl Summary {
    pub fn print(&self) {
        for (op, stats) in &self.latency {
            println!("{op} latency:");
            println!("\t80th percentile: {:.3} ms", stats.p80_ms);
            println!("\t90th percentile: {:.3} ms", stats.p90_ms);
            println!("\t95th percentile: {:.3} ms", stats.p95_ms);
            println!("\t99th percentile: {:.3} ms", stats.p99_ms);
            println!("\tMean: {:.3} ms", stats.mean_ms);
        }
        if self.errors.values().any(|n| *n > 0) {
            println!("Errors:");
            for op in OpKind::ALL {
                let count = self.errors.get(&op.tag().to_string()).copied().unwrap_or(0);
                println!("\t{:<7}: {}", op.name(), count);
            }
            println!(
                "\t{:<7}: {}",
                "Total",
                self.errors.get(crate::state::TOTAL).copied().unwrap_or(0)
            );
        }
        println!(
            "Batches: {} (p50 {:.3} ms, p95 {:.3} ms, p99 {:.3} ms)",
            self.batches.batches, self.batches.p50_ms, self.batches.p95_ms, self.batches.p99_ms
        );
        println!(
            "Operations: {} ({} skipped), {:.0} ops/sec",
            self.operations, self.skipped, self.throughput_ops
        );
        println!("Time elapsed:\n\t{:.3}s", self.duration_s);
    }
}
