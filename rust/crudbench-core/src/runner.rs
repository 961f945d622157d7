use crate::adapter::Backend;
use crate::batch::execute_batch;
use crate::error::ConfigError;
use crate::generators::{self, KeyValueGenerator};
use crate::metrics::{BatchRecorder, LatencyStats, Summary, ThroughputSample};
use crate::mix::{OpKind, OperationMix};
use crate::ops::PreparedOp;
use crate::pacing::Pacer;
use crate::state::{RunState, FINISHED, STARTED};
use crate::workload::{Mix, WorkloadConfig};
use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Offset between worker seeds and the latency sampler's seed
const SAMPLER_SEED_OFFSET: u64 = 0x5eed;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub adapter_name: String,
    pub seed: u64,
    /// How often the throughput line is printed
    pub report_interval: Duration,
    /// How often the latency sampler runs one of each operation;
    /// `None` disables it
    pub sample_interval: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            adapter_name: String::new(),
            seed: 42,
            report_interval: Duration::from_secs(10),
            sample_interval: Some(Duration::from_secs(1)),
        }
    }
}

/// Everything a worker or periodic task needs, built once per run.
#[derive(Clone)]
pub struct RunContext {
    pub backend: Arc<dyn Backend>,
    pub generator: Arc<dyn KeyValueGenerator>,
    pub state: Arc<RunState>,
    /// Total operations allowed; `None` when only a deadline bounds the run
    pub budget: Option<u64>,
}

/// A validated, ready-to-start run.
pub struct Run {
    ctx: RunContext,
    mix: OperationMix,
    config: WorkloadConfig,
    opts: RunOptions,
}

impl Run {
    pub fn new(
        backend: Arc<dyn Backend>,
        config: WorkloadConfig,
        opts: RunOptions,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mix = OperationMix::new(&config.mix)?;
        let generator = generators::from_config(&config)?;
        let state = Arc::new(RunState::new(config.records));
        Ok(Self {
            ctx: RunContext {
                backend,
                generator,
                state,
                budget: config.operations,
            },
            mix,
            config,
            opts,
        })
    }

    /// Live view of the run, usable while `execute` is in progress.
    pub fn state(&self) -> Arc<RunState> {
        self.ctx.state.clone()
    }

    pub async fn execute(self) -> Result<Summary> {
        let Run {
            ctx,
            mix,
            config,
            opts,
        } = self;
        let pacer = Pacer::new(config.throughput, config.workers);
        info!(
            workload = %config.name,
            adapter = %opts.adapter_name,
            workers = config.workers,
            budget = ?ctx.budget,
            run_time = ?config.run_time,
            batch_target = ?pacer.target(),
            "starting run"
        );

        ctx.state.mark(STARTED).await;
        let (done_tx, done_rx) = watch::channel(false);

        let reporter = tokio::spawn(report_throughput(
            ctx.state.clone(),
            opts.report_interval,
            done_rx.clone(),
        ));
        let sampler = opts.sample_interval.map(|interval| {
            tokio::spawn(sample_latency(
                ctx.clone(),
                sampled_ops(&config.mix),
                interval,
                opts.seed.wrapping_add(SAMPLER_SEED_OFFSET),
                done_rx.clone(),
            ))
        });
        let deadline = config.run_time.map(|run_time| {
            tokio::spawn(enforce_deadline(
                ctx.state.clone(),
                ctx.budget,
                run_time,
                done_rx.clone(),
            ))
        });

        let mut set = JoinSet::new();
        for i in 0..config.workers {
            set.spawn(run_worker(
                ctx.clone(),
                mix.clone(),
                pacer,
                opts.seed.wrapping_add(i as u64),
            ));
        }

        let mut batches = BatchRecorder::new();
        while let Some(res) = set.join_next().await {
            batches.merge(&res?);
        }
        ctx.state.mark(FINISHED).await;
        info!(operations = ctx.state.operations(), "workers finished");

        // Periodic tasks observe the end of the run, then the store closes.
        let _ = done_tx.send(true);
        let timeline = reporter.await?;
        if let Some(sampler) = sampler {
            sampler.await?;
        }
        if let Some(deadline) = deadline {
            deadline.await?;
        }
        ctx.backend.shutdown().await?;

        let events = ctx.state.events().await;
        let started = events.get(STARTED).copied();
        let finished = events.get(FINISHED).copied();
        let duration_s = match (started, finished) {
            (Some(s), Some(f)) => (f - s).to_std().unwrap_or_default().as_secs_f64(),
            _ => 0.0,
        };

        let latency = ctx
            .state
            .latency_samples()
            .await
            .into_iter()
            .filter_map(|(op, samples)| LatencyStats::from_samples(&samples).map(|s| (op, s)))
            .collect();

        let snapshot = ctx.state.snapshot();
        Ok(Summary {
            workload: config.name,
            adapter: opts.adapter_name,
            workers: config.workers,
            operations: snapshot.operations,
            records: snapshot.records,
            deleted: snapshot.deleted,
            skipped: snapshot.skipped,
            started,
            finished,
            duration_s,
            throughput_ops: snapshot.operations as f64 / duration_s.max(0.001),
            latency,
            errors: snapshot.errors,
            batches: batches.to_stats(),
            timeline,
        })
    }
}

pub async fn run_workload(
    backend: Arc<dyn Backend>,
    config: WorkloadConfig,
    opts: RunOptions,
) -> Result<Summary> {
    Run::new(backend, config, opts)?.execute().await
}

/// Operation types the latency sampler exercises: those present in the mix.
fn sampled_ops(mix: &Mix) -> Vec<OpKind> {
    OpKind::ALL
        .into_iter()
        .filter(|op| mix.percentage(*op) > 0)
        .collect()
}

/// Batches back to back until the budget is gone or shutdown is requested,
/// both checked only between batches. A pacing sleep ends early on shutdown.
async fn run_worker(ctx: RunContext, mix: OperationMix, pacer: Pacer, seed: u64) -> BatchRecorder {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rec = BatchRecorder::new();
    while ctx.state.should_continue(ctx.budget) {
        let batch = mix.prepare_batch(&mut rng);
        let t0 = Instant::now();
        let outcome = execute_batch(&ctx, &batch, &mut rng).await;
        let dt = t0.elapsed();
        rec.record(dt);
        debug!(?outcome, elapsed = ?dt, "batch done");

        match pacer.remaining(dt) {
            Some(rest) => tokio::select! {
                _ = tokio::time::sleep(rest) => {}
                _ = ctx.state.shutdown_requested() => {}
            },
            None => tokio::task::yield_now().await,
        }
    }
    rec
}

async fn report_throughput(
    state: Arc<RunState>,
    interval: Duration,
    mut done: watch::Receiver<bool>,
) -> Vec<ThroughputSample> {
    println!("Benchmark started:");
    let interval = interval.max(MIN_INTERVAL);
    let start = Instant::now();
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut previous = 0;
    let mut timeline = Vec::new();
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = done.changed() => break,
        }
        let total = state.operations();
        let sample = ThroughputSample {
            elapsed_s: start.elapsed().as_secs_f64(),
            ops_per_sec: (total - previous) as f64 / interval.as_secs_f64(),
            total_operations: total,
            total_errors: state.total_errors(),
        };
        previous = total;
        println!(
            "{:>6.0} seconds: {:>10.0} ops/sec; total operations: {}; total errors: {}",
            sample.elapsed_s, sample.ops_per_sec, sample.total_operations, sample.total_errors
        );
        timeline.push(sample);
    }
    timeline
}

/// One operation of each configured type per tick, timed individually and
/// outside of any batch.
async fn sample_latency(
    ctx: RunContext,
    ops: Vec<OpKind>,
    interval: Duration,
    seed: u64,
    mut done: watch::Receiver<bool>,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = done.changed() => break,
        }
        for &op in &ops {
            if !ctx.state.claim(ctx.budget) {
                return;
            }
            let Some(prepared) = PreparedOp::prepare(op, ctx.generator.as_ref(), &ctx.state, &mut rng) else {
                ctx.state.record_skip();
                continue;
            };
            let t0 = Instant::now();
            let res = prepared.issue(ctx.backend.as_ref()).await;
            let dt = t0.elapsed();
            if let Err(err) = res {
                debug!(%op, error = %err, "sampled operation failed");
                ctx.state.record_error(op);
            }
            ctx.state.record_latency(op, dt).await;
        }
    }
}

async fn enforce_deadline(
    state: Arc<RunState>,
    budget: Option<u64>,
    run_time: Duration,
    mut done: watch::Receiver<bool>,
) {
    tokio::select! {
        _ = tokio::time::sleep(run_time) => {
            if budget.is_some() && state.has_budget(budget) {
                warn!(operations = state.operations(), "run time elapsed before the operation budget was used up");
            } else {
                info!(?run_time, "run time elapsed, stopping workers");
            }
            state.request_shutdown();
        }
        _ = done.changed() => {}
    }
}
