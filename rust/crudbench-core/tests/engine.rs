use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crudbench_core::adapter::{Backend, Document, QueryParams};
use crudbench_core::batch::execute_batch;
use crudbench_core::generators::DefaultGenerator;
use crudbench_core::state::TOTAL;
use crudbench_core::{
    run_workload, Mix, OpKind, OperationMix, Run, RunContext, RunOptions, RunState,
    WorkloadConfig, WorkloadKind,
};
use rand::{rngs::StdRng, SeedableRng};

/// Accepts everything and counts calls
#[derive(Default)]
struct StubBackend {
    calls: AtomicU64,
    fail_reads: bool,
}

impl StubBackend {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn create(&self, _key: &str, _value: &Document) -> anyhow::Result<()> {
        self.hit();
        Ok(())
    }
    async fn read(&self, _key: &str) -> anyhow::Result<()> {
        self.hit();
        if self.fail_reads {
            anyhow::bail!("read refused");
        }
        Ok(())
    }
    async fn update(&self, _key: &str, _value: &Document) -> anyhow::Result<()> {
        self.hit();
        Ok(())
    }
    async fn delete(&self, _key: &str) -> anyhow::Result<()> {
        self.hit();
        Ok(())
    }
    async fn query(&self, _params: &QueryParams) -> anyhow::Result<()> {
        self.hit();
        Ok(())
    }
}

fn balanced() -> Mix {
    Mix {
        create: 25,
        read: 25,
        update: 25,
        delete: 25,
        query: 0,
    }
}

fn config(records: u64, operations: u64, workers: usize) -> WorkloadConfig {
    WorkloadConfig {
        name: "test".to_string(),
        kind: WorkloadKind::Default,
        mix: balanced(),
        records,
        operations: Some(operations),
        run_time: None,
        value_size: 256,
        indexable_fields: 3,
        workers,
        throughput: None,
        hot_spot: None,
    }
}

fn quiet_options() -> RunOptions {
    RunOptions {
        adapter_name: "stub".to_string(),
        seed: 42,
        report_interval: Duration::from_millis(50),
        sample_interval: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn balanced_run_without_errors() {
    let backend = Arc::new(StubBackend::default());
    let summary = run_workload(backend.clone(), config(1, 400, 1), quiet_options())
        .await
        .expect("run");

    assert_eq!(summary.operations, 400);
    assert_eq!(summary.errors[TOTAL], 0);
    assert_eq!(summary.records, 101);
    assert!(summary.deleted <= summary.records);
    // skipped operations never reach the store
    assert_eq!(backend.calls.load(Ordering::Relaxed), 400 - summary.skipped);
    assert!(summary.started.is_some() && summary.finished.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_reads_are_counted_per_type() {
    let backend = Arc::new(StubBackend {
        fail_reads: true,
        ..StubBackend::default()
    });
    let state = Arc::new(RunState::new(1_000));
    let ctx = RunContext {
        backend,
        generator: Arc::new(DefaultGenerator::new(3, 256).unwrap()),
        state: state.clone(),
        budget: Some(100),
    };
    let mix = OperationMix::new(&balanced()).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let batch = mix.prepare_batch(&mut rng);

    let outcome = execute_batch(&ctx, &batch, &mut rng).await;

    assert_eq!(outcome.executed, 100);
    assert_eq!(outcome.failed, 25);
    assert_eq!(state.error_count(OpKind::Read), 25);
    assert_eq!(state.errors()["r"], 25);
    assert_eq!(state.errors()[TOTAL], 25);
    assert_eq!(state.operations(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_workers_use_exact_budget() {
    let backend = Arc::new(StubBackend::default());
    let summary = run_workload(backend, config(100, 10_050, 8), quiet_options())
        .await
        .expect("run");

    assert_eq!(summary.operations, 10_050);
    assert!(summary.deleted <= summary.records);
    assert_eq!(summary.errors[TOTAL], 0);
    assert!(summary.batches.batches >= 101);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn latency_sampler_records_each_configured_type() {
    let backend = Arc::new(StubBackend::default());
    let mut cfg = config(100, 2_000_000, 1);
    // pace workers so the sampler gets several cycles before the deadline
    cfg.throughput = Some(20_000);
    cfg.run_time = Some(Duration::from_millis(200));
    let opts = RunOptions {
        sample_interval: Some(Duration::from_millis(10)),
        ..quiet_options()
    };
    let summary = run_workload(backend, cfg, opts).await.expect("run");

    for op in [OpKind::Create, OpKind::Read, OpKind::Update, OpKind::Delete] {
        let stats = summary.latency.get(&op).expect("samples for op");
        assert!(stats.count >= 1);
        assert!(stats.p80_ms <= stats.p95_ms);
    }
    assert!(!summary.latency.contains_key(&OpKind::Query));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deadline_stops_unbounded_run() {
    let backend = Arc::new(StubBackend::default());
    let mut cfg = config(10, 0, 2);
    cfg.operations = None;
    cfg.run_time = Some(Duration::from_millis(100));
    cfg.throughput = Some(10_000);

    let started = std::time::Instant::now();
    let summary = run_workload(backend, cfg, quiet_options()).await.expect("run");

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(summary.operations > 0);
    assert!(summary.operations % 100 == 0, "whole batches only without a budget");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deadline_interrupts_pacing_sleep() {
    let backend = Arc::new(StubBackend::default());
    let mut cfg = config(10, 0, 1);
    cfg.operations = None;
    cfg.run_time = Some(Duration::from_millis(200));
    // one batch every 2s, far longer than the deadline
    cfg.throughput = Some(50);

    let started = std::time::Instant::now();
    let summary = run_workload(backend, cfg, quiet_options()).await.expect("run");
    let wall = started.elapsed();

    assert!(wall < Duration::from_secs(1), "run took {wall:?}");
    assert!(summary.duration_s < 1.0, "duration {}", summary.duration_s);
    assert_eq!(summary.operations, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn state_is_readable_while_running() {
    let backend = Arc::new(StubBackend::default());
    let mut cfg = config(10, 1_000, 1);
    cfg.throughput = Some(5_000);
    let run = Run::new(backend, cfg, quiet_options()).expect("valid config");
    let state = run.state();
    let handle = tokio::spawn(run.execute());

    tokio::time::sleep(Duration::from_millis(50)).await;
    let live = state.snapshot();
    assert!(live.operations <= 1_000);
    assert!(live.deleted <= live.records);

    let summary = handle.await.expect("join").expect("run");
    assert_eq!(summary.operations, 1_000);
    assert!(!summary.timeline.is_empty());
}

#[tokio::test]
async fn invalid_mix_aborts_before_start() {
    let backend = Arc::new(StubBackend::default());
    let mut cfg = config(1, 100, 1);
    cfg.mix.query = 5;
    let err = run_workload(backend.clone(), cfg, quiet_options())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("sum of percentages"));
    assert_eq!(backend.calls.load(Ordering::Relaxed), 0);
}
