use anyhow::Result;
use clap::{Parser, Subcommand};
use crudbench_core::adapter::ConnectionParams;
use crudbench_core::{run_workload, AdapterFactory, Backend, RunOptions, WorkloadFile};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "crudbench", version, about = "CRUD-Q workload benchmark driver")]
struct Cli {
    #[arg(long, default_value = "info")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a workload against a store
    Run {
        /// Store adapter name (e.g., memory)
        #[arg(long)]
        store: String,
        /// Path to workload YAML
        #[arg(long)]
        workload: PathBuf,
        /// Output directory base (results go under an adapter-workload folder)
        #[arg(long, default_value = "results/raw")]
        output: PathBuf,
        /// Connection URI for the store (defaults per adapter)
        #[arg(long)]
        uri: Option<String>,
        /// Optional key=value options (repeatable)
        #[arg(long, num_args=0.., value_parser = parse_key_val::<String, String>)]
        option: Vec<(String, String)>,
        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// List available workloads in the repo
    ListWorkloads {
        #[arg(long, default_value = "workloads")]
        path: PathBuf,
    },
    /// List available store adapters
    ListStores,
}

fn parse_key_val<K, V>(s: &str) -> std::result::Result<(K, V), String>
where
    K: std::str::FromStr,
    V: std::str::FromStr,
{
    match s.split_once('=') {
        Some((k, v)) => {
            let key = k.parse().map_err(|_| format!("invalid key: {k}"))?;
            let value = v.parse().map_err(|_| format!("invalid value: {v}"))?;
            Ok((key, value))
        }
        None => Err(format!("invalid KEY=VALUE: no `=` in `{s}`")),
    }
}

fn adapter_factories() -> Vec<Box<dyn AdapterFactory>> {
    vec![
        Box::new(dummy_adapter::DummyFactory),
        Box::new(memory_adapter::MemoryFactory),
    ]
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .init();

    let factories = adapter_factories();

    match cli.command {
        Commands::ListStores => {
            for f in &factories {
                println!("{}", f.name());
            }
            Ok(())
        }
        Commands::ListWorkloads { path } => {
            for entry in fs::read_dir(path)? {
                let p = entry?.path();
                if p.extension().and_then(|e| e.to_str()) == Some("yaml") {
                    println!("{}", p.display());
                }
            }
            Ok(())
        }
        Commands::Run {
            store,
            workload,
            output,
            uri,
            option,
            seed,
        } => {
            let wl = WorkloadFile::load(&workload)?;
            wl.validate()?;
            let adapter_name = store.to_lowercase();
            let factory = factories
                .iter()
                .find(|f| f.name() == adapter_name)
                .ok_or_else(|| anyhow::anyhow!("unknown adapter: {}", adapter_name))?;

            let wl_stem = workload.file_stem().unwrap_or_default().to_string_lossy();
            let run_dir = output.join(format!("{}-{}", adapter_name, wl_stem));
            fs::create_dir_all(&run_dir)?;

            let conn = ConnectionParams {
                uri: uri.unwrap_or_else(|| factory.default_uri().to_string()),
                options: option.into_iter().collect(),
            };
            let backend: Arc<dyn Backend> = factory.create(&conn)?.into();
            info!(adapter = %adapter_name, uri = %conn.uri, "connected");

            let rt = Runtime::new()?;
            let opts = RunOptions {
                adapter_name: adapter_name.clone(),
                seed,
                ..RunOptions::default()
            };
            let summary = rt.block_on(run_workload(backend, wl, opts))?;
            summary.print();

            fs::write(
                run_dir.join("summary.json"),
                serde_json::to_string_pretty(&summary)?,
            )?;
            // JSON Lines for the throughput timeline
            let mut lines = String::new();
            for s in &summary.timeline {
                lines.push_str(&serde_json::to_string(s)?);
                lines.push('\n');
            }
            fs::write(run_dir.join("throughput.jsonl"), lines)?;
            fs::write(
                run_dir.join("run.meta.json"),
                json!({
                    "adapter": adapter_name,
                    "workload": workload.to_string_lossy(),
                    "seed": seed,
                })
                .to_string(),
            )?;

            println!("Run complete. Outputs written to {}", run_dir.display());
            Ok(())
        }
    }
}
