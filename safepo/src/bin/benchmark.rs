use anyhow::Result;
use clap::Parser;
use safepo::benchmark::{env_ids, Benchmark, BenchmarkConfig};
use std::path::PathBuf;

/// Runs training scripts of safe RL algorithms over environments and seeds
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The ids of the environment to benchmark
    #[arg(long, num_args = 1.., default_values_t = env_ids::default_env_ids())]
    env_ids: Vec<String>,

    /// The ids of the algorithm to benchmark
    #[arg(long, num_args = 1.., default_values_t = env_ids::default_algos())]
    algo: Vec<String>,

    /// The number of random seeds
    #[arg(long, default_value_t = 3)]
    num_seeds: usize,

    /// The number of the starting seed
    #[arg(long, default_value_t = 0)]
    start_seed: u64,

    /// The number of workers to run benchmark experiments
    #[arg(long, default_value_t = 48)]
    workers: usize,

    /// Name of the experiment
    #[arg(long, default_value = "benchmark_single_env_8_14")]
    experiment: String,

    /// Log directory passed to the training scripts
    #[arg(long, default_value = "../runs")]
    log_dir: String,

    /// Interpreter of the training scripts
    #[arg(long, default_value = "python")]
    python: String,

    /// Loads the benchmark from a YAML file, ignoring the other flags
    #[arg(long)]
    config: Option<PathBuf>,

    /// Saves the benchmark configuration to a YAML file
    #[arg(long)]
    save_config: Option<PathBuf>,
}

impl Args {
    fn benchmark_config(&self) -> Result<BenchmarkConfig> {
        match &self.config {
            Some(path) => BenchmarkConfig::load(path),
            None => Ok(BenchmarkConfig::default()
                .env_ids(self.env_ids.clone())
                .algos(self.algo.clone())
                .num_seeds(self.num_seeds)
                .start_seed(self.start_seed)
                .workers(self.workers)
                .experiment(self.experiment.as_str())
                .log_dir(self.log_dir.as_str())
                .python(self.python.as_str())),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.benchmark_config()?;
    if let Some(path) = &args.save_config {
        config.save(path)?;
    }

    Benchmark::new(config).run(&mut std::io::stdout())?;
    Ok(())
}
