//! Launches safe RL benchmark runs.
//!
//! A benchmark is the Cartesian product of seeds, environments and algorithms.
//! Every combination becomes one invocation of the training script of the
//! algorithm, executed as an independent subprocess on a [`WorkerPool`] of fixed
//! width.
//!
//! ```no_run
//! use safepo_benchmark::{Benchmark, BenchmarkConfig};
//!
//! let config = BenchmarkConfig::default()
//!     .env_ids(vec!["SafetyAntVelocity-v1".to_string()])
//!     .algos(vec!["ppo_lag".to_string()])
//!     .workers(2);
//! Benchmark::new(config).run(&mut std::io::stdout()).unwrap();
//! ```
pub mod env_ids;
pub mod error;
mod pool;
mod run;

pub use pool::WorkerPool;
pub use run::{run_experiment, Benchmark, BenchmarkConfig, RunCommand, RunSpec};
