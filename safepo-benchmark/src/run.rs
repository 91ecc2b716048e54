//! Run descriptors and the benchmark driver.
use crate::{env_ids, error::BenchmarkError, WorkerPool};
use anyhow::{Context, Result};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::{BufReader, Write},
    path::Path,
    process::Command,
};

/// Seeds of consecutive runs are this far apart.
const SEED_STRIDE: u64 = 1000;

/// One (environment, algorithm, seed) combination to benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    /// Environment id.
    pub env_id: String,

    /// Algorithm, which is also the stem of its training script.
    pub algo: String,

    /// Random seed.
    pub seed: u64,
}

impl RunSpec {
    /// Command line invoking the training script of the run.
    pub fn command(&self, python: &str, log_dir: &str, experiment: &str) -> RunCommand {
        RunCommand::new(
            python,
            vec![
                format!("{}.py", self.algo),
                "--env-id".to_string(),
                self.env_id.clone(),
                "--seed".to_string(),
                self.seed.to_string(),
                "--write-terminal".to_string(),
                "False".to_string(),
                "--log-dir".to_string(),
                log_dir.to_string(),
                "--experiment".to_string(),
                experiment.to_string(),
            ],
        )
    }
}

/// A program and its arguments.
///
/// Displayed as the flat command line, with arguments separated by spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCommand {
    /// Program to execute.
    pub program: String,

    /// Arguments of the program.
    pub args: Vec<String>,
}

impl RunCommand {
    /// Creates a command.
    pub fn new<S: Into<String>>(program: impl Into<String>, args: Vec<S>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for RunCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs a command and waits until it exits.
///
/// Fails with [`BenchmarkError::NonZeroExit`] unless the process exits
/// successfully.
pub fn run_experiment(command: &RunCommand) -> Result<(), BenchmarkError> {
    info!("running {}", command);
    let status = Command::new(&command.program)
        .args(&command.args)
        .status()
        .map_err(|source| BenchmarkError::Spawn {
            command: command.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(BenchmarkError::NonZeroExit {
            command: command.to_string(),
            code: status.code(),
        })
    }
}

/// Configuration of [`Benchmark`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct BenchmarkConfig {
    /// Environments to benchmark.
    pub env_ids: Vec<String>,

    /// Algorithms to benchmark.
    pub algos: Vec<String>,

    /// Number of seeds per combination.
    pub num_seeds: usize,

    /// Seed of the first run of each combination.
    pub start_seed: u64,

    /// Number of workers; 0 only prints the commands.
    pub workers: usize,

    /// Name of the experiment.
    pub experiment: String,

    /// Log directory passed to the training scripts.
    pub log_dir: String,

    /// Interpreter of the training scripts.
    pub python: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            env_ids: env_ids::default_env_ids(),
            algos: env_ids::default_algos(),
            num_seeds: 3,
            start_seed: 0,
            workers: 48,
            experiment: "benchmark_single_env_8_14".to_string(),
            log_dir: "../runs".to_string(),
            python: "python".to_string(),
        }
    }
}

impl BenchmarkConfig {
    /// Sets the environments.
    pub fn env_ids(mut self, v: Vec<String>) -> Self {
        self.env_ids = v;
        self
    }

    /// Sets the algorithms.
    pub fn algos(mut self, v: Vec<String>) -> Self {
        self.algos = v;
        self
    }

    /// Sets the number of seeds.
    pub fn num_seeds(mut self, v: usize) -> Self {
        self.num_seeds = v;
        self
    }

    /// Sets the first seed.
    pub fn start_seed(mut self, v: u64) -> Self {
        self.start_seed = v;
        self
    }

    /// Sets the number of workers.
    pub fn workers(mut self, v: usize) -> Self {
        self.workers = v;
        self
    }

    /// Sets the name of the experiment.
    pub fn experiment(mut self, v: impl Into<String>) -> Self {
        self.experiment = v.into();
        self
    }

    /// Sets the log directory.
    pub fn log_dir(mut self, v: impl Into<String>) -> Self {
        self.log_dir = v.into();
        self
    }

    /// Sets the interpreter.
    pub fn python(mut self, v: impl Into<String>) -> Self {
        self.python = v.into();
        self
    }

    /// Seed of the `i`-th run of a combination.
    ///
    /// Fails with [`BenchmarkError::SeedOverflow`] if the seed does not fit in `u64`.
    pub fn seed(&self, i: usize) -> Result<u64, BenchmarkError> {
        (i as u64)
            .checked_mul(SEED_STRIDE)
            .and_then(|offset| self.start_seed.checked_add(offset))
            .ok_or(BenchmarkError::SeedOverflow {
                start_seed: self.start_seed,
                index: i,
            })
    }

    /// All runs, ordered by seed, environment and algorithm.
    pub fn runs(&self) -> Result<Vec<RunSpec>> {
        let mut runs = Vec::with_capacity(self.num_seeds * self.env_ids.len() * self.algos.len());
        for i in 0..self.num_seeds {
            let seed = self.seed(i)?;
            for env_id in &self.env_ids {
                for algo in &self.algos {
                    runs.push(RunSpec {
                        env_id: env_id.clone(),
                        algo: algo.clone(),
                        seed,
                    });
                }
            }
        }
        Ok(runs)
    }

    /// Command lines of all runs.
    pub fn commands(&self) -> Result<Vec<RunCommand>> {
        Ok(self
            .runs()?
            .iter()
            .map(|run| run.command(&self.python, &self.log_dir, &self.experiment))
            .collect())
    }

    /// Constructs [`BenchmarkConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`BenchmarkConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Runs every combination of a [`BenchmarkConfig`].
pub struct Benchmark {
    config: BenchmarkConfig,
}

impl Benchmark {
    /// Creates a benchmark.
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Configuration of the benchmark.
    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Prints the commands to `out`, then runs them unless `workers` is 0.
    ///
    /// Returns the number of executed commands. Fails if any of them failed,
    /// after all of them finished.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<usize> {
        let commands = self.config.commands()?;

        writeln!(out, "======= commands to run:")?;
        for command in &commands {
            writeln!(out, "{}", command)?;
        }

        if self.config.workers == 0 {
            writeln!(
                out,
                "not running the experiments because --workers is set to 0; just printing the commands to run"
            )?;
            return Ok(0);
        }

        let pool = WorkerPool::new(self.config.workers)?;
        let n_commands = commands.len();
        for command in commands {
            pool.submit(command)?;
        }
        let mut failures = pool.shutdown().into_iter();

        match failures.next() {
            None => {
                info!("Finished {} runs", n_commands);
                Ok(n_commands)
            }
            Some(first) => {
                let n_failed = 1 + failures.count();
                error!("{} of {} runs failed", n_failed, n_commands);
                Err(first).with_context(|| format!("{} of {} runs failed", n_failed, n_commands))
            }
        }
    }
}
