//! Errors in the benchmark driver.
use thiserror::Error;

/// Errors raised while running benchmark commands.
#[derive(Error, Debug)]
pub enum BenchmarkError {
    /// The process could not be started.
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        /// The command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The process exited unsuccessfully. `code` is `None` when it was killed by
    /// a signal.
    #[error("`{command}` exited with status {code:?}")]
    NonZeroExit {
        /// The command line.
        command: String,
        /// Exit code of the process.
        code: Option<i32>,
    },

    /// A seed of the benchmark does not fit in `u64`.
    #[error("Seed {start_seed} + 1000 * {index} is out of range")]
    SeedOverflow {
        /// First seed of the benchmark.
        start_seed: u64,
        /// Index of the seed.
        index: usize,
    },

    /// A worker thread panicked.
    #[error("Worker thread {0} panicked")]
    WorkerPanicked(String),
}
