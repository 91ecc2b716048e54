use crate::{error::BenchmarkError, run::run_experiment, RunCommand};
use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{error, info};
use std::thread::{Builder, JoinHandle};

/// Fixed-size pool of threads executing [`RunCommand`]s.
///
/// Commands are taken from a shared queue. Each worker blocks on one subprocess at
/// a time; a failed command is logged and reported, and the worker moves on to
/// the next one. Running siblings are never interrupted.
pub struct WorkerPool {
    /// Queue of commands, `None` once closed.
    sender: Option<Sender<RunCommand>>,

    /// Failures reported by the workers.
    failure_receiver: Receiver<BenchmarkError>,

    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Prefix of the names of worker threads.
    pub const THREAD_NAME_PREFIX: &'static str = "safepo-benchmark-worker-";

    /// Starts `n_workers` worker threads.
    pub fn new(n_workers: usize) -> Result<Self> {
        let (sender, receiver) = unbounded::<RunCommand>();
        let (failure_sender, failure_receiver) = unbounded();

        let mut threads = Vec::with_capacity(n_workers);
        for i in 0..n_workers {
            let receiver = receiver.clone();
            let failure_sender = failure_sender.clone();
            let handle = Builder::new()
                .name(format!("{}{}", Self::THREAD_NAME_PREFIX, i))
                .spawn(move || Self::run_worker(receiver, failure_sender))?;
            threads.push(handle);
        }
        info!("Started {} workers", n_workers);

        Ok(Self {
            sender: Some(sender),
            failure_receiver,
            threads,
        })
    }

    /// Number of worker threads.
    pub fn n_workers(&self) -> usize {
        self.threads.len()
    }

    /// Queues a command.
    pub fn submit(&self, command: RunCommand) -> Result<()> {
        if let Some(sender) = &self.sender {
            sender
                .send(command)
                .map_err(|e| anyhow::anyhow!("Worker queue is closed: {}", e.0))?;
        }
        Ok(())
    }

    /// Closes the queue, waits until all queued commands finished and returns the
    /// failures in the order they were reported.
    pub fn shutdown(mut self) -> Vec<BenchmarkError> {
        self.sender = None;

        let mut failures = vec![];
        for handle in self.threads.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                failures.push(BenchmarkError::WorkerPanicked(name));
            }
        }

        let mut reported: Vec<_> = self.failure_receiver.try_iter().collect();
        reported.extend(failures);
        reported
    }

    fn run_worker(receiver: Receiver<RunCommand>, failure_sender: Sender<BenchmarkError>) {
        for command in receiver.iter() {
            if let Err(e) = run_experiment(&command) {
                error!("{}", e);
                // The pool outlives its workers, so the receiver is still open.
                let _ = failure_sender.send(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[cfg(unix)]
    #[test]
    fn test_failures_are_reported() -> Result<()> {
        let pool = WorkerPool::new(2)?;
        assert_eq!(pool.n_workers(), 2);
        pool.submit(RunCommand::new("true", Vec::<String>::new()))?;
        pool.submit(RunCommand::new("sh", vec!["-c", "exit 3"]))?;
        pool.submit(RunCommand::new("true", Vec::<String>::new()))?;

        let failures = pool.shutdown();
        assert_eq!(failures.len(), 1);
        match &failures[0] {
            BenchmarkError::NonZeroExit { command, code } => {
                assert_eq!(command, "sh -c exit 3");
                assert_eq!(*code, Some(3));
            }
            e => panic!("unexpected failure: {}", e),
        }
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_all_commands_run() -> Result<()> {
        let dir = tempdir::TempDir::new("worker_pool")?;
        let pool = WorkerPool::new(3)?;
        for i in 0..10 {
            let path = dir.path().join(format!("{}", i));
            pool.submit(RunCommand::new("touch", vec![path.display().to_string()]))?;
        }
        assert!(pool.shutdown().is_empty());
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 10);
        Ok(())
    }
}
