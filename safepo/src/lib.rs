//! Benchmark and configuration harness for safe reinforcement learning.
//!
//! * [`benchmark`] enumerates environment/algorithm/seed combinations and runs the
//!   training scripts on a bounded pool of workers.
//! * [`config`] builds the configuration consumed by the multi-agent trainer.
//!
//! Both are also available as binaries, `benchmark` and `multi_agent_config`.
pub use safepo_benchmark as benchmark;
pub use safepo_core as config;
