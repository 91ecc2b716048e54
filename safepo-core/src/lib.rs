#![warn(missing_docs)]
//! Configuration builder for safe multi-agent reinforcement learning runs.
//!
//! The external trainer consumes two mappings per run: a train config, loaded
//! from a per-algorithm YAML file and overlaid with values from the command line,
//! and an env config, which is only populated for simulator-backed tasks.
//! [`build_multi_agent_config`] produces both, together with [`SimParams`] when
//! the selected task runs on the physics simulator.
pub mod error;
mod args;
mod builder;
mod config;
mod sim;
mod task;

pub use args::{parse_bool, MultiAgentArgs, PhysicsEngine, SimArgs};
pub use builder::{build_multi_agent_config, log_dir, MultiAgentConfig};
pub use config::{EnvConfig, TrainConfig};
pub use sim::{FlexParams, PhysxParams, PythonSimulator, SimParams, SimulatorBackend};
pub use task::{lookup_velocity_env, velocity_env_name, Task, MULTI_AGENT_VELOCITY_ENVS};
