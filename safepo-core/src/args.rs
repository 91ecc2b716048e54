//! Command line flags of the multi-agent trainer.
use crate::error::SafepoError;
use clap::{ArgAction, Args, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parses a boolean the way `strtobool` does.
///
/// `y`, `yes`, `t`, `true`, `on` and `1` are true; `n`, `no`, `f`, `false`, `off`
/// and `0` are false. Matching is case-insensitive.
pub fn parse_bool(s: &str) -> Result<bool, SafepoError> {
    match s.to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(SafepoError::InvalidValue {
            name: "boolean flag",
            value: s.to_string(),
        }),
    }
}

/// Flags of a multi-agent training run.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "RL Policy")]
pub struct MultiAgentArgs {
    /// Use evaluation environment for testing
    #[arg(long, value_parser = parse_bool, action = ArgAction::Set, default_value = "False")]
    pub use_eval: bool,

    /// The task to run
    #[arg(long, default_value = "MujocoVelocity")]
    pub task: String,

    /// The agent configuration
    #[arg(long, default_value = "2x1")]
    pub agent_conf: String,

    /// The scenario
    #[arg(long, default_value = "Swimmer")]
    pub scenario: String,

    /// Experiment name, used as the first component of the log directory
    #[arg(long, default_value = "Base")]
    pub experiment: String,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Choose a model dir
    #[arg(long, default_value = "")]
    pub model_dir: String,

    /// Cost limit
    #[arg(long, default_value_t = 25.0)]
    pub safety_bound: f64,

    /// The device to run the model on
    #[arg(long, default_value = "cpu")]
    pub device: String,

    /// The device id to run the model on
    #[arg(long, default_value_t = 0)]
    pub device_id: u32,

    /// Toggles terminal logging
    #[arg(long, value_parser = parse_bool, action = ArgAction::Set, default_value = "True")]
    pub write_terminal: bool,

    /// Toggles headless mode
    #[arg(long, value_parser = parse_bool, action = ArgAction::Set, default_value = "False")]
    pub headless: bool,

    /// Total timesteps of the experiments
    #[arg(long)]
    pub total_steps: Option<u64>,

    /// The number of parallel game environments
    #[arg(long)]
    pub num_envs: Option<u64>,

    /// Directory holding `<algo>/config.yaml` train configs
    #[arg(long, default_value = "multi_agent/marl_cfg")]
    pub cfg_dir: PathBuf,

    /// Directory holding env configs of simulator tasks
    #[arg(long, default_value = "marl_cfg")]
    pub env_cfg_dir: PathBuf,

    /// Root directory of run logs
    #[arg(long, default_value = "../runs")]
    pub log_root: String,

    #[command(flatten)]
    pub sim: SimArgs,
}

impl MultiAgentArgs {
    /// Parses flags from an iterator, as [`Parser::try_parse_from`] does, with the
    /// program name prepended.
    pub fn try_from_flags<I, T>(flags: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let argv = std::iter::once("safepo".to_string()).chain(flags.into_iter().map(Into::into));
        Self::try_parse_from(argv)
    }
}

/// Physics engine of the simulator.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysicsEngine {
    /// NVIDIA PhysX.
    Physx,

    /// NVIDIA FleX.
    Flex,
}

/// Flags read by the physics simulator.
///
/// They are accepted for every task but only consulted for tasks that run on the
/// simulator.
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Simulator")]
pub struct SimArgs {
    /// Physics device, e.g. `cpu` or `cuda:0`
    #[arg(long, default_value = "cuda:0")]
    pub sim_device: String,

    /// Tensor API pipeline (`cpu` or `gpu`)
    #[arg(long, default_value = "gpu")]
    pub pipeline: String,

    /// Graphics device id
    #[arg(long, default_value_t = 0)]
    pub graphics_device_id: i32,

    /// Physics engine
    #[arg(long, value_enum, default_value_t = PhysicsEngine::Physx)]
    pub physics_engine: PhysicsEngine,

    /// Number of cores used by PhysX, 0 keeps the engine default
    #[arg(long, default_value_t = 0)]
    pub num_threads: usize,

    /// Number of PhysX subscenes to simulate in parallel
    #[arg(long, default_value_t = 0)]
    pub subscenes: usize,

    /// Number of client threads that process env slices, defaults to `--subscenes`
    #[arg(long)]
    pub slices: Option<usize>,

    /// Apply domain randomization
    #[arg(long, value_parser = parse_bool, action = ArgAction::Set, default_value = "False")]
    pub randomize: bool,
}

impl SimArgs {
    /// Device type part of `--sim-device`, e.g. `cuda` for `cuda:1`.
    pub fn sim_device_type(&self) -> &str {
        self.sim_device
            .split(':')
            .next()
            .unwrap_or(self.sim_device.as_str())
    }

    /// Device index part of `--sim-device`, 0 when absent.
    pub fn compute_device_id(&self) -> i32 {
        self.sim_device
            .split(':')
            .nth(1)
            .and_then(|id| id.parse().ok())
            .unwrap_or(0)
    }

    /// `true` when the physics runs on the GPU.
    pub fn use_gpu(&self) -> bool {
        self.sim_device_type() == "cuda"
    }

    /// `true` when the GPU pipeline was requested and the physics runs on the GPU.
    pub fn use_gpu_pipeline(&self) -> bool {
        let requested = matches!(self.pipeline.to_ascii_lowercase().as_str(), "gpu" | "cuda");
        requested && self.use_gpu()
    }

    /// Returns `true` when the GPU pipeline was requested but cannot be used.
    pub fn gpu_pipeline_downgraded(&self) -> bool {
        let requested = matches!(self.pipeline.to_ascii_lowercase().as_str(), "gpu" | "cuda");
        requested && !self.use_gpu()
    }

    /// Number of client threads.
    pub fn slices(&self) -> usize {
        self.slices.unwrap_or(self.subscenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        for s in ["True", "yes", "1", "ON", "t"].iter() {
            assert!(parse_bool(s).unwrap());
        }
        for s in ["False", "no", "0", "off", "F"].iter() {
            assert!(!parse_bool(s).unwrap());
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = MultiAgentArgs::try_from_flags(Vec::<String>::new()).unwrap();
        assert!(!args.use_eval);
        assert_eq!(args.task, "MujocoVelocity");
        assert_eq!(args.agent_conf, "2x1");
        assert_eq!(args.scenario, "Swimmer");
        assert_eq!(args.experiment, "Base");
        assert_eq!(args.seed, 0);
        assert_eq!(args.safety_bound, 25.0);
        assert_eq!(args.device, "cpu");
        assert_eq!(args.device_id, 0);
        assert!(args.write_terminal);
        assert!(!args.headless);
        assert_eq!(args.total_steps, None);
        assert_eq!(args.num_envs, None);
        assert_eq!(args.log_root, "../runs");
        assert_eq!(args.sim.physics_engine, PhysicsEngine::Physx);
        assert!(args.sim.use_gpu_pipeline());
    }

    #[test]
    fn test_flags() {
        let args = MultiAgentArgs::try_from_flags(vec![
            "--write-terminal",
            "False",
            "--seed",
            "7",
            "--total-steps",
            "1000",
            "--sim-device",
            "cpu",
            "--physics-engine",
            "flex",
            "--subscenes",
            "3",
        ])
        .unwrap();
        assert!(!args.write_terminal);
        assert_eq!(args.seed, 7);
        assert_eq!(args.total_steps, Some(1000));
        assert_eq!(args.sim.sim_device_type(), "cpu");
        assert_eq!(args.sim.compute_device_id(), 0);
        assert!(!args.sim.use_gpu());
        assert!(!args.sim.use_gpu_pipeline());
        assert!(args.sim.gpu_pipeline_downgraded());
        assert_eq!(args.sim.physics_engine, PhysicsEngine::Flex);
        assert_eq!(args.sim.slices(), 3);

        assert!(MultiAgentArgs::try_from_flags(vec!["--headless", "perhaps"]).is_err());
    }

    #[test]
    fn test_sim_device_index() {
        let args = MultiAgentArgs::try_from_flags(vec!["--sim-device", "cuda:2"]).unwrap();
        assert_eq!(args.sim.sim_device_type(), "cuda");
        assert_eq!(args.sim.compute_device_id(), 2);
    }
}
