//! Builds the configuration of a multi-agent training run.
use crate::{
    args::MultiAgentArgs,
    config::{EnvConfig, TrainConfig},
    sim::{SimParams, SimulatorBackend},
    task::{velocity_env_name, Task},
};
use anyhow::Result;
use chrono::{DateTime, Local};
use log::{info, warn};

/// Configuration of a multi-agent training run.
#[derive(Debug, Clone)]
pub struct MultiAgentConfig {
    /// The selected task.
    pub task: Task,

    /// Device the model runs on, without the device index.
    pub device: String,

    /// Hyperparameters handed to the trainer.
    pub cfg_train: TrainConfig,

    /// Parameters of the task, empty unless the task runs on the simulator.
    pub cfg_env: EnvConfig,

    /// Parameters of the simulator, for tasks that run on it.
    pub sim_params: Option<SimParams>,
}

/// Returns the log directory of a run.
///
/// The layout is `{log_root}/{experiment}/{env_name}/{algo}/seed-{seed:03}-{timestamp}`.
pub fn log_dir(
    log_root: &str,
    experiment: &str,
    env_name: &str,
    algo: &str,
    seed: u64,
    time: &DateTime<Local>,
) -> String {
    format!(
        "{}/{}/{}/{}/seed-{:03}-{}",
        log_root,
        experiment,
        env_name,
        algo,
        seed,
        time.format("%Y-%m-%d-%H-%M-%S")
    )
}

/// Builds the configuration of a run of `algo`.
///
/// The train config is read from `{cfg_dir}/{algo}/config.yaml` and overlaid with
/// values from `args`. For tasks running on the simulator, the env config is
/// read from `{env_cfg_dir}/{task}.yaml` and [`SimParams`] are derived from the
/// simulator flags. Nothing is returned for unknown tasks, or when the
/// simulator is needed but not available.
pub fn build_multi_agent_config(
    algo: &str,
    args: &MultiAgentArgs,
    simulator: &dyn SimulatorBackend,
) -> Result<MultiAgentConfig> {
    let task: Task = args.task.parse()?;

    let device = if task.needs_simulator() {
        simulator.check_available()?;
        if args.sim.gpu_pipeline_downgraded() {
            warn!("Can't use GPU pipeline with CPU Physics. Changing pipeline.");
        }
        match args.sim.use_gpu_pipeline() {
            true => args.sim.sim_device_type().to_string(),
            false => "cpu".to_string(),
        }
    } else {
        args.device.clone()
    };

    let cfg_train_path = args.cfg_dir.join(algo).join("config.yaml");
    info!("Loading train config from {}", cfg_train_path.display());
    let mut cfg_train = TrainConfig::load(&cfg_train_path)?;
    if task == Task::MujocoVelocity {
        cfg_train.merge_section("mamujoco")?;
    }

    cfg_train.insert("use_eval", args.use_eval);
    cfg_train.insert("safety_bound", args.safety_bound);
    cfg_train.insert("algorithm_name", algo);
    cfg_train.insert("device", format!("{}:{}", device, args.device_id));

    let env_name = match task {
        Task::MujocoVelocity => velocity_env_name(&args.agent_conf, &args.scenario),
        _ => task.name().to_string(),
    };
    cfg_train.insert("env_name", env_name.as_str());

    // 0 keeps the values of the config file
    if let Some(total_steps) = args.total_steps.filter(|n| *n > 0) {
        cfg_train.insert("num_env_steps", total_steps);
    }
    if let Some(num_envs) = args.num_envs.filter(|n| *n > 0) {
        cfg_train.insert("n_rollout_threads", num_envs);
        cfg_train.insert("n_eval_rollout_threads", num_envs);
    }

    let log_dir = log_dir(
        &args.log_root,
        &args.experiment,
        &env_name,
        algo,
        args.seed,
        &Local::now(),
    );
    info!("Log directory: {}", log_dir);
    cfg_train.insert("log_dir", log_dir);

    let (cfg_env, sim_params) = match task.env_config_stem() {
        Some(stem) => {
            let path = args.env_cfg_dir.join(format!("{}.yaml", stem));
            info!("Loading env config from {}", path.display());
            let mut cfg_env = EnvConfig::load(&path)?;
            cfg_env.insert("name", task.name());
            cfg_env.fill_randomize(args.sim.randomize)?;
            let sim_params = SimParams::build(&args.sim, &device, &cfg_env)?;
            (cfg_env, Some(sim_params))
        }
        None => (EnvConfig::default(), None),
    };

    Ok(MultiAgentConfig {
        task,
        device,
        cfg_train,
        cfg_env,
        sim_params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SafepoError;
    use chrono::TimeZone;
    use serde_yaml::Value;
    use std::{fs, path::Path};
    use tempdir::TempDir;
    use test_log::test;

    struct Installed;

    impl SimulatorBackend for Installed {
        fn name(&self) -> &str {
            "isaacgym"
        }

        fn check_available(&self) -> Result<()> {
            Ok(())
        }
    }

    struct Missing;

    impl SimulatorBackend for Missing {
        fn name(&self) -> &str {
            "isaacgym"
        }

        fn check_available(&self) -> Result<()> {
            Err(SafepoError::SimulatorUnavailable(self.name().to_string()).into())
        }
    }

    fn write_configs(root: &Path) -> Result<()> {
        let algo_dir = root.join("marl_cfg").join("mappo");
        fs::create_dir_all(&algo_dir)?;
        fs::write(
            algo_dir.join("config.yaml"),
            "episode_length: 75\nn_rollout_threads: 20\nnum_env_steps: 100000000\nmamujoco:\n  episode_length: 1000\n  n_rollout_threads: 10\n",
        )?;
        let env_dir = root.join("env_cfg");
        fs::create_dir_all(&env_dir)?;
        fs::write(
            env_dir.join("shadow_hand_over.yaml"),
            "env:\n  numEnvs: 64\ntask:\n  randomization_params: {}\nsim:\n  substeps: 2\n  physx:\n    num_threads: 4\n",
        )?;
        Ok(())
    }

    fn args(root: &Path, flags: Vec<&str>) -> MultiAgentArgs {
        let mut all = vec![
            "--cfg-dir".to_string(),
            root.join("marl_cfg").display().to_string(),
            "--env-cfg-dir".to_string(),
            root.join("env_cfg").display().to_string(),
        ];
        all.extend(flags.into_iter().map(String::from));
        MultiAgentArgs::try_from_flags(all).unwrap()
    }

    #[test]
    fn test_log_dir() {
        let t = Local.with_ymd_and_hms(2023, 8, 14, 9, 5, 3).unwrap();
        assert_eq!(
            log_dir("../runs", "Base", "Safety2x1SwimmerVelocity-v0", "mappo", 7, &t),
            "../runs/Base/Safety2x1SwimmerVelocity-v0/mappo/seed-007-2023-08-14-09-05-03"
        );
        let other_seed = log_dir("../runs", "Base", "Safety2x1SwimmerVelocity-v0", "mappo", 8, &t);
        assert_ne!(other_seed, log_dir("../runs", "Base", "Safety2x1SwimmerVelocity-v0", "mappo", 7, &t));
    }

    #[test]
    fn test_mujoco_velocity() -> Result<()> {
        let dir = TempDir::new("mujoco_velocity")?;
        write_configs(dir.path())?;
        let args = args(
            dir.path(),
            vec![
                "--agent-conf", "2x3", "--scenario", "HalfCheetah", "--device-id", "1",
                "--seed", "3", "--num-envs", "4", "--safety-bound", "10",
            ],
        );
        let config = build_multi_agent_config("mappo", &args, &Missing)?;
        let cfg = &config.cfg_train;

        assert_eq!(config.task, Task::MujocoVelocity);
        assert!(config.sim_params.is_none());
        assert_eq!(config.cfg_env.as_mapping().len(), 0);
        assert_eq!(cfg.get("episode_length"), Some(&Value::from(1000)));
        assert_eq!(cfg.get("n_rollout_threads"), Some(&Value::from(4u64)));
        assert_eq!(cfg.get("n_eval_rollout_threads"), Some(&Value::from(4u64)));
        assert_eq!(cfg.get("num_env_steps"), Some(&Value::from(100000000)));
        assert_eq!(cfg.get("device"), Some(&Value::from("cpu:1")));
        assert_eq!(cfg.get("algorithm_name"), Some(&Value::from("mappo")));
        assert_eq!(cfg.get("safety_bound"), Some(&Value::from(10.0)));
        assert_eq!(cfg.get("use_eval"), Some(&Value::from(false)));
        assert_eq!(
            cfg.get("env_name"),
            Some(&Value::from("Safety2x3HalfCheetahVelocity-v0"))
        );

        let log_dir = cfg.log_dir().unwrap();
        assert!(log_dir.starts_with("../runs/Base/Safety2x3HalfCheetahVelocity-v0/mappo/seed-003-"));
        Ok(())
    }

    #[test]
    fn test_total_steps() -> Result<()> {
        let dir = TempDir::new("total_steps")?;
        write_configs(dir.path())?;
        let args = args(dir.path(), vec!["--total-steps", "2000"]);
        let config = build_multi_agent_config("mappo", &args, &Missing)?;
        assert_eq!(
            config.cfg_train.get("num_env_steps"),
            Some(&Value::from(2000u64))
        );
        assert!(!config.cfg_train.log_dir().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_zero_overrides_keep_config() -> Result<()> {
        let dir = TempDir::new("zero_overrides")?;
        write_configs(dir.path())?;
        let args = args(dir.path(), vec!["--total-steps", "0", "--num-envs", "0"]);
        let config = build_multi_agent_config("mappo", &args, &Missing)?;
        let cfg = &config.cfg_train;
        assert_eq!(cfg.get("num_env_steps"), Some(&Value::from(100000000)));
        assert_eq!(cfg.get("n_rollout_threads"), Some(&Value::from(10)));
        assert!(!cfg.contains_key("n_eval_rollout_threads"));
        Ok(())
    }

    #[test]
    fn test_shadow_hand() -> Result<()> {
        let dir = TempDir::new("shadow_hand")?;
        write_configs(dir.path())?;
        // mamujoco is only merged for velocity tasks
        let args = args(
            dir.path(),
            vec!["--task", "ShadowHandOver", "--randomize", "True", "--sim-device", "cuda:0"],
        );
        let config = build_multi_agent_config("mappo", &args, &Installed)?;

        assert_eq!(config.device, "cuda");
        assert_eq!(config.cfg_train.get("device"), Some(&Value::from("cuda:0")));
        assert_eq!(config.cfg_train.get("episode_length"), Some(&Value::from(75)));
        assert_eq!(
            config.cfg_train.get("env_name"),
            Some(&Value::from("ShadowHandOver"))
        );
        assert_eq!(config.cfg_env.get("name"), Some(&Value::from("ShadowHandOver")));
        let task = config.cfg_env.get("task").unwrap();
        assert_eq!(task.get("randomize"), Some(&Value::from(true)));

        let sim_params = config.sim_params.unwrap();
        assert_eq!(sim_params.substeps, 2);
        assert!(sim_params.use_gpu_pipeline);
        Ok(())
    }

    #[test]
    fn test_shadow_hand_cpu_pipeline() -> Result<()> {
        let dir = TempDir::new("shadow_hand_cpu")?;
        write_configs(dir.path())?;
        let args = args(
            dir.path(),
            vec!["--task", "ShadowHandOver", "--sim-device", "cpu", "--device-id", "2"],
        );
        let config = build_multi_agent_config("mappo", &args, &Installed)?;
        assert_eq!(config.cfg_train.get("device"), Some(&Value::from("cpu:2")));
        assert!(!config.sim_params.unwrap().use_gpu_pipeline);
        Ok(())
    }

    #[test]
    fn test_missing_simulator() -> Result<()> {
        let dir = TempDir::new("missing_simulator")?;
        write_configs(dir.path())?;
        let args = args(dir.path(), vec!["--task", "ShadowHandCatchUnderarm"]);
        let err = build_multi_agent_config("mappo", &args, &Missing).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SafepoError>(),
            Some(SafepoError::SimulatorUnavailable(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_task() -> Result<()> {
        let dir = TempDir::new("unknown_task")?;
        write_configs(dir.path())?;
        for task in ["ShadowHandPen", "mujocovelocity", "SafetyAntVelocity-v1"].iter() {
            let args = args(dir.path(), vec!["--task", task]);
            let err = build_multi_agent_config("mappo", &args, &Installed).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SafepoError>(),
                Some(SafepoError::UnknownTask(_))
            ));
        }
        Ok(())
    }
}
