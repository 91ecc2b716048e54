//! Parameters of the physics simulator.
use crate::{
    args::{PhysicsEngine, SimArgs},
    config::EnvConfig,
    error::SafepoError,
};
use anyhow::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::{
    fs::File,
    io::Write,
    path::Path,
    process::{Command, Stdio},
};

/// Parameters of the PhysX engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysxParams {
    /// 0: PGS, 1: TGS.
    pub solver_type: u32,
    /// Position iterations of the solver.
    pub num_position_iterations: u32,
    /// Velocity iterations of the solver.
    pub num_velocity_iterations: u32,
    /// Number of CPU threads, 0 lets the engine decide.
    pub num_threads: usize,
    /// Runs the physics on the GPU.
    pub use_gpu: bool,
    /// Number of subscenes simulated in parallel.
    pub num_subscenes: usize,
    /// Capacity of the GPU contact pair buffer.
    pub max_gpu_contact_pairs: usize,
    /// Distance at which contacts are generated.
    pub contact_offset: f32,
    /// Distance at which shapes come to rest.
    pub rest_offset: f32,
    /// Relative velocity below which contacts do not bounce.
    pub bounce_threshold_velocity: f32,
    /// Maximum velocity used to resolve penetrations.
    pub max_depenetration_velocity: f32,
}

impl Default for PhysxParams {
    fn default() -> Self {
        Self {
            solver_type: 1,
            num_position_iterations: 4,
            num_velocity_iterations: 1,
            num_threads: 0,
            use_gpu: false,
            num_subscenes: 0,
            max_gpu_contact_pairs: 1024 * 1024,
            contact_offset: 0.02,
            rest_offset: 0.001,
            bounce_threshold_velocity: 0.2,
            max_depenetration_velocity: 100.0,
        }
    }
}

/// Parameters of the FleX engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexParams {
    /// Collision margin of shapes.
    pub shape_collision_margin: f32,
    /// Outer solver iterations.
    pub num_outer_iterations: u32,
    /// Inner solver iterations.
    pub num_inner_iterations: u32,
}

impl Default for FlexParams {
    fn default() -> Self {
        Self {
            shape_collision_margin: 0.0,
            num_outer_iterations: 4,
            num_inner_iterations: 15,
        }
    }
}

/// Parameters of a simulation, handed to the simulator for tasks that need it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Engine the parameters were prepared for.
    pub physics_engine: PhysicsEngine,
    /// Simulation time step in seconds.
    pub dt: f32,
    /// Physics substeps per step.
    pub substeps: u32,
    /// Up axis, `y` or `z`.
    pub up_axis: String,
    /// Gravity vector.
    pub gravity: [f32; 3],
    /// Number of client threads processing env slices.
    pub num_client_threads: usize,
    /// Keeps simulation buffers on the GPU.
    pub use_gpu_pipeline: bool,
    /// PhysX parameters.
    pub physx: PhysxParams,
    /// FleX parameters.
    pub flex: FlexParams,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            physics_engine: PhysicsEngine::Physx,
            dt: 1. / 60.,
            substeps: 2,
            up_axis: "y".to_string(),
            gravity: [0.0, -9.8, 0.0],
            num_client_threads: 0,
            use_gpu_pipeline: false,
            physx: PhysxParams::default(),
            flex: FlexParams::default(),
        }
    }
}

/// Merges `overrides` into `base`, recursing into nested mappings.
fn merge_value(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Mapping(base), Value::Mapping(overrides)) => {
            for (k, v) in overrides {
                match base.get_mut(k) {
                    Some(b) => merge_value(b, v),
                    None => {
                        base.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (base, overrides) => *base = overrides.clone(),
    }
}

impl SimParams {
    /// Builds simulation parameters from the simulator flags and the env config.
    ///
    /// `device` is the device the model runs on. Values in the `sim` section of the
    /// env config take precedence over the flags, except `--num-threads` which
    /// is applied last when running PhysX.
    pub fn build(args: &SimArgs, device: &str, env_config: &EnvConfig) -> Result<Self> {
        let mut params = Self {
            physics_engine: args.physics_engine,
            dt: 1. / 60.,
            num_client_threads: args.slices(),
            ..Self::default()
        };

        match args.physics_engine {
            PhysicsEngine::Flex => {
                if device != "cpu" {
                    warn!("Using Flex with GPU instead of PHYSX!");
                }
                params.flex.shape_collision_margin = 0.01;
                params.flex.num_outer_iterations = 4;
                params.flex.num_inner_iterations = 10;
            }
            PhysicsEngine::Physx => {
                params.physx.solver_type = 1;
                params.physx.num_position_iterations = 4;
                params.physx.num_velocity_iterations = 0;
                params.physx.num_threads = 4;
                params.physx.num_subscenes = args.subscenes;
                params.physx.max_gpu_contact_pairs = 8 * 1024 * 1024;
            }
        }
        params.use_gpu_pipeline = args.use_gpu_pipeline();
        params.physx.use_gpu = args.use_gpu();

        if let Some(section) = env_config.sim_section() {
            params = params.merge(section)?;
        }

        if args.physics_engine == PhysicsEngine::Physx && args.num_threads > 0 {
            params.physx.num_threads = args.num_threads;
        }

        Ok(params)
    }

    /// Returns a copy with the fields named in `section` replaced.
    pub fn merge(&self, section: &Value) -> Result<Self> {
        if !section.is_mapping() {
            return Err(SafepoError::NotAMapping("sim".to_string()).into());
        }
        let mut value = serde_yaml::to_value(self)?;
        merge_value(&mut value, section);
        Ok(serde_yaml::from_value(value)?)
    }

    /// Serializes [`SimParams`] to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self)?)
    }

    /// Saves [`SimParams`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.to_yaml()?.as_bytes())?;
        Ok(())
    }
}

/// The external physics simulator.
pub trait SimulatorBackend {
    /// Name of the simulator, used in error messages.
    fn name(&self) -> &str;

    /// Checks that the simulator can be used.
    fn check_available(&self) -> Result<()>;
}

/// Simulator shipped as a Python module.
///
/// Availability is probed by importing the module with the given interpreter.
#[derive(Debug, Clone)]
pub struct PythonSimulator {
    /// Python interpreter.
    pub interpreter: String,

    /// Module providing the simulator.
    pub module: String,
}

impl Default for PythonSimulator {
    fn default() -> Self {
        Self {
            interpreter: "python".to_string(),
            module: "isaacgym".to_string(),
        }
    }
}

impl SimulatorBackend for PythonSimulator {
    fn name(&self) -> &str {
        &self.module
    }

    fn check_available(&self) -> Result<()> {
        let status = Command::new(&self.interpreter)
            .arg("-c")
            .arg(format!("import {}", self.module))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => {
                info!("Found simulator module {}", self.module);
                Ok(())
            }
            _ => Err(SafepoError::SimulatorUnavailable(self.module.clone()).into()),
        }
    }
}
