//! Tasks supported by the multi-agent trainer.
use crate::error::SafepoError;
use std::{fmt, str::FromStr};

/// Multi-agent velocity environments, as `(env_id, agent_conf, scenario)`.
pub const MULTI_AGENT_VELOCITY_ENVS: [(&str, &str, &str); 8] = [
    ("Safety2x4AntVelocity-v0", "2x4", "Ant"),
    ("Safety4x2AntVelocity-v0", "4x2", "Ant"),
    ("Safety2x3HalfCheetahVelocity-v0", "2x3", "HalfCheetah"),
    ("Safety6x1HalfCheetahVelocity-v0", "6x1", "HalfCheetah"),
    ("Safety3x1HopperVelocity-v0", "3x1", "Hopper"),
    ("Safety2x3Walker2dVelocity-v0", "2x3", "Walker2d"),
    ("Safety2x1SwimmerVelocity-v0", "2x1", "Swimmer"),
    ("Safety9|8HumanoidVelocity-v0", "9|8", "Humanoid"),
];

/// Returns the env id of a multi-agent velocity task.
pub fn velocity_env_name(agent_conf: &str, scenario: &str) -> String {
    format!("Safety{}{}Velocity-v0", agent_conf, scenario)
}

/// Returns `(agent_conf, scenario)` of a known multi-agent velocity env id.
pub fn lookup_velocity_env(env_id: &str) -> Option<(&'static str, &'static str)> {
    MULTI_AGENT_VELOCITY_ENVS
        .iter()
        .find(|(id, _, _)| *id == env_id)
        .map(|(_, agent_conf, scenario)| (*agent_conf, *scenario))
}

/// Task family selected with `--task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Multi-agent MuJoCo velocity tasks.
    MujocoVelocity,

    /// Hand-over task running on the physics simulator.
    ShadowHandOver,

    /// Underarm catch task running on the physics simulator.
    ShadowHandCatchUnderarm,
}

impl Task {
    /// Name of the task as given on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MujocoVelocity => "MujocoVelocity",
            Self::ShadowHandOver => "ShadowHandOver",
            Self::ShadowHandCatchUnderarm => "ShadowHandCatchUnderarm",
        }
    }

    /// Returns `true` for tasks that run on the physics simulator.
    pub fn needs_simulator(&self) -> bool {
        !matches!(self, Self::MujocoVelocity)
    }

    /// File stem of the env config of a simulator task.
    pub fn env_config_stem(&self) -> Option<&'static str> {
        match self {
            Self::MujocoVelocity => None,
            Self::ShadowHandOver => Some("shadow_hand_over"),
            Self::ShadowHandCatchUnderarm => Some("shadow_hand_catch_underarm"),
        }
    }
}

impl FromStr for Task {
    type Err = SafepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MujocoVelocity" => Ok(Self::MujocoVelocity),
            "ShadowHandOver" => Ok(Self::ShadowHandOver),
            "ShadowHandCatchUnderarm" => Ok(Self::ShadowHandCatchUnderarm),
            _ => Err(SafepoError::UnknownTask(s.to_string())),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
