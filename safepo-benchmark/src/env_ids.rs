//! Environments and algorithms benchmarked by default.

/// Robots of the navigation tasks.
pub const NAVIGATION_ROBOTS: [&str; 3] = ["Car", "Point", "Racecar"];

/// Navigation tasks.
pub const NAVIGATION_TASKS: [&str; 4] = ["Button", "Circle", "Goal", "Push"];

/// Difficulty levels of the navigation tasks.
pub const DIFFICULTIES: [&str; 2] = ["1", "2"];

/// Robots of the velocity tasks.
pub const VELOCITY_ROBOTS: [&str; 6] = ["Ant", "HalfCheetah", "Hopper", "Walker2d", "Swimmer", "Humanoid"];

/// Training scripts benchmarked by default.
pub const DEFAULT_ALGOS: [&str; 8] = [
    "pcpo", "ppo_lag", "cup", "focops", "rcpo", "trpo_lag", "cpo", "cppo_pid",
];

/// Navigation env ids, ordered by difficulty, robot and task.
pub fn navigation_envs() -> Vec<String> {
    let mut envs = vec![];
    for difficulty in DIFFICULTIES.iter() {
        for robot in NAVIGATION_ROBOTS.iter() {
            for task in NAVIGATION_TASKS.iter() {
                envs.push(format!("Safety{}{}{}-v0", robot, task, difficulty));
            }
        }
    }
    envs
}

/// Velocity env ids.
pub fn velocity_envs() -> Vec<String> {
    VELOCITY_ROBOTS
        .iter()
        .map(|robot| format!("Safety{}Velocity-v1", robot))
        .collect()
}

/// Navigation envs followed by velocity envs.
pub fn default_env_ids() -> Vec<String> {
    let mut envs = navigation_envs();
    envs.extend(velocity_envs());
    envs
}

/// [`DEFAULT_ALGOS`] as owned strings.
pub fn default_algos() -> Vec<String> {
    DEFAULT_ALGOS.iter().map(|s| s.to_string()).collect()
}
