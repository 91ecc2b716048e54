use anyhow::Result;
use clap::Parser;
use log::info;
use safepo::config::{build_multi_agent_config, MultiAgentArgs, PythonSimulator};
use std::{fs, path::PathBuf};

/// Builds the configuration of a multi-agent training run
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Algorithm, selects `<cfg-dir>/<algo>/config.yaml`
    #[arg(long, default_value = "mappo")]
    algo: String,

    /// Directory the configs are written to; printed to stdout when omitted
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Python interpreter used to look for the simulator
    #[arg(long, default_value = "python")]
    python: String,

    #[command(flatten)]
    run: MultiAgentArgs,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let simulator = PythonSimulator {
        interpreter: args.python.clone(),
        ..PythonSimulator::default()
    };
    let config = build_multi_agent_config(&args.algo, &args.run, &simulator)?;

    match &args.out_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            config.cfg_train.save(dir.join("cfg_train.yaml"))?;
            config.cfg_env.save(dir.join("cfg_env.yaml"))?;
            if let Some(sim_params) = &config.sim_params {
                sim_params.save(dir.join("sim_params.yaml"))?;
            }
            info!("Saved configs of {} to {}", config.task, dir.display());
        }
        None => {
            println!("# cfg_train\n{}", config.cfg_train.to_yaml()?);
            println!("# cfg_env\n{}", config.cfg_env.to_yaml()?);
            if let Some(sim_params) = &config.sim_params {
                println!("# sim_params\n{}", sim_params.to_yaml()?);
            }
        }
    }
    Ok(())
}
