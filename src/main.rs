use circlesim::{EngineConfig, Scenario, ScenarioConfig, Rgb};
use circlesim::configuration::config::load_materials;
use circlesim::run_sandbox;

use clap::Parser;
use anyhow::{Context, Result};

use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file under `scenarios/`; starts with an empty sandbox if omitted
    #[arg(short, long)]
    file_name: Option<String>,

    /// Custom materials file (YAML list); loaded at start, rewritten on save
    #[arg(long)]
    materials: Option<PathBuf>,

    /// Where the save key writes the current scenario
    #[arg(long, default_value = "saved_scenario.yaml")]
    save_as: String,
}

fn scenarios_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios")
}

// load here to keep main clean
fn load_scenario(args: &Args) -> Result<Scenario> {
    let mut scenario = match &args.file_name {
        Some(file_name) => {
            let path = scenarios_dir().join(file_name);
            let cfg = ScenarioConfig::from_yaml_path(&path)?;
            Scenario::build_scenario(cfg).with_context(|| format!("building scenario {}", path.display()))?
        }
        None => Scenario::empty(EngineConfig::default()),
    };

    // a materials file that does not exist yet is created by the first save
    if let Some(path) = args.materials.as_ref().filter(|p| p.exists()) {
        for m in load_materials(path)? {
            scenario.materials.insert_named(m.name, m.density, Rgb::from(m.colour));
        }
    }

    Ok(scenario)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let scenario = load_scenario(&args)?;

    run_sandbox(scenario, scenarios_dir().join(&args.save_as), args.materials.clone());

    Ok(())
}
