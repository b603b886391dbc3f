use dpsim::{ScenarioConfig, Scenario, SettingsStore};
use dpsim::{run_2d, run_headless};
use dpsim::{bench_euler_step, bench_frame_speeds};

use clap::Parser;
use anyhow::{Context, Result};

use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file inside the crate's `scenarios` directory
    #[arg(short, default_value = "default.yaml")]
    file_name: String,

    /// Where user settings are persisted between sessions
    #[arg(short, long, default_value = "dpsim_settings.yaml")]
    settings: PathBuf,

    /// Step this many frames without a window, then exit
    #[arg(long)]
    headless: Option<u64>,

    /// Print integrator timings and exit
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let scenario_cfg = ScenarioConfig::from_yaml_file(&config_path)
        .with_context(|| format!("failed to load scenario {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.bench {
        bench_euler_step();
        bench_frame_speeds();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let store = SettingsStore::new(args.settings);

    match args.headless {
        Some(frames) => {
            // Saved settings belong to the interactive viewer
            let scenario = Scenario::build_scenario(scenario_cfg, &Default::default());
            let exit = run_headless(scenario, frames);
            if exit.is_error() {
                anyhow::bail!("headless run stopped early: {exit:?}");
            }
        }
        None => {
            let settings = store.load().unwrap_or_else(|e| {
                println!("ignoring settings file {}: {e}", store.path().display());
                Default::default()
            });
            let scenario = Scenario::build_scenario(scenario_cfg, &settings);
            run_2d(scenario, store);
        }
    }

    Ok(())
}
