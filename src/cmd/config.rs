use std::path::Path;

use anyhow::{bail, Context};
use clap::Subcommand;
use cncemu::Config;

use crate::output::print_json;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the settings in effect
    Show,
}

pub fn run(path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init { force } => init(path, force),
        ConfigSubcommand::Show => show(path, json),
    }
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default()
        .save_to_file(path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let config =
        Config::load_or_default(path).with_context(|| format!("loading {}", path.display()))?;
    if json {
        return print_json(&config);
    }

    println!("# {}", path.display());
    println!("scale               {}", config.scene.scale);
    println!("resolution          {}", config.scene.resolution);
    println!("move object         {}", config.scene.move_object);
    println!("marker              {}", config.scene.marker_name);
    println!(
        "jog                 xy {} / z {} / speed {} every {}ms",
        config.jog.xy_step, config.jog.z_step, config.jog.speed, config.jog.tick_interval_ms
    );
    println!("rapid speed         {} mm/s", config.machine.rapid_speed_mm);
    println!("tool change         {} s", config.machine.tool_change_seconds);
    println!("stock               {}", if config.stock.enabled { "enabled" } else { "disabled" });
    for file in &config.recent_files {
        println!("recent              {}", file.display());
    }
    Ok(())
}
