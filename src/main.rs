mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, play::Jog, trace::TraceArgs};
use cncemu::init_logging;

#[derive(Parser)]
#[command(
    name = "cncemu",
    about = "Virtual CNC: parse G-code, trace toolpaths, jog and play programs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: platform config directory)
    #[arg(long, global = true, env = "CNCEMU_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the statements of a program
    Parse { file: PathBuf },

    /// Run a program and list the paths it produces
    Paths {
        file: PathBuf,

        /// Merge collinear lines within this tolerance, program units
        #[arg(long)]
        reduce: Option<f64>,
    },

    /// Run length, extents, and travel of a program
    Stats { file: PathBuf },

    /// Trace a whole program into a scene
    Trace {
        file: PathBuf,

        /// Write the polyline as an SVG top view
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Write the traced scene as JSON
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Keyframe the marker instead of drawing a polyline
        #[arg(long)]
        move_object: bool,

        /// Carve a stock block along cutting moves
        #[arg(long)]
        stock: bool,
    },

    /// Drive the modal operator: optional jogs, then play the program
    Play {
        file: PathBuf,

        /// Jog the marker before playing; the program is then reset to it
        #[arg(long, value_enum)]
        jog: Vec<Jog>,

        /// Sleep for the tick interval between timer events
        #[arg(long)]
        realtime: bool,

        /// Give up after this many timer events
        #[arg(long, default_value_t = 100_000)]
        max_ticks: usize,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_file = cmd::config_path(cli.config.as_deref())?;
    let load = || cmd::load_config(Some(&config_file));

    match cli.command {
        Commands::Parse { file } => cmd::parse::run(&file, cli.json),
        Commands::Paths { file, reduce } => cmd::paths::run(&file, &load()?, reduce, cli.json),
        Commands::Stats { file } => cmd::stats::run(&file, &load()?, cli.json),
        Commands::Trace {
            file,
            svg,
            snapshot,
            move_object,
            stock,
        } => {
            let args = TraceArgs {
                file,
                svg,
                snapshot,
                move_object,
                stock,
            };
            cmd::trace::run(args, load()?, &config_file)
        }
        Commands::Play {
            file,
            jog,
            realtime,
            max_ticks,
        } => cmd::play::run(&file, load()?, &jog, realtime, max_ticks),
        Commands::Config { subcommand } => cmd::config::run(&config_file, subcommand, cli.json),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_json) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
    tracing::debug!(
        "cncemu {} ({} build, {})",
        env!("CARGO_PKG_VERSION"),
        cncemu::BUILD_PROFILE,
        cncemu::BUILD_DATE
    );

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
