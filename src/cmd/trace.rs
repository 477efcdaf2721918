use std::path::{Path, PathBuf};

use anyhow::Context;
use cncemu::{Config, SceneRecorder, SceneSnapshot, VirtualCnc};
use cncemu_emulator::polyline_to_svg;
use tracing::info;

pub struct TraceArgs {
    pub file: PathBuf,
    pub svg: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub move_object: bool,
    pub stock: bool,
}

pub fn run(args: TraceArgs, mut config: Config, config_file: &Path) -> anyhow::Result<()> {
    // Flags apply to this run only; the persisted settings stay as loaded
    let mut session = config.clone();
    if args.move_object {
        session.scene.move_object = true;
    }
    if args.stock {
        session.stock.enabled = true;
    }

    let scene = SceneRecorder::named(session.scene.marker_name.as_str());
    let mut cnc = VirtualCnc::new(session, scene);
    cnc.load_file(&args.file)
        .with_context(|| format!("loading {}", args.file.display()))?;
    let errors = cnc.draw_all()?;

    for error in &errors {
        eprintln!("error: {}", error);
    }
    println!("{}", cnc.message());
    println!(
        "{} polyline points, {} keyframes",
        cnc.scene().polyline().len(),
        cnc.scene().keyframes().len()
    );
    if let Some(stock) = cnc.stock() {
        println!("Stock remaining: {:.1}%", stock.remaining_fraction() * 100.0);
    }

    if let Some(svg_path) = &args.svg {
        std::fs::write(svg_path, polyline_to_svg(cnc.scene().polyline()))
            .with_context(|| format!("writing {}", svg_path.display()))?;
        info!("Wrote {}", svg_path.display());
    }
    if let Some(snapshot_path) = &args.snapshot {
        SceneSnapshot::capture(&cnc)
            .write_to(snapshot_path)
            .with_context(|| format!("writing {}", snapshot_path.display()))?;
        info!("Wrote {}", snapshot_path.display());
    }

    // Keep the recent files list current when a config file is in use
    if config_file.exists() {
        config.add_recent_file(args.file.clone());
        config
            .save_to_file(config_file)
            .with_context(|| format!("updating {}", config_file.display()))?;
    }
    Ok(())
}
