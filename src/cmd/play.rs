use std::path::Path;

use clap::ValueEnum;
use cncemu::{
    Config, JogDirection, ModalOperator, OperatorCommand, OperatorEvent, OperatorStatus, Scene,
    SceneRecorder, VirtualCnc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Jog {
    Up,
    Down,
    Left,
    Right,
    Fwd,
    Bwd,
}

impl From<Jog> for JogDirection {
    fn from(jog: Jog) -> Self {
        match jog {
            Jog::Up => JogDirection::Up,
            Jog::Down => JogDirection::Down,
            Jog::Left => JogDirection::Left,
            Jog::Right => JogDirection::Right,
            Jog::Fwd => JogDirection::Forward,
            Jog::Bwd => JogDirection::Backward,
        }
    }
}

/// Deliver timer ticks until the operator cancels or the tick budget runs out
fn drive(
    op: &mut ModalOperator,
    cnc: &mut VirtualCnc<SceneRecorder>,
    realtime: bool,
    max_ticks: usize,
) -> usize {
    for tick in 0..max_ticks {
        if realtime {
            std::thread::sleep(op.tick_interval());
        }
        if op.handle_event(cnc, &OperatorEvent::Timer) == OperatorStatus::Cancelled {
            return tick + 1;
        }
    }
    op.handle_event(cnc, &OperatorEvent::Escape);
    max_ticks
}

pub fn run(
    file: &Path,
    config: Config,
    jogs: &[Jog],
    realtime: bool,
    max_ticks: usize,
) -> anyhow::Result<()> {
    let mut op = ModalOperator::new(config.jog.clone());
    let scene = SceneRecorder::named(config.scene.marker_name.as_str());
    let mut cnc = VirtualCnc::new(config, scene);
    cnc.load_file(file)?;

    // Jogging moves the marker; a reset then adopts it as the offset
    for &jog in jogs {
        op.execute(&mut cnc, OperatorCommand::Jog(jog.into()));
        drive(&mut op, &mut cnc, realtime, max_ticks);
    }
    if !jogs.is_empty() {
        op.execute(&mut cnc, OperatorCommand::Reset);
    }

    op.execute(&mut cnc, OperatorCommand::Play);
    let ticks = drive(&mut op, &mut cnc, realtime, max_ticks);

    let marker = cnc.scene().marker_location();
    println!(
        "{} after {} ticks; {} at {:.4}, {:.4}, {:.4}",
        cnc.message(),
        ticks,
        cnc.scene().marker_name(),
        marker.x,
        marker.y,
        marker.z
    );
    Ok(())
}
