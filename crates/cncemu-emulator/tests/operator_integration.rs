use cncemu_emulator::{
    JogDirection, ModalOperator, OperatorCommand, OperatorEvent, OperatorStatus, Scene,
    SceneRecorder, VirtualCnc,
};
use cncemu_settings::{Config, JogSettings};
use glam::DVec3;

fn setup(source: &str) -> (VirtualCnc<SceneRecorder>, ModalOperator) {
    let mut config = Config::default();
    config.scene.scale = 1.0;
    config.jog = JogSettings {
        xy_step: 0.5,
        z_step: 0.3,
        speed: 0.25,
        tick_interval_ms: 100,
    };
    let operator = ModalOperator::new(config.jog.clone());
    let mut cnc = VirtualCnc::new(config, SceneRecorder::new());
    cnc.load_source(source).unwrap();
    (cnc, operator)
}

#[test]
fn test_jog_forward_reaches_target_and_syncs() {
    let (mut cnc, mut op) = setup("G00 X1");
    let status = op.execute(&mut cnc, OperatorCommand::Jog(JogDirection::Forward));
    assert_eq!(status, OperatorStatus::RunningModal);
    assert!(op.is_running());
    assert_eq!(op.reports().last().unwrap(), "Dir: fwd, Goal X: 0.5");

    // 0 -> 0.25 -> 0.5, then the tick that snaps and cancels
    assert_eq!(op.handle_event(&mut cnc, &OperatorEvent::Timer), OperatorStatus::PassThrough);
    assert_eq!(op.handle_event(&mut cnc, &OperatorEvent::Timer), OperatorStatus::PassThrough);
    assert_eq!(op.handle_event(&mut cnc, &OperatorEvent::Timer), OperatorStatus::Cancelled);

    assert!(!op.is_running());
    assert_eq!(cnc.scene().marker_location(), DVec3::new(0.5, 0.0, 0.0));
    assert_eq!(cnc.location(), DVec3::new(0.5, 0.0, 0.0));
}

#[test]
fn test_jog_down_overshoot_snaps_to_target() {
    let (mut cnc, mut op) = setup("G00 X1");
    op.execute(&mut cnc, OperatorCommand::Jog(JogDirection::Down));
    // -0.25, -0.5 (past -0.3), then snap
    op.handle_event(&mut cnc, &OperatorEvent::Timer);
    op.handle_event(&mut cnc, &OperatorEvent::Timer);
    let status = op.handle_event(&mut cnc, &OperatorEvent::Timer);
    assert_eq!(status, OperatorStatus::Cancelled);
    assert_eq!(cnc.scene().marker_location().z, -0.3);
}

#[test]
fn test_escape_and_right_mouse_cancel() {
    let (mut cnc, mut op) = setup("G00 X1");
    op.execute(&mut cnc, OperatorCommand::Jog(JogDirection::Left));
    assert_eq!(op.handle_event(&mut cnc, &OperatorEvent::Escape), OperatorStatus::Cancelled);
    assert!(!op.is_running());

    op.execute(&mut cnc, OperatorCommand::Play);
    assert_eq!(op.handle_event(&mut cnc, &OperatorEvent::RightMouse), OperatorStatus::Cancelled);
}

#[test]
fn test_other_events_pass_through() {
    let (mut cnc, mut op) = setup("G00 X1");
    op.execute(&mut cnc, OperatorCommand::Play);
    let status = op.handle_event(&mut cnc, &OperatorEvent::Other("MOUSEMOVE".to_string()));
    assert_eq!(status, OperatorStatus::PassThrough);
    assert!(op.is_running());
}

#[test]
fn test_play_runs_until_finished() {
    let (mut cnc, mut op) = setup("G00 X1\nG00 Y1\nM02");
    assert_eq!(op.execute(&mut cnc, OperatorCommand::Play), OperatorStatus::RunningModal);

    let mut ticks = 0;
    while op.handle_event(&mut cnc, &OperatorEvent::Timer) != OperatorStatus::Cancelled {
        ticks += 1;
        assert!(ticks < 10, "play did not stop");
    }
    assert_eq!(ticks, 2);
    assert!(cnc.is_finished());
    assert!(op.reports().iter().any(|r| r.starts_with("Line 3")));
}

#[test]
fn test_next_and_reset_complete_immediately() {
    let (mut cnc, mut op) = setup("G00 X1\nG00 Y1");
    assert_eq!(op.execute(&mut cnc, OperatorCommand::Next), OperatorStatus::Cancelled);
    assert_eq!(cnc.current_statement(), 1);
    assert_eq!(cnc.scene().polyline().len(), 2);

    assert_eq!(op.execute(&mut cnc, OperatorCommand::Reset), OperatorStatus::Cancelled);
    assert_eq!(cnc.current_statement(), 0);
    assert!(!cnc.scene().has_polyline());
}

#[test]
fn test_next_after_finish_reports_error() {
    let (mut cnc, mut op) = setup("G00 X1");
    op.execute(&mut cnc, OperatorCommand::Next);
    op.take_reports();
    op.execute(&mut cnc, OperatorCommand::Next);
    assert_eq!(op.reports(), &["Program finished, reset required".to_string()]);
}

#[test]
fn test_stop() {
    let (mut cnc, mut op) = setup("G00 X1");
    op.execute(&mut cnc, OperatorCommand::Play);
    assert_eq!(op.execute(&mut cnc, OperatorCommand::Stop), OperatorStatus::Cancelled);
    let reports = op.take_reports();
    assert_eq!(&reports[reports.len() - 2..], &["Stopping".to_string(), "Dir: stop".to_string()]);
    assert!(op.reports().is_empty());
}
