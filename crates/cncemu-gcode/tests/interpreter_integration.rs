use cncemu_core::{GcodeError, Units};
use cncemu_gcode::{
    parse_program, Code, DistanceMode, InterpreterOptions, MachineState, Plane, Segment,
};
use glam::DVec3;

const EPS: f64 = 1e-9;

fn unit_options() -> InterpreterOptions {
    InterpreterOptions {
        scale: 1.0,
        ..Default::default()
    }
}

fn run(source: &str) -> MachineState {
    let mut state = parse_program(source).start(unit_options());
    state.run_to_end().unwrap();
    state
}

fn assert_close(a: DVec3, b: DVec3) {
    assert!(a.distance(b) < 1e-6, "{:?} != {:?}", a, b);
}

#[test]
fn test_linear_moves_and_timeline() {
    let state = run("G00 X10\nG01 Y10 F60\nG01 X0");
    let paths = state.paths();
    assert_eq!(paths.len(), 3);

    assert!(paths[0].is_rapid());
    assert_eq!(paths[0].feed_rate, 25.0);
    assert!((paths[0].duration - 0.4).abs() < EPS);

    assert!(paths[1].is_cutting());
    assert_eq!(paths[1].feed_rate, 1.0);
    assert!((paths[1].duration - 10.0).abs() < EPS);
    assert!((paths[1].start_time - 0.4).abs() < EPS);

    assert!((paths[2].start_time - paths[1].end_time()).abs() < EPS);
    assert!((state.run_length() - 20.4).abs() < EPS);
    assert_close(state.position(), DVec3::new(0.0, 10.0, 0.0));
}

#[test]
fn test_scale_divides_positions_not_lengths() {
    let mut state = parse_program("G01 X500 F6000").start(InterpreterOptions::default());
    state.run_to_end().unwrap();
    let path = &state.paths()[0];
    assert_close(path.end_point().unwrap(), DVec3::new(0.5, 0.0, 0.0));
    assert!((path.length - 500.0).abs() < EPS);
    assert!((path.duration - 5.0).abs() < EPS);
}

#[test]
fn test_modal_motion_reuses_last_mode() {
    let state = run("G01 X1 F60\nY1\nZ-1");
    assert_eq!(state.paths().len(), 3);
    assert!(state.paths().iter().all(|p| !p.is_rapid()));
}

#[test]
fn test_axis_words_without_motion_mode() {
    let mut state = parse_program("X10").start(unit_options());
    let err = state.step().unwrap_err();
    assert!(matches!(err, GcodeError::InvalidSyntax { line_number: 1, .. }));
    assert!(state.is_finished());
}

#[test]
fn test_incremental_distance_mode() {
    let state = run("G91\nG01 X1 F60\nX1\nY2");
    assert_eq!(state.distance_mode(), DistanceMode::Incremental);
    assert_close(state.position(), DVec3::new(2.0, 2.0, 0.0));
}

#[test]
fn test_spindle_off_moves_at_rapid_speed() {
    let state = run("M05\nG01 X5 F60\nM03 S12000\nG01 X10");
    let paths = state.paths();
    assert!(!paths[0].spindle_on);
    assert_eq!(paths[0].feed_rate, 25.0);
    assert!(!paths[0].is_cutting());
    assert!(paths[1].spindle_on);
    assert_eq!(paths[1].feed_rate, 1.0);
    assert_eq!(state.spindle_speed(), 12000.0);
}

#[test]
fn test_quarter_arc_ccw() {
    let state = run("G00 X10 Y0\nG03 X0 Y10 I-10 J0 F600");
    let arc_path = &state.paths()[1];
    let Segment::Arc(arc) = &arc_path.segment else {
        panic!("expected arc, got {}", arc_path);
    };
    assert!(!arc.clockwise);
    assert_close(arc.center, DVec3::ZERO);
    assert!((arc.sweep - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    assert!((arc_path.length - 5.0 * std::f64::consts::PI).abs() < 1e-9);
    assert_close(
        arc.point_at(0.5),
        DVec3::new(10.0 * (std::f64::consts::FRAC_PI_4).cos(), 10.0 * (std::f64::consts::FRAC_PI_4).sin(), 0.0),
    );
}

#[test]
fn test_full_circle_and_helix() {
    let state = run("G00 X5\nG02 X5 Y0 Z-2 I-5 J0 F60");
    let Segment::Arc(arc) = &state.paths()[1].segment else {
        panic!("expected arc");
    };
    assert!((arc.sweep + std::f64::consts::TAU).abs() < 1e-9);
    assert!((arc.helix + 2.0).abs() < EPS);
    assert_close(arc.point_at(1.0), DVec3::new(5.0, 0.0, -2.0));
}

#[test]
fn test_radius_format_arc() {
    let state = run("G00 X0 Y0\nG02 X10 Y0 R5 F60");
    let Segment::Arc(arc) = &state.paths()[1].segment else {
        panic!("expected arc");
    };
    assert_close(arc.center, DVec3::new(5.0, 0.0, 0.0));
    assert!((arc.radius - 5.0).abs() < 1e-6);
}

#[test]
fn test_arc_planes() {
    let state = run("G18\nG00 X0 Z10\nG03 X10 Z0 K-10 I0 F60");
    assert_eq!(state.plane(), Plane::ZX);
    let Segment::Arc(arc) = &state.paths()[1].segment else {
        panic!("expected arc");
    };
    assert_eq!(arc.plane, Plane::ZX);
    assert_close(arc.center, DVec3::ZERO);
    // Stays on the circle in the XZ plane
    let mid = arc.point_at(0.5);
    assert!((mid.length() - 10.0).abs() < 1e-6);
    assert!(mid.y.abs() < EPS);
}

#[test]
fn test_arc_without_offsets() {
    let mut state = parse_program("G02 X10 Y0").start(unit_options());
    let err = state.step().unwrap_err();
    assert_eq!(
        err,
        GcodeError::MissingParameter {
            line_number: 1,
            param: 'I'
        }
    );
}

#[test]
fn test_dwell_and_tool_change() {
    let state = run("T3\nM06\nG04 P2.5");
    let paths = state.paths();
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].segment, Segment::ToolChange { tool: Some(3) });
    assert_eq!(paths[0].duration, 3.0);
    assert_eq!(paths[1].segment, Segment::Dwell { seconds: 2.5 });
    assert!((state.run_length() - 5.5).abs() < EPS);
}

#[test]
fn test_end_of_program_stops_execution() {
    let state = run("G01 X1 F60\nM02\nG01 X2");
    assert!(state.is_finished());
    assert_eq!(state.paths().len(), 1);
    assert_eq!(state.program_counter(), 2);

    let state = run("G01 X1 F60\nM30\nG01 X2");
    assert_eq!(state.paths().len(), 1);
}

#[test]
fn test_unknown_codes_recorded_once() {
    let state = run("G05\nM99\nG05\nG21");
    assert_eq!(state.unknown_codes(), &[Code::g(5), Code::m(99)]);
}

#[test]
fn test_parameters_and_expressions() {
    let state = run("#1 = 4\n#<half> = [#1 / 2]\nG01 X[#1 * 2] Y#<half> F[#1 * 15]");
    assert_eq!(state.variable("#<HALF>"), Some(2.0));
    assert_eq!(state.feed_rate(), 1.0);
    assert_close(state.position(), DVec3::new(8.0, 2.0, 0.0));
}

#[test]
fn test_expression_error_carries_line_number() {
    let mut state = parse_program("G01 X1 F60\nG01 X#9").start(unit_options());
    state.step().unwrap();
    let err = state.step().unwrap_err();
    assert_eq!(err.line_number(), 2);
    assert!(matches!(err, GcodeError::InvalidExpression { .. }));
    assert!(state.is_finished());
}

#[test]
fn test_inch_units() {
    let state = run("G20\nG00 X1");
    assert_eq!(state.units(), Units::Inch);
    assert!((state.paths()[0].feed_rate - 25.0 / 25.4).abs() < EPS);
}

#[test]
fn test_step_reports_path_ranges() {
    let mut state = parse_program("G21\nG01 X1 F60\nT1 M06").start(unit_options());
    let first = state.step().unwrap().unwrap();
    assert!(!first.produced_paths());
    let second = state.step().unwrap().unwrap();
    assert_eq!(second.paths, 0..1);
    assert_eq!(second.line_number, 2);
    let third = state.step().unwrap().unwrap();
    assert_eq!(third.paths, 1..2);
    assert!(state.step().unwrap().is_none());
}

#[test]
fn test_bounds_include_arc_bulge() {
    let state = run("G00 X10\nG03 X-10 Y0 I-10 J0 F60");
    let (w, h, _) = state.bounds().size().unwrap();
    assert!((w - 20.0).abs() < 1e-6);
    assert!(h > 9.0);
}

#[test]
fn test_rewind_resets_state() {
    let mut state = run("G91\nG01 X1 F60");
    state.rewind();
    assert_eq!(state.program_counter(), 0);
    assert!(state.paths().is_empty());
    assert_eq!(state.distance_mode(), DistanceMode::Absolute);
    assert_eq!(state.position(), DVec3::ZERO);
}

#[test]
fn test_tool_number_out_of_range() {
    let mut state = parse_program("T4294967295\nT4294967296\nT-1\nT2.5").start(unit_options());
    state.step().unwrap();
    assert_eq!(state.tool(), Some(u32::MAX));

    for line_number in 2..=4 {
        let err = state.step().unwrap_err();
        assert!(matches!(
            err,
            GcodeError::InvalidParameter { param: 'T', .. }
        ));
        assert_eq!(err.line_number(), line_number);
    }
    assert_eq!(state.tool(), Some(u32::MAX));
}
