use std::io::Write;

use cncemu_core::Error;
use cncemu_gcode::{parse_file, parse_program, Code, StatementKind};

const SQUARE: &str = "%
(square pocket)
G21 G90 G17
#1 = 10
G00 Z5
G00 X0 Y0
G01 Z-1 F120 ; plunge
X#1
Y[#1]
X0
Y0
G00 Z5
M30
%
";

#[test]
fn test_parse_square_program() {
    let program = parse_program(SQUARE);
    assert!(program.invalid_lines.is_empty());
    assert_eq!(program.len(), 14);

    assert_eq!(program.statements[0].kind, StatementKind::ProgramMarker);
    assert_eq!(program.statements[1].kind, StatementKind::Blank);
    assert_eq!(program.statements[1].comment.as_deref(), Some("(square pocket)"));

    let setup = program.statements[2].block().unwrap();
    assert_eq!(setup.codes, vec![Code::g(21), Code::g(90), Code::g(17)]);

    let plunge = &program.statements[6];
    assert_eq!(plunge.line_number, 7);
    assert_eq!(plunge.summary(), "G01 Z-1 F120");
    assert_eq!(plunge.comment.as_deref(), Some("; plunge"));

    let modal = program.statements[7].block().unwrap();
    assert!(modal.codes.is_empty());
    assert_eq!(modal.word('X'), Some("#1"));
}

#[test]
fn test_invalid_lines_are_skipped() {
    let program = parse_program("G01 X1\nG01 X\n$$\nGxx\nG01 Y2");
    assert_eq!(program.len(), 2);
    assert_eq!(program.invalid_lines.len(), 3);
    assert_eq!(
        program
            .invalid_lines
            .iter()
            .map(|l| l.line_number)
            .collect::<Vec<_>>(),
        vec![2, 3, 4]
    );
    assert_eq!(program.statements[1].line_number, 5);
    assert_eq!(program.statements[1].index, 1);
}

#[test]
fn test_lowercase_and_sequence_numbers() {
    let program = parse_program("n10 g1 x5 y-2");
    let block = program.statements[0].block().unwrap();
    assert_eq!(block.codes, vec![Code::g(1)]);
    assert_eq!(block.word('X'), Some("5"));
    assert!(!block.has_word('N'));
}

#[test]
fn test_parse_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "G00 X1 Y1").unwrap();
    writeln!(file, "M02").unwrap();

    let program = parse_file(file.path()).unwrap();
    assert_eq!(program.len(), 2);
}

#[test]
fn test_parse_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = parse_file(&dir.path().join("missing.ngc")).unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    assert!(!err.is_gcode_error());
}
