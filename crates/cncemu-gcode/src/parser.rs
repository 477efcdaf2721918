//! Line-oriented G-Code program parser
//!
//! Splits a program into [`Statement`]s. Lines that cannot be understood are
//! collected in [`Program::invalid_lines`] and skipped; parsing never aborts
//! half way through a file.

use std::path::Path;

use cncemu_core::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::statement::{Block, Code, InvalidLine, Statement, StatementKind, Word};

/// A parsed program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub invalid_lines: Vec<InvalidLine>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }
}

/// Parse a program from source text
pub fn parse_program(source: &str) -> Program {
    let mut program = Program::default();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_number = idx + 1;
        let (text, comment) = split_comment(raw_line);

        match parse_statement(&text) {
            Ok(kind) => {
                let index = program.statements.len();
                program.statements.push(Statement {
                    index,
                    line_number,
                    text,
                    comment,
                    kind,
                });
            }
            Err(reason) => {
                warn!("Skipping line {}: {} ({:?})", line_number, reason, raw_line);
                program.invalid_lines.push(InvalidLine {
                    line_number,
                    text: raw_line.trim().to_string(),
                    reason,
                });
            }
        }
    }

    debug!(
        "Parsed {} statements, {} invalid lines",
        program.statements.len(),
        program.invalid_lines.len()
    );
    program
}

/// Read and parse a program file
pub fn parse_file(path: &Path) -> Result<Program> {
    let source = std::fs::read_to_string(path)?;
    debug!("Loaded {} ({} bytes)", path.display(), source.len());
    Ok(parse_program(&source))
}

/// Separate the code portion of a line from its `( … )` and `;` comments
fn split_comment(line: &str) -> (String, Option<String>) {
    static COMMENT_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let regex = COMMENT_REGEX
        .get_or_init(|| Regex::new(r"\([^)]*\)?|;.*").expect("invalid regex pattern"));

    let comments: Vec<&str> = regex.find_iter(line).map(|m| m.as_str().trim()).collect();
    let code = regex.replace_all(line, " ");
    let code = code.split_whitespace().collect::<Vec<_>>().join(" ");

    let comment = if comments.is_empty() {
        None
    } else {
        Some(comments.join(" "))
    };
    (code, comment)
}

fn parse_statement(text: &str) -> std::result::Result<StatementKind, String> {
    if text.is_empty() {
        return Ok(StatementKind::Blank);
    }
    if text == "%" {
        return Ok(StatementKind::ProgramMarker);
    }
    if text.starts_with('#') {
        return parse_assignment(text);
    }

    let mut block = Block::default();
    for (letter, value) in tokenize_words(&text.to_uppercase())? {
        match letter {
            'G' | 'M' => {
                let code = Code::parse(letter, &value)
                    .ok_or_else(|| format!("Invalid command number '{}{}'", letter, value))?;
                block.codes.push(code);
            }
            // Sequence numbers carry no meaning for the interpreter
            'N' => {}
            _ => block.words.push(Word { letter, value }),
        }
    }
    Ok(StatementKind::Block(block))
}

fn parse_assignment(text: &str) -> std::result::Result<StatementKind, String> {
    static NAME_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let regex =
        NAME_REGEX.get_or_init(|| Regex::new(r"^#(\d+|<[^>]+>)$").expect("invalid regex pattern"));

    let (name, expression) = text
        .split_once('=')
        .ok_or_else(|| "Assignment is missing '='".to_string())?;
    let name = name.trim().to_uppercase();
    let expression = expression.trim();

    if !regex.is_match(&name) {
        return Err(format!("Invalid parameter name '{}'", name));
    }
    if expression.is_empty() {
        return Err(format!("Assignment to {} has no value", name));
    }

    Ok(StatementKind::Assignment {
        name,
        expression: expression.to_uppercase(),
    })
}

/// Split a code line into `(letter, raw value)` pairs.
///
/// A value may be separated from its letter by whitespace (`X 10`), and may
/// be a parameter reference (`#3`, `#<depth>`) or a bracketed expression.
fn tokenize_words(text: &str) -> std::result::Result<Vec<(char, String)>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut words = Vec::new();
    let mut i = 0;

    loop {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        let letter = chars[i];
        if !letter.is_ascii_alphabetic() {
            return Err(format!("Unexpected character '{}'", letter));
        }
        i += 1;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }

        let start = i;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() || c.is_ascii_alphabetic() {
                break;
            }
            match c {
                '[' => i = skip_brackets(&chars, i)?,
                '#' => i = skip_parameter(&chars, i)?,
                _ => i += 1,
            }
        }

        let value: String = chars[start..i].iter().collect();
        if value.is_empty() {
            return Err(format!("Missing value for '{}'", letter));
        }
        words.push((letter, value));
    }

    Ok(words)
}

/// Index just past the bracket group opening at `open`
fn skip_brackets(chars: &[char], open: usize) -> std::result::Result<usize, String> {
    let mut depth = 0usize;
    for (offset, c) in chars[open..].iter().enumerate() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + offset + 1);
                }
            }
            _ => {}
        }
    }
    Err("Unbalanced '['".to_string())
}

/// Index just past the parameter reference starting at `hash`
fn skip_parameter(chars: &[char], hash: usize) -> std::result::Result<usize, String> {
    let mut i = hash + 1;
    if chars.get(i) == Some(&'<') {
        while i < chars.len() && chars[i] != '>' {
            i += 1;
        }
        if i >= chars.len() {
            return Err("Unterminated parameter name".to_string());
        }
        return Ok(i + 1);
    }
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    Ok(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_comment() {
        let (code, comment) = split_comment("G01 X10 (move right) Y5 ; trailing");
        assert_eq!(code, "G01 X10 Y5");
        assert_eq!(comment.as_deref(), Some("(move right) ; trailing"));

        let (code, comment) = split_comment("(unterminated");
        assert_eq!(code, "");
        assert_eq!(comment.as_deref(), Some("(unterminated"));
    }

    #[test]
    fn test_tokenize_split_and_joined_values() {
        let words = tokenize_words("G1 X 10 Y-2.5Z[#1*2] F#<feed>").unwrap();
        assert_eq!(
            words,
            vec![
                ('G', "1".to_string()),
                ('X', "10".to_string()),
                ('Y', "-2.5".to_string()),
                ('Z', "[#1*2]".to_string()),
                ('F', "#<feed>".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(tokenize_words("G01 X").is_err());
        assert!(tokenize_words("X[1+2").is_err());
        assert!(tokenize_words("G01 $10").is_err());
    }

    #[test]
    fn test_assignment_parsing() {
        assert_eq!(
            parse_statement("#1 = 5*2").unwrap(),
            StatementKind::Assignment {
                name: "#1".to_string(),
                expression: "5*2".to_string()
            }
        );
        assert_eq!(
            parse_statement("#<depth>=-1").unwrap(),
            StatementKind::Assignment {
                name: "#<DEPTH>".to_string(),
                expression: "-1".to_string()
            }
        );
        assert!(parse_statement("#1 5").is_err());
        assert!(parse_statement("#x = 5").is_err());
        assert!(parse_statement("#1 =").is_err());
    }
}
