//! Parsed G-Code statements

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `G` or `M` command word, normalised to two digits (`G1` -> `G01`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Code {
    /// Command letter, `G` or `M`
    pub letter: char,
    /// Major command number
    pub number: u16,
    /// Decimal sub-command (`G61.1` -> 1), 0 when absent
    pub minor: u8,
}

impl Code {
    pub const fn new(letter: char, number: u16) -> Self {
        Self {
            letter,
            number,
            minor: 0,
        }
    }

    pub const fn g(number: u16) -> Self {
        Self::new('G', number)
    }

    pub const fn m(number: u16) -> Self {
        Self::new('M', number)
    }

    /// Parse the numeric part of a code word (`"1"`, `"01"`, `"61.1"`)
    pub fn parse(letter: char, digits: &str) -> Option<Self> {
        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (digits, None),
        };
        let number = major.parse::<u16>().ok()?;
        let minor = match minor {
            Some(m) => m.parse::<u8>().ok()?,
            None => 0,
        };
        Some(Self {
            letter,
            number,
            minor,
        })
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.letter, self.number)?;
        if self.minor != 0 {
            write!(f, ".{}", self.minor)?;
        }
        Ok(())
    }
}

/// A non-command address word, e.g. `X10.5`, `F[#1*2]`
///
/// The value is kept as raw text and evaluated at execution time,
/// because it may reference parameters assigned earlier in the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub letter: char,
    pub value: String,
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.value)
    }
}

/// Commands and words of a single program line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub codes: Vec<Code>,
    pub words: Vec<Word>,
}

impl Block {
    /// Raw value of the last word with the given letter
    pub fn word(&self, letter: char) -> Option<&str> {
        self.words
            .iter()
            .rev()
            .find(|w| w.letter == letter)
            .map(|w| w.value.as_str())
    }

    pub fn has_word(&self, letter: char) -> bool {
        self.words.iter().any(|w| w.letter == letter)
    }

    pub fn has_code(&self, code: Code) -> bool {
        self.codes.contains(&code)
    }

    /// Whether the block names any linear axis
    pub fn has_axis_words(&self) -> bool {
        self.words.iter().any(|w| matches!(w.letter, 'X' | 'Y' | 'Z'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    /// Empty or comment-only line
    Blank,
    /// `%` tape marker
    ProgramMarker,
    /// `#name = expression`
    Assignment { name: String, expression: String },
    Block(Block),
}

/// One line of a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Position within `Program::statements`
    pub index: usize,
    /// 1-based line in the source text
    pub line_number: usize,
    /// Code portion of the line with comments removed
    pub text: String,
    pub comment: Option<String>,
    pub kind: StatementKind,
}

impl Statement {
    /// One-line description used for status display, e.g. `G01 X10 Y5`
    pub fn summary(&self) -> String {
        match &self.kind {
            StatementKind::Blank => String::new(),
            StatementKind::ProgramMarker => "%".to_string(),
            StatementKind::Assignment { name, expression } => format!("{} = {}", name, expression),
            StatementKind::Block(block) => {
                let parts: Vec<String> = block
                    .codes
                    .iter()
                    .map(Code::to_string)
                    .chain(block.words.iter().map(Word::to_string))
                    .collect();
                parts.join(" ")
            }
        }
    }

    pub fn block(&self) -> Option<&Block> {
        match &self.kind {
            StatementKind::Block(block) => Some(block),
            _ => None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.line_number, self.summary())?;
        if let Some(comment) = &self.comment {
            write!(f, " {}", comment)?;
        }
        Ok(())
    }
}

/// A source line rejected by the parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidLine {
    pub line_number: usize,
    pub text: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_normalisation() {
        assert_eq!(Code::parse('G', "1").unwrap().to_string(), "G01");
        assert_eq!(Code::parse('M', "02").unwrap().to_string(), "M02");
        assert_eq!(Code::parse('G', "61.1").unwrap().to_string(), "G61.1");
        assert_eq!(Code::parse('G', "112").unwrap().to_string(), "G112");
        assert!(Code::parse('G', "x").is_none());
        assert!(Code::parse('G', "").is_none());
    }

    #[test]
    fn test_block_word_lookup_uses_last() {
        let block = Block {
            codes: vec![Code::g(1)],
            words: vec![
                Word {
                    letter: 'X',
                    value: "1".into(),
                },
                Word {
                    letter: 'X',
                    value: "2".into(),
                },
            ],
        };
        assert_eq!(block.word('X'), Some("2"));
        assert!(block.has_axis_words());
        assert!(block.has_code(Code::g(1)));
        assert!(!block.has_word('F'));
    }
}
