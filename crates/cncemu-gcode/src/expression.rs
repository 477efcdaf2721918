//! Arithmetic on word values and parameter assignments
//!
//! Supports numbers, `#n` / `#<name>` parameters, `[ ]` grouping, unary sign
//! and the four binary operators with the usual precedence.

use std::collections::HashMap;

use thiserror::Error;

/// Parameter table keyed by the full reference (`#1`, `#<DEPTH>`)
pub type Variables = HashMap<String, f64>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("undefined parameter {0}")]
    UndefinedParameter(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unexpected '{0}'")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Parameter(String),
    Op(char),
    Open,
    Close,
}

/// Evaluate an expression against the parameter table.
///
/// An empty expression evaluates to `0`.
pub fn evaluate(expression: &str, variables: &Variables) -> Result<f64, ExpressionError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Ok(0.0);
    }

    let mut parser = Evaluator {
        tokens: &tokens,
        pos: 0,
        variables,
    };
    let value = parser.sum()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(value),
        Some(token) => Err(ExpressionError::UnexpectedToken(describe(token))),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => n.to_string(),
        Token::Parameter(name) => name.clone(),
        Token::Op(op) => op.to_string(),
        Token::Open => "[".to_string(),
        Token::Close => "]".to_string(),
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '[' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ']' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '#' => {
                let start = i;
                i += 1;
                if chars.get(i) == Some(&'<') {
                    while i < chars.len() && chars[i] != '>' {
                        i += 1;
                    }
                    if i >= chars.len() {
                        return Err(ExpressionError::UnexpectedEnd);
                    }
                    i += 1;
                } else {
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let name: String = chars[start..i].iter().collect();
                if name.len() == 1 {
                    return Err(ExpressionError::UnexpectedToken(name));
                }
                tokens.push(Token::Parameter(name.to_uppercase()));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExpressionError::InvalidNumber(text.clone()))?;
                tokens.push(Token::Number(value));
            }
            other => return Err(ExpressionError::UnexpectedToken(other.to_string())),
        }
    }

    Ok(tokens)
}

struct Evaluator<'a> {
    tokens: &'a [Token],
    pos: usize,
    variables: &'a Variables,
}

impl Evaluator<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn sum(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.product()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.product()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn product(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.unary()?;
            value = if op == '*' {
                value * rhs
            } else {
                if rhs == 0.0 {
                    return Err(ExpressionError::DivisionByZero);
                }
                value / rhs
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, ExpressionError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<f64, ExpressionError> {
        let variables = self.variables;
        match self.next().cloned() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Parameter(name)) => variables
                .get(&name)
                .copied()
                .ok_or(ExpressionError::UndefinedParameter(name)),
            Some(Token::Open) => {
                let value = self.sum()?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    Some(token) => Err(ExpressionError::UnexpectedToken(describe(token))),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some(token) => Err(ExpressionError::UnexpectedToken(describe(&token))),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }
}
