//! Reverse-Polish curves over the note frequency.
//!
//! `["x", 440, "/", 0.5, "*"]` is `x / 440 * 0.5`. Expressions are checked
//! when the patch is built, so evaluation cannot fail.

use serde_json::Value;

use crate::error::{Result, SynthError};
use crate::graph::pluck::Curve;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Constant(f64),
    Variable,
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    tokens: Vec<Token>,
}

impl Expression {
    pub fn parse(items: &[Value]) -> Result<Self> {
        let tokens = items.iter().map(token).collect::<Result<Vec<_>>>()?;

        let mut depth = 0usize;
        for (position, tok) in tokens.iter().enumerate() {
            match tok {
                Token::Constant(_) | Token::Variable => depth += 1,
                _ if depth < 2 => {
                    return Err(SynthError::InvalidExpression(format!(
                        "operator at position {position} needs two operands"
                    )))
                }
                _ => depth -= 1,
            }
        }
        if depth != 1 {
            return Err(SynthError::InvalidExpression(format!(
                "expression leaves {depth} values on the stack"
            )));
        }
        Ok(Self { tokens })
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let mut stack: Vec<f64> = Vec::with_capacity(self.tokens.len());
        for tok in &self.tokens {
            let value = match tok {
                Token::Constant(c) => *c,
                Token::Variable => x,
                op => {
                    // Depth was checked in parse
                    let right = stack.pop().unwrap_or(0.0);
                    let left = stack.pop().unwrap_or(0.0);
                    match op {
                        Token::Add => left + right,
                        Token::Subtract => left - right,
                        Token::Multiply => left * right,
                        _ => left / right,
                    }
                }
            };
            stack.push(value);
        }
        stack.pop().unwrap_or(0.0)
    }

    pub fn into_curve(self) -> Curve {
        Box::new(move |x| self.evaluate(x))
    }
}

fn token(item: &Value) -> Result<Token> {
    match item {
        Value::Number(n) => n
            .as_f64()
            .map(Token::Constant)
            .ok_or_else(|| SynthError::InvalidExpression(format!("unrepresentable number {n}"))),
        Value::String(s) => Ok(match s.as_str() {
            "x" => Token::Variable,
            "+" => Token::Add,
            "-" => Token::Subtract,
            "*" => Token::Multiply,
            "/" => Token::Divide,
            other => Token::Constant(
                other
                    .parse()
                    .map_err(|_| SynthError::InvalidExpression(format!("unknown token \"{other}\"")))?,
            ),
        }),
        other => Err(SynthError::InvalidExpression(format!("unexpected {other}"))),
    }
}
