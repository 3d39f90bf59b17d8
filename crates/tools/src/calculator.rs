//! Calculator tool — evaluates arithmetic expressions.
//!
//! Grammar: `+ - * / %`, `^` (right-associative), parentheses, unary minus,
//! and decimal literals. Evaluation is precedence climbing directly over
//! the input characters.

use std::iter::Peekable;
use std::str::CharIndices;

use async_trait::async_trait;
use foundry_core::error::ToolError;
use foundry_core::tool::{Tool, ToolResult};
use thiserror::Error;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Supports + - * / % ^, parentheses, and decimals."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Expression to evaluate, e.g. '25 * 4 + 10'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let expr = arguments["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'expression' argument".into()))?;

        let value = evaluate(expr).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })?;

        Ok(ToolResult {
            output: format_number(value),
            data: Some(serde_json::json!({ "result": value })),
        })
    }
}

/// Integers print without a fractional part.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected '{found}' at position {pos}")]
    Unexpected { found: char, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression nests too deeply")]
    TooDeep,
}

/// Bound on nested parentheses, signs and `^` chains.
pub const MAX_NESTING: usize = 256;

/// Evaluate an arithmetic expression.
pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    let mut eval = Evaluator {
        chars: expr.char_indices().peekable(),
        src: expr,
        depth: 0,
    };
    eval.skip_ws();
    if eval.chars.peek().is_none() {
        return Err(CalcError::Empty);
    }
    let value = eval.binary(0)?;
    eval.skip_ws();
    if let Some(&(pos, found)) = eval.chars.peek() {
        return Err(CalcError::Unexpected { found, pos });
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite)
    }
}

struct Evaluator<'a> {
    chars: Peekable<CharIndices<'a>>,
    src: &'a str,
    depth: usize,
}

/// Binding power and right-associativity of a binary operator.
fn binding(op: char) -> Option<(u8, bool)> {
    match op {
        '+' | '-' => Some((1, false)),
        '*' | '/' | '%' => Some((2, false)),
        '^' => Some((3, true)),
        _ => None,
    }
}

impl Evaluator<'_> {
    fn skip_ws(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    /// Run `f` one nesting level down.
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Result<f64, CalcError>) -> Result<f64, CalcError> {
        if self.depth >= MAX_NESTING {
            return Err(CalcError::TooDeep);
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn binary(&mut self, min_power: u8) -> Result<f64, CalcError> {
        self.nested(|eval| eval.binary_inner(min_power))
    }

    fn binary_inner(&mut self, min_power: u8) -> Result<f64, CalcError> {
        let mut lhs = self.unary()?;
        loop {
            self.skip_ws();
            let Some(&(_, op)) = self.chars.peek() else { break };
            let Some((power, right_assoc)) = binding(op) else { break };
            if power < min_power {
                break;
            }
            self.chars.next();
            let next_min = if right_assoc { power } else { power + 1 };
            let rhs = self.binary(next_min)?;
            lhs = match op {
                '+' => lhs + rhs,
                '-' => lhs - rhs,
                '*' => lhs * rhs,
                '/' if rhs == 0.0 => return Err(CalcError::DivisionByZero),
                '/' => lhs / rhs,
                '%' if rhs == 0.0 => return Err(CalcError::DivisionByZero),
                '%' => lhs % rhs,
                _ => lhs.powf(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        self.skip_ws();
        match self.chars.peek().copied() {
            Some((_, '-')) => {
                self.chars.next();
                // Binds looser than '^': -2^2 == -4
                Ok(-self.binary(3)?)
            }
            Some((_, '+')) => {
                self.chars.next();
                self.nested(Self::unary)
            }
            Some((_, '(')) => {
                self.chars.next();
                let value = self.binary(0)?;
                self.skip_ws();
                match self.chars.next() {
                    Some((_, ')')) => Ok(value),
                    Some((pos, found)) => Err(CalcError::Unexpected { found, pos }),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some((start, c)) if c.is_ascii_digit() || c == '.' => {
                let mut end = start;
                while let Some((i, c)) = self.chars.next_if(|(_, c)| c.is_ascii_digit() || *c == '.') {
                    end = i + c.len_utf8();
                }
                let literal = &self.src[start..end];
                literal
                    .parse()
                    .map_err(|_| CalcError::InvalidNumber(literal.to_string()))
            }
            Some((pos, found)) => Err(CalcError::Unexpected { found, pos }),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}
