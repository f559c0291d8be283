//! Arithmetic calculator tool.
//!
//! Expressions are evaluated with `jexl_eval` against an empty context, so
//! only literals and operators are meaningful (`+ - * / % ^` and parentheses).
//! The evaluator's grammar has no prefix minus, so negations are rewritten as
//! subtractions from zero before evaluation.

use serde_json::{json, Value};

use agentmem_types::error::ToolError;
use agentmem_types::llm::ToolSpec;

use super::Tool;

#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub const NAME: &'static str = "calculator";

    pub fn new() -> Self {
        Self
    }

    /// Evaluate `expression` to a number.
    pub fn evaluate(&self, expression: &str) -> Result<f64, ToolError> {
        // The evaluator holds non-Send transform closures; build one per call.
        let value = jexl_eval::Evaluator::new()
            .eval_in_context(&desugar_negation(expression), &json!({}))
            .map_err(|e| ToolError::Evaluation(e.to_string()))?;
        match value {
            Value::Number(n) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ToolError::Evaluation(format!("non-finite result: {n}"))),
            other => Err(ToolError::Evaluation(format!(
                "expression did not produce a number: {other}"
            ))),
        }
    }

    fn format_number(value: f64) -> String {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            format!("{value}")
        }
    }
}

/// Rewrite each prefix `-x` as `(0 - x)`.
///
/// A `-` is a prefix when nothing precedes it, or an operator or opening
/// bracket does. The negated operand extends over any `^` chain, so `-2 ^ 2`
/// is `-(2 ^ 2)`.
fn desugar_negation(expression: &str) -> String {
    let mut rewriter = Rewriter {
        chars: expression.chars().collect(),
        pos: 0,
        out: String::with_capacity(expression.len() + 8),
    };
    rewriter.sequence(false);
    rewriter.out
}

struct Rewriter {
    chars: Vec<char>,
    pos: usize,
    out: String,
}

impl Rewriter {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn copy(&mut self) {
        if let Some(c) = self.peek() {
            self.out.push(c);
            self.pos += 1;
        }
    }

    fn copy_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.copy();
        }
    }

    /// Copy up to the end of input, or up to the `)` closing a group when
    /// `nested`.
    fn sequence(&mut self, nested: bool) {
        let mut expect_operand = true;
        while let Some(c) = self.peek() {
            match c {
                c if c.is_whitespace() => self.copy(),
                ')' if nested => return,
                '-' if expect_operand => {
                    self.negation();
                    expect_operand = false;
                }
                '(' => {
                    self.group();
                    expect_operand = false;
                }
                '\'' | '"' => {
                    self.string();
                    expect_operand = false;
                }
                ')' | ']' | '}' => {
                    self.copy();
                    expect_operand = false;
                }
                c if is_word_char(c) => {
                    let word = self.word();
                    expect_operand = word == "in";
                }
                _ => {
                    self.copy();
                    expect_operand = true;
                }
            }
        }
    }

    fn negation(&mut self) {
        self.pos += 1;
        self.out.push_str("(0 - ");
        self.operand();
        loop {
            let mark = self.pos;
            while self.peek().is_some_and(char::is_whitespace) {
                self.pos += 1;
            }
            if self.peek() != Some('^') {
                self.pos = mark;
                break;
            }
            self.out.extend(&self.chars[mark..self.pos]);
            self.copy();
            self.operand();
        }
        self.out.push(')');
    }

    fn operand(&mut self) {
        self.copy_whitespace();
        match self.peek() {
            Some('-') => self.negation(),
            Some('(') => self.group(),
            Some('\'' | '"') => self.string(),
            Some(c) if is_word_char(c) => {
                self.word();
            }
            _ => {}
        }
    }

    fn group(&mut self) {
        self.copy();
        self.sequence(true);
        if self.peek() == Some(')') {
            self.copy();
        }
    }

    /// Quoted strings pass through untouched, escapes included.
    fn string(&mut self) {
        let Some(quote) = self.peek() else {
            return;
        };
        self.copy();
        while let Some(c) = self.peek() {
            self.copy();
            if c == '\\' {
                self.copy();
            } else if c == quote {
                break;
            }
        }
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_word_char) {
            self.copy();
        }
        self.chars[start..self.pos].iter().collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

impl Tool for CalculatorTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: "Evaluate an arithmetic expression and return the numeric result. \
                Supports + - * / % ^ and parentheses."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "The arithmetic expression to evaluate, e.g. (3 + 4) * 2"
                    }
                },
                "required": ["expression"]
            }),
        }
    }

    fn call(&self, input: &Value) -> Result<String, ToolError> {
        let expression = input
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput("missing string field 'expression'".into()))?;
        self.evaluate(expression).map(Self::format_number)
    }
}
