//! Arithmetic responder
//!
//! Evaluates a single inline expression ("how much is 12 * 3 + 4", "15% of 80").
//! Declines when the text has no expression, which is common: "what is" and
//! "how much" are broad triggers.

use super::Responder;
use crate::models::Response;
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;

pub const HANDLER_ID: &str = "arithmetic";

const NUMBER: &str = r"\d+(?:\.\d+)?";
const OPERATOR: &str = r"[-+*/x×÷]|plus|minus|times|multiplied by|divided by|over";

lazy_static! {
    static ref EXPRESSION: Regex = Regex::new(&format!(
        r"{n}(?:\s*(?:{o})\s*{n})+",
        n = NUMBER,
        o = OPERATOR
    ))
    .expect("expression pattern");
    static ref TOKEN: Regex =
        Regex::new(&format!(r"({})|({})", NUMBER, OPERATOR)).expect("token pattern");
    static ref PERCENT_OF: Regex = Regex::new(&format!(
        r"({n})\s*(?:%|percent)\s+of\s+({n})",
        n = NUMBER
    ))
    .expect("percent pattern");
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "+" | "plus" => Some(Op::Add),
            "-" | "minus" => Some(Op::Sub),
            "*" | "x" | "×" | "times" | "multiplied by" => Some(Op::Mul),
            "/" | "÷" | "divided by" | "over" => Some(Op::Div),
            _ => None,
        }
    }

    fn binds_tight(self) -> bool {
        matches!(self, Op::Mul | Op::Div)
    }

    fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            Op::Add => Some(lhs + rhs),
            Op::Sub => Some(lhs - rhs),
            Op::Mul => Some(lhs * rhs),
            Op::Div if rhs == 0.0 => None,
            Op::Div => Some(lhs / rhs),
        }
    }
}

pub struct ArithmeticResponder;

impl Responder for ArithmeticResponder {
    fn id(&self) -> &'static str {
        HANDLER_ID
    }

    fn respond(&self, text: &str) -> Result<Option<Response>> {
        let lowered = text.to_lowercase();

        if let Some(caps) = PERCENT_OF.captures(&lowered) {
            let pct = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
            let base = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
            if let (Some(pct), Some(base)) = (pct, base) {
                let answer = format!(
                    "{} = {}",
                    caps.get(0).map(|m| m.as_str()).unwrap_or_default(),
                    format_number(pct * base / 100.0)
                );
                return Ok(Some(Response::from_handler(HANDLER_ID, answer)));
            }
        }

        let Some(expression) = EXPRESSION.find(&lowered) else {
            return Ok(None);
        };

        Ok(evaluate(expression.as_str()).map(|value| {
            Response::from_handler(
                HANDLER_ID,
                format!("{} = {}", expression.as_str().trim(), format_number(value)),
            )
        }))
    }
}

/// Two-pass evaluation: `*` and `/` first, then `+` and `-`, left to right
fn evaluate(expression: &str) -> Option<f64> {
    let mut operands: Vec<f64> = Vec::new();
    let mut operators: Vec<Op> = Vec::new();

    for caps in TOKEN.captures_iter(expression) {
        if let Some(number) = caps.get(1) {
            operands.push(number.as_str().parse().ok()?);
        } else if let Some(op) = caps.get(2) {
            operators.push(Op::parse(op.as_str())?);
        }
    }

    if operands.is_empty() || operands.len() != operators.len() + 1 {
        return None;
    }

    let mut terms = vec![operands[0]];
    let mut loose_ops = Vec::new();

    for (op, rhs) in operators.into_iter().zip(operands.into_iter().skip(1)) {
        if op.binds_tight() {
            let lhs = terms.pop()?;
            terms.push(op.apply(lhs, rhs)?);
        } else {
            loose_ops.push(op);
            terms.push(rhs);
        }
    }

    let mut terms = terms.into_iter();
    let mut total = terms.next()?;
    for (op, rhs) in loose_ops.into_iter().zip(terms) {
        total = op.apply(total, rhs)?;
    }

    total.is_finite().then_some(total)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.4}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
