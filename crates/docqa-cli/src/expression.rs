//! Arithmetic expression evaluator for calculator answers
//!
//! Accepts numeric literals, `+ - * / // % **`, unary signs and parentheses.
//! Names, calls, strings and every other construct are rejected at the
//! tokenizer, so nothing produced by the model is ever executed.

use docqa_core::ExpressionError;
use std::fmt;

type EvalResult<T> = std::result::Result<T, ExpressionError>;

/// A calculator value; integers stay exact until an operation needs a float
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    fn as_f64(self) -> f64 {
        match self {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Value::Int(i) => i == 0,
            Value::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

/// Render a float the way a Python prompt would: `750.0`, `3.5`, `1e+16`
fn format_float(x: f64) -> String {
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", x);
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{}e{}{:0>2}", mantissa, sign, digits);
    }

    if x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Value),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Power,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{}", value),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::DoubleSlash => f.write_str("//"),
            Token::Percent => f.write_str("%"),
            Token::Power => f.write_str("**"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
}

fn tokenize(input: &str) -> EvalResult<Vec<(Token, usize)>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        let start = pos;

        let token = match ch {
            c if c.is_whitespace() => {
                pos += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let (value, end) = read_number(&chars, pos)?;
                pos = end;
                Token::Number(value)
            }
            '+' => {
                pos += 1;
                Token::Plus
            }
            '-' => {
                pos += 1;
                Token::Minus
            }
            '*' if chars.get(pos + 1) == Some(&'*') => {
                pos += 2;
                Token::Power
            }
            '*' => {
                pos += 1;
                Token::Star
            }
            '/' if chars.get(pos + 1) == Some(&'/') => {
                pos += 2;
                Token::DoubleSlash
            }
            '/' => {
                pos += 1;
                Token::Slash
            }
            '%' => {
                pos += 1;
                Token::Percent
            }
            '(' => {
                pos += 1;
                Token::LParen
            }
            ')' => {
                pos += 1;
                Token::RParen
            }
            other => return Err(ExpressionError::UnexpectedChar { ch: other, pos }),
        };

        tokens.push((token, start));
    }

    Ok(tokens)
}

/// Read `digits [. digits] [e [+-] digits]` starting at `start`
fn read_number(chars: &[char], start: usize) -> EvalResult<(Value, usize)> {
    let mut pos = start;
    let mut is_float = false;

    while pos < chars.len() && chars[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < chars.len() && chars[pos] == '.' {
        is_float = true;
        pos += 1;
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < chars.len() && matches!(chars[pos], 'e' | 'E') {
        let mut end = pos + 1;
        if end < chars.len() && matches!(chars[end], '+' | '-') {
            end += 1;
        }
        if end < chars.len() && chars[end].is_ascii_digit() {
            while end < chars.len() && chars[end].is_ascii_digit() {
                end += 1;
            }
            is_float = true;
            pos = end;
        }
    }

    let literal: String = chars[start..pos].iter().collect();
    if literal == "." {
        return Err(ExpressionError::InvalidNumber(literal));
    }

    let value = if is_float {
        let parsed: f64 = literal
            .parse()
            .map_err(|_| ExpressionError::InvalidNumber(literal.clone()))?;
        if !parsed.is_finite() {
            return Err(ExpressionError::Overflow);
        }
        Value::Float(parsed)
    } else {
        Value::Int(literal.parse().map_err(|_| ExpressionError::Overflow)?)
    };

    Ok((value, pos))
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let next = self.tokens.get(self.position).cloned();
        if next.is_some() {
            self.position += 1;
        }
        next
    }

    fn unexpected(token: Token, pos: usize) -> ExpressionError {
        ExpressionError::UnexpectedToken {
            token: token.to_string(),
            pos,
        }
    }

    fn match_additive_operator(&mut self) -> Option<BinaryOperator> {
        let operator = match self.peek() {
            Some(Token::Plus) => BinaryOperator::Add,
            Some(Token::Minus) => BinaryOperator::Subtract,
            _ => return None,
        };
        self.advance();
        Some(operator)
    }

    fn match_multiplicative_operator(&mut self) -> Option<BinaryOperator> {
        let operator = match self.peek() {
            Some(Token::Star) => BinaryOperator::Multiply,
            Some(Token::Slash) => BinaryOperator::Divide,
            Some(Token::DoubleSlash) => BinaryOperator::FloorDivide,
            Some(Token::Percent) => BinaryOperator::Modulo,
            _ => return None,
        };
        self.advance();
        Some(operator)
    }

    // expr := term (('+' | '-') term)*
    fn parse_expression(&mut self) -> EvalResult<Value> {
        let mut left = self.parse_term()?;
        while let Some(operator) = self.match_additive_operator() {
            let right = self.parse_term()?;
            left = apply(operator, left, right)?;
        }
        Ok(left)
    }

    // term := unary (('*' | '/' | '//' | '%') unary)*
    fn parse_term(&mut self) -> EvalResult<Value> {
        let mut left = self.parse_unary()?;
        while let Some(operator) = self.match_multiplicative_operator() {
            let right = self.parse_unary()?;
            left = apply(operator, left, right)?;
        }
        Ok(left)
    }

    // unary := ('+' | '-') unary | power
    fn parse_unary(&mut self) -> EvalResult<Value> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            Some(Token::Minus) => {
                self.advance();
                negate(self.parse_unary()?)
            }
            _ => self.parse_power(),
        }
    }

    // power := atom ['**' unary], right-associative and tighter than a leading sign
    fn parse_power(&mut self) -> EvalResult<Value> {
        let base = self.parse_atom()?;
        if self.peek() == Some(&Token::Power) {
            self.advance();
            let exponent = self.parse_unary()?;
            return power(base, exponent);
        }
        Ok(base)
    }

    // atom := NUMBER | '(' expr ')'
    fn parse_atom(&mut self) -> EvalResult<Value> {
        match self.advance() {
            Some((Token::Number(value), _)) => Ok(value),
            Some((Token::LParen, _)) => {
                let value = self.parse_expression()?;
                match self.advance() {
                    Some((Token::RParen, _)) => Ok(value),
                    Some((token, pos)) => Err(Self::unexpected(token, pos)),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some((token, pos)) => Err(Self::unexpected(token, pos)),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }
}

fn float(x: f64) -> EvalResult<Value> {
    if x.is_nan() {
        Err(ExpressionError::NotReal)
    } else if x.is_infinite() {
        Err(ExpressionError::Overflow)
    } else {
        Ok(Value::Float(x))
    }
}

fn negate(value: Value) -> EvalResult<Value> {
    match value {
        Value::Int(i) => i.checked_neg().map(Value::Int).ok_or(ExpressionError::Overflow),
        Value::Float(f) => Ok(Value::Float(-f)),
    }
}

fn apply(operator: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
    if matches!(
        operator,
        BinaryOperator::Divide | BinaryOperator::FloorDivide | BinaryOperator::Modulo
    ) && right.is_zero()
    {
        return Err(ExpressionError::DivisionByZero);
    }

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            let result = match operator {
                BinaryOperator::Add => a.checked_add(b),
                BinaryOperator::Subtract => a.checked_sub(b),
                BinaryOperator::Multiply => a.checked_mul(b),
                BinaryOperator::Divide => return float(a as f64 / b as f64),
                BinaryOperator::FloorDivide => floor_div(a, b),
                BinaryOperator::Modulo => floor_mod(a, b),
            };
            result.map(Value::Int).ok_or(ExpressionError::Overflow)
        }
        (a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            float(match operator {
                BinaryOperator::Add => a + b,
                BinaryOperator::Subtract => a - b,
                BinaryOperator::Multiply => a * b,
                BinaryOperator::Divide => a / b,
                BinaryOperator::FloorDivide => (a / b).floor(),
                BinaryOperator::Modulo => {
                    let r = a % b;
                    if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
                }
            })
        }
    }
}

/// Integer division rounding toward negative infinity
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Remainder taking the sign of the divisor
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        r.checked_add(b)
    } else {
        Some(r)
    }
}

fn power(base: Value, exponent: Value) -> EvalResult<Value> {
    if base.is_zero() && exponent.as_f64() < 0.0 {
        return Err(ExpressionError::DivisionByZero);
    }

    match (base, exponent) {
        (Value::Int(b), Value::Int(e)) if e >= 0 => {
            let e = u32::try_from(e).map_err(|_| ExpressionError::Overflow)?;
            b.checked_pow(e).map(Value::Int).ok_or(ExpressionError::Overflow)
        }
        (b, e) => float(b.as_f64().powf(e.as_f64())),
    }
}

/// Parse and evaluate one arithmetic expression
pub fn evaluate(input: &str) -> EvalResult<Value> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut parser = Parser {
        tokens,
        position: 0,
    };
    let value = parser.parse_expression()?;

    match parser.advance() {
        Some((token, pos)) => Err(Parser::unexpected(token, pos)),
        None => Ok(value),
    }
}
