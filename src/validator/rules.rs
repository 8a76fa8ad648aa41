//! Custom rule evaluation.
//!
//! Rules are boolean expressions over the record's fields:
//!
//! ```text
//! expr     := and ("||" and)*
//! and      := unary ("&&" unary)*
//! unary    := "!" unary | "(" expr ")" | "present(" field ")" | operand (cmp operand)?
//! cmp      := "==" | "!=" | "<" | "<=" | ">" | ">="
//! operand  := field | number | 'string' | "string" | true | false | null
//! ```
//!
//! A comparison that names an absent field is false. Numbers compare
//! numerically, strings lexically (which orders ISO-8601 dates); ordering
//! between other kinds is false. A bare operand is true only for `true`.

use std::cmp::Ordering;

use serde_json::Value;

use super::is_present;
use crate::metadata::FieldMap;
use crate::schema::ValidationRule;

/// Errors raised while parsing a rule expression
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    /// Expression is not well formed
    #[error("Invalid expression '{expression}' at position {position}: {detail}")]
    Syntax {
        /// Expression text
        expression: String,
        /// Byte offset of the problem
        position: usize,
        /// What was wrong
        detail: String,
    },
}

/// Pluggable evaluator for schema rules
pub trait RuleEvaluator: Send + Sync {
    /// Whether the record satisfies the rule
    fn evaluate(&self, rule: &ValidationRule, fields: &FieldMap) -> Result<bool, RuleError>;
}

/// Default evaluator for the expression language above
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    /// Create an evaluator
    pub fn new() -> Self {
        Self
    }

    /// Parse and evaluate an expression
    pub fn eval_str(&self, expression: &str, fields: &FieldMap) -> Result<bool, RuleError> {
        let expr = Parser::new(expression)?.parse()?;
        Ok(expr.eval(fields))
    }
}

impl RuleEvaluator for ExpressionEvaluator {
    fn evaluate(&self, rule: &ValidationRule, fields: &FieldMap) -> Result<bool, RuleError> {
        self.eval_str(&rule.expression, fields)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Field(String),
    Literal(Value),
}

impl Operand {
    fn resolve<'a>(&'a self, fields: &'a FieldMap) -> Option<&'a Value> {
        match self {
            Operand::Field(name) => fields.get(name).filter(|v| !v.is_null()),
            Operand::Literal(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Present(String),
    Compare(Operand, CmpOp, Operand),
    Truthy(Operand),
}

impl Expr {
    fn eval(&self, fields: &FieldMap) -> bool {
        match self {
            Expr::Or(a, b) => a.eval(fields) || b.eval(fields),
            Expr::And(a, b) => a.eval(fields) && b.eval(fields),
            Expr::Not(e) => !e.eval(fields),
            Expr::Present(name) => is_present(fields.get(name)),
            Expr::Compare(lhs, op, rhs) => match (lhs.resolve(fields), rhs.resolve(fields)) {
                (Some(a), Some(b)) => compare(a, *op, b),
                _ => false,
            },
            Expr::Truthy(operand) => operand.resolve(fields) == Some(&Value::Bool(true)),
        }
    }
}

fn compare(a: &Value, op: CmpOp, b: &Value) -> bool {
    let ordering = match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    };

    match (op, ordering) {
        (CmpOp::Eq, Some(o)) => o == Ordering::Equal,
        (CmpOp::Ne, Some(o)) => o != Ordering::Equal,
        (CmpOp::Eq, None) => a == b,
        (CmpOp::Ne, None) => a != b,
        (CmpOp::Lt, Some(o)) => o == Ordering::Less,
        (CmpOp::Le, Some(o)) => o != Ordering::Greater,
        (CmpOp::Gt, Some(o)) => o == Ordering::Greater,
        (CmpOp::Ge, Some(o)) => o != Ordering::Less,
        (_, None) => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    LParen,
    RParen,
    Not,
    And,
    Or,
    Cmp(CmpOp),
}

fn tokenize(expression: &str) -> Result<Vec<(usize, Token)>, RuleError> {
    let syntax = |position: usize, detail: &str| RuleError::Syntax {
        expression: expression.to_string(),
        position,
        detail: detail.to_string(),
    };

    let bytes = expression.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        let two: &[u8] = bytes.get(i..i + 2).unwrap_or(&[]);

        let token = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'(' => {
                i += 1;
                Token::LParen
            }
            b')' => {
                i += 1;
                Token::RParen
            }
            _ if two == b"&&" => {
                i += 2;
                Token::And
            }
            _ if two == b"||" => {
                i += 2;
                Token::Or
            }
            _ if two == b"==" => {
                i += 2;
                Token::Cmp(CmpOp::Eq)
            }
            _ if two == b"!=" => {
                i += 2;
                Token::Cmp(CmpOp::Ne)
            }
            _ if two == b"<=" => {
                i += 2;
                Token::Cmp(CmpOp::Le)
            }
            _ if two == b">=" => {
                i += 2;
                Token::Cmp(CmpOp::Ge)
            }
            b'<' => {
                i += 1;
                Token::Cmp(CmpOp::Lt)
            }
            b'>' => {
                i += 1;
                Token::Cmp(CmpOp::Gt)
            }
            b'!' => {
                i += 1;
                Token::Not
            }
            b'\'' | b'"' => {
                let end = bytes[i + 1..]
                    .iter()
                    .position(|&b| b == c)
                    .ok_or_else(|| syntax(start, "unterminated string"))?;
                let text = &expression[i + 1..i + 1 + end];
                i += end + 2;
                Token::Str(text.to_string())
            }
            b'0'..=b'9' | b'-' | b'.' => {
                i += 1;
                while i < bytes.len()
                    && (bytes[i].is_ascii_digit()
                        || matches!(bytes[i], b'.' | b'e' | b'E')
                        || (matches!(bytes[i], b'+' | b'-')
                            && matches!(bytes[i - 1], b'e' | b'E')))
                {
                    i += 1;
                }
                let text = &expression[start..i];
                let number = text
                    .parse::<f64>()
                    .map_err(|_| syntax(start, &format!("invalid number '{}'", text)))?;
                Token::Number(number)
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b'.'))
                {
                    i += 1;
                }
                Token::Ident(expression[start..i].to_string())
            }
            _ => return Err(syntax(start, "unexpected character")),
        };
        tokens.push((start, token));
    }

    Ok(tokens)
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Result<Self, RuleError> {
        Ok(Self {
            expression,
            tokens: tokenize(expression)?,
            pos: 0,
        })
    }

    fn error(&self, detail: impl Into<String>) -> RuleError {
        let position = self
            .tokens
            .get(self.pos)
            .map(|(p, _)| *p)
            .unwrap_or(self.expression.len());
        RuleError::Syntax {
            expression: self.expression.to_string(),
            position,
            detail: detail.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), RuleError> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error(format!("expected {:?}", expected)))
            }
        }
    }

    fn parse(mut self) -> Result<Expr, RuleError> {
        if self.tokens.is_empty() {
            return Err(self.error("empty expression"));
        }
        let expr = self.parse_or()?;
        if self.peek().is_some() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, RuleError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, RuleError> {
        let mut lhs = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, RuleError> {
        match self.peek() {
            Some(Token::Not) => {
                self.pos += 1;
                Ok(Expr::Not(Box::new(self.parse_unary()?)))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let expr = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Ident(name))
                if name == "present"
                    && self.tokens.get(self.pos + 1).map(|(_, t)| t) == Some(&Token::LParen) =>
            {
                self.pos += 2;
                let field = match self.next() {
                    Some(Token::Ident(field)) => field,
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return Err(self.error("present() takes a field name"));
                    }
                };
                self.expect(Token::RParen)?;
                Ok(Expr::Present(field))
            }
            _ => {
                let lhs = self.parse_operand()?;
                match self.peek() {
                    Some(Token::Cmp(op)) => {
                        let op = *op;
                        self.pos += 1;
                        let rhs = self.parse_operand()?;
                        Ok(Expr::Compare(lhs, op, rhs))
                    }
                    _ => Ok(Expr::Truthy(lhs)),
                }
            }
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, RuleError> {
        let operand = match self.peek() {
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Operand::Literal(Value::Bool(true)),
                "false" => Operand::Literal(Value::Bool(false)),
                "null" => Operand::Literal(Value::Null),
                _ => Operand::Field(name.clone()),
            },
            Some(Token::Number(n)) => Operand::Literal(
                serde_json::Number::from_f64(*n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            ),
            Some(Token::Str(s)) => Operand::Literal(Value::String(s.clone())),
            _ => return Err(self.error("expected a field or literal")),
        };
        self.pos += 1;
        Ok(operand)
    }
}

#[cfg(test)]
mod expression_tests {
    use super::*;
    use serde_json::json;

    fn fields() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("min".into(), json!(10));
        fields.insert("max".into(), json!(60));
        fields.insert("name".into(), json!("cells"));
        fields.insert("paired".into(), json!(true));
        fields.insert("empty".into(), json!(""));
        fields.insert("start".into(), json!("2024-01-01"));
        fields.insert("end".into(), json!("2024-03-01"));
        fields
    }

    fn eval(expression: &str) -> bool {
        ExpressionEvaluator::new()
            .eval_str(expression, &fields())
            .unwrap()
    }

    #[test]
    fn test_comparisons() {
        assert!(eval("max >= min"));
        assert!(eval("max > 59.5"));
        assert!(eval("min == 10"));
        assert!(eval("min != 11"));
        assert!(!eval("max < min"));
        assert!(eval("name == 'cells'"));
        assert!(eval("name != \"tissue\""));
        assert!(eval("end > start"));
        assert!(eval("paired == true"));
        assert!(eval("-1 < min"));
    }

    #[test]
    fn test_absent_fields() {
        assert!(!eval("missing > 1"));
        assert!(!eval("missing == null"));
        assert!(!eval("present(missing)"));
        assert!(!eval("present(empty)"));
        assert!(eval("!present(missing) || missing > 1"));
    }

    #[test]
    fn test_boolean_operators() {
        assert!(eval("present(min) && present(max) && max >= min"));
        assert!(eval("min > 100 || name == 'cells'"));
        assert!(!eval("min > 100 && name == 'cells'"));
        assert!(eval("(min > 100 || max > 50) && paired"));
        assert!(eval("!(min > 100)"));
    }

    #[test]
    fn test_mixed_kinds_do_not_order() {
        assert!(!eval("name > 1"));
        assert!(eval("name != 1"));
    }

    #[test]
    fn test_syntax_errors() {
        let evaluator = ExpressionEvaluator::new();
        let fields = fields();
        for bad in ["", "max >=", "(max > 1", "max > 1 )", "present(1)", "name == 'open", "a # b", "1.2.3 > 1"] {
            assert!(evaluator.eval_str(bad, &fields).is_err(), "{bad}");
        }
    }
}
