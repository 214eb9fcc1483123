//! Single-condition compiler that renders one attribute filter as a PostgreSQL
//! predicate using sea-query.

use crate::compiler::ConditionCompiler;
use crate::error::{CompileError, Result};
use crate::model::{AttributeFilter, AttributeType, ConditionValue};
use sea_query::{Expr, Iden, LikeExpr, PostgresQueryBuilder, SelectStatement, SimpleExpr, Value};

/// Escape character declared on every LIKE pattern
const LIKE_ESCAPE: char = '\\';

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Condition operators understood by the SQL backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,      // =
    NotEq,   // <>
    Gt,      // >
    Lt,      // <
    Gte,     // >=
    Lte,     // <=
    Like,    // contains
    NotLike,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    True,
    False,
}

impl Operator {
    /// Parse a condition token, ignoring case
    pub fn parse(token: &str) -> Result<Self> {
        let op = match token.trim().to_ascii_lowercase().as_str() {
            "=" | "eq" => Operator::Eq,
            "<>" | "!=" | "ne" => Operator::NotEq,
            ">" | "gt" => Operator::Gt,
            "<" | "lt" => Operator::Lt,
            ">=" | "gte" => Operator::Gte,
            "<=" | "lte" => Operator::Lte,
            "like" => Operator::Like,
            "not_like" => Operator::NotLike,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "null" => Operator::IsNull,
            "not_null" => Operator::IsNotNull,
            "true" => Operator::True,
            "false" => Operator::False,
            _ => return Err(CompileError::UnsupportedOperator(token.to_string())),
        };
        Ok(op)
    }
}

/// Renders attribute filters as SQL `WHERE` predicates
#[derive(Debug, Clone, Default)]
pub struct SqlFilterCompiler;

impl SqlFilterCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile a filter into a sea-query expression
    pub fn compile_expr(&self, filter: &AttributeFilter) -> Result<SimpleExpr> {
        let col = Expr::col(ColumnName(filter.attribute.clone()));

        let expr = match Operator::parse(&filter.condition)? {
            Operator::IsNull => col.is_null(),
            Operator::IsNotNull => col.is_not_null(),
            Operator::True => col.eq(true),
            Operator::False => col.eq(false),
            // Boolean attributes need no value; a bare `=` tests for true
            Operator::Eq if self.is_valueless_boolean(filter) => col.eq(true),
            Operator::NotEq if self.is_valueless_boolean(filter) => col.ne(true),
            Operator::Eq => {
                let mut values = self.values(filter)?;
                if values.len() == 1 {
                    col.eq(values.remove(0))
                } else {
                    col.is_in(values)
                }
            }
            Operator::NotEq => {
                let mut values = self.values(filter)?;
                if values.len() == 1 {
                    col.ne(values.remove(0))
                } else {
                    col.is_not_in(values)
                }
            }
            Operator::Gt => col.gt(self.single_value(filter)?),
            Operator::Lt => col.lt(self.single_value(filter)?),
            Operator::Gte => col.gte(self.single_value(filter)?),
            Operator::Lte => col.lte(self.single_value(filter)?),
            Operator::Like => col.like(like_pattern("%", &self.pattern_text(filter)?, "%")),
            Operator::NotLike => col.not_like(like_pattern("%", &self.pattern_text(filter)?, "%")),
            Operator::StartsWith => col.like(like_pattern("", &self.pattern_text(filter)?, "%")),
            Operator::EndsWith => col.like(like_pattern("%", &self.pattern_text(filter)?, "")),
            Operator::In => col.is_in(self.values(filter)?),
            Operator::NotIn => col.is_not_in(self.values(filter)?),
        };

        Ok(expr)
    }

    fn is_valueless_boolean(&self, filter: &AttributeFilter) -> bool {
        filter.attribute_type == Some(AttributeType::Boolean) && filter.value.iter().all(Option::is_none)
    }

    /// All non-empty values, coerced to the attribute type
    fn values(&self, filter: &AttributeFilter) -> Result<Vec<Value>> {
        let values = filter
            .value
            .iter()
            .flatten()
            .map(|v| self.condition_value_to_value(filter, v))
            .collect::<Result<Vec<_>>>()?;

        if values.is_empty() {
            return Err(invalid_value(filter, "expected at least one value"));
        }
        Ok(values)
    }

    fn single_value(&self, filter: &AttributeFilter) -> Result<Value> {
        let mut values = self.values(filter)?;
        if values.len() != 1 {
            return Err(invalid_value(
                filter,
                &format!("expected exactly one value, got {}", values.len()),
            ));
        }
        Ok(values.remove(0))
    }

    /// Text used inside LIKE patterns; multiple values are joined
    fn pattern_text(&self, filter: &AttributeFilter) -> Result<String> {
        let text: String = filter.value.iter().flatten().map(ToString::to_string).collect();
        if text.is_empty() {
            return Err(invalid_value(filter, "expected a non-empty pattern"));
        }
        Ok(text)
    }

    /// Convert a condition value to a sea-query Value
    fn condition_value_to_value(&self, filter: &AttributeFilter, value: &ConditionValue) -> Result<Value> {
        let converted = match (value, filter.attribute_type) {
            (ConditionValue::Text(s), Some(AttributeType::Integer)) => s
                .trim()
                .parse::<i64>()
                .map(|n| Value::BigInt(Some(n)))
                .map_err(|_| invalid_value(filter, &format!("'{}' is not an integer", s)))?,
            (ConditionValue::Text(s), Some(AttributeType::Double)) => s
                .trim()
                .parse::<f64>()
                .map(|n| Value::Double(Some(n)))
                .map_err(|_| invalid_value(filter, &format!("'{}' is not a number", s)))?,
            (ConditionValue::Text(s), Some(AttributeType::Boolean)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Bool(Some(true)),
                "false" => Value::Bool(Some(false)),
                _ => return Err(invalid_value(filter, &format!("'{}' is not a boolean", s))),
            },
            (ConditionValue::Text(s), _) => Value::String(Some(Box::new(s.clone()))),
            (ConditionValue::Number(n), Some(AttributeType::Double)) => Value::Double(Some(*n)),
            (ConditionValue::Number(n), _) if n.fract() == 0.0 && n.abs() < 1e15 => Value::BigInt(Some(*n as i64)),
            (ConditionValue::Number(n), _) => Value::Double(Some(*n)),
            (ConditionValue::Bool(b), _) => Value::Bool(Some(*b)),
        };
        Ok(converted)
    }
}

impl ConditionCompiler for SqlFilterCompiler {
    fn compile(&self, filter: &AttributeFilter) -> Result<String> {
        let expr = self.compile_expr(filter)?;
        Ok(render_predicate(expr))
    }
}

/// Render an expression as the bare predicate of a `WHERE` clause
fn render_predicate(expr: SimpleExpr) -> String {
    let mut select = SelectStatement::new();
    select.and_where(expr);
    let sql = select.to_string(PostgresQueryBuilder);

    match sql.split_once(" WHERE ") {
        Some((_, predicate)) => predicate.trim().to_string(),
        None => sql,
    }
}

/// Wrap user text in wildcards, matching the text itself literally
fn like_pattern(prefix: &str, text: &str, suffix: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    LikeExpr::new(format!("{}{}{}", prefix, escaped, suffix)).escape(LIKE_ESCAPE)
}

fn invalid_value(filter: &AttributeFilter, message: &str) -> CompileError {
    CompileError::InvalidValue {
        attribute: filter.attribute.clone(),
        condition: filter.condition.clone(),
        message: message.to_string(),
    }
}
