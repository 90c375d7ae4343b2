// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    IsSet,
    IsNotSet,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
}

impl ConditionOperator {
    /// Comparison symbol in script text; presence tests have none.
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Self::IsSet | Self::IsNotSet => None,
            Self::Equals => Some("=="),
            Self::NotEquals => Some("!="),
            Self::GreaterThan => Some(">"),
            Self::LessThan => Some("<"),
            Self::GreaterEqual => Some(">="),
            Self::LessEqual => Some("<="),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Self::IsSet => Self::IsNotSet,
            Self::IsNotSet => Self::IsSet,
            Self::Equals => Self::NotEquals,
            Self::NotEquals => Self::Equals,
            Self::GreaterThan => Self::LessEqual,
            Self::LessThan => Self::GreaterEqual,
            Self::GreaterEqual => Self::LessThan,
            Self::LessEqual => Self::GreaterThan,
        }
    }

    pub fn is_presence_test(self) -> bool {
        matches!(self, Self::IsSet | Self::IsNotSet)
    }

    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "==" | "is" | "eq" => Self::Equals,
            "!=" | "neq" => Self::NotEquals,
            ">" | "gt" => Self::GreaterThan,
            "<" | "lt" => Self::LessThan,
            ">=" | "gte" => Self::GreaterEqual,
            "<=" | "lte" => Self::LessEqual,
            _ => return None,
        })
    }
}

/// A single test against a flag or variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    pub flag: String,
    pub operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Condition {
    pub fn is_set(flag: impl Into<String>) -> Self {
        Self { flag: flag.into(), operator: ConditionOperator::IsSet, value: None }
    }

    pub fn is_not_set(flag: impl Into<String>) -> Self {
        Self { flag: flag.into(), operator: ConditionOperator::IsNotSet, value: None }
    }

    pub fn compare(flag: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Self { flag: flag.into(), operator, value: Some(value) }
    }

    /// The value a comparison is made against; a missing value compares as `true` for
    /// (in)equality and as `0` for ordering.
    pub fn effective_value(&self) -> Value {
        match (&self.value, self.operator) {
            (Some(value), _) => value.clone(),
            (None, ConditionOperator::Equals | ConditionOperator::NotEquals) => Value::Bool(true),
            (None, _) => Value::Number(0.0),
        }
    }

    pub fn negated(&self) -> Self {
        Self { flag: self.flag.clone(), operator: self.operator.negate(), value: self.value.clone() }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator.symbol() {
            None if self.operator == ConditionOperator::IsNotSet => write!(f, "!${}", self.flag),
            None => write!(f, "${}", self.flag),
            Some(symbol) => {
                write!(f, "${} {symbol} {}", self.flag, self.effective_value().to_literal())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionParseError {
    #[error("empty condition")]
    Empty,
    #[error("condition uses '||', which cannot be attached as a list of conditions: {expr}")]
    Disjunction { expr: String },
    #[error("invalid variable name in condition term: {term}")]
    InvalidVariable { term: String },
    #[error("missing comparison value in condition term: {term}")]
    MissingValue { term: String },
    #[error("unsupported condition term: {term}")]
    UnsupportedTerm { term: String },
}

impl FromStr for Condition {
    type Err = ConditionParseError;

    /// Parse one term: `$flag`, `!$flag`, `not $flag`, or `$flag <op> <literal>`.
    fn from_str(term: &str) -> Result<Self, Self::Err> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ConditionParseError::Empty);
        }

        let negated_rest = term
            .strip_prefix('!')
            .filter(|rest| !rest.starts_with('='))
            .or_else(|| term.strip_prefix("not ").map(str::trim_start));
        if let Some(rest) = negated_rest {
            let flag = parse_variable(rest.trim())
                .ok_or_else(|| ConditionParseError::InvalidVariable { term: term.to_owned() })?;
            return Ok(Self::is_not_set(flag));
        }

        let Some((lhs, operator, rhs)) = split_comparison(term) else {
            if term.contains(|ch: char| ch.is_whitespace() || "()".contains(ch)) {
                return Err(ConditionParseError::UnsupportedTerm { term: term.to_owned() });
            }
            let flag = parse_variable(term)
                .ok_or_else(|| ConditionParseError::InvalidVariable { term: term.to_owned() })?;
            return Ok(Self::is_set(flag));
        };

        let flag = parse_variable(lhs)
            .ok_or_else(|| ConditionParseError::InvalidVariable { term: term.to_owned() })?;
        let rhs = rhs.trim();
        if rhs.is_empty() {
            return Err(ConditionParseError::MissingValue { term: term.to_owned() });
        }
        if rhs.starts_with('$') || rhs.contains('(') {
            return Err(ConditionParseError::UnsupportedTerm { term: term.to_owned() });
        }
        Ok(Self::compare(flag, operator, Value::parse_literal(rhs)))
    }
}

/// Render a conjunction the way it appears inside `<<if …>>`.
pub fn render_conditions(conditions: &[Condition]) -> String {
    conditions.iter().map(ToString::to_string).collect::<Vec<_>>().join(" && ")
}

/// Parse a conjunction (`a && b`, `a and b`) into conditions.
///
/// Terms that fail to parse are returned alongside the successfully parsed ones so callers
/// can keep what they understood and report the rest.
pub fn parse_conditions(expr: &str) -> (Vec<Condition>, Vec<ConditionParseError>) {
    let expr = expr.trim();
    if expr.is_empty() {
        return (Vec::new(), vec![ConditionParseError::Empty]);
    }
    let mut conditions = Vec::new();
    let mut errors = Vec::new();
    if split_outside_quotes(expr, &["||", " or "]).len() > 1 {
        errors.push(ConditionParseError::Disjunction { expr: expr.to_owned() });
        return (conditions, errors);
    }
    for term in split_outside_quotes(expr, &["&&", " and "]) {
        match term.parse::<Condition>() {
            Ok(condition) => conditions.push(condition),
            Err(err) => errors.push(err),
        }
    }
    (conditions, errors)
}

/// Split on any of `separators`, ignoring separators inside quoted strings.
pub(crate) fn split_outside_quotes<'a>(text: &'a str, separators: &[&str]) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    let mut idx = 0usize;
    while idx < text.len() {
        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            idx += ch.len_utf8();
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
            idx += ch.len_utf8();
            continue;
        }
        if let Some(sep) = separators.iter().find(|sep| text[idx..].starts_with(**sep)) {
            pieces.push(text[start..idx].trim());
            idx += sep.len();
            start = idx;
            continue;
        }
        idx += ch.len_utf8();
    }
    pieces.push(text[start..].trim());
    pieces
}

fn split_comparison(term: &str) -> Option<(&str, ConditionOperator, &str)> {
    let mut quote: Option<char> = None;
    for (idx, ch) in term.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '=' | '!' | '<' | '>' => {
                let two = term.get(idx..idx + 2);
                let (token, len) = match two {
                    Some(tok @ ("==" | "!=" | ">=" | "<=")) => (tok, 2),
                    _ if ch == '<' || ch == '>' => (&term[idx..idx + 1], 1),
                    _ => continue,
                };
                let operator = ConditionOperator::from_token(token)?;
                return Some((term[..idx].trim(), operator, &term[idx + len..]));
            }
            _ => {}
        }
    }

    let mut words = term.splitn(3, char::is_whitespace);
    let lhs = words.next()?;
    let operator = ConditionOperator::from_token(words.next()?)?;
    let rhs = words.next().unwrap_or("");
    Some((lhs, operator, rhs))
}

/// Accepts `$name` or a bare `name`; returns the name without the sigil.
pub(crate) fn parse_variable(token: &str) -> Option<&str> {
    let name = token.strip_prefix('$').unwrap_or(token);
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_alphabetic() || first == '_') {
        return None;
    }
    chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '.').then_some(name)
}
