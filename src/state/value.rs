// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tagged variable values and the single set of coercion rules shared by every call site.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A runtime variable value.
///
/// Serialized untagged so editor JSON reads naturally (`true`, `3`, `"gold"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Boolean,
    Number,
    String,
}

impl ValueType {
    /// The value an absent variable of this type reads as.
    pub fn zero(self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Number => Value::Number(0.0),
            Self::String => Value::Str(String::new()),
        }
    }
}

impl Value {
    /// Parse a `<<set>>` operand or condition literal.
    ///
    /// A token that parses fully as a finite float is a number, `true`/`false` are booleans,
    /// and anything else is a string with one layer of matching quotes removed.
    pub fn parse_literal(token: &str) -> Self {
        let token = token.trim();
        if let Ok(number) = token.parse::<f64>() {
            if number.is_finite() {
                return Self::Number(number);
            }
        }
        match token {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::Str(strip_quotes(token).to_owned()),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Boolean,
            Self::Number(_) => ValueType::Number,
            Self::Str(_) => ValueType::String,
        }
    }

    /// Numeric view: booleans are 1/0, strings use their leading numeric prefix (0 if none).
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Bool(true) => 1.0,
            Self::Bool(false) => 0.0,
            Self::Number(number) => *number,
            Self::Str(text) => parse_float_prefix(text).unwrap_or(0.0),
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Number(number) => *number != 0.0 && !number.is_nan(),
            Self::Str(text) => !text.is_empty() && text != "false",
        }
    }

    /// Display text, as interpolated into dialogue.
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Number(number) => format_number(*number),
            Self::Str(text) => text.clone(),
        }
    }

    /// Script literal form; strings are double-quoted so they re-parse as strings.
    pub fn to_literal(&self) -> String {
        match self {
            Self::Str(text) => format!("\"{text}\""),
            other => other.to_text(),
        }
    }

    /// Coerce to the given type using the same rules as arithmetic and comparisons.
    pub fn coerce(&self, value_type: ValueType) -> Value {
        match value_type {
            ValueType::Boolean => Value::Bool(self.to_bool()),
            ValueType::Number => Value::Number(self.to_number()),
            ValueType::String => Value::Str(self.to_text()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

fn strip_quotes(token: &str) -> &str {
    for quote in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return &token[1..token.len() - 1];
        }
    }
    token
}

/// Integral values print without a fractional part so `100` survives a round trip as `100`.
pub fn format_number(number: f64) -> String {
    if number == 0.0 {
        return "0".to_owned();
    }
    if number.fract() == 0.0 && number.abs() < 1e15 {
        return format!("{number:.0}");
    }
    number.to_string()
}

/// Leading-prefix float parse: `"12abc"` is 12, `"abc"` has no number.
fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0usize;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok()
}
