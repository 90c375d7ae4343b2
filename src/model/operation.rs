// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::condition::parse_variable;
use crate::state::{ArithmeticOp, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Subtract => "-=",
            Self::Multiply => "*=",
            Self::Divide => "/=",
        }
    }

    pub fn arithmetic(self) -> Option<ArithmeticOp> {
        match self {
            Self::Assign => None,
            Self::Add => Some(ArithmeticOp::Add),
            Self::Subtract => Some(ArithmeticOp::Subtract),
            Self::Multiply => Some(ArithmeticOp::Multiply),
            Self::Divide => Some(ArithmeticOp::Divide),
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "=" => Self::Assign,
            "+=" => Self::Add,
            "-=" => Self::Subtract,
            "*=" => Self::Multiply,
            "/=" => Self::Divide,
            _ => return None,
        })
    }
}

/// One `<<set $name OP operand>>` mutation.
///
/// The operand is kept as written so export reproduces it exactly; [`Self::value`] gives the
/// typed reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VariableOperation {
    pub name: String,
    pub op: AssignOp,
    pub operand: String,
}

impl VariableOperation {
    pub fn new(name: impl Into<String>, op: AssignOp, operand: impl Into<String>) -> Self {
        Self { name: name.into(), op, operand: operand.into() }
    }

    /// `<<set $name = true>>`, the form flag-set entries take.
    pub fn set_flag(name: impl Into<String>) -> Self {
        Self::new(name, AssignOp::Assign, "true")
    }

    pub fn is_flag_set(&self) -> bool {
        self.op == AssignOp::Assign && self.operand == "true"
    }

    pub fn value(&self) -> Value {
        Value::parse_literal(&self.operand)
    }

    /// A `$other` operand names another variable instead of a literal.
    pub fn operand_variable(&self) -> Option<&str> {
        self.operand.strip_prefix('$').and_then(|_| parse_variable(&self.operand))
    }

    /// Parse the text following the `set` keyword: `$name OP operand`.
    pub fn parse_set_arguments(args: &str) -> Option<Self> {
        let args = args.trim();
        let name_end = args
            .find(|ch: char| ch.is_whitespace() || "=+-*/".contains(ch))
            .unwrap_or(args.len());
        let name = parse_variable(&args[..name_end])?;

        let rest = args[name_end..].trim_start();
        let symbol_len = if rest.starts_with('=') { 1 } else { 2 };
        let op = AssignOp::from_symbol(rest.get(..symbol_len)?)?;
        let operand = rest[symbol_len..].trim();
        if operand.is_empty() {
            return None;
        }
        Some(Self::new(name, op, operand))
    }
}

impl fmt::Display for VariableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<<set ${} {} {}>>", self.name, self.op.symbol(), self.operand)
    }
}
