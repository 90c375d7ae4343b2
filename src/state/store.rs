// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use super::value::{Value, ValueType};
use crate::model::condition::{split_outside_quotes, Condition, ConditionOperator};
use crate::model::flags::FlagSchema;
use crate::model::operation::VariableOperation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    /// `None` for division by zero; the caller keeps the current value.
    fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            Self::Add => Some(lhs + rhs),
            Self::Subtract => Some(lhs - rhs),
            Self::Multiply => Some(lhs * rhs),
            Self::Divide => (rhs != 0.0).then(|| lhs / rhs),
        }
    }
}

/// Variable state for a dialogue-playback runtime.
///
/// Persistent values and conversation-scoped memory flags are kept apart: a memory flag is a
/// bare presence marker and reads as `true` only when no persistent value shadows it.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    values: BTreeMap<String, Value>,
    memory_flags: BTreeSet<String>,
    schema: FlagSchema,
}

fn normalize(name: &str) -> &str {
    name.trim().strip_prefix('$').unwrap_or(name.trim())
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose declared flags start at their schema defaults.
    pub fn with_schema(schema: FlagSchema) -> Self {
        let mut store = Self { schema, ..Self::default() };
        store.seed_defaults(|_| true);
        store
    }

    pub fn schema(&self) -> &FlagSchema {
        &self.schema
    }

    fn seed_defaults(&mut self, include: impl Fn(&crate::model::FlagDefinition) -> bool) {
        let defaults = self
            .schema
            .iter()
            .filter(|def| include(*def) && def.default_value.is_some())
            .map(|def| (def.name.clone(), def.default_or_zero()))
            .collect::<Vec<_>>();
        for (name, value) in defaults {
            self.values.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let name = normalize(name);
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        self.memory_flags.contains(name).then_some(Value::Bool(true))
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(normalize(name).to_owned(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(normalize(name))
    }

    /// Apply `+ - * /` to the numeric reading of the current value and store the result.
    ///
    /// Absent values count as 0. Division by zero leaves the value untouched.
    pub fn apply_operation(&mut self, name: &str, op: ArithmeticOp, operand: f64) -> Value {
        let name = normalize(name);
        let current = self.get(name).map(|value| value.to_number()).unwrap_or(0.0);
        let Some(result) = op.apply(current, operand) else {
            debug!("ignoring division by zero on ${name}");
            return self.get(name).unwrap_or(Value::Number(current));
        };
        let result = Value::Number(result);
        self.values.insert(name.to_owned(), result.clone());
        result
    }

    /// Execute a parsed `<<set>>`.
    pub fn apply(&mut self, operation: &VariableOperation) -> Value {
        let operand = match operation.operand_variable() {
            Some(other) => self.resolve(other, None),
            None => operation.value(),
        };
        match operation.op.arithmetic() {
            None => {
                self.set(&operation.name, operand.clone());
                operand
            }
            Some(op) => self.apply_operation(&operation.name, op, operand.to_number()),
        }
    }

    pub fn add_memory_flag(&mut self, name: &str) {
        self.memory_flags.insert(normalize(name).to_owned());
    }

    pub fn remove_memory_flag(&mut self, name: &str) -> bool {
        self.memory_flags.remove(normalize(name))
    }

    pub fn has_memory_flag(&self, name: &str) -> bool {
        self.memory_flags.contains(normalize(name))
    }

    /// End of conversation: memory flags are dropped and dialogue-type flags fall back to
    /// their declared defaults (or are cleared when they have none).
    pub fn reset_conversation(&mut self) {
        self.memory_flags.clear();
        let scoped = self
            .schema
            .iter()
            .filter(|def| !def.flag_type.is_persistent())
            .map(|def| def.name.clone())
            .collect::<Vec<_>>();
        for name in &scoped {
            self.values.remove(name);
        }
        self.seed_defaults(|def| !def.flag_type.is_persistent());
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn memory_flags(&self) -> &BTreeSet<String> {
        &self.memory_flags
    }

    /// Present and not explicitly `false`.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| value != Value::Bool(false))
    }

    /// The value a condition sees: stored, else the zero of the declared or inferred type.
    fn resolve(&self, name: &str, inferred: Option<ValueType>) -> Value {
        if let Some(value) = self.get(name) {
            return value;
        }
        let declared = self.schema.get(normalize(name)).map(|def| def.value_type);
        declared.or(inferred).unwrap_or(ValueType::Boolean).zero()
    }

    pub fn evaluate(&self, condition: &Condition) -> bool {
        match condition.operator {
            ConditionOperator::IsSet => self.is_set(&condition.flag),
            ConditionOperator::IsNotSet => !self.is_set(&condition.flag),
            operator => {
                let expected = condition.effective_value();
                let actual = self.resolve(&condition.flag, Some(expected.value_type()));
                compare(&actual, operator, &expected)
            }
        }
    }

    /// All conditions hold (an empty list always holds).
    pub fn evaluate_all(&self, conditions: &[Condition]) -> bool {
        conditions.iter().all(|condition| self.evaluate(condition))
    }

    /// Evaluate condition text as written in `<<if …>>`: terms joined by `&&`/`and`, groups
    /// joined by `||`/`or`. Unparseable terms evaluate to `false`.
    pub fn evaluate_expression(&self, expr: &str) -> bool {
        split_outside_quotes(expr, &["||", " or "]).into_iter().any(|group| {
            split_outside_quotes(group, &["&&", " and "]).into_iter().all(|term| {
                match term.parse::<Condition>() {
                    Ok(condition) => self.evaluate(&condition),
                    Err(err) => {
                        warn!("cannot evaluate condition term: {err}");
                        false
                    }
                }
            })
        })
    }
}

fn compare(actual: &Value, operator: ConditionOperator, expected: &Value) -> bool {
    let ordering = match expected {
        Value::Number(rhs) => actual.to_number().partial_cmp(rhs),
        Value::Bool(rhs) => Some(actual.to_bool().cmp(rhs)),
        Value::Str(rhs) => Some(actual.to_text().as_str().cmp(rhs.as_str())),
    };
    let Some(ordering) = ordering else {
        return operator == ConditionOperator::NotEquals;
    };
    match operator {
        ConditionOperator::Equals => ordering == Ordering::Equal,
        ConditionOperator::NotEquals => ordering != Ordering::Equal,
        ConditionOperator::GreaterThan => ordering == Ordering::Greater,
        ConditionOperator::LessThan => ordering == Ordering::Less,
        ConditionOperator::GreaterEqual => ordering != Ordering::Less,
        ConditionOperator::LessEqual => ordering != Ordering::Greater,
        ConditionOperator::IsSet | ConditionOperator::IsNotSet => false,
    }
}
