// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Declared flags: what a variable is for, how long it lives, and what it reads as by default.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    Dialogue,
    Quest,
    Achievement,
    Item,
    Stat,
    Title,
    Global,
}

impl FlagType {
    /// Dialogue flags are conversation-scoped; every other type outlives the conversation.
    pub fn is_persistent(self) -> bool {
        !matches!(self, Self::Dialogue)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlagDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FlagDefinition {
    pub fn new(name: impl Into<String>, flag_type: FlagType, value_type: ValueType) -> Self {
        Self { name: name.into(), flag_type, value_type, default_value: None, description: None }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// The declared default, or the zero value of the declared type.
    pub fn default_or_zero(&self) -> Value {
        self.default_value.clone().unwrap_or_else(|| self.value_type.zero())
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid flag schema JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("flag '{name}' is declared more than once")]
    DuplicateFlag { name: String },
    #[error("flag '{name}' declares a {declared:?} value but its default is {found:?}")]
    DefaultTypeMismatch { name: String, declared: ValueType, found: ValueType },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FlagSchemaFile {
    #[serde(default)]
    flags: Vec<FlagDefinition>,
}

/// The set of known flags, keyed by name in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagSchema {
    flags: IndexMap<String, FlagDefinition>,
}

impl FlagSchema {
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = FlagDefinition>,
    ) -> Result<Self, SchemaError> {
        let mut flags = IndexMap::new();
        for definition in definitions {
            if let Some(default) = &definition.default_value {
                let found = default.value_type();
                if found != definition.value_type {
                    return Err(SchemaError::DefaultTypeMismatch {
                        name: definition.name.clone(),
                        declared: definition.value_type,
                        found,
                    });
                }
            }
            if flags.contains_key(&definition.name) {
                return Err(SchemaError::DuplicateFlag { name: definition.name });
            }
            flags.insert(definition.name.clone(), definition);
        }
        Ok(Self { flags })
    }

    /// Load `{"flags": [ … ]}`.
    pub fn from_json(input: &str) -> Result<Self, SchemaError> {
        let file: FlagSchemaFile = serde_json::from_str(input)?;
        Self::from_definitions(file.flags)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        let file = FlagSchemaFile { flags: self.flags.values().cloned().collect() };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn get(&self, name: &str) -> Option<&FlagDefinition> {
        self.flags.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagDefinition> {
        self.flags.values()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
