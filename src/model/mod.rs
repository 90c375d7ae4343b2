// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A dialogue tree owns its nodes; each node is one of three payload shapes (npc, player,
//! conditional). Conditions, variable operations, and flag declarations are shared by the
//! script format and the variable store.

pub mod condition;
pub mod dialogue;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod flags;
pub mod ids;
pub mod operation;

pub use condition::{
    parse_conditions, render_conditions, Condition, ConditionOperator, ConditionParseError,
};
pub use dialogue::{
    BlockKind, Choice, ConditionalBlock, ConditionalNode, DialogueNode, DialogueTree, NodeKind,
    NodeType, NpcNode, PlayerNode, Position, Speech,
};
pub use flags::{FlagDefinition, FlagSchema, FlagType, SchemaError};
pub use ids::{Id, IdError, LineId, NodeId};
pub use operation::{AssignOp, VariableOperation};
