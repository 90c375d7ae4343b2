// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::ids::{LineId, NodeId};
use super::operation::VariableOperation;

/// A whole conversation: every node keyed by id, in insertion order.
///
/// Insertion order is the export order, so the same tree always produces the same text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct DialogueTree {
    title: String,
    nodes: IndexMap<NodeId, DialogueNode>,
}

impl DialogueTree {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), nodes: IndexMap::new() }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn nodes(&self) -> &IndexMap<NodeId, DialogueNode> {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut IndexMap<NodeId, DialogueNode> {
        &mut self.nodes
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&DialogueNode> {
        self.nodes.get(node_id)
    }

    pub fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut DialogueNode> {
        self.nodes.get_mut(node_id)
    }

    /// Insert or replace a node; a replaced node keeps its slot in the export order.
    pub fn insert_node(&mut self, node: DialogueNode) -> Option<DialogueNode> {
        self.nodes.insert(node.id().clone(), node)
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Display-only coordinates; never affects conversion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Npc,
    Player,
    Conditional,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Npc => "npc",
            Self::Player => "player",
            Self::Conditional => "conditional",
        }
    }

    /// Inverse of [`NodeType::as_str`].
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "npc" => Some(Self::Npc),
            "player" => Some(Self::Player),
            "conditional" => Some(Self::Conditional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DialogueNode {
    id: NodeId,
    #[serde(default)]
    position: Position,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    /// Extra `key: value` headers, preserved in order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    headers: IndexMap<String, String>,
    kind: NodeKind,
    /// Body lines the converter does not model, kept verbatim so nothing is silently lost.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    unrecognized: Vec<String>,
}

impl DialogueNode {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            position: Position::default(),
            tags: Vec::new(),
            headers: IndexMap::new(),
            kind,
            unrecognized: Vec::new(),
        }
    }

    pub fn npc(id: NodeId, speech: Speech) -> Self {
        Self::new(id, NodeKind::Npc(NpcNode { speech, ..NpcNode::default() }))
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.headers
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    pub fn push_unrecognized(&mut self, line: impl Into<String>) {
        self.unrecognized.push(line.into());
    }

    /// Every outgoing `next` reference, in declaration order (duplicates kept).
    pub fn next_references(&self) -> Vec<&NodeId> {
        match &self.kind {
            NodeKind::Npc(npc) => npc.next.iter().collect(),
            NodeKind::Player(player) => {
                player.choices.iter().filter_map(|choice| choice.next.as_ref()).collect()
            }
            NodeKind::Conditional(conditional) => conditional
                .blocks
                .iter()
                .filter_map(|block| block.next.as_ref())
                .chain(conditional.next.iter())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Npc(NpcNode),
    Player(PlayerNode),
    Conditional(ConditionalNode),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Npc(_) => NodeType::Npc,
            Self::Player(_) => NodeType::Player,
            Self::Conditional(_) => NodeType::Conditional,
        }
    }
}

/// One unit of displayable text: optional speaker, content, and its line identifier.
///
/// Multi-line content is joined with `\n`; only the first line carries the speaker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Speech {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<LineId>,
}

impl Speech {
    pub fn new(speaker: Option<&str>, text: impl Into<String>) -> Self {
        Self { speaker: speaker.map(str::to_owned), text: text.into(), line_id: None }
    }

    pub fn is_empty(&self) -> bool {
        self.speaker.is_none() && self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct NpcNode {
    pub speech: Speech,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<VariableOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NodeId>,
}

impl NpcNode {
    /// Names set to `true` by this node.
    pub fn set_flags(&self) -> impl Iterator<Item = &str> {
        flag_names(&self.operations)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PlayerNode {
    /// Text shown before the choices, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Speech>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<VariableOperation>,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ConditionalNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Speech>,
    pub blocks: Vec<ConditionalBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<VariableOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Choice {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<LineId>,
    /// All must hold for the choice to be offered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<VariableOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NodeId>,
    /// Indented body lines, verbatim, with any indentation beyond the body's own.
    ///
    /// Only a closing `<<set>>` run and `<<jump>>` at the body's own level are lifted into
    /// `operations` and `next`; they are exported after these lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<String>,
}

impl Choice {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    pub fn with_next(mut self, next: NodeId) -> Self {
        self.next = Some(next);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn set_flags(&self) -> impl Iterator<Item = &str> {
        flag_names(&self.operations)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    If,
    ElseIf,
    Else,
}

impl BlockKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::ElseIf => "elseif",
            Self::Else => "else",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionalBlock {
    pub kind: BlockKind,
    /// Condition text as written; absent for `else`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech: Option<Speech>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<VariableOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<String>,
}

impl ConditionalBlock {
    pub fn new(kind: BlockKind, condition: Option<String>) -> Self {
        Self {
            kind,
            condition,
            speech: None,
            operations: Vec::new(),
            next: None,
            body: Vec::new(),
        }
    }
}

fn flag_names(operations: &[VariableOperation]) -> impl Iterator<Item = &str> {
    operations.iter().filter(|op| op.is_flag_set()).map(|op| op.name.as_str())
}
