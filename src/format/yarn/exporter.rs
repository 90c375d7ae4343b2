// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt::Write as _;

use super::tokenizer::{escape_text_line, BODY_START, LINE_TAG, NODE_END, NODE_TYPE_HEADER};
use crate::model::{
    render_conditions, BlockKind, Choice, ConditionalNode, DialogueNode, DialogueTree, NodeId,
    NodeKind, NodeType, NpcNode, PlayerNode, Speech, VariableOperation,
};
use crate::state::format_number;

const INDENT: &str = "    ";

/// Render a dialogue tree as script text.
///
/// Nodes are emitted in the tree's insertion order, so the output is deterministic.
pub fn export_script(tree: &DialogueTree) -> String {
    let mut out = String::new();
    for (idx, node) in tree.nodes().values().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        export_node(&mut out, node);
    }
    out
}

fn export_node(out: &mut String, node: &DialogueNode) {
    push_line(out, "", &format!("title: {}", node.id()));
    let position = node.position();
    if !position.is_origin() {
        push_line(
            out,
            "",
            &format!("position: {},{}", format_number(position.x), format_number(position.y)),
        );
    }
    if !node.tags().is_empty() {
        push_line(out, "", &format!("tags: {}", node.tags().join(" ")));
    }
    for (key, value) in node.headers() {
        if key == NODE_TYPE_HEADER && NodeType::from_keyword(value).is_some() {
            continue;
        }
        push_line(out, "", &format!("{key}: {value}"));
    }
    if let Some(node_type) = ambiguous_type(node.kind()) {
        push_line(out, "", &format!("{NODE_TYPE_HEADER}: {}", node_type.as_str()));
    }
    push_line(out, "", BODY_START);

    match node.kind() {
        NodeKind::Npc(npc) => export_npc(out, npc, node.unrecognized()),
        NodeKind::Player(player) => export_player(out, player, node.unrecognized()),
        NodeKind::Conditional(conditional) => {
            export_conditional(out, conditional, node.unrecognized())
        }
    }

    push_line(out, "", NODE_END);
}

/// A player without choices or a conditional without blocks would read back as npc.
fn ambiguous_type(kind: &NodeKind) -> Option<NodeType> {
    match kind {
        NodeKind::Player(player) if player.choices.is_empty() => Some(NodeType::Player),
        NodeKind::Conditional(conditional) if conditional.blocks.is_empty() => {
            Some(NodeType::Conditional)
        }
        _ => None,
    }
}

fn export_npc(out: &mut String, npc: &NpcNode, unrecognized: &[String]) {
    push_speech(out, "", &npc.speech);
    push_verbatim(out, "", unrecognized);
    push_operations(out, "", &npc.operations);
    push_jump(out, "", npc.next.as_ref());
}

fn export_player(out: &mut String, player: &PlayerNode, unrecognized: &[String]) {
    if let Some(prompt) = &player.prompt {
        push_speech(out, "", prompt);
    }
    push_operations(out, "", &player.operations);
    for choice in &player.choices {
        export_choice(out, choice);
    }
    push_verbatim(out, "", unrecognized);
}

/// A gated choice is always wrapped in its own `<<if>>…<<endif>>`.
fn export_choice(out: &mut String, choice: &Choice) {
    let gated = !choice.conditions.is_empty();
    if gated {
        push_line(out, "", &format!("<<if {}>>", render_conditions(&choice.conditions)));
    }

    let mut line = String::from("->");
    if !choice.text.is_empty() {
        line.push(' ');
        line.push_str(&choice.text);
    }
    push_tagged_line(out, "", &line, choice.line_id.as_ref().map(|id| id.as_str()));

    push_verbatim(out, INDENT, &choice.body);
    push_operations(out, INDENT, &choice.operations);
    push_jump(out, INDENT, choice.next.as_ref());

    if gated {
        push_line(out, "", "<<endif>>");
    }
}

fn export_conditional(out: &mut String, conditional: &ConditionalNode, unrecognized: &[String]) {
    if let Some(prompt) = &conditional.prompt {
        push_speech(out, "", prompt);
    }

    for (idx, block) in conditional.blocks.iter().enumerate() {
        let opener = match block.kind {
            BlockKind::Else => "<<else>>".to_owned(),
            kind => {
                let expr = block.condition.as_deref().map(str::trim).unwrap_or_default();
                let expr = if expr.is_empty() { "true" } else { expr };
                format!("<<{} {expr}>>", kind.keyword())
            }
        };
        // A new `if` after the first starts a fresh region.
        if idx > 0 && block.kind == BlockKind::If {
            push_line(out, "", "<<endif>>");
        }
        push_line(out, "", &opener);
        if let Some(speech) = &block.speech {
            push_speech(out, INDENT, speech);
        }
        push_verbatim(out, INDENT, &block.body);
        push_operations(out, INDENT, &block.operations);
        push_jump(out, INDENT, block.next.as_ref());
    }
    if !conditional.blocks.is_empty() {
        push_line(out, "", "<<endif>>");
    }

    push_verbatim(out, "", unrecognized);
    push_operations(out, "", &conditional.operations);
    push_jump(out, "", conditional.next.as_ref());
}

fn push_speech(out: &mut String, indent: &str, speech: &Speech) {
    if speech.is_empty() {
        return;
    }
    let mut lines = speech.text.split('\n');
    let first = lines.next().unwrap_or_default();
    let first = match &speech.speaker {
        Some(speaker) if first.is_empty() => format!("{speaker}:"),
        Some(speaker) => format!("{speaker}: {first}"),
        None => escape_text_line(first, false).into_owned(),
    };
    push_tagged_line(out, indent, &first, speech.line_id.as_ref().map(|id| id.as_str()));
    for line in lines {
        push_line(out, indent, &escape_text_line(line, true));
    }
}

fn push_operations(out: &mut String, indent: &str, operations: &[VariableOperation]) {
    for operation in operations {
        push_line(out, indent, &operation.to_string());
    }
}

fn push_jump(out: &mut String, indent: &str, next: Option<&NodeId>) {
    if let Some(next) = next {
        push_line(out, indent, &format!("<<jump {next}>>"));
    }
}

fn push_verbatim(out: &mut String, indent: &str, lines: &[String]) {
    for line in lines {
        push_line(out, indent, line);
    }
}

fn push_tagged_line(out: &mut String, indent: &str, line: &str, line_id: Option<&str>) {
    match line_id {
        Some(id) => push_line(out, indent, &format!("{line} {LINE_TAG}{id}")),
        None => push_line(out, indent, line),
    }
}

fn push_line(out: &mut String, indent: &str, line: &str) {
    let _ = writeln!(out, "{indent}{line}");
}
