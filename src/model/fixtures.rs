// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::dialogue::{
    BlockKind, Choice, ConditionalBlock, ConditionalNode, DialogueNode, DialogueTree, NodeKind,
    NpcNode, PlayerNode, Position, Speech,
};
use super::ids::{LineId, NodeId};
use super::{AssignOp, Condition, ConditionOperator, VariableOperation};
use crate::state::Value;

pub(crate) fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn npc(id: &str, speaker: &str, text: &str, next: Option<&str>) -> DialogueNode {
    let mut node = DialogueNode::npc(nid(id), Speech::new(Some(speaker), text));
    if let NodeKind::Npc(body) = node.kind_mut() {
        body.next = next.map(nid);
    }
    node
}

/// start → gate → {inside, outside} → end, with a conditional ending.
pub(crate) fn tavern_tree() -> DialogueTree {
    let mut tree = DialogueTree::new("tavern");

    let mut start = npc("start", "Barkeep", "Welcome, stranger.", Some("gate"));
    if let NodeKind::Npc(body) = start.kind_mut() {
        body.operations.push(VariableOperation::set_flag("met_barkeep"));
    }
    tree.insert_node(start);

    let gate = DialogueNode::new(
        nid("gate"),
        NodeKind::Player(PlayerNode {
            prompt: Some(Speech::new(Some("Barkeep"), "What'll it be?")),
            operations: Vec::new(),
            choices: vec![
                Choice::new("Buy a round")
                    .with_condition(Condition::compare(
                        "gold",
                        ConditionOperator::GreaterEqual,
                        Value::Number(10.0),
                    ))
                    .with_next(nid("inside")),
                Choice::new("Leave").with_next(nid("outside")),
            ],
        }),
    );
    tree.insert_node(gate);

    tree.insert_node(npc("inside", "Barkeep", "Cheers!", Some("end")));
    tree.insert_node(npc("outside", "Barkeep", "Suit yourself.", Some("end")));

    let mut friendly = ConditionalBlock::new(BlockKind::If, Some("$met_barkeep".to_owned()));
    friendly.speech = Some(Speech::new(Some("Barkeep"), "Come back soon."));
    let mut cold = ConditionalBlock::new(BlockKind::Else, None);
    cold.speech = Some(Speech::new(Some("Barkeep"), "Who are you again?"));
    tree.insert_node(DialogueNode::new(
        nid("end"),
        NodeKind::Conditional(ConditionalNode {
            prompt: None,
            blocks: vec![friendly, cold],
            operations: Vec::new(),
            next: None,
        }),
    ));

    tree
}

/// a → b → c → a plus an isolated node, for cycle and disconnected-component handling.
pub(crate) fn cyclic_tree() -> DialogueTree {
    let mut tree = DialogueTree::new("loop");
    tree.insert_node(npc("a", "A", "one", Some("b")));
    tree.insert_node(npc("b", "B", "two", Some("c")));
    tree.insert_node(npc("c", "C", "three", Some("a")));
    tree.insert_node(npc("island", "I", "alone", None));
    tree
}

fn tagged(speaker: Option<&str>, text: &str, line_id: Option<String>) -> Speech {
    let mut speech = Speech::new(speaker, text);
    speech.line_id = line_id.map(|id| LineId::new(id).expect("line id"));
    speech
}

/// `nodes` nodes cycling through every shape an editor can build: choiceless players,
/// blockless conditionals, text that looks like markup, and bodies with nested regions and
/// nested choices. Deterministic, no RNG.
pub(crate) fn generated_tree(nodes: usize) -> DialogueTree {
    let n = nodes.max(1);
    let node_id = |idx: usize| nid(&format!("g{}", idx % n));
    let mut tree = DialogueTree::new(format!("generated_{n}"));

    for idx in 0..n {
        let next = (idx + 1 < n).then(|| node_id(idx + 1));
        let kind = match idx % 6 {
            0 => NodeKind::Npc(NpcNode {
                speech: tagged(
                    Some("Guide"),
                    &format!("Line {idx} for {{$name}}."),
                    (idx % 4 == 0).then(|| format!("gen_{idx}")),
                ),
                operations: vec![
                    VariableOperation::set_flag(format!("visited_{idx}")),
                    VariableOperation::new("score", AssignOp::Add, (idx % 5 + 1).to_string()),
                ],
                next,
            }),
            1 => NodeKind::Npc(NpcNode {
                speech: Speech::new(None, "-> not a choice\n<<wait 1>>\n\nNote: still text\n==="),
                operations: Vec::new(),
                next,
            }),
            2 => NodeKind::Player(PlayerNode {
                prompt: Some(Speech::new(Some("Guide"), format!("Choose ({idx})."))),
                operations: Vec::new(),
                choices: vec![
                    Choice {
                        line_id: Some(LineId::new(format!("gen_{idx}_go")).expect("line id")),
                        operations: vec![VariableOperation::set_flag(format!("picked_{idx}"))],
                        next: Some(node_id(idx + 1)),
                        ..Choice::new("Go on")
                    },
                    Choice {
                        conditions: vec![
                            Condition::is_set(format!("visited_{}", idx - 2)),
                            Condition::compare(
                                "score",
                                ConditionOperator::GreaterEqual,
                                Value::Number(3.0),
                            ),
                        ],
                        body: vec![
                            "Player: Fine.".to_owned(),
                            "<<if $score > 2>>".to_owned(),
                            "    <<set $bonus = true>>".to_owned(),
                            "<<endif>>".to_owned(),
                        ],
                        next: Some(node_id(0)),
                        ..Choice::new("Start over")
                    },
                    Choice {
                        body: vec!["-> Inner question".to_owned(), format!("    <<jump g{idx}>>")],
                        ..Choice::new("Ask again")
                    },
                ],
            }),
            3 => NodeKind::Player(PlayerNode {
                prompt: Some(Speech::new(Some("Guide"), "Nothing to pick yet.")),
                operations: vec![VariableOperation::set_flag(format!("waited_{idx}"))],
                choices: Vec::new(),
            }),
            4 => {
                let mut high =
                    ConditionalBlock::new(BlockKind::If, Some(format!("$score > {}", idx % 7)));
                high.speech = Some(tagged(
                    Some("Narrator"),
                    &format!("High road {idx}."),
                    Some(format!("gen_{idx}_high")),
                ));
                high.operations = vec![VariableOperation::new("score", AssignOp::Subtract, "1")];
                let mut middle =
                    ConditionalBlock::new(BlockKind::ElseIf, Some(format!("$visited_{}", idx - 4)));
                middle.speech = Some(Speech::new(Some("Narrator"), "Middle road."));
                middle.body = vec![
                    "<<if $lost>>".to_owned(),
                    "    <<jump g0>>".to_owned(),
                    "<<endif>>".to_owned(),
                ];
                let mut low = ConditionalBlock::new(BlockKind::Else, None);
                low.body = vec!["<<shake>>".to_owned(), "Narrator: After the shake.".to_owned()];
                low.next = next.clone();
                NodeKind::Conditional(ConditionalNode {
                    prompt: Some(Speech::new(Some("Narrator"), "The road forks.")),
                    blocks: vec![high, middle, low],
                    operations: vec![VariableOperation::set_flag(format!("forked_{idx}"))],
                    next,
                })
            }
            _ => NodeKind::Conditional(ConditionalNode {
                prompt: Some(Speech::new(None, "Waiting for the ferry.")),
                blocks: Vec::new(),
                operations: Vec::new(),
                next,
            }),
        };

        let mut node = DialogueNode::new(node_id(idx), kind);
        if idx % 4 == 1 {
            node.set_position(Position::new(idx as f64 * 40.0, -12.5));
        }
        if idx % 5 == 0 {
            node.set_tags(vec![format!("act{}", idx / 5), "generated".to_owned()]);
        }
        if idx % 7 == 3 {
            node.headers_mut().insert("colorID".to_owned(), (idx % 4).to_string());
        }
        match idx % 12 {
            0 => node.push_unrecognized("<<play_sound bell>>"),
            2 => node.push_unrecognized("<<fade>>"),
            5 | 11 => node.push_unrecognized(format!("<<wait {}>>", idx % 3 + 1)),
            _ => {}
        }
        tree.insert_node(node);
    }
    tree
}
