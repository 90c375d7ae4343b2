// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use pretty_assertions::assert_eq;
use rstest::rstest;

use super::{export_script, parse_script, parse_script_with_diagnostics, DiagnosticKind};
use crate::model::fixtures::{cyclic_tree, generated_tree, nid, tavern_tree};
use crate::model::{
    AssignOp, BlockKind, Condition, ConditionOperator, ConditionalNode, DialogueNode, DialogueTree,
    NodeKind, NodeType, PlayerNode, Speech, VariableOperation,
};
use crate::state::Value;

fn node<'a>(tree: &'a DialogueTree, id: &str) -> &'a DialogueNode {
    tree.node(&nid(id)).unwrap_or_else(|| panic!("missing node {id}"))
}

fn operations(node: &DialogueNode) -> Vec<VariableOperation> {
    match node.kind() {
        NodeKind::Npc(npc) => npc.operations.clone(),
        NodeKind::Player(player) => player
            .operations
            .iter()
            .chain(player.choices.iter().flat_map(|choice| &choice.operations))
            .cloned()
            .collect(),
        NodeKind::Conditional(conditional) => conditional
            .blocks
            .iter()
            .flat_map(|block| &block.operations)
            .chain(&conditional.operations)
            .cloned()
            .collect(),
    }
}

fn structure(tree: &DialogueTree) -> Vec<(String, NodeType, Vec<VariableOperation>)> {
    tree.nodes()
        .values()
        .map(|node| (node.id().to_string(), node.node_type(), operations(node)))
        .collect()
}

#[test]
fn two_node_script_parses_and_reexports() {
    let input = "title: start\n---\nNPC: Hi\n-> go\n    <<jump end>>\n===\n\ntitle: end\n---\n===\n";
    let tree = parse_script(input, "demo");

    assert_eq!(tree.len(), 2);
    let NodeKind::Player(player) = node(&tree, "start").kind() else {
        panic!("start should be a player node");
    };
    assert_eq!(player.choices.len(), 1);
    assert_eq!(player.choices[0].text, "go");
    assert_eq!(player.choices[0].next, Some(nid("end")));
    let prompt = player.prompt.as_ref().expect("prompt");
    assert_eq!(prompt.speaker.as_deref(), Some("NPC"));
    assert_eq!(prompt.text, "Hi");

    let NodeKind::Npc(end) = node(&tree, "end").kind() else {
        panic!("end should be an npc node");
    };
    assert!(end.speech.is_empty());
    assert_eq!(end.next, None);

    assert_eq!(export_script(&tree), input);
}

#[test]
fn gated_choice_keeps_its_wrapper() {
    let input = "\
title: door
---
<<if $has_key>>
-> Use key
    <<jump unlocked>>
<<endif>>
-> Force
===
";
    let tree = parse_script(input, "t");
    let NodeKind::Player(player) = node(&tree, "door").kind() else {
        panic!("door should be a player node");
    };
    assert_eq!(player.choices.len(), 2);
    assert_eq!(player.choices[0].conditions, vec![Condition::is_set("has_key")]);
    assert_eq!(player.choices[0].next, Some(nid("unlocked")));
    assert!(player.choices[1].conditions.is_empty());

    let exported = export_script(&tree);
    assert_eq!(exported, input);
    assert_eq!(exported.matches("<<if").count(), 1);
    assert_eq!(exported.matches("<<endif>>").count(), 1);
}

#[test]
fn fixture_tree_round_trips_exactly() {
    let tree = tavern_tree();
    let reparsed = parse_script(&export_script(&tree), tree.title());
    assert_eq!(reparsed, tree);
}

#[rstest]
#[case::tavern(tavern_tree())]
#[case::cycle(cyclic_tree())]
fn export_then_parse_preserves_structure(#[case] tree: DialogueTree) {
    let reparsed = parse_script(&export_script(&tree), tree.title());
    assert_eq!(structure(&reparsed), structure(&tree));
}

#[test]
fn operators_and_operands_survive_round_trip() {
    let input = "\
title: shop
---
Merchant: Deal.
<<set $gold += 100>>
<<set $gold-=150>>
<<set $ratio *= 1.5>>
<<set $ratio /= 2>>
<<set $name = \"Ada\">>
<<set $mood = $other>>
===
";
    let tree = parse_script(input, "t");
    let expected = vec![
        VariableOperation::new("gold", AssignOp::Add, "100"),
        VariableOperation::new("gold", AssignOp::Subtract, "150"),
        VariableOperation::new("ratio", AssignOp::Multiply, "1.5"),
        VariableOperation::new("ratio", AssignOp::Divide, "2"),
        VariableOperation::new("name", AssignOp::Assign, "\"Ada\""),
        VariableOperation::new("mood", AssignOp::Assign, "$other"),
    ];
    assert_eq!(operations(node(&tree, "shop")), expected);

    let exported = export_script(&tree);
    assert!(exported.contains("<<set $gold -= 150>>"));
    let reparsed = parse_script(&exported, "t");
    assert_eq!(operations(node(&reparsed, "shop")), expected);
}

#[test]
fn choice_with_several_conditions_exports_one_region() {
    let input = "\
title: gate
---
-> Bribe <<if $gold >= 10 && !$guard_angry and $mood == \"calm\">>
    <<set $gold -= 10>>
    <<jump inside>>
===
";
    let tree = parse_script(input, "t");
    let NodeKind::Player(player) = node(&tree, "gate").kind() else {
        panic!("gate should be a player node");
    };
    let expected = vec![
        Condition::compare("gold", ConditionOperator::GreaterEqual, Value::Number(10.0)),
        Condition::is_not_set("guard_angry"),
        Condition::compare("mood", ConditionOperator::Equals, Value::from("calm")),
    ];
    assert_eq!(player.choices[0].conditions, expected);

    let exported = export_script(&tree);
    assert_eq!(
        exported,
        "\
title: gate
---
<<if $gold >= 10 && !$guard_angry && $mood == \"calm\">>
-> Bribe
    <<set $gold -= 10>>
    <<jump inside>>
<<endif>>
===
"
    );
    let reparsed = parse_script(&exported, "t");
    assert_eq!(reparsed, tree);
}

#[test]
fn else_and_elseif_choices_receive_negated_conditions() {
    let input = "\
title: door
---
<<if $has_key>>
-> Unlock
<<elseif $has_pick>>
-> Pick the lock
<<else>>
-> Knock
<<endif>>
===
";
    let tree = parse_script(input, "t");
    let NodeKind::Player(player) = node(&tree, "door").kind() else {
        panic!("door should be a player node");
    };
    let conditions = player.choices.iter().map(|c| c.conditions.clone()).collect::<Vec<_>>();
    assert_eq!(
        conditions,
        vec![
            vec![Condition::is_set("has_key")],
            vec![Condition::is_not_set("has_key"), Condition::is_set("has_pick")],
            vec![Condition::is_not_set("has_key"), Condition::is_not_set("has_pick")],
        ]
    );

    let reparsed = parse_script(&export_script(&tree), "t");
    assert_eq!(reparsed, tree);
}

#[test]
fn else_after_compound_condition_is_ungated_and_reported() {
    let parsed = parse_script_with_diagnostics(
        "title: a\n---\n<<if $x && $y>>\n-> Both\n<<else>>\n-> Other\n<<endif>>\n===\n",
        "t",
    );
    let NodeKind::Player(player) = node(&parsed.tree, "a").kind() else {
        panic!("a should be a player node");
    };
    assert!(player.choices[1].conditions.is_empty());
    assert!(parsed.diagnostics.iter().any(|d| d.kind == DiagnosticKind::ElseWithoutNegation));
}

#[test]
fn content_only_region_becomes_conditional_node() {
    let input = "\
title: greet
---
Guard: Halt.
<<if $met_guard>>
    Guard: Oh, it's you.
    <<set $friendly = true>>
<<elseif $gold > 50>>
    Guard: Nice purse.
<<else>>
    Guard: Papers, please.
    <<jump papers>>
<<endif>>
<<jump next_scene>>
===
";
    let tree = parse_script(input, "t");
    let NodeKind::Conditional(conditional) = node(&tree, "greet").kind() else {
        panic!("greet should be a conditional node");
    };
    assert_eq!(conditional.prompt.as_ref().map(|s| s.text.as_str()), Some("Halt."));
    let kinds = conditional.blocks.iter().map(|b| b.kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec![BlockKind::If, BlockKind::ElseIf, BlockKind::Else]);
    assert_eq!(conditional.blocks[0].condition.as_deref(), Some("$met_guard"));
    assert_eq!(conditional.blocks[1].condition.as_deref(), Some("$gold > 50"));
    assert_eq!(conditional.blocks[2].condition, None);
    assert_eq!(conditional.blocks[0].operations, vec![VariableOperation::set_flag("friendly")]);
    assert_eq!(conditional.blocks[2].next, Some(nid("papers")));
    assert_eq!(conditional.next, Some(nid("next_scene")));

    assert_eq!(export_script(&tree), input);
}

#[test]
fn unrecognized_commands_are_preserved() {
    let input = "\
title: a
---
Narrator: The wind howls.
<<wait 2>>
<<play_sound wind>>
===
";
    let tree = parse_script(input, "t");
    assert_eq!(node(&tree, "a").unrecognized(), ["<<wait 2>>", "<<play_sound wind>>"]);
    assert_eq!(export_script(&tree), input);
}

#[test]
fn choice_bodies_keep_unknown_lines() {
    let input = "\
title: a
---
-> Wave
    Player: Hello there!
    <<wave>>
    <<set $waved = true>>
    <<jump b>>
-> Leave
===
";
    let tree = parse_script(input, "t");
    let NodeKind::Player(player) = node(&tree, "a").kind() else {
        panic!("a should be a player node");
    };
    assert_eq!(player.choices[0].body, vec!["Player: Hello there!", "<<wave>>"]);
    assert_eq!(player.choices[0].operations, vec![VariableOperation::set_flag("waved")]);
    assert_eq!(export_script(&tree), input);
}

#[test]
fn multiline_content_accumulates_into_one_node() {
    let tree = parse_script(
        "title: a\n---\n// narrator block\nNarrator: It was dark. #line:a1\nVery dark.\n\nBob: Hm.\n===\n",
        "t",
    );
    let NodeKind::Npc(npc) = node(&tree, "a").kind() else {
        panic!("a should be an npc node");
    };
    assert_eq!(npc.speech.speaker.as_deref(), Some("Narrator"));
    assert_eq!(npc.speech.text, "It was dark.\nVery dark.\nBob: Hm.");
    assert_eq!(npc.speech.line_id.as_ref().map(|id| id.as_str()), Some("a1"));
    assert_eq!(tree.len(), 1);
}

#[test]
fn interpolation_passes_through_untouched() {
    let input = "title: a\n---\nGuard: Hello, {$player_name}.\n===\n";
    let tree = parse_script(input, "t");
    assert_eq!(export_script(&tree), input);
}

#[test]
fn malformed_input_is_recovered_with_diagnostics() {
    let input = "\
title: a
---
<<endif>>
<<jump {$dest}>>
-> Go <<if $a || $b>>
===

---
orphan body
===

title: a
---
duplicate
===

title: has space
---
===

title: b
---
<<if $open>>
Door: Creak.
";
    let parsed = parse_script_with_diagnostics(input, "t");
    let kinds = parsed.diagnostics.iter().map(|d| d.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::StrayConditional,
            DiagnosticKind::InvalidJumpTarget,
            DiagnosticKind::ConditionTerm,
            DiagnosticKind::MissingTitle,
            DiagnosticKind::DuplicateNode,
            DiagnosticKind::InvalidNodeId,
            DiagnosticKind::UnterminatedConditional,
            DiagnosticKind::UnterminatedNode,
        ]
    );
    assert_eq!(parsed.diagnostics[0].line_no, 3);

    let tree = &parsed.tree;
    assert_eq!(tree.len(), 2);
    assert_eq!(node(tree, "a").unrecognized(), ["<<endif>>", "<<jump {$dest}>>"]);
    assert_eq!(node(tree, "a").node_type(), NodeType::Player);
    assert_eq!(node(tree, "b").node_type(), NodeType::Conditional);
}

#[test]
fn player_node_level_jump_is_kept_verbatim() {
    let input = "title: a\n---\n-> One\n    <<jump b>>\n<<jump c>>\n===\n";
    let tree = parse_script(input, "t");
    assert_eq!(node(&tree, "a").unrecognized(), ["<<jump c>>"]);
    assert_eq!(export_script(&tree), input);
}

#[test]
fn indented_choices_inside_regions_collect_their_bodies() {
    let tree = parse_script(
        "title: a\n---\n<<if $x>>\n    -> Deep\n        <<set $y += 1>>\n        <<jump b>>\n    Stray text\n<<endif>>\n===\n",
        "t",
    );
    let NodeKind::Player(player) = node(&tree, "a").kind() else {
        panic!("a should be a player node");
    };
    assert_eq!(player.choices[0].next, Some(nid("b")));
    assert_eq!(
        player.choices[0].operations,
        vec![VariableOperation::new("y", AssignOp::Add, "1")]
    );
    assert_eq!(node(&tree, "a").unrecognized(), ["Stray text"]);
}

#[test]
fn commands_nested_in_a_choice_body_stay_nested() {
    let input = "\
title: a
---
-> Open
    <<if $x>>
        <<set $y = 1>>
    <<endif>>
-> Pay
    <<set $paid = true>>
    Ferryman: Thanks.
    <<jump dock>>
===
";
    let tree = parse_script(input, "t");
    let NodeKind::Player(player) = node(&tree, "a").kind() else {
        panic!("a should be a player node");
    };
    assert!(player.choices[0].operations.is_empty());
    assert_eq!(player.choices[0].body, vec!["<<if $x>>", "    <<set $y = 1>>", "<<endif>>"]);
    assert!(player.choices[1].operations.is_empty());
    assert_eq!(player.choices[1].body, vec!["<<set $paid = true>>", "Ferryman: Thanks."]);
    assert_eq!(player.choices[1].next, Some(nid("dock")));
    assert_eq!(export_script(&tree), input);
}

#[test]
fn commands_nested_in_a_block_stay_nested() {
    let input = "\
title: b
---
<<if $open>>
    Door: Creak.
    <<if $loud>>
        <<set $woken = true>>
        <<jump hall>>
    <<endif>>
<<endif>>
===
";
    let tree = parse_script(input, "t");
    let NodeKind::Conditional(conditional) = node(&tree, "b").kind() else {
        panic!("b should be a conditional node");
    };
    let block = &conditional.blocks[0];
    assert_eq!(block.speech.as_ref().map(|speech| speech.text.as_str()), Some("Creak."));
    assert!(block.operations.is_empty());
    assert_eq!(block.next, None);
    assert_eq!(
        block.body,
        vec!["<<if $loud>>", "    <<set $woken = true>>", "    <<jump hall>>", "<<endif>>"]
    );
    assert!(node(&tree, "b").next_references().is_empty());
    assert_eq!(export_script(&tree), input);
}

#[test]
fn nested_choice_keeps_its_own_jump() {
    let input = "\
title: a
---
-> Outer
    -> Inner
        <<jump b>>
-> Other
    -> Deeper
        <<set $x = 1>>
    <<jump c>>
===
";
    let tree = parse_script(input, "t");
    let NodeKind::Player(player) = node(&tree, "a").kind() else {
        panic!("a should be a player node");
    };
    assert_eq!(player.choices.len(), 2);
    assert_eq!(player.choices[0].next, None);
    assert_eq!(player.choices[0].body, vec!["-> Inner", "    <<jump b>>"]);
    assert_eq!(player.choices[1].next, Some(nid("c")));
    assert!(player.choices[1].operations.is_empty());
    assert_eq!(player.choices[1].body, vec!["-> Deeper", "    <<set $x = 1>>"]);
    assert_eq!(node(&tree, "a").next_references(), vec![&nid("c")]);
    assert_eq!(export_script(&tree), input);
}

#[rstest]
#[case::player(NodeKind::Player(PlayerNode::default()), NodeType::Player)]
#[case::conditional(NodeKind::Conditional(ConditionalNode::default()), NodeType::Conditional)]
fn choiceless_and_blockless_nodes_keep_their_type(
    #[case] kind: NodeKind,
    #[case] expected: NodeType,
) {
    let mut tree = DialogueTree::new("t");
    tree.insert_node(DialogueNode::new(nid("a"), kind));

    let text = export_script(&tree);
    assert_eq!(text, format!("title: a\nnodeType: {}\n---\n===\n", expected.as_str()));
    let reparsed = parse_script(&text, "t");
    assert_eq!(node(&reparsed, "a").node_type(), expected);
    assert_eq!(reparsed, tree);
}

#[test]
fn node_type_header_is_only_a_hint() {
    let tree = parse_script(
        "title: a\nnodeType: conditional\n---\n-> Go\n===\n\ntitle: b\nnodeType: dialogue\n---\nHi.\n===\n",
        "t",
    );
    assert_eq!(node(&tree, "a").node_type(), NodeType::Player);
    assert!(node(&tree, "a").headers().is_empty());
    assert_eq!(node(&tree, "b").node_type(), NodeType::Npc);
    assert_eq!(node(&tree, "b").headers().get("nodeType").map(String::as_str), Some("dialogue"));
}

#[rstest]
#[case(1)]
#[case(6)]
#[case(13)]
#[case(48)]
fn generated_trees_round_trip(#[case] nodes: usize) {
    let tree = generated_tree(nodes);
    let text = export_script(&tree);
    let parsed = parse_script_with_diagnostics(&text, tree.title());
    assert!(parsed.diagnostics.is_empty(), "unexpected diagnostics: {:?}", parsed.diagnostics);
    assert_eq!(parsed.tree, tree);
    assert_eq!(export_script(&parsed.tree), text);
}

#[test]
fn text_that_looks_like_markup_is_escaped() {
    let mut tree = DialogueTree::new("t");
    tree.insert_node(DialogueNode::npc(nid("a"), Speech::new(None, "-> not a choice")));
    tree.insert_node(DialogueNode::npc(
        nid("b"),
        Speech::new(Some("Guard"), "Listen.\n<<jump a>>\n==="),
    ));

    let text = export_script(&tree);
    assert_eq!(
        text,
        "title: a\n---\n\\-> not a choice\n===\n\ntitle: b\n---\nGuard: Listen.\n\\<<jump a>>\n\\===\n===\n"
    );
    let reparsed = parse_script(&text, "t");
    assert_eq!(node(&reparsed, "a").node_type(), NodeType::Npc);
    assert!(node(&reparsed, "b").next_references().is_empty());
    assert_eq!(reparsed, tree);
}

#[test]
fn node_operations_keep_their_place_among_commands() {
    let input = "title: a\n---\n<<set $a = 1>>\n<<wait 2>>\n===\n";
    let tree = parse_script(input, "t");
    assert!(operations(node(&tree, "a")).is_empty());
    assert_eq!(node(&tree, "a").unrecognized(), ["<<set $a = 1>>", "<<wait 2>>"]);
    assert_eq!(export_script(&tree), input);

    let input = "title: a\n---\nNarrator: Hush.\n<<wait 2>>\n<<set $a = 1>>\n<<jump b>>\n===\n";
    let tree = parse_script(input, "t");
    assert_eq!(operations(node(&tree, "a")), vec![VariableOperation::new("a", AssignOp::Assign, "1")]);
    assert_eq!(node(&tree, "a").next_references(), vec![&nid("b")]);
    assert_eq!(node(&tree, "a").unrecognized(), ["<<wait 2>>"]);
    assert_eq!(export_script(&tree), input);

    // Nothing after the first jump runs, so nothing after it is lifted.
    let input = "title: a\n---\n<<jump b>>\n<<set $late = true>>\n===\n";
    let tree = parse_script(input, "t");
    assert!(operations(node(&tree, "a")).is_empty());
    assert!(node(&tree, "a").next_references().is_empty());
    assert_eq!(export_script(&tree), input);
}
