// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::fmt::Write as _;

use yarnloom::format::yarn::parse_script;
use yarnloom::model::DialogueTree;

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    Medium,
    LargeBranchy,
}

#[derive(Debug, Clone, Copy)]
pub struct ScriptParams {
    pub nodes: usize,
    pub choices: usize,
    /// Every n-th player node gets a choice jumping back to the start.
    pub loop_every: usize,
}

impl ScriptParams {
    pub fn new(nodes: usize, choices: usize, loop_every: usize) -> Self {
        Self { nodes, choices, loop_every: loop_every.max(1) }
    }
}

pub fn params(case: Case) -> ScriptParams {
    match case {
        Case::Small => ScriptParams::new(12, 2, 4),
        Case::Medium => ScriptParams::new(120, 3, 6),
        Case::LargeBranchy => ScriptParams::new(900, 5, 9),
    }
}

/// Cycles through npc, player, and conditional nodes; jumps only reach forward except for the
/// periodic loop back to `n0`.
pub fn script(params: ScriptParams) -> String {
    let mut out = String::new();
    let n = params.nodes.max(1);
    for idx in 0..n {
        if idx > 0 {
            out.push('\n');
        }
        let next = (idx + 1).min(n - 1);
        let _ = writeln!(out, "title: n{idx}");
        if idx % 5 == 0 {
            let _ = writeln!(out, "tags: act{} generated", idx / 50);
        }
        out.push_str("---\n");
        match idx % 3 {
            0 => {
                let _ = writeln!(out, "Speaker{}: Line {idx} with {{$name}} in it.", idx % 7);
                let _ = writeln!(out, "<<set $visited_{idx} = true>>");
                let _ = writeln!(out, "<<set $score += {}>>", idx % 11);
                if next != idx {
                    let _ = writeln!(out, "<<jump n{next}>>");
                }
            }
            1 => {
                let _ = writeln!(out, "Guide: Choose wisely ({idx}).");
                for choice in 0..params.choices {
                    let target = if choice == 0 && idx % params.loop_every == 1 {
                        0
                    } else {
                        (idx + choice + 1).min(n - 1)
                    };
                    let gated = choice % 2 == 1;
                    if gated {
                        let _ = writeln!(out, "<<if $score >= {} && $visited_{}>>", choice * 3, idx - 1);
                    }
                    let _ = writeln!(out, "-> Option {choice} of node {idx}");
                    let _ = writeln!(out, "    <<set $picked_{choice} = true>>");
                    let _ = writeln!(out, "    <<jump n{target}>>");
                    if gated {
                        out.push_str("<<endif>>\n");
                    }
                }
            }
            _ => {
                let _ = writeln!(out, "<<if $score > {}>>", idx % 13);
                let _ = writeln!(out, "    Narrator: High road at {idx}.");
                let _ = writeln!(out, "<<elseif $visited_{}>>", idx - 2);
                out.push_str("    Narrator: Middle road.\n");
                out.push_str("<<else>>\n");
                out.push_str("    Narrator: Low road.\n");
                out.push_str("<<endif>>\n");
                if next != idx {
                    let _ = writeln!(out, "<<jump n{next}>>");
                }
            }
        }
        out.push_str("===\n");
    }
    out
}

pub fn fixture(case: Case) -> DialogueTree {
    parse_script(&script(params(case)), "bench")
}

pub fn checksum_tree(tree: &DialogueTree) -> u64 {
    let mut acc = 0u64;
    for (node_id, node) in tree.nodes() {
        acc = acc.wrapping_mul(131).wrapping_add(node_id.as_str().len() as u64);
        acc = acc.wrapping_add(node.next_references().len() as u64);
        acc = acc.wrapping_add(node.position().x.to_bits() ^ node.position().y.to_bits());
    }
    acc
}
