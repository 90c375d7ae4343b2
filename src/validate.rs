// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{DialogueTree, NodeId, NodeKind};

/// Where a `next` reference lives inside its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum ReferenceSource {
    Node,
    Choice(usize),
    Block(usize),
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Choice(idx) => write!(f, "choice {idx}"),
            Self::Block(idx) => write!(f, "block {idx}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DanglingReference {
    pub node_id: NodeId,
    pub source: ReferenceSource,
    pub target: NodeId,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) jumps to missing node '{}'", self.node_id, self.source, self.target)
    }
}

/// Every `next` whose target node does not exist, in tree order.
pub fn find_dangling_references(tree: &DialogueTree) -> Vec<DanglingReference> {
    let mut dangling = Vec::new();
    for node in tree.nodes().values() {
        let mut check = |source: ReferenceSource, target: Option<&NodeId>| {
            let Some(target) = target else {
                return;
            };
            if !tree.contains(target) {
                dangling.push(DanglingReference {
                    node_id: node.id().clone(),
                    source,
                    target: target.clone(),
                });
            }
        };
        match node.kind() {
            NodeKind::Npc(npc) => check(ReferenceSource::Node, npc.next.as_ref()),
            NodeKind::Player(player) => {
                for (idx, choice) in player.choices.iter().enumerate() {
                    check(ReferenceSource::Choice(idx), choice.next.as_ref());
                }
            }
            NodeKind::Conditional(conditional) => {
                for (idx, block) in conditional.blocks.iter().enumerate() {
                    check(ReferenceSource::Block(idx), block.next.as_ref());
                }
                check(ReferenceSource::Node, conditional.next.as_ref());
            }
        }
    }
    for reference in &dangling {
        warn!("dangling reference: {reference}");
    }
    dangling
}
