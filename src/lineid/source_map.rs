// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{for_each_text, TextContext};
use crate::model::{BlockKind, DialogueTree, LineId, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Content,
    Choice,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceMapEntry {
    pub line_id: LineId,
    pub node_id: NodeId,
    pub kind: EntryKind,
    /// Choice or block index within the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_kind: Option<BlockKind>,
    /// 1-based line in the exported script, once correlated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
}

/// Line identifier → graph element (and script line, once correlated).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceMap {
    entries: IndexMap<String, SourceMapEntry>,
}

impl SourceMap {
    pub fn get(&self, line_id: &str) -> Option<&SourceMapEntry> {
        self.entries.get(line_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &SourceMapEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Script line → graph element.
    pub fn entry_at_line(&self, line_number: usize) -> Option<&SourceMapEntry> {
        self.entries.values().find(|entry| entry.line_number == Some(line_number))
    }

    /// Graph element → script line.
    pub fn line_of(&self, line_id: &str) -> Option<usize> {
        self.entries.get(line_id).and_then(|entry| entry.line_number)
    }
}

/// Derive the source map from line identifiers already present on the tree.
pub fn create_source_map(tree: &DialogueTree) -> SourceMap {
    let mut entries = IndexMap::new();
    for node in tree.nodes().values() {
        let block_kinds = match node.kind() {
            NodeKind::Conditional(conditional) => {
                conditional.blocks.iter().map(|block| block.kind).collect()
            }
            _ => Vec::new(),
        };
        for_each_text(node, |context, line_id, _| {
            let Some(line_id) = line_id else {
                return;
            };
            let (kind, index, block_kind) = match context {
                TextContext::Content => (EntryKind::Content, None, None),
                TextContext::Choice(idx) => (EntryKind::Choice, Some(idx), None),
                TextContext::Block(idx) => {
                    (EntryKind::Block, Some(idx), block_kinds.get(idx).copied())
                }
            };
            entries.insert(
                line_id.to_string(),
                SourceMapEntry {
                    line_id: line_id.clone(),
                    node_id: node.id().clone(),
                    kind,
                    index,
                    block_kind,
                    line_number: None,
                },
            );
        });
    }
    SourceMap { entries }
}

static LINE_TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)#line:(\S+)").expect("line tag pattern compiles"));

/// Record the 1-based script line of every `#line:<id>` tag found in `text`.
///
/// Returns how many entries were correlated. Tags with no matching entry are ignored.
pub fn update_source_map_with_script_lines(source_map: &mut SourceMap, text: &str) -> usize {
    let mut matched = 0usize;
    for (idx, line) in text.lines().enumerate() {
        for captures in LINE_TAG_PATTERN.captures_iter(line) {
            let Some(id) = captures.get(1) else {
                continue;
            };
            if let Some(entry) = source_map.entries.get_mut(id.as_str()) {
                entry.line_number = Some(idx + 1);
                matched += 1;
            }
        }
    }
    matched
}
