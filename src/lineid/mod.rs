// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Line identifiers for displayable text, and the source map that ties them to script lines.
//!
//! Identifiers follow `<prefix>_<node>_<context>[_<index>]` and are stable: text that already
//! carries an identifier keeps it, so localization tables keyed on them stay valid.

pub mod source_map;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{DialogueNode, DialogueTree, LineId, NodeKind, Speech};

pub use source_map::{
    create_source_map, update_source_map_with_script_lines, EntryKind, SourceMap, SourceMapEntry,
};

const DEFAULT_PREFIX: &str = "line";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LineIdOptions {
    pub prefix: String,
    /// Regenerate identifiers even where text already carries one.
    pub overwrite: bool,
}

impl Default for LineIdOptions {
    fn default() -> Self {
        Self { prefix: DEFAULT_PREFIX.to_owned(), overwrite: false }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineIdResult {
    pub tree: DialogueTree,
    /// Identifier → text, in tree order.
    pub line_ids: IndexMap<String, String>,
    pub total_lines: usize,
}

/// Give every non-empty piece of displayable text a line identifier.
///
/// Covers node content, each choice, and each conditional block's content. Running this twice
/// on an unmodified tree yields the same identifiers.
pub fn ensure_line_ids(tree: &DialogueTree, options: &LineIdOptions) -> LineIdResult {
    let prefix = sanitize(&options.prefix).unwrap_or_else(|| DEFAULT_PREFIX.to_owned());
    let mut tree = tree.clone();

    let mut used = BTreeSet::<String>::new();
    if !options.overwrite {
        for node in tree.nodes().values() {
            for_each_text(node, |_, line_id, _| {
                if let Some(id) = line_id {
                    used.insert(id.to_string());
                }
            });
        }
    }

    // Existing ids already handed out; a later copy of one gets a fresh id.
    let mut claimed = BTreeSet::<String>::new();
    let mut line_ids = IndexMap::new();
    let mut assigned = 0usize;
    for node in tree.nodes_mut().values_mut() {
        let node_part = sanitize(node.id().as_str()).unwrap_or_else(|| "node".to_owned());
        for_each_text_mut(node, |context, line_id, text| {
            if text.is_empty() {
                return;
            }
            let keep = !options.overwrite
                && line_id.as_ref().is_some_and(|id| claimed.insert(id.to_string()));
            if !keep {
                if let (false, Some(id)) = (options.overwrite, line_id.as_ref()) {
                    debug!("line id '{id}' is already used; reassigning in {node_part}");
                }
                let base = match context {
                    TextContext::Content => format!("{prefix}_{node_part}_content"),
                    TextContext::Choice(idx) => format!("{prefix}_{node_part}_choice_{idx}"),
                    TextContext::Block(idx) => format!("{prefix}_{node_part}_block_{idx}"),
                };
                let id = unique(base, &mut used);
                match LineId::new(id) {
                    Ok(id) => {
                        *line_id = Some(id);
                        assigned += 1;
                    }
                    Err(err) => debug!("skipping line id for {node_part}: {err}"),
                }
            }
            if let Some(id) = line_id {
                line_ids.insert(id.to_string(), text.to_owned());
            }
        });
    }

    debug!("line ids: {} total, {assigned} newly assigned", line_ids.len());
    let total_lines = line_ids.len();
    LineIdResult { tree, line_ids, total_lines }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextContext {
    Content,
    Choice(usize),
    Block(usize),
}

/// Visit every text unit of a node in a fixed order: content, choices, blocks.
pub(crate) fn for_each_text<'a>(
    node: &'a DialogueNode,
    mut visit: impl FnMut(TextContext, Option<&'a LineId>, &'a str),
) {
    match node.kind() {
        NodeKind::Npc(npc) => visit(TextContext::Content, npc.speech.line_id.as_ref(), &npc.speech.text),
        NodeKind::Player(player) => {
            if let Some(prompt) = &player.prompt {
                visit_speech(&mut visit, TextContext::Content, prompt);
            }
            for (idx, choice) in player.choices.iter().enumerate() {
                visit(TextContext::Choice(idx), choice.line_id.as_ref(), &choice.text);
            }
        }
        NodeKind::Conditional(conditional) => {
            if let Some(prompt) = &conditional.prompt {
                visit_speech(&mut visit, TextContext::Content, prompt);
            }
            for (idx, block) in conditional.blocks.iter().enumerate() {
                if let Some(speech) = &block.speech {
                    visit_speech(&mut visit, TextContext::Block(idx), speech);
                }
            }
        }
    }
}

fn visit_speech<'a>(
    visit: &mut impl FnMut(TextContext, Option<&'a LineId>, &'a str),
    context: TextContext,
    speech: &'a Speech,
) {
    visit(context, speech.line_id.as_ref(), &speech.text);
}

fn for_each_text_mut(
    node: &mut DialogueNode,
    mut visit: impl FnMut(TextContext, &mut Option<LineId>, &str),
) {
    match node.kind_mut() {
        NodeKind::Npc(npc) => visit(TextContext::Content, &mut npc.speech.line_id, &npc.speech.text),
        NodeKind::Player(player) => {
            if let Some(prompt) = player.prompt.as_mut() {
                visit(TextContext::Content, &mut prompt.line_id, &prompt.text);
            }
            for (idx, choice) in player.choices.iter_mut().enumerate() {
                visit(TextContext::Choice(idx), &mut choice.line_id, &choice.text);
            }
        }
        NodeKind::Conditional(conditional) => {
            if let Some(prompt) = conditional.prompt.as_mut() {
                visit(TextContext::Content, &mut prompt.line_id, &prompt.text);
            }
            for (idx, block) in conditional.blocks.iter_mut().enumerate() {
                if let Some(speech) = block.speech.as_mut() {
                    visit(TextContext::Block(idx), &mut speech.line_id, &speech.text);
                }
            }
        }
    }
}

/// Keep `[A-Za-z0-9_]`, map everything else to `_`.
fn sanitize(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { '_' })
        .collect::<String>();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn unique(base: String, used: &mut BTreeSet<String>) -> String {
    let mut candidate = base.clone();
    let mut suffix = 2usize;
    while used.contains(&candidate) {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    used.insert(candidate.clone());
    candidate
}
