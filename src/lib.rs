// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Yarnloom: branching-dialogue scripts ⇄ dialogue graphs.
//!
//! The core is four synchronous, side-effect-free pieces an editor drives:
//! - [`format::yarn`] parses script text into a [`model::DialogueTree`] and exports it back;
//! - [`state`] holds variable values and evaluates the conditions scripts encode;
//! - [`layout`] positions nodes (hierarchical or grid) and resolves overlaps;
//! - [`lineid`] assigns stable line identifiers and maps them to script lines.

pub mod format;
pub mod layout;
pub mod lineid;
pub mod model;
pub mod state;
pub mod validate;

pub use format::yarn::{export_script, parse_script, parse_script_with_diagnostics};
pub use layout::{apply_layout, layout_dialogue, LayoutOptions, StrategyRegistry};
pub use lineid::{create_source_map, ensure_line_ids, update_source_map_with_script_lines};
pub use model::DialogueTree;
pub use validate::find_dangling_references;

/// JSON schema of the tree exchanged with the editor.
pub fn dialogue_tree_schema() -> schemars::Schema {
    schemars::schema_for!(DialogueTree)
}
