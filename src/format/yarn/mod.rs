// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Line-oriented dialogue script format.
//!
//! A script is a sequence of nodes:
//!
//! ```text
//! title: <node-id>
//! ---
//! Speaker: text #line:<id>
//! -> choice <<if $flag>>
//!     <<set $flag = true>>
//!     <<jump <node-id>>>
//! ===
//! ```
//!
//! Parsing is best-effort and never fails; exporting is deterministic. Re-parsing exported
//! text reproduces node ids, node types, and variable operations.
//!
//! Text lines that would read back as markup are written with a leading `\`. A player node
//! without choices or a conditional node without blocks carries a `nodeType:` header.

pub mod exporter;
pub mod parser;
mod tokenizer;

pub use exporter::export_script;
pub use parser::{
    parse_script, parse_script_with_diagnostics, DiagnosticKind, ParseDiagnostic, ParsedScript,
};

#[cfg(test)]
mod tests;
