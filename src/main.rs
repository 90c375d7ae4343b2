// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Yarnloom CLI entrypoint.
//!
//! A thin file/stdin shell around the library. `-` reads stdin; output goes to stdout unless
//! `--output` is given. Set `RUST_LOG=debug` to see parser recoveries and layout summaries.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use yarnloom::format::yarn::{export_script, parse_script_with_diagnostics};
use yarnloom::layout::{apply_layout, Direction, LayoutOptions, StrategyRegistry};
use yarnloom::lineid::{
    create_source_map, ensure_line_ids, update_source_map_with_script_lines, LineIdOptions,
};
use yarnloom::model::DialogueTree;
use yarnloom::validate::find_dangling_references;

#[derive(Parser)]
#[command(name = "yarnloom")]
#[command(about = "Convert, lay out, and tag branching-dialogue scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a script into a JSON dialogue tree
    Parse {
        /// Script file, or `-` for stdin
        input: PathBuf,

        /// Tree title (defaults to the file stem)
        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a JSON dialogue tree as a script
    Export {
        /// Tree JSON file, or `-` for stdin
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-position every node and re-export the script
    Layout {
        /// Script file, or `-` for stdin
        input: PathBuf,

        /// Registered strategy name
        #[arg(short, long, default_value = "hierarchical")]
        strategy: String,

        /// JSON file with layout options; missing fields use defaults
        #[arg(long)]
        options: Option<PathBuf>,

        /// Lay ranks out left to right instead of top to bottom
        #[arg(long)]
        horizontal: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Assign line identifiers and write the tagged script
    LineIds {
        /// Script file, or `-` for stdin
        input: PathBuf,

        #[arg(long, default_value = "line")]
        prefix: String,

        /// Regenerate identifiers that already exist
        #[arg(long)]
        overwrite: bool,

        /// Also write the source map as JSON
        #[arg(long)]
        source_map: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report parse diagnostics and dangling jumps; fails if any are found
    Check {
        /// Script file, or `-` for stdin
        input: PathBuf,
    },

    /// Print the JSON schema of the dialogue tree
    Schema {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Parse { input, title, output } => {
            let tree = load_script(&input, title.as_deref())?;
            let json = serde_json::to_string_pretty(&tree).context("serialize tree")?;
            write_output(output.as_deref(), &json)
        }
        Command::Export { input, output } => {
            let raw = read_input(&input)?;
            let tree: DialogueTree = serde_json::from_str(&raw)
                .with_context(|| format!("parse tree JSON from {}", input.display()))?;
            write_output(output.as_deref(), &export_script(&tree))
        }
        Command::Layout { input, strategy, options, horizontal, output } => {
            let tree = load_script(&input, None)?;
            let mut layout_options = match options {
                Some(path) => {
                    let raw = read_input(&path)?;
                    serde_json::from_str::<LayoutOptions>(&raw)
                        .with_context(|| format!("parse layout options from {}", path.display()))?
                }
                None => LayoutOptions::default(),
            };
            if horizontal {
                layout_options.direction = Direction::LeftToRight;
            }
            let registry = StrategyRegistry::with_builtins();
            let positioned = apply_layout(&tree, &registry, &strategy, &layout_options)?;
            info!("laid out {} nodes with '{strategy}'", positioned.len());
            write_output(output.as_deref(), &export_script(&positioned))
        }
        Command::LineIds { input, prefix, overwrite, source_map, output } => {
            let tree = load_script(&input, None)?;
            let result = ensure_line_ids(&tree, &LineIdOptions { prefix, overwrite });
            let text = export_script(&result.tree);
            if let Some(path) = source_map {
                let mut map = create_source_map(&result.tree);
                let correlated = update_source_map_with_script_lines(&mut map, &text);
                info!("source map: {correlated} of {} ids correlated", map.len());
                let json = serde_json::to_string_pretty(&map).context("serialize source map")?;
                write_output(Some(&path), &json)?;
            }
            write_output(output.as_deref(), &text)
        }
        Command::Check { input } => {
            let raw = read_input(&input)?;
            let parsed = parse_script_with_diagnostics(&raw, &default_title(&input, None));
            for diagnostic in &parsed.diagnostics {
                println!("{}: {diagnostic}", input.display());
            }
            let dangling = find_dangling_references(&parsed.tree);
            for reference in &dangling {
                println!("{}: {reference}", input.display());
            }
            let problems = parsed.diagnostics.len() + dangling.len();
            if problems > 0 {
                bail!("{problems} problem(s) in {}", input.display());
            }
            println!("{}: {} nodes, no problems", input.display(), parsed.tree.len());
            Ok(())
        }
        Command::Schema { output } => {
            let json = serde_json::to_string_pretty(&yarnloom::dialogue_tree_schema())
                .context("serialize schema")?;
            write_output(output.as_deref(), &json)
        }
    }
}

/// Parse a script, reporting recoveries on stderr.
fn load_script(path: &Path, title: Option<&str>) -> Result<DialogueTree> {
    let raw = read_input(path)?;
    let parsed = parse_script_with_diagnostics(&raw, &default_title(path, title));
    for diagnostic in &parsed.diagnostics {
        eprintln!("warning: {}: {diagnostic}", path.display());
    }
    Ok(parsed.tree)
}

fn default_title(path: &Path, title: Option<&str>) -> String {
    if let Some(title) = title {
        return title.to_owned();
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| *stem != "-")
        .unwrap_or("dialogue")
        .to_owned()
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw).context("read stdin")?;
        return Ok(raw);
    }
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, contents).with_context(|| format!("write {}", path.display()))
        }
        None => {
            print!("{contents}");
            if !contents.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}
