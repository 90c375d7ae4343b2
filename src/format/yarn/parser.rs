// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::mem;

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use super::tokenizer::{
    classify_header, dedent, unescape, BodyLine, BodyToken, HeaderToken, NODE_TYPE_HEADER,
};
use crate::model::condition::parse_conditions;
use crate::model::{
    BlockKind, Choice, Condition, ConditionalBlock, ConditionalNode, DialogueNode, DialogueTree,
    LineId, NodeId, NodeKind, NodeType, NpcNode, PlayerNode, Position, Speech, VariableOperation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingTitle,
    InvalidNodeId,
    DuplicateNode,
    MissingBody,
    UnrecognizedHeader,
    UnterminatedNode,
    UnterminatedConditional,
    StrayConditional,
    ConditionTerm,
    ElseWithoutNegation,
    InvalidSet,
    InvalidJumpTarget,
}

/// A recovered problem in script text. Parsing continues past every diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    pub line_no: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_no, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScript {
    pub tree: DialogueTree,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Parse script text into a dialogue tree, discarding diagnostics.
///
/// Never fails: malformed segments are skipped or preserved verbatim on the node they occur in.
pub fn parse_script(text: &str, title: &str) -> DialogueTree {
    parse_script_with_diagnostics(text, title).tree
}

pub fn parse_script_with_diagnostics(text: &str, title: &str) -> ParsedScript {
    let mut parser = ScriptParser::new(title);
    for (idx, line) in text.lines().enumerate() {
        parser.feed(idx + 1, line);
    }
    let parsed = parser.finish();
    debug!(
        "parsed script '{title}': {} nodes, {} diagnostics",
        parsed.tree.len(),
        parsed.diagnostics.len()
    );
    parsed
}

#[derive(Debug, Default)]
struct Diagnostics(Vec<ParseDiagnostic>);

impl Diagnostics {
    fn push(&mut self, line_no: usize, kind: DiagnosticKind, message: impl Into<String>) {
        let diagnostic = ParseDiagnostic { line_no, kind, message: message.into() };
        debug!("{diagnostic}");
        self.0.push(diagnostic);
    }
}

enum Section<'a> {
    Between,
    Header(HeaderBlock<'a>),
    Body(NodeBuilder<'a>),
    /// Inside the body of a node that could not be created; wait for `===`.
    Skipping,
}

struct ScriptParser<'a> {
    tree: DialogueTree,
    section: Section<'a>,
    diagnostics: Diagnostics,
}

impl<'a> ScriptParser<'a> {
    fn new(title: &str) -> Self {
        Self {
            tree: DialogueTree::new(title),
            section: Section::Between,
            diagnostics: Diagnostics::default(),
        }
    }

    fn feed(&mut self, line_no: usize, line: &'a str) {
        match mem::replace(&mut self.section, Section::Between) {
            Section::Between => self.feed_between(line_no, line),
            Section::Header(header) => self.feed_header(header, line_no, line),
            Section::Body(mut builder) => {
                if builder.push(BodyLine::new(line_no, line), &mut self.diagnostics) {
                    self.insert(builder.finish());
                } else {
                    self.section = Section::Body(builder);
                }
            }
            Section::Skipping => {
                if line.trim() != super::tokenizer::NODE_END {
                    self.section = Section::Skipping;
                }
            }
        }
    }

    fn feed_between(&mut self, line_no: usize, line: &'a str) {
        match classify_header(line) {
            HeaderToken::Blank | HeaderToken::Comment | HeaderToken::NodeEnd => {}
            HeaderToken::BodyStart => {
                self.diagnostics.push(
                    line_no,
                    DiagnosticKind::MissingTitle,
                    "node body without a 'title:' header; skipped",
                );
                self.section = Section::Skipping;
            }
            HeaderToken::Header { key, value } => {
                let mut header = HeaderBlock::new(line_no);
                header.push(line_no, key, value);
                self.section = Section::Header(header);
            }
            HeaderToken::Other => self.diagnostics.push(
                line_no,
                DiagnosticKind::UnrecognizedHeader,
                format!("text outside a node ignored: {}", line.trim()),
            ),
        }
    }

    fn feed_header(&mut self, mut header: HeaderBlock<'a>, line_no: usize, line: &'a str) {
        match classify_header(line) {
            HeaderToken::Blank | HeaderToken::Comment => self.section = Section::Header(header),
            HeaderToken::Header { key, value } => {
                header.push(line_no, key, value);
                self.section = Section::Header(header);
            }
            HeaderToken::Other => {
                self.diagnostics.push(
                    line_no,
                    DiagnosticKind::UnrecognizedHeader,
                    format!("unrecognized header line ignored: {}", line.trim()),
                );
                self.section = Section::Header(header);
            }
            HeaderToken::NodeEnd => self.diagnostics.push(
                header.start_line,
                DiagnosticKind::MissingBody,
                "node header without a '---' body; skipped",
            ),
            HeaderToken::BodyStart => {
                self.section = match self.open_body(header, line_no) {
                    Some(builder) => Section::Body(builder),
                    None => Section::Skipping,
                };
            }
        }
    }

    fn open_body(&mut self, header: HeaderBlock<'a>, line_no: usize) -> Option<NodeBuilder<'a>> {
        let Some((title_line, title)) = header.title else {
            self.diagnostics.push(
                line_no,
                DiagnosticKind::MissingTitle,
                "node header has no 'title:'; skipped",
            );
            return None;
        };
        let id = match NodeId::new(title) {
            Ok(id) => id,
            Err(err) => {
                self.diagnostics.push(
                    title_line,
                    DiagnosticKind::InvalidNodeId,
                    format!("invalid node title '{title}' ({err}); skipped"),
                );
                return None;
            }
        };
        if self.tree.contains(&id) {
            self.diagnostics.push(
                title_line,
                DiagnosticKind::DuplicateNode,
                format!("duplicate node '{id}'; later definition skipped"),
            );
            return None;
        }
        Some(NodeBuilder::new(id, header))
    }

    fn insert(&mut self, node: DialogueNode) {
        self.tree.insert_node(node);
    }

    fn finish(mut self) -> ParsedScript {
        match mem::replace(&mut self.section, Section::Between) {
            Section::Between | Section::Skipping => {}
            Section::Header(header) => self.diagnostics.push(
                header.start_line,
                DiagnosticKind::MissingBody,
                "node header without a '---' body at end of input; skipped",
            ),
            Section::Body(mut builder) => {
                builder.close_region(&mut self.diagnostics);
                self.diagnostics.push(
                    builder.body_line,
                    DiagnosticKind::UnterminatedNode,
                    format!("node '{}' is missing its closing '==='", builder.id),
                );
                self.insert(builder.finish());
            }
        }
        ParsedScript { tree: self.tree, diagnostics: self.diagnostics.0 }
    }
}

struct HeaderBlock<'a> {
    start_line: usize,
    title: Option<(usize, &'a str)>,
    position: Position,
    tags: Vec<String>,
    headers: IndexMap<String, String>,
    node_type: Option<NodeType>,
}

impl<'a> HeaderBlock<'a> {
    fn new(start_line: usize) -> Self {
        Self {
            start_line,
            title: None,
            position: Position::default(),
            tags: Vec::new(),
            headers: IndexMap::new(),
            node_type: None,
        }
    }

    fn push(&mut self, line_no: usize, key: &'a str, value: &'a str) {
        match key {
            "title" => self.title = Some((line_no, value)),
            "tags" => self.tags = value.split_whitespace().map(str::to_owned).collect(),
            "position" => match parse_position(value) {
                Some(position) => self.position = position,
                None => {
                    self.headers.insert(key.to_owned(), value.to_owned());
                }
            },
            NODE_TYPE_HEADER if NodeType::from_keyword(value).is_some() => {
                self.node_type = NodeType::from_keyword(value);
            }
            _ => {
                self.headers.insert(key.to_owned(), value.to_owned());
            }
        }
    }
}

fn parse_position(value: &str) -> Option<Position> {
    let (x, y) = value.split_once(',')?;
    let x = x.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    let y = y.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(Position::new(x, y))
}

/// An `<<if>>` region collected until its matching `<<endif>>`.
struct Region<'a> {
    branches: Vec<Branch<'a>>,
    /// Nesting depth of inner `<<if>>`s, which stay inside the current branch.
    depth: usize,
    /// Indentation of the opening `<<if>>`; `raw` keeps anything deeper.
    indent: usize,
    /// Every line of the region as written, for verbatim preservation.
    raw: Vec<&'a str>,
}

struct Branch<'a> {
    kind: BlockKind,
    line_no: usize,
    expr: Option<&'a str>,
    lines: Vec<BodyLine<'a>>,
}

enum RegionStep {
    Open,
    Closed,
}

impl<'a> Region<'a> {
    fn open(line_no: usize, expr: &'a str, raw: &'a str, indent: usize) -> Self {
        Self {
            branches: vec![Branch { kind: BlockKind::If, line_no, expr: Some(expr), lines: Vec::new() }],
            depth: 0,
            indent,
            raw: vec![dedent(raw, indent)],
        }
    }

    fn push(&mut self, line: BodyLine<'a>) -> RegionStep {
        if !is_filler(&line) {
            self.raw.push(dedent(line.raw, self.indent));
        }
        let top_level = self.depth == 0;
        let branch_kind = match &line.token {
            BodyToken::If { .. } => {
                self.depth += 1;
                None
            }
            BodyToken::EndIf if top_level => return RegionStep::Closed,
            BodyToken::EndIf => {
                self.depth -= 1;
                None
            }
            BodyToken::ElseIf { expr } if top_level => Some((BlockKind::ElseIf, Some(*expr))),
            BodyToken::Else if top_level => Some((BlockKind::Else, None)),
            _ => None,
        };
        match (branch_kind, self.branches.last_mut()) {
            (Some((kind, expr)), _) => {
                self.branches.push(Branch { kind, line_no: line.line_no, expr, lines: Vec::new() })
            }
            (None, Some(branch)) => branch.lines.push(line),
            (None, None) => {}
        }
        RegionStep::Open
    }

    fn contains_choice(&self) -> bool {
        self.branches.iter().flat_map(|branch| &branch.lines).any(|line| line.token.is_choice())
    }
}

/// A node-level body item, held in source order until the node's shape is known.
enum Segment<'a> {
    Line(BodyLine<'a>),
    Verbatim(String),
    /// A content-only region as written; dropped once it has become conditional blocks.
    Region(Vec<String>),
}

/// The lines indented under a choice, collected until the choice ends.
struct ChoiceBody<'a> {
    indent: usize,
    lines: Vec<BodyLine<'a>>,
}

impl<'a> ChoiceBody<'a> {
    fn new(indent: usize) -> Self {
        Self { indent, lines: Vec::new() }
    }
}

struct NodeBuilder<'a> {
    id: NodeId,
    body_line: usize,
    header: HeaderBlock<'a>,
    segments: Vec<Segment<'a>>,
    choices: Vec<Choice>,
    blocks: Vec<ConditionalBlock>,
    /// Segment count when the first choice appeared.
    first_choice: Option<usize>,
    /// Segment count when the first conditional block appeared.
    first_block: Option<usize>,
    region: Option<Region<'a>>,
    /// Body of the most recent top-level choice while it may continue.
    open_choice: Option<ChoiceBody<'a>>,
}

impl<'a> NodeBuilder<'a> {
    fn new(id: NodeId, header: HeaderBlock<'a>) -> Self {
        Self {
            id,
            body_line: header.start_line,
            header,
            segments: Vec::new(),
            choices: Vec::new(),
            blocks: Vec::new(),
            first_choice: None,
            first_block: None,
            region: None,
            open_choice: None,
        }
    }

    /// Feed one body line; returns `true` once the node's `===` is reached.
    fn push(&mut self, line: BodyLine<'a>, diagnostics: &mut Diagnostics) -> bool {
        if matches!(line.token, BodyToken::NodeEnd) {
            self.close_region(diagnostics);
            return true;
        }

        if let Some(region) = self.region.as_mut() {
            if let RegionStep::Closed = region.push(line) {
                if let Some(region) = self.region.take() {
                    self.resolve_region(region, diagnostics);
                }
            }
            return false;
        }

        if is_filler(&line) {
            return false;
        }

        if let Some(body) = self.open_choice.as_mut() {
            if line.indent > body.indent {
                check_command(&line, diagnostics);
                body.lines.push(line);
                return false;
            }
            self.close_choice();
        }

        let BodyLine { line_no, indent, raw, token } = line;
        let verbatim = raw.trim();
        match token {
            BodyToken::Choice { text, line_id, condition } => {
                let choice = build_choice(text, line_id, condition.as_deref(), line_no, diagnostics);
                self.first_choice.get_or_insert(self.segments.len());
                self.choices.push(choice);
                self.open_choice = Some(ChoiceBody::new(indent));
            }
            BodyToken::If { expr } => self.region = Some(Region::open(line_no, expr, raw, indent)),
            BodyToken::ElseIf { .. } | BodyToken::Else | BodyToken::EndIf => {
                diagnostics.push(
                    line_no,
                    DiagnosticKind::StrayConditional,
                    format!("'{}' without an open <<if>>; kept verbatim", verbatim),
                );
                self.segments.push(Segment::Verbatim(verbatim.to_owned()));
            }
            token => {
                let line = BodyLine { line_no, indent, raw, token };
                check_command(&line, diagnostics);
                self.segments.push(Segment::Line(line));
            }
        }
        false
    }

    fn close_choice(&mut self) {
        if let Some(body) = self.open_choice.take() {
            if let Some(choice) = self.choices.last_mut() {
                settle_choice(choice, body.lines);
            }
        }
    }

    fn close_region(&mut self, diagnostics: &mut Diagnostics) {
        if let Some(region) = self.region.take() {
            let line_no = region.branches.first().map_or(self.body_line, |branch| branch.line_no);
            diagnostics.push(
                line_no,
                DiagnosticKind::UnterminatedConditional,
                "<<if>> without a matching <<endif>>; closed at end of node",
            );
            self.resolve_region(region, diagnostics);
        }
    }

    /// A region holding any choice gates those choices; otherwise it becomes conditional blocks.
    fn resolve_region(&mut self, region: Region<'a>, diagnostics: &mut Diagnostics) {
        if region.contains_choice() {
            self.resolve_choice_region(region, diagnostics);
        } else {
            self.resolve_content_region(region, diagnostics);
        }
    }

    fn resolve_choice_region(&mut self, region: Region<'a>, diagnostics: &mut Diagnostics) {
        self.first_choice.get_or_insert(self.segments.len());
        // Single conditions of the branches seen so far; `None` once any branch is compound.
        let mut prior: Option<Vec<Condition>> = Some(Vec::new());

        for branch in region.branches {
            let conditions = match branch.expr {
                Some(expr) => {
                    let (parsed, errors) = parse_conditions(expr);
                    for err in &errors {
                        diagnostics.push(branch.line_no, DiagnosticKind::ConditionTerm, err.to_string());
                    }
                    let mut conditions = negate_all(prior.as_deref());
                    conditions.extend(parsed.iter().cloned());
                    prior = match (prior, parsed.as_slice(), errors.is_empty()) {
                        (Some(mut seen), [single], true) => {
                            seen.push(single.clone());
                            Some(seen)
                        }
                        _ => None,
                    };
                    conditions
                }
                None => {
                    if prior.is_none() {
                        diagnostics.push(
                            branch.line_no,
                            DiagnosticKind::ElseWithoutNegation,
                            "<<else>> after a compound condition; its choices are left ungated",
                        );
                    }
                    negate_all(prior.as_deref())
                }
            };

            let mut open: Option<(usize, ChoiceBody<'a>)> = None;
            for line in branch.lines {
                if is_filler(&line) {
                    continue;
                }
                if let Some((_, body)) = open.as_mut() {
                    if line.indent > body.indent {
                        check_command(&line, diagnostics);
                        body.lines.push(line);
                        continue;
                    }
                }
                if let Some((idx, body)) = open.take() {
                    if let Some(choice) = self.choices.get_mut(idx) {
                        settle_choice(choice, body.lines);
                    }
                }
                match line.token {
                    BodyToken::Choice { text, line_id, condition } => {
                        let mut choice =
                            build_choice(text, line_id, condition.as_deref(), line.line_no, diagnostics);
                        let inline = mem::take(&mut choice.conditions);
                        choice.conditions = conditions.iter().cloned().chain(inline).collect();
                        self.choices.push(choice);
                        open = Some((self.choices.len() - 1, ChoiceBody::new(line.indent)));
                    }
                    _ => self.segments.push(Segment::Verbatim(line.raw.trim().to_owned())),
                }
            }
            if let Some((idx, body)) = open {
                if let Some(choice) = self.choices.get_mut(idx) {
                    settle_choice(choice, body.lines);
                }
            }
        }
    }

    fn resolve_content_region(&mut self, region: Region<'a>, diagnostics: &mut Diagnostics) {
        self.first_block.get_or_insert(self.segments.len());
        for branch in region.branches {
            let lines =
                branch.lines.into_iter().filter(|line| !is_filler(line)).collect::<Vec<_>>();
            for line in &lines {
                check_command(line, diagnostics);
            }
            let mut entries = nested_entries(lines);
            let mut block = ConditionalBlock::new(branch.kind, branch.expr.map(str::to_owned));
            block.speech = take_speech(&mut entries);
            (block.operations, block.next) = take_tail(&mut entries);
            block.body = into_verbatim(entries);
            self.blocks.push(block);
        }
        self.segments.push(Segment::Region(region.raw.into_iter().map(str::to_owned).collect()));
    }

    fn finish(mut self) -> DialogueNode {
        self.close_choice();
        let hint = self.header.node_type;
        let mut segments = self.segments;

        let (kind, unrecognized) = if !self.choices.is_empty() || hint == Some(NodeType::Player) {
            let split = self.first_choice.unwrap_or(segments.len());
            let after = segments.split_off(split);
            let mut before = node_entries(segments, true);
            let prompt = take_speech(&mut before);
            let operations = take_leading_operations(&mut before);
            before.extend(node_entries(after, true));
            let kind = NodeKind::Player(PlayerNode { prompt, operations, choices: self.choices });
            (kind, into_verbatim(before))
        } else if !self.blocks.is_empty() || hint == Some(NodeType::Conditional) {
            let split = self.first_block.unwrap_or(segments.len());
            let after = segments.split_off(split);
            let mut entries = node_entries(segments, false);
            let prompt = take_speech(&mut entries);
            entries.extend(node_entries(after, false));
            let (operations, next) = take_tail(&mut entries);
            let kind = NodeKind::Conditional(ConditionalNode {
                prompt,
                blocks: self.blocks,
                operations,
                next,
            });
            (kind, into_verbatim(entries))
        } else {
            let mut entries = node_entries(segments, true);
            let speech = take_speech(&mut entries).unwrap_or_default();
            let (operations, next) = take_tail(&mut entries);
            (NodeKind::Npc(NpcNode { speech, operations, next }), into_verbatim(entries))
        };

        let mut node = DialogueNode::new(self.id, kind);
        node.set_position(self.header.position);
        node.set_tags(self.header.tags);
        *node.headers_mut() = self.header.headers;
        for line in unrecognized {
            node.push_unrecognized(line);
        }
        node
    }
}

fn is_filler(line: &BodyLine<'_>) -> bool {
    matches!(line.token, BodyToken::Blank | BodyToken::Comment)
}

/// Report `<<set>>` and `<<jump>>` lines the model cannot hold; they stay verbatim.
fn check_command(line: &BodyLine<'_>, diagnostics: &mut Diagnostics) {
    match &line.token {
        BodyToken::Set { args } if VariableOperation::parse_set_arguments(args).is_none() => {
            diagnostics.push(
                line.line_no,
                DiagnosticKind::InvalidSet,
                format!("unrecognized <<set>> kept verbatim: {}", line.text()),
            );
        }
        BodyToken::Jump { target } => {
            if let Err(err) = NodeId::new(*target) {
                diagnostics.push(
                    line.line_no,
                    DiagnosticKind::InvalidJumpTarget,
                    format!("jump target '{target}' is not a node id ({err}); kept verbatim"),
                );
            }
        }
        _ => {}
    }
}

/// One body line, with what settling needs to know about it.
struct Entry<'a> {
    token: Option<BodyToken<'a>>,
    raw: &'a str,
    /// The line as preserved when it is not lifted into the model.
    verbatim: String,
    /// At the body's own indentation and outside any nested `<<if>>`.
    direct: bool,
}

impl<'a> Entry<'a> {
    fn verbatim(text: String) -> Self {
        Self { token: None, raw: "", verbatim: text, direct: false }
    }

    fn operation(&self) -> Option<VariableOperation> {
        match &self.token {
            Some(BodyToken::Set { args }) if self.direct => {
                VariableOperation::parse_set_arguments(args)
            }
            _ => None,
        }
    }

    fn is_jump(&self) -> bool {
        self.direct && matches!(self.token, Some(BodyToken::Jump { .. }))
    }

    fn jump_target(&self) -> Option<NodeId> {
        match &self.token {
            Some(BodyToken::Jump { target }) => NodeId::new(*target).ok(),
            _ => None,
        }
    }

    fn is_content(&self) -> bool {
        self.direct && matches!(self.token, Some(BodyToken::Content { .. }))
    }
}

/// Entries for lines indented under a choice or a block opener.
///
/// The shallowest line sets the body's own indentation; deeper lines keep their extra indentation.
fn nested_entries(lines: Vec<BodyLine<'_>>) -> Vec<Entry<'_>> {
    let base = lines.iter().map(|line| line.indent).min().unwrap_or_default();
    let mut depth = 0usize;
    lines
        .into_iter()
        .map(|line| {
            let direct = line.indent <= base && depth == 0;
            match line.token {
                BodyToken::If { .. } => depth += 1,
                BodyToken::EndIf => depth = depth.saturating_sub(1),
                _ => {}
            }
            Entry {
                verbatim: dedent(line.raw, base).to_owned(),
                raw: line.raw,
                token: Some(line.token),
                direct,
            }
        })
        .collect()
}

fn node_entries(segments: Vec<Segment<'_>>, keep_regions: bool) -> Vec<Entry<'_>> {
    let mut entries = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Line(line) => entries.push(Entry {
                verbatim: line.text().to_owned(),
                raw: line.raw,
                token: Some(line.token),
                direct: true,
            }),
            Segment::Verbatim(text) => entries.push(Entry::verbatim(text)),
            Segment::Region(lines) if keep_regions => {
                entries.extend(lines.into_iter().map(Entry::verbatim));
            }
            Segment::Region(_) => {}
        }
    }
    entries
}

/// Leading content lines become the speech.
fn take_speech(entries: &mut Vec<Entry<'_>>) -> Option<Speech> {
    let count = entries.iter().take_while(|entry| entry.is_content()).count();
    let mut speech = None;
    for entry in entries.drain(..count) {
        if let Some(BodyToken::Content { speaker, text, line_id }) = entry.token {
            append_content(&mut speech, entry.raw, speaker, text, line_id);
        }
    }
    speech
}

fn take_leading_operations(entries: &mut Vec<Entry<'_>>) -> Vec<VariableOperation> {
    let operations = entries.iter().map_while(Entry::operation).collect::<Vec<_>>();
    entries.drain(..operations.len());
    operations
}

/// Lift a closing `<<jump>>` and the `<<set>>` run just before it.
///
/// Lifted lines are exported after everything kept verbatim, so only a trailing run can be lifted
/// without reordering. Lines after an earlier jump never run; nothing is lifted past one.
fn take_tail(entries: &mut Vec<Entry<'_>>) -> (Vec<VariableOperation>, Option<NodeId>) {
    let next = match entries.iter().position(Entry::is_jump) {
        None => None,
        Some(idx) if idx + 1 == entries.len() => match entries[idx].jump_target() {
            Some(target) => Some(target),
            None => return (Vec::new(), None),
        },
        Some(_) => return (Vec::new(), None),
    };
    if next.is_some() {
        entries.pop();
    }
    let keep = entries
        .iter()
        .rposition(|entry| entry.operation().is_none())
        .map_or(0, |idx| idx + 1);
    let operations = entries.drain(keep..).filter_map(|entry| entry.operation()).collect();
    (operations, next)
}

fn into_verbatim(entries: Vec<Entry<'_>>) -> Vec<String> {
    entries.into_iter().map(|entry| entry.verbatim).collect()
}

fn settle_choice(choice: &mut Choice, lines: Vec<BodyLine<'_>>) {
    let mut entries = nested_entries(lines);
    (choice.operations, choice.next) = take_tail(&mut entries);
    choice.body = into_verbatim(entries);
}

fn negate_all(conditions: Option<&[Condition]>) -> Vec<Condition> {
    conditions.unwrap_or_default().iter().map(Condition::negated).collect()
}

fn build_choice(
    text: String,
    line_id: Option<&str>,
    condition: Option<&str>,
    line_no: usize,
    diagnostics: &mut Diagnostics,
) -> Choice {
    let mut choice = Choice::new(text);
    choice.line_id = line_id.and_then(|id| parse_line_id(id, line_no));
    if let Some(expr) = condition {
        let (conditions, errors) = parse_conditions(expr);
        for err in &errors {
            diagnostics.push(line_no, DiagnosticKind::ConditionTerm, err.to_string());
        }
        choice.conditions = conditions;
    }
    choice
}

/// The first content line sets speaker and line id; later lines append as written.
fn append_content(
    target: &mut Option<Speech>,
    raw: &str,
    speaker: Option<&str>,
    text: String,
    line_id: Option<&str>,
) {
    match target {
        Some(speech) => {
            speech.text.push('\n');
            speech.text.push_str(unescape(raw.trim()));
        }
        None => {
            *target = Some(Speech {
                speaker: speaker.map(str::to_owned),
                text,
                line_id: line_id.and_then(|id| parse_line_id(id, 0)),
            });
        }
    }
}

fn parse_line_id(id: &str, line_no: usize) -> Option<LineId> {
    match LineId::new(id) {
        Ok(id) => Some(id),
        Err(err) => {
            debug!("line {line_no}: ignoring line tag '{id}' ({err})");
            None
        }
    }
}
