// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Line classification for script text.
//!
//! Every line is classified on its own; the parser's state machine decides what a token means
//! in context. Header lines and body lines use different classifiers because `Speaker: text`
//! and `key: value` are indistinguishable without knowing which side of `---` we are on.

use std::borrow::Cow;

pub(crate) const BODY_START: &str = "---";
pub(crate) const NODE_END: &str = "===";
pub(crate) const LINE_TAG: &str = "#line:";
/// Header naming the node type when the body alone cannot tell.
pub(crate) const NODE_TYPE_HEADER: &str = "nodeType";
/// Prefix marking a body line as plain text whatever it looks like.
pub(crate) const ESCAPE: char = '\\';

const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HeaderToken<'a> {
    Blank,
    Comment,
    BodyStart,
    NodeEnd,
    Header { key: &'a str, value: &'a str },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BodyToken<'a> {
    Blank,
    Comment,
    NodeEnd,
    If { expr: &'a str },
    ElseIf { expr: &'a str },
    Else,
    EndIf,
    /// Arguments after `set`, unparsed.
    Set { args: &'a str },
    Jump { target: &'a str },
    /// Any other `<<…>>` command, or a malformed one.
    Command,
    Choice { text: String, line_id: Option<&'a str>, condition: Option<String> },
    Content { speaker: Option<&'a str>, text: String, line_id: Option<&'a str> },
}

impl BodyToken<'_> {
    pub(crate) fn is_choice(&self) -> bool {
        matches!(self, Self::Choice { .. })
    }
}

/// A classified body line with its position in the source.
#[derive(Debug, Clone)]
pub(crate) struct BodyLine<'a> {
    pub(crate) line_no: usize,
    pub(crate) indent: usize,
    pub(crate) raw: &'a str,
    pub(crate) token: BodyToken<'a>,
}

impl<'a> BodyLine<'a> {
    pub(crate) fn new(line_no: usize, raw: &'a str) -> Self {
        Self { line_no, indent: indent_width(raw), raw, token: classify_body(raw) }
    }

    /// The line without its leading indentation, as preserved for unrecognized content.
    pub(crate) fn text(&self) -> &'a str {
        self.raw.trim()
    }
}

/// Strip up to `width` columns of leading whitespace, keeping any deeper indentation.
pub(crate) fn dedent(line: &str, width: usize) -> &str {
    let mut taken = 0usize;
    let mut start = 0usize;
    for (idx, ch) in line.char_indices() {
        if taken >= width {
            break;
        }
        match ch {
            ' ' => taken += 1,
            '\t' => taken += TAB_WIDTH,
            _ => break,
        }
        start = idx + ch.len_utf8();
    }
    line[start..].trim_end()
}

pub(crate) fn unescape(text: &str) -> &str {
    text.strip_prefix(ESCAPE).unwrap_or(text)
}

/// Prefix `line` with [`ESCAPE`] when it would not read back as the same text.
///
/// A continuation line only has to stay content; a leading line without a speaker must also not
/// grow a speaker or a line tag.
pub(crate) fn escape_text_line(line: &str, continuation: bool) -> Cow<'_, str> {
    let plain = match classify_body(line) {
        BodyToken::Content { .. } if continuation => {
            line.trim() == line && !line.starts_with(ESCAPE)
        }
        BodyToken::Content { speaker: None, text, line_id: None } => text == line,
        _ => false,
    };
    if plain {
        Cow::Borrowed(line)
    } else {
        Cow::Owned(format!("{ESCAPE}{line}"))
    }
}

pub(crate) fn indent_width(line: &str) -> usize {
    let mut width = 0usize;
    for ch in line.chars() {
        match ch {
            ' ' => width += 1,
            '\t' => width += TAB_WIDTH,
            _ => break,
        }
    }
    width
}

pub(crate) fn classify_header(line: &str) -> HeaderToken<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return HeaderToken::Blank;
    }
    if trimmed.starts_with("//") {
        return HeaderToken::Comment;
    }
    if trimmed == BODY_START {
        return HeaderToken::BodyStart;
    }
    if trimmed == NODE_END {
        return HeaderToken::NodeEnd;
    }
    let Some((key, value)) = trimmed.split_once(':') else {
        return HeaderToken::Other;
    };
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return HeaderToken::Other;
    }
    HeaderToken::Header { key, value: value.trim() }
}

pub(crate) fn classify_body(line: &str) -> BodyToken<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return BodyToken::Blank;
    }
    if let Some(rest) = trimmed.strip_prefix(ESCAPE) {
        let (text, line_id) = split_line_tag(rest);
        return BodyToken::Content { speaker: None, text, line_id };
    }
    if trimmed.starts_with("//") {
        return BodyToken::Comment;
    }
    if trimmed == NODE_END {
        return BodyToken::NodeEnd;
    }
    if let Some(rest) = trimmed.strip_prefix("->") {
        let (rest, line_id) = split_line_tag(rest);
        let (text, condition) = split_inline_condition(&rest);
        return BodyToken::Choice {
            text: text.to_owned(),
            line_id,
            condition: condition.map(str::to_owned),
        };
    }
    if trimmed.starts_with("<<") {
        return classify_command(trimmed);
    }

    let (text, line_id) = split_line_tag(trimmed);
    match split_speaker(trimmed) {
        Some((speaker, _)) => {
            let (_, spoken) = split_speaker(&text).unwrap_or((speaker, text.as_str()));
            BodyToken::Content { speaker: Some(speaker), text: spoken.to_owned(), line_id }
        }
        None => BodyToken::Content { speaker: None, text, line_id },
    }
}

fn classify_command(trimmed: &str) -> BodyToken<'_> {
    let Some(inner) = trimmed.strip_prefix("<<").and_then(|rest| rest.strip_suffix(">>")) else {
        return BodyToken::Command;
    };
    let inner = inner.trim();
    let (keyword, args) = match inner.find(char::is_whitespace) {
        Some(idx) => (&inner[..idx], inner[idx..].trim()),
        None => (inner, ""),
    };
    match keyword {
        "if" => BodyToken::If { expr: args },
        "elseif" => BodyToken::ElseIf { expr: args },
        "else" if args.is_empty() => BodyToken::Else,
        "endif" if args.is_empty() => BodyToken::EndIf,
        "set" => BodyToken::Set { args },
        "jump" if !args.is_empty() => BodyToken::Jump { target: args },
        _ => BodyToken::Command,
    }
}

/// `Speaker: text`, where the speaker is non-empty, holds no markup, and the colon is
/// followed by whitespace or the end of the line (so `5:30` is not a speaker).
fn split_speaker(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(':')?;
    let speaker = line[..idx].trim();
    let rest = &line[idx + 1..];
    if speaker.is_empty()
        || speaker.contains(['<', '>', '{', '}', '[', ']', '#', '"'])
        || !(rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        return None;
    }
    Some((speaker, rest.trim()))
}

/// Remove a `#line:<id>` tag, returning the remaining text and the id.
fn split_line_tag(text: &str) -> (String, Option<&str>) {
    let Some(start) = find_line_tag(text) else {
        return (text.trim().to_owned(), None);
    };
    let id_start = start + LINE_TAG.len();
    let id_end = text[id_start..]
        .find(char::is_whitespace)
        .map_or(text.len(), |offset| id_start + offset);
    let id = &text[id_start..id_end];
    if id.is_empty() {
        return (text.trim().to_owned(), None);
    }

    let before = text[..start].trim_end();
    let after = text[id_end..].trim_start();
    let joined = match (before.is_empty(), after.is_empty()) {
        (_, true) => before.to_owned(),
        (true, false) => after.to_owned(),
        (false, false) => format!("{before} {after}"),
    };
    (joined.trim().to_owned(), Some(id))
}

fn find_line_tag(text: &str) -> Option<usize> {
    text.match_indices(LINE_TAG)
        .map(|(idx, _)| idx)
        .find(|&idx| idx == 0 || text[..idx].ends_with(char::is_whitespace))
}

/// `choice text <<if expr>>` → (`choice text`, `expr`).
fn split_inline_condition(text: &str) -> (&str, Option<&str>) {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_suffix(">>") else {
        return (trimmed, None);
    };
    let Some(open) = body.rfind("<<") else {
        return (trimmed, None);
    };
    let command = body[open + 2..].trim();
    match command.strip_prefix("if").filter(|rest| rest.starts_with(char::is_whitespace)) {
        Some(expr) => (trimmed[..open].trim_end(), Some(expr.trim())),
        None => (trimmed, None),
    }
}
