//! Reversible chat templates.
//!
//! A template spec is a plain string with four syntactic forms:
//!
//! - literal text, matched case-insensitively
//! - `(text)` -- optional literal, matched zero or one time (literal text
//!   only; groups do not nest and do not capture)
//! - `:name` -- capture of one or more characters, stopping at `/` and `:`
//! - `*name` -- greedy capture of one or more of any character
//!
//! A backslash escapes the next character, so `name\:` matches a literal
//! colon. Specs are lowercased at parse time; matching compares
//! case-insensitively and captured values keep the input's casing.
//!
//! Templates run both ways: [`Template::matches`] pulls named values out of
//! one chunk of text, [`Template::render`] substitutes values back into the
//! spec. A spec that parses cleanly never fails at match time, so malformed
//! specs surface as [`TemplateError`] when they are registered, not when a
//! message arrives.

use std::collections::{HashMap, HashSet};

use charactery_types::error::TemplateError;

/// One parsed element of a template spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Fixed text, compared case-insensitively.
    Literal(String),
    /// Fixed text that may be absent from the input.
    Optional(String),
    /// Named capture stopping at `/` and `:`.
    Capture(String),
    /// Named capture accepting any characters, URLs included.
    Greedy(String),
}

/// A parsed, reversible template.
#[derive(Debug, Clone)]
pub struct Template {
    spec: String,
    segments: Vec<Segment>,
    emit_optionals: bool,
}

impl Template {
    /// Parse a spec string into a template.
    ///
    /// The spec is lowercased before parsing so that registration order is
    /// the only thing distinguishing two case-variant specs.
    pub fn parse(spec: &str) -> Result<Self, TemplateError> {
        if spec.trim().is_empty() {
            return Err(TemplateError::EmptySpec);
        }

        let lowered = spec.to_lowercase();
        let mut segments = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut text = String::new();
        let mut in_optional = false;
        let mut chars = lowered.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let escaped = chars
                        .next()
                        .ok_or_else(|| TemplateError::TrailingEscape(lowered.clone()))?;
                    text.push(escaped);
                }
                '(' if !in_optional => {
                    if !text.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut text)));
                    }
                    in_optional = true;
                }
                '(' => return Err(TemplateError::NestedOptional(lowered.clone())),
                ')' if in_optional => {
                    if !text.is_empty() {
                        segments.push(Segment::Optional(std::mem::take(&mut text)));
                    }
                    in_optional = false;
                }
                ')' => return Err(TemplateError::UnbalancedOptional(lowered.clone())),
                ':' | '*' if !in_optional => {
                    if !text.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut text)));
                    }
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if next.is_alphanumeric() || next == '_' {
                            name.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if name.is_empty() {
                        return Err(TemplateError::EmptyCapture(lowered.clone()));
                    }
                    if !seen.insert(name.clone()) {
                        return Err(TemplateError::DuplicateCapture {
                            spec: lowered.clone(),
                            name,
                        });
                    }
                    segments.push(if c == ':' {
                        Segment::Capture(name)
                    } else {
                        Segment::Greedy(name)
                    });
                }
                other => text.push(other),
            }
        }

        if in_optional {
            return Err(TemplateError::UnbalancedOptional(lowered.clone()));
        }
        if !text.is_empty() {
            segments.push(Segment::Literal(text));
        }
        if segments.is_empty() {
            return Err(TemplateError::EmptySpec);
        }

        Ok(Self {
            spec: lowered,
            segments,
            emit_optionals: true,
        })
    }

    /// The lowercased spec this template was parsed from.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// The parsed segments, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Control whether [`Template::render`] emits optional literals
    /// (the default) or drops them.
    pub fn render_optionals(mut self, emit: bool) -> Self {
        self.emit_optionals = emit;
        self
    }

    /// Match one chunk of text against the whole template.
    ///
    /// All-or-nothing: either every segment lines up with the entire chunk
    /// and every capture receives a non-empty value, or the result is
    /// `None`. Captured values preserve the chunk's original casing.
    pub fn matches(&self, chunk: &str) -> Option<Vec<(String, String)>> {
        let input: Vec<char> = chunk.chars().collect();
        let mut captures = Vec::new();
        if self.match_from(&input, 0, 0, &mut captures) {
            Some(captures)
        } else {
            None
        }
    }

    /// Substitute values back into the spec.
    ///
    /// Returns `None` when a capture has no value in `values`. Optional
    /// literals are emitted verbatim unless suppressed via
    /// [`Template::render_optionals`].
    pub fn render(&self, values: &HashMap<String, String>) -> Option<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Optional(text) => {
                    if self.emit_optionals {
                        out.push_str(text);
                    }
                }
                Segment::Capture(name) | Segment::Greedy(name) => {
                    out.push_str(values.get(name)?);
                }
            }
        }
        Some(out)
    }

    /// Backtracking segment walk. Optionals try the present branch first;
    /// captures extend shortest-first.
    fn match_from(
        &self,
        input: &[char],
        pos: usize,
        seg: usize,
        captures: &mut Vec<(String, String)>,
    ) -> bool {
        let Some(segment) = self.segments.get(seg) else {
            return pos == input.len();
        };

        match segment {
            Segment::Literal(text) => match match_literal(input, pos, text) {
                Some(next) => self.match_from(input, next, seg + 1, captures),
                None => false,
            },
            Segment::Optional(text) => {
                if let Some(next) = match_literal(input, pos, text) {
                    if self.match_from(input, next, seg + 1, captures) {
                        return true;
                    }
                }
                self.match_from(input, pos, seg + 1, captures)
            }
            Segment::Capture(name) | Segment::Greedy(name) => {
                let unrestricted = matches!(segment, Segment::Greedy(_));
                let mut end = pos;
                while end < input.len() && (unrestricted || capture_char(input[end])) {
                    end += 1;
                    captures.push((name.clone(), input[pos..end].iter().collect()));
                    if self.match_from(input, end, seg + 1, captures) {
                        return true;
                    }
                    captures.pop();
                }
                false
            }
        }
    }
}

/// Match a literal (already lowercased) at `pos`, returning the position
/// after it.
fn match_literal(input: &[char], pos: usize, text: &str) -> Option<usize> {
    let mut at = pos;
    for expected in text.chars() {
        let &actual = input.get(at)?;
        if !chars_eq_ci(actual, expected) {
            return None;
        }
        at += 1;
    }
    Some(at)
}

/// Case-insensitive char comparison. `expected` comes from a lowercased
/// spec; `actual` is raw input.
fn chars_eq_ci(actual: char, expected: char) -> bool {
    actual == expected || actual.to_lowercase().eq(expected.to_lowercase())
}

/// Characters a non-greedy capture may consume.
fn capture_char(c: char) -> bool {
    c != '/' && c != ':'
}
