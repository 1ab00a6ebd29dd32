#![no_std]

//! # Script Types
//!
//! Scripts and the timing-control tag grammar for the timed markup
//! renderer.
//!
//! ## Philosophy
//!
//! - **Parse once, step many**: a script is pre-parsed into a typed
//!   segment sequence; stepping never re-scans the raw string
//! - **Degrade, don't fail**: malformed markup is never an error; an
//!   unterminated `<` is typed out literally, character by character
//! - **Positional matching**: control tags only match at the current
//!   render position; a tag elsewhere never pre-empts a closer match
//!
//! ## Grammar
//!
//! - `<break:{SECS}>`: pause for SECS (fractional allowed), no output
//! - `<untype:{SECS}>PAYLOAD</untype>`: after SECS, append PAYLOAD to
//!   the visible output. Despite the name, the payload is inserted and
//!   kept; no removal step exists. The naming/intent mismatch is
//!   preserved deliberately so existing scripts render identically.
//! - any other `<...>`: skipped whole with zero delay and no output
//!
//! SECS is `digits` optionally followed by `.digits`; `0.25` matches,
//! `.25` and `1.` do not (a tag that fails this falls through to the
//! generic skip).

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use clock::Duration;
use core::fmt;
use serde::{Deserialize, Serialize};

/// One pre-parsed unit of a script
///
/// Each variant records how many raw characters it consumed so the
/// render position stays defined as an offset into the raw script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// A run of plain characters, revealed one per step
    Text(String),
    /// A pause with no visible output change
    Pause {
        /// How long to wait before the next step
        duration: Duration,
        /// Raw characters consumed by the tag
        consumed: usize,
    },
    /// A delayed literal insertion (the `untype` tag)
    Insert {
        /// Delay before the payload is appended
        delay: Duration,
        /// Text appended to the visible output, then kept
        payload: String,
        /// Raw characters consumed by the whole tag pair
        consumed: usize,
    },
    /// An unrecognized tag, skipped with zero delay and no output
    SkipTag {
        /// Raw characters consumed
        consumed: usize,
    },
}

impl Segment {
    /// Raw characters this segment consumes from the script
    pub fn consumed_chars(&self) -> usize {
        match self {
            Segment::Text(text) => text.chars().count(),
            Segment::Pause { consumed, .. } => *consumed,
            Segment::Insert { consumed, .. } => *consumed,
            Segment::SkipTag { consumed } => *consumed,
        }
    }
}

/// An immutable script: raw markup text plus its segment sequence
///
/// Constructed once via [`Script::parse`]; the renderer steps over the
/// segments and never re-inspects the raw string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    raw: String,
    segments: Vec<Segment>,
}

impl Script {
    /// Parses raw markup into a script
    ///
    /// Parsing cannot fail: anything that is not a well-formed tag is
    /// plain text by contract.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = parse_segments(&raw);
        Self { raw, segments }
    }

    /// The raw markup text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The pre-parsed segment sequence
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total raw length in characters
    pub fn char_len(&self) -> usize {
        self.raw.chars().count()
    }

    /// The plain-text projection: every tag removed, every insert
    /// payload retained in place
    ///
    /// This is exactly the text a completed render leaves on the
    /// surface (cursor marker aside).
    pub fn projection(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Insert { payload, .. } => out.push_str(payload),
                Segment::Pause { .. } | Segment::SkipTag { .. } => {}
            }
        }
        out
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// An ordered collection of scripts, indexed by position
///
/// Display surfaces name the script they render by index (encoded into
/// their label); the registry is the single source of that ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRegistry {
    scripts: Vec<Script>,
}

impl ScriptRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            scripts: Vec::new(),
        }
    }

    /// Appends a script, returning its index
    pub fn push(&mut self, script: Script) -> usize {
        self.scripts.push(script);
        self.scripts.len() - 1
    }

    /// Looks up a script by index
    pub fn get(&self, index: usize) -> Option<&Script> {
        self.scripts.get(index)
    }

    /// Number of registered scripts
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Returns true if no scripts are registered
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

fn parse_segments(raw: &str) -> Vec<Segment> {
    let chars: Vec<char> = raw.chars().collect();
    let mut segments = Vec::new();
    let mut text_run = String::new();
    let mut i = 0;

    while i < chars.len() {
        if let Some((duration, len)) = match_break(&chars, i) {
            flush_text(&mut segments, &mut text_run);
            segments.push(Segment::Pause {
                duration,
                consumed: len,
            });
            i += len;
        } else if let Some((delay, payload, len)) = match_untype(&chars, i) {
            flush_text(&mut segments, &mut text_run);
            segments.push(Segment::Insert {
                delay,
                payload,
                consumed: len,
            });
            i += len;
        } else if chars[i] == '<' {
            // Generic skip swallows everything through the next '>',
            // even when a control tag sits in between.
            if let Some(end) = chars[i..].iter().position(|&c| c == '>') {
                flush_text(&mut segments, &mut text_run);
                segments.push(Segment::SkipTag { consumed: end + 1 });
                i += end + 1;
            } else {
                // Unterminated: the '<' is plain text.
                text_run.push('<');
                i += 1;
            }
        } else {
            text_run.push(chars[i]);
            i += 1;
        }
    }

    flush_text(&mut segments, &mut text_run);
    segments
}

fn flush_text(segments: &mut Vec<Segment>, run: &mut String) {
    if !run.is_empty() {
        segments.push(Segment::Text(core::mem::take(run)));
    }
}

/// Matches `<break:{SECS}>` at position `i`
fn match_break(chars: &[char], i: usize) -> Option<(Duration, usize)> {
    let after_open = match_literal(chars, i, "<break:{")?;
    let (secs, after_secs) = match_seconds(chars, after_open)?;
    let end = match_literal(chars, after_secs, "}>")?;
    Some((secs, end - i))
}

/// Matches `<untype:{SECS}>PAYLOAD</untype>` at position `i`
///
/// The payload is the shortest run up to the closing tag and may not
/// span lines.
fn match_untype(chars: &[char], i: usize) -> Option<(Duration, String, usize)> {
    let after_open = match_literal(chars, i, "<untype:{")?;
    let (secs, after_secs) = match_seconds(chars, after_open)?;
    let payload_start = match_literal(chars, after_secs, "}>")?;

    let mut j = payload_start;
    loop {
        if j >= chars.len() || chars[j] == '\n' {
            return None;
        }
        if let Some(end) = match_literal(chars, j, "</untype>") {
            let payload: String = chars[payload_start..j].iter().collect();
            return Some((secs, payload, end - i));
        }
        j += 1;
    }
}

/// Matches a literal string, returning the position just past it
fn match_literal(chars: &[char], i: usize, literal: &str) -> Option<usize> {
    let mut pos = i;
    for expected in literal.chars() {
        if chars.get(pos) != Some(&expected) {
            return None;
        }
        pos += 1;
    }
    Some(pos)
}

/// Matches `digits` optionally followed by `.digits`
fn match_seconds(chars: &[char], i: usize) -> Option<(Duration, usize)> {
    let mut pos = i;
    let mut literal = String::new();

    while let Some(c) = chars.get(pos).filter(|c| c.is_ascii_digit()) {
        literal.push(*c);
        pos += 1;
    }
    if literal.is_empty() {
        return None;
    }

    if chars.get(pos) == Some(&'.') {
        let mut fraction = String::new();
        let mut frac_pos = pos + 1;
        while let Some(c) = chars.get(frac_pos).filter(|c| c.is_ascii_digit()) {
            fraction.push(*c);
            frac_pos += 1;
        }
        // A bare trailing '.' is not part of the number.
        if !fraction.is_empty() {
            literal.push('.');
            literal.push_str(&fraction);
            pos = frac_pos;
        }
    }

    let secs: f64 = literal.parse().ok()?;
    Some((Duration::from_secs_f64(secs), pos))
}
