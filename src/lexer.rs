//! Lexical utilities (C1): pure, in-place-feeling but non-mutating helpers
//! for trimming, normalizing and classifying a single source line.
//!
//! Every function here is a pure transformation that returns a fresh
//! `String` (or a borrowed slice) rather than mutating its input in place —
//! replacing the `strtok`-style buffer mutation the reference course
//! project used in its own line handling.

use crate::opcodes::lookup as opcode_lookup;

/// Source lines longer than this (excluding the newline) are rejected.
pub const MAX_LINE_LEN: usize = 80;

/// Truncates at the first `;`, which begins a comment that runs to end of line.
pub fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Collapses runs of whitespace to a single space and removes any space
/// adjacent to a comma.
pub fn normalize_whitespace(line: &str) -> String {
    let mut collapsed = String::with_capacity(line.len());
    let mut last_was_space = false;
    for c in line.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                collapsed.push(' ');
            }
            last_was_space = true;
        } else {
            collapsed.push(c);
            last_was_space = false;
        }
    }

    let mut result = String::with_capacity(collapsed.len());
    let chars: Vec<char> = collapsed.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let prev_comma = i > 0 && chars[i - 1] == ',';
            let next_comma = i + 1 < chars.len() && chars[i + 1] == ',';
            if prev_comma || next_comma {
                continue;
            }
        }
        result.push(c);
    }
    result
}

/// Removes leading and trailing whitespace.
pub fn trim(line: &str) -> &str {
    line.trim()
}

/// Applies `strip_comment`, `normalize_whitespace` and `trim` in sequence,
/// the exact preparation every pass performs before inspecting a line.
pub fn prepare(line: &str) -> String {
    trim(&normalize_whitespace(strip_comment(line))).to_owned()
}

pub fn is_register(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 2 && bytes[0] == b'r' && (b'0'..=b'7').contains(&bytes[1])
}

/// `r0`..`r7` parsed to its numeric id.
pub fn register_id(token: &str) -> Option<u8> {
    if is_register(token) {
        Some(token.as_bytes()[1] - b'0')
    } else {
        None
    }
}

/// Optional leading `#`, optional sign, then one or more decimal digits.
pub fn is_number(token: &str) -> bool {
    let token = token.strip_prefix('#').unwrap_or(token);
    let token = token.strip_prefix('-').or_else(|| token.strip_prefix('+')).unwrap_or(token);
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_directive(token: &str) -> bool {
    matches!(token, ".data" | ".string" | ".entry" | ".extern")
}

/// A label: non-empty, <=31 chars, starts with a letter, remaining chars
/// alphanumeric, and not a register name or reserved mnemonic.
pub fn is_label(token: &str) -> bool {
    if token.is_empty() || token.len() > 31 {
        return false;
    }
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    if !chars.clone().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    if is_register(token) {
        return false;
    }
    if opcode_lookup(token).is_some() {
        return false;
    }
    true
}

/// Splits a label prefix (`NAME:`) off the front of an already-prepared
/// line, if present. Returns `(label, rest)` where `rest` is trimmed.
pub fn split_label(line: &str) -> (Option<&str>, &str) {
    if let Some(idx) = line.find(':') {
        let candidate = &line[..idx];
        if !candidate.contains(' ') {
            return (Some(candidate), line[idx + 1..].trim_start());
        }
    }
    (None, line)
}

/// Splits the operation token from its (unparsed) operand remainder.
pub fn split_operation(line: &str) -> (&str, &str) {
    match line.find(' ') {
        Some(idx) => (&line[..idx], line[idx + 1..].trim()),
        None => (line, ""),
    }
}

/// Splits a comma-separated operand list into its trimmed pieces.
/// An empty remainder yields an empty vector rather than a vector with one
/// empty piece.
pub fn split_operands(rest: &str) -> Vec<&str> {
    if rest.is_empty() {
        return Vec::new();
    }
    rest.split(',').map(|p| p.trim()).collect()
}
