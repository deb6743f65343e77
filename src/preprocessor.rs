//! Macro pre-processor (C3).
//!
//! Expands `macr NAME` ... `endmacr` blocks into an in-memory `.am` text,
//! replacing the reference implementation's temp-file round-trip (see
//! the design notes on the temporary code file) with a `String` built
//! directly in memory.

use crate::errors::{Category, ErrorSink};
use crate::lexer;
use std::collections::HashMap;

#[derive(Default, Debug)]
pub struct MacroTable {
    bodies: HashMap<String, Vec<String>>,
}

impl MacroTable {
    pub fn new() -> MacroTable {
        MacroTable {
            bodies: HashMap::new(),
        }
    }

    pub fn define(&mut self, name: String, body: Vec<String>) {
        self.bodies.insert(name, body);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bodies.contains_key(name)
    }

    pub fn body(&self, name: &str) -> Option<&[String]> {
        self.bodies.get(name).map(|b| b.as_slice())
    }
}

/// Expands `source` into its `.am` text. Errors are logged to `sink`;
/// the returned text is produced on a best-effort basis even when errors
/// occurred, but the driver must not feed it to the first pass unless
/// `sink` logged nothing for this file (the caller tracks that by
/// snapshotting the sink's length before calling this function).
pub fn expand(source: &str, file: &str, sink: &mut ErrorSink) -> (String, MacroTable) {
    let mut macros = MacroTable::new();
    let mut output = String::with_capacity(source.len());

    let mut lines = source.lines().enumerate().peekable();
    while let Some((line_no, raw_line)) = lines.next() {
        let line_no = (line_no + 1) as i32;

        if raw_line.len() > lexer::MAX_LINE_LEN {
            sink.log(
                Category::Syntax,
                "source line exceeds 80 characters",
                file,
                line_no,
            );
        }

        let trimmed = lexer::prepare(raw_line);

        if let Some(rest) = trimmed.strip_prefix("macr") {
            let name = rest.trim();
            if name.is_empty() || !lexer::is_label(name) || macros.contains(name) {
                sink.log(
                    Category::Macro,
                    format!("invalid macro name \"{}\"", name),
                    file,
                    line_no,
                );
            }
            let mut body = Vec::new();
            loop {
                match lines.next() {
                    Some((_, body_line)) => {
                        if lexer::prepare(body_line) == "endmacr" {
                            break;
                        }
                        body.push(body_line.to_owned());
                    }
                    None => {
                        sink.log(
                            Category::Macro,
                            "macr block missing endmacr",
                            file,
                            line_no,
                        );
                        break;
                    }
                }
            }
            macros.define(name.to_owned(), body);
            continue;
        }

        if trimmed == "endmacr" {
            // endmacr outside of a macr block: dropped silently.
            continue;
        }

        if let Some(body) = macros.body(&trimmed) {
            for body_line in body {
                output.push_str(body_line);
                output.push('\n');
            }
            continue;
        }

        output.push_str(raw_line);
        output.push('\n');
    }

    (output, macros)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn expands_macro_invocation_in_place() {
        let source = "macr GREET\nprn #1\nprn #2\nendmacr\nGREET\nstop\n";
        let mut sink = ErrorSink::new();
        let (expanded, _) = expand(source, "a.as", &mut sink);
        assert!(sink.is_empty());
        assert_eq!(expanded, "prn #1\nprn #2\nstop\n");
    }

    #[test]
    fn passes_through_non_macro_lines_unchanged() {
        let source = "MAIN: mov r1, r2\nstop\n";
        let mut sink = ErrorSink::new();
        let (expanded, _) = expand(source, "a.as", &mut sink);
        assert_eq!(expanded, source);
    }

    #[test]
    fn drops_stray_endmacr() {
        let source = "endmacr\nstop\n";
        let mut sink = ErrorSink::new();
        let (expanded, _) = expand(source, "a.as", &mut sink);
        assert_eq!(expanded, "stop\n");
    }

    #[test]
    fn is_idempotent_on_an_already_expanded_file() {
        let source = "prn #1\nprn #2\nstop\n";
        let mut sink = ErrorSink::new();
        let (expanded, _) = expand(source, "a.as", &mut sink);
        assert_eq!(expanded, source);
    }

    #[test]
    fn rejects_invalid_macro_names() {
        let source = "macr 1BAD\nstop\nendmacr\n";
        let mut sink = ErrorSink::new();
        expand(source, "a.as", &mut sink);
        assert!(!sink.is_empty());
    }
}
