//! Categorized diagnostics sink (C8).
//!
//! The assembler never aborts the process on a recoverable error: every
//! pass logs into a shared [`ErrorSink`] and keeps going on the rest of
//! the file. Only a handful of conditions (see [`Fatal`]) stop a file's
//! processing outright.

use std::fmt;

/// Fixed-capacity sink; the 101st entry for a run is silently dropped.
const CAPACITY: usize = 100;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Category {
    Memory,
    FileInput,
    FileOutput,
    Syntax,
    Semantic,
    Macro,
    Overflow,
    Symbol,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Category::Memory => "Memory",
            Category::FileInput => "FileInput",
            Category::FileOutput => "FileOutput",
            Category::Syntax => "Syntax",
            Category::Semantic => "Semantic",
            Category::Macro => "Macro",
            Category::Overflow => "Overflow",
            Category::Symbol => "Symbol",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Entry {
    pub category: Category,
    pub message: String,
    pub file: String,
    /// -1 when the line is not known (e.g. a whole-file failure).
    pub line: i32,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.line >= 0 {
            write!(
                f,
                "{}:{}: {}: {}",
                self.file, self.line, self.category, self.message
            )
        } else {
            write!(f, "{}: {}: {}", self.file, self.category, self.message)
        }
    }
}

/// Append-only, process-wide diagnostics collector.
#[derive(Default, Debug)]
pub struct ErrorSink {
    entries: Vec<Entry>,
}

impl ErrorSink {
    pub fn new() -> ErrorSink {
        ErrorSink {
            entries: Vec::new(),
        }
    }

    /// Records a diagnostic. Entries past the fixed capacity are dropped
    /// silently, matching the reference implementation's fixed-size log.
    pub fn log(&mut self, category: Category, message: impl Into<String>, file: &str, line: i32) {
        if self.entries.len() >= CAPACITY {
            return;
        }
        self.entries.push(Entry {
            category,
            message: message.into(),
            file: file.to_owned(),
            line,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries[..]
    }

    /// Prints every accumulated diagnostic, numbered, in insertion order.
    pub fn print_summary(&self) {
        if self.entries.is_empty() {
            return;
        }
        for (i, entry) in self.entries.iter().enumerate() {
            eprintln!("{}. {}", i + 1, entry);
        }
    }
}
