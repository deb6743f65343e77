//! First pass (C5): sizes every line, populates the symbol table, and
//! rebases data-symbol addresses once the final instruction count is
//! known.

use crate::errors::{Category, ErrorSink};
use crate::lexer;
use crate::opcodes;
use crate::operand;
use crate::preprocessor::MacroTable;
use crate::symtab::{AddError, SymbolKind, SymbolTable};

/// Architectural first code address.
pub const FIRST_ADDRESS: u32 = 100;

pub struct FirstPassResult {
    pub symtab: SymbolTable,
    pub final_ic: u32,
    pub final_dc: u32,
}

fn log_add_error(sink: &mut ErrorSink, err: AddError, name: &str, file: &str, line: i32) {
    match err {
        AddError::DuplicateSymbol => sink.log(
            Category::Symbol,
            format!("duplicate symbol definition \"{}\"", name),
            file,
            line,
        ),
        AddError::NameIsMacro => sink.log(
            Category::Symbol,
            format!("\"{}\" is already a macro name", name),
            file,
            line,
        ),
    }
}

/// Parses a `.data N[, N]*` operand list. Requires at least one integer.
fn parse_data_operands(rest: &str) -> Option<Vec<i32>> {
    let pieces = lexer::split_operands(rest);
    if pieces.is_empty() {
        return None;
    }
    let mut values = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let piece = piece.strip_prefix('#').unwrap_or(piece);
        values.push(piece.parse::<i32>().ok()?);
    }
    Some(values)
}

/// Validates and unwraps a `.string "..."` operand: a double-quoted
/// literal with no internal quote. Returns the quoted length, i.e.
/// `(content.len() + 2)`, matching `(len - 2) + 1` content-plus-terminator
/// sizing from the literal's own written length.
fn string_operand_len(rest: &str) -> Option<usize> {
    let rest = rest.trim();
    if rest.len() < 2 || !rest.starts_with('"') || !rest.ends_with('"') {
        return None;
    }
    let inner = &rest[1..rest.len() - 1];
    if inner.contains('"') {
        return None;
    }
    Some(rest.len())
}

fn process_line(
    line: &str,
    file: &str,
    line_no: i32,
    symtab: &mut SymbolTable,
    macros: &MacroTable,
    ic: &mut u32,
    dc: &mut u32,
    sink: &mut ErrorSink,
) {
    let (label, rest) = lexer::split_label(line);
    if let Some(label) = label {
        if !lexer::is_label(label) {
            sink.log(Category::Syntax, "illegal label", file, line_no);
            return;
        }
    }
    if rest.is_empty() {
        return;
    }

    let (operation, operand_text) = lexer::split_operation(rest);

    match operation {
        ".data" => {
            match parse_data_operands(operand_text) {
                Some(values) => {
                    if let Some(label) = label {
                        if let Err(err) =
                            symtab.add(label, *dc, SymbolKind::Data, macros)
                        {
                            log_add_error(sink, err, label, file, line_no);
                        }
                    }
                    *dc += values.len() as u32;
                }
                None => sink.log(
                    Category::Syntax,
                    "malformed .data operand list",
                    file,
                    line_no,
                ),
            }
        }
        ".string" => match string_operand_len(operand_text) {
            Some(len) => {
                if let Some(label) = label {
                    if let Err(err) = symtab.add(label, *dc, SymbolKind::Data, macros) {
                        log_add_error(sink, err, label, file, line_no);
                    }
                }
                *dc += (len as u32 - 2) + 1;
            }
            None => sink.log(
                Category::Syntax,
                "malformed .string operand",
                file,
                line_no,
            ),
        },
        ".entry" => {
            symtab.has_entries = true;
        }
        ".extern" => {
            let names = lexer::split_operands(operand_text);
            if names.is_empty() {
                sink.log(Category::Syntax, "missing .extern operand", file, line_no);
            }
            for name in names {
                if !lexer::is_label(name) {
                    sink.log(Category::Syntax, "illegal external name", file, line_no);
                    continue;
                }
                if let Err(err) = symtab.add(name, 0, SymbolKind::External, macros) {
                    log_add_error(sink, err, name, file, line_no);
                }
            }
        }
        mnemonic_text => match opcodes::lookup(mnemonic_text) {
            Some(mnemonic) => {
                let tokens = lexer::split_operands(operand_text);
                match operand::parse_operands(&tokens, mnemonic.operand_count()) {
                    Ok(slots) => {
                        let len = operand::instruction_length(&slots);
                        if let Some(label) = label {
                            if let Err(err) = symtab.add(label, *ic, SymbolKind::Code, macros) {
                                log_add_error(sink, err, label, file, line_no);
                            }
                        }
                        *ic += len;
                    }
                    Err(_) => sink.log(
                        Category::Syntax,
                        format!("wrong operand shape for \"{}\"", mnemonic_text),
                        file,
                        line_no,
                    ),
                }
            }
            None => sink.log(Category::Syntax, "unknown operation", file, line_no),
        },
    }
}

/// Runs the first pass over `expanded` (the `.am` text), returning the
/// populated-but-not-yet-rebased symbol table plus the final `IC`/`DC`.
/// Rebasing happens here too, once the loop completes, per §4.5.
pub fn run(expanded: &str, file: &str, macros: &MacroTable, sink: &mut ErrorSink) -> FirstPassResult {
    let mut symtab = SymbolTable::new();
    let mut ic = FIRST_ADDRESS;
    let mut dc = 0u32;

    for (line_no, raw_line) in expanded.lines().enumerate() {
        let line_no = (line_no + 1) as i32;
        let prepared = lexer::prepare(raw_line);
        if prepared.is_empty() {
            continue;
        }
        process_line(
            &prepared, file, line_no, &mut symtab, macros, &mut ic, &mut dc, sink,
        );
    }

    symtab.rebase_data(ic);

    FirstPassResult {
        symtab,
        final_ic: ic,
        final_dc: dc,
    }
}
