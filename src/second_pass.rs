//! Second pass (C7): re-scans the expanded source, resolves every symbol
//! reference against the populated symbol table, and encodes each
//! instruction into its final output words.

use crate::encoder::{self, Word};
use crate::errors::{Category, ErrorSink};
use crate::first_pass::FIRST_ADDRESS;
use crate::lexer;
use crate::opcodes;
use crate::operand;
use crate::symtab::{ExternRefs, SymbolKind, SymbolTable};

/// One emitted word at its final file address.
pub type AddressedWord = (u32, Word);

#[derive(Default)]
pub struct SecondPassResult {
    pub code_words: Vec<AddressedWord>,
    pub data_words: Vec<AddressedWord>,
    pub extern_refs: ExternRefs,
}

/// Unwraps a `.string "..."` operand's quoted content. First pass already
/// validated the shape; this re-derives it rather than threading the
/// value through, matching the line-by-line independence of the two
/// passes.
fn string_literal_content(rest: &str) -> Option<&str> {
    let rest = rest.trim();
    if rest.len() < 2 || !rest.starts_with('"') || !rest.ends_with('"') {
        return None;
    }
    let inner = &rest[1..rest.len() - 1];
    if inner.contains('"') {
        return None;
    }
    Some(inner)
}

fn process_data(
    operand_text: &str,
    data_cursor: &mut u32,
    words: &mut Vec<AddressedWord>,
    file: &str,
    line_no: i32,
    sink: &mut ErrorSink,
) {
    for piece in lexer::split_operands(operand_text) {
        let piece = piece.strip_prefix('#').unwrap_or(piece);
        match piece.parse::<i32>() {
            Ok(value) => {
                words.push((*data_cursor, (value as u32 & 0x7FFF) as u16));
                *data_cursor += 1;
            }
            Err(_) => sink.log(Category::Syntax, "malformed .data operand", file, line_no),
        }
    }
}

fn process_string(
    operand_text: &str,
    data_cursor: &mut u32,
    words: &mut Vec<AddressedWord>,
    file: &str,
    line_no: i32,
    sink: &mut ErrorSink,
) {
    match string_literal_content(operand_text) {
        Some(content) => {
            for byte in content.bytes() {
                words.push((*data_cursor, byte as u16));
                *data_cursor += 1;
            }
            words.push((*data_cursor, 0));
            *data_cursor += 1;
        }
        None => sink.log(Category::Syntax, "malformed .string operand", file, line_no),
    }
}

fn process_entry(
    operand_text: &str,
    symtab: &mut SymbolTable,
    file: &str,
    line_no: i32,
    sink: &mut ErrorSink,
) {
    let name = operand_text.trim();
    if name.is_empty() {
        sink.log(Category::Syntax, "missing .entry operand", file, line_no);
        return;
    }
    match symtab.find(name) {
        Some(sym) if sym.kind == SymbolKind::External => sink.log(
            Category::Symbol,
            format!("\"{}\" is external, cannot be an entry", name),
            file,
            line_no,
        ),
        Some(_) => {
            symtab.promote_to_entry(name);
        }
        None => sink.log(
            Category::Symbol,
            format!("unknown entry symbol \"{}\"", name),
            file,
            line_no,
        ),
    }
}

fn process_instruction(
    mnemonic_text: &str,
    operand_text: &str,
    code_cursor: &mut u32,
    words: &mut Vec<AddressedWord>,
    symtab: &SymbolTable,
    extern_refs: &mut ExternRefs,
    file: &str,
    line_no: i32,
    sink: &mut ErrorSink,
) {
    let mnemonic = match opcodes::lookup(mnemonic_text) {
        Some(m) => m,
        None => {
            sink.log(Category::Syntax, "unknown operation", file, line_no);
            return;
        }
    };

    let tokens = lexer::split_operands(operand_text);
    let slots = match operand::parse_operands(&tokens, mnemonic.operand_count()) {
        Ok(slots) => slots,
        Err(_) => {
            sink.log(
                Category::Syntax,
                format!("wrong operand shape for \"{}\"", mnemonic_text),
                file,
                line_no,
            );
            return;
        }
    };

    match encoder::encode(mnemonic, &slots, *code_cursor, symtab, extern_refs) {
        Ok(encoded) => {
            let len = encoded.len() as u32;
            for (offset, word) in encoded.into_iter().enumerate() {
                words.push((*code_cursor + offset as u32, word));
            }
            *code_cursor += len;
        }
        Err(encoder::EncodeError::UnknownSymbol(name)) => {
            sink.log(
                Category::Symbol,
                format!("unknown symbol \"{}\"", name),
                file,
                line_no,
            );
            *code_cursor += operand::instruction_length(&slots);
        }
    }
}

/// Runs the second pass over `expanded`, the same text the first pass
/// consumed. `symtab` is mutated in place for `.entry` promotion.
pub fn run(
    expanded: &str,
    file: &str,
    symtab: &mut SymbolTable,
    final_ic: u32,
    sink: &mut ErrorSink,
) -> SecondPassResult {
    let mut result = SecondPassResult {
        extern_refs: ExternRefs::new(),
        ..Default::default()
    };
    let mut code_cursor = FIRST_ADDRESS;
    let mut data_cursor = final_ic;

    for (line_no, raw_line) in expanded.lines().enumerate() {
        let line_no = (line_no + 1) as i32;
        let prepared = lexer::prepare(raw_line);
        if prepared.is_empty() {
            continue;
        }

        let (_label, rest) = lexer::split_label(&prepared);
        if rest.is_empty() {
            continue;
        }
        let (operation, operand_text) = lexer::split_operation(rest);

        match operation {
            ".data" => process_data(
                operand_text,
                &mut data_cursor,
                &mut result.data_words,
                file,
                line_no,
                sink,
            ),
            ".string" => process_string(
                operand_text,
                &mut data_cursor,
                &mut result.data_words,
                file,
                line_no,
                sink,
            ),
            ".entry" => process_entry(operand_text, symtab, file, line_no, sink),
            ".extern" => {}
            mnemonic_text => process_instruction(
                mnemonic_text,
                operand_text,
                &mut code_cursor,
                &mut result.code_words,
                symtab,
                &mut result.extern_refs,
                file,
                line_no,
                sink,
            ),
        }
    }

    result
}
