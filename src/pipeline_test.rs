//! Whole-pipeline tests exercising the assembler's testable scenarios
//! end to end: pre-processor, first pass, second pass and the `.ob`
//! writer wired together exactly as `main`'s `process_file` wires them.
//! Placed as its own file and declared only under `#[cfg(test)]`,
//! mirroring the reference crate's dedicated `src/test.rs` module.

use crate::errors::ErrorSink;
use crate::first_pass;
use crate::output;
use crate::preprocessor;
use crate::second_pass;
use crate::symtab::SymbolKind;

struct Assembled {
    ob: String,
    ent: String,
    ext: String,
    errors: usize,
}

fn assemble(source: &str) -> Assembled {
    let mut sink = ErrorSink::new();
    let (expanded, macros) = preprocessor::expand(source, "t.as", &mut sink);
    let first = first_pass::run(&expanded, "t.as", &macros, &mut sink);
    let mut symtab = first.symtab;
    let second = second_pass::run(&expanded, "t.as", &mut symtab, first.final_ic, &mut sink);

    let mut ob = Vec::new();
    output::write_ob(&mut ob, first.final_ic, first.final_dc, &second).unwrap();
    let mut ent = Vec::new();
    output::write_ent(&mut ent, &symtab).unwrap();
    let mut ext = Vec::new();
    output::write_ext(&mut ext, &second).unwrap();

    Assembled {
        ob: String::from_utf8(ob).unwrap(),
        ent: String::from_utf8(ent).unwrap(),
        ext: String::from_utf8(ext).unwrap(),
        errors: sink.len(),
    }
}

#[test]
fn scenario_register_operands_have_no_data_section() {
    let result = assemble("MAIN: mov r1, r2\nEND: stop\n");
    assert_eq!(result.errors, 0);
    let lines: Vec<&str> = result.ob.lines().collect();
    assert_eq!(lines[0], "3 0");
    assert_eq!(lines.len(), 4);
    assert!(result.ent.is_empty());
    assert!(result.ext.is_empty());
}

#[test]
fn scenario_external_reference_lands_in_ext_file() {
    let result = assemble(".extern FOO\njmp FOO\n");
    assert_eq!(result.errors, 0);
    assert_eq!(result.ext.lines().next(), Some("FOO 0101"));
    let op_word_line = result.ob.lines().nth(2).unwrap();
    let word = &op_word_line[op_word_line.len() - 5..];
    let value = u16::from_str_radix(word, 8).unwrap();
    assert_eq!(value & 0b111, 1);
}

#[test]
fn scenario_data_only_program_rebases_to_address_100() {
    let result = assemble("DATA: .data 5, 7, 9\n");
    assert_eq!(result.errors, 0);
    let lines: Vec<&str> = result.ob.lines().collect();
    assert_eq!(lines[0], "0 3");
    assert_eq!(lines[1], "0100 00005");
    assert_eq!(lines[2], "0101 00007");
    assert_eq!(lines[3], "0102 00011");
}

#[test]
fn scenario_string_emits_terminator_word() {
    let result = assemble("S: .string \"hi\"\n");
    assert_eq!(result.errors, 0);
    let lines: Vec<&str> = result.ob.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[3], "0102 00000");
}

#[test]
fn scenario_entry_promotion_writes_ent_file() {
    let result = assemble("LOOP: inc r3\n.entry LOOP\nstop\n");
    assert_eq!(result.errors, 0);
    assert_eq!(result.ent.lines().next(), Some("LOOP 0100"));
}

#[test]
fn scenario_duplicate_symbol_is_an_error() {
    let mut sink = ErrorSink::new();
    let source = "A: .data 1\nA: .data 2\n";
    let (expanded, macros) = preprocessor::expand(source, "t.as", &mut sink);
    first_pass::run(&expanded, "t.as", &macros, &mut sink);
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.entries()[0].category, crate::errors::Category::Symbol);
}

#[test]
fn determinism_rerunning_an_error_free_program_is_byte_identical() {
    let source = "MAIN: mov r1, r2\n.entry MAIN\n.extern FOO\njmp FOO\nEND: stop\n";
    let first = assemble(source);
    let second = assemble(source);
    assert_eq!(first.ob, second.ob);
    assert_eq!(first.ent, second.ent);
    assert_eq!(first.ext, second.ext);
}

#[test]
fn preprocessor_idempotence_on_an_already_expanded_file() {
    let source = "MAIN: mov r1, r2\nstop\n";
    let mut sink = ErrorSink::new();
    let (once, _) = preprocessor::expand(source, "t.as", &mut sink);
    let (twice, _) = preprocessor::expand(&once, "t.as", &mut sink);
    assert_eq!(once, twice);
}

#[test]
fn data_symbol_addresses_land_at_or_past_final_ic() {
    let mut sink = ErrorSink::new();
    let source = "CODE: mov r1, r2\nDATA: .data 1, 2\n";
    let (expanded, macros) = preprocessor::expand(source, "t.as", &mut sink);
    let first = first_pass::run(&expanded, "t.as", &macros, &mut sink);
    assert!(sink.is_empty());
    let data_symbol = first.symtab.find("DATA").unwrap();
    assert_eq!(data_symbol.kind, SymbolKind::Data);
    assert!(data_symbol.address >= first.final_ic);
}
