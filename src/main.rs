//! CLI driver (C9): a thin `main` that parses arguments and hands every
//! file stem to a small per-file pipeline, printing the accumulated
//! diagnostics at the end. Grounded on the reference crate's own
//! `main`/`vasm()` split: argument parsing stays in `main`, fallible
//! work lives in a function that returns whether the file was usable.

#[macro_use]
extern crate clap;

mod encoder;
mod errors;
mod first_pass;
mod lexer;
mod opcodes;
mod operand;
mod output;
mod preprocessor;
mod second_pass;
mod symtab;

#[cfg(test)]
mod pipeline_test;

use clap::Arg;
use errors::{Category, ErrorSink};
use second_pass::SecondPassResult;
use std::path::PathBuf;
use std::process;
use symtab::SymbolTable;

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("FILES")
                .help("Source file stems to assemble, without the .as extension")
                .multiple(true)
                .required(true),
        )
        .get_matches();

    let stems: Vec<&str> = matches.values_of("FILES").unwrap().collect();

    let mut sink = ErrorSink::new();
    let inputted = stems.iter().filter(|stem| process_file(stem, &mut sink)).count();

    sink.print_summary();

    process::exit(if inputted > 0 { 0 } else { 1 });
}

/// Runs the full pipeline for one file stem. Returns whether the source
/// was successfully opened — the only thing the exit code depends on —
/// independent of whether translation itself logged errors.
fn process_file(stem: &str, sink: &mut ErrorSink) -> bool {
    let source_path = PathBuf::from(format!("{}.as", stem));
    let source = match std::fs::read_to_string(&source_path) {
        Ok(text) => text,
        Err(err) => {
            sink.log(
                Category::FileInput,
                format!("cannot open \"{}\": {}", source_path.display(), err),
                stem,
                -1,
            );
            return false;
        }
    };

    let before_preprocess = sink.len();
    let (expanded, macros) = preprocessor::expand(&source, stem, sink);
    if sink.len() != before_preprocess {
        return true;
    }

    let before_first_pass = sink.len();
    let first = first_pass::run(&expanded, stem, &macros, sink);
    drop(macros);
    if sink.len() != before_first_pass {
        return true;
    }

    let mut symtab = first.symtab;
    let before_second_pass = sink.len();
    let second = second_pass::run(&expanded, stem, &mut symtab, first.final_ic, sink);
    if sink.len() != before_second_pass {
        return true;
    }

    if let Err(err) = write_outputs(stem, first.final_ic, first.final_dc, &second, &symtab) {
        sink.log(
            Category::FileOutput,
            format!("failed to write output for \"{}\": {}", stem, err),
            stem,
            -1,
        );
    }

    true
}

fn write_outputs(
    stem: &str,
    final_ic: u32,
    final_dc: u32,
    second: &SecondPassResult,
    symtab: &SymbolTable,
) -> std::io::Result<()> {
    output::write_ob_file(&PathBuf::from(format!("{}.ob", stem)), final_ic, final_dc, second)?;

    if symtab.has_entries {
        output::write_ent_file(&PathBuf::from(format!("{}.ent", stem)), symtab)?;
    }

    if symtab.has_externs && !second.extern_refs.is_empty() {
        output::write_ext_file(&PathBuf::from(format!("{}.ext", stem)), second)?;
    }

    Ok(())
}
