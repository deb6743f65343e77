//! Output emitters (C10): formats the in-memory results of the second
//! pass into the three on-disk text artifacts described in §6. No
//! parsing or validation happens here — only formatting of data the
//! passes have already validated, grounded on the reference crate's own
//! `read_file`/`write_file` wrapping of a `BufWriter`.

use crate::first_pass::FIRST_ADDRESS;
use crate::second_pass::{AddressedWord, SecondPassResult};
use crate::symtab::{SymbolKind, SymbolTable};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// One `.ob` body line: 4-digit decimal address, 5-digit zero-padded
/// octal word (a 15-bit value never needs more than 5 octal digits).
fn ob_line(addr: u32, word: u16) -> String {
    format!("{:04} {:05o}", addr, word)
}

/// One `.ent`/`.ext` line: bare name, 4-digit decimal address.
fn index_line(name: &str, addr: u32) -> String {
    format!("{} {:04}", name, addr)
}

/// Code words followed by data words, both already address-ordered
/// within themselves; merging by address keeps the file strictly
/// ascending even though the two vectors were built independently.
fn ordered_words(result: &SecondPassResult) -> Vec<AddressedWord> {
    let mut words: Vec<AddressedWord> = result
        .code_words
        .iter()
        .copied()
        .chain(result.data_words.iter().copied())
        .collect();
    words.sort_by_key(|(addr, _)| *addr);
    words
}

pub fn write_ob<W: Write>(
    writer: &mut W,
    final_ic: u32,
    final_dc: u32,
    result: &SecondPassResult,
) -> io::Result<()> {
    writeln!(writer, "{} {}", final_ic - FIRST_ADDRESS, final_dc)?;
    for (addr, word) in ordered_words(result) {
        writeln!(writer, "{}", ob_line(addr, word))?;
    }
    Ok(())
}

/// One line per `Entry` symbol, sorted by address so the file is
/// deterministic regardless of the symbol table's hash-map iteration
/// order.
pub fn write_ent<W: Write>(writer: &mut W, symtab: &SymbolTable) -> io::Result<()> {
    let mut entries: Vec<_> = symtab
        .entries()
        .filter(|s| s.kind == SymbolKind::Entry)
        .collect();
    entries.sort_by(|a, b| a.address.cmp(&b.address).then_with(|| a.name.cmp(&b.name)));
    for sym in entries {
        writeln!(writer, "{}", index_line(&sym.name, sym.address))?;
    }
    Ok(())
}

/// One line per recorded external *reference*, not per symbol, sorted
/// by address for the same determinism reason as `write_ent`.
pub fn write_ext<W: Write>(writer: &mut W, result: &SecondPassResult) -> io::Result<()> {
    let mut refs: Vec<(&str, u32)> = result
        .extern_refs
        .iter()
        .flat_map(|(name, addrs)| addrs.iter().map(move |addr| (name, *addr)))
        .collect();
    refs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    for (name, addr) in refs {
        writeln!(writer, "{}", index_line(name, addr))?;
    }
    Ok(())
}

pub fn write_ob_file(
    path: &Path,
    final_ic: u32,
    final_dc: u32,
    result: &SecondPassResult,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_ob(&mut writer, final_ic, final_dc, result)
}

pub fn write_ent_file(path: &Path, symtab: &SymbolTable) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_ent(&mut writer, symtab)
}

pub fn write_ext_file(path: &Path, result: &SecondPassResult) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_ext(&mut writer, result)
}
