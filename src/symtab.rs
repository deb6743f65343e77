//! Symbol table (C4) and external-reference index.
//!
//! Replaces the reference architecture's integer sentinels (`kind == -1`
//! for "no such symbol") with a plain `Option<&Symbol>` and a tagged
//! `SymbolKind` enum.

use std::collections::HashMap;

/// At most this many references are kept per external symbol.
const MAX_EXTERN_REFS: usize = 100;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum SymbolKind {
    Code,
    Data,
    Entry,
    External,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: u32,
    pub kind: SymbolKind,
}

#[derive(Debug)]
pub enum AddError {
    /// The name already names a symbol.
    DuplicateSymbol,
    /// The name already names a macro.
    NameIsMacro,
}

#[derive(Default, Debug)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    pub has_entries: bool,
    pub has_externs: bool,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            symbols: HashMap::new(),
            has_entries: false,
            has_externs: false,
        }
    }

    pub fn add(
        &mut self,
        name: &str,
        address: u32,
        kind: SymbolKind,
        macro_names: &crate::preprocessor::MacroTable,
    ) -> Result<(), AddError> {
        if self.symbols.contains_key(name) {
            return Err(AddError::DuplicateSymbol);
        }
        if macro_names.contains(name) {
            return Err(AddError::NameIsMacro);
        }
        if kind == SymbolKind::Entry {
            self.has_entries = true;
        }
        if kind == SymbolKind::External {
            self.has_externs = true;
        }
        self.symbols.insert(
            name.to_owned(),
            Symbol {
                name: name.to_owned(),
                address,
                kind,
            },
        );
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Promotes an already-present symbol to `Entry`. Fails (returns
    /// `false`, the caller logs a `Symbol` error) if the symbol is
    /// `External` or does not exist.
    pub fn promote_to_entry(&mut self, name: &str) -> bool {
        match self.symbols.get_mut(name) {
            Some(sym) if sym.kind != SymbolKind::External => {
                sym.kind = SymbolKind::Entry;
                self.has_entries = true;
                true
            }
            _ => false,
        }
    }

    /// Rebases every `Data` symbol's address by `final_ic`, run once after
    /// the first pass has finished sizing the code section.
    pub fn rebase_data(&mut self, final_ic: u32) {
        for symbol in self.symbols.values_mut() {
            if symbol.kind == SymbolKind::Data {
                symbol.address += final_ic;
            }
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

/// Ordered list of code addresses referencing an external symbol, keyed by
/// symbol name. Populated while encoding; consumed by the `.ext` emitter.
#[derive(Default, Debug)]
pub struct ExternRefs {
    refs: HashMap<String, Vec<u32>>,
}

impl ExternRefs {
    pub fn new() -> ExternRefs {
        ExternRefs {
            refs: HashMap::new(),
        }
    }

    /// Appends `address` to `name`'s reference list. Returns `false`
    /// (silently, per the 100-entry cap) once that name's list is full.
    pub fn add(&mut self, name: &str, address: u32) -> bool {
        let list = self.refs.entry(name.to_owned()).or_insert_with(Vec::new);
        if list.len() >= MAX_EXTERN_REFS {
            return false;
        }
        list.push(address);
        true
    }

    /// Iterates `(name, address)` pairs in a stable order: symbol names in
    /// first-seen insertion order, each symbol's addresses in recorded
    /// order. `HashMap` does not preserve insertion order on its own, so
    /// callers that need determinism (the `.ext` emitter) must sort by
    /// name; within a name the `Vec` already preserves order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.refs.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}
