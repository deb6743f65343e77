//! Encoder (C6): turns a decoded instruction into 1-3 fifteen-bit output
//! words with correct A.R.E. tagging.

use crate::operand::{Operand, OperandSlots};
use crate::opcodes::Mnemonic;
use crate::symtab::{ExternRefs, SymbolKind, SymbolTable};

/// A single output word. Only the low 15 bits are meaningful.
pub type Word = u16;

/// A.R.E.: relocation tag occupying the low 3 bits of every word. The
/// three legal values are themselves single-bit flags (1, 2, 4), so they
/// can be OR'd directly into a word's low bits.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Are {
    External = 1,
    Relocatable = 2,
    Absolute = 4,
}

#[derive(Debug)]
pub enum EncodeError {
    UnknownSymbol(String),
}

/// Sentinel address used while absent operands have no occupied slot to
/// report; never written to a `.ob` line.
const ABSENT_MODE: u8 = 4;

fn mode_or_absent(operand: &Option<Operand>) -> u8 {
    operand.as_ref().map(|o| o.mode()).unwrap_or(ABSENT_MODE)
}

fn first_word(mnemonic: Mnemonic, slots: &OperandSlots) -> Word {
    let mut word: u16 = (mnemonic.opcode() as u16) << 11;

    let source_mode = mode_or_absent(&slots.source);
    if source_mode != ABSENT_MODE {
        word |= 1u16 << (7 + source_mode);
    }

    let target_mode = mode_or_absent(&slots.target);
    if target_mode != ABSENT_MODE {
        word |= 1u16 << (3 + target_mode);
    }

    word |= Are::Absolute as u16;
    word
}

fn operand_word(
    operand: &Operand,
    shift_if_register: u16,
    address: u32,
    symtab: &SymbolTable,
    extern_refs: &mut ExternRefs,
) -> Result<Word, EncodeError> {
    Ok(match operand {
        Operand::Immediate(value) => {
            let masked = (*value as u32) & 0xFFF;
            ((masked as u16) << 3) | Are::Absolute as u16
        }
        Operand::Direct(name) => match symtab.find(name) {
            Some(symbol) if symbol.kind == SymbolKind::External => {
                extern_refs.add(name, address);
                Are::External as u16
            }
            Some(symbol) => (((symbol.address & 0xFFF) as u16) << 3) | Are::Relocatable as u16,
            None => return Err(EncodeError::UnknownSymbol(name.clone())),
        },
        Operand::RegIndirect(reg) | Operand::RegDirect(reg) => {
            ((*reg as u16 & 7) << shift_if_register) | Are::Absolute as u16
        }
    })
}

/// Encodes one instruction into its output words. `address` is the file
/// address of the first (opcode) word; additional words occupy the
/// following consecutive addresses, which is also how external-reference
/// addresses are computed.
pub fn encode(
    mnemonic: Mnemonic,
    slots: &OperandSlots,
    address: u32,
    symtab: &SymbolTable,
    extern_refs: &mut ExternRefs,
) -> Result<Vec<Word>, EncodeError> {
    let mut words = vec![first_word(mnemonic, slots)];

    let both_registers = matches!(
        (&slots.source, &slots.target),
        (Some(s), Some(t)) if s.is_register() && t.is_register()
    );

    if both_registers {
        let source_reg = match &slots.source {
            Some(Operand::RegIndirect(r)) | Some(Operand::RegDirect(r)) => *r,
            _ => unreachable!(),
        };
        let target_reg = match &slots.target {
            Some(Operand::RegIndirect(r)) | Some(Operand::RegDirect(r)) => *r,
            _ => unreachable!(),
        };
        let word = ((source_reg as u16 & 7) << 6) | ((target_reg as u16 & 7) << 3) | Are::Absolute as u16;
        words.push(word);
        return Ok(words);
    }

    if let Some(source) = &slots.source {
        let word = operand_word(source, 6, address + words.len() as u32, symtab, extern_refs)?;
        words.push(word);
    }
    if let Some(target) = &slots.target {
        let word = operand_word(target, 3, address + words.len() as u32, symtab, extern_refs)?;
        words.push(word);
    }

    Ok(words)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::preprocessor::MacroTable;

    #[test]
    fn two_register_operands_pack_into_two_words() {
        let slots = OperandSlots {
            source: Some(Operand::RegDirect(1)),
            target: Some(Operand::RegDirect(2)),
        };
        let symtab = SymbolTable::new();
        let mut refs = ExternRefs::new();
        let words = encode(Mnemonic::Mov, &slots, 100, &symtab, &mut refs).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1], (1u16 << 6) | (2u16 << 3) | Are::Absolute as u16);
    }

    #[test]
    fn unary_instruction_emits_only_target_word() {
        let slots = OperandSlots {
            source: None,
            target: Some(Operand::RegDirect(3)),
        };
        let symtab = SymbolTable::new();
        let mut refs = ExternRefs::new();
        let words = encode(Mnemonic::Inc, &slots, 100, &symtab, &mut refs).unwrap();
        assert_eq!(words.len(), 2);
        // bits 10..7 (source one-hot) must all be clear.
        assert_eq!(words[0] & 0b0000_0111_1000_0000, 0);
    }

    #[test]
    fn immediate_operand_is_masked_to_twelve_bits() {
        let slots = OperandSlots {
            source: None,
            target: Some(Operand::Immediate(-1)),
        };
        let symtab = SymbolTable::new();
        let mut refs = ExternRefs::new();
        let words = encode(Mnemonic::Prn, &slots, 100, &symtab, &mut refs).unwrap();
        assert_eq!(words[1], (0xFFFu16 << 3) | Are::Absolute as u16);
    }

    #[test]
    fn external_direct_operand_records_reference_and_zeroes_address() {
        let macros = MacroTable::new();
        let mut symtab = SymbolTable::new();
        symtab
            .add("FOO", 0, SymbolKind::External, &macros)
            .unwrap();
        let mut refs = ExternRefs::new();
        let slots = OperandSlots {
            source: None,
            target: Some(Operand::Direct("FOO".to_owned())),
        };
        let words = encode(Mnemonic::Jmp, &slots, 100, &symtab, &mut refs).unwrap();
        assert_eq!(words[1], Are::External as u16);
        let (name, addrs) = refs.iter().next().unwrap();
        assert_eq!(name, "FOO");
        assert_eq!(addrs, &[101]);
    }

    #[test]
    fn internal_direct_operand_encodes_relocatable_address() {
        let macros = MacroTable::new();
        let mut symtab = SymbolTable::new();
        symtab.add("LOOP", 104, SymbolKind::Code, &macros).unwrap();
        let mut refs = ExternRefs::new();
        let slots = OperandSlots {
            source: None,
            target: Some(Operand::Direct("LOOP".to_owned())),
        };
        let words = encode(Mnemonic::Jmp, &slots, 100, &symtab, &mut refs).unwrap();
        assert_eq!(words[1], (104u16 << 3) | Are::Relocatable as u16);
    }

    #[test]
    fn unknown_direct_symbol_fails_encoding() {
        let symtab = SymbolTable::new();
        let mut refs = ExternRefs::new();
        let slots = OperandSlots {
            source: None,
            target: Some(Operand::Direct("GHOST".to_owned())),
        };
        assert!(matches!(
            encode(Mnemonic::Jmp, &slots, 100, &symtab, &mut refs),
            Err(EncodeError::UnknownSymbol(_))
        ));
    }
}
