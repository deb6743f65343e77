//! Operand parsing shared by the first pass (sizing) and the encoder
//! (C6). Replaces the reference architecture's `mode == 4 means absent`
//! integer sentinel with a tagged `Operand` enum.

use crate::lexer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// `#N`: the signed value as written, not yet masked to 12 bits.
    Immediate(i32),
    /// Bare identifier: a label reference, resolved against the symbol table later.
    Direct(String),
    /// `*rK`: register-indirect addressing.
    RegIndirect(u8),
    /// `rK`: register-direct addressing.
    RegDirect(u8),
}

impl Operand {
    /// The addressing-mode number (0-3) used in the first instruction word.
    pub fn mode(&self) -> u8 {
        match self {
            Operand::Immediate(_) => 0,
            Operand::Direct(_) => 1,
            Operand::RegIndirect(_) => 2,
            Operand::RegDirect(_) => 3,
        }
    }

    pub fn is_register(&self) -> bool {
        matches!(self, Operand::RegIndirect(_) | Operand::RegDirect(_))
    }
}

/// Parses a single already-trimmed operand token. Returns `None` if the
/// token matches none of the four addressing-mode syntaxes.
pub fn parse_operand(token: &str) -> Option<Operand> {
    if let Some(rest) = token.strip_prefix('#') {
        return if lexer::is_number(rest) || rest.starts_with('-') || rest.starts_with('+') {
            rest.parse::<i32>().ok().map(Operand::Immediate)
        } else {
            None
        };
    }
    if let Some(rest) = token.strip_prefix('*') {
        return lexer::register_id(rest).map(Operand::RegIndirect);
    }
    if let Some(id) = lexer::register_id(token) {
        return Some(Operand::RegDirect(id));
    }
    if lexer::is_label(token) {
        return Some(Operand::Direct(token.to_owned()));
    }
    None
}

/// The parsed (source, target) pair for an instruction with `expected`
/// operands (0, 1 or 2), given the raw comma-separated operand tokens.
///
/// A unary mnemonic's single operand is placed directly in the target
/// slot — the reference architecture instead parses it as a "source
/// placeholder" and relocates it into the target slot inside the
/// encoder; doing the placement once, here, avoids carrying that
/// bookkeeping through two passes.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OperandSlots {
    pub source: Option<Operand>,
    pub target: Option<Operand>,
}

#[derive(Debug)]
pub enum OperandError {
    WrongCount,
    Unparseable(String),
}

pub fn parse_operands(tokens: &[&str], expected: usize) -> Result<OperandSlots, OperandError> {
    if tokens.len() != expected {
        return Err(OperandError::WrongCount);
    }

    match expected {
        0 => Ok(OperandSlots::default()),
        1 => {
            let target = parse_operand(tokens[0])
                .ok_or_else(|| OperandError::Unparseable(tokens[0].to_owned()))?;
            Ok(OperandSlots {
                source: None,
                target: Some(target),
            })
        }
        2 => {
            let source = parse_operand(tokens[0])
                .ok_or_else(|| OperandError::Unparseable(tokens[0].to_owned()))?;
            let target = parse_operand(tokens[1])
                .ok_or_else(|| OperandError::Unparseable(tokens[1].to_owned()))?;
            Ok(OperandSlots {
                source: Some(source),
                target: Some(target),
            })
        }
        _ => unreachable!("catalog never expects more than two operands"),
    }
}

/// Instruction length in words, per the §4.5 sizing rule: 1 (the opcode
/// word) plus one per present operand, except that two register operands
/// (in any combination of direct/indirect) pack into a single shared word.
pub fn instruction_length(slots: &OperandSlots) -> u32 {
    let both_registers = matches!(
        (&slots.source, &slots.target),
        (Some(s), Some(t)) if s.is_register() && t.is_register()
    );
    if both_registers {
        return 2;
    }
    1 + slots.source.is_some() as u32 + slots.target.is_some() as u32
}
