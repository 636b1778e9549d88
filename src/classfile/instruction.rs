//! Decoded bytecode instructions.
//!
//! An [`Instruction`] is a normalized opcode plus a fully resolved [`Operand`]. Normalization
//! folds the compact and wide encodings into one canonical form: `aload_2` becomes `aload`
//! with [`Operand::Var`]`(2)`, `ldc_w` and `ldc2_w` become `ldc`, `goto_w` becomes `goto`, and
//! `jsr_w` becomes `jsr`. Two methods compiled with different constant pool layouts
//! therefore decode to comparable instruction streams.
//!
//! # Instruction Kinds
//!
//! Every opcode belongs to one [`InsnKind`] family. The family decides how two instructions
//! with the same opcode are compared during code similarity scoring:
//!
//! | Kind | Opcodes | Operand |
//! |------|---------|---------|
//! | `Insn` | no operand (`iadd`, `return`, ...) | [`Operand::None`] |
//! | `Int` | `bipush`, `sipush`, `newarray` | [`Operand::Int`], [`Operand::NewArray`] |
//! | `Var` | loads, stores, `ret` | [`Operand::Var`] |
//! | `Type` | `new`, `anewarray`, `checkcast`, `instanceof` | [`Operand::Type`] |
//! | `Field` | `get`/`put` `static`/`field` | [`Operand::Field`] |
//! | `Method` | `invokevirtual`, `invokespecial`, `invokestatic`, `invokeinterface` | [`Operand::Method`] |
//! | `InvokeDynamic` | `invokedynamic` | [`Operand::InvokeDynamic`] |
//! | `Jump` | conditional branches, `goto`, `jsr` | [`Operand::Jump`] |
//! | `Ldc` | `ldc` | [`Operand::Constant`] |
//! | `Iinc` | `iinc` | [`Operand::Iinc`] |
//! | `TableSwitch` | `tableswitch` | [`Operand::TableSwitch`] |
//! | `LookupSwitch` | `lookupswitch` | [`Operand::LookupSwitch`] |
//! | `MultiANewArray` | `multianewarray` | [`Operand::MultiANewArray`] |

use strum::Display;

use crate::classfile::{
    constpool::{Constant, MemberRef},
    opcodes,
};

/// The operand family of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[allow(missing_docs)]
pub enum InsnKind {
    Insn,
    Int,
    Var,
    Type,
    Field,
    Method,
    InvokeDynamic,
    Jump,
    Ldc,
    Iinc,
    TableSwitch,
    LookupSwitch,
    MultiANewArray,
}

/// A resolved instruction operand.
///
/// Branch targets are absolute bytecode offsets within the method.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// Immediate of `bipush` / `sipush`
    Int(i32),
    /// Array type code of `newarray` (4 = boolean .. 11 = long)
    NewArray(u8),
    /// Local variable slot
    Var(u16),
    /// `iinc` slot and increment
    Iinc {
        /// Local variable slot
        var: u16,
        /// Signed increment
        delta: i16,
    },
    /// Branch target
    Jump(i64),
    /// `tableswitch` targets for `low..=high`
    TableSwitch {
        /// Default target
        default: i64,
        /// Lowest key
        low: i32,
        /// Highest key
        high: i32,
        /// One target per key
        targets: Vec<i64>,
    },
    /// `lookupswitch` key/target pairs
    LookupSwitch {
        /// Default target
        default: i64,
        /// Sorted `(key, target)` pairs
        pairs: Vec<(i32, i64)>,
    },
    /// Class operand by internal name; array classes keep their descriptor form
    Type(String),
    /// Field reference
    Field(MemberRef),
    /// Method reference
    Method {
        /// The referenced method
        member: MemberRef,
        /// Referenced through an `InterfaceMethodref`
        interface: bool,
    },
    /// Call site of `invokedynamic`
    InvokeDynamic {
        /// Call site name
        name: String,
        /// Call site descriptor
        desc: String,
    },
    /// `ldc` constant
    Constant(Constant),
    /// `multianewarray` array type and dimension count
    MultiANewArray {
        /// Array descriptor
        desc: String,
        /// Dimensions to allocate
        dimensions: u8,
    },
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Offset of the first byte (the `wide` prefix, if any) within the code array
    pub offset: u32,
    /// Normalized opcode
    pub opcode: u8,
    /// Resolved operand
    pub operand: Operand,
}

impl Instruction {
    /// The operand family of this instruction.
    #[must_use]
    pub fn kind(&self) -> InsnKind {
        kind_of(self.opcode)
    }

    /// Lower-case mnemonic of the normalized opcode.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        opcodes::mnemonic(self.opcode).unwrap_or("???")
    }
}

/// The operand family of a normalized opcode.
#[must_use]
pub fn kind_of(opcode: u8) -> InsnKind {
    match opcode {
        opcodes::BIPUSH | opcodes::SIPUSH | opcodes::NEWARRAY => InsnKind::Int,
        opcodes::LDC => InsnKind::Ldc,
        opcodes::ILOAD..=opcodes::ALOAD | opcodes::ISTORE..=opcodes::ASTORE | opcodes::RET => {
            InsnKind::Var
        }
        opcodes::IINC => InsnKind::Iinc,
        opcodes::IFEQ..=opcodes::JSR | opcodes::IFNULL | opcodes::IFNONNULL => InsnKind::Jump,
        opcodes::TABLESWITCH => InsnKind::TableSwitch,
        opcodes::LOOKUPSWITCH => InsnKind::LookupSwitch,
        opcodes::GETSTATIC..=opcodes::PUTFIELD => InsnKind::Field,
        opcodes::INVOKEVIRTUAL..=opcodes::INVOKEINTERFACE => InsnKind::Method,
        opcodes::INVOKEDYNAMIC => InsnKind::InvokeDynamic,
        opcodes::NEW | opcodes::ANEWARRAY | opcodes::CHECKCAST | opcodes::INSTANCEOF => {
            InsnKind::Type
        }
        opcodes::MULTIANEWARRAY => InsnKind::MultiANewArray,
        _ => InsnKind::Insn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(kind_of(opcodes::IADD), InsnKind::Insn);
        assert_eq!(kind_of(opcodes::RETURN), InsnKind::Insn);
        assert_eq!(kind_of(opcodes::ALOAD), InsnKind::Var);
        assert_eq!(kind_of(opcodes::RET), InsnKind::Var);
        assert_eq!(kind_of(opcodes::GOTO), InsnKind::Jump);
        assert_eq!(kind_of(opcodes::IFNONNULL), InsnKind::Jump);
        assert_eq!(kind_of(opcodes::PUTFIELD), InsnKind::Field);
        assert_eq!(kind_of(opcodes::INVOKEINTERFACE), InsnKind::Method);
        assert_eq!(kind_of(opcodes::CHECKCAST), InsnKind::Type);
        assert_eq!(kind_of(opcodes::NEWARRAY), InsnKind::Int);
        assert_eq!(InsnKind::MultiANewArray.to_string(), "MultiANewArray");
    }

    #[test]
    fn mnemonic() {
        let insn = Instruction {
            offset: 0,
            opcode: opcodes::INVOKESTATIC,
            operand: Operand::None,
        };
        assert_eq!(insn.mnemonic(), "invokestatic");
        assert_eq!(insn.kind(), InsnKind::Method);
    }
}
