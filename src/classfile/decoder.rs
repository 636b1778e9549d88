//! Bytecode decoder.
//!
//! [`decode`] walks a method's `code` array once, front to back, producing normalized
//! [`Instruction`]s with operands resolved against the constant pool. Switch padding is
//! aligned relative to the start of the code array, as the JVM requires.

use crate::{
    classfile::{
        constpool::ConstantPool,
        instruction::{Instruction, Operand},
        opcodes as op,
    },
    file::parser::Parser,
    Result,
};

/// Decode the bytecode of one method.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for undefined opcodes, invalid constant pool references
/// and switches with inverted bounds, and [`crate::Error::OutOfBounds`] for instructions that
/// run past the end of the code.
///
/// # Examples
///
/// ```rust
/// use remapper::classfile::{decode, opcodes, ConstantPool, Operand};
///
/// // aload_0; iconst_1; istore 5; return
/// let code = [0x2A, 0x04, 0x36, 0x05, 0xB1];
/// let insns = decode(&code, &ConstantPool::default())?;
/// assert_eq!(insns.len(), 4);
/// assert_eq!(insns[0].opcode, opcodes::ALOAD);
/// assert_eq!(insns[0].operand, Operand::Var(0));
/// assert_eq!(insns[2].operand, Operand::Var(5));
/// assert_eq!(insns[3].offset, 4);
/// # Ok::<(), remapper::Error>(())
/// ```
pub fn decode(code: &[u8], pool: &ConstantPool) -> Result<Vec<Instruction>> {
    let mut parser = Parser::new(code);
    let mut out = Vec::with_capacity(code.len() / 2);

    while parser.has_more_data() {
        let start = parser.pos();
        let offset = i64::try_from(start).map_err(|_| out_of_bounds_error!())?;
        let opcode = parser.read_be::<u8>()?;

        let (opcode, operand) = match opcode {
            op::NOP..=op::DCONST_1 => (opcode, Operand::None),
            op::BIPUSH => (opcode, Operand::Int(i32::from(parser.read_be::<i8>()?))),
            op::SIPUSH => (opcode, Operand::Int(i32::from(parser.read_be::<i16>()?))),
            op::LDC => {
                let index = u16::from(parser.read_be::<u8>()?);
                (op::LDC, Operand::Constant(pool.loadable(index)?))
            }
            op::LDC_W | op::LDC2_W => {
                let index = parser.read_be::<u16>()?;
                (op::LDC, Operand::Constant(pool.loadable(index)?))
            }
            op::ILOAD..=op::ALOAD | op::ISTORE..=op::ASTORE | op::RET => {
                (opcode, Operand::Var(u16::from(parser.read_be::<u8>()?)))
            }
            op::ILOAD_0..=op::ALOAD_3 => {
                let n = opcode - op::ILOAD_0;
                (op::ILOAD + n / 4, Operand::Var(u16::from(n % 4)))
            }
            op::ISTORE_0..=op::ASTORE_3 => {
                let n = opcode - op::ISTORE_0;
                (op::ISTORE + n / 4, Operand::Var(u16::from(n % 4)))
            }
            op::IALOAD..=op::SALOAD | op::IASTORE..=op::SASTORE => (opcode, Operand::None),
            op::POP..=op::LXOR => (opcode, Operand::None),
            op::IINC => {
                let var = u16::from(parser.read_be::<u8>()?);
                let delta = i16::from(parser.read_be::<i8>()?);
                (opcode, Operand::Iinc { var, delta })
            }
            op::I2L..=op::DCMPG => (opcode, Operand::None),
            op::IFEQ..=op::JSR | op::IFNULL | op::IFNONNULL => {
                let rel = i64::from(parser.read_be::<i16>()?);
                (opcode, Operand::Jump(offset + rel))
            }
            op::GOTO_W | op::JSR_W => {
                let rel = i64::from(parser.read_be::<i32>()?);
                let normalized = if opcode == op::GOTO_W { op::GOTO } else { op::JSR };
                (normalized, Operand::Jump(offset + rel))
            }
            op::TABLESWITCH => {
                parser.align(4)?;
                let default = offset + i64::from(parser.read_be::<i32>()?);
                let low = parser.read_be::<i32>()?;
                let high = parser.read_be::<i32>()?;
                if high < low {
                    return Err(malformed_error!(
                        "tableswitch at {} has low {} > high {}",
                        start,
                        low,
                        high
                    ));
                }
                let count = i64::from(high) - i64::from(low) + 1;
                // Each target takes 4 bytes; reject counts the code cannot hold before allocating
                let count = usize::try_from(count).map_err(|_| out_of_bounds_error!())?;
                parser.calc_end_position(count.saturating_mul(4))?;
                let mut targets = Vec::with_capacity(count);
                for _ in 0..count {
                    targets.push(offset + i64::from(parser.read_be::<i32>()?));
                }
                (
                    opcode,
                    Operand::TableSwitch {
                        default,
                        low,
                        high,
                        targets,
                    },
                )
            }
            op::LOOKUPSWITCH => {
                parser.align(4)?;
                let default = offset + i64::from(parser.read_be::<i32>()?);
                let npairs = parser.read_be::<i32>()?;
                let npairs = usize::try_from(npairs)
                    .map_err(|_| malformed_error!("lookupswitch at {} has negative size", start))?;
                parser.calc_end_position(npairs.saturating_mul(8))?;
                let mut pairs = Vec::with_capacity(npairs);
                for _ in 0..npairs {
                    let key = parser.read_be::<i32>()?;
                    let target = offset + i64::from(parser.read_be::<i32>()?);
                    pairs.push((key, target));
                }
                (opcode, Operand::LookupSwitch { default, pairs })
            }
            op::IRETURN..=op::RETURN => (opcode, Operand::None),
            op::GETSTATIC..=op::PUTFIELD => {
                let index = parser.read_be::<u16>()?;
                (opcode, Operand::Field(pool.field_ref(index)?))
            }
            op::INVOKEVIRTUAL..=op::INVOKESTATIC => {
                let index = parser.read_be::<u16>()?;
                let (member, interface) = pool.method_ref(index)?;
                (opcode, Operand::Method { member, interface })
            }
            op::INVOKEINTERFACE => {
                let index = parser.read_be::<u16>()?;
                // count and a reserved zero byte
                parser.advance_by(2)?;
                let (member, interface) = pool.method_ref(index)?;
                (opcode, Operand::Method { member, interface })
            }
            op::INVOKEDYNAMIC => {
                let index = parser.read_be::<u16>()?;
                parser.advance_by(2)?;
                let (name, desc) = pool.invoke_dynamic(index)?;
                (opcode, Operand::InvokeDynamic { name, desc })
            }
            op::NEW | op::ANEWARRAY | op::CHECKCAST | op::INSTANCEOF => {
                let index = parser.read_be::<u16>()?;
                (opcode, Operand::Type(pool.class_name(index)?.to_string()))
            }
            op::NEWARRAY => (opcode, Operand::NewArray(parser.read_be::<u8>()?)),
            op::ARRAYLENGTH | op::ATHROW | op::MONITORENTER | op::MONITOREXIT => {
                (opcode, Operand::None)
            }
            op::WIDE => {
                let widened = parser.read_be::<u8>()?;
                match widened {
                    op::IINC => {
                        let var = parser.read_be::<u16>()?;
                        let delta = parser.read_be::<i16>()?;
                        (widened, Operand::Iinc { var, delta })
                    }
                    op::ILOAD..=op::ALOAD | op::ISTORE..=op::ASTORE | op::RET => {
                        (widened, Operand::Var(parser.read_be::<u16>()?))
                    }
                    _ => {
                        return Err(malformed_error!(
                            "wide prefix on opcode {:#04x} at {}",
                            widened,
                            start
                        ))
                    }
                }
            }
            op::MULTIANEWARRAY => {
                let index = parser.read_be::<u16>()?;
                let dimensions = parser.read_be::<u8>()?;
                let desc = pool.class_name(index)?.to_string();
                (opcode, Operand::MultiANewArray { desc, dimensions })
            }
            _ => {
                return Err(malformed_error!(
                    "Undefined opcode {:#04x} at {}",
                    opcode,
                    start
                ))
            }
        };

        out.push(Instruction {
            offset: u32::try_from(start).map_err(|_| out_of_bounds_error!())?,
            opcode,
            operand,
        });
    }

    Ok(out)
}
