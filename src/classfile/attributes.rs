//! Attribute tables (JVMS §4.7).
//!
//! Only the attributes the program model consumes are decoded: `Code` with its nested
//! `LineNumberTable` and `LocalVariableTable`, `ConstantValue`, `Signature` and `Record`.
//! Everything else is skipped by its declared length.

use crate::{
    classfile::{constpool::ConstantPool, decoder::decode, instruction::Instruction},
    file::parser::Parser,
    Result,
};

/// One `LineNumberTable` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumber {
    /// First bytecode offset of the line
    pub start_pc: u16,
    /// Source line
    pub line: u16,
}

/// One `LocalVariableTable` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableEntry {
    /// First bytecode offset where the variable holds a value
    pub start_pc: u16,
    /// Length of the live range in bytes
    pub length: u16,
    /// Variable name
    pub name: String,
    /// Field descriptor of the variable
    pub desc: String,
    /// Local variable slot
    pub index: u16,
}

/// A decoded `Code` attribute.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Code {
    /// Maximum operand stack depth
    pub max_stack: u16,
    /// Number of local variable slots
    pub max_locals: u16,
    /// Length of the code array in bytes
    pub code_length: u32,
    /// Decoded and normalized instructions
    pub instructions: Vec<Instruction>,
    /// Entries of all `LineNumberTable` attributes
    pub line_numbers: Vec<LineNumber>,
    /// Entries of all `LocalVariableTable` attributes
    pub local_variables: Vec<LocalVariableEntry>,
}

impl Code {
    /// Parse the body of a `Code` attribute.
    ///
    /// # Errors
    /// Returns an error if the body is truncated or the bytecode fails to decode.
    pub fn parse(data: &[u8], pool: &ConstantPool) -> Result<Code> {
        let mut parser = Parser::new(data);
        let max_stack = parser.read_be::<u16>()?;
        let max_locals = parser.read_be::<u16>()?;
        let code_length = parser.read_be::<u32>()?;
        let length = usize::try_from(code_length).map_err(|_| out_of_bounds_error!())?;
        let instructions = decode(parser.read_bytes(length)?, pool)?;

        let exception_table_length = usize::from(parser.read_be::<u16>()?);
        parser.advance_by(exception_table_length * 8)?;

        let mut line_numbers = Vec::new();
        let mut local_variables = Vec::new();
        for_each_attribute(&mut parser, pool, |name, body| {
            match name {
                "LineNumberTable" => {
                    let mut table = Parser::new(body);
                    let count = table.read_be::<u16>()?;
                    for _ in 0..count {
                        line_numbers.push(LineNumber {
                            start_pc: table.read_be::<u16>()?,
                            line: table.read_be::<u16>()?,
                        });
                    }
                }
                "LocalVariableTable" => {
                    let mut table = Parser::new(body);
                    let count = table.read_be::<u16>()?;
                    for _ in 0..count {
                        let start_pc = table.read_be::<u16>()?;
                        let length = table.read_be::<u16>()?;
                        let name = pool.utf8(table.read_be::<u16>()?)?.to_string();
                        let desc = pool.utf8(table.read_be::<u16>()?)?.to_string();
                        let index = table.read_be::<u16>()?;
                        local_variables.push(LocalVariableEntry {
                            start_pc,
                            length,
                            name,
                            desc,
                            index,
                        });
                    }
                }
                _ => {}
            }
            Ok(())
        })?;

        Ok(Code {
            max_stack,
            max_locals,
            code_length,
            instructions,
            line_numbers,
            local_variables,
        })
    }

    /// Inclusive `(min, max)` source line range, if any line numbers are present.
    #[must_use]
    pub fn line_range(&self) -> Option<(u16, u16)> {
        let min = self.line_numbers.iter().map(|l| l.line).min()?;
        let max = self.line_numbers.iter().map(|l| l.line).max()?;
        Some((min, max))
    }
}

/// Read an `attributes_count` prefixed attribute table, calling `f` with each attribute's
/// name and body.
pub(crate) fn for_each_attribute<'a, F>(
    parser: &mut Parser<'a>,
    pool: &ConstantPool,
    mut f: F,
) -> Result<()>
where
    F: FnMut(&str, &'a [u8]) -> Result<()>,
{
    let count = parser.read_be::<u16>()?;
    for _ in 0..count {
        let name = pool.utf8(parser.read_be::<u16>()?)?;
        let length = parser.read_be::<u32>()?;
        let length = usize::try_from(length).map_err(|_| out_of_bounds_error!())?;
        let body = parser.read_bytes(length)?;
        f(name, body)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::opcodes;

    fn pool() -> ConstantPool {
        // 1 "LineNumberTable", 2 "LocalVariableTable", 3 "this", 4 "LFoo;", 5 "Junk"
        let mut data = Vec::new();
        data.extend_from_slice(&6u16.to_be_bytes());
        for s in ["LineNumberTable", "LocalVariableTable", "this", "LFoo;", "Junk"] {
            data.push(1);
            data.extend_from_slice(&u16::try_from(s.len()).unwrap().to_be_bytes());
            data.extend_from_slice(s.as_bytes());
        }
        ConstantPool::parse(&mut Parser::new(&data)).unwrap()
    }

    #[test]
    fn parse_code_with_tables() {
        let mut body = Vec::new();
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&2u32.to_be_bytes());
        body.extend_from_slice(&[opcodes::ALOAD_0, opcodes::RETURN]);
        // one exception handler, skipped
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&[0; 8]);
        body.extend_from_slice(&3u16.to_be_bytes());
        // LineNumberTable: (0, 12), (1, 10)
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&10u32.to_be_bytes());
        body.extend_from_slice(&2u16.to_be_bytes());
        body.extend_from_slice(&[0, 0, 0, 12, 0, 1, 0, 10]);
        // Junk, skipped
        body.extend_from_slice(&5u16.to_be_bytes());
        body.extend_from_slice(&3u32.to_be_bytes());
        body.extend_from_slice(&[1, 2, 3]);
        // LocalVariableTable: this LFoo; slot 0 over [0, 2)
        body.extend_from_slice(&2u16.to_be_bytes());
        body.extend_from_slice(&12u32.to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&[0, 0, 0, 2, 0, 3, 0, 4, 0, 0]);

        let code = Code::parse(&body, &pool()).unwrap();
        assert_eq!(code.max_locals, 1);
        assert_eq!(code.code_length, 2);
        assert_eq!(code.instructions.len(), 2);
        assert_eq!(code.line_range(), Some((10, 12)));
        assert_eq!(code.local_variables.len(), 1);
        assert_eq!(code.local_variables[0].name, "this");
        assert_eq!(code.local_variables[0].desc, "LFoo;");
        assert_eq!(code.local_variables[0].length, 2);
    }

    #[test]
    fn truncated_attribute() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&5u16.to_be_bytes());
        data.extend_from_slice(&10u32.to_be_bytes());
        data.extend_from_slice(&[1, 2]);
        let pool = pool();
        let result = for_each_attribute(&mut Parser::new(&data), &pool, |_, _| Ok(()));
        assert!(result.is_err());
    }

    #[test]
    fn no_lines() {
        assert_eq!(Code::default().line_range(), None);
    }
}
