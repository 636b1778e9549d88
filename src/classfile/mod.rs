//! JVM classfile reader.
//!
//! This module turns the bytes of one `.class` file into a [`ClassFile`]: the class header,
//! fields, and methods with their decoded bytecode. It is a read-only, single pass reader
//! that keeps exactly what the program model needs and skips everything else.
//!
//! # Key Components
//!
//! - [`ClassFile`] - A parsed class with its [`FieldInfo`] and [`MethodInfo`] members
//! - [`ConstantPool`] - The constant pool with on-demand resolution
//! - [`Type`] / [`MethodDescriptor`] - Parsed descriptors
//! - [`Instruction`] / [`Operand`] - Normalized bytecode produced by [`decode`]
//! - [`opcodes`] - Opcode constants and mnemonics
//!
//! # Examples
//!
//! ```rust,no_run
//! use remapper::classfile::ClassFile;
//!
//! let bytes = std::fs::read("Foo.class")?;
//! let class = ClassFile::parse(&bytes)?;
//! println!("{} extends {:?}", class.name, class.super_name);
//! for method in &class.methods {
//!     println!("  {}{}", method.name, method.desc);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod attributes;
mod constpool;
mod decoder;
mod descriptor;
mod flags;
mod instruction;
pub mod opcodes;

pub use attributes::{Code, LineNumber, LocalVariableEntry};
pub use constpool::{Constant, ConstantPool, MemberRef, PoolEntry};
pub use decoder::decode;
pub use descriptor::{MethodDescriptor, Sort, Type};
pub use flags::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
pub use instruction::{kind_of, InsnKind, Instruction, Operand};

use crate::{
    file::{io::read_be, parser::Parser},
    Result,
};
use attributes::for_each_attribute;

/// The `0xCAFEBABE` classfile magic.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// A parsed field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    /// Access flags
    pub access: FieldAccessFlags,
    /// Field name
    pub name: String,
    /// Raw descriptor
    pub desc: String,
    /// Parsed descriptor
    pub ty: Type,
    /// Generic `Signature` attribute
    pub signature: Option<String>,
    /// `ConstantValue` attribute
    pub constant: Option<Constant>,
}

/// A parsed method declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    /// Access flags
    pub access: MethodAccessFlags,
    /// Method name
    pub name: String,
    /// Raw descriptor
    pub desc: String,
    /// Parsed descriptor
    pub descriptor: MethodDescriptor,
    /// Generic `Signature` attribute
    pub signature: Option<String>,
    /// `Code` attribute; absent for abstract and native methods
    pub code: Option<Code>,
}

/// A parsed classfile.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    /// Minor version
    pub minor_version: u16,
    /// Major version
    pub major_version: u16,
    /// Access flags, including the [`ClassAccessFlags::RECORD`] pseudo flag
    pub access: ClassAccessFlags,
    /// Internal name (`com/example/Foo`)
    pub name: String,
    /// Internal name of the superclass; `None` only for `java/lang/Object` and modules
    pub super_name: Option<String>,
    /// Internal names of the direct superinterfaces
    pub interfaces: Vec<String>,
    /// Generic `Signature` attribute
    pub signature: Option<String>,
    /// Fields in declaration order
    pub fields: Vec<FieldInfo>,
    /// Methods in declaration order
    pub methods: Vec<MethodInfo>,
}

impl ClassFile {
    /// Parse a complete classfile.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a bad magic number, constant pool, descriptor or
    /// bytecode, and [`crate::Error::OutOfBounds`] if a structure runs past the end of `data`.
    pub fn parse(data: &[u8]) -> Result<ClassFile> {
        if read_be::<u32>(data)? != MAGIC {
            return Err(malformed_error!("Invalid classfile magic"));
        }

        let mut parser = Parser::new(data);
        parser.advance_by(4)?;
        let minor_version = parser.read_be::<u16>()?;
        let major_version = parser.read_be::<u16>()?;
        let pool = ConstantPool::parse(&mut parser)?;

        let mut access = ClassAccessFlags::from_raw(parser.read_be::<u16>()?);
        let name = pool.class_name(parser.read_be::<u16>()?)?.to_string();
        let super_name = match parser.read_be::<u16>()? {
            0 => None,
            index => Some(pool.class_name(index)?.to_string()),
        };

        let interface_count = parser.read_be::<u16>()?;
        let mut interfaces = Vec::with_capacity(usize::from(interface_count));
        for _ in 0..interface_count {
            interfaces.push(pool.class_name(parser.read_be::<u16>()?)?.to_string());
        }

        let field_count = parser.read_be::<u16>()?;
        let mut fields = Vec::with_capacity(usize::from(field_count));
        for _ in 0..field_count {
            fields.push(Self::parse_field(&mut parser, &pool)?);
        }

        let method_count = parser.read_be::<u16>()?;
        let mut methods = Vec::with_capacity(usize::from(method_count));
        for _ in 0..method_count {
            methods.push(Self::parse_method(&mut parser, &pool)?);
        }

        let mut signature = None;
        for_each_attribute(&mut parser, &pool, |attr, body| {
            match attr {
                "Signature" => signature = Some(signature_of(body, &pool)?),
                "Record" => access |= ClassAccessFlags::RECORD,
                _ => {}
            }
            Ok(())
        })?;

        if parser.has_more_data() {
            log::debug!(
                "{}: {} trailing bytes after classfile",
                name,
                parser.remaining()
            );
        }

        Ok(ClassFile {
            minor_version,
            major_version,
            access,
            name,
            super_name,
            interfaces,
            signature,
            fields,
            methods,
        })
    }

    fn parse_field(parser: &mut Parser, pool: &ConstantPool) -> Result<FieldInfo> {
        let access = FieldAccessFlags::from_raw(parser.read_be::<u16>()?);
        let name = pool.utf8(parser.read_be::<u16>()?)?.to_string();
        let desc = pool.utf8(parser.read_be::<u16>()?)?.to_string();
        let ty = Type::parse(&desc)?;

        let mut signature = None;
        let mut constant = None;
        for_each_attribute(parser, pool, |attr, body| {
            match attr {
                "Signature" => signature = Some(signature_of(body, pool)?),
                "ConstantValue" => {
                    let index = Parser::new(body).read_be::<u16>()?;
                    constant = Some(pool.loadable(index)?);
                }
                _ => {}
            }
            Ok(())
        })?;

        Ok(FieldInfo {
            access,
            name,
            desc,
            ty,
            signature,
            constant,
        })
    }

    fn parse_method(parser: &mut Parser, pool: &ConstantPool) -> Result<MethodInfo> {
        let access = MethodAccessFlags::from_raw(parser.read_be::<u16>()?);
        let name = pool.utf8(parser.read_be::<u16>()?)?.to_string();
        let desc = pool.utf8(parser.read_be::<u16>()?)?.to_string();
        let descriptor = MethodDescriptor::parse(&desc)?;

        let mut signature = None;
        let mut code = None;
        for_each_attribute(parser, pool, |attr, body| {
            match attr {
                "Signature" => signature = Some(signature_of(body, pool)?),
                "Code" => code = Some(Code::parse(body, pool)?),
                _ => {}
            }
            Ok(())
        })?;

        Ok(MethodInfo {
            access,
            name,
            desc,
            descriptor,
            signature,
            code,
        })
    }

    /// Returns `true` for interfaces, including annotation interfaces.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access.contains(ClassAccessFlags::INTERFACE)
    }
}

fn signature_of(body: &[u8], pool: &ConstantPool) -> Result<String> {
    let index = Parser::new(body).read_be::<u16>()?;
    Ok(pool.utf8(index)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test::builder::{ClassBuilder, Op},
        Error,
    };

    #[test]
    fn parse_built_class() {
        let bytes = ClassBuilder::new("com/example/Foo")
            .super_name("com/example/Base")
            .interface("java/lang/Runnable")
            .signature("Lcom/example/Base<Ljava/lang/String;>;")
            .field(0x0019, "MAX", "I", |f| f.constant_int(42))
            .field(0x0002, "name", "Ljava/lang/String;", |f| f)
            .method(0x0001, "run", "()V", |m| {
                m.code(&[
                    Op::Aload(0),
                    Op::GetField("com/example/Foo", "name", "Ljava/lang/String;"),
                    Op::Ldc("hello"),
                    Op::Pop,
                    Op::Pop,
                    Op::Return,
                ])
                .line(0, 7)
                .line(4, 9)
                .local(0, "this", "Lcom/example/Foo;")
            })
            .method(0x0401, "size", "()I", |m| m)
            .build();

        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.name, "com/example/Foo");
        assert_eq!(class.super_name.as_deref(), Some("com/example/Base"));
        assert_eq!(class.interfaces, vec!["java/lang/Runnable".to_string()]);
        assert_eq!(
            class.signature.as_deref(),
            Some("Lcom/example/Base<Ljava/lang/String;>;")
        );
        assert!(!class.is_interface());

        assert_eq!(class.fields.len(), 2);
        assert_eq!(class.fields[0].constant, Some(Constant::Int(42)));
        assert!(class.fields[0].access.contains(FieldAccessFlags::STATIC));
        assert_eq!(class.fields[1].ty.internal_name(), Some("java/lang/String"));

        assert_eq!(class.methods.len(), 2);
        let run = &class.methods[0];
        let code = run.code.as_ref().unwrap();
        assert_eq!(code.instructions.len(), 6);
        assert_eq!(code.instructions[0].opcode, opcodes::ALOAD);
        assert_eq!(code.line_range(), Some((7, 9)));
        assert_eq!(code.local_variables[0].name, "this");
        assert!(class.methods[1].code.is_none());
        assert!(class.methods[1].access.contains(MethodAccessFlags::ABSTRACT));
    }

    #[test]
    fn record_attribute_sets_flag() {
        let bytes = ClassBuilder::new("Point").record().build();
        let class = ClassFile::parse(&bytes).unwrap();
        assert!(class.access.contains(ClassAccessFlags::RECORD));
    }

    #[test]
    fn reject_bad_magic_and_truncation() {
        assert!(matches!(
            ClassFile::parse(&[0xCA, 0xFE, 0xBA, 0xBF, 0, 0, 0, 52]),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(ClassFile::parse(&[0xCA]), Err(Error::OutOfBounds)));

        let bytes = ClassBuilder::new("Foo").build();
        for len in [8, 10, bytes.len() - 1] {
            assert!(ClassFile::parse(&bytes[..len]).is_err(), "prefix {len}");
        }
    }

    #[test]
    fn reject_bad_descriptor() {
        let bytes = ClassBuilder::new("Foo")
            .field(0, "x", "Q", |f| f)
            .build();
        assert!(matches!(
            ClassFile::parse(&bytes),
            Err(Error::Malformed { .. })
        ));
    }
}
