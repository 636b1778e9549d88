//! The classfile constant pool (JVMS §4.4).
//!
//! [`ConstantPool::parse`] reads the raw table into [`PoolEntry`] values that still refer to
//! each other by index. The accessors resolve those index chains on demand into owned values
//! ([`MemberRef`], [`Constant`]) so the decoder can hand fully resolved operands to the
//! program model.
//!
//! Long and double entries take two slots; the second slot, like slot 0, holds
//! [`PoolEntry::Unusable`] and any reference to it is malformed.

use crate::{file::parser::Parser, Result};

/// One raw constant pool slot.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum PoolEntry {
    /// Slot 0 and the upper half of a long or double
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef { class: u16, name_and_type: u16 },
    MethodRef { class: u16, name_and_type: u16 },
    InterfaceMethodRef { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType(u16),
    Dynamic { bootstrap: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap: u16, name_and_type: u16 },
    Module(u16),
    Package(u16),
}

/// A resolved symbolic reference to a field or method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberRef {
    /// Internal name of the class the reference is made through
    pub owner: String,
    /// Member name
    pub name: String,
    /// Member descriptor
    pub desc: String,
}

/// A resolved loadable constant, the operand of `ldc` and the value of `ConstantValue`.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// `int`, also used for `boolean`, `byte`, `char` and `short` constants
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// `java.lang.String`
    String(String),
    /// A class literal, by internal name
    Class(String),
    /// A method type, by descriptor
    MethodType(String),
    /// A method handle
    MethodHandle {
        /// Reference kind, 1 (`getField`) to 9 (`invokeInterface`)
        kind: u8,
        /// The referenced member
        reference: MemberRef,
    },
    /// A dynamically computed constant
    Dynamic {
        /// Name of the constant
        name: String,
        /// Field descriptor of the constant
        desc: String,
    },
}

/// The parsed constant pool of one classfile.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<PoolEntry>,
}

impl ConstantPool {
    /// Parse `constant_pool_count` followed by the pool entries.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an unknown tag and
    /// [`crate::Error::OutOfBounds`] if the pool runs past the data.
    pub fn parse(parser: &mut Parser) -> Result<ConstantPool> {
        let count = usize::from(parser.read_be::<u16>()?);
        let mut entries = Vec::with_capacity(count);
        entries.push(PoolEntry::Unusable);

        while entries.len() < count {
            let tag = parser.read_be::<u8>()?;
            let entry = match tag {
                1 => {
                    let length = parser.read_be::<u16>()?;
                    PoolEntry::Utf8(parser.read_modified_utf8(usize::from(length))?)
                }
                3 => PoolEntry::Integer(parser.read_be::<i32>()?),
                4 => PoolEntry::Float(parser.read_be::<f32>()?),
                5 => PoolEntry::Long(parser.read_be::<i64>()?),
                6 => PoolEntry::Double(parser.read_be::<f64>()?),
                7 => PoolEntry::Class(parser.read_be::<u16>()?),
                8 => PoolEntry::String(parser.read_be::<u16>()?),
                9 => PoolEntry::FieldRef {
                    class: parser.read_be::<u16>()?,
                    name_and_type: parser.read_be::<u16>()?,
                },
                10 => PoolEntry::MethodRef {
                    class: parser.read_be::<u16>()?,
                    name_and_type: parser.read_be::<u16>()?,
                },
                11 => PoolEntry::InterfaceMethodRef {
                    class: parser.read_be::<u16>()?,
                    name_and_type: parser.read_be::<u16>()?,
                },
                12 => PoolEntry::NameAndType {
                    name: parser.read_be::<u16>()?,
                    descriptor: parser.read_be::<u16>()?,
                },
                15 => PoolEntry::MethodHandle {
                    kind: parser.read_be::<u8>()?,
                    reference: parser.read_be::<u16>()?,
                },
                16 => PoolEntry::MethodType(parser.read_be::<u16>()?),
                17 => PoolEntry::Dynamic {
                    bootstrap: parser.read_be::<u16>()?,
                    name_and_type: parser.read_be::<u16>()?,
                },
                18 => PoolEntry::InvokeDynamic {
                    bootstrap: parser.read_be::<u16>()?,
                    name_and_type: parser.read_be::<u16>()?,
                },
                19 => PoolEntry::Module(parser.read_be::<u16>()?),
                20 => PoolEntry::Package(parser.read_be::<u16>()?),
                _ => {
                    return Err(malformed_error!(
                        "Invalid constant pool tag {} at entry {}",
                        tag,
                        entries.len()
                    ))
                }
            };

            let wide = matches!(entry, PoolEntry::Long(_) | PoolEntry::Double(_));
            entries.push(entry);
            if wide {
                entries.push(PoolEntry::Unusable);
            }
        }

        // A trailing long/double may claim one slot past the declared count
        entries.truncate(count.max(1));
        Ok(ConstantPool { entries })
    }

    /// Number of slots including the unusable slot 0.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the pool has no usable entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Look up a usable slot.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` is out of range or unusable.
    pub fn get(&self, index: u16) -> Result<&PoolEntry> {
        match self.entries.get(usize::from(index)) {
            Some(PoolEntry::Unusable) | None => Err(malformed_error!(
                "Invalid constant pool index {} (pool size {})",
                index,
                self.entries.len()
            )),
            Some(entry) => Ok(entry),
        }
    }

    /// Resolve a `CONSTANT_Utf8` entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the slot is missing or of another kind.
    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            PoolEntry::Utf8(value) => Ok(value),
            other => Err(malformed_error!("Expected Utf8 at {}, found {:?}", index, other)),
        }
    }

    /// Resolve a `CONSTANT_Class` entry to its internal name.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the slot is missing or of another kind.
    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            PoolEntry::Class(name) => self.utf8(*name),
            other => Err(malformed_error!("Expected Class at {}, found {:?}", index, other)),
        }
    }

    /// Resolve a `CONSTANT_NameAndType` entry to `(name, descriptor)`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the slot is missing or of another kind.
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        match self.get(index)? {
            PoolEntry::NameAndType { name, descriptor } => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            other => Err(malformed_error!(
                "Expected NameAndType at {}, found {:?}",
                index,
                other
            )),
        }
    }

    fn member(&self, class: u16, name_and_type: u16) -> Result<MemberRef> {
        let owner = self.class_name(class)?;
        let (name, desc) = self.name_and_type(name_and_type)?;
        Ok(MemberRef {
            owner: owner.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
        })
    }

    /// Resolve a `CONSTANT_Fieldref` entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the slot is missing or of another kind.
    pub fn field_ref(&self, index: u16) -> Result<MemberRef> {
        match self.get(index)? {
            PoolEntry::FieldRef {
                class,
                name_and_type,
            } => self.member(*class, *name_and_type),
            other => Err(malformed_error!("Expected Fieldref at {}, found {:?}", index, other)),
        }
    }

    /// Resolve a `CONSTANT_Methodref` or `CONSTANT_InterfaceMethodref` entry. The flag is
    /// `true` for interface method references.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the slot is missing or of another kind.
    pub fn method_ref(&self, index: u16) -> Result<(MemberRef, bool)> {
        match self.get(index)? {
            PoolEntry::MethodRef {
                class,
                name_and_type,
            } => Ok((self.member(*class, *name_and_type)?, false)),
            PoolEntry::InterfaceMethodRef {
                class,
                name_and_type,
            } => Ok((self.member(*class, *name_and_type)?, true)),
            other => Err(malformed_error!(
                "Expected Methodref at {}, found {:?}",
                index,
                other
            )),
        }
    }

    /// Resolve a `CONSTANT_InvokeDynamic` entry to `(name, descriptor)`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the slot is missing or of another kind.
    pub fn invoke_dynamic(&self, index: u16) -> Result<(String, String)> {
        match self.get(index)? {
            PoolEntry::InvokeDynamic { name_and_type, .. } => {
                let (name, desc) = self.name_and_type(*name_and_type)?;
                Ok((name.to_string(), desc.to_string()))
            }
            other => Err(malformed_error!(
                "Expected InvokeDynamic at {}, found {:?}",
                index,
                other
            )),
        }
    }

    /// Resolve a loadable entry, as referenced by `ldc` or a `ConstantValue` attribute.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the slot is missing or not loadable.
    pub fn loadable(&self, index: u16) -> Result<Constant> {
        Ok(match self.get(index)? {
            PoolEntry::Integer(value) => Constant::Int(*value),
            PoolEntry::Float(value) => Constant::Float(*value),
            PoolEntry::Long(value) => Constant::Long(*value),
            PoolEntry::Double(value) => Constant::Double(*value),
            PoolEntry::String(value) => Constant::String(self.utf8(*value)?.to_string()),
            PoolEntry::Class(name) => Constant::Class(self.utf8(*name)?.to_string()),
            PoolEntry::MethodType(desc) => Constant::MethodType(self.utf8(*desc)?.to_string()),
            PoolEntry::MethodHandle { kind, reference } => {
                let reference = match self.get(*reference)? {
                    PoolEntry::FieldRef {
                        class,
                        name_and_type,
                    }
                    | PoolEntry::MethodRef {
                        class,
                        name_and_type,
                    }
                    | PoolEntry::InterfaceMethodRef {
                        class,
                        name_and_type,
                    } => self.member(*class, *name_and_type)?,
                    other => {
                        return Err(malformed_error!(
                            "MethodHandle {} references {:?}",
                            index,
                            other
                        ))
                    }
                };
                Constant::MethodHandle {
                    kind: *kind,
                    reference,
                }
            }
            PoolEntry::Dynamic { name_and_type, .. } => {
                let (name, desc) = self.name_and_type(*name_and_type)?;
                Constant::Dynamic {
                    name: name.to_string(),
                    desc: desc.to_string(),
                }
            }
            other => {
                return Err(malformed_error!(
                    "Entry {} is not loadable: {:?}",
                    index,
                    other
                ))
            }
        })
    }
}
