//! Field and method descriptors (JVMS §4.3).
//!
//! A field descriptor such as `[[Ljava/lang/String;` parses to a [`Type`]; a method
//! descriptor such as `(IJ[B)Lfoo/Bar;` parses to a [`MethodDescriptor`]. Descriptors are the
//! shape half of structural compatibility: two members can only correspond if their
//! descriptors have the same sorts, array depths and argument counts.

use std::fmt;

use strum::Display;

use crate::Result;

/// The sort of a [`Type`], mirroring the distinctions the JVM makes between values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Sort {
    /// `V`, only valid as a return type
    Void,
    /// `Z`
    Boolean,
    /// `C`
    Char,
    /// `B`
    Byte,
    /// `S`
    Short,
    /// `I`
    Int,
    /// `F`
    Float,
    /// `J`
    Long,
    /// `D`
    Double,
    /// `L<name>;`
    Object,
    /// `[<component>`
    Array,
}

/// A parsed field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// A primitive or `void`; the sort is never [`Sort::Object`] or [`Sort::Array`]
    Primitive(Sort),
    /// A class or interface type, by internal name (`java/lang/String`)
    Object(String),
    /// An array of `dimensions` levels over a non-array element type
    Array {
        /// Number of `[` prefixes, at least 1
        dimensions: u8,
        /// The innermost component
        element: Box<Type>,
    },
}

impl Type {
    /// Parse a complete field descriptor.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `desc` is not exactly one field type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use remapper::classfile::{Sort, Type};
    ///
    /// let ty = Type::parse("[[Ljava/lang/String;")?;
    /// assert_eq!(ty.sort(), Sort::Array);
    /// assert_eq!(ty.dimensions(), 2);
    /// assert_eq!(ty.element().internal_name(), Some("java/lang/String"));
    /// # Ok::<(), remapper::Error>(())
    /// ```
    pub fn parse(desc: &str) -> Result<Type> {
        let (ty, rest) = Self::parse_prefix(desc)?;
        if !rest.is_empty() || ty == Type::Primitive(Sort::Void) {
            return Err(malformed_error!("Invalid field descriptor - {}", desc));
        }
        Ok(ty)
    }

    /// Parse one type from the front of `desc`, returning it and the unparsed remainder.
    fn parse_prefix(desc: &str) -> Result<(Type, &str)> {
        let mut dimensions: usize = 0;
        let bytes = desc.as_bytes();
        while bytes.get(dimensions) == Some(&b'[') {
            dimensions += 1;
        }
        let rest = &desc[dimensions..];

        let (element, rest) = match rest.as_bytes().first() {
            Some(b'L') => {
                let Some(end) = rest.find(';') else {
                    return Err(malformed_error!("Unterminated object type - {}", desc));
                };
                if end == 1 {
                    return Err(malformed_error!("Empty object type - {}", desc));
                }
                (Type::Object(rest[1..end].to_string()), &rest[end + 1..])
            }
            Some(c) => {
                let sort = match c {
                    b'V' => Sort::Void,
                    b'Z' => Sort::Boolean,
                    b'C' => Sort::Char,
                    b'B' => Sort::Byte,
                    b'S' => Sort::Short,
                    b'I' => Sort::Int,
                    b'F' => Sort::Float,
                    b'J' => Sort::Long,
                    b'D' => Sort::Double,
                    _ => return Err(malformed_error!("Invalid type character in {}", desc)),
                };
                (Type::Primitive(sort), &rest[1..])
            }
            None => return Err(malformed_error!("Truncated descriptor - {}", desc)),
        };

        if dimensions == 0 {
            return Ok((element, rest));
        }
        if element == Type::Primitive(Sort::Void) {
            return Err(malformed_error!("Array of void - {}", desc));
        }
        let Ok(dimensions) = u8::try_from(dimensions) else {
            return Err(malformed_error!("Too many array dimensions - {}", desc));
        };
        Ok((
            Type::Array {
                dimensions,
                element: Box::new(element),
            },
            rest,
        ))
    }

    /// The sort of this type.
    #[must_use]
    pub fn sort(&self) -> Sort {
        match self {
            Type::Primitive(sort) => *sort,
            Type::Object(_) => Sort::Object,
            Type::Array { .. } => Sort::Array,
        }
    }

    /// Number of array dimensions, 0 for non-array types.
    #[must_use]
    pub fn dimensions(&self) -> u8 {
        match self {
            Type::Array { dimensions, .. } => *dimensions,
            _ => 0,
        }
    }

    /// The innermost element type of an array, or the type itself.
    #[must_use]
    pub fn element(&self) -> &Type {
        match self {
            Type::Array { element, .. } => element,
            other => other,
        }
    }

    /// The internal class name of an object type.
    #[must_use]
    pub fn internal_name(&self) -> Option<&str> {
        match self {
            Type::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Number of local variable slots a value of this type occupies.
    #[must_use]
    pub fn size(&self) -> u16 {
        match self {
            Type::Primitive(Sort::Long | Sort::Double) => 2,
            Type::Primitive(Sort::Void) => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(sort) => {
                let c = match sort {
                    Sort::Void => 'V',
                    Sort::Boolean => 'Z',
                    Sort::Char => 'C',
                    Sort::Byte => 'B',
                    Sort::Short => 'S',
                    Sort::Int => 'I',
                    Sort::Float => 'F',
                    Sort::Long => 'J',
                    Sort::Double => 'D',
                    Sort::Object | Sort::Array => unreachable!("not a primitive sort"),
                };
                write!(f, "{c}")
            }
            Type::Object(name) => write!(f, "L{name};"),
            Type::Array {
                dimensions,
                element,
            } => {
                for _ in 0..*dimensions {
                    write!(f, "[")?;
                }
                write!(f, "{element}")
            }
        }
    }
}

/// A parsed method descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Argument types in declaration order
    pub args: Vec<Type>,
    /// Return type, possibly `void`
    pub ret: Type,
}

impl MethodDescriptor {
    /// Parse a method descriptor.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for anything that is not `(<args>)<return>`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use remapper::classfile::{MethodDescriptor, Sort};
    ///
    /// let desc = MethodDescriptor::parse("(IJ[Ljava/lang/Object;)V")?;
    /// assert_eq!(desc.args.len(), 3);
    /// assert_eq!(desc.ret.sort(), Sort::Void);
    /// assert_eq!(desc.arg_slots(), 4);
    /// # Ok::<(), remapper::Error>(())
    /// ```
    pub fn parse(desc: &str) -> Result<MethodDescriptor> {
        let Some(mut rest) = desc.strip_prefix('(') else {
            return Err(malformed_error!("Method descriptor without '(' - {}", desc));
        };

        let mut args = Vec::new();
        loop {
            match rest.as_bytes().first() {
                Some(b')') => {
                    rest = &rest[1..];
                    break;
                }
                Some(_) => {
                    let (arg, tail) = Type::parse_prefix(rest)?;
                    if arg == Type::Primitive(Sort::Void) {
                        return Err(malformed_error!("Void argument - {}", desc));
                    }
                    args.push(arg);
                    rest = tail;
                }
                None => return Err(malformed_error!("Unterminated argument list - {}", desc)),
            }
        }

        let (ret, tail) = Type::parse_prefix(rest)?;
        if !tail.is_empty() {
            return Err(malformed_error!("Trailing data in descriptor - {}", desc));
        }

        Ok(MethodDescriptor { args, ret })
    }

    /// Total local variable slots taken by the arguments, excluding `this`.
    #[must_use]
    pub fn arg_slots(&self) -> u16 {
        self.args.iter().map(Type::size).sum()
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for arg in &self.args {
            write!(f, "{arg}")?;
        }
        write!(f, "){}", self.ret)
    }
}
