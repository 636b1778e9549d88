//! Class, method and field entities of a [`crate::program::Program`].
//!
//! Declared data (names, descriptors, flags, bytecode) is filled in at load time. Everything
//! under a "derived" heading is owned by [`crate::program::Program::build`]: it is cleared by
//! `reset()` and recomputed from scratch on every build.

use std::{cmp::Ordering, collections::BTreeSet, fmt};

use crate::{
    classfile::{
        ClassAccessFlags, Code, Constant, FieldAccessFlags, MethodAccessFlags, MethodDescriptor,
        Type,
    },
    program::{ClassId, FieldId, MethodId},
};

/// A numeric literal found in bytecode or a `ConstantValue` attribute.
///
/// Floating point values are held by bit pattern so literals are totally ordered and hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Number {
    /// `int` and the narrower integral types
    Int(i32),
    /// `long`
    Long(i64),
    /// `float` bits
    Float(u32),
    /// `double` bits
    Double(u64),
}

impl Number {
    /// Build a `float` literal.
    #[must_use]
    pub fn float(value: f32) -> Self {
        Number::Float(value.to_bits())
    }

    /// Build a `double` literal.
    #[must_use]
    pub fn double(value: f64) -> Self {
        Number::Double(value.to_bits())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Long(v) => write!(f, "{v}L"),
            Number::Float(bits) => write!(f, "{}F", f32::from_bits(*bits)),
            Number::Double(bits) => write!(f, "{}D", f64::from_bits(*bits)),
        }
    }
}

/// The compile-time initial value of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstValue {
    /// A numeric constant
    Number(Number),
    /// A string constant
    String(String),
}

impl ConstValue {
    pub(crate) fn from_constant(constant: &Constant) -> Option<ConstValue> {
        Some(match constant {
            Constant::Int(v) => ConstValue::Number(Number::Int(*v)),
            Constant::Long(v) => ConstValue::Number(Number::Long(*v)),
            Constant::Float(v) => ConstValue::Number(Number::float(*v)),
            Constant::Double(v) => ConstValue::Number(Number::double(*v)),
            Constant::String(s) => ConstValue::String(s.clone()),
            _ => return None,
        })
    }
}

/// An argument or local variable of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    /// `true` for a descriptor argument
    pub is_arg: bool,
    /// Position among the method's arguments, or among its locals
    pub index: usize,
    /// Local variable slot
    pub lv_index: u16,
    /// Declared type
    pub ty: Type,
    /// First bytecode offset of the live range
    pub start_pc: u32,
    /// End (exclusive) of the live range
    pub end_pc: u32,
    /// Debug name, or a synthesized `argN` / `varN`
    pub name: String,
}

/// Operand of a [`BodyInsn`], with program references resolved to handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOperand {
    /// Nothing that takes part in comparison
    None,
    /// `bipush` / `sipush` immediate or `newarray` type code
    Int(i32),
    /// Local variable slot
    Var(u16),
    /// Type operand, `None` when the class is outside the program
    Class(Option<ClassId>),
    /// Field operand, `None` when unresolved
    Field(Option<FieldId>),
    /// Method operand, `None` when unresolved
    Method(Option<MethodId>),
}

/// One instruction of a method body as seen by code comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyInsn {
    /// Normalized opcode
    pub opcode: u8,
    /// Resolved operand
    pub operand: BodyOperand,
}

/// A class declaration.
#[derive(Debug, Clone)]
pub struct ClassEntity {
    /// Own handle
    pub id: ClassId,
    /// Internal name
    pub name: String,
    /// Access flags
    pub access: ClassAccessFlags,
    /// Declared superclass name
    pub super_name: Option<String>,
    /// Declared interface names
    pub interface_names: Vec<String>,
    /// Generic signature
    pub signature: Option<String>,
    /// Excluded from matching, still resolvable
    pub ignored: bool,
    /// Methods in declaration order
    pub methods: Vec<MethodId>,
    /// Fields in declaration order
    pub fields: Vec<FieldId>,

    // derived: hierarchy
    /// Superclass, when it is part of the program
    pub parent: Option<ClassId>,
    /// Direct superinterfaces that are part of the program, in declaration order
    pub interfaces: Vec<ClassId>,
    /// Classes whose parent is this class
    pub children: BTreeSet<ClassId>,
    /// Classes that directly implement this interface
    pub implementers: BTreeSet<ClassId>,
    /// Transitive closure of parent and interfaces
    pub super_classes: BTreeSet<ClassId>,
    /// Transitive closure of children and implementers
    pub sub_classes: BTreeSet<ClassId>,
    /// `super_classes` and `sub_classes` plus this class
    pub hierarchy: BTreeSet<ClassId>,
    /// Length of the parent chain within the program
    pub depth: usize,

    // derived: references
    /// Methods that use this class in a descriptor or operand
    pub method_type_refs: BTreeSet<MethodId>,
    /// Fields declared with this class as their type
    pub field_type_refs: BTreeSet<FieldId>,
    /// String constants of the class's fields and methods
    pub strings: BTreeSet<String>,
    /// Numeric constants of the class's fields and methods
    pub numbers: BTreeSet<Number>,
    /// Owners of `method_type_refs` and `field_type_refs`
    pub ref_classes_in: BTreeSet<ClassId>,
    /// Classes referenced by the methods and field types of this class
    pub ref_classes_out: BTreeSet<ClassId>,
    /// Callers of any method of this class
    pub method_refs_in: BTreeSet<MethodId>,
    /// Callees of any method of this class
    pub method_refs_out: BTreeSet<MethodId>,
    /// Fields read by any method of this class
    pub field_reads: BTreeSet<FieldId>,
    /// Fields written by any method of this class
    pub field_writes: BTreeSet<FieldId>,
}

impl ClassEntity {
    pub(crate) fn new(id: ClassId, name: String, access: ClassAccessFlags) -> Self {
        ClassEntity {
            id,
            name,
            access,
            super_name: None,
            interface_names: Vec::new(),
            signature: None,
            ignored: false,
            methods: Vec::new(),
            fields: Vec::new(),
            parent: None,
            interfaces: Vec::new(),
            children: BTreeSet::new(),
            implementers: BTreeSet::new(),
            super_classes: BTreeSet::new(),
            sub_classes: BTreeSet::new(),
            hierarchy: BTreeSet::new(),
            depth: 0,
            method_type_refs: BTreeSet::new(),
            field_type_refs: BTreeSet::new(),
            strings: BTreeSet::new(),
            numbers: BTreeSet::new(),
            ref_classes_in: BTreeSet::new(),
            ref_classes_out: BTreeSet::new(),
            method_refs_in: BTreeSet::new(),
            method_refs_out: BTreeSet::new(),
            field_reads: BTreeSet::new(),
            field_writes: BTreeSet::new(),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.parent = None;
        self.interfaces.clear();
        self.children.clear();
        self.implementers.clear();
        self.super_classes.clear();
        self.sub_classes.clear();
        self.hierarchy.clear();
        self.depth = 0;
        self.method_type_refs.clear();
        self.field_type_refs.clear();
        self.strings.clear();
        self.numbers.clear();
        self.ref_classes_in.clear();
        self.ref_classes_out.clear();
        self.method_refs_in.clear();
        self.method_refs_out.clear();
        self.field_reads.clear();
        self.field_writes.clear();
    }

    /// The name after the last package separator.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Returns `true` for interfaces.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access.contains(ClassAccessFlags::INTERFACE)
    }
}

/// A method declaration.
#[derive(Debug, Clone)]
pub struct MethodEntity {
    /// Own handle
    pub id: MethodId,
    /// Declaring class
    pub owner: ClassId,
    /// Method name
    pub name: String,
    /// Raw descriptor
    pub desc: String,
    /// Parsed descriptor
    pub descriptor: MethodDescriptor,
    /// Access flags
    pub access: MethodAccessFlags,
    /// Generic signature
    pub signature: Option<String>,
    /// Position within the owner's method list
    pub index: usize,
    /// Decoded code attribute; `None` for abstract and native methods
    pub code: Option<Code>,

    // derived
    /// Program class of each argument type, `None` for primitives and external classes
    pub arg_classes: Vec<Option<ClassId>>,
    /// Program class of the return type
    pub return_class: Option<ClassId>,
    /// Instruction stream with resolved operands
    pub body: Vec<BodyInsn>,
    /// Descriptor arguments
    pub args: Vec<LocalVariable>,
    /// Non-argument locals
    pub locals: Vec<LocalVariable>,
    /// Methods calling this method
    pub refs_in: BTreeSet<MethodId>,
    /// Methods called by this method
    pub refs_out: BTreeSet<MethodId>,
    /// Fields read
    pub field_reads: BTreeSet<FieldId>,
    /// Fields written
    pub field_writes: BTreeSet<FieldId>,
    /// Classes touched by descriptor types, type operands and member owners
    pub class_refs: BTreeSet<ClassId>,
    /// Non-blank string literals
    pub strings: BTreeSet<String>,
    /// Numeric literals
    pub numbers: BTreeSet<Number>,
    /// Inclusive source line range
    pub line_range: Option<(u16, u16)>,
    /// Same name and descriptor in the owner's super- and subclasses
    pub hierarchy: BTreeSet<MethodId>,
}

impl MethodEntity {
    pub(crate) fn reset(&mut self) {
        self.arg_classes.clear();
        self.return_class = None;
        self.body.clear();
        self.args.clear();
        self.locals.clear();
        self.refs_in.clear();
        self.refs_out.clear();
        self.field_reads.clear();
        self.field_writes.clear();
        self.class_refs.clear();
        self.strings.clear();
        self.numbers.clear();
        self.line_range = None;
        self.hierarchy.clear();
    }

    /// Returns `true` for static methods.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(MethodAccessFlags::STATIC)
    }
}

/// A field declaration.
#[derive(Debug, Clone)]
pub struct FieldEntity {
    /// Own handle
    pub id: FieldId,
    /// Declaring class
    pub owner: ClassId,
    /// Field name
    pub name: String,
    /// Raw descriptor
    pub desc: String,
    /// Parsed descriptor
    pub ty: Type,
    /// Access flags
    pub access: FieldAccessFlags,
    /// Generic signature
    pub signature: Option<String>,
    /// Position within the owner's field list
    pub index: usize,
    /// `ConstantValue` initializer
    pub value: Option<ConstValue>,

    // derived
    /// Program class of the field type
    pub type_class: Option<ClassId>,
    /// Methods reading this field
    pub read_refs: BTreeSet<MethodId>,
    /// Methods writing this field
    pub write_refs: BTreeSet<MethodId>,
    /// Same name and descriptor in the owner's super- and subclasses
    pub hierarchy: BTreeSet<FieldId>,
    /// Order of the first `putstatic` to this field in the owner's `<clinit>`
    pub initializer_index: Option<usize>,
}

impl FieldEntity {
    pub(crate) fn reset(&mut self) {
        self.type_class = None;
        self.read_refs.clear();
        self.write_refs.clear();
        self.hierarchy.clear();
        self.initializer_index = None;
    }

    /// Returns `true` for static fields.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(FieldAccessFlags::STATIC)
    }
}

/// Declaration order used when listing the members of a class: statics first, then by index.
pub(crate) fn member_order(a_static: bool, a_index: usize, b_static: bool, b_index: usize) -> Ordering {
    b_static.cmp(&a_static).then(a_index.cmp(&b_index))
}
