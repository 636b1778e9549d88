//! Assembles classfile bytes for tests.
//!
//! [`ClassBuilder`] writes genuine classfiles (deduplicated constant pool, `Code` with
//! `LineNumberTable` and `LocalVariableTable`, `ConstantValue`, `Signature`, `Record`) so the
//! parser, program model and matcher are exercised over real binary input. It only depends
//! on `std`, which lets integration tests and benches include it by path.
#![allow(dead_code)]

use std::collections::HashMap;

/// One bytecode instruction to assemble.
///
/// Loads and stores pick the compact, plain or `wide` encoding from the slot; [`Op::Iconst`]
/// picks `iconst_<n>`, `bipush`, `sipush` or `ldc` from the value.
#[derive(Debug, Clone, Copy)]
pub enum Op<'a> {
    /// Any instruction without operands, by opcode
    Insn(u8),
    Nop,
    Pop,
    Dup,
    Iadd,
    Return,
    Ireturn,
    Areturn,
    Athrow,
    Iload(u16),
    Lload(u16),
    Aload(u16),
    Istore(u16),
    Astore(u16),
    Iinc(u16, i16),
    Iconst(i32),
    Ldc(&'a str),
    LdcInt(i32),
    LdcLong(i64),
    LdcFloat(f32),
    LdcDouble(f64),
    LdcClass(&'a str),
    New(&'a str),
    CheckCast(&'a str),
    InstanceOf(&'a str),
    ANewArray(&'a str),
    NewArray(u8),
    GetStatic(&'a str, &'a str, &'a str),
    PutStatic(&'a str, &'a str, &'a str),
    GetField(&'a str, &'a str, &'a str),
    PutField(&'a str, &'a str, &'a str),
    InvokeVirtual(&'a str, &'a str, &'a str),
    InvokeSpecial(&'a str, &'a str, &'a str),
    InvokeStatic(&'a str, &'a str, &'a str),
    InvokeInterface(&'a str, &'a str, &'a str),
    /// Branch by opcode with a relative offset
    Jump(u8, i16),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Entry {
    Utf8(String),
    Int(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    String(u16),
    Field(u16, u16),
    Method(u16, u16),
    InterfaceMethod(u16, u16),
    NameAndType(u16, u16),
}

#[derive(Default)]
struct Pool {
    bytes: Vec<u8>,
    next: u16,
    index: HashMap<Entry, u16>,
}

impl Pool {
    fn new() -> Self {
        Pool {
            bytes: Vec::new(),
            next: 1,
            index: HashMap::new(),
        }
    }

    fn add(&mut self, entry: Entry) -> u16 {
        if let Some(index) = self.index.get(&entry) {
            return *index;
        }
        let index = self.next;
        let out = &mut self.bytes;
        let wide = match &entry {
            Entry::Utf8(value) => {
                out.push(1);
                out.extend_from_slice(&(value.len() as u16).to_be_bytes());
                out.extend_from_slice(value.as_bytes());
                false
            }
            Entry::Int(value) => {
                out.push(3);
                out.extend_from_slice(&value.to_be_bytes());
                false
            }
            Entry::Float(bits) => {
                out.push(4);
                out.extend_from_slice(&bits.to_be_bytes());
                false
            }
            Entry::Long(value) => {
                out.push(5);
                out.extend_from_slice(&value.to_be_bytes());
                true
            }
            Entry::Double(bits) => {
                out.push(6);
                out.extend_from_slice(&bits.to_be_bytes());
                true
            }
            Entry::Class(name) | Entry::String(name) => {
                out.push(if matches!(entry, Entry::Class(_)) { 7 } else { 8 });
                out.extend_from_slice(&name.to_be_bytes());
                false
            }
            Entry::Field(a, b)
            | Entry::Method(a, b)
            | Entry::InterfaceMethod(a, b)
            | Entry::NameAndType(a, b) => {
                out.push(match entry {
                    Entry::Field(..) => 9,
                    Entry::Method(..) => 10,
                    Entry::InterfaceMethod(..) => 11,
                    _ => 12,
                });
                out.extend_from_slice(&a.to_be_bytes());
                out.extend_from_slice(&b.to_be_bytes());
                false
            }
        };
        self.next += if wide { 2 } else { 1 };
        self.index.insert(entry, index);
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        self.add(Entry::Utf8(value.to_string()))
    }

    fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.add(Entry::Class(name))
    }

    fn string(&mut self, value: &str) -> u16 {
        let value = self.utf8(value);
        self.add(Entry::String(value))
    }

    fn member(&mut self, kind: u8, owner: &str, name: &str, desc: &str) -> u16 {
        let class = self.class(owner);
        let name = self.utf8(name);
        let desc = self.utf8(desc);
        let nat = self.add(Entry::NameAndType(name, desc));
        self.add(match kind {
            9 => Entry::Field(class, nat),
            10 => Entry::Method(class, nat),
            _ => Entry::InterfaceMethod(class, nat),
        })
    }
}

fn u16_be(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn u32_be(out: &mut Vec<u8>, value: usize) {
    out.extend_from_slice(&(value as u32).to_be_bytes());
}

fn attribute(out: &mut Vec<u8>, pool: &mut Pool, name: &str, body: &[u8]) {
    let name = pool.utf8(name);
    u16_be(out, name);
    u32_be(out, body.len());
    out.extend_from_slice(body);
}

/// Field declaration under construction.
#[derive(Debug, Clone)]
pub struct FieldBuilder<'a> {
    access: u16,
    name: &'a str,
    desc: &'a str,
    signature: Option<&'a str>,
    constant: Option<Constant<'a>>,
}

#[derive(Debug, Clone, Copy)]
enum Constant<'a> {
    Int(i32),
    Long(i64),
    Str(&'a str),
}

impl<'a> FieldBuilder<'a> {
    pub fn constant_int(mut self, value: i32) -> Self {
        self.constant = Some(Constant::Int(value));
        self
    }

    pub fn constant_long(mut self, value: i64) -> Self {
        self.constant = Some(Constant::Long(value));
        self
    }

    pub fn constant_string(mut self, value: &'a str) -> Self {
        self.constant = Some(Constant::Str(value));
        self
    }

    pub fn signature(mut self, signature: &'a str) -> Self {
        self.signature = Some(signature);
        self
    }
}

/// Method declaration under construction.
#[derive(Debug, Clone)]
pub struct MethodBuilder<'a> {
    access: u16,
    name: &'a str,
    desc: &'a str,
    signature: Option<&'a str>,
    code: Option<Vec<Op<'a>>>,
    lines: Vec<(u16, u16)>,
    locals: Vec<(u16, &'a str, &'a str, Option<(u16, u16)>)>,
}

impl<'a> MethodBuilder<'a> {
    /// Give the method a `Code` attribute.
    pub fn code(mut self, ops: &[Op<'a>]) -> Self {
        self.code = Some(ops.to_vec());
        self
    }

    /// Add a `LineNumberTable` entry.
    pub fn line(mut self, pc: u16, line: u16) -> Self {
        self.lines.push((pc, line));
        self
    }

    /// Add a `LocalVariableTable` entry live over the whole method.
    pub fn local(mut self, slot: u16, name: &'a str, desc: &'a str) -> Self {
        self.locals.push((slot, name, desc, None));
        self
    }

    /// Add a `LocalVariableTable` entry with an explicit live range.
    pub fn local_range(
        mut self,
        slot: u16,
        name: &'a str,
        desc: &'a str,
        start: u16,
        length: u16,
    ) -> Self {
        self.locals.push((slot, name, desc, Some((start, length))));
        self
    }

    pub fn signature(mut self, signature: &'a str) -> Self {
        self.signature = Some(signature);
        self
    }

    fn encode_code(ops: &[Op<'a>], pool: &mut Pool) -> Vec<u8> {
        let mut out = Vec::new();
        for op in ops {
            match *op {
                Op::Insn(opcode) => out.push(opcode),
                Op::Nop => out.push(0x00),
                Op::Pop => out.push(0x57),
                Op::Dup => out.push(0x59),
                Op::Iadd => out.push(0x60),
                Op::Return => out.push(0xB1),
                Op::Ireturn => out.push(0xAC),
                Op::Areturn => out.push(0xB0),
                Op::Athrow => out.push(0xBF),
                Op::Iload(slot) => var(&mut out, 0x15, 0x1A, slot),
                Op::Lload(slot) => var(&mut out, 0x16, 0x1E, slot),
                Op::Aload(slot) => var(&mut out, 0x19, 0x2A, slot),
                Op::Istore(slot) => var(&mut out, 0x36, 0x3B, slot),
                Op::Astore(slot) => var(&mut out, 0x3A, 0x4B, slot),
                Op::Iinc(slot, delta) => {
                    if let (Ok(slot), Ok(delta)) = (u8::try_from(slot), i8::try_from(delta)) {
                        out.extend_from_slice(&[0x84, slot, delta as u8]);
                    } else {
                        out.extend_from_slice(&[0xC4, 0x84]);
                        u16_be(&mut out, slot);
                        out.extend_from_slice(&delta.to_be_bytes());
                    }
                }
                Op::Iconst(value) => match value {
                    -1..=5 => out.push((0x03 + value) as u8),
                    -128..=127 => out.extend_from_slice(&[0x10, value as i8 as u8]),
                    -32768..=32767 => {
                        out.push(0x11);
                        out.extend_from_slice(&(value as i16).to_be_bytes());
                    }
                    _ => {
                        let index = pool.add(Entry::Int(value));
                        ldc(&mut out, index);
                    }
                },
                Op::Ldc(value) => {
                    let index = pool.string(value);
                    ldc(&mut out, index);
                }
                Op::LdcInt(value) => {
                    let index = pool.add(Entry::Int(value));
                    ldc(&mut out, index);
                }
                Op::LdcFloat(value) => {
                    let index = pool.add(Entry::Float(value.to_bits()));
                    ldc(&mut out, index);
                }
                Op::LdcClass(name) => {
                    let index = pool.class(name);
                    ldc(&mut out, index);
                }
                Op::LdcLong(value) => {
                    out.push(0x14);
                    let index = pool.add(Entry::Long(value));
                    u16_be(&mut out, index);
                }
                Op::LdcDouble(value) => {
                    out.push(0x14);
                    let index = pool.add(Entry::Double(value.to_bits()));
                    u16_be(&mut out, index);
                }
                Op::New(name) => class_op(&mut out, pool, 0xBB, name),
                Op::ANewArray(name) => class_op(&mut out, pool, 0xBD, name),
                Op::CheckCast(name) => class_op(&mut out, pool, 0xC0, name),
                Op::InstanceOf(name) => class_op(&mut out, pool, 0xC1, name),
                Op::NewArray(atype) => out.extend_from_slice(&[0xBC, atype]),
                Op::GetStatic(o, n, d) => member_op(&mut out, pool, 0xB2, 9, o, n, d),
                Op::PutStatic(o, n, d) => member_op(&mut out, pool, 0xB3, 9, o, n, d),
                Op::GetField(o, n, d) => member_op(&mut out, pool, 0xB4, 9, o, n, d),
                Op::PutField(o, n, d) => member_op(&mut out, pool, 0xB5, 9, o, n, d),
                Op::InvokeVirtual(o, n, d) => member_op(&mut out, pool, 0xB6, 10, o, n, d),
                Op::InvokeSpecial(o, n, d) => member_op(&mut out, pool, 0xB7, 10, o, n, d),
                Op::InvokeStatic(o, n, d) => member_op(&mut out, pool, 0xB8, 10, o, n, d),
                Op::InvokeInterface(o, n, d) => {
                    member_op(&mut out, pool, 0xB9, 11, o, n, d);
                    out.extend_from_slice(&[1, 0]);
                }
                Op::Jump(opcode, rel) => {
                    out.push(opcode);
                    out.extend_from_slice(&rel.to_be_bytes());
                }
            }
        }
        out
    }

    fn encode(&self, pool: &mut Pool, out: &mut Vec<u8>) {
        u16_be(out, self.access);
        let name = pool.utf8(self.name);
        u16_be(out, name);
        let desc = pool.utf8(self.desc);
        u16_be(out, desc);

        let mut attrs = Vec::new();
        let mut count = 0u16;
        if let Some(ops) = &self.code {
            let code = Self::encode_code(ops, pool);

            let mut body = Vec::new();
            u16_be(&mut body, 16);
            u16_be(&mut body, 64);
            u32_be(&mut body, code.len());
            body.extend_from_slice(&code);
            u16_be(&mut body, 0);

            let mut nested = Vec::new();
            let mut nested_count = 0u16;
            if !self.lines.is_empty() {
                let mut table = Vec::new();
                u16_be(&mut table, self.lines.len() as u16);
                for (pc, line) in &self.lines {
                    u16_be(&mut table, *pc);
                    u16_be(&mut table, *line);
                }
                attribute(&mut nested, pool, "LineNumberTable", &table);
                nested_count += 1;
            }
            if !self.locals.is_empty() {
                let mut table = Vec::new();
                u16_be(&mut table, self.locals.len() as u16);
                for (slot, name, desc, range) in &self.locals {
                    let (start, length) = range.unwrap_or((0, code.len() as u16));
                    u16_be(&mut table, start);
                    u16_be(&mut table, length);
                    let name = pool.utf8(name);
                    u16_be(&mut table, name);
                    let desc = pool.utf8(desc);
                    u16_be(&mut table, desc);
                    u16_be(&mut table, *slot);
                }
                attribute(&mut nested, pool, "LocalVariableTable", &table);
                nested_count += 1;
            }
            u16_be(&mut body, nested_count);
            body.extend_from_slice(&nested);

            attribute(&mut attrs, pool, "Code", &body);
            count += 1;
        }
        if let Some(signature) = self.signature {
            let index = pool.utf8(signature);
            attribute(&mut attrs, pool, "Signature", &index.to_be_bytes());
            count += 1;
        }
        u16_be(out, count);
        out.extend_from_slice(&attrs);
    }
}

fn var(out: &mut Vec<u8>, plain: u8, compact: u8, slot: u16) {
    match slot {
        0..=3 => out.push(compact + slot as u8),
        4..=255 => out.extend_from_slice(&[plain, slot as u8]),
        _ => {
            out.extend_from_slice(&[0xC4, plain]);
            u16_be(out, slot);
        }
    }
}

fn ldc(out: &mut Vec<u8>, index: u16) {
    if let Ok(index) = u8::try_from(index) {
        out.extend_from_slice(&[0x12, index]);
    } else {
        out.push(0x13);
        u16_be(out, index);
    }
}

fn class_op(out: &mut Vec<u8>, pool: &mut Pool, opcode: u8, name: &str) {
    out.push(opcode);
    let index = pool.class(name);
    u16_be(out, index);
}

fn member_op(
    out: &mut Vec<u8>,
    pool: &mut Pool,
    opcode: u8,
    kind: u8,
    owner: &str,
    name: &str,
    desc: &str,
) {
    out.push(opcode);
    let index = pool.member(kind, owner, name, desc);
    u16_be(out, index);
}

/// Classfile under construction. Defaults to a public class extending `java/lang/Object`.
#[derive(Debug, Clone)]
pub struct ClassBuilder<'a> {
    access: u16,
    name: &'a str,
    super_name: Option<&'a str>,
    interfaces: Vec<&'a str>,
    signature: Option<&'a str>,
    record: bool,
    fields: Vec<FieldBuilder<'a>>,
    methods: Vec<MethodBuilder<'a>>,
}

impl<'a> ClassBuilder<'a> {
    pub fn new(name: &'a str) -> Self {
        ClassBuilder {
            access: 0x0021,
            name,
            super_name: Some("java/lang/Object"),
            interfaces: Vec::new(),
            signature: None,
            record: false,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn super_name(mut self, name: &'a str) -> Self {
        self.super_name = Some(name);
        self
    }

    pub fn no_super(mut self) -> Self {
        self.super_name = None;
        self
    }

    pub fn interface(mut self, name: &'a str) -> Self {
        self.interfaces.push(name);
        self
    }

    pub fn signature(mut self, signature: &'a str) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Attach an empty `Record` attribute.
    pub fn record(mut self) -> Self {
        self.record = true;
        self
    }

    pub fn field(
        mut self,
        access: u16,
        name: &'a str,
        desc: &'a str,
        f: impl FnOnce(FieldBuilder<'a>) -> FieldBuilder<'a>,
    ) -> Self {
        self.fields.push(f(FieldBuilder {
            access,
            name,
            desc,
            signature: None,
            constant: None,
        }));
        self
    }

    pub fn method(
        mut self,
        access: u16,
        name: &'a str,
        desc: &'a str,
        f: impl FnOnce(MethodBuilder<'a>) -> MethodBuilder<'a>,
    ) -> Self {
        self.methods.push(f(MethodBuilder {
            access,
            name,
            desc,
            signature: None,
            code: None,
            lines: Vec::new(),
            locals: Vec::new(),
        }));
        self
    }

    /// Serialize the classfile.
    pub fn build(&self) -> Vec<u8> {
        let mut pool = Pool::new();
        let mut body = Vec::new();

        u16_be(&mut body, self.access);
        let this = pool.class(self.name);
        u16_be(&mut body, this);
        let super_index = self.super_name.map_or(0, |name| pool.class(name));
        u16_be(&mut body, super_index);
        u16_be(&mut body, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            let index = pool.class(interface);
            u16_be(&mut body, index);
        }

        u16_be(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            u16_be(&mut body, field.access);
            let name = pool.utf8(field.name);
            u16_be(&mut body, name);
            let desc = pool.utf8(field.desc);
            u16_be(&mut body, desc);

            let mut attrs = Vec::new();
            let mut count = 0u16;
            if let Some(constant) = field.constant {
                let index = match constant {
                    Constant::Int(value) => pool.add(Entry::Int(value)),
                    Constant::Long(value) => pool.add(Entry::Long(value)),
                    Constant::Str(value) => pool.string(value),
                };
                attribute(&mut attrs, &mut pool, "ConstantValue", &index.to_be_bytes());
                count += 1;
            }
            if let Some(signature) = field.signature {
                let index = pool.utf8(signature);
                attribute(&mut attrs, &mut pool, "Signature", &index.to_be_bytes());
                count += 1;
            }
            u16_be(&mut body, count);
            body.extend_from_slice(&attrs);
        }

        u16_be(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            method.encode(&mut pool, &mut body);
        }

        let mut attrs = Vec::new();
        let mut count = 0u16;
        if let Some(signature) = self.signature {
            let index = pool.utf8(signature);
            attribute(&mut attrs, &mut pool, "Signature", &index.to_be_bytes());
            count += 1;
        }
        if self.record {
            attribute(&mut attrs, &mut pool, "Record", &[0, 0]);
            count += 1;
        }
        u16_be(&mut body, count);
        body.extend_from_slice(&attrs);

        let mut out = Vec::with_capacity(10 + pool.bytes.len() + body.len());
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        u16_be(&mut out, 0);
        u16_be(&mut out, 52);
        u16_be(&mut out, pool.next);
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&body);
        out
    }
}
