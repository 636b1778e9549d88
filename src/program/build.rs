//! Derivation of the cross reference graph.
//!
//! [`Program::build`] runs three passes over the declared data:
//!
//! 1. **Hierarchy** - link superclasses and interfaces by name, with mutual `children` and
//!    `implementers` back references, then close them transitively.
//! 2. **Declarations** - arguments and locals from the debug tables (or synthesized
//!    `argN` / `varN`), descriptor type references, and same-signature member families.
//! 3. **Bodies** - every method body is scanned in parallel for calls, field accesses, type
//!    operands and constants; the results are applied to the graph sequentially.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::{
    classfile::{opcodes, Constant, Operand, Type},
    program::{
        BodyInsn, BodyOperand, ClassEntity, ClassId, ConstValue, FieldId, LocalVariable, MethodEntity,
        MethodId, Number, Program,
    },
};

/// What one method body contributes to the graph.
#[derive(Debug, Default)]
struct Scan {
    body: Vec<BodyInsn>,
    calls: Vec<MethodId>,
    reads: Vec<FieldId>,
    writes: Vec<FieldId>,
    types: Vec<ClassId>,
    strings: Vec<String>,
    numbers: Vec<Number>,
    unresolved: usize,
}

impl Program {
    /// Recompute every derived relation.
    ///
    /// Starts with [`Program::reset`], so repeated builds give identical graphs.
    pub fn build(&mut self) {
        self.reset();
        self.link_hierarchy();
        self.index_declarations();
        self.scan_bodies();
        self.aggregate_classes();
    }

    fn link_hierarchy(&mut self) {
        for i in 0..self.classes.len() {
            let id = ClassId::new(i);
            let class = &self.classes[i];
            let parent = class
                .super_name
                .as_deref()
                .and_then(|name| self.class_by_name(name))
                .filter(|&parent| parent != id);

            let mut interfaces = Vec::with_capacity(class.interface_names.len());
            for name in &class.interface_names {
                if let Some(iface) = self.class_by_name(name) {
                    if iface != id && !interfaces.contains(&iface) {
                        interfaces.push(iface);
                    }
                }
            }

            if let Some(parent) = parent {
                self.classes[parent.index()].children.insert(id);
            }
            for iface in &interfaces {
                self.classes[iface.index()].implementers.insert(id);
            }
            self.classes[i].parent = parent;
            self.classes[i].interfaces = interfaces;
        }

        let closures: Vec<_> = (0..self.classes.len())
            .map(|i| {
                let id = ClassId::new(i);
                let supers = self.closure(id, |c| {
                    c.parent.into_iter().chain(c.interfaces.iter().copied()).collect()
                });
                let subs = self.closure(id, |c| {
                    c.children.iter().chain(c.implementers.iter()).copied().collect()
                });
                (supers, subs, self.depth_of(id))
            })
            .collect();

        for (i, (supers, subs, depth)) in closures.into_iter().enumerate() {
            let class = &mut self.classes[i];
            class.hierarchy = supers.union(&subs).copied().collect();
            class.hierarchy.insert(class.id);
            class.super_classes = supers;
            class.sub_classes = subs;
            class.depth = depth;
        }
    }

    /// Transitive closure over `next`, excluding `start` itself.
    fn closure(
        &self,
        start: ClassId,
        next: impl Fn(&ClassEntity) -> Vec<ClassId>,
    ) -> BTreeSet<ClassId> {
        let mut seen = BTreeSet::new();
        let mut stack = next(self.class(start));
        while let Some(id) = stack.pop() {
            if id != start && seen.insert(id) {
                stack.extend(next(self.class(id)));
            }
        }
        seen
    }

    fn depth_of(&self, id: ClassId) -> usize {
        let mut depth = 0;
        let mut seen = BTreeSet::from([id]);
        let mut current = self.class(id).parent;
        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            depth += 1;
            current = self.class(parent).parent;
        }
        depth
    }

    fn index_declarations(&mut self) {
        let declarations: Vec<_> = self
            .methods
            .iter()
            .map(|method| {
                let arg_classes: Vec<_> = method
                    .descriptor
                    .args
                    .iter()
                    .map(|ty| self.class_of_type(ty))
                    .collect();
                let return_class = self.class_of_type(&method.descriptor.ret);
                let (args, locals) = gather_variables(method);
                let hierarchy = self.member_family(method.owner, |c| {
                    self.declared_method(c, &method.name, &method.desc)
                });
                (arg_classes, return_class, args, locals, hierarchy)
            })
            .collect();

        for (i, (arg_classes, return_class, args, locals, hierarchy)) in
            declarations.into_iter().enumerate()
        {
            let id = MethodId::new(i);
            for class in arg_classes.iter().chain(std::iter::once(&return_class)).flatten() {
                self.classes[class.index()].method_type_refs.insert(id);
                self.methods[i].class_refs.insert(*class);
            }

            let method = &mut self.methods[i];
            method.arg_classes = arg_classes;
            method.return_class = return_class;
            method.args = args;
            method.locals = locals;
            method.hierarchy = hierarchy;
        }

        let declarations: Vec<_> = self
            .fields
            .iter()
            .map(|field| {
                let type_class = self.class_of_type(&field.ty);
                let hierarchy = self.member_family(field.owner, |c| {
                    self.declared_field(c, &field.name, &field.desc)
                });
                (type_class, hierarchy)
            })
            .collect();

        for (i, (type_class, hierarchy)) in declarations.into_iter().enumerate() {
            if let Some(class) = type_class {
                self.classes[class.index()].field_type_refs.insert(FieldId::new(i));
            }
            let field = &mut self.fields[i];
            field.type_class = type_class;
            field.hierarchy = hierarchy;
        }
    }

    /// Members found by `find` in the super- and subclasses of `owner`.
    fn member_family<T: Ord>(&self, owner: ClassId, find: impl Fn(ClassId) -> Option<T>) -> BTreeSet<T> {
        let class = self.class(owner);
        class
            .super_classes
            .iter()
            .chain(class.sub_classes.iter())
            .filter_map(|&c| find(c))
            .collect()
    }

    fn scan_bodies(&mut self) {
        let scans: Vec<Option<Scan>> = self
            .methods
            .par_iter()
            .map(|method| self.scan(method))
            .collect();

        let mut unresolved = 0;
        for (i, scan) in scans.into_iter().enumerate() {
            let Some(scan) = scan else {
                continue;
            };
            let id = MethodId::new(i);
            unresolved += scan.unresolved;

            for callee in scan.calls {
                let owner = self.methods[callee.index()].owner;
                self.methods[callee.index()].refs_in.insert(id);
                self.classes[owner.index()].method_type_refs.insert(id);
                let method = &mut self.methods[i];
                method.refs_out.insert(callee);
                method.class_refs.insert(owner);
            }

            for (field, write) in scan
                .reads
                .into_iter()
                .map(|f| (f, false))
                .chain(scan.writes.into_iter().map(|f| (f, true)))
            {
                let target = &mut self.fields[field.index()];
                if write {
                    target.write_refs.insert(id);
                } else {
                    target.read_refs.insert(id);
                }
                let owner = target.owner;
                let value = target.value.clone();
                self.classes[owner.index()].method_type_refs.insert(id);

                let method = &mut self.methods[i];
                if write {
                    method.field_writes.insert(field);
                } else {
                    method.field_reads.insert(field);
                }
                method.class_refs.insert(owner);
                match value {
                    Some(ConstValue::String(s)) => {
                        method.strings.insert(s);
                    }
                    Some(ConstValue::Number(n)) => {
                        method.numbers.insert(n);
                    }
                    None => {}
                }
            }

            for class in scan.types {
                self.classes[class.index()].method_type_refs.insert(id);
                self.methods[i].class_refs.insert(class);
            }

            let method = &mut self.methods[i];
            method.strings.extend(scan.strings);
            method.numbers.extend(scan.numbers);
            method.body = scan.body;
            method.line_range = method.code.as_ref().and_then(|code| code.line_range());
        }

        if unresolved > 0 {
            log::debug!("{unresolved} member references outside the program");
        }
    }

    fn scan(&self, method: &MethodEntity) -> Option<Scan> {
        let code = method.code.as_ref()?;
        let mut scan = Scan {
            body: Vec::with_capacity(code.instructions.len()),
            ..Scan::default()
        };

        for insn in &code.instructions {
            let operand = match &insn.operand {
                Operand::Method { member, .. } => {
                    let callee = self.resolve_method_ref(&member.owner, &member.name, &member.desc);
                    match callee {
                        Some(callee) => scan.calls.push(callee),
                        None => scan.unresolved += 1,
                    }
                    BodyOperand::Method(callee)
                }
                Operand::Field(member) => {
                    let field = self.resolve_field_ref(&member.owner, &member.name, &member.desc);
                    match field {
                        Some(field)
                            if matches!(insn.opcode, opcodes::PUTFIELD | opcodes::PUTSTATIC) =>
                        {
                            scan.writes.push(field);
                        }
                        Some(field) => scan.reads.push(field),
                        None => scan.unresolved += 1,
                    }
                    BodyOperand::Field(field)
                }
                Operand::Type(name) | Operand::MultiANewArray { desc: name, .. } => {
                    let class = self.class_of_operand(name);
                    scan.types.extend(class);
                    BodyOperand::Class(class)
                }
                Operand::Constant(constant) => {
                    match constant {
                        Constant::String(s) if !s.trim().is_empty() => {
                            scan.strings.push(s.clone());
                        }
                        Constant::Int(v) => scan.numbers.push(Number::Int(*v)),
                        Constant::Long(v) => scan.numbers.push(Number::Long(*v)),
                        Constant::Float(v) => scan.numbers.push(Number::float(*v)),
                        Constant::Double(v) => scan.numbers.push(Number::double(*v)),
                        _ => {}
                    }
                    BodyOperand::None
                }
                Operand::Int(v) => {
                    scan.numbers.push(Number::Int(*v));
                    BodyOperand::Int(*v)
                }
                Operand::NewArray(kind) => BodyOperand::Int(i32::from(*kind)),
                Operand::Var(slot) => BodyOperand::Var(*slot),
                Operand::None => {
                    scan.numbers.extend(implicit_constant(insn.opcode));
                    BodyOperand::None
                }
                _ => BodyOperand::None,
            };
            scan.body.push(BodyInsn {
                opcode: insn.opcode,
                operand,
            });
        }

        Some(scan)
    }

    fn aggregate_classes(&mut self) {
        for i in 0..self.classes.len() {
            let class = &self.classes[i];
            let mut strings = BTreeSet::new();
            let mut numbers = BTreeSet::new();
            let mut refs_in = BTreeSet::new();
            let mut refs_out = BTreeSet::new();
            let mut method_refs_in = BTreeSet::new();
            let mut method_refs_out = BTreeSet::new();
            let mut field_reads = BTreeSet::new();
            let mut field_writes = BTreeSet::new();

            for &field in &class.fields {
                let field = self.field(field);
                match &field.value {
                    Some(ConstValue::String(s)) => {
                        strings.insert(s.clone());
                    }
                    Some(ConstValue::Number(n)) => {
                        numbers.insert(*n);
                    }
                    None => {}
                }
                refs_out.extend(field.type_class);
            }
            for &method in &class.methods {
                let method = self.method(method);
                strings.extend(method.strings.iter().cloned());
                numbers.extend(method.numbers.iter().copied());
                refs_out.extend(method.class_refs.iter().copied());
                method_refs_in.extend(method.refs_in.iter().copied());
                method_refs_out.extend(method.refs_out.iter().copied());
                field_reads.extend(method.field_reads.iter().copied());
                field_writes.extend(method.field_writes.iter().copied());
            }
            refs_in.extend(class.method_type_refs.iter().map(|&m| self.method(m).owner));
            refs_in.extend(class.field_type_refs.iter().map(|&f| self.field(f).owner));

            let initializers = self.initializer_order(class.id);

            for (order, field) in initializers.into_iter().enumerate() {
                self.fields[field.index()].initializer_index = Some(order);
            }
            let class = &mut self.classes[i];
            class.strings = strings;
            class.numbers = numbers;
            class.ref_classes_in = refs_in;
            class.ref_classes_out = refs_out;
            class.method_refs_in = method_refs_in;
            class.method_refs_out = method_refs_out;
            class.field_reads = field_reads;
            class.field_writes = field_writes;
        }
    }

    /// Fields of `class` in the order `<clinit>` first stores them.
    fn initializer_order(&self, class: ClassId) -> Vec<FieldId> {
        let Some(clinit) = self.declared_method(class, "<clinit>", "()V") else {
            return Vec::new();
        };

        let mut order = Vec::new();
        for insn in &self.method(clinit).body {
            if let (opcodes::PUTSTATIC, BodyOperand::Field(Some(field))) = (insn.opcode, insn.operand)
            {
                if self.field(field).owner == class && !order.contains(&field) {
                    order.push(field);
                }
            }
        }
        order
    }
}

/// The value pushed by an operand-less constant opcode.
fn implicit_constant(opcode: u8) -> Option<Number> {
    Some(match opcode {
        opcodes::ICONST_M1..=opcodes::ICONST_5 => {
            Number::Int(i32::from(opcode) - i32::from(opcodes::ICONST_0))
        }
        opcodes::LCONST_0..=opcodes::LCONST_1 => {
            Number::Long(i64::from(opcode - opcodes::LCONST_0))
        }
        opcodes::FCONST_0..=opcodes::FCONST_2 => Number::float(f32::from(opcode - opcodes::FCONST_0)),
        opcodes::DCONST_0..=opcodes::DCONST_1 => {
            Number::double(f64::from(opcode - opcodes::DCONST_0))
        }
        _ => return None,
    })
}

/// Arguments and locals of a method.
///
/// Argument names come from a `LocalVariableTable` entry in the argument's slot live from pc
/// 0, else `argN`. Locals are the remaining table entries; without a table, every slot loaded
/// beyond the arguments becomes a `varN` local.
fn gather_variables(method: &MethodEntity) -> (Vec<LocalVariable>, Vec<LocalVariable>) {
    let (table, code_length) = match &method.code {
        Some(code) => (code.local_variables.as_slice(), code.code_length),
        None => (&[][..], 0),
    };

    let first_slot: u16 = if method.is_static() { 0 } else { 1 };
    let mut slot = first_slot;
    let mut args = Vec::with_capacity(method.descriptor.args.len());
    for (i, ty) in method.descriptor.args.iter().enumerate() {
        let entry = table.iter().find(|lv| lv.index == slot && lv.start_pc == 0);
        args.push(LocalVariable {
            is_arg: true,
            index: i,
            lv_index: slot,
            ty: ty.clone(),
            start_pc: 0,
            end_pc: entry.map_or(code_length, |lv| u32::from(lv.start_pc) + u32::from(lv.length)),
            name: entry.map_or_else(|| format!("arg{}", i + 1), |lv| lv.name.clone()),
        });
        slot = slot.saturating_add(ty.size());
    }
    let locals_start = slot;

    let Some(code) = &method.code else {
        return (args, Vec::new());
    };

    let mut locals = Vec::new();
    if table.is_empty() {
        let loaded: BTreeSet<u16> = code
            .instructions
            .iter()
            .filter(|insn| (opcodes::ILOAD..=opcodes::ALOAD).contains(&insn.opcode))
            .filter_map(|insn| match insn.operand {
                Operand::Var(slot) if slot >= locals_start => Some(slot),
                _ => None,
            })
            .collect();
        for (i, slot) in loaded.into_iter().enumerate() {
            locals.push(LocalVariable {
                is_arg: false,
                index: i,
                lv_index: slot,
                ty: Type::Object("java/lang/Object".to_string()),
                start_pc: 0,
                end_pc: code_length,
                name: format!("var{}", i + 1),
            });
        }
    } else {
        for lv in table {
            if lv.start_pc == 0 && lv.index < locals_start {
                continue;
            }
            locals.push(LocalVariable {
                is_arg: false,
                index: locals.len(),
                lv_index: lv.index,
                ty: Type::parse(&lv.desc)
                    .unwrap_or_else(|_| Type::Object("java/lang/Object".to_string())),
                start_pc: u32::from(lv.start_pc),
                end_pc: u32::from(lv.start_pc) + u32::from(lv.length),
                name: lv.name.clone(),
            });
        }
    }

    (args, locals)
}

#[cfg(test)]
mod tests {
    use crate::{
        program::{BodyOperand, ConstValue, Number, Program},
        test::builder::{ClassBuilder, Op},
    };

    fn program() -> Program {
        let base = ClassBuilder::new("app/Base")
            .method(0x0001, "<init>", "()V", |m| {
                m.code(&[
                    Op::Aload(0),
                    Op::InvokeSpecial("java/lang/Object", "<init>", "()V"),
                    Op::Return,
                ])
            })
            .method(0x0001, "update", "(Lapp/Item;)V", |m| m.code(&[Op::Return]))
            .build();
        let item = ClassBuilder::new("app/Item")
            .super_name("app/Base")
            .interface("java/io/Serializable")
            .field(0x0019, "NAME", "Ljava/lang/String;", |f| f.constant_string("item"))
            .field(0x000A, "count", "I", |f| f)
            .field(0x000A, "total", "J", |f| f)
            .field(0x0002, "owner", "Lapp/Base;", |f| f)
            .method(0x0008, "<clinit>", "()V", |m| {
                m.code(&[
                    Op::Iconst(0),
                    Op::Insn(0x85),
                    Op::PutStatic("app/Item", "total", "J"),
                    Op::Iconst(7),
                    Op::PutStatic("app/Item", "count", "I"),
                    Op::Iconst(8),
                    Op::PutStatic("app/Item", "count", "I"),
                    Op::Return,
                ])
            })
            .method(0x0001, "update", "(Lapp/Item;)V", |m| {
                m.code(&[
                    Op::Aload(0),
                    Op::Aload(1),
                    Op::InvokeSpecial("app/Base", "update", "(Lapp/Item;)V"),
                    Op::GetStatic("app/Item", "NAME", "Ljava/lang/String;"),
                    Op::Pop,
                    Op::Ldc("hello"),
                    Op::Ldc("   "),
                    Op::Pop,
                    Op::Pop,
                    Op::Iconst(100),
                    Op::Pop,
                    Op::New("app/Base"),
                    Op::Pop,
                    Op::InvokeStatic("java/lang/System", "gc", "()V"),
                    Op::Return,
                ])
                .line(0, 20)
                .line(5, 24)
                .local(0, "this", "Lapp/Item;")
                .local(1, "other", "Lapp/Item;")
                .local_range(2, "tmp", "I", 3, 4)
            })
            .build();
        Program::from_classes([base, item], &[]).unwrap()
    }

    #[test]
    fn hierarchy_is_mutual() {
        let program = program();
        let base = program.class_by_name("app/Base").unwrap();
        let item = program.class_by_name("app/Item").unwrap();

        assert_eq!(program.class(item).parent, Some(base));
        assert!(program.class(base).children.contains(&item));
        assert!(program.class(item).interfaces.is_empty());
        assert_eq!(program.class(item).interface_names, vec!["java/io/Serializable"]);
        assert!(program.class(item).super_classes.contains(&base));
        assert!(program.class(base).sub_classes.contains(&item));
        assert_eq!(program.class(base).hierarchy.len(), 2);
        assert_eq!(program.class(item).depth, 1);
        assert_eq!(program.class(base).depth, 0);
    }

    #[test]
    fn calls_fields_types_and_constants() {
        let program = program();
        let base = program.class_by_name("app/Base").unwrap();
        let item = program.class_by_name("app/Item").unwrap();
        let update = program.declared_method(item, "update", "(Lapp/Item;)V").unwrap();
        let base_update = program.declared_method(base, "update", "(Lapp/Item;)V").unwrap();
        let name = program.declared_field(item, "NAME", "Ljava/lang/String;").unwrap();

        let method = program.method(update);
        assert!(method.refs_out.contains(&base_update));
        assert!(program.method(base_update).refs_in.contains(&update));
        assert!(method.field_reads.contains(&name));
        assert!(program.field(name).read_refs.contains(&update));
        assert!(method.class_refs.contains(&base));
        assert!(method.class_refs.contains(&item));
        assert!(program.class(base).method_type_refs.contains(&update));

        assert!(method.strings.contains("hello"));
        assert!(method.strings.contains("item"));
        assert!(!method.strings.contains("   "));
        assert!(method.numbers.contains(&Number::Int(100)));
        assert_eq!(method.line_range, Some((20, 24)));
        assert!(method.hierarchy.contains(&base_update));
        assert!(program.method(base_update).hierarchy.contains(&update));

        assert!(matches!(
            method.body[2].operand,
            BodyOperand::Method(Some(id)) if id == base_update
        ));
        assert!(matches!(method.body[13].operand, BodyOperand::Method(None)));
        assert!(program.class(item).strings.contains("item"));
        assert!(program.class(item).ref_classes_out.contains(&base));
        assert!(program.class(base).ref_classes_in.contains(&item));
    }

    #[test]
    fn arguments_and_locals() {
        let program = program();
        let item = program.class_by_name("app/Item").unwrap();
        let update = program.method(program.declared_method(item, "update", "(Lapp/Item;)V").unwrap());
        assert_eq!(update.args.len(), 1);
        assert_eq!(update.args[0].name, "other");
        assert_eq!(update.args[0].lv_index, 1);
        assert_eq!(update.arg_classes, vec![Some(item)]);
        assert_eq!(update.locals.len(), 1);
        assert_eq!(update.locals[0].name, "tmp");
        assert_eq!(update.locals[0].start_pc, 3);
        assert_eq!(update.locals[0].end_pc, 7);

        let base = program.class_by_name("app/Base").unwrap();
        let base_update = program.method(program.declared_method(base, "update", "(Lapp/Item;)V").unwrap());
        assert_eq!(base_update.args[0].name, "arg1");
        assert!(base_update.locals.is_empty());
    }

    #[test]
    fn synthesized_locals_without_table() {
        let bytes = ClassBuilder::new("Calc")
            .method(0x0009, "sum", "(IJ)I", |m| {
                m.code(&[
                    Op::Iload(0),
                    Op::Lload(1),
                    Op::Insn(0x88),
                    Op::Iadd,
                    Op::Istore(4),
                    Op::Iload(4),
                    Op::Aload(3),
                    Op::Pop,
                    Op::Ireturn,
                ])
            })
            .build();
        let program = Program::from_classes([bytes], &[]).unwrap();
        let sum = program.method(program.declared_method(program.class_by_name("Calc").unwrap(), "sum", "(IJ)I").unwrap());

        assert_eq!(sum.args.iter().map(|a| a.lv_index).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(sum.args[1].name, "arg2");
        let names: Vec<_> = sum.locals.iter().map(|l| (l.lv_index, l.name.as_str())).collect();
        assert_eq!(names, vec![(3, "var1"), (4, "var2")]);
    }

    #[test]
    fn initializer_order_and_values() {
        let program = program();
        let item = program.class_by_name("app/Item").unwrap();
        let field = |name: &str, desc: &str| program.field(program.declared_field(item, name, desc).unwrap());

        assert_eq!(field("total", "J").initializer_index, Some(0));
        assert_eq!(field("count", "I").initializer_index, Some(1));
        assert_eq!(field("owner", "Lapp/Base;").initializer_index, None);
        assert_eq!(
            field("NAME", "Ljava/lang/String;").value,
            Some(ConstValue::String("item".into()))
        );
        let base = program.class_by_name("app/Base").unwrap();
        assert_eq!(field("owner", "Lapp/Base;").type_class, Some(base));
        assert_eq!(program.class(base).field_type_refs.len(), 1);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut program = program();
        let before: Vec<_> = program
            .methods()
            .iter()
            .map(|m| (m.refs_in.clone(), m.refs_out.clone(), m.class_refs.clone(), m.strings.clone()))
            .collect();
        let children: Vec<_> = program.classes().iter().map(|c| c.children.clone()).collect();

        program.build();
        program.build();

        let after: Vec<_> = program
            .methods()
            .iter()
            .map(|m| (m.refs_in.clone(), m.refs_out.clone(), m.class_refs.clone(), m.strings.clone()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(
            children,
            program.classes().iter().map(|c| c.children.clone()).collect::<Vec<_>>()
        );

        program.reset();
        assert!(program.methods().iter().all(|m| m.refs_out.is_empty() && m.body.is_empty()));
        assert!(program.classes().iter().all(|c| c.children.is_empty()));
    }
}
