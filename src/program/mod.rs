//! The program model: an arena of class, method and field entities.
//!
//! A [`Program`] owns every entity of one input container. Entities refer to each other only
//! through [`ClassId`], [`MethodId`] and [`FieldId`] handles, so the cyclic graph of parents,
//! children, callers and callees is plain data that can be shared across threads during
//! matching.
//!
//! # Lifecycle
//!
//! 1. **Load** - [`Program::from_path`] or [`Program::from_classes`] parse every classfile,
//!    sort the classes by name and assign handles in that order.
//! 2. **Build** - [`Program::build`] derives the cross reference graph in three passes:
//!    hierarchy linking, declaration indexing, and a body scan for calls, field accesses,
//!    type operands and constants.
//! 3. **Match** - the graph is read-only from here on. Confirmed matches live outside the
//!    program in [`crate::engine::Matches`].
//!
//! References to classes or members outside the program (the JDK, other libraries) are
//! expected and dropped silently while building.
//!
//! # Examples
//!
//! ```rust,no_run
//! use remapper::program::Program;
//!
//! let program = Program::from_path("client.jar", &["bouncycastle".to_string()])?;
//! for class in program.active_classes() {
//!     println!("{} ({} methods)", class.name, class.methods.len());
//! }
//! # Ok::<(), remapper::Error>(())
//! ```

mod build;
mod entity;
mod ids;
mod resolve;

pub use entity::{
    BodyInsn, BodyOperand, ClassEntity, ConstValue, FieldEntity, LocalVariable, MethodEntity,
    Number,
};
pub use ids::{ClassId, EntityRef, FieldId, MethodId};

pub(crate) use entity::member_order;

use std::{collections::HashMap, path::Path};

use rayon::prelude::*;

use crate::{
    classfile::ClassFile,
    file::archive::{read_buffer, read_entries, ClassEntry},
    Error, Result,
};

/// All entities of one loaded program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    classes: Vec<ClassEntity>,
    methods: Vec<MethodEntity>,
    fields: Vec<FieldEntity>,
    by_name: HashMap<String, ClassId>,
}

impl Program {
    /// Load and build the program stored at `path`.
    ///
    /// `path` may be a jar/zip file, a directory tree of classfiles or a single classfile.
    /// A class whose name contains any of the `ignore` patterns is loaded but never offered
    /// for matching.
    ///
    /// # Errors
    /// Returns the container error, or [`Error::ClassFile`] naming the first entry that failed
    /// to parse. No partial program is returned.
    pub fn from_path(path: impl AsRef<Path>, ignore: &[String]) -> Result<Program> {
        Self::from_entries(&read_entries(path.as_ref())?, ignore)
    }

    /// Load and build the program held by an in-memory jar or classfile.
    ///
    /// # Errors
    /// Same as [`Program::from_path`].
    pub fn from_bytes(data: Vec<u8>, ignore: &[String]) -> Result<Program> {
        Self::from_entries(&read_buffer(data, "<memory>")?, ignore)
    }

    fn from_entries(entries: &[ClassEntry], ignore: &[String]) -> Result<Program> {
        let parsed = entries
            .par_iter()
            .map(|entry| {
                ClassFile::parse(&entry.data).map_err(|source| Error::ClassFile {
                    name: entry.name.clone(),
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_parsed(parsed, ignore))
    }

    /// Load and build a program from in-memory classfiles.
    ///
    /// Parse errors name the entry by its position, `#0`, `#1`, ...
    ///
    /// # Errors
    /// Returns [`Error::ClassFile`] if any classfile fails to parse.
    pub fn from_classes<I, B>(classes: I, ignore: &[String]) -> Result<Program>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]> + Sync,
    {
        let data: Vec<B> = classes.into_iter().collect();
        let parsed = data
            .par_iter()
            .enumerate()
            .map(|(i, bytes)| {
                ClassFile::parse(bytes.as_ref()).map_err(|source| Error::ClassFile {
                    name: format!("#{i}"),
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_parsed(parsed, ignore))
    }

    /// Create entities for parsed classes and build the graph.
    ///
    /// Classes are ordered by name; of several classes with one name the first in input order
    /// is kept.
    #[must_use]
    pub fn from_parsed(mut parsed: Vec<ClassFile>, ignore: &[String]) -> Program {
        parsed.sort_by(|a, b| a.name.cmp(&b.name));
        parsed.dedup_by(|dup, kept| {
            let same = dup.name == kept.name;
            if same {
                log::warn!("Duplicate class {}, keeping the first occurrence", dup.name);
            }
            same
        });

        let mut program = Program::default();
        for class in parsed {
            program.add_class(class, ignore);
        }
        program.build();

        log::debug!(
            "Loaded {} classes ({} ignored), {} methods, {} fields",
            program.classes.len(),
            program.ignored_classes().count(),
            program.methods.len(),
            program.fields.len()
        );
        program
    }

    fn add_class(&mut self, class: ClassFile, ignore: &[String]) {
        let id = ClassId::new(self.classes.len());
        let mut entity = ClassEntity::new(id, class.name, class.access);
        entity.super_name = class.super_name;
        entity.interface_names = class.interfaces;
        entity.signature = class.signature;
        entity.ignored = ignore.iter().any(|pattern| entity.name.contains(pattern.as_str()));

        for (index, field) in class.fields.into_iter().enumerate() {
            let field_id = FieldId::new(self.fields.len());
            entity.fields.push(field_id);
            self.fields.push(FieldEntity {
                id: field_id,
                owner: id,
                name: field.name,
                desc: field.desc,
                ty: field.ty,
                access: field.access,
                signature: field.signature,
                index,
                value: field.constant.as_ref().and_then(ConstValue::from_constant),
                type_class: None,
                read_refs: Default::default(),
                write_refs: Default::default(),
                hierarchy: Default::default(),
                initializer_index: None,
            });
        }

        for (index, method) in class.methods.into_iter().enumerate() {
            let method_id = MethodId::new(self.methods.len());
            entity.methods.push(method_id);
            self.methods.push(MethodEntity {
                id: method_id,
                owner: id,
                name: method.name,
                desc: method.desc,
                descriptor: method.descriptor,
                access: method.access,
                signature: method.signature,
                index,
                code: method.code,
                arg_classes: Vec::new(),
                return_class: None,
                body: Vec::new(),
                args: Vec::new(),
                locals: Vec::new(),
                refs_in: Default::default(),
                refs_out: Default::default(),
                field_reads: Default::default(),
                field_writes: Default::default(),
                class_refs: Default::default(),
                strings: Default::default(),
                numbers: Default::default(),
                line_range: None,
                hierarchy: Default::default(),
            });
        }

        self.by_name.insert(entity.name.clone(), id);
        self.classes.push(entity);
    }

    /// Clear every derived relation, leaving only declared data.
    pub fn reset(&mut self) {
        self.classes.iter_mut().for_each(ClassEntity::reset);
        self.methods.iter_mut().for_each(MethodEntity::reset);
        self.fields.iter_mut().for_each(FieldEntity::reset);
    }

    /// All classes, ignored ones included, ordered by name.
    #[must_use]
    pub fn classes(&self) -> &[ClassEntity] {
        &self.classes
    }

    /// All methods, grouped by owner.
    #[must_use]
    pub fn methods(&self) -> &[MethodEntity] {
        &self.methods
    }

    /// All fields, grouped by owner.
    #[must_use]
    pub fn fields(&self) -> &[FieldEntity] {
        &self.fields
    }

    /// Classes that take part in matching.
    pub fn active_classes(&self) -> impl Iterator<Item = &ClassEntity> {
        self.classes.iter().filter(|c| !c.ignored)
    }

    /// Classes excluded from matching.
    pub fn ignored_classes(&self) -> impl Iterator<Item = &ClassEntity> {
        self.classes.iter().filter(|c| c.ignored)
    }

    /// Methods of active classes.
    pub fn active_methods(&self) -> impl Iterator<Item = &MethodEntity> {
        self.methods.iter().filter(|m| !self.class(m.owner).ignored)
    }

    /// Fields of active classes.
    pub fn active_fields(&self) -> impl Iterator<Item = &FieldEntity> {
        self.fields.iter().filter(|f| !self.class(f.owner).ignored)
    }

    /// The class behind a handle.
    ///
    /// # Panics
    /// Panics if `id` was issued by a different program.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &ClassEntity {
        &self.classes[id.index()]
    }

    /// The method behind a handle.
    ///
    /// # Panics
    /// Panics if `id` was issued by a different program.
    #[must_use]
    pub fn method(&self, id: MethodId) -> &MethodEntity {
        &self.methods[id.index()]
    }

    /// The field behind a handle.
    ///
    /// # Panics
    /// Panics if `id` was issued by a different program.
    #[must_use]
    pub fn field(&self, id: FieldId) -> &FieldEntity {
        &self.fields[id.index()]
    }

    /// Look up a class by internal name, ignored classes included.
    #[must_use]
    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// A stable textual identity: `Owner`, `Owner.name(desc)ret` or `Owner.name`.
    #[must_use]
    pub fn id_string(&self, entity: EntityRef) -> String {
        match entity {
            EntityRef::Class(id) => self.class(id).name.clone(),
            EntityRef::Method(id) => {
                let method = self.method(id);
                format!("{}.{}{}", self.class(method.owner).name, method.name, method.desc)
            }
            EntityRef::Field(id) => {
                let field = self.field(id);
                format!("{}.{}", self.class(field.owner).name, field.name)
            }
        }
    }
}
