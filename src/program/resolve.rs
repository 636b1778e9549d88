//! Symbolic member resolution.
//!
//! Lookup follows the JVM's order: the class itself, then its superclass chain, then its
//! superinterfaces breadth first. Only classes present in the program are searched, so a
//! member inherited from a library class does not resolve.

use std::collections::{BTreeSet, VecDeque};

use crate::{
    classfile::Type,
    program::{ClassId, FieldId, MethodId, Program},
};

impl Program {
    /// A method declared directly in `class`.
    #[must_use]
    pub fn declared_method(&self, class: ClassId, name: &str, desc: &str) -> Option<MethodId> {
        self.class(class).methods.iter().copied().find(|&id| {
            let method = self.method(id);
            method.name == name && method.desc == desc
        })
    }

    /// A field declared directly in `class`.
    #[must_use]
    pub fn declared_field(&self, class: ClassId, name: &str, desc: &str) -> Option<FieldId> {
        self.class(class).fields.iter().copied().find(|&id| {
            let field = self.field(id);
            field.name == name && field.desc == desc
        })
    }

    /// Resolve a method reference made through `class`.
    #[must_use]
    pub fn resolve_method(&self, class: ClassId, name: &str, desc: &str) -> Option<MethodId> {
        self.resolve(class, |c| self.declared_method(c, name, desc))
    }

    /// Resolve a field reference made through `class`.
    #[must_use]
    pub fn resolve_field(&self, class: ClassId, name: &str, desc: &str) -> Option<FieldId> {
        self.resolve(class, |c| self.declared_field(c, name, desc))
    }

    /// Resolve a method reference by owner name.
    #[must_use]
    pub fn resolve_method_ref(&self, owner: &str, name: &str, desc: &str) -> Option<MethodId> {
        self.resolve_method(self.class_by_name(owner)?, name, desc)
    }

    /// Resolve a field reference by owner name.
    #[must_use]
    pub fn resolve_field_ref(&self, owner: &str, name: &str, desc: &str) -> Option<FieldId> {
        self.resolve_field(self.class_by_name(owner)?, name, desc)
    }

    /// The program class a type operand refers to.
    ///
    /// Array operands (`[Lcom/Foo;`) resolve to their element class.
    #[must_use]
    pub fn class_of_operand(&self, name: &str) -> Option<ClassId> {
        if name.starts_with('[') {
            let ty = Type::parse(name).ok()?;
            self.class_by_name(ty.element().internal_name()?)
        } else {
            self.class_by_name(name)
        }
    }

    /// The program class of an object or array-of-object type.
    #[must_use]
    pub fn class_of_type(&self, ty: &Type) -> Option<ClassId> {
        self.class_by_name(ty.element().internal_name()?)
    }

    fn resolve<T>(&self, class: ClassId, find: impl Fn(ClassId) -> Option<T>) -> Option<T> {
        let mut current = Some(class);
        let mut visited = BTreeSet::new();
        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            if let Some(found) = find(id) {
                return Some(found);
            }
            current = self.class(id).parent;
        }

        let mut queue: VecDeque<ClassId> = visited
            .iter()
            .flat_map(|&id| self.class(id).interfaces.iter().copied())
            .collect();
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(found) = find(id) {
                return Some(found);
            }
            queue.extend(self.class(id).interfaces.iter().copied());
        }
        None
    }
}
