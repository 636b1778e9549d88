//! Structural compatibility between entities of two programs.

use std::ptr;

use crate::{
    classfile::{Sort, Type},
    engine::Matches,
    program::{ClassId, FieldId, MethodId, Program},
    similarity::{
        names::{is_obfuscated_name, names_compatible, simple_name},
        sets::compare_node_sets,
    },
};

/// Read-only view used by every feature: the two programs and the confirmed matches.
///
/// Entities passed as `a` belong to `old`, entities passed as `b` to `new`.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    /// The program matched from
    pub old: &'a Program,
    /// The program matched to
    pub new: &'a Program,
    /// Confirmed matches so far
    pub matches: &'a Matches,
}

impl<'a> MatchContext<'a> {
    /// Create a context.
    #[must_use]
    pub fn new(old: &'a Program, new: &'a Program, matches: &'a Matches) -> Self {
        MatchContext { old, new, matches }
    }

    /// Whether both sides share one id space, which makes equal handles the same entity.
    #[must_use]
    pub fn same_program(&self) -> bool {
        ptr::eq(self.old, self.new)
    }

    /// Whether two classes may be the same class.
    ///
    /// A confirmed match on either side decides. Otherwise two meaningful simple names must
    /// agree.
    #[must_use]
    pub fn classes_compatible(&self, a: ClassId, b: ClassId) -> bool {
        if self.same_program() && a == b {
            return true;
        }
        if let Some(matched) = self.matches.new_class(a) {
            return matched == b;
        }
        if let Some(matched) = self.matches.old_class(b) {
            return matched == a;
        }

        let name_a = &self.old.class(a).name;
        let name_b = &self.new.class(b).name;
        if is_obfuscated_name(simple_name(name_a)) || is_obfuscated_name(simple_name(name_b)) {
            true
        } else {
            name_a == name_b
        }
    }

    /// Whether two methods may be the same method.
    #[must_use]
    pub fn methods_compatible(&self, a: MethodId, b: MethodId) -> bool {
        if self.same_program() && a == b {
            return true;
        }
        if let Some(matched) = self.matches.new_method(a) {
            return matched == b;
        }
        if let Some(matched) = self.matches.old_method(b) {
            return matched == a;
        }

        let method_a = self.old.method(a);
        let method_b = self.new.method(b);
        if !method_a.is_static()
            && !method_b.is_static()
            && !self.classes_compatible(method_a.owner, method_b.owner)
        {
            return false;
        }
        if !names_compatible(&method_a.name, &method_b.name) {
            return false;
        }

        let (desc_a, desc_b) = (&method_a.descriptor, &method_b.descriptor);
        self.types_compatible(&desc_a.ret, &desc_b.ret)
            && desc_a.args.len() == desc_b.args.len()
            && desc_a
                .args
                .iter()
                .zip(&desc_b.args)
                .all(|(x, y)| self.types_compatible(x, y))
    }

    /// Whether two fields may be the same field.
    #[must_use]
    pub fn fields_compatible(&self, a: FieldId, b: FieldId) -> bool {
        if self.same_program() && a == b {
            return true;
        }
        if let Some(matched) = self.matches.new_field(a) {
            return matched == b;
        }
        if let Some(matched) = self.matches.old_field(b) {
            return matched == a;
        }

        let field_a = self.old.field(a);
        let field_b = self.new.field(b);
        if !field_a.is_static()
            && !field_b.is_static()
            && !self.classes_compatible(field_a.owner, field_b.owner)
        {
            return false;
        }
        names_compatible(&field_a.name, &field_b.name) && self.types_compatible(&field_a.ty, &field_b.ty)
    }

    /// Whether two descriptor types may denote the same type.
    ///
    /// Sorts and array dimensions must agree. Object types that both resolve to program classes
    /// defer to [`MatchContext::classes_compatible`]; external types must have equal names.
    #[must_use]
    pub fn types_compatible(&self, a: &Type, b: &Type) -> bool {
        if a.sort() != b.sort() || a.dimensions() != b.dimensions() {
            return false;
        }
        let (elem_a, elem_b) = (a.element(), b.element());
        if elem_a.sort() != elem_b.sort() {
            return false;
        }
        if elem_a.sort() != Sort::Object {
            return true;
        }

        match (self.old.class_of_type(elem_a), self.new.class_of_type(elem_b)) {
            (Some(x), Some(y)) => self.classes_compatible(x, y),
            (None, None) => elem_a == elem_b,
            _ => false,
        }
    }

    /// [`compare_node_sets`] over classes.
    pub fn compare_classes(
        &self,
        a: impl IntoIterator<Item = ClassId>,
        b: impl IntoIterator<Item = ClassId>,
    ) -> f64 {
        compare_node_sets(
            a,
            b,
            self.same_program(),
            |x| self.matches.new_class(x),
            |x, y| self.classes_compatible(x, y),
        )
    }

    /// [`compare_node_sets`] over methods.
    pub fn compare_methods(
        &self,
        a: impl IntoIterator<Item = MethodId>,
        b: impl IntoIterator<Item = MethodId>,
    ) -> f64 {
        compare_node_sets(
            a,
            b,
            self.same_program(),
            |x| self.matches.new_method(x),
            |x, y| self.methods_compatible(x, y),
        )
    }

    /// [`compare_node_sets`] over fields.
    pub fn compare_fields(
        &self,
        a: impl IntoIterator<Item = FieldId>,
        b: impl IntoIterator<Item = FieldId>,
    ) -> f64 {
        compare_node_sets(
            a,
            b,
            self.same_program(),
            |x| self.matches.new_field(x),
            |x, y| self.fields_compatible(x, y),
        )
    }

    /// [`compare_node_sets`] over descriptor types, with value equality as identity.
    pub fn compare_types<'t>(
        &self,
        a: impl IntoIterator<Item = &'t Type>,
        b: impl IntoIterator<Item = &'t Type>,
    ) -> f64 {
        compare_node_sets(a, b, true, |_| None, |x, y| self.types_compatible(x, y))
    }
}
