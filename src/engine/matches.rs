//! Confirmed matches between an old and a new program.
//!
//! Each entity kind keeps a one-to-one relation with a forward (old to new) and a back (new to
//! old) index. Setting a pair first unlinks whatever either side was matched to, so the
//! relation can never hold an entity twice.

use std::collections::BTreeMap;

use crate::program::{ClassId, EntityRef, FieldId, MethodId};

#[derive(Debug, Clone, PartialEq, Eq)]
struct BiMap<T: Ord + Copy> {
    forward: BTreeMap<T, T>,
    back: BTreeMap<T, T>,
}

impl<T: Ord + Copy> Default for BiMap<T> {
    fn default() -> Self {
        BiMap {
            forward: BTreeMap::new(),
            back: BTreeMap::new(),
        }
    }
}

impl<T: Ord + Copy> BiMap<T> {
    fn set(&mut self, old: T, new: T) -> bool {
        if self.forward.get(&old) == Some(&new) {
            return false;
        }
        if let Some(previous) = self.forward.remove(&old) {
            self.back.remove(&previous);
        }
        if let Some(previous) = self.back.remove(&new) {
            self.forward.remove(&previous);
        }
        self.forward.insert(old, new);
        self.back.insert(new, old);
        true
    }

    fn len(&self) -> usize {
        self.forward.len()
    }

    fn clear(&mut self) {
        self.forward.clear();
        self.back.clear();
    }
}

/// The confirmed-match relation for classes, methods and fields.
///
/// Written only by the orchestrating thread between scoring rounds; scoring reads it through
/// [`crate::similarity::MatchContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    classes: BiMap<ClassId>,
    methods: BiMap<MethodId>,
    fields: BiMap<FieldId>,
}

impl Matches {
    /// An empty relation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match two classes. Returns `false` if they already were.
    pub fn set_class(&mut self, old: ClassId, new: ClassId) -> bool {
        self.classes.set(old, new)
    }

    /// Match two methods. Returns `false` if they already were.
    pub fn set_method(&mut self, old: MethodId, new: MethodId) -> bool {
        self.methods.set(old, new)
    }

    /// Match two fields. Returns `false` if they already were.
    pub fn set_field(&mut self, old: FieldId, new: FieldId) -> bool {
        self.fields.set(old, new)
    }

    /// Match two entities of the same kind.
    ///
    /// Returns `false` for pairs of different kinds and for pairs already matched.
    pub fn set(&mut self, old: EntityRef, new: EntityRef) -> bool {
        match (old, new) {
            (EntityRef::Class(a), EntityRef::Class(b)) => self.set_class(a, b),
            (EntityRef::Method(a), EntityRef::Method(b)) => self.set_method(a, b),
            (EntityRef::Field(a), EntityRef::Field(b)) => self.set_field(a, b),
            _ => false,
        }
    }

    /// The new class matched to an old one.
    #[must_use]
    pub fn new_class(&self, old: ClassId) -> Option<ClassId> {
        self.classes.forward.get(&old).copied()
    }

    /// The old class matched to a new one.
    #[must_use]
    pub fn old_class(&self, new: ClassId) -> Option<ClassId> {
        self.classes.back.get(&new).copied()
    }

    /// The new method matched to an old one.
    #[must_use]
    pub fn new_method(&self, old: MethodId) -> Option<MethodId> {
        self.methods.forward.get(&old).copied()
    }

    /// The old method matched to a new one.
    #[must_use]
    pub fn old_method(&self, new: MethodId) -> Option<MethodId> {
        self.methods.back.get(&new).copied()
    }

    /// The new field matched to an old one.
    #[must_use]
    pub fn new_field(&self, old: FieldId) -> Option<FieldId> {
        self.fields.forward.get(&old).copied()
    }

    /// The old field matched to a new one.
    #[must_use]
    pub fn old_field(&self, new: FieldId) -> Option<FieldId> {
        self.fields.back.get(&new).copied()
    }

    /// Returns `true` if the old-program entity has a match.
    #[must_use]
    pub fn has_old(&self, old: EntityRef) -> bool {
        match old {
            EntityRef::Class(id) => self.classes.forward.contains_key(&id),
            EntityRef::Method(id) => self.methods.forward.contains_key(&id),
            EntityRef::Field(id) => self.fields.forward.contains_key(&id),
        }
    }

    /// Returns `true` if the new-program entity has a match.
    #[must_use]
    pub fn has_new(&self, new: EntityRef) -> bool {
        match new {
            EntityRef::Class(id) => self.classes.back.contains_key(&id),
            EntityRef::Method(id) => self.methods.back.contains_key(&id),
            EntityRef::Field(id) => self.fields.back.contains_key(&id),
        }
    }

    /// Matched class pairs, ordered by old id.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, ClassId)> + '_ {
        self.classes.forward.iter().map(|(&a, &b)| (a, b))
    }

    /// Matched method pairs, ordered by old id.
    pub fn methods(&self) -> impl Iterator<Item = (MethodId, MethodId)> + '_ {
        self.methods.forward.iter().map(|(&a, &b)| (a, b))
    }

    /// Matched field pairs, ordered by old id.
    pub fn fields(&self) -> impl Iterator<Item = (FieldId, FieldId)> + '_ {
        self.fields.forward.iter().map(|(&a, &b)| (a, b))
    }

    /// Number of matched class, method and field pairs.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.classes.len(), self.methods.len(), self.fields.len())
    }

    /// Forget every match.
    pub fn clear(&mut self) {
        self.classes.clear();
        self.methods.clear();
        self.fields.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_stays_one_to_one() {
        let mut matches = Matches::new();
        assert!(matches.set_class(ClassId::new(0), ClassId::new(5)));
        assert!(!matches.set_class(ClassId::new(0), ClassId::new(5)));
        assert_eq!(matches.new_class(ClassId::new(0)), Some(ClassId::new(5)));
        assert_eq!(matches.old_class(ClassId::new(5)), Some(ClassId::new(0)));

        // rebinding the new side drops the old pair
        assert!(matches.set_class(ClassId::new(1), ClassId::new(5)));
        assert_eq!(matches.new_class(ClassId::new(0)), None);
        assert_eq!(matches.old_class(ClassId::new(5)), Some(ClassId::new(1)));
        assert_eq!(matches.counts(), (1, 0, 0));
    }

    #[test]
    fn set_by_entity_ref() {
        let mut matches = Matches::new();
        assert!(matches.set(MethodId::new(1).into(), MethodId::new(2).into()));
        assert!(!matches.set(MethodId::new(1).into(), FieldId::new(2).into()));
        assert_eq!(matches.methods().collect::<Vec<_>>(), vec![(MethodId::new(1), MethodId::new(2))]);
        assert!(matches.has_old(MethodId::new(1).into()));
        assert!(!matches.has_old(MethodId::new(2).into()));
        assert!(matches.has_new(MethodId::new(2).into()));
        matches.clear();
        assert_eq!(matches.counts(), (0, 0, 0));
    }
}
