//! Reference propagation.
//!
//! Every accepted class or method pair proposes its structural neighbors as candidates. A
//! proposal is a single vote in a fresh [`NodeMappings`]; the caller merges the votes into the
//! running table and lets the global reduction decide. Within a neighbor set only pairs that
//! are unambiguous on both sides are proposed.

use std::collections::BTreeMap;

use crate::{
    engine::NodeMappings,
    program::{ClassId, EntityRef, FieldId, MethodId, Program},
    similarity::MatchContext,
};

/// Votes for the neighbors of every pair in `accepted`.
pub(crate) fn propagate(ctx: &MatchContext<'_>, accepted: &BTreeMap<EntityRef, EntityRef>) -> NodeMappings {
    let mut votes = Votes {
        ctx,
        mappings: NodeMappings::new(),
    };
    for (&from, &to) in accepted {
        match (from, to) {
            (EntityRef::Class(a), EntityRef::Class(b)) => votes.class_neighbors(a, b),
            (EntityRef::Method(a), EntityRef::Method(b)) => votes.method_neighbors(a, b),
            _ => {}
        }
    }
    votes.mappings
}

struct Votes<'c, 'a> {
    ctx: &'c MatchContext<'a>,
    mappings: NodeMappings,
}

impl Votes<'_, '_> {
    fn class_neighbors(&mut self, a: ClassId, b: ClassId) {
        let ctx = self.ctx;
        let (old, new) = (ctx.old.class(a), ctx.new.class(b));

        if let (Some(x), Some(y)) = (old.parent, new.parent) {
            self.class(x, y);
        }
        self.classes(&old.children, &new.children);
        self.classes(&old.interfaces, &new.interfaces);
        self.classes(&old.implementers, &new.implementers);
        self.classes(&old.hierarchy, &new.hierarchy);
        self.methods(&old.method_type_refs, &new.method_type_refs);
        self.fields(&old.field_type_refs, &new.field_type_refs);
        self.fields(
            &instance_fields(ctx.old, &old.fields),
            &instance_fields(ctx.new, &new.fields),
        );

        // initializers keep their names through obfuscation
        if let (Some(x), Some(y)) = (
            named(ctx.old, &old.methods, "<clinit>").first(),
            named(ctx.new, &new.methods, "<clinit>").first(),
        ) {
            self.vote(*x, *y);
        }
        self.methods(
            &named(ctx.old, &old.methods, "<init>"),
            &named(ctx.new, &new.methods, "<init>"),
        );
    }

    fn method_neighbors(&mut self, a: MethodId, b: MethodId) {
        let ctx = self.ctx;
        let (old, new) = (ctx.old.method(a), ctx.new.method(b));

        if let (Some(x), Some(y)) = (old.return_class, new.return_class) {
            self.class(x, y);
        }
        let old_args: Vec<ClassId> = old.arg_classes.iter().flatten().copied().collect();
        let new_args: Vec<ClassId> = new.arg_classes.iter().flatten().copied().collect();
        if old_args.len() == new_args.len() {
            for (&x, &y) in old_args.iter().zip(&new_args) {
                self.class(x, y);
            }
        }

        if !old.is_static() && !new.is_static() {
            self.class(old.owner, new.owner);
            self.methods(&old.hierarchy, &new.hierarchy);
        }
        self.methods(&old.refs_in, &new.refs_in);
        self.methods(&old.refs_out, &new.refs_out);
        self.classes(&old.class_refs, &new.class_refs);
        self.fields(&old.field_reads, &new.field_reads);
        self.fields(&old.field_writes, &new.field_writes);
    }

    fn vote(&mut self, from: impl Into<EntityRef>, to: impl Into<EntityRef>) {
        let (from, to) = (from.into(), to.into());
        if is_active(self.ctx.old, from) && is_active(self.ctx.new, to) {
            self.mappings.map(from, to);
        }
    }

    fn class(&mut self, x: ClassId, y: ClassId) {
        self.vote(x, y);
    }

    fn classes<'s>(
        &mut self,
        xs: impl IntoIterator<Item = &'s ClassId>,
        ys: impl IntoIterator<Item = &'s ClassId>,
    ) {
        let ctx = self.ctx;
        for (x, y) in unique_pairs(xs, ys, |x, y| ctx.classes_compatible(x, y)) {
            self.vote(x, y);
        }
    }

    fn methods<'s>(
        &mut self,
        xs: impl IntoIterator<Item = &'s MethodId>,
        ys: impl IntoIterator<Item = &'s MethodId>,
    ) {
        let ctx = self.ctx;
        for (x, y) in unique_pairs(xs, ys, |x, y| ctx.methods_compatible(x, y)) {
            self.vote(x, y);
        }
    }

    fn fields<'s>(
        &mut self,
        xs: impl IntoIterator<Item = &'s FieldId>,
        ys: impl IntoIterator<Item = &'s FieldId>,
    ) {
        let ctx = self.ctx;
        for (x, y) in unique_pairs(xs, ys, |x, y| ctx.fields_compatible(x, y)) {
            self.vote(x, y);
        }
    }
}

/// Compatible pairs whose members have no other compatible partner on the opposite side.
fn unique_pairs<'s, T: Copy + Ord + 's>(
    xs: impl IntoIterator<Item = &'s T>,
    ys: impl IntoIterator<Item = &'s T>,
    compatible: impl Fn(T, T) -> bool,
) -> Vec<(T, T)> {
    let ys: Vec<T> = ys.into_iter().copied().collect();
    let mut partners: BTreeMap<T, usize> = BTreeMap::new();
    let mut candidates = Vec::new();
    for &x in xs {
        let options: Vec<T> = ys.iter().copied().filter(|&y| compatible(x, y)).collect();
        for &y in &options {
            *partners.entry(y).or_default() += 1;
        }
        if let [only] = options.as_slice() {
            candidates.push((x, *only));
        }
    }
    candidates
        .into_iter()
        .filter(|(_, y)| partners.get(y) == Some(&1))
        .collect()
}

fn is_active(program: &Program, entity: EntityRef) -> bool {
    let owner = match entity {
        EntityRef::Class(id) => id,
        EntityRef::Method(id) => program.method(id).owner,
        EntityRef::Field(id) => program.field(id).owner,
    };
    !program.class(owner).ignored
}

fn instance_fields(program: &Program, fields: &[FieldId]) -> Vec<FieldId> {
    fields.iter().copied().filter(|&f| !program.field(f).is_static()).collect()
}

fn named(program: &Program, methods: &[MethodId], name: &str) -> Vec<MethodId> {
    methods.iter().copied().filter(|&m| program.method(m).name == name).collect()
}
