use crate::{
    classfile::FieldAccessFlags,
    classifier::{compare_flags, flag, Classifier, Feature},
    program::{FieldId, Program},
    similarity::{compare_positions, MatchContext},
};

pub(crate) fn classifier() -> Classifier<FieldId> {
    Classifier::new(vec![
        Feature::initial("kind", 10, kind),
        Feature::initial("access", 4, access),
        Feature::initial("type", 10, field_type),
        Feature::initial("read refs", 6, read_refs),
        Feature::initial("write refs", 6, write_refs),
        Feature::initial("initial value", 7, initial_value),
        Feature::secondary("initializer index", 8, initializer_index),
        Feature::secondary("raw name", 1, raw_name),
    ])
}

fn kind(ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
    flag(ctx.old.field(a).is_static() == ctx.new.field(b).is_static())
}

fn access(ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
    let mask = FieldAccessFlags::PUBLIC
        | FieldAccessFlags::PROTECTED
        | FieldAccessFlags::PRIVATE
        | FieldAccessFlags::FINAL
        | FieldAccessFlags::VOLATILE
        | FieldAccessFlags::TRANSIENT
        | FieldAccessFlags::SYNTHETIC;
    compare_flags(
        ctx.old.field(a).access.bits(),
        ctx.new.field(b).access.bits(),
        mask.bits(),
    )
}

fn field_type(ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
    flag(ctx.types_compatible(&ctx.old.field(a).ty, &ctx.new.field(b).ty))
}

fn read_refs(ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
    ctx.compare_methods(
        ctx.old.field(a).read_refs.iter().copied(),
        ctx.new.field(b).read_refs.iter().copied(),
    )
}

fn write_refs(ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
    ctx.compare_methods(
        ctx.old.field(a).write_refs.iter().copied(),
        ctx.new.field(b).write_refs.iter().copied(),
    )
}

fn initial_value(ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
    match (&ctx.old.field(a).value, &ctx.new.field(b).value) {
        (None, None) => 1.0,
        (Some(x), Some(y)) => flag(x == y),
        _ => 0.0,
    }
}

fn initializer_index(ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
    let (field_a, field_b) = (ctx.old.field(a), ctx.new.field(b));
    compare_positions(
        field_a.initializer_index,
        initialized_siblings(ctx.old, a),
        field_b.initializer_index,
        initialized_siblings(ctx.new, b),
    )
}

fn initialized_siblings(program: &Program, field: FieldId) -> usize {
    let owner = program.field(field).owner;
    program
        .class(owner)
        .fields
        .iter()
        .filter(|&&f| program.field(f).initializer_index.is_some())
        .count()
}

fn raw_name(ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
    flag(ctx.old.field(a).name == ctx.new.field(b).name)
}
