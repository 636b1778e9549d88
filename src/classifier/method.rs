use crate::{
    classfile::MethodAccessFlags,
    classifier::{compare_flags, flag, Classifier, Feature},
    program::MethodId,
    similarity::{compare_instructions, compare_ranges, compare_sets, MatchContext},
};

pub(crate) fn static_classifier() -> Classifier<MethodId> {
    Classifier::new(vec![
        Feature::initial("kind", 10, kind),
        Feature::initial("access", 4, static_access),
        Feature::initial("arg types", 10, arg_types),
        Feature::initial("return type", 5, return_type),
        Feature::initial("strings", 5, strings),
        Feature::initial("numbers", 5, numbers),
        Feature::initial("class refs", 3, class_refs),
        Feature::initial("in refs", 6, in_refs),
        Feature::initial("out refs", 6, out_refs),
        Feature::initial("field reads", 5, field_reads),
        Feature::initial("field writes", 5, field_writes),
        Feature::initial("line range", 8, line_range),
        Feature::secondary("code", 12, code),
        Feature::secondary("raw name", 1, raw_name),
    ])
}

pub(crate) fn instance_classifier() -> Classifier<MethodId> {
    Classifier::new(vec![
        Feature::initial("kind", 10, kind),
        Feature::initial("access", 4, instance_access),
        Feature::initial("arg types", 10, arg_types),
        Feature::initial("return type", 5, return_type),
        Feature::initial("owner", 8, owner),
        Feature::initial("hierarchy", 6, hierarchy),
        Feature::initial("strings", 5, strings),
        Feature::initial("numbers", 5, numbers),
        Feature::initial("class refs", 3, class_refs),
        Feature::initial("in refs", 6, in_refs),
        Feature::initial("out refs", 6, out_refs),
        Feature::initial("field reads", 5, field_reads),
        Feature::initial("field writes", 5, field_writes),
        Feature::initial("line range", 3, line_range),
        Feature::secondary("code", 12, code),
        Feature::secondary("raw name", 1, raw_name),
    ])
}

const VISIBILITY_AND_MODIFIERS: MethodAccessFlags = MethodAccessFlags::PUBLIC
    .union(MethodAccessFlags::PROTECTED)
    .union(MethodAccessFlags::PRIVATE)
    .union(MethodAccessFlags::FINAL)
    .union(MethodAccessFlags::SYNCHRONIZED)
    .union(MethodAccessFlags::BRIDGE)
    .union(MethodAccessFlags::VARARGS)
    .union(MethodAccessFlags::STRICT)
    .union(MethodAccessFlags::SYNTHETIC);

fn access_bits(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> (u32, u32) {
    (
        ctx.old.method(a).access.bits(),
        ctx.new.method(b).access.bits(),
    )
}

fn kind(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    let mask = MethodAccessFlags::STATIC | MethodAccessFlags::NATIVE | MethodAccessFlags::ABSTRACT;
    let (x, y) = access_bits(ctx, a, b);
    compare_flags(x, y, mask.bits())
}

fn static_access(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    let mask = VISIBILITY_AND_MODIFIERS | MethodAccessFlags::STATIC;
    let (x, y) = access_bits(ctx, a, b);
    compare_flags(x, y, mask.bits())
}

fn instance_access(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    let (x, y) = access_bits(ctx, a, b);
    compare_flags(x, y, VISIBILITY_AND_MODIFIERS.bits())
}

fn arg_types(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    ctx.compare_types(
        &ctx.old.method(a).descriptor.args,
        &ctx.new.method(b).descriptor.args,
    )
}

fn return_type(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    flag(ctx.types_compatible(
        &ctx.old.method(a).descriptor.ret,
        &ctx.new.method(b).descriptor.ret,
    ))
}

fn owner(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    flag(ctx.classes_compatible(ctx.old.method(a).owner, ctx.new.method(b).owner))
}

fn hierarchy(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    ctx.compare_methods(
        ctx.old.method(a).hierarchy.iter().copied(),
        ctx.new.method(b).hierarchy.iter().copied(),
    )
}

fn strings(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    compare_sets(&ctx.old.method(a).strings, &ctx.new.method(b).strings)
}

fn numbers(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    compare_sets(&ctx.old.method(a).numbers, &ctx.new.method(b).numbers)
}

fn class_refs(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    ctx.compare_classes(
        ctx.old.method(a).class_refs.iter().copied(),
        ctx.new.method(b).class_refs.iter().copied(),
    )
}

fn in_refs(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    ctx.compare_methods(
        ctx.old.method(a).refs_in.iter().copied(),
        ctx.new.method(b).refs_in.iter().copied(),
    )
}

fn out_refs(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    ctx.compare_methods(
        ctx.old.method(a).refs_out.iter().copied(),
        ctx.new.method(b).refs_out.iter().copied(),
    )
}

fn field_reads(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    ctx.compare_fields(
        ctx.old.method(a).field_reads.iter().copied(),
        ctx.new.method(b).field_reads.iter().copied(),
    )
}

fn field_writes(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    ctx.compare_fields(
        ctx.old.method(a).field_writes.iter().copied(),
        ctx.new.method(b).field_writes.iter().copied(),
    )
}

fn line_range(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    compare_ranges(ctx.old.method(a).line_range, ctx.new.method(b).line_range)
}

fn code(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    compare_instructions(ctx, a, b)
}

fn raw_name(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    flag(ctx.old.method(a).name == ctx.new.method(b).name)
}
