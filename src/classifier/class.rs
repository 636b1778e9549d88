use std::collections::BTreeSet;

use crate::{
    classfile::{ClassAccessFlags, Type},
    classifier::{compare_flags, flag, Classifier, Feature},
    program::{ClassEntity, ClassId},
    similarity::{compare_counts, compare_sets, is_obfuscated_name, simple_name, MatchContext},
};

pub(crate) fn classifier() -> Classifier<ClassId> {
    Classifier::new(vec![
        Feature::initial("type kind", 20, type_kind),
        Feature::initial("name", 10, name),
        Feature::initial("signature", 5, signature),
        Feature::initial("super name", 5, super_name),
        Feature::initial("interface names", 5, interface_names),
        Feature::initial("parent", 8, parent),
        Feature::initial("children", 8, children),
        Feature::initial("interfaces", 8, interfaces),
        Feature::initial("implementers", 8, implementers),
        Feature::initial("depth", 5, depth),
        Feature::initial("method count", 3, method_count),
        Feature::initial("field count", 3, field_count),
        Feature::initial("strings", 8, strings),
        Feature::initial("numbers", 6, numbers),
        Feature::initial("method type refs", 5, method_type_refs),
        Feature::initial("field type refs", 5, field_type_refs),
        Feature::initial("in refs", 4, in_refs),
        Feature::initial("out refs", 4, out_refs),
        Feature::initial("method in refs", 4, method_in_refs),
        Feature::initial("method out refs", 4, method_out_refs),
        Feature::initial("field read refs", 4, field_read_refs),
        Feature::initial("field write refs", 4, field_write_refs),
        Feature::secondary("raw name", 1, raw_name),
    ])
}

fn type_kind(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    let mask = ClassAccessFlags::ENUM
        | ClassAccessFlags::INTERFACE
        | ClassAccessFlags::ANNOTATION
        | ClassAccessFlags::RECORD
        | ClassAccessFlags::ABSTRACT;
    compare_flags(
        ctx.old.class(a).access.bits(),
        ctx.new.class(b).access.bits(),
        mask.bits(),
    )
}

fn name(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    let (a, b) = (&ctx.old.class(a).name, &ctx.new.class(b).name);
    flag(!is_obfuscated_name(simple_name(a)) && !is_obfuscated_name(simple_name(b)) && a == b)
}

fn signature(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    flag(ctx.classes_compatible(a, b))
}

fn super_name(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    let object = |name: &Option<String>| name.as_ref().map(|n| Type::Object(n.clone()));
    match (object(&ctx.old.class(a).super_name), object(&ctx.new.class(b).super_name)) {
        (Some(x), Some(y)) => flag(ctx.types_compatible(&x, &y)),
        (None, None) => 1.0,
        _ => 0.0,
    }
}

fn interface_names(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    let names = |class: &ClassEntity| -> BTreeSet<String> {
        class.interface_names.iter().cloned().collect()
    };
    compare_sets(&names(ctx.old.class(a)), &names(ctx.new.class(b)))
}

fn parent(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    match (ctx.old.class(a).parent, ctx.new.class(b).parent) {
        (None, None) => 1.0,
        (Some(x), Some(y)) => flag(ctx.classes_compatible(x, y)),
        _ => 0.0,
    }
}

fn children(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_classes(
        ctx.old.class(a).children.iter().copied(),
        ctx.new.class(b).children.iter().copied(),
    )
}

fn interfaces(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_classes(
        ctx.old.class(a).interfaces.iter().copied(),
        ctx.new.class(b).interfaces.iter().copied(),
    )
}

fn implementers(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_classes(
        ctx.old.class(a).implementers.iter().copied(),
        ctx.new.class(b).implementers.iter().copied(),
    )
}

fn depth(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    compare_counts(ctx.old.class(a).depth, ctx.new.class(b).depth)
}

fn method_count(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    compare_counts(ctx.old.class(a).methods.len(), ctx.new.class(b).methods.len())
}

fn field_count(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    compare_counts(ctx.old.class(a).fields.len(), ctx.new.class(b).fields.len())
}

fn strings(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    compare_sets(&ctx.old.class(a).strings, &ctx.new.class(b).strings)
}

fn numbers(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    compare_sets(&ctx.old.class(a).numbers, &ctx.new.class(b).numbers)
}

fn method_type_refs(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_methods(
        ctx.old.class(a).method_type_refs.iter().copied(),
        ctx.new.class(b).method_type_refs.iter().copied(),
    )
}

fn field_type_refs(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_fields(
        ctx.old.class(a).field_type_refs.iter().copied(),
        ctx.new.class(b).field_type_refs.iter().copied(),
    )
}

fn in_refs(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_classes(
        ctx.old.class(a).ref_classes_in.iter().copied(),
        ctx.new.class(b).ref_classes_in.iter().copied(),
    )
}

fn out_refs(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_classes(
        ctx.old.class(a).ref_classes_out.iter().copied(),
        ctx.new.class(b).ref_classes_out.iter().copied(),
    )
}

fn method_in_refs(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_methods(
        ctx.old.class(a).method_refs_in.iter().copied(),
        ctx.new.class(b).method_refs_in.iter().copied(),
    )
}

fn method_out_refs(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_methods(
        ctx.old.class(a).method_refs_out.iter().copied(),
        ctx.new.class(b).method_refs_out.iter().copied(),
    )
}

fn field_read_refs(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_fields(
        ctx.old.class(a).field_reads.iter().copied(),
        ctx.new.class(b).field_reads.iter().copied(),
    )
}

fn field_write_refs(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    ctx.compare_fields(
        ctx.old.class(a).field_writes.iter().copied(),
        ctx.new.class(b).field_writes.iter().copied(),
    )
}

fn raw_name(ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
    flag(ctx.old.class(a).name == ctx.new.class(b).name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classifier::Level, engine::Matches, program::Program, test::builder::ClassBuilder,
    };

    #[test]
    fn identical_class_scores_full() {
        let program = Program::from_classes(
            [
                ClassBuilder::new("Base")
                    .method(0x0001, "<init>", "()V", |m| m)
                    .build(),
                ClassBuilder::new("ab")
                    .super_name("Base")
                    .field(0x0002, "x", "I", |f| f)
                    .build(),
            ],
            &[],
        )
        .unwrap();
        let matches = Matches::new();
        let ctx = MatchContext::new(&program, &program, &matches);
        let classifier = classifier();
        let ab = program.class_by_name("ab").unwrap();

        // every feature but the name of an obfuscated class is perfect
        let score = classifier.score(&ctx, Level::Initial, ab, ab);
        assert_eq!(score, f64::from(classifier.total_weight(Level::Initial) - 10));
        assert_eq!(raw_name(&ctx, ab, ab), 1.0);
    }

    #[test]
    fn packaged_obfuscated_names_earn_no_credit() {
        let program = Program::from_classes(
            [
                ClassBuilder::new("com/x/a").build(),
                ClassBuilder::new("com/x/Config").build(),
            ],
            &[],
        )
        .unwrap();
        let matches = Matches::new();
        let ctx = MatchContext::new(&program, &program, &matches);
        let short = program.class_by_name("com/x/a").unwrap();
        let config = program.class_by_name("com/x/Config").unwrap();

        assert_eq!(name(&ctx, short, short), 0.0);
        assert_eq!(name(&ctx, config, config), 1.0);
    }

    #[test]
    fn kinds_and_parents_differ() {
        let old = Program::from_classes(
            [
                ClassBuilder::new("Base").build(),
                ClassBuilder::new("ab").super_name("Base").build(),
            ],
            &[],
        )
        .unwrap();
        let new = Program::from_classes(
            [ClassBuilder::new("cd").access(0x0601).build()],
            &[],
        )
        .unwrap();
        let matches = Matches::new();
        let ctx = MatchContext::new(&old, &new, &matches);
        let ab = old.class_by_name("ab").unwrap();
        let cd = new.class_by_name("cd").unwrap();

        // interface and abstract differ: 2 of 5 bits
        assert!((type_kind(&ctx, ab, cd) - 0.6).abs() < 1e-12);
        assert_eq!(parent(&ctx, ab, cd), 0.0);
        assert_eq!(depth(&ctx, ab, cd), 0.0);
        assert_eq!(super_name(&ctx, ab, cd), 0.0);
    }
}
