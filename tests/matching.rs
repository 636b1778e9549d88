//! End-to-end matching over assembled classfiles.

#[allow(dead_code)]
#[path = "../src/test/builder.rs"]
mod builder;

use builder::{ClassBuilder, Op};
use remapper::prelude::*;

const STATIC: u16 = 0x0009;
const PUBLIC: u16 = 0x0001;

fn run(old: &Program, new: &Program) -> MatchResult {
    Mapper::run(old, new, &MapperConfig::default(), &Classifiers::new())
}

fn named_methods(old: &Program, new: &Program, result: &MatchResult) -> Vec<(String, String)> {
    result
        .methods()
        .map(|(a, b)| (old.method(a).name.clone(), new.method(b).name.clone()))
        .collect()
}

fn named_fields(old: &Program, new: &Program, result: &MatchResult) -> Vec<(String, String)> {
    result
        .fields()
        .map(|(a, b)| (old.field(a).name.clone(), new.field(b).name.clone()))
        .collect()
}

fn two_literals(class: &str, method: &str) -> Program {
    let bytes = ClassBuilder::new(class)
        .method(STATIC, method, "()V", |m| {
            m.code(&[Op::Ldc("hello"), Op::Pop, Op::Ldc("world"), Op::Pop, Op::Return])
        })
        .build();
    Program::from_classes([bytes], &[]).unwrap()
}

#[test]
fn static_method_then_class() {
    let old = two_literals("ab", "foo");
    let new = two_literals("cd", "bar");
    let result = run(&old, &new);

    let (old_method, new_method) = (old.methods()[0].id, new.methods()[0].id);
    assert_eq!(result.methods().collect::<Vec<_>>(), vec![(old_method, new_method)]);

    let mapping = result
        .mappings()
        .get(EntityRef::from(old_method), EntityRef::from(new_method))
        .unwrap();
    assert_eq!(mapping.weight, 100);
    assert!(mapping.score >= 1);

    let (old_class, new_class) = (old.classes()[0].id, new.classes()[0].id);
    assert_eq!(result.classes().collect::<Vec<_>>(), vec![(old_class, new_class)]);
}

#[test]
fn indistinguishable_methods_stay_unmapped() {
    let program = |class: &str, names: [&str; 2]| {
        let mut builder = ClassBuilder::new(class);
        for name in names {
            builder = builder.method(STATIC, name, "()V", |m| {
                m.code(&[Op::Ldc("same"), Op::Pop, Op::Return])
            });
        }
        Program::from_classes([builder.build()], &[]).unwrap()
    };
    let old = program("aa", ["a", "b"]);
    let new = program("bb", ["c", "d"]);
    let result = run(&old, &new);

    assert_eq!(result.methods().count(), 0);
    assert_eq!(result.counts().0, 1);
}

fn field_getters(class: &str, names: [&str; 2]) -> Program {
    let mut builder = ClassBuilder::new(class).field(0x0000, "x", "I", |f| f);
    for name in names {
        builder = builder.method(PUBLIC, name, "()I", |m| {
            m.code(&[Op::Aload(0), Op::GetField(class, "x", "I"), Op::Insn(0xac)])
        });
    }
    Program::from_classes([builder.build()], &[]).unwrap()
}

#[test]
fn indistinguishable_getters_stay_unmapped() {
    let old = field_getters("aa", ["a", "b"]);
    let new = field_getters("bb", ["c", "d"]);

    for propagate in [true, false] {
        let config = MapperConfig::default().with_propagation(propagate);
        let result = Mapper::run(&old, &new, &config, &Classifiers::new());
        assert!(named_methods(&old, &new, &result).is_empty());
        assert_eq!(result.counts(), (1, 0, 1));
    }
}

/// Two int fields told apart only by which matched method reads or writes them.
fn field_users(class: &str, names: [&str; 4], read: &str, written: &str) -> Program {
    let [first, second, reader, writer] = names;
    let bytes = ClassBuilder::new(class)
        .field(STATIC, first, "I", |f| f)
        .field(STATIC, second, "I", |f| f)
        .method(STATIC, reader, "()V", |m| {
            m.code(&[
                Op::Ldc("one"),
                Op::Pop,
                Op::GetStatic(class, read, "I"),
                Op::Pop,
                Op::Return,
            ])
        })
        .method(STATIC, writer, "()V", |m| {
            m.code(&[
                Op::Ldc("two"),
                Op::Pop,
                Op::Iconst(1),
                Op::PutStatic(class, written, "I"),
                Op::Return,
            ])
        })
        .build();
    Program::from_classes([bytes], &[]).unwrap()
}

#[test]
fn fields_follow_matched_referrers() {
    let old = field_users("aa", ["a", "b", "c", "d"], "a", "b");
    let new = field_users("bb", ["e", "f", "g", "h"], "f", "e");
    let result = run(&old, &new);

    assert_eq!(
        named_methods(&old, &new, &result),
        vec![("c".to_string(), "g".to_string()), ("d".to_string(), "h".to_string())]
    );
    assert_eq!(
        named_fields(&old, &new, &result),
        vec![("a".to_string(), "f".to_string()), ("b".to_string(), "e".to_string())]
    );
}

fn sample_program() -> Program {
    let base = ClassBuilder::new("app/Base")
        .field(PUBLIC, "count", "I", |f| f)
        .method(PUBLIC, "<init>", "()V", |m| {
            m.code(&[
                Op::Aload(0),
                Op::InvokeSpecial("java/lang/Object", "<init>", "()V"),
                Op::Return,
            ])
        })
        .method(PUBLIC, "run", "()V", |m| {
            m.code(&[Op::Ldc("base"), Op::Pop, Op::Return])
        })
        .build();
    let child = ClassBuilder::new("app/Child")
        .super_name("app/Base")
        .method(PUBLIC, "<init>", "()V", |m| {
            m.code(&[
                Op::Aload(0),
                Op::InvokeSpecial("app/Base", "<init>", "()V"),
                Op::Return,
            ])
        })
        .method(PUBLIC, "run", "()V", |m| {
            m.code(&[
                Op::Aload(0),
                Op::InvokeSpecial("app/Base", "run", "()V"),
                Op::Return,
            ])
        })
        .method(STATIC, "create", "()Lapp/Child;", |m| {
            m.code(&[
                Op::New("app/Child"),
                Op::Insn(0x59),
                Op::InvokeSpecial("app/Child", "<init>", "()V"),
                Op::Insn(0xb0),
            ])
        })
        .build();
    let obfuscated = ClassBuilder::new("ab")
        .field(STATIC, "a", "I", |f| f.constant_int(1))
        .field(STATIC, "b", "I", |f| f.constant_int(2))
        .method(STATIC, "c", "()V", |m| m.code(&[Op::Ldc("x"), Op::Pop, Op::Return]))
        .method(STATIC, "d", "()V", |m| m.code(&[Op::Ldc("x"), Op::Pop, Op::Return]))
        .build();
    Program::from_classes([base, child, obfuscated], &[]).unwrap()
}

#[test]
fn identical_programs_match_themselves() {
    let old = sample_program();
    let new = sample_program();
    let result = run(&old, &new);

    let matched = result.old_to_new();
    let total = old.classes().len() + old.methods().len() + old.fields().len();
    assert_eq!(matched.len(), total);
    for (a, b) in matched {
        assert_eq!(old.id_string(a), new.id_string(b));
    }
}

#[test]
fn runs_are_deterministic() {
    let old = field_users("aa", ["a", "b", "c", "d"], "a", "b");
    let new = field_users("bb", ["e", "f", "g", "h"], "f", "e");

    let first = run(&old, &new);
    let second = run(&old, &new);
    assert_eq!(first.old_to_new(), second.old_to_new());
    assert_eq!(first.mappings(), second.mappings());
}

#[test]
fn matches_are_one_to_one() {
    let old = sample_program();
    let new = field_users("bb", ["e", "f", "g", "h"], "f", "e");
    let result = run(&old, &new);

    let mut seen_old = std::collections::BTreeSet::new();
    let mut seen_new = std::collections::BTreeSet::new();
    for mapping in result.mappings().iter() {
        assert!(seen_old.insert(mapping.from));
        assert!(seen_new.insert(mapping.to));
    }
    assert_eq!(result.old_to_new().len(), result.new_to_old().len());
}

#[test]
fn propagation_can_be_disabled() {
    let old = two_literals("ab", "foo");
    let new = two_literals("cd", "bar");
    let config = MapperConfig::default().with_propagation(false);
    let result = Mapper::run(&old, &new, &config, &Classifiers::new());
    assert_eq!(result.counts(), (1, 1, 0));
}
