#[allow(dead_code)]
#[path = "../src/test/builder.rs"]
mod builder;

use std::fs;

use builder::{ClassBuilder, Op};
use remapper::prelude::*;

fn greeter(class: &str, method: &str) -> Vec<u8> {
    ClassBuilder::new(class)
        .method(0x0009, method, "()V", |m| {
            m.code(&[Op::Ldc("hello"), Op::Pop, Op::Ldc("world"), Op::Pop, Op::Return])
        })
        .build()
}

#[test]
fn writes_one_file_per_class() {
    let old = Program::from_classes([greeter("com/example/Greeter", "greet")], &[]).unwrap();
    let new = Program::from_classes([greeter("ab", "a")], &[]).unwrap();
    let result = Mapper::run(&old, &new, &MapperConfig::default(), &Classifiers::new());

    let dir = std::env::temp_dir().join(format!("remapper-writer-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    MappingWriter::new(&old, &new, &result).write_to(&dir).unwrap();

    let text = fs::read_to_string(dir.join("com.example.Greeter.mapping")).unwrap();
    assert_eq!(text, "CLASS com/example/Greeter ab\n\tMETHOD STATIC greet a ()V\n");
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn write_to_reports_io_errors() {
    let old = Program::from_classes([greeter("ab", "a")], &[]).unwrap();
    let new = Program::from_classes([greeter("cd", "c")], &[]).unwrap();
    let result = Mapper::run(&old, &new, &MapperConfig::default(), &Classifiers::new());

    // a regular file where the directory should go
    let file = std::env::temp_dir().join(format!("remapper-blocked-{}", std::process::id()));
    fs::write(&file, b"").unwrap();
    assert!(MappingWriter::new(&old, &new, &result).write_to(&file).is_err());
    fs::remove_file(&file).unwrap();
}
