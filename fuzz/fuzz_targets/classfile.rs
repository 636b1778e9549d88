#![no_main]

use libfuzzer_sys::fuzz_target;
use remapper::{classfile::ClassFile, program::Program};

fuzz_target!(|data: &[u8]| {
    if let Ok(class) = ClassFile::parse(data) {
        let _ = Program::from_parsed(vec![class], &[]);
    }
});
