use std::path::Path;

use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, load_program},
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
pub struct ProgramInfo {
    pub name: String,
    pub class_count: usize,
    pub ignored_class_count: usize,
    pub interface_count: usize,
    pub method_count: usize,
    pub static_method_count: usize,
    pub field_count: usize,
    pub static_field_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

pub fn run(path: &Path, ignore: &[String], opts: &GlobalOptions) -> anyhow::Result<()> {
    let program = load_program(path, ignore)?;

    let info = ProgramInfo {
        name: file_display_name(path),
        class_count: program.active_classes().count(),
        ignored_class_count: program.ignored_classes().count(),
        interface_count: program.active_classes().filter(|c| c.is_interface()).count(),
        method_count: program.active_methods().count(),
        static_method_count: program.active_methods().filter(|m| m.is_static()).count(),
        field_count: program.active_fields().count(),
        static_field_count: program.active_fields().filter(|f| f.is_static()).count(),
        ignored: program.ignored_classes().map(|c| c.name.clone()).collect(),
    };

    print_output(&info, opts, |info| {
        println!("Program:     {}", info.name);
        let mut tw = TabWriter::new(vec![
            ("Kind", Align::Left),
            ("Total", Align::Right),
            ("Static", Align::Right),
        ])
        .indent("  ");
        tw.row(vec![
            "classes".to_string(),
            info.class_count.to_string(),
            "-".to_string(),
        ]);
        tw.row(vec![
            "methods".to_string(),
            info.method_count.to_string(),
            info.static_method_count.to_string(),
        ]);
        tw.row(vec![
            "fields".to_string(),
            info.field_count.to_string(),
            info.static_field_count.to_string(),
        ]);
        tw.print();

        println!("Interfaces:  {}", info.interface_count);
        if info.ignored_class_count > 0 {
            println!("Ignored:     {} classes", info.ignored_class_count);
        }
    })
}
