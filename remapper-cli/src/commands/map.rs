use std::path::Path;

use anyhow::Context;
use remapper::{
    classifier::Classifiers,
    pipeline::{Mapper, MapperConfig},
    writer::MappingWriter,
};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, load_program},
    output::{print_output, Align, TabWriter},
};

pub struct MapOptions<'a> {
    pub output: Option<&'a Path>,
    pub ignore: &'a [String],
    pub propagate: bool,
    pub parallel: bool,
    pub global: &'a GlobalOptions,
}

#[derive(Debug, Serialize)]
pub struct MapReport {
    pub old: String,
    pub new: String,
    pub kinds: Vec<KindReport>,
    pub rounds: usize,
    pub elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KindReport {
    pub kind: &'static str,
    pub matched: usize,
    pub old: usize,
    pub new: usize,
}

fn build_config(opts: &MapOptions<'_>) -> MapperConfig {
    let mut config = MapperConfig::default()
        .with_propagation(opts.propagate)
        .with_parallel(opts.parallel);
    if !opts.ignore.is_empty() {
        config = config.with_ignore_patterns(opts.ignore.iter().cloned());
    }
    config
}

pub fn run(old_path: &Path, new_path: &Path, opts: &MapOptions<'_>) -> anyhow::Result<()> {
    let config = build_config(opts);
    let old = load_program(old_path, &config.ignore_patterns)?;
    let new = load_program(new_path, &config.ignore_patterns)?;

    let result = Mapper::run(&old, &new, &config, &Classifiers::new());

    if let Some(dir) = opts.output {
        MappingWriter::new(&old, &new, &result)
            .write_to(dir)
            .with_context(|| format!("failed to write mappings: {}", dir.display()))?;
    }

    let (classes, methods, fields) = result.counts();
    let report = MapReport {
        old: file_display_name(old_path),
        new: file_display_name(new_path),
        kinds: vec![
            KindReport {
                kind: "classes",
                matched: classes,
                old: old.active_classes().count(),
                new: new.active_classes().count(),
            },
            KindReport {
                kind: "methods",
                matched: methods,
                old: old.active_methods().count(),
                new: new.active_methods().count(),
            },
            KindReport {
                kind: "fields",
                matched: fields,
                old: old.active_fields().count(),
                new: new.active_fields().count(),
            },
        ],
        rounds: result.rounds(),
        elapsed_ms: result.elapsed().as_millis(),
        output: opts.output.map(|dir| dir.display().to_string()),
    };

    print_output(&report, opts.global, |report| {
        println!("Matched {} -> {}", report.old, report.new);
        let mut tw = TabWriter::new(vec![
            ("Kind", Align::Left),
            ("Matched", Align::Right),
            ("Old", Align::Right),
            ("New", Align::Right),
            ("Coverage", Align::Right),
        ])
        .indent("  ");
        for kind in &report.kinds {
            tw.row(vec![
                kind.kind.to_string(),
                kind.matched.to_string(),
                kind.old.to_string(),
                kind.new.to_string(),
                coverage(kind.matched, kind.new),
            ]);
        }
        tw.print();
        println!("Rounds:   {} in {} ms", report.rounds, report.elapsed_ms);
        if let Some(dir) = &report.output {
            println!("Written:  {dir}");
        }
    })
}

fn coverage(matched: usize, total: usize) -> String {
    if total == 0 {
        "-".to_string()
    } else {
        #[allow(clippy::cast_precision_loss)]
        let percent = matched as f64 * 100.0 / total as f64;
        format!("{percent:.1}%")
    }
}
