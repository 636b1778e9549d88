//! Mapping text output.
//!
//! One record per class of the new program, with nested member and variable records:
//!
//! ```text
//! CLASS <name> <rawName>
//! 	FIELD [STATIC ]<name> <rawName> <rawDescriptor>
//! 	METHOD [STATIC ]<name> <rawName> <rawDescriptor>
//! 		ARG <index> <name>
//! 		VAR <index> <name>
//! ```
//!
//! `<name>` is the name of the matched old-program entity, or the raw name when the entity has
//! no match. Fields come before methods; within each, static members come first and the rest
//! follow declaration order.

use std::{
    cmp::Ordering,
    fmt::Write as _,
    fs,
    path::Path,
};

use crate::{
    pipeline::MatchResult,
    program::{member_order, ClassId, FieldId, LocalVariable, MethodId, Program},
    Result,
};

/// Renders a [`MatchResult`] in the mapping text format.
///
/// # Examples
///
/// ```rust,no_run
/// use remapper::prelude::*;
///
/// let config = MapperConfig::default();
/// let old = Program::from_path("old.jar", &config.ignore_patterns)?;
/// let new = Program::from_path("new.jar", &config.ignore_patterns)?;
/// let result = Mapper::run(&old, &new, &config, &Classifiers::new());
///
/// MappingWriter::new(&old, &new, &result).write_to("mappings")?;
/// # Ok::<(), remapper::Error>(())
/// ```
pub struct MappingWriter<'a> {
    old: &'a Program,
    new: &'a Program,
    result: &'a MatchResult,
}

impl<'a> MappingWriter<'a> {
    /// A writer for `result`, which must come from matching `old` against `new`.
    #[must_use]
    pub fn new(old: &'a Program, new: &'a Program, result: &'a MatchResult) -> Self {
        MappingWriter { old, new, result }
    }

    /// All records, classes in name order.
    #[must_use]
    pub fn render(&self) -> String {
        self.new
            .active_classes()
            .map(|class| self.render_class(class.id))
            .collect()
    }

    /// The record of one class of the new program.
    #[must_use]
    pub fn render_class(&self, id: ClassId) -> String {
        let class = self.new.class(id);
        let mut out = String::new();
        let _ = writeln!(out, "CLASS {} {}", self.class_name(id), class.name);

        let mut fields = class.fields.clone();
        fields.sort_by(|&a, &b| self.field_order(a, b));
        for field in fields {
            self.render_field(&mut out, field);
        }

        let mut methods = class.methods.clone();
        methods.sort_by(|&a, &b| self.method_order(a, b));
        for method in methods {
            self.render_method(&mut out, method);
        }
        out
    }

    /// Write one `<name>.mapping` file per class into `dir`, creating it if needed.
    ///
    /// The file is named after the mapped class name with `/` replaced by `.`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the directory or a file cannot be written.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut written = 0;
        for class in self.new.active_classes() {
            let file = dir.join(format!("{}.mapping", self.class_name(class.id).replace('/', ".")));
            fs::write(file, self.render_class(class.id))?;
            written += 1;
        }
        log::info!("Wrote {written} mapping files to {}", dir.display());
        Ok(())
    }

    fn class_name(&self, id: ClassId) -> &str {
        match self.result.matches().old_class(id) {
            Some(old) => &self.old.class(old).name,
            None => &self.new.class(id).name,
        }
    }

    fn render_field(&self, out: &mut String, id: FieldId) {
        let field = self.new.field(id);
        let name = match self.result.matches().old_field(id) {
            Some(old) => &self.old.field(old).name,
            None => &field.name,
        };
        let _ = writeln!(
            out,
            "\tFIELD {}{} {} {}",
            static_token(field.is_static()),
            name,
            field.name,
            field.desc
        );
    }

    fn render_method(&self, out: &mut String, id: MethodId) {
        let method = self.new.method(id);
        let old = self.result.matches().old_method(id).map(|old| self.old.method(old));
        let name = old.map_or(method.name.as_str(), |old| old.name.as_str());
        let _ = writeln!(
            out,
            "\tMETHOD {}{} {} {}",
            static_token(method.is_static()),
            name,
            method.name,
            method.desc
        );

        for arg in &method.args {
            let name = variable_name(arg, old.map(|old| old.args.as_slice()));
            let _ = writeln!(out, "\t\tARG {} {}", arg.index, name);
        }
        for local in &method.locals {
            let name = variable_name(local, old.map(|old| old.locals.as_slice()));
            let _ = writeln!(out, "\t\tVAR {} {}", local.index, name);
        }
    }

    fn field_order(&self, a: FieldId, b: FieldId) -> Ordering {
        let (a, b) = (self.new.field(a), self.new.field(b));
        member_order(a.is_static(), a.index, b.is_static(), b.index)
    }

    fn method_order(&self, a: MethodId, b: MethodId) -> Ordering {
        let (a, b) = (self.new.method(a), self.new.method(b));
        member_order(a.is_static(), a.index, b.is_static(), b.index)
    }
}

fn static_token(is_static: bool) -> &'static str {
    if is_static {
        "STATIC "
    } else {
        ""
    }
}

/// The name of the variable at the same position in the matched method, if it has one.
fn variable_name<'v>(variable: &'v LocalVariable, matched: Option<&'v [LocalVariable]>) -> &'v str {
    matched
        .and_then(|vars| vars.iter().find(|v| v.index == variable.index))
        .map_or(variable.name.as_str(), |v| v.name.as_str())
}
