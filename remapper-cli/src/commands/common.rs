use std::path::Path;

use anyhow::Context;
use remapper::program::Program;

/// Load and build a program from a jar, a classfile directory or a single classfile.
pub fn load_program(path: &Path, ignore: &[String]) -> anyhow::Result<Program> {
    Program::from_path(path, ignore)
        .with_context(|| format!("failed to load program: {}", path.display()))
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
