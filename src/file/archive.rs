//! Enumeration of the classfiles inside a program container.
//!
//! A program arrives as a jar (zip) file, as a directory tree of `.class` files, or as a
//! single classfile. [`read_entries`] flattens all three into a list of [`ClassEntry`]
//! values sorted by entry name, so everything downstream is independent of archive order.

use std::{
    ffi::OsStr,
    io::{Cursor, Read},
    path::Path,
};

use crate::{
    file::{File, FileKind},
    Result,
};

/// Raw bytes of one classfile together with the name it had in its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    /// Path of the entry inside its container, `/` separated
    pub name: String,
    /// The classfile bytes
    pub data: Vec<u8>,
}

/// Reads every classfile of the container at `path`.
///
/// Directories are walked recursively and every regular `*.class` file is taken. Any other
/// path is memory mapped and sniffed: zip containers contribute every `.class` file entry
/// outside `META-INF/`, a classfile contributes itself.
///
/// # Errors
/// Returns [`crate::Error::FileError`] on I/O failures, [`crate::Error::Archive`] if the zip
/// container is damaged and [`crate::Error::NotSupported`] for unknown file formats.
pub fn read_entries(path: &Path) -> Result<Vec<ClassEntry>> {
    let mut entries = if path.is_dir() {
        read_dir(path)?
    } else {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        read_file(&File::from_file(path)?, name)?
    };

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!("{}: {} class entries", path.display(), entries.len());
    Ok(entries)
}

/// Reads every classfile of a jar or classfile that is already in memory.
///
/// A lone classfile is named `name`.
///
/// # Errors
/// Same as [`read_entries`], minus the directory walk.
pub fn read_buffer(data: Vec<u8>, name: &str) -> Result<Vec<ClassEntry>> {
    let mut entries = read_file(&File::from_mem(data)?, name.to_string())?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn read_file(file: &File, name: String) -> Result<Vec<ClassEntry>> {
    match file.kind() {
        FileKind::Archive => read_archive(file.data()),
        FileKind::Class => Ok(vec![ClassEntry {
            name,
            data: file.data().to_vec(),
        }]),
    }
}

/// Reads the classfile entries of an in-memory zip container.
///
/// # Errors
/// Returns [`crate::Error::Archive`] if the container is damaged and
/// [`crate::Error::FileError`] if an entry fails to inflate.
pub fn read_archive(data: &[u8]) -> Result<Vec<ClassEntry>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    let mut out = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if !file.is_file() {
            continue;
        }
        let name = file.name().to_owned();

        if !name.ends_with(".class") {
            continue;
        }

        if name.starts_with("META-INF/") {
            log::debug!("Skipping versioned or signed entry {name}");
            continue;
        }

        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut bytes)?;
        out.push(ClassEntry { name, data: bytes });
    }

    Ok(out)
}

fn read_dir(dir: &Path) -> Result<Vec<ClassEntry>> {
    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension() != Some(OsStr::new("class")) {
            continue;
        }

        let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let data = std::fs::read(entry.path())?;
        out.push(ClassEntry { name, data });
    }
    Ok(out)
}
