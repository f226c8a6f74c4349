//! Filesystem provisioning around one document build: where the output
//! goes, what the artifacts are called, and atomic writes of the results.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use super::error::InfraError;

/// Resolved output location for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    pub document_path: PathBuf,
    /// Parent of `document_path`; artifacts live here too.
    pub output_dir: PathBuf,
    /// Sanitized stem used in artifact file names.
    pub document_name: String,
}

impl OutputLocation {
    pub fn for_document(document_path: impl Into<PathBuf>) -> Result<Self, InfraError> {
        let document_path = document_path.into();
        let document_name = document_name_from_output(&document_path).ok_or_else(|| {
            InfraError::configuration(format!(
                "output path `{}` has no usable file name",
                document_path.display()
            ))
        })?;
        let output_dir = match document_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self {
            document_path,
            output_dir,
            document_name,
        })
    }

    pub fn ensure_output_dir(&self) -> Result<(), InfraError> {
        fs::create_dir_all(&self.output_dir).map_err(|err| InfraError::write(&self.output_dir, err))
    }

    pub fn write_document(&self, contents: &str) -> Result<(), InfraError> {
        write_atomically(&self.document_path, contents)
    }
}

/// `"My Page.html"` → `my_page`: anything but alphanumerics, `_` and `-`
/// becomes `_`, then lower-cased.
pub fn document_name_from_output(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    let name: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .to_lowercase();
    (!name.is_empty()).then_some(name)
}

pub fn write_failure_manifest(path: &Path, json: &str) -> Result<(), InfraError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| InfraError::write(parent, err))?;
    }
    write_atomically(path, json)
}

/// Write through a sibling temp file so readers never see a partial file.
fn write_atomically(path: &Path, contents: &str) -> Result<(), InfraError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|err| InfraError::write(path, err))?;
    staged
        .write_all(contents.as_bytes())
        .and_then(|()| staged.flush())
        .map_err(|err| InfraError::write(path, err))?;
    staged
        .persist(path)
        .map_err(|err| InfraError::write(path, err.error))?;
    Ok(())
}
