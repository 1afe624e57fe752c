use crate::patch::{PatchDescriptor, PatchKind};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A set of per-file patch lists, in the order they are applied.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchTables {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub files: Vec<FileTable>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Patches targeting one file, relative to the unpacked root.
#[derive(Debug, Deserialize, Clone)]
pub struct FileTable {
    /// `/`-separated path below the root.
    pub path: String,
    #[serde(default)]
    pub patches: Vec<PatchEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchEntry {
    pub kind: PatchEntryKind,
    pub token: String,
    pub replacement: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PatchEntryKind {
    ReplaceOne,
    ExplicitFunction,
}

impl From<PatchEntryKind> for PatchKind {
    fn from(kind: PatchEntryKind) -> Self {
        match kind {
            PatchEntryKind::ReplaceOne => PatchKind::ReplaceOne,
            PatchEntryKind::ExplicitFunction => PatchKind::ExplicitFunction,
        }
    }
}

impl PatchEntry {
    pub fn descriptor(&self) -> PatchDescriptor<'_> {
        PatchDescriptor {
            kind: self.kind.into(),
            token: &self.token,
            replacement: &self.replacement,
        }
    }
}

impl FileTable {
    /// Descriptors borrowing from this table, in file order.
    pub fn descriptors(&self) -> Vec<PatchDescriptor<'_>> {
        self.patches.iter().map(PatchEntry::descriptor).collect()
    }

    /// Join the relative path onto `root` one component at a time.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        self.path
            .split('/')
            .filter(|component| !component.is_empty() && *component != ".")
            .fold(root.to_path_buf(), |path, component| path.join(component))
    }
}

impl PatchTables {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.files.is_empty() {
            issues.push(ValidationIssue::EmptyFileList);
        }

        for file in &self.files {
            if let Some(message) = path_problem(&file.path) {
                issues.push(ValidationIssue::InvalidPath {
                    path: file.path.clone(),
                    message,
                });
            }

            if file.patches.is_empty() {
                issues.push(ValidationIssue::EmptyPatchList {
                    path: file.path.clone(),
                });
            }

            for (index, patch) in file.patches.iter().enumerate() {
                let location = PatchLocation {
                    path: file.path.clone(),
                    index,
                };

                if patch.token.is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        location: location.clone(),
                        field: "token",
                    });
                }

                if patch.kind != PatchEntryKind::ExplicitFunction {
                    continue;
                }

                if !patch.token.is_empty() && !is_identifier(&patch.token) {
                    issues.push(ValidationIssue::InvalidCombo {
                        location: location.clone(),
                        message: format!(
                            "explicit-function token '{}' is not a function name",
                            patch.token
                        ),
                    });
                }
                if !(patch.replacement.starts_with('{') && patch.replacement.ends_with('}')) {
                    issues.push(ValidationIssue::InvalidCombo {
                        location,
                        message: "explicit-function replacement must start with '{' and end with '}'"
                            .to_string(),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn path_problem(path: &str) -> Option<String> {
    if path.trim().is_empty() {
        return Some("path is empty".to_string());
    }
    if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
        return Some("path must be relative to the unpacked root".to_string());
    }
    if path.split(['/', '\\']).any(|component| component == "..") {
        return Some("path must not leave the unpacked root".to_string());
    }
    None
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Every problem found in a set of patch tables, one per line when displayed.
#[derive(Error, Debug, Clone)]
#[error("{}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A patch by its file and position in that file's list, e.g. `a.js#2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLocation {
    pub path: String,
    pub index: usize,
}

impl fmt::Display for PatchLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.path, self.index)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("patch tables contain no files")]
    EmptyFileList,

    #[error("file '{path}' has no patches")]
    EmptyPatchList { path: String },

    #[error("file '{path}' has an invalid path: {message}")]
    InvalidPath { path: String, message: String },

    #[error("patch '{location}' missing required field '{field}'")]
    MissingField {
        location: PatchLocation,
        field: &'static str,
    },

    #[error("patch '{location}' has invalid configuration: {message}")]
    InvalidCombo {
        location: PatchLocation,
        message: String,
    },
}
