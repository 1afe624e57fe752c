use crate::config::{FileTable, PatchTables};
use crate::patch;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Terminal failures of a patch run. The messages are what the binary prints.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Unpacked game directory not found")]
    MissingRoot(PathBuf),

    #[error("Unable to read contents of file:({})", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Unable to apply all patches to file:({}), token:({token})", .path.display())]
    PatchMiss { path: PathBuf, token: String },

    #[error("Unable to write contents of file:({})", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file that had every patch in its table applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub patches: usize,
}

/// Applies patch tables to files below an unpacked application root.
#[derive(Debug, Clone)]
pub struct Patcher {
    root: PathBuf,
    dry_run: bool,
}

impl Patcher {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DriverError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DriverError::MissingRoot(root));
        }
        Ok(Self {
            root,
            dry_run: false,
        })
    }

    /// Match and apply patches in memory without writing anything back.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Patch one file. A buffer that misses a patch is never written.
    pub fn patch_file(&self, table: &FileTable) -> Result<FileOutcome, DriverError> {
        let path = table.resolve(&self.root);

        let mut contents = match fs::read(&path) {
            Ok(contents) if !contents.is_empty() => contents,
            Ok(_) => return Err(DriverError::Unreadable { path, source: None }),
            Err(source) => {
                return Err(DriverError::Unreadable {
                    path,
                    source: Some(source),
                })
            }
        };

        let descriptors = table.descriptors();
        if let Err(miss) = patch::apply(&mut contents, &descriptors) {
            return Err(DriverError::PatchMiss {
                token: miss.token.to_string(),
                path,
            });
        }

        if !self.dry_run {
            if let Err(source) = fs::write(&path, &contents) {
                return Err(DriverError::Write { path, source });
            }
        }

        Ok(FileOutcome {
            path,
            patches: descriptors.len(),
        })
    }

    /// Patch every file in table order, stopping at the first failure.
    ///
    /// Files patched before a failure stay patched on disk.
    pub fn run(&self, tables: &PatchTables) -> Result<Vec<FileOutcome>, DriverError> {
        let mut outcomes = Vec::with_capacity(tables.files.len());
        for table in &tables.files {
            let outcome = self.patch_file(table)?;
            // Exact status text, never coloured.
            if self.dry_run {
                println!("Checked file:({})", outcome.path.display());
            } else {
                println!("Patched file:({})", outcome.path.display());
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
