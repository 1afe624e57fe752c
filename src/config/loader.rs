use crate::config::schema::{PatchTables, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Why a set of patch tables could not be loaded.
///
/// The message names the stage that failed; the underlying error is kept as
/// the source.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read patch tables {}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("patch tables{} are not valid TOML", describe(.path))]
    Malformed {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },

    #[error("patch tables{} failed validation", describe(.path))]
    Invalid {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

fn describe(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" {}", path.display()),
        None => String::new(),
    }
}

impl ConfigError {
    /// Name the file the tables came from, when parsing did not know it.
    fn in_file(mut self, file: &Path) -> Self {
        if let ConfigError::Malformed { path, .. } | ConfigError::Invalid { path, .. } = &mut self {
            path.get_or_insert_with(|| file.to_path_buf());
        }
        self
    }
}

impl FromStr for PatchTables {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let tables: PatchTables = toml_edit::de::from_str(input)
            .map_err(|source| ConfigError::Malformed { path: None, source })?;
        tables
            .validate()
            .map_err(|source| ConfigError::Invalid { path: None, source })?;
        Ok(tables)
    }
}

pub fn load_from_str(input: &str) -> Result<PatchTables, ConfigError> {
    input.parse()
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchTables, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    contents
        .parse()
        .map_err(|error: ConfigError| error.in_file(path))
}
