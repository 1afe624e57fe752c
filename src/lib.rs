//! Bundle Patcher: ordered text patches for unpacked application trees
//!
//! Rewrites files of an unpacked JavaScript application (for example an
//! extracted `app.asar`) in place, driven by per-file patch tables.
//!
//! # Architecture
//!
//! Every patch is a [`PatchDescriptor`]: a [`PatchKind`] plus a `token` and a
//! `replacement`. [`apply`] runs a list of descriptors over a byte buffer in
//! order and reports the token of the first one that does not match.
//!
//! - `ReplaceOne` swaps the first literal occurrence of the token.
//! - `ExplicitFunction` swaps the `{...}` body of `function <token>(...)`,
//!   found by counting braces with no knowledge of the surrounding syntax.
//!
//! Patch tables are loaded from TOML ([`config`]) and applied to files by
//! [`Patcher`], which never writes a file whose patches did not all match.
//!
//! # Example
//!
//! ```
//! use bundle_patcher::{apply, PatchDescriptor};
//!
//! let mut buffer = b"x; function foo(a,b) { if(a){b();} return 1; } y".to_vec();
//! apply(&mut buffer, &[PatchDescriptor::explicit_function("foo", "{return 0;}")]).unwrap();
//! assert_eq!(buffer, b"x; function foo(a,b) {return 0;} y");
//! ```

pub mod config;
pub mod driver;
pub mod patch;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, FileTable, PatchTables};
pub use driver::{DriverError, FileOutcome, Patcher};
pub use patch::{apply, find_function_body, PatchDescriptor, PatchKind, PatchMiss};
