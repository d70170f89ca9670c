//! I/O boundary traits for testability
//!
//! These traits abstract external lookups, allowing services
//! to be tested with in-memory implementations.

use std::io;
use std::path::Path;

use crate::domain::FieldDef;

/// Field metadata lookup.
pub trait FieldResolver: Send + Sync {
    /// Resolve a (possibly dotted) field path on `model`; None when unknown.
    fn load_field_def(&self, model: &str, path: &str) -> Option<FieldDef>;
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;
}

/// Real filesystem implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}
