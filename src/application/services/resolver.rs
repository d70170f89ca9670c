//! Field resolution service
//!
//! Resolves the distinct field paths of a domain as one batch.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::domain::{FieldDef, FieldDefs};
use crate::infrastructure::traits::FieldResolver;

/// Batch front of a [`FieldResolver`].
///
/// Cheap to clone; clones share the underlying resolver.
#[derive(Clone)]
pub struct FieldResolutionService {
    resolver: Arc<dyn FieldResolver>,
    parallel: bool,
}

impl FieldResolutionService {
    pub fn new(resolver: Arc<dyn FieldResolver>) -> Self {
        Self {
            resolver,
            parallel: true,
        }
    }

    /// Issue lookups on the rayon pool instead of one after the other.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Resolve a single path.
    pub fn resolve_one(&self, model: &str, path: &str) -> Option<FieldDef> {
        self.resolver.load_field_def(model, path)
    }

    /// Resolve every path; unresolved paths map to None.
    #[instrument(level = "debug", skip(self, paths), fields(count = paths.len()))]
    pub fn resolve<S: AsRef<str> + Sync>(&self, model: &str, paths: &[S]) -> FieldDefs {
        let lookup = |path: &S| {
            let path = path.as_ref();
            (path.to_string(), self.resolver.load_field_def(model, path))
        };
        let defs: FieldDefs = if self.parallel {
            paths.par_iter().map(lookup).collect()
        } else {
            paths.iter().map(lookup).collect()
        };
        debug!(
            "resolved {}/{} field paths",
            defs.values().filter(|d| d.is_some()).count(),
            defs.len()
        );
        defs
    }
}
