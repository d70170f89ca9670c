//! Service container for dependency injection
//!
//! Wires up services from settings.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{DomainEditor, FieldResolutionService};
use crate::application::ApplicationError;
use crate::config::Settings;
use crate::infrastructure::catalog::ModelCatalog;
use crate::infrastructure::traits::{FieldResolver, FileSystem, RealFileSystem};
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding the application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Field metadata source
    pub resolver: Arc<dyn FieldResolver>,
}

impl ServiceContainer {
    /// Create a container backed by the configured catalog file.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let path = settings.catalog.clone().ok_or_else(|| {
            InfraError::Application(ApplicationError::Config {
                message: "no model catalog configured: pass --catalog or set `catalog`".into(),
            })
        })?;
        debug!("loading catalog {}", path.display());
        let catalog = ModelCatalog::load(fs.as_ref(), &path)?;
        Ok(Self::with_deps(settings, fs, Arc::new(catalog)))
    }

    /// Create a container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        resolver: Arc<dyn FieldResolver>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
            resolver,
        }
    }

    pub fn resolution_service(&self) -> FieldResolutionService {
        FieldResolutionService::new(self.resolver.clone()).parallel(self.settings.resolver.parallel)
    }

    /// Editor session on the configured model.
    pub fn editor(&self) -> InfraResult<DomainEditor> {
        let model = self
            .settings
            .model
            .clone()
            .ok_or(ApplicationError::ModelNotSet)?;
        Ok(DomainEditor::new(model, self.resolution_service())
            .with_parse_options(self.settings.parse_options())
            .with_collapse_single_child(self.settings.tree.collapse_single_child))
    }
}
