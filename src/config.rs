//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/domtree/domtree.toml`
//! 3. Local config: `<dir>/.domtree.toml` (working directory by default)
//! 4. Environment variables: `DOMTREE_*` prefix, `__` between sections

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::parser::ParseOptions;
use crate::util::path::PathExt;

/// Parser settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParserConfig {
    /// Join several top-level expressions with an implicit AND
    pub implicit_and: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { implicit_and: true }
    }
}

/// Tree editing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TreeConfig {
    /// Replace a branch left with one child by that child on delete
    pub collapse_single_child: bool,
}

/// Field resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Resolve the field paths of a domain in parallel
    pub parallel: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Unified configuration for domtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Model catalog file
    pub catalog: Option<PathBuf>,
    /// Model the domains filter
    pub model: Option<String>,
    pub parser: ParserConfig,
    pub tree: TreeConfig,
    pub resolver: ResolverConfig,
}

/// Get the XDG config directory for domtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "domtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("domtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".domtree.toml")
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// `local_dir` defaults to the current working directory.
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let local = match local_dir {
            Some(dir) => Some(local_config_path(dir)),
            None => std::env::current_dir().ok().map(|dir| local_config_path(&dir)),
        };
        Self::load_from(
            global_config_path().as_deref(),
            local.as_deref(),
            Self::environment(),
        )
    }

    fn environment() -> Environment {
        Environment::with_prefix("DOMTREE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Load from explicit file locations and an environment source.
    pub fn load_from(
        global: Option<&Path>,
        local: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("parser.implicit_and", defaults.parser.implicit_and)
            .map_err(config_err)?
            .set_default(
                "tree.collapse_single_child",
                defaults.tree.collapse_single_child,
            )
            .map_err(config_err)?
            .set_default("resolver.parallel", defaults.resolver.parallel)
            .map_err(config_err)?;

        for path in [global, local].into_iter().flatten() {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let config = builder.add_source(env).build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        // Expand ~ and $VAR in the catalog path
        settings.expand_paths();

        Ok(settings)
    }

    fn expand_paths(&mut self) {
        if let Some(catalog) = &self.catalog {
            self.catalog = Some(catalog.expanded());
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            implicit_and: self.parser.implicit_and,
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# domtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/domtree/domtree.toml
#   Local:  ./.domtree.toml
#   Env:    DOMTREE_* environment variables, e.g. DOMTREE_TREE__COLLAPSE_SINGLE_CHILD=true

# Model catalog (TOML field definitions)
# catalog = "~/.config/domtree/models.toml"

# Model the domains filter
# model = "res.partner"

[parser]
# Join several top-level expressions with an implicit AND
# implicit_and = true

[tree]
# On delete, replace a branch left with one child by that child
# collapse_single_child = false

[resolver]
# Resolve field paths in parallel
# parallel = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
