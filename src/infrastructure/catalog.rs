//! TOML model catalog
//!
//! Field metadata for a set of models, read from a file like:
//!
//! ```toml
//! [models."res.partner".fields.country_id]
//! type = "many2one"
//! string = "Country"
//! relation = "res.country"
//!
//! [models."res.country".fields.code]
//! type = "char"
//! string = "Country Code"
//! ```
//!
//! Dotted paths walk relational fields: `country_id.code` on `res.partner`
//! resolves `code` on `res.country`.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument, trace, warn};

use crate::application::IoResultExt;
use crate::domain::{FieldDef, FieldType};
use crate::infrastructure::traits::{FieldResolver, FileSystem};
use crate::infrastructure::{InfraError, InfraResult};
use crate::util::path::PathExt;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldSpec {
    #[serde(rename = "type")]
    field_type: FieldType,
    string: Option<String>,
    relation: Option<String>,
    #[serde(default)]
    selection: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ModelSpec {
    description: Option<String>,
    fields: BTreeMap<String, FieldSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CatalogFile {
    models: BTreeMap<String, ModelSpec>,
}

/// Field definitions of a set of models.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: BTreeMap<String, ModelSpec>,
    path_regex: Regex,
}

impl ModelCatalog {
    /// Read and validate a catalog file.
    #[instrument(level = "debug", skip(fs))]
    pub fn load(fs: &dyn FileSystem, path: &Path) -> InfraResult<Self> {
        if !fs.is_file(path) {
            return Err(InfraError::catalog(path, "not a file"));
        }
        if !path.is_toml_file() {
            warn!("catalog {} has no .toml extension", path.display());
        }
        let content = fs.read_to_string(path).with_path_context("read catalog", path)?;
        Self::parse(&content).map_err(|message| InfraError::catalog(path, message))
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> InfraResult<Self> {
        Self::parse(content).map_err(|message| InfraError::catalog("<inline>", message))
    }

    fn parse(content: &str) -> Result<Self, String> {
        let file: CatalogFile = toml::from_str(content).map_err(|e| e.to_string())?;
        let catalog = Self {
            models: file.models,
            path_regex: Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
                .map_err(|e| e.to_string())?,
        };
        catalog.validate()?;
        debug!("loaded catalog with {} models", catalog.models.len());
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), String> {
        for (model, spec) in &self.models {
            for (name, field) in &spec.fields {
                if name.contains('.') || !self.path_regex.is_match(name) {
                    return Err(format!("invalid field name {model}.{name}"));
                }
                match (&field.relation, field.field_type.is_relational()) {
                    (None, true) => {
                        return Err(format!("relational field {model}.{name} has no relation"))
                    }
                    (Some(relation), true) if !self.models.contains_key(relation) => {
                        warn!("{model}.{name} points to {relation}, which the catalog lacks");
                    }
                    _ => {}
                }
                if field.field_type == FieldType::Selection && field.selection.is_empty() {
                    warn!("selection field {model}.{name} has no options");
                }
            }
        }
        Ok(())
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn contains_model(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn description(&self, model: &str) -> Option<&str> {
        self.models.get(model)?.description.as_deref()
    }

    /// Field names declared on a model, sorted.
    pub fn fields(&self, model: &str) -> Vec<&str> {
        self.models
            .get(model)
            .map(|spec| spec.fields.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn field(&self, model: &str, name: &str) -> Option<&FieldSpec> {
        self.models.get(model)?.fields.get(name)
    }

    fn resolve(&self, model: &str, path: &str) -> Option<FieldDef> {
        if !self.path_regex.is_match(path) || !self.contains_model(model) {
            return None;
        }
        let segments: Vec<&str> = path.split('.').collect();
        let (last, hops) = segments.split_last()?;

        let mut current = model;
        let mut labels = Vec::with_capacity(segments.len());
        for hop in hops {
            let spec = self.field(current, hop)?;
            if !spec.field_type.is_relational() {
                trace!("{current}.{hop} is not relational");
                return None;
            }
            labels.push(spec.string.clone().unwrap_or_else(|| hop.to_string()));
            current = spec.relation.as_deref()?;
        }

        let mut def = match self.field(current, last) {
            Some(spec) => {
                labels.push(spec.string.clone().unwrap_or_else(|| last.to_string()));
                let mut def = FieldDef::new(path, spec.field_type);
                def.relation = spec.relation.clone();
                def.selection = spec.selection.clone();
                def
            }
            // every model has an id
            None if *last == "id" => {
                labels.push("ID".to_string());
                FieldDef::new(path, FieldType::Id)
            }
            None => return None,
        };
        def.label = labels.join(" > ");
        Some(def)
    }
}

impl FieldResolver for ModelCatalog {
    fn load_field_def(&self, model: &str, path: &str) -> Option<FieldDef> {
        let def = self.resolve(model, path);
        trace!("{model}: {path} -> {:?}", def.as_ref().map(|d| d.field_type));
        def
    }
}
