//! Domain editor session
//!
//! Single owner of the tree being edited. Rebuilds run in three steps so the
//! field lookups can happen off the owner's thread:
//!
//! 1. [`DomainEditor::prepare`] parses the text and stamps a generation
//! 2. [`PendingBuild::resolve`] resolves the field paths (any thread)
//! 3. [`DomainEditor::commit`] builds the tree unless a newer build was prepared
//!
//! A failed parse or build leaves an empty tree and marks the session
//! unsupported; the raw text is kept for the raw editing path.

use tracing::{debug, info, instrument, warn};

use crate::application::services::FieldResolutionService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    editors, find_operator, offered_operators, parse_domain_with, Connective, Domain, DomainError,
    DomainResult, DomainTree, EditorKind, FieldDef, FieldDefs, NodeId, Operator, ParseOptions,
    TreeBuilder, Value,
};

type Listener = Box<dyn Fn(&str) + Send>;

/// Parsed text waiting for field resolution.
#[derive(Debug)]
pub struct PendingBuild {
    generation: u64,
    model: String,
    text: String,
    parsed: DomainResult<Domain>,
}

impl PendingBuild {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolve the field paths of the parsed domain.
    #[instrument(level = "debug", skip(self, resolver), fields(generation = self.generation))]
    pub fn resolve(self, resolver: &FieldResolutionService) -> ResolvedBuild {
        let outcome = self.parsed.map(|domain| {
            let defs = resolver.resolve(&self.model, &domain.field_paths());
            (domain, defs)
        });
        ResolvedBuild {
            generation: self.generation,
            text: self.text,
            outcome,
        }
    }
}

/// Parsed text with its field definitions, ready to commit.
#[derive(Debug)]
pub struct ResolvedBuild {
    generation: u64,
    text: String,
    outcome: DomainResult<(Domain, FieldDefs)>,
}

impl ResolvedBuild {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Editing session over one domain.
pub struct DomainEditor {
    model: String,
    resolver: FieldResolutionService,
    options: ParseOptions,
    collapse_single_child: bool,
    tree: DomainTree,
    raw: String,
    unsupported: Option<DomainError>,
    generation: u64,
    listeners: Vec<Listener>,
}

impl DomainEditor {
    pub fn new(model: impl Into<String>, resolver: FieldResolutionService) -> Self {
        Self {
            model: model.into(),
            resolver,
            options: ParseOptions::default(),
            collapse_single_child: false,
            tree: DomainTree::new(),
            raw: Domain::empty().to_string(),
            unsupported: None,
            generation: 0,
            listeners: Vec::new(),
        }
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_collapse_single_child(mut self, collapse: bool) -> Self {
        self.collapse_single_child = collapse;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn resolver(&self) -> &FieldResolutionService {
        &self.resolver
    }

    pub fn tree(&self) -> &DomainTree {
        &self.tree
    }

    /// Current serialized text; the raw text while unsupported.
    pub fn text(&self) -> &str {
        &self.raw
    }

    pub fn is_supported(&self) -> bool {
        self.unsupported.is_none()
    }

    /// Why the current text could not be turned into a tree.
    pub fn unsupported_reason(&self) -> Option<&DomainError> {
        self.unsupported.as_ref()
    }

    /// Register a listener for the serialized text after each committed change.
    pub fn on_change(&mut self, listener: impl Fn(&str) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ------------------------------------------------------------
    // Rebuild
    // ------------------------------------------------------------

    /// Parse `text` and stamp it as the newest build.
    #[instrument(level = "debug", skip(self, text))]
    pub fn prepare(&mut self, text: &str) -> PendingBuild {
        self.generation += 1;
        debug!("preparing build {}", self.generation);
        PendingBuild {
            generation: self.generation,
            model: self.model.clone(),
            text: text.to_string(),
            parsed: parse_domain_with(text, self.options),
        }
    }

    /// Install a resolved build. Returns false when a newer build was
    /// prepared in the meantime and this one was discarded.
    #[instrument(level = "debug", skip(self, build), fields(generation = build.generation))]
    pub fn commit(&mut self, build: ResolvedBuild) -> bool {
        if build.generation != self.generation {
            debug!(
                "discarding stale build {} (latest {})",
                build.generation, self.generation
            );
            return false;
        }

        let built = build.outcome.and_then(|(domain, defs)| {
            TreeBuilder::new(&defs)
                .collapse_single_child(self.collapse_single_child)
                .build(&domain)
        });

        match built {
            Ok(tree) => {
                self.raw = tree.to_domain_string();
                self.tree = tree;
                self.unsupported = None;
            }
            Err(e) => {
                info!("falling back to raw text: {e}");
                self.tree = DomainTree::new().collapse_single_child(self.collapse_single_child);
                self.raw = build.text;
                self.unsupported = Some(e);
            }
        }
        true
    }

    /// Prepare, resolve and commit in one go.
    pub fn load(&mut self, text: &str) -> bool {
        let pending = self.prepare(text);
        let resolved = pending.resolve(&self.resolver);
        self.commit(resolved)
    }

    /// Raw-text path: forward `text` to the listeners unchanged, then rebuild.
    #[instrument(level = "debug", skip(self, text))]
    pub fn set_raw(&mut self, text: &str) {
        self.notify(text);
        self.load(text);
    }

    // ------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------

    /// Apply an edit, re-serialize and notify when the text changed.
    ///
    /// Unsupported sessions have no tree to edit; the edit is skipped.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut DomainTree) -> R) -> Option<R> {
        if let Some(reason) = &self.unsupported {
            warn!("ignoring edit on unsupported domain: {reason}");
            return None;
        }
        let result = f(&mut self.tree);
        let text = self.tree.to_domain_string();
        if text != self.raw {
            self.raw = text;
            self.notify(&self.raw);
        }
        Some(result)
    }

    fn notify(&self, text: &str) {
        for listener in &self.listeners {
            listener(text);
        }
    }

    /// Detached leaf on a resolved field path.
    pub fn new_leaf(&mut self, path: &str) -> ApplicationResult<NodeId> {
        let field = self.field_def(path)?;
        Ok(self.tree.new_leaf(field))
    }

    pub fn new_branch(&mut self, connective: Connective) -> NodeId {
        self.tree.new_branch(connective)
    }

    pub fn add(&mut self, branch: NodeId, node: NodeId) -> bool {
        self.edit(|tree| tree.add(branch, node)).unwrap_or(false)
    }

    pub fn insert_after(&mut self, branch: NodeId, sibling: NodeId, node: NodeId) -> bool {
        self.edit(|tree| tree.insert_after(branch, sibling, node))
            .unwrap_or(false)
    }

    pub fn insert_branch_after(&mut self, branch: NodeId, sibling: NodeId) -> Option<NodeId> {
        self.edit(|tree| tree.insert_branch_after(branch, sibling))
            .flatten()
    }

    pub fn delete(&mut self, branch: NodeId, node: NodeId) -> bool {
        self.edit(|tree| tree.delete(branch, node)).unwrap_or(false)
    }

    /// Copy of the subtree at `id`, inserted right after it.
    ///
    /// None when the parent takes no further child (a NOT).
    pub fn duplicate(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.tree.parent(id)?;
        self.edit(|tree| {
            let copy = tree.clone_node(id)?;
            if tree.insert_after(parent, id, copy) {
                Some(copy)
            } else {
                tree.discard(copy);
                None
            }
        })
        .flatten()
    }

    /// Point a leaf at another field path.
    pub fn update_field(&mut self, id: NodeId, path: &str) -> ApplicationResult<bool> {
        let field = self.field_def(path)?;
        Ok(self
            .edit(|tree| tree.update_field(id, field))
            .unwrap_or(false))
    }

    /// Change a leaf's operator by registry key.
    pub fn update_leaf_operator(&mut self, id: NodeId, key: &str) -> ApplicationResult<bool> {
        let operator = find_operator(key)?;
        Ok(self
            .edit(|tree| tree.update_leaf_operator(id, operator))
            .unwrap_or(false))
    }

    pub fn update_leaf_value(&mut self, id: NodeId, value: Value) -> bool {
        self.edit(|tree| tree.update_leaf_value(id, value))
            .unwrap_or(false)
    }

    pub fn set_connective(&mut self, id: NodeId, connective: Connective) -> bool {
        self.edit(|tree| tree.set_connective(id, connective))
            .unwrap_or(false)
    }

    // ------------------------------------------------------------
    // Leaf helpers
    // ------------------------------------------------------------

    /// Operators to offer for a leaf.
    pub fn offered_operators(&self, id: NodeId) -> Vec<&'static Operator> {
        self.tree
            .leaf(id)
            .map(|leaf| offered_operators(leaf.field.field_type, leaf.operator))
            .unwrap_or_default()
    }

    /// Value editor for a leaf.
    pub fn editor_info(&self, id: NodeId) -> Option<EditorKind> {
        self.tree
            .leaf(id)
            .map(|leaf| editors::editor_for(leaf.field.field_type, leaf.operator))
    }

    fn field_def(&self, path: &str) -> ApplicationResult<FieldDef> {
        if path == "id" {
            return Ok(FieldDef::id());
        }
        self.resolver
            .resolve_one(&self.model, path)
            .ok_or_else(|| ApplicationError::UnknownField {
                model: self.model.clone(),
                path: path.to_string(),
            })
    }
}
