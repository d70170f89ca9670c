//! domtree: parse, edit and serialize prefix-notation filter domains.
//!
//! A domain such as `["|", ("name", "ilike", "acme"), ("country_id.code", "=", "BE")]`
//! is parsed into an AST, resolved against field metadata and built into an
//! editable tree. Edits on the tree re-serialize to canonical domain text.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
