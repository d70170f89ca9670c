//! Application services
//!
//! Concrete services that orchestrate domain logic.
//! Services depend on I/O boundary traits (FieldResolver)
//! but are themselves concrete structs, not traits.

mod editor;
mod resolver;

pub use editor::{DomainEditor, PendingBuild, ResolvedBuild};
pub use resolver::FieldResolutionService;
