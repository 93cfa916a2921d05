//! Shared building blocks for the bookshelf client: layered settings and the
//! module lifecycle used to bring process-wide state up and tear it down.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
