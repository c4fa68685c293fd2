//! Thin per-resource wrappers over [`StructurifyClient::request`](crate::StructurifyClient::request).
//!
//! Each wrapper shapes the request body and unwraps the response envelope
//! (`{"success": true, "project": {...}}`) into a typed model.

mod documents;
mod exports;
mod extraction;
mod projects;
mod templates;

pub use documents::Documents;
pub use exports::Exports;
pub use extraction::Extraction;
pub use projects::Projects;
pub use templates::Templates;
