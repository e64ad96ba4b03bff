//! PDF export for site reports.
//!
//! Assembles a deterministic document with lopdf: a cover page followed
//! by one physical page per report page, each embedding the flattened
//! photo raster and the word-wrapped comment text.

pub mod error;
pub mod export;
pub mod text;

mod xobject;

pub use error::ExportError;
pub use export::{export_file_name, export_report, ExportedReport};
