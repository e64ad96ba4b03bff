//! Report and page model for the site report builder.
//!
//! Owns the Report/Page/Photo entities, their invariants (a report always
//! keeps at least one densely numbered page) and the persistence store
//! that reads and writes the whole collection as one JSON blob.

pub mod error;
pub mod model;
pub mod store;

pub use error::ReportError;
pub use model::{NewReport, Page, Photo, Report};
pub use store::{MemoryBackend, ReportStore, StorageBackend, STORAGE_KEY};
