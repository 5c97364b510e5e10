//! Taskhub Report Core - Productivity reports
//!
//! Report CRUD, markdown-to-PDF rendering, and upload of rendered PDFs
//! to S3-compatible object storage. PDF generation after report creation
//! runs detached; a failure there is logged, never surfaced to the
//! request that created the report.

pub mod error;
pub mod pdf;
pub mod service;
pub mod storage;

pub use error::ReportError;
pub use pdf::PdfRenderer;
pub use service::ReportService;
pub use storage::{build_public_url, ObjectStorage, StorageConfig};
