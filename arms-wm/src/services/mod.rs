//! Service layer for arms-wm

pub mod ingestion;

pub use ingestion::{parse_upload, IngestError, IngestedWorkbook, SheetSummary};
