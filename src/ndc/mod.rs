pub mod types;
pub mod cache;
pub mod ingest;

pub use types::{NdcRecord, NdcTable};
pub use cache::{EligibilityCache, SnapshotInfo};
pub use ingest::SpreadsheetIngestor;
