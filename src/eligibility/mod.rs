pub mod resolver;
pub mod batch;

pub use resolver::{DrugIdentifier, EligibilityResolver, EligibilityResult, RelatedNdcs};
pub use batch::{ApproximateBatchItem, BatchProcessor, BatchSummary, EligibilityBatchItem};
