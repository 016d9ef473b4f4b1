pub mod client;
pub mod types;

pub use client::RxNavClient;
pub use types::{ApproximateCandidate, NdcInfo, TermDetails};

use async_trait::async_trait;

use crate::error::Result;

/// Lookups against the drug-terminology service.
///
/// Every call is a single request with no retry; failures surface as
/// `DrugError::Upstream`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TerminologyApi: Send + Sync {
    /// NDCs attached to a concept
    async fn ndcs_for_concept(&self, rxcui: &str) -> Result<Vec<String>>;

    /// NDCs of the same drug as `ndc`
    async fn related_ndcs(&self, ndc: &str) -> Result<Vec<String>>;

    /// Raw concept search body for a free-text name
    async fn search_concepts_by_name(&self, name: &str) -> Result<String>;

    /// RxTerms details, `None` when the concept has none
    async fn term_details(&self, rxcui: &str) -> Result<Option<TermDetails>>;

    /// Ranked approximate matches; `max_entries` is already coerced to >= 1
    async fn approximate_match(&self, term: &str, max_entries: u32) -> Result<Vec<ApproximateCandidate>>;
}

/// Coerce a caller-supplied candidate count to a positive integer
pub fn coerce_max_entries(requested: Option<f64>) -> u32 {
    match requested {
        Some(n) if n.is_finite() && n >= 1.0 => n.min(u32::MAX as f64) as u32,
        _ => 1,
    }
}
