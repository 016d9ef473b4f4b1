use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    eligibility::resolver::{DrugIdentifier, EligibilityResolver},
    rxnav::TerminologyApi,
};

/// Number of approximate candidates requested per name
pub const DEFAULT_APPROXIMATE_CANDIDATES: u32 = 3;

/// Best approximate match for one input name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApproximateBatchItem {
    pub original_name: String,
    pub found_name: String,
    pub rxcui: String,
    pub score: String,
    pub error: String,
}

/// 340B status for one input NDC
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EligibilityBatchItem {
    pub ndc: String,
    pub is_340b: bool,
    pub drug_name: String,
    pub manufacturer: String,
    pub error: String,
}

/// Per-item results of a batch run, in input order
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary<T> {
    pub results: Vec<T>,
    pub total_processed: usize,
    #[serde(skip)]
    pub failed: usize,
}

impl<T> Default for BatchSummary<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            total_processed: 0,
            failed: 0,
        }
    }
}

impl<T> BatchSummary<T> {
    fn push(&mut self, item: T, failed: bool) {
        self.total_processed += 1;
        if failed {
            self.failed += 1;
        }
        self.results.push(item);
    }

    /// Get success rate as percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            ((self.total_processed - self.failed) as f64 / self.total_processed as f64) * 100.0
        }
    }
}

/// Runs lookups over lists of inputs, one item at a time.
///
/// Blank inputs are skipped and not counted. A failing item records its
/// error in its own entry and never stops the batch.
pub struct BatchProcessor {
    rxnav: Arc<dyn TerminologyApi>,
    resolver: Arc<EligibilityResolver>,
    approximate_candidates: u32,
}

impl BatchProcessor {
    pub fn new(rxnav: Arc<dyn TerminologyApi>, resolver: Arc<EligibilityResolver>) -> Self {
        Self {
            rxnav,
            resolver,
            approximate_candidates: DEFAULT_APPROXIMATE_CANDIDATES,
        }
    }

    pub fn with_approximate_candidates(mut self, candidates: u32) -> Self {
        self.approximate_candidates = candidates.max(1);
        self
    }

    /// Best approximate RxNorm match for each name
    pub async fn batch_approximate<S: AsRef<str>>(&self, names: &[S]) -> BatchSummary<ApproximateBatchItem> {
        info!("Matching {} drug names", names.len());
        let mut summary = BatchSummary::default();

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }

            let mut item = ApproximateBatchItem {
                original_name: name.to_string(),
                ..Default::default()
            };

            match self.rxnav.approximate_match(name, self.approximate_candidates).await {
                Ok(candidates) => match candidates.into_iter().next() {
                    Some(best) => {
                        item.found_name = best.name;
                        item.rxcui = best.rxcui;
                        item.score = best.score;
                    }
                    None => item.error = "No matches found".to_string(),
                },
                Err(e) => {
                    warn!("Approximate match failed for {}: {}", name, e);
                    item.error = e.to_string();
                }
            }

            let failed = !item.error.is_empty();
            summary.push(item, failed);
        }

        info!(
            "Name matching complete: {} processed, {} without a match",
            summary.total_processed, summary.failed
        );
        summary
    }

    /// 340B eligibility for each NDC, enriched from the cache when eligible
    pub async fn batch_eligibility<S: AsRef<str>>(&self, ndcs: &[S]) -> BatchSummary<EligibilityBatchItem> {
        info!("Checking 340B eligibility for {} NDCs", ndcs.len());
        let mut summary = BatchSummary::default();

        for ndc in ndcs {
            let ndc = ndc.as_ref().trim();
            if ndc.is_empty() {
                continue;
            }

            let mut item = EligibilityBatchItem {
                ndc: ndc.to_string(),
                ..Default::default()
            };

            match self.resolver.resolve(&DrugIdentifier::from_ndc(ndc)).await {
                Ok(result) if result.eligible => {
                    item.is_340b = true;
                    // Details come from the exact input code, not a related match
                    if let Some(record) = self.resolver.cache().lookup(ndc) {
                        item.drug_name = record.drug_name;
                        item.manufacturer = record.manufacturer;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Eligibility check failed for {}: {}", ndc, e);
                    item.error = e.to_string();
                }
            }

            let failed = !item.error.is_empty();
            summary.push(item, failed);
        }

        info!(
            "Eligibility batch complete: {} processed, {} failed",
            summary.total_processed, summary.failed
        );
        summary
    }
}
