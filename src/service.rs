use std::sync::Arc;
use tracing::info;

use crate::{
    config::Config,
    eligibility::{
        ApproximateBatchItem, BatchProcessor, BatchSummary, DrugIdentifier, EligibilityBatchItem,
        EligibilityResolver, EligibilityResult, RelatedNdcs,
    },
    error::{DrugError, Result},
    ndc::{EligibilityCache, SnapshotInfo, SpreadsheetIngestor},
    rxnav::{ApproximateCandidate, RxNavClient, TermDetails, TerminologyApi},
};

/// Constructed but not yet serving: the cache is still empty.
///
/// The only way to a [`DrugService`] is [`Bootstrap::activate`], which
/// installs the first snapshot or fails.
pub struct Bootstrap {
    config: Config,
    rxnav: Arc<dyn TerminologyApi>,
    cache: Arc<EligibilityCache>,
    ingestor: SpreadsheetIngestor,
}

impl Bootstrap {
    pub fn new(config: Config) -> Result<Self> {
        let http = RxNavClient::http_client(config.rxnav_timeout())?;
        let rxnav = RxNavClient::new(http.clone(), &config.rxnav.base_url)?;
        let ingestor = SpreadsheetIngestor::new(http, config.spreadsheet.url.clone());

        Ok(Self {
            config,
            rxnav: Arc::new(rxnav),
            cache: Arc::new(EligibilityCache::new()),
            ingestor,
        })
    }

    /// Download the reference table, install it, and hand back a ready service
    pub async fn activate(self) -> Result<DrugService> {
        info!("Initializing NDC cache...");
        let table = self.ingestor.ingest().await?;
        let snapshot = self.cache.load(table);
        info!(
            "NDC cache ready: {} records, {} eligible",
            snapshot.records, snapshot.eligible
        );

        Ok(DrugService::from_parts(self.rxnav, self.cache)
            .with_approximate_candidates(self.config.batch.approximate_candidates))
    }

    /// Service for lookups that never read the table (RxNav pass-throughs)
    pub fn without_cache(self) -> DrugService {
        DrugService::from_parts(self.rxnav, self.cache)
            .with_approximate_candidates(self.config.batch.approximate_candidates)
    }

    /// Parse the spreadsheet without installing it
    pub async fn dry_run_ingest(&self) -> Result<SnapshotInfo> {
        let table = self.ingestor.ingest().await?;
        Ok(SnapshotInfo::of(&table))
    }
}

/// All drug lookup operations over an activated cache
#[derive(Clone)]
pub struct DrugService {
    rxnav: Arc<dyn TerminologyApi>,
    resolver: Arc<EligibilityResolver>,
    batch: Arc<BatchProcessor>,
}

impl DrugService {
    pub fn from_parts(rxnav: Arc<dyn TerminologyApi>, cache: Arc<EligibilityCache>) -> Self {
        let resolver = Arc::new(EligibilityResolver::new(Arc::clone(&rxnav), cache));
        let batch = Arc::new(BatchProcessor::new(Arc::clone(&rxnav), Arc::clone(&resolver)));
        Self {
            rxnav,
            resolver,
            batch,
        }
    }

    pub fn with_approximate_candidates(self, candidates: u32) -> Self {
        let batch = BatchProcessor::new(Arc::clone(&self.rxnav), Arc::clone(&self.resolver))
            .with_approximate_candidates(candidates);
        Self {
            batch: Arc::new(batch),
            ..self
        }
    }

    pub fn cache(&self) -> &EligibilityCache {
        self.resolver.cache()
    }

    pub async fn related_ndcs(&self, id: &DrugIdentifier) -> Result<RelatedNdcs> {
        self.resolver
            .related(id)
            .await?
            .ok_or_else(missing_identifier)
    }

    pub async fn rx_info(&self, rxcui: &str) -> Result<Option<TermDetails>> {
        let rxcui = rxcui.trim();
        if rxcui.is_empty() {
            return Err(DrugError::InvalidArgument("rxcui is required".to_string()));
        }
        self.rxnav.term_details(rxcui).await
    }

    pub async fn check_eligibility(&self, id: &DrugIdentifier) -> Result<EligibilityResult> {
        if id.is_empty() {
            return Err(missing_identifier());
        }
        self.resolver.resolve(id).await
    }

    pub async fn approximate_match(&self, term: &str, max_entries: u32) -> Result<Vec<ApproximateCandidate>> {
        if term.trim().is_empty() {
            return Err(DrugError::InvalidArgument("term is required".to_string()));
        }
        self.rxnav.approximate_match(term, max_entries.max(1)).await
    }

    pub async fn batch_approximate<S: AsRef<str>>(&self, names: &[S]) -> BatchSummary<ApproximateBatchItem> {
        self.batch.batch_approximate(names).await
    }

    pub async fn batch_eligibility<S: AsRef<str>>(&self, ndcs: &[S]) -> BatchSummary<EligibilityBatchItem> {
        self.batch.batch_eligibility(ndcs).await
    }
}

fn missing_identifier() -> DrugError {
    DrugError::InvalidArgument("Missing input: provide ndc, rxcui, or name".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rxnav::MockTerminologyApi;

    fn service(mock: MockTerminologyApi) -> DrugService {
        DrugService::from_parts(Arc::new(mock), Arc::new(EligibilityCache::new()))
    }

    #[tokio::test]
    async fn test_missing_identifier_is_rejected() {
        let svc = service(MockTerminologyApi::new());
        let err = svc.check_eligibility(&DrugIdentifier::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing input: provide ndc, rxcui, or name");

        let err = svc.related_ndcs(&DrugIdentifier::new(Some(" "), None, None)).await.unwrap_err();
        assert!(matches!(err, DrugError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_approximate_match_zero_means_one() {
        let mut mock = MockTerminologyApi::new();
        mock.expect_approximate_match()
            .times(2)
            .returning(|_, max| {
                assert_eq!(max, 1);
                Ok(vec![])
            });

        let svc = service(mock);
        svc.approximate_match("aspirin", 0).await.unwrap();
        svc.approximate_match("aspirin", 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_rx_info_not_found() {
        let mut mock = MockTerminologyApi::new();
        mock.expect_term_details().returning(|_| Ok(None));

        let svc = service(mock);
        assert_eq!(svc.rx_info("000").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_activate_fails_on_unreachable_source() {
        let mut config = Config::load_from(None).unwrap();
        config.spreadsheet.url = "http://127.0.0.1:9/ndcs".to_string();

        let err = Bootstrap::new(config).unwrap().activate().await.err().unwrap();
        assert!(matches!(err, DrugError::Download(_)));
        assert!(err.is_startup_fatal());
    }

    #[tokio::test]
    async fn test_dry_run_ingest_installs_nothing() {
        use axum::{routing::get, Router};

        let app = Router::new().route(
            "/ndcs",
            get(|| async { include_bytes!("ndc/testdata/ndcs.xlsx").to_vec() }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut config = Config::load_from(None).unwrap();
        config.spreadsheet.url = format!("http://{}/ndcs", addr);
        let bootstrap = Bootstrap::new(config).unwrap();

        let snapshot = bootstrap.dry_run_ingest().await.unwrap();
        assert_eq!(snapshot.records, 3);
        assert_eq!(snapshot.eligible, 2);

        let service = bootstrap.without_cache();
        assert!(service.cache().info().is_none());
        assert!(service.cache().is_empty());
    }
}
