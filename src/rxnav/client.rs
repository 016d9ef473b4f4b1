use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::{
    error::{DrugError, Result},
    rxnav::{
        types::{
            ApproximateCandidate, ApproximateResponse, NdcResponse, RelatedNdcResponse,
            RxTermsResponse, TermDetails,
        },
        TerminologyApi,
    },
};

/// HTTP client for the RxNav REST API
#[derive(Clone)]
pub struct RxNavClient {
    client: reqwest::Client,
    base_url: Url,
}

impl RxNavClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| DrugError::Config(format!("invalid RxNav URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DrugError::Config(format!("invalid RxNav URL {}", base_url)));
        }
        Ok(Self { client, base_url })
    }

    /// Build the shared HTTP client, with a request timeout only when one is configured
    pub fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|e| DrugError::Config(format!("failed to build HTTP client: {}", e)))
    }

    /// Base URL with each segment percent-encoded and appended to the path
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn endpoint_with_query(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint(segments);
        url.query_pairs_mut().extend_pairs(query);
        url
    }

    pub(crate) fn concept_ndcs_url(&self, rxcui: &str) -> Url {
        self.endpoint(&["rxcui", rxcui, "ndcs.json"])
    }

    pub(crate) fn related_ndcs_url(&self, ndc: &str) -> Url {
        self.endpoint_with_query(&["relatedndc.json"], &[("relation", "drug"), ("ndc", ndc)])
    }

    pub(crate) fn name_search_url(&self, name: &str) -> Url {
        self.endpoint_with_query(&["rxcui.json"], &[("name", name), ("search", "2")])
    }

    pub(crate) fn term_details_url(&self, rxcui: &str) -> Url {
        self.endpoint(&["RxTerms", "rxcui", rxcui, "allinfo.json"])
    }

    pub(crate) fn approximate_url(&self, term: &str, max_entries: u32) -> Url {
        let max_entries = max_entries.max(1).to_string();
        self.endpoint_with_query(
            &["approximateTerm.json"],
            &[("term", term.trim()), ("maxEntries", max_entries.as_str())],
        )
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        debug!("GET {}", url);

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DrugError::Upstream(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DrugError::Upstream(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(DrugError::Upstream(format!(
                "{} returned {}: {}",
                url.path(),
                status,
                body
            )));
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let path = url.path().to_string();
        let body = self.get_text(url).await?;
        serde_json::from_str(&body)
            .map_err(|e| DrugError::Upstream(format!("malformed response from {}: {}", path, e)))
    }
}

#[async_trait]
impl TerminologyApi for RxNavClient {
    async fn ndcs_for_concept(&self, rxcui: &str) -> Result<Vec<String>> {
        let resp: NdcResponse = self.get_json(self.concept_ndcs_url(rxcui)).await?;
        Ok(resp.into_ndcs())
    }

    async fn related_ndcs(&self, ndc: &str) -> Result<Vec<String>> {
        let resp: RelatedNdcResponse = self.get_json(self.related_ndcs_url(ndc)).await?;
        Ok(resp.into_ndcs())
    }

    async fn search_concepts_by_name(&self, name: &str) -> Result<String> {
        self.get_text(self.name_search_url(name)).await
    }

    async fn term_details(&self, rxcui: &str) -> Result<Option<TermDetails>> {
        let resp: RxTermsResponse = self.get_json(self.term_details_url(rxcui)).await?;
        Ok(resp.properties)
    }

    async fn approximate_match(&self, term: &str, max_entries: u32) -> Result<Vec<ApproximateCandidate>> {
        let resp: ApproximateResponse = self
            .get_json(self.approximate_url(term, max_entries))
            .await?;
        Ok(resp.approximate_group.candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RxNavClient {
        RxNavClient::new(reqwest::Client::new(), "https://rxnav.nlm.nih.gov/REST/").unwrap()
    }

    #[test]
    fn test_path_segments_are_encoded() {
        let url = client().concept_ndcs_url("123/4 5");
        assert_eq!(
            url.as_str(),
            "https://rxnav.nlm.nih.gov/REST/rxcui/123%2F4%205/ndcs.json"
        );

        let url = client().term_details_url("310965");
        assert_eq!(
            url.as_str(),
            "https://rxnav.nlm.nih.gov/REST/RxTerms/rxcui/310965/allinfo.json"
        );
    }

    #[test]
    fn test_query_values_are_encoded() {
        let url = client().name_search_url("tylenol & codeine");
        assert_eq!(
            url.as_str(),
            "https://rxnav.nlm.nih.gov/REST/rxcui.json?name=tylenol+%26+codeine&search=2"
        );

        let url = client().related_ndcs_url("00002-1433-80");
        assert_eq!(url.query(), Some("relation=drug&ndc=00002-1433-80"));
    }

    #[test]
    fn test_approximate_url_coerces_zero() {
        let c = client();
        assert_eq!(c.approximate_url("aspirin", 0), c.approximate_url("aspirin", 1));
        assert_eq!(
            c.approximate_url("  aspirin ", 3).query(),
            Some("term=aspirin&maxEntries=3")
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(RxNavClient::new(reqwest::Client::new(), "not a url").is_err());
        assert!(RxNavClient::new(reqwest::Client::new(), "mailto:someone@example.com").is_err());
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_error() {
        // Nothing listens on port 9 on the loopback interface
        let c = RxNavClient::new(reqwest::Client::new(), "http://127.0.0.1:9/REST").unwrap();
        let err = c.related_ndcs("00002143380").await.unwrap_err();
        assert!(matches!(err, DrugError::Upstream(_)));
    }

    async fn local_rxnav() -> RxNavClient {
        use axum::{http::StatusCode, routing::get, Router};

        let app = Router::new()
            .route(
                "/REST/relatedndc.json",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
            )
            .route(
                "/REST/RxTerms/rxcui/{rxcui}/allinfo.json",
                get(|| async { (StatusCode::NOT_FOUND, "") }),
            )
            .route("/REST/rxcui/{rxcui}/ndcs.json", get(|| async { "not json" }))
            .route(
                "/REST/approximateTerm.json",
                get(|| async { r#"{"approximateGroup":{"inputTerm":null,"candidate":null}}"# }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        RxNavClient::new(reqwest::Client::new(), &format!("http://{}/REST", addr)).unwrap()
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_error() {
        let c = local_rxnav().await;

        let err = c.related_ndcs("00002143380").await.unwrap_err();
        match err {
            DrugError::Upstream(msg) => {
                assert!(msg.contains("503"), "{}", msg);
                assert!(msg.contains("down"), "{}", msg);
            }
            other => panic!("expected upstream error, got {:?}", other),
        }

        let err = c.term_details("1").await.unwrap_err();
        assert!(matches!(err, DrugError::Upstream(ref msg) if msg.contains("404")));
    }

    #[tokio::test]
    async fn test_malformed_body_is_upstream_error() {
        let err = local_rxnav().await.ndcs_for_concept("1").await.unwrap_err();
        assert!(matches!(err, DrugError::Upstream(ref msg) if msg.starts_with("malformed response")));
    }

    #[tokio::test]
    async fn test_null_candidates_are_no_matches() {
        let matches = local_rxnav().await.approximate_match("zzzz", 3).await.unwrap();
        assert!(matches.is_empty());
    }
}
