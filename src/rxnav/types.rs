use serde::{Deserialize, Deserializer, Serialize};

/// RxNav sends `null` for empty groups and lists; read it as the empty value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `/rxcui/{rxcui}/ndcs.json`
#[derive(Debug, Default, Deserialize)]
pub struct NdcResponse {
    #[serde(rename = "ndcGroup", default, deserialize_with = "null_as_default")]
    pub ndc_group: NdcGroup,
}

#[derive(Debug, Default, Deserialize)]
pub struct NdcGroup {
    #[serde(rename = "ndcList", default)]
    pub ndc_list: Option<NdcList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NdcList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ndc: Vec<String>,
}

impl NdcResponse {
    pub fn into_ndcs(self) -> Vec<String> {
        self.ndc_group.ndc_list.map(|list| list.ndc).unwrap_or_default()
    }
}

/// `/relatedndc.json?relation=drug`
#[derive(Debug, Default, Deserialize)]
pub struct RelatedNdcResponse {
    #[serde(rename = "ndcInfoList", default)]
    pub ndc_info_list: Option<NdcInfoList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NdcInfoList {
    #[serde(rename = "ndcInfo", default, deserialize_with = "null_as_default")]
    pub ndc_info: Vec<NdcInfo>,
}

/// NDC entry as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NdcInfo {
    pub ndc11: String,
}

impl From<String> for NdcInfo {
    fn from(ndc11: String) -> Self {
        Self { ndc11 }
    }
}

impl RelatedNdcResponse {
    pub fn into_ndcs(self) -> Vec<String> {
        self.ndc_info_list
            .map(|list| list.ndc_info.into_iter().map(|info| info.ndc11).collect())
            .unwrap_or_default()
    }
}

/// `/RxTerms/rxcui/{rxcui}/allinfo.json`
#[derive(Debug, Default, Deserialize)]
pub struct RxTermsResponse {
    #[serde(rename = "rxtermsProperties", default)]
    pub properties: Option<TermDetails>,
}

/// RxTerms details for one concept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub rxcui: String,
    #[serde(rename = "displayName", default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(rename = "brandName", default, deserialize_with = "null_as_default")]
    pub brand_name: String,
    #[serde(rename = "fullName", default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strength: String,
    #[serde(rename = "termType", alias = "rxtty", default, deserialize_with = "null_as_default")]
    pub term_type: String,
}

/// `/approximateTerm.json`
#[derive(Debug, Default, Deserialize)]
pub struct ApproximateResponse {
    #[serde(rename = "approximateGroup", default, deserialize_with = "null_as_default")]
    pub approximate_group: ApproximateGroup,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproximateGroup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub candidate: Vec<ApproximateCandidate>,
}

/// Ranked approximate-match candidate, in upstream order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproximateCandidate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rxcui: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndc_response() {
        let json = r#"{"ndcGroup":{"rxcui":null,"ndcList":{"ndc":["00071015523","00071015540"]}}}"#;
        let resp: NdcResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.into_ndcs(), vec!["00071015523", "00071015540"]);

        let resp: NdcResponse = serde_json::from_str(r#"{"ndcGroup":{"rxcui":null}}"#).unwrap();
        assert!(resp.into_ndcs().is_empty());
    }

    #[test]
    fn test_related_ndc_response() {
        let json = r#"{"ndcInfoList":{"ndcInfo":[
            {"ndc11":"00002143380","status":"ACTIVE","rxcui":"1551295"},
            {"ndc11":"00002143361","status":"ACTIVE","rxcui":"1551295"}
        ]}}"#;
        let resp: RelatedNdcResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.into_ndcs(), vec!["00002143380", "00002143361"]);

        let resp: RelatedNdcResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.into_ndcs().is_empty());
    }

    #[test]
    fn test_rxterms_response() {
        let json = r#"{"rxtermsProperties":{
            "brandName":"","displayName":"Ibuprofen (Oral Pill)",
            "fullName":"ibuprofen 200 MG Oral Tablet","strength":"200 mg",
            "termType":"SCD","rxcui":"310965","route":"Oral Pill"
        }}"#;
        let resp: RxTermsResponse = serde_json::from_str(json).unwrap();
        let details = resp.properties.unwrap();
        assert_eq!(details.display_name, "Ibuprofen (Oral Pill)");
        assert_eq!(details.term_type, "SCD");
        assert_eq!(details.rxcui, "310965");

        let resp: RxTermsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.properties.is_none());
    }

    #[test]
    fn test_approximate_response_keeps_order() {
        let json = r#"{"approximateGroup":{"inputTerm":null,"candidate":[
            {"rxcui":"1191","rxaui":"1","score":"12.0","rank":"1","name":"aspirin","source":"RXNORM"},
            {"rxcui":"215568","rxaui":"2","score":"8.5","rank":"2","name":"Aspirin Low Dose"}
        ]}}"#;
        let resp: ApproximateResponse = serde_json::from_str(json).unwrap();
        let candidates = resp.approximate_group.candidate;
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "aspirin");
        assert_eq!(candidates[1].rxcui, "215568");
    }

    #[test]
    fn test_null_lists_read_as_empty() {
        let json = r#"{"approximateGroup":{"inputTerm":null,"candidate":null}}"#;
        let resp: ApproximateResponse = serde_json::from_str(json).unwrap();
        assert!(resp.approximate_group.candidate.is_empty());

        let resp: ApproximateResponse = serde_json::from_str(r#"{"approximateGroup":null}"#).unwrap();
        assert!(resp.approximate_group.candidate.is_empty());

        let resp: NdcResponse = serde_json::from_str(r#"{"ndcGroup":{"ndcList":{"ndc":null}}}"#).unwrap();
        assert!(resp.into_ndcs().is_empty());

        let resp: NdcResponse = serde_json::from_str(r#"{"ndcGroup":null}"#).unwrap();
        assert!(resp.into_ndcs().is_empty());

        let resp: RelatedNdcResponse =
            serde_json::from_str(r#"{"ndcInfoList":{"ndcInfo":null}}"#).unwrap();
        assert!(resp.into_ndcs().is_empty());
    }

    #[test]
    fn test_null_strings_read_as_empty() {
        let json = r#"{"rxtermsProperties":{"rxcui":"1","brandName":null,"displayName":"X","termType":null}}"#;
        let details = serde_json::from_str::<RxTermsResponse>(json).unwrap().properties.unwrap();
        assert_eq!(details.brand_name, "");
        assert_eq!(details.term_type, "");

        let json = r#"{"approximateGroup":{"candidate":[{"rxcui":"1191","score":"9","name":null}]}}"#;
        let resp: ApproximateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.approximate_group.candidate[0].name, "");
    }
}
