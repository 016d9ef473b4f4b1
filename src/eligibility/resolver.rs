use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::{
    error::Result,
    ndc::{EligibilityCache, NdcRecord},
    rxnav::{NdcInfo, TerminologyApi},
};

/// Partial drug identifier supplied by a caller.
///
/// Blank fields count as unset. When several are set the concept id wins,
/// then the name, then the NDC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrugIdentifier {
    pub ndc: Option<String>,
    pub rxcui: Option<String>,
    pub name: Option<String>,
}

impl DrugIdentifier {
    pub fn new(ndc: Option<&str>, rxcui: Option<&str>, name: Option<&str>) -> Self {
        fn present(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            ndc: present(ndc),
            rxcui: present(rxcui),
            name: present(name),
        }
    }

    pub fn from_ndc(ndc: &str) -> Self {
        Self::new(Some(ndc), None, None)
    }

    pub fn is_empty(&self) -> bool {
        self.ndc.is_none() && self.rxcui.is_none() && self.name.is_none()
    }
}

/// Upstream payload for a related-NDC lookup, one shape per lookup path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelatedNdcs {
    /// NDCs attached to the concept id
    Concept { ndcs: Vec<NdcInfo> },
    /// Raw name-search body, passed through unparsed
    NameSearch { rxcui_search: String },
    /// NDCs of the same drug as the input NDC
    Relation { related_ndcs: Vec<NdcInfo> },
}

impl RelatedNdcs {
    /// NDCs this payload contributes to an eligibility check.
    ///
    /// The name search yields none: its body is never mined for NDCs.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        let infos: &[NdcInfo] = match self {
            RelatedNdcs::Concept { ndcs } => ndcs.as_slice(),
            RelatedNdcs::Relation { related_ndcs } => related_ndcs.as_slice(),
            RelatedNdcs::NameSearch { .. } => &[],
        };
        infos.iter().map(|info| info.ndc11.as_str())
    }
}

/// Aggregate 340B answer for one identifier
#[derive(Debug, Clone, Serialize)]
pub struct EligibilityResult {
    #[serde(rename = "is_340b")]
    pub eligible: bool,
    pub cache_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_ndcs: Option<RelatedNdcs>,
    #[serde(rename = "eligible_ndcs", skip_serializing_if = "Vec::is_empty")]
    pub matched_records: Vec<NdcRecord>,
}

pub struct EligibilityResolver {
    rxnav: Arc<dyn TerminologyApi>,
    cache: Arc<EligibilityCache>,
}

impl EligibilityResolver {
    pub fn new(rxnav: Arc<dyn TerminologyApi>, cache: Arc<EligibilityCache>) -> Self {
        Self { rxnav, cache }
    }

    pub fn cache(&self) -> &EligibilityCache {
        &self.cache
    }

    /// Look up related NDCs for whichever identifier takes precedence
    pub async fn related(&self, id: &DrugIdentifier) -> Result<Option<RelatedNdcs>> {
        if let Some(rxcui) = &id.rxcui {
            let ndcs = self.rxnav.ndcs_for_concept(rxcui).await?;
            debug!("Concept {} has {} NDCs", rxcui, ndcs.len());
            return Ok(Some(RelatedNdcs::Concept {
                ndcs: ndcs.into_iter().map(NdcInfo::from).collect(),
            }));
        }

        if let Some(name) = &id.name {
            let body = self.rxnav.search_concepts_by_name(name).await?;
            return Ok(Some(RelatedNdcs::NameSearch { rxcui_search: body }));
        }

        if let Some(ndc) = &id.ndc {
            let ndcs = self.rxnav.related_ndcs(ndc).await?;
            debug!("NDC {} has {} related NDCs", ndc, ndcs.len());
            return Ok(Some(RelatedNdcs::Relation {
                related_ndcs: ndcs.into_iter().map(NdcInfo::from).collect(),
            }));
        }

        Ok(None)
    }

    /// Decide 340B eligibility for an identifier.
    ///
    /// The input NDC, when given, is always checked directly alongside the
    /// candidates from the related lookup. An empty candidate set is simply
    /// not eligible.
    pub async fn resolve(&self, id: &DrugIdentifier) -> Result<EligibilityResult> {
        let related = self.related(id).await?;

        let candidates = id
            .ndc
            .iter()
            .map(String::as_str)
            .chain(related.iter().flat_map(|r| r.candidates()));
        let matched_records = self.eligible_records(candidates);

        Ok(EligibilityResult {
            eligible: !matched_records.is_empty(),
            cache_info: self.cache.describe(),
            related_ndcs: related,
            matched_records,
        })
    }

    /// Eligible cache records for `candidates`, deduplicated in first-seen order
    pub fn eligible_records<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> Vec<NdcRecord> {
        let snapshot = self.cache.snapshot();
        let mut seen = HashSet::new();

        candidates
            .into_iter()
            .filter(|ndc| seen.insert(*ndc))
            .filter_map(|ndc| snapshot.get(ndc))
            .filter(|record| record.is_340b)
            .cloned()
            .collect()
    }
}
