use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::{
    eligibility::{ApproximateBatchItem, DrugIdentifier, EligibilityBatchItem, EligibilityResult, RelatedNdcs},
    error::{DrugError, Result},
    rxnav::{coerce_max_entries, ApproximateCandidate, TermDetails},
    service::DrugService,
};

/// Flat argument object of a tool call
pub type Arguments = Map<String, Value>;

/// Tools exposed by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    RelatedNdcs,
    RxInfo,
    CheckEligibility,
    ApproximateMatch,
    BatchApproximate,
    BatchEligibility,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::RelatedNdcs,
        ToolKind::RxInfo,
        ToolKind::CheckEligibility,
        ToolKind::ApproximateMatch,
        ToolKind::BatchApproximate,
        ToolKind::BatchEligibility,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::RelatedNdcs => "get_related_ndcs",
            ToolKind::RxInfo => "get_rx_info",
            ToolKind::CheckEligibility => "check_340b_eligibility",
            ToolKind::ApproximateMatch => "find_approximate_drug_match",
            ToolKind::BatchApproximate => "generate_rxnorm_excel",
            ToolKind::BatchEligibility => "is_340b_excel",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::RelatedNdcs => "Get related NDCs for a given NDC, RxCUI, or drug name",
            ToolKind::RxInfo => "Get detailed information for a given RxCUI",
            ToolKind::CheckEligibility => {
                "Check if a drug is 340B eligible based on NDC, RxCUI, or drug name"
            }
            ToolKind::ApproximateMatch => "Find approximate drug name matches using RxNorm API",
            ToolKind::BatchApproximate => {
                "Process drug names and generate Excel file with RxNorm matches"
            }
            ToolKind::BatchEligibility => {
                "Process NDC codes and generate Excel file with 340B eligibility status"
            }
        }
    }

    /// JSON Schema for the tool's arguments
    pub fn input_schema(&self) -> Map<String, Value> {
        let identifier_properties = json!({
            "ndc": { "type": "string", "description": "National Drug Code (NDC)" },
            "rxcui": { "type": "string", "description": "RxNorm Concept Unique Identifier" },
            "name": { "type": "string", "description": "Drug name" }
        });

        let schema = match self {
            ToolKind::RelatedNdcs | ToolKind::CheckEligibility => json!({
                "type": "object",
                "properties": identifier_properties
            }),
            ToolKind::RxInfo => json!({
                "type": "object",
                "properties": {
                    "rxcui": { "type": "string", "description": "RxNorm Concept Unique Identifier" }
                },
                "required": ["rxcui"]
            }),
            ToolKind::ApproximateMatch => json!({
                "type": "object",
                "properties": {
                    "term": { "type": "string", "description": "Drug name to search for" },
                    "max_entries": {
                        "type": "number",
                        "description": "Maximum number of results to return (default: 1)"
                    }
                },
                "required": ["term"]
            }),
            ToolKind::BatchApproximate => json!({
                "type": "object",
                "properties": {
                    "drug_names": { "type": "string", "description": "JSON array of drug names to process" }
                },
                "required": ["drug_names"]
            }),
            ToolKind::BatchEligibility => json!({
                "type": "object",
                "properties": {
                    "ndc_codes": { "type": "string", "description": "JSON array of NDC codes to check" }
                },
                "required": ["ndc_codes"]
            }),
        };

        match schema {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Result payload of a tool call, one shape per tool
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    RelatedNdcs(RelatedNdcs),
    RxInfo {
        success: bool,
        info: Option<TermDetails>,
    },
    Eligibility(EligibilityResult),
    ApproximateMatch {
        term: String,
        matches: Vec<ApproximateCandidate>,
        success: bool,
    },
    BatchApproximate {
        success: bool,
        results: Vec<ApproximateBatchItem>,
        total_processed: usize,
        note: &'static str,
    },
    BatchEligibility {
        success: bool,
        results: Vec<EligibilityBatchItem>,
        total_processed: usize,
        cache_info: String,
        note: &'static str,
    },
}

impl ToolOutput {
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run one tool against the service
pub async fn call_tool(service: &DrugService, tool: ToolKind, args: &Arguments) -> Result<ToolOutput> {
    debug!("Calling tool {}", tool.name());

    match tool {
        ToolKind::RelatedNdcs => {
            let id = identifier(args);
            Ok(ToolOutput::RelatedNdcs(service.related_ndcs(&id).await?))
        }
        ToolKind::RxInfo => {
            let rxcui = required_string(args, "rxcui")?;
            let info = service.rx_info(&rxcui).await?;
            Ok(ToolOutput::RxInfo { success: true, info })
        }
        ToolKind::CheckEligibility => {
            let id = identifier(args);
            Ok(ToolOutput::Eligibility(service.check_eligibility(&id).await?))
        }
        ToolKind::ApproximateMatch => {
            let term = required_string(args, "term")?;
            let max_entries = coerce_max_entries(number_arg(args, "max_entries"));
            let matches = service.approximate_match(&term, max_entries).await?;
            Ok(ToolOutput::ApproximateMatch {
                term,
                matches,
                success: true,
            })
        }
        ToolKind::BatchApproximate => {
            let names = string_list_arg(args, "drug_names")?;
            let summary = service.batch_approximate(&names).await;
            Ok(ToolOutput::BatchApproximate {
                success: true,
                results: summary.results,
                total_processed: summary.total_processed,
                note: "Excel-like data structure for RxNorm matches",
            })
        }
        ToolKind::BatchEligibility => {
            let ndcs = string_list_arg(args, "ndc_codes")?;
            let summary = service.batch_eligibility(&ndcs).await;
            Ok(ToolOutput::BatchEligibility {
                success: true,
                results: summary.results,
                total_processed: summary.total_processed,
                cache_info: service.cache().describe(),
                note: "Excel-like data structure for 340B eligibility",
            })
        }
    }
}

fn identifier(args: &Arguments) -> DrugIdentifier {
    DrugIdentifier::new(
        string_arg(args, "ndc").as_deref(),
        string_arg(args, "rxcui").as_deref(),
        string_arg(args, "name").as_deref(),
    )
}

/// String argument; numbers are accepted and rendered as text
pub fn string_arg(args: &Arguments, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn required_string(args: &Arguments, key: &str) -> Result<String> {
    string_arg(args, key)
        .ok_or_else(|| DrugError::InvalidArgument(format!("required argument \"{}\" not found", key)))
}

/// Numeric argument; numeric strings are accepted
pub fn number_arg(args: &Arguments, key: &str) -> Option<f64> {
    match args.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// List of strings given either as a JSON-encoded string or a real array
pub fn string_list_arg(args: &Arguments, key: &str) -> Result<Vec<String>> {
    let invalid = || DrugError::InvalidArgument(format!("Invalid JSON format for {}", key));

    match args.get(key) {
        Some(Value::String(encoded)) => serde_json::from_str(encoded).map_err(|_| invalid()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
        None => Err(DrugError::InvalidArgument(format!(
            "required argument \"{}\" not found",
            key
        ))),
    }
}
