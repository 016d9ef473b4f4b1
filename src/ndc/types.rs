use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the 340B reference spreadsheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NdcRecord {
    pub ndc: String,
    #[serde(rename = "drugName")]
    pub drug_name: String,
    pub strength: String,
    #[serde(rename = "unitOfMeasure")]
    pub unit_of_measure: String,
    pub route: String,
    pub manufacturer: String,
    #[serde(rename = "packageSize")]
    pub package_size: String,
    #[serde(rename = "is340b")]
    pub is_340b: bool,
}

impl NdcRecord {
    /// Interpret the spreadsheet's eligibility marker column
    pub fn parse_marker(marker: &str) -> bool {
        let marker = marker.trim();
        marker.eq_ignore_ascii_case("true") || marker == "1"
    }
}

/// Immutable snapshot of the reference table, keyed by NDC
#[derive(Debug, Clone, Default)]
pub struct NdcTable {
    records: HashMap<String, NdcRecord>,
}

impl NdcTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any earlier record with the same code
    pub fn insert(&mut self, record: NdcRecord) -> Option<NdcRecord> {
        self.records.insert(record.ndc.clone(), record)
    }

    pub fn get(&self, ndc: &str) -> Option<&NdcRecord> {
        self.records.get(ndc)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn eligible_count(&self) -> usize {
        self.records.values().filter(|r| r.is_340b).count()
    }
}

impl FromIterator<NdcRecord> for NdcTable {
    fn from_iter<I: IntoIterator<Item = NdcRecord>>(iter: I) -> Self {
        let mut table = NdcTable::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}
