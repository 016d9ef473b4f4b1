use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::{debug, info};

use crate::{
    error::{DrugError, Result},
    ndc::types::{NdcRecord, NdcTable},
};

/// Number of leading columns read from each row
pub const COLUMN_COUNT: u32 = 8;

/// Downloads the 340B reference spreadsheet and turns it into a table
pub struct SpreadsheetIngestor {
    client: reqwest::Client,
    url: String,
}

impl SpreadsheetIngestor {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Download and parse the spreadsheet into a complete table
    pub async fn ingest(&self) -> Result<NdcTable> {
        let body = self.download().await?;
        let table = parse_workbook(body)?;
        info!(
            "Parsed {} NDC records ({} eligible) from {}",
            table.len(),
            table.eligible_count(),
            self.url
        );
        Ok(table)
    }

    async fn download(&self) -> Result<Vec<u8>> {
        info!("Downloading NDC file from {}", self.url);

        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DrugError::Download(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DrugError::Download(format!(
                "{} returned status {}",
                self.url, status
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| DrugError::Download(format!("failed to read NDC file: {}", e)))?;

        debug!("Downloaded {} bytes", body.len());
        Ok(body.to_vec())
    }
}

/// Open a workbook from raw bytes and build a table from its first sheet
pub fn parse_workbook(data: Vec<u8>) -> Result<NdcTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))
        .map_err(|e| DrugError::Parse(format!("failed to open Excel file: {}", e)))?;

    if workbook.sheet_names().is_empty() {
        return Err(DrugError::Parse("no sheets found in Excel file".to_string()));
    }

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DrugError::Parse("no sheets found in Excel file".to_string()))?
        .map_err(|e| DrugError::Parse(format!("failed to read first sheet: {}", e)))?;

    Ok(table_from_range(&range))
}

/// Build a table from a sheet range.
///
/// Positions are absolute: sheet row 0 is the header and is always skipped,
/// and columns 0..8 are read whatever the range's used area is.
pub fn table_from_range(range: &Range<Data>) -> NdcTable {
    let (start, end) = match (range.start(), range.end()) {
        (Some(start), Some(end)) => (start, end),
        _ => return NdcTable::new(),
    };

    let rows = start.0.max(1)..=end.0;
    table_from_rows(rows.map(|row| {
        (0..COLUMN_COUNT)
            .map(|col| cell_text(range, row, col))
            .collect::<Vec<_>>()
    }))
}

/// Build a table from data rows (header already removed)
pub fn table_from_rows<I, R, S>(rows: I) -> NdcTable
where
    I: IntoIterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut table = NdcTable::new();
    let mut skipped = 0usize;

    for row in rows {
        match record_from_row(row.as_ref()) {
            Some(record) => {
                table.insert(record);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} rows without an NDC", skipped);
    }
    table
}

/// Convert one row to a record; `None` when the code column is blank
pub fn record_from_row<S: AsRef<str>>(row: &[S]) -> Option<NdcRecord> {
    let col = |idx: usize| {
        row.get(idx)
            .map(|cell| cell.as_ref().trim().to_string())
            .unwrap_or_default()
    };

    let ndc = col(0);
    if ndc.is_empty() {
        return None;
    }

    Some(NdcRecord {
        ndc,
        drug_name: col(1),
        strength: col(2),
        unit_of_measure: col(3),
        route: col(4),
        manufacturer: col(5),
        package_size: col(6),
        is_340b: NdcRecord::parse_marker(&col(7)),
    })
}

fn cell_text(range: &Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        None | Some(Data::Empty) => String::new(),
        Some(cell) => cell.to_string().trim().to_string(),
    }
}
