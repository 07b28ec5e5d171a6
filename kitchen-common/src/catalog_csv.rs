//! Catalog CSV import/export format
//!
//! Column order for both directions: `name, classification, category,
//! default_unit, kana`. Export writes a header row; import skips a leading
//! row whose first field is `name`, tolerates a UTF-8 byte-order mark and
//! short rows.

use crate::db::models::{CatalogDraft, CatalogItem, Classification};
use crate::Result;
use serde::Serialize;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub const HEADER: [&str; 5] = ["name", "classification", "category", "default_unit", "kana"];

/// Outcome of a catalog CSV import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub added: u32,
    pub skipped: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Decode one CSV record into a draft.
///
/// Returns `Ok(None)` for rows to ignore (blank name, header row).
fn record_to_draft(record: &csv::StringRecord, line: usize) -> std::result::Result<Option<CatalogDraft>, String> {
    let name = record.get(0).map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Ok(None);
    }
    if line == 1 && name.eq_ignore_ascii_case(HEADER[0]) {
        return Ok(None);
    }

    let classification = match non_empty(record.get(1)) {
        Some(text) => text
            .parse::<Classification>()
            .map_err(|e| format!("{}: {}", name, e))?,
        None => Classification::Ingredient,
    };

    // Seasonings carry no category
    let category = match classification {
        Classification::Seasoning => None,
        Classification::Ingredient => non_empty(record.get(2)),
    };

    Ok(Some(CatalogDraft {
        name: name.to_string(),
        kana: non_empty(record.get(4)),
        classification,
        category,
        default_unit: non_empty(record.get(3)),
    }))
}

/// Parse an uploaded CSV body into drafts and per-row error messages
pub fn parse_import(bytes: &[u8]) -> (Vec<CatalogDraft>, Vec<String>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(strip_bom(bytes));

    let mut drafts = Vec::new();
    let mut errors = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let line = index + 1;
        match result {
            Ok(record) => match record_to_draft(&record, line) {
                Ok(Some(draft)) => drafts.push(draft),
                Ok(None) => {}
                Err(message) => errors.push(message),
            },
            Err(e) => errors.push(format!("line {}: {}", line, e)),
        }
    }

    (drafts, errors)
}

/// Render catalog rows as CSV with a header row
pub fn write_export(items: &[CatalogItem]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for item in items {
        writer.write_record([
            item.name.as_str(),
            item.classification.as_str(),
            item.category.as_deref().unwrap_or_default(),
            item.default_unit.as_deref().unwrap_or_default(),
            item.kana.as_deref().unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::Error::Io(e.into_error()))
}
