//! Single-field transfers: header-keyed and cell-keyed scalar copies.

use std::collections::HashMap;

use super::header_index::header_index;
use crate::cell_ref::parse_cell_ref;
use crate::config::MergeConfig;
use crate::error::{MergeError, Result};
use crate::types::{Value, Workbook};

/// Row immediately below the header row that holds a header's scalar value.
const HEADER_VALUE_ROW: u32 = 2;

/// Flatten every source sheet's row-1 headers into one header -> value table.
///
/// Sheets are scanned in workbook order, so a header appearing in more than
/// one sheet keeps the later sheet's value. This is a per-invocation local
/// accumulator; nothing survives the merge call.
pub(super) fn collect_header_values(source: &Workbook) -> HashMap<String, Value> {
    let mut values = HashMap::new();
    for sheet in &source.sheets {
        for (label, col) in header_index(sheet, 1) {
            let value = sheet
                .value_at(HEADER_VALUE_ROW, col)
                .cloned()
                .unwrap_or_default();
            values.insert(label, value);
        }
    }
    values
}

/// Apply every `single_fields_by_header` entry to the target.
pub(super) fn apply_by_header(
    target: &mut Workbook,
    header_values: &HashMap<String, Value>,
    config: &MergeConfig,
) -> Result<()> {
    for (header, (tgt_sheet, tgt_cell)) in &config.single_fields_by_header {
        let value = header_values
            .get(header)
            .ok_or_else(|| MergeError::HeaderNotFound {
                header: header.clone(),
            })?;
        write_target(target, tgt_sheet, tgt_cell, value.clone())?;
    }
    Ok(())
}

/// Apply every `single_fields_by_cell` entry to the target.
pub(super) fn apply_by_cell(
    source: &Workbook,
    target: &mut Workbook,
    config: &MergeConfig,
) -> Result<()> {
    for (locator, (tgt_sheet, tgt_cell)) in &config.single_fields_by_cell {
        let Some((src_sheet_name, src_cell)) = locator.split_once('!') else {
            return Err(MergeError::MalformedLocator {
                locator: locator.clone(),
            });
        };
        let src_sheet = source
            .sheet(src_sheet_name)
            .ok_or_else(|| MergeError::SheetNotFound {
                sheet: src_sheet_name.to_string(),
            })?;
        let (col, row) = parse_cell_ref(src_cell)?;
        let value = src_sheet.value_at(row, col).cloned().unwrap_or_default();
        write_target(target, tgt_sheet, tgt_cell, value)?;
    }
    Ok(())
}

fn write_target(
    target: &mut Workbook,
    sheet_name: &str,
    cell_ref: &str,
    value: Value,
) -> Result<()> {
    let sheet = target
        .sheet_mut(sheet_name)
        .ok_or_else(|| MergeError::SheetNotFound {
            sheet: sheet_name.to_string(),
        })?;
    let (col, row) = parse_cell_ref(cell_ref)?;
    sheet.set_value(row, col, value);
    Ok(())
}
