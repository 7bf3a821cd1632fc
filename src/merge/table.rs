//! Table block transfers.

use super::header_index::header_index;
use crate::config::TableMapping;
use crate::error::{MergeError, Result};
use crate::types::{Value, Workbook};

/// Copy a contiguous run of data rows from one source sheet into the target.
///
/// All declared columns are resolved against the source header index before
/// any row is copied, so an unknown column never leaves a partially written
/// block. The scan then advances one source row at a time until it hits a
/// fully blank row (every selected value absent or all-whitespace) or the
/// `max_rows` cap, whichever comes first.
pub(super) fn apply_table(
    source: &Workbook,
    target: &mut Workbook,
    src_sheet_name: &str,
    spec: &TableMapping,
) -> Result<()> {
    let src_sheet = source
        .sheet(src_sheet_name)
        .ok_or_else(|| MergeError::SheetNotFound {
            sheet: src_sheet_name.to_string(),
        })?;
    let Some(tgt_sheet) = target.sheet_mut(&spec.sheet_target) else {
        return Err(MergeError::SheetNotFound {
            sheet: spec.sheet_target.clone(),
        });
    };

    let headers = header_index(src_sheet, spec.header_row);
    let mut source_cols = Vec::with_capacity(spec.columns.len());
    for header in spec.columns.keys() {
        let col = headers
            .get(header.as_str())
            .copied()
            .ok_or_else(|| MergeError::ColumnNotFound {
                header: header.clone(),
                sheet: src_sheet_name.to_string(),
            })?;
        source_cols.push(col);
    }

    let data_start = spec.header_row + 1;
    let mut written: u32 = 0;
    let mut src_row = data_start;
    loop {
        let row_vals: Vec<Value> = source_cols
            .iter()
            .map(|&col| src_sheet.value_at(src_row, col).cloned().unwrap_or_default())
            .collect();
        if row_vals.iter().all(Value::is_blank) {
            break;
        }
        if spec.max_rows.is_some_and(|cap| written >= cap) {
            break;
        }

        let mut tgt_col = spec.start_col_target;
        for value in row_vals {
            tgt_sheet.set_value(spec.start_row_target + written, tgt_col, value);
            tgt_col += 1;
        }

        written += 1;
        src_row += 1;
    }

    Ok(())
}
