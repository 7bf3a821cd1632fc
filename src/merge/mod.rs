//! The merge engine.
//!
//! Orchestrates the parsing-free core of the system: resolve headers to
//! column positions, validate the configuration against the actual workbook
//! contents, and run the three transfer passes in fixed order.

mod header_index;
mod single_fields;
mod table;

pub use header_index::header_index;

use crate::config::MergeConfig;
use crate::error::Result;
use crate::types::Workbook;

/// Run one merge: single-field passes, then each table mapping in declared
/// order.
///
/// The target workbook is mutated in place and is the output artifact. Any
/// validation failure aborts the whole merge immediately; writes that already
/// happened are not rolled back, but the operation as a whole is reported as
/// failed.
///
/// # Errors
/// See [`crate::MergeError`] for the failure kinds; every error names the
/// offending header, sheet, or locator.
pub fn merge(source: &Workbook, target: &mut Workbook, config: &MergeConfig) -> Result<()> {
    let header_values = single_fields::collect_header_values(source);
    single_fields::apply_by_header(target, &header_values, config)?;
    single_fields::apply_by_cell(source, target, config)?;

    for (src_sheet, spec) in &config.table_mappings {
        table::apply_table(source, target, src_sheet, spec)?;
    }

    Ok(())
}
