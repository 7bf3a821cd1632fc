//! XLSX loading.
//!
//! Realizes the "load workbook from bytes" collaborator capability: opens
//! the ZIP archive, resolves workbook relationships, decodes shared strings,
//! and parses each worksheet part's cell values into the in-memory model.
//! Styles are carried as opaque indices and formulas as preserved text; no
//! formatting is interpreted.

mod relationships;
mod worksheet;

use std::io::Cursor;
use zip::ZipArchive;

use crate::error::Result;
use crate::types::Workbook;

use relationships::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use worksheet::parse_sheet;

/// Parse an XLSX/XLSM file from bytes.
///
/// # Errors
/// Returns an error if the bytes are not a readable spreadsheet archive or
/// a required part is malformed.
pub fn parse(data: &[u8]) -> Result<Workbook> {
    let cursor = Cursor::new(data);
    let mut archive = ZipArchive::new(cursor)?;

    // Parse workbook relationships first to get actual file paths
    let relationships = parse_workbook_relationships(&mut archive);

    // Parse shared strings using path from relationships
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());

    // Get sheet names and paths from xl/workbook.xml
    let sheet_info = get_sheet_info(&mut archive, &relationships.worksheets)?;

    // Parse each sheet
    let mut sheets = Vec::new();
    for info in sheet_info {
        let sheet = parse_sheet(&mut archive, &info, &shared_strings)?;
        sheets.push(sheet);
    }

    let has_vba = archive.by_name("xl/vbaProject.bin").is_ok();

    Ok(Workbook { sheets, has_vba })
}
