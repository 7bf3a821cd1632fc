//! Header row scanning.

use std::collections::HashMap;

use crate::types::Sheet;

/// Build a header -> column index by scanning columns 1..=max_col of one
/// header row, left to right.
///
/// Cell values are rendered to text and trimmed; non-empty labels map to
/// their 1-based column. A label appearing twice keeps the later column
/// (last write wins). Empty and whitespace-only cells are never indexed.
/// An empty or partially populated header row simply yields a smaller index.
#[must_use]
pub fn header_index(sheet: &Sheet, header_row: u32) -> HashMap<String, u32> {
    let mut idx = HashMap::new();
    for col in 1..=sheet.max_col {
        if let Some(value) = sheet.value_at(header_row, col) {
            let label = value.to_text();
            let trimmed = label.trim();
            if !trimmed.is_empty() {
                idx.insert(trimmed.to_string(), col);
            }
        }
    }
    idx
}
