//! Merge configuration: the user-supplied transfer plan.
//!
//! Decoded from JSON with serde. All maps are [`IndexMap`] so the declared
//! document order is preserved exactly: table mappings run in declared order
//! and `columns` order is the left-to-right column order written into the
//! target block.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A (target sheet name, target cell reference) destination pair, e.g.
/// `["Summary", "B2"]`.
pub type TargetRef = (String, String);

/// The complete transfer plan for one merge invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Source header label -> target destination. The value is looked up
    /// under the header (row 2 of whichever source sheet defines it).
    pub single_fields_by_header: IndexMap<String, TargetRef>,

    /// Explicit source locator ("SheetName!CellRef") -> target destination.
    #[serde(default)]
    pub single_fields_by_cell: IndexMap<String, TargetRef>,

    /// Source sheet name -> table transfer spec.
    #[serde(default)]
    pub table_mappings: IndexMap<String, TableMapping>,
}

impl MergeConfig {
    /// Decode a configuration from its JSON document.
    ///
    /// # Errors
    /// Returns [`crate::MergeError::Config`] when the document does not
    /// structurally decode. Semantic validation (headers and sheets actually
    /// existing) happens during the merge itself.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Declarative spec for copying a run of rows out of one source sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMapping {
    /// Target sheet receiving the block.
    pub sheet_target: String,

    /// 1-based header row in the source sheet; data starts one row below.
    #[serde(default = "default_header_row")]
    pub header_row: u32,

    /// 1-based target anchor row of the first copied row.
    pub start_row_target: u32,

    /// 1-based target anchor column of the first copied column.
    pub start_col_target: u32,

    /// Ordered source header label -> logical template label. The value is
    /// only documentation; the key order alone decides column placement.
    pub columns: IndexMap<String, String>,

    /// Optional cap on copied rows.
    #[serde(default)]
    pub max_rows: Option<u32>,
}

fn default_header_row() -> u32 {
    1
}
