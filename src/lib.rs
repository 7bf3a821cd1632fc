//! xlmerge - merges computed spreadsheet data into formatted templates
//!
//! Takes a computed "source" workbook and a formatted "target" template
//! (XLSX or XLSM), plus a declarative merge configuration, and copies:
//! - single fields located by header label,
//! - single fields located by explicit `Sheet!Cell` locator,
//! - table blocks of rows, column-by-column, until a blank row or a cap.
//!
//! The output is the template's own bytes with only the touched cells
//! rewritten, so styles, column widths, and embedded macros survive.
//!
//! # Usage
//!
//! ```
//! use xlmerge::{merge, MergeConfig, Sheet, Value, Workbook};
//!
//! let mut source = Workbook::new();
//! let mut data = Sheet::new("Data");
//! data.set_value(1, 1, Value::from("Status"));
//! data.set_value(2, 1, Value::from("Done"));
//! source.add_sheet(data);
//!
//! let mut target = Workbook::new();
//! target.add_sheet(Sheet::new("Summary"));
//!
//! let config = MergeConfig::from_json(
//!     r#"{"single_fields_by_header": {"Status": ["Summary", "B2"]}}"#,
//! )?;
//! merge(&source, &mut target, &config)?;
//!
//! let summary = target.sheet("Summary").unwrap();
//! assert_eq!(summary.value_at(2, 2), Some(&Value::from("Done")));
//! # Ok::<(), xlmerge::MergeError>(())
//! ```
//!
//! For real files, [`parser::parse`] loads workbooks from bytes and
//! [`writer::write`] patches the merged values back into the template bytes.

pub mod cell_ref;
pub mod config;
pub mod error;
pub mod merge;
pub mod parser;
pub mod types;
pub mod writer;

pub use config::{MergeConfig, TableMapping};
pub use error::{MergeError, Result};
pub use merge::merge;
pub use types::*;

/// Get the library version
#[must_use]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
