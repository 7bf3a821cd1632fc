//! Structured error types for xlmerge.
//!
//! Every failure in a merge is synchronous and fail-fast: the first error
//! aborts the whole operation and carries the identifying detail (header
//! name, sheet name, locator string) the caller needs to report it.

/// All errors that can occur while loading, merging, or saving workbooks.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Merge configuration does not structurally decode.
    #[error("Invalid merge configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A header referenced in `single_fields_by_header` is absent from the
    /// source workbook's header/value table.
    #[error("header '{header}' not found in source workbook")]
    HeaderNotFound { header: String },

    /// A table column header is absent from the source sheet's header row.
    #[error("column '{header}' not found in sheet '{sheet}'")]
    ColumnNotFound { header: String, sheet: String },

    /// A `single_fields_by_cell` key lacks the `Sheet!Cell` separator.
    #[error("malformed source locator '{locator}' (expected 'Sheet!Cell')")]
    MalformedLocator { locator: String },

    /// A referenced source or target sheet does not exist in its workbook.
    #[error("sheet '{sheet}' not found")]
    SheetNotFound { sheet: String },

    /// Invalid cell reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MergeError>;
