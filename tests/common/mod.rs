//! Test fixtures for generating valid XLSX files in memory.
//!
//! Provides a builder for creating XLSX/XLSM files programmatically, useful
//! for testing the parser, merge engine, and template writer with known
//! inputs.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Cell Value
// ============================================================================

/// Represents a cell value that can be added to a sheet.
#[derive(Debug, Clone)]
pub enum FixtureValue {
    /// A string value stored in the shared string table.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// An error value (e.g., "#DIV/0!").
    Error(String),
    /// An inline string (not shared).
    InlineString(String),
    /// A formula with its cached result.
    Formula(String, f64),
    /// An empty cell (style only).
    Empty,
}

impl From<&str> for FixtureValue {
    fn from(s: &str) -> Self {
        FixtureValue::String(s.to_string())
    }
}

impl From<f64> for FixtureValue {
    fn from(n: f64) -> Self {
        FixtureValue::Number(n)
    }
}

impl From<i32> for FixtureValue {
    fn from(n: i32) -> Self {
        FixtureValue::Number(f64::from(n))
    }
}

impl From<bool> for FixtureValue {
    fn from(b: bool) -> Self {
        FixtureValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

/// A cell in the sheet.
#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: FixtureValue,
    pub style_index: Option<u32>,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: Vec::new(),
        }
    }

    /// Add a cell with a value.
    #[must_use]
    pub fn cell<V: Into<FixtureValue>>(mut self, cell_ref: &str, value: V) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style_index: None,
        });
        self
    }

    /// Add a cell with a value and an explicit style index.
    #[must_use]
    pub fn styled_cell<V: Into<FixtureValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style_index: u32,
    ) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style_index: Some(style_index),
        });
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for creating complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    with_vba: bool,
    extra_files: Vec<(String, Vec<u8>)>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet.
    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Embed a fake VBA project so the archive reads as macro-enabled.
    #[must_use]
    pub fn with_vba(mut self) -> Self {
        self.with_vba = true;
        self
    }

    /// Add an arbitrary extra archive entry (e.g. media) that the writer
    /// must carry through untouched.
    #[must_use]
    pub fn extra_file(mut self, name: &str, data: &[u8]) -> Self {
        self.extra_files.push((name.to_string(), data.to_vec()));
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        // Collect shared strings across all sheets
        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let FixtureValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let _ = zip.start_file("[Content_Types].xml", options);
        let _ = zip.write_all(generate_content_types(self.sheets.len(), self.with_vba).as_bytes());

        let _ = zip.start_file("_rels/.rels", options);
        let _ = zip.write_all(RELS_XML.as_bytes());

        let _ = zip.start_file("xl/_rels/workbook.xml.rels", options);
        let _ = zip.write_all(generate_workbook_rels(self.sheets.len()).as_bytes());

        let _ = zip.start_file("xl/workbook.xml", options);
        let _ = zip.write_all(generate_workbook(&self.sheets).as_bytes());

        let _ = zip.start_file("xl/styles.xml", options);
        let _ = zip.write_all(STYLES_XML.as_bytes());

        if !shared_strings.is_empty() {
            let _ = zip.start_file("xl/sharedStrings.xml", options);
            let _ = zip.write_all(generate_shared_strings(&shared_strings).as_bytes());
        }

        for (i, sheet) in self.sheets.iter().enumerate() {
            let path = format!("xl/worksheets/sheet{}.xml", i + 1);
            let _ = zip.start_file(&path, options);
            let _ = zip.write_all(generate_sheet_xml(sheet, &shared_strings).as_bytes());
        }

        if self.with_vba {
            let _ = zip.start_file("xl/vbaProject.bin", options);
            let _ = zip.write_all(FAKE_VBA_PROJECT);
        }

        for (name, data) in &self.extra_files {
            let _ = zip.start_file(name, options);
            let _ = zip.write_all(data);
        }

        let cursor = zip.finish().expect("Failed to finish ZIP");
        cursor.into_inner()
    }
}

/// Recognizable stand-in bytes for an embedded VBA project.
pub const FAKE_VBA_PROJECT: &[u8] = b"\xd0\xcf\x11\xe0fake-vba-project-payload";

// ============================================================================
// XML generation
// ============================================================================

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

/// Minimal stylesheet with a handful of cell formats so `s="N"` attributes
/// in fixtures resolve to something real.
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts>
  <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
  <borders count="1"><border><left/><right/><top/><bottom/></border></borders>
  <cellXfs count="4">
    <xf fontId="0" fillId="0" borderId="0"/>
    <xf fontId="1" fillId="0" borderId="0"/>
    <xf fontId="0" fillId="0" borderId="0" numFmtId="14" applyNumberFormat="1"/>
    <xf fontId="1" fillId="0" borderId="0" numFmtId="4" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_content_types(sheet_count: usize, with_vba: bool) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    if with_vba {
        xml.push_str(r#"<Default Extension="bin" ContentType="application/vnd.ms-office.vbaProject"/>"#);
    }
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    let shared_id = sheet_count + 1;
    xml.push_str(&format!(
        r#"<Relationship Id="rId{shared_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            xml_escape(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
        strings.len(),
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!("<si><t>{}</t></si>", xml_escape(s)));
    }
    xml.push_str("</sst>");
    xml
}

/// Parse a cell reference like "B5" into (col, row), both 1-based.
fn parse_cell_ref(cell_ref: &str) -> (u32, u32) {
    let mut col = 0u32;
    let mut row = 0u32;
    for ch in cell_ref.chars() {
        if ch.is_ascii_alphabetic() {
            col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else if ch.is_ascii_digit() {
            row = row * 10 + (ch as u32 - '0' as u32);
        }
    }
    (col, row)
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    xml.push_str("<sheetData>");

    // Group cells by row, ordered by column within each row
    let mut rows: BTreeMap<u32, BTreeMap<u32, &CellEntry>> = BTreeMap::new();
    for cell in &sheet.cells {
        let (col, row) = parse_cell_ref(&cell.cell_ref);
        rows.entry(row).or_default().insert(col, cell);
    }

    for (row_num, cells) in rows {
        xml.push_str(&format!(r#"<row r="{row_num}">"#));
        for cell in cells.values() {
            let mut cell_attrs = format!(r#"r="{}""#, cell.cell_ref);
            if let Some(s) = cell.style_index {
                cell_attrs.push_str(&format!(r#" s="{s}""#));
            }
            match &cell.value {
                FixtureValue::String(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap_or(0);
                    xml.push_str(&format!(r#"<c {cell_attrs} t="s"><v>{idx}</v></c>"#));
                }
                FixtureValue::Number(n) => {
                    xml.push_str(&format!(r#"<c {cell_attrs}><v>{n}</v></c>"#));
                }
                FixtureValue::Boolean(b) => {
                    let v = i32::from(*b);
                    xml.push_str(&format!(r#"<c {cell_attrs} t="b"><v>{v}</v></c>"#));
                }
                FixtureValue::Error(e) => {
                    xml.push_str(&format!(r#"<c {cell_attrs} t="e"><v>{e}</v></c>"#));
                }
                FixtureValue::InlineString(s) => {
                    xml.push_str(&format!(
                        r#"<c {cell_attrs} t="inlineStr"><is><t>{}</t></is></c>"#,
                        xml_escape(s)
                    ));
                }
                FixtureValue::Formula(f, cached) => {
                    xml.push_str(&format!(
                        r#"<c {cell_attrs}><f>{}</f><v>{cached}</v></c>"#,
                        xml_escape(f)
                    ));
                }
                FixtureValue::Empty => {
                    xml.push_str(&format!("<c {cell_attrs}/>"));
                }
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}
