//! XLSX saving.
//!
//! Realizes the "serialize workbook to bytes" collaborator capability as a
//! template round trip: every entry of the original template archive is
//! copied verbatim — styles, column widths, macros, drawings all survive —
//! except worksheet parts whose cells the merge touched. Those are rewritten
//! event-by-event: untouched rows and cells pass through unchanged, patched
//! cells are re-emitted with their original style index and the merged value,
//! and rows or cells that did not exist in the template are inserted in
//! document order.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::cell_ref::{make_cell_ref, parse_cell_ref_bytes};
use crate::error::Result;
use crate::types::{Value, Workbook};

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Serialize a merged workbook back to bytes, patching the original template.
///
/// `template` must be the same bytes the target workbook was parsed from:
/// patches are applied to worksheet parts by archive path. Sheets built in
/// memory (no archive path) cannot be patched and are skipped.
///
/// # Errors
/// Returns an error if the template archive cannot be read or a worksheet
/// part cannot be rewritten.
pub fn write(template: &[u8], workbook: &Workbook) -> Result<Vec<u8>> {
    let patched_paths: HashMap<&str, &BTreeMap<(u32, u32), Value>> = workbook
        .sheets
        .iter()
        .filter(|s| !s.patched.is_empty() && !s.path.is_empty())
        .map(|s| (s.path.as_str(), &s.patched))
        .collect();

    if patched_paths.is_empty() {
        // Nothing changed — return original bytes
        return Ok(template.to_vec());
    }

    let mut archive = ZipArchive::new(Cursor::new(template))?;
    let buf: Vec<u8> = Vec::with_capacity(template.len());
    let mut zip = ZipWriter::new(Cursor::new(buf));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    // Copy all entries, replacing patched ones
    for i in 0..archive.len() {
        let name = archive.by_index_raw(i)?.name().to_string();

        if let Some(patches) = patched_paths.get(name.as_str()) {
            let mut xml = Vec::new();
            archive.by_index(i)?.read_to_end(&mut xml)?;
            let patched = patch_sheet_xml(&xml, patches)?;
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&patched)?;
        } else {
            // Pass through unmodified entry (raw copy, no re-compression)
            zip.raw_copy_file(archive.by_index_raw(i)?)?;
        }
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Rewrite one worksheet part, applying the patch set.
fn patch_sheet_xml(xml: &[u8], patches: &BTreeMap<(u32, u32), Value>) -> Result<Vec<u8>> {
    // Group the patch set by row for in-order flushing.
    let mut pending: BTreeMap<u32, BTreeMap<u32, Value>> = BTreeMap::new();
    for (&(row, col), value) in patches {
        pending.entry(row).or_default().insert(col, value.clone());
    }

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut buf = Vec::new();
    let mut in_sheet_data = false;
    let mut current_row: u32 = 0;
    // Patches for the row element currently open, if any.
    let mut row_patches: BTreeMap<u32, Value> = BTreeMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,

            Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheetData" => {
                in_sheet_data = true;
                writer.write_event(Event::Start(e))?;
            }

            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheetData" => {
                // Template sheet with no data at all: synthesize the rows.
                if pending.is_empty() {
                    writer.write_event(Event::Empty(e))?;
                } else {
                    writer.write_event(Event::Start(e))?;
                    flush_rows_before(&mut writer, &mut pending, None)?;
                    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
                }
            }

            Ok(Event::End(e)) if e.local_name().as_ref() == b"sheetData" => {
                flush_rows_before(&mut writer, &mut pending, None)?;
                in_sheet_data = false;
                writer.write_event(Event::End(e))?;
            }

            Ok(Event::Start(e)) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = row_number(&e).unwrap_or(current_row + 1);
                flush_rows_before(&mut writer, &mut pending, Some(row))?;
                current_row = row;
                row_patches = pending.remove(&row).unwrap_or_default();
                writer.write_event(Event::Start(e))?;
            }

            Ok(Event::Empty(e)) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                // Attribute-only row with no cells.
                let row = row_number(&e).unwrap_or(current_row + 1);
                flush_rows_before(&mut writer, &mut pending, Some(row))?;
                current_row = row;
                if let Some(cells) = pending.remove(&row) {
                    writer.write_event(Event::Start(e))?;
                    for (&col, value) in &cells {
                        emit_cell(&mut writer, row, col, None, value)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new("row")))?;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }

            Ok(Event::End(e)) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let remaining = std::mem::take(&mut row_patches);
                for (&col, value) in &remaining {
                    emit_cell(&mut writer, current_row, col, None, value)?;
                }
                writer.write_event(Event::End(e))?;
            }

            Ok(Event::Start(e)) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                patch_or_copy_cell(
                    &mut reader,
                    &mut writer,
                    &mut row_patches,
                    current_row,
                    &e,
                    true,
                )?;
            }

            Ok(Event::Empty(e)) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                patch_or_copy_cell(
                    &mut reader,
                    &mut writer,
                    &mut row_patches,
                    current_row,
                    &e,
                    false,
                )?;
            }

            Ok(event) => {
                writer.write_event(event)?;
            }

            Err(e) => return Err(e.into()),
        }
        buf.clear();
    }

    Ok(writer.into_inner().into_inner())
}

/// Handle one original `<c>` element: flush patched cells that sort before
/// it, then either replace it (keeping its style, dropping its content and
/// formula) or copy it through untouched.
fn patch_or_copy_cell(
    reader: &mut Reader<&[u8]>,
    writer: &mut XmlWriter,
    row_patches: &mut BTreeMap<u32, Value>,
    current_row: u32,
    e: &BytesStart,
    is_start_event: bool,
) -> Result<()> {
    let col = cell_column(e);

    // Insert any patched cells that sort before this one.
    if let Some(col) = col {
        let earlier: Vec<u32> = row_patches.range(..col).map(|(&c, _)| c).collect();
        for c in earlier {
            if let Some(value) = row_patches.remove(&c) {
                emit_cell(writer, current_row, c, None, &value)?;
            }
        }
    }

    if let Some((col, value)) = col.and_then(|c| row_patches.remove(&c).map(|v| (c, v))) {
        if is_start_event {
            skip_to_cell_end(reader)?;
        }
        let style = cell_style(e);
        emit_cell(writer, current_row, col, style.as_deref(), &value)?;
        return Ok(());
    }

    if is_start_event {
        writer.write_event(Event::Start(e.to_owned()))?;
        copy_to_cell_end(reader, writer)?;
    } else {
        writer.write_event(Event::Empty(e.to_owned()))?;
    }
    Ok(())
}

/// Emit every pending patch row ordered before `limit` (all of them when
/// `limit` is `None`) as complete new `<row>` elements.
fn flush_rows_before(
    writer: &mut XmlWriter,
    pending: &mut BTreeMap<u32, BTreeMap<u32, Value>>,
    limit: Option<u32>,
) -> Result<()> {
    let rows: Vec<u32> = match limit {
        Some(limit) => pending.range(..limit).map(|(&r, _)| r).collect(),
        None => pending.keys().copied().collect(),
    };
    for row in rows {
        if let Some(cells) = pending.remove(&row) {
            let mut start = BytesStart::new("row");
            start.push_attribute(("r", row.to_string().as_str()));
            writer.write_event(Event::Start(start))?;
            for (&col, value) in &cells {
                emit_cell(writer, row, col, None, value)?;
            }
            writer.write_event(Event::End(BytesEnd::new("row")))?;
        }
    }
    Ok(())
}

/// Emit one `<c>` element for a merged value.
fn emit_cell(
    writer: &mut XmlWriter,
    row: u32,
    col: u32,
    style: Option<&str>,
    value: &Value,
) -> Result<()> {
    let cell_ref = make_cell_ref(col, row);
    let mut c = BytesStart::new("c");
    c.push_attribute(("r", cell_ref.as_str()));
    if let Some(s) = style {
        c.push_attribute(("s", s));
    }

    let body = match value {
        Value::Text(s) => Some((Some("inlineStr"), s.clone())),
        Value::Number(n) => Some((None, n.to_string())),
        Value::Bool(b) => Some((Some("b"), if *b { "1" } else { "0" }.to_string())),
        Value::Error(e) => Some((Some("e"), e.clone())),
        Value::Empty => None,
    };

    let Some((type_tag, text)) = body else {
        writer.write_event(Event::Empty(c))?;
        return Ok(());
    };

    if let Some(t) = type_tag {
        c.push_attribute(("t", t));
    }
    writer.write_event(Event::Start(c))?;
    if matches!(value, Value::Text(_)) {
        writer.write_event(Event::Start(BytesStart::new("is")))?;
        writer.write_event(Event::Start(BytesStart::new("t")))?;
        writer.write_event(Event::Text(BytesText::new(&text)))?;
        writer.write_event(Event::End(BytesEnd::new("t")))?;
        writer.write_event(Event::End(BytesEnd::new("is")))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new("v")))?;
        writer.write_event(Event::Text(BytesText::new(&text)))?;
        writer.write_event(Event::End(BytesEnd::new("v")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

/// Discard events up to and including the matching `</c>`.
fn skip_to_cell_end(reader: &mut Reader<&[u8]>) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"c" => break,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }
        buf.clear();
    }
    Ok(())
}

/// Copy events verbatim up to and including the matching `</c>`.
fn copy_to_cell_end(reader: &mut Reader<&[u8]>, writer: &mut XmlWriter) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(event) => {
                let done = matches!(event, Event::End(ref e) if e.local_name().as_ref() == b"c");
                writer.write_event(event)?;
                if done {
                    break;
                }
            }
            Err(e) => return Err(e.into()),
        }
        buf.clear();
    }
    Ok(())
}

fn row_number(e: &BytesStart) -> Option<u32> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"r" {
            return std::str::from_utf8(&attr.value).ok()?.parse().ok();
        }
    }
    None
}

fn cell_column(e: &BytesStart) -> Option<u32> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"r" {
            return parse_cell_ref_bytes(&attr.value).map(|(col, _)| col);
        }
    }
    None
}

fn cell_style(e: &BytesStart) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"s" {
            return std::str::from_utf8(&attr.value).ok().map(ToString::to_string);
        }
    }
    None
}
