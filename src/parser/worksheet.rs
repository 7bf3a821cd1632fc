//! Worksheet parsing - parses individual sheet XML into Sheet structs.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufReader, Read};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::types::{Cell, CellData, Sheet, Value};

/// Sheet metadata from workbook.xml
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone)]
enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// Parse a dimension range like "A1:B10" or "A1" into its (end_col, end_row).
fn parse_dimension_end(ref_str: &[u8]) -> Option<(u32, u32)> {
    let end = match ref_str.iter().position(|&b| b == b':') {
        Some(pos) => ref_str.get(pos + 1..)?,
        None => ref_str,
    };
    parse_cell_ref_bytes(end)
}

/// Resolve the raw `<v>`/`<is>` text and type tag into a scalar value.
fn resolve_value(raw: Option<String>, tag: CellTypeTag, shared_strings: &[String]) -> Value {
    let Some(raw) = raw else {
        return Value::Empty;
    };
    match tag {
        CellTypeTag::Shared => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|idx| shared_strings.get(idx).cloned())
            .map_or(Value::Empty, Value::Text),
        CellTypeTag::Inline | CellTypeTag::Str => Value::Text(raw),
        CellTypeTag::Bool => Value::Bool(raw.trim() == "1"),
        CellTypeTag::Error => Value::Error(raw),
        CellTypeTag::Default => match raw.trim().parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(raw),
        },
    }
}

/// Parse a single worksheet part into the sparse sheet model.
pub(super) fn parse_sheet<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
) -> Result<Sheet> {
    let file = archive.by_name(&info.path)?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut sheet = Sheet::new(&info.name);
    sheet.path = info.path.clone();

    let mut buf = Vec::new();
    let mut cell_buf = Vec::new();
    let mut text_buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"dimension" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"ref" {
                                if let Some((end_col, end_row)) = parse_dimension_end(&attr.value) {
                                    if end_row > sheet.max_row {
                                        sheet.max_row = end_row;
                                    }
                                    if end_col > sheet.max_col {
                                        sheet.max_col = end_col;
                                    }
                                }
                            }
                        }
                    }

                    b"row" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"r" {
                                if let Some(row) = parse_u32_bytes(&attr.value) {
                                    if row > sheet.max_row {
                                        sheet.max_row = row;
                                    }
                                }
                            }
                        }
                    }

                    b"c" => {
                        // Cell element - parse cell attributes first
                        let mut cell_ref: Option<(u32, u32)> = None;
                        let mut cell_type = CellTypeTag::Default;
                        let mut style_idx: Option<u32> = None;

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    cell_ref = parse_cell_ref_bytes(&attr.value);
                                }
                                b"t" => {
                                    cell_type = parse_cell_type_tag(&attr.value);
                                }
                                b"s" => {
                                    style_idx = parse_u32_bytes(&attr.value);
                                }
                                _ => {}
                            }
                        }

                        // Read cell value and formula from child elements.
                        // Only Start events have children; self-closing cells
                        // like <c r="A1" s="2"/> carry style only.
                        let mut value: Option<String> = None;
                        let mut formula: Option<String> = None;
                        if is_start_event {
                            loop {
                                cell_buf.clear();
                                match xml.read_event_into(&mut cell_buf) {
                                    Ok(Event::Start(ref inner)) => {
                                        match inner.local_name().as_ref() {
                                            b"v" | b"t" => {
                                                // Value or inline text (direct child of <c>)
                                                text_buf.clear();
                                                if let Ok(Event::Text(text)) =
                                                    xml.read_event_into(&mut text_buf)
                                                {
                                                    if let Ok(t) = text.unescape() {
                                                        value = Some(t.to_string());
                                                    }
                                                }
                                            }
                                            b"f" => {
                                                text_buf.clear();
                                                if let Ok(Event::Text(text)) =
                                                    xml.read_event_into(&mut text_buf)
                                                {
                                                    if let Ok(t) = text.unescape() {
                                                        formula = Some(t.to_string());
                                                    }
                                                }
                                            }
                                            b"is" => {
                                                // Inline string container; concatenate every
                                                // <t> run inside <is> (plain or rich text).
                                                let mut inline = String::new();
                                                let mut in_t = false;
                                                loop {
                                                    text_buf.clear();
                                                    match xml.read_event_into(&mut text_buf) {
                                                        Ok(Event::Start(ref is_inner)) => {
                                                            if is_inner.local_name().as_ref()
                                                                == b"t"
                                                            {
                                                                in_t = true;
                                                            }
                                                        }
                                                        Ok(Event::Text(ref text)) if in_t => {
                                                            if let Ok(t) = text.unescape() {
                                                                inline.push_str(&t);
                                                            }
                                                        }
                                                        Ok(Event::End(ref is_inner)) => {
                                                            match is_inner.local_name().as_ref() {
                                                                b"t" => in_t = false,
                                                                b"is" => break,
                                                                _ => {}
                                                            }
                                                        }
                                                        Ok(Event::Eof) | Err(_) => break,
                                                        _ => {}
                                                    }
                                                }
                                                value = Some(inline);
                                            }
                                            _ => {}
                                        }
                                    }
                                    Ok(Event::End(ref inner)) => {
                                        if inner.local_name().as_ref() == b"c" {
                                            break;
                                        }
                                    }
                                    Ok(Event::Eof) | Err(_) => break,
                                    _ => {}
                                }
                            }
                        }

                        // Cells without a parseable reference can't be placed.
                        if let Some((col, row)) = cell_ref {
                            if col > sheet.max_col {
                                sheet.max_col = col;
                            }
                            if row > sheet.max_row {
                                sheet.max_row = row;
                            }

                            sheet.cells.push(CellData {
                                r: row,
                                c: col,
                                cell: Cell {
                                    v: resolve_value(value, cell_type, shared_strings),
                                    style_idx,
                                    formula,
                                },
                            });
                        }
                    }

                    _ => {}
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    sheet.rebuild_cell_index();
    Ok(sheet)
}
