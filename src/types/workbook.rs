use std::collections::BTreeMap;

use super::{Cell, CellData, Value};

/// A complete workbook: an ordered collection of sheets with unique names.
///
/// The source workbook of a merge is read-only; the target workbook is
/// mutated in place and becomes the output artifact. Workbooks are built
/// fresh per merge invocation and hold no state across invocations.
#[derive(Debug, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    /// Whether the originating archive embeds a VBA project
    /// (`xl/vbaProject.bin`). Callers use this to pick the output
    /// filename/media type.
    pub has_vba: bool,
}

impl Workbook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a sheet by name.
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Look up a sheet by name for mutation.
    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Append a sheet. Order is significant: header/value collection scans
    /// sheets in this order, and later sheets win on duplicate headers.
    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }
}

/// A single worksheet with sparse cell storage.
#[derive(Debug, Default)]
pub struct Sheet {
    pub name: String,
    /// Archive path of the worksheet part this sheet was parsed from
    /// (e.g. "xl/worksheets/sheet1.xml"). Empty for sheets built in memory.
    pub path: String,
    /// Sparse representation: Vec of (row, col, cell), 1-based.
    pub cells: Vec<CellData>,
    /// Row index for fast cell lookup (row number -> cell indices by col).
    pub(crate) cells_by_row: Vec<Vec<usize>>,
    pub max_row: u32,
    pub max_col: u32,
    /// Cells written during the merge, in (row, col) order. The writer
    /// rewrites exactly these in the template's worksheet part.
    pub(crate) patched: BTreeMap<(u32, u32), Value>,
}

impl Sheet {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Read the value at (row, col), both 1-based. `None` means the cell is
    /// absent, which readers treat the same as [`Value::Empty`].
    #[must_use]
    pub fn value_at(&self, row: u32, col: u32) -> Option<&Value> {
        self.cell_index_at(row, col)
            .and_then(|idx| self.cells.get(idx))
            .map(|cd| &cd.cell.v)
    }

    /// Write a value at (row, col), both 1-based.
    ///
    /// Replaces an existing cell's value in place (keeping its style index,
    /// discarding any formula) or inserts a new cell, and records the write
    /// so the template writer knows to patch it.
    pub fn set_value(&mut self, row: u32, col: u32, value: Value) {
        self.patched.insert((row, col), value.clone());

        if let Some(idx) = self.cell_index_at(row, col) {
            if let Some(cell_data) = self.cells.get_mut(idx) {
                cell_data.cell.v = value;
                cell_data.cell.formula = None;
            }
            return;
        }

        let idx = self.cells.len();
        self.cells.push(CellData {
            r: row,
            c: col,
            cell: Cell::value(value),
        });

        let row_slot = row as usize;
        if self.cells_by_row.len() <= row_slot {
            self.cells_by_row.resize(row_slot + 1, Vec::new());
        }
        let cells = &self.cells;
        if let Some(row_cells) = self.cells_by_row.get_mut(row_slot) {
            let pos = row_cells
                .partition_point(|&i| cells.get(i).map(|cd| cd.c < col).unwrap_or(false));
            row_cells.insert(pos, idx);
        }

        if row > self.max_row {
            self.max_row = row;
        }
        if col > self.max_col {
            self.max_col = col;
        }
    }

    /// Style index of the cell at (row, col), if the cell exists and has one.
    #[must_use]
    pub fn style_at(&self, row: u32, col: u32) -> Option<u32> {
        self.cell_index_at(row, col)
            .and_then(|idx| self.cells.get(idx))
            .and_then(|cd| cd.cell.style_idx)
    }

    pub(crate) fn cell_index_at(&self, row: u32, col: u32) -> Option<usize> {
        if self.cells_by_row.is_empty() {
            return self.cells.iter().position(|c| c.r == row && c.c == col);
        }
        let row_cells = self.cells_by_row.get(row as usize)?;
        let pos = row_cells
            .partition_point(|&i| self.cells.get(i).map(|cell| cell.c < col).unwrap_or(false));
        let idx = row_cells.get(pos).copied()?;
        self.cells
            .get(idx)
            .is_some_and(|cell| cell.r == row && cell.c == col)
            .then_some(idx)
    }

    pub(crate) fn rebuild_cell_index(&mut self) {
        if self.cells.is_empty() {
            self.cells_by_row = Vec::new();
            return;
        }

        let max_row = self.cells.iter().map(|c| c.r).max().unwrap_or(0) as usize;
        let mut rows: Vec<Vec<usize>> = vec![Vec::new(); max_row + 1];

        for (idx, cell) in self.cells.iter().enumerate() {
            let row = cell.r as usize;
            if let Some(row_cells) = rows.get_mut(row) {
                row_cells.push(idx);
            }
        }

        for row_cells in &mut rows {
            row_cells.sort_by_key(|&i| self.cells.get(i).map(|cell| cell.c).unwrap_or(u32::MAX));
        }

        self.cells_by_row = rows;
    }
}
