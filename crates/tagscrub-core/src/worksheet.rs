//! Worksheet type

use std::collections::{BTreeMap, BTreeSet};

use crate::cell::{CellAddress, CellData, CellRange, CellValue};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
///
/// Cells are kept in a sparse row-major map: a row that has no stored cell
/// does not exist as far as iteration is concerned.
///
/// The sheet remembers which cells were written through [`Worksheet::set_value_at`]
/// or [`Worksheet::value_at_mut`] since it was loaded, so a writer can re-emit
/// the original sheet with only those cells changed.
#[derive(Debug, Default)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Row index → column index → cell
    rows: BTreeMap<u32, BTreeMap<u16, CellData>>,
    /// Cells written after load, as (row, col)
    edited: BTreeSet<(u32, u16)>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell by 0-based row and column
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Get a cell value by address string, `Empty` when nothing is stored
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self
            .value_at(addr.row, addr.col)
            .cloned()
            .unwrap_or_default())
    }

    /// Borrow the value at a 0-based position
    pub fn value_at(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cell_at(row, col).map(|c| &c.value)
    }

    /// Mutable access to a stored value.
    ///
    /// The cell is recorded as edited as soon as this returns `Some`, so only
    /// ask for it when a change is actually going to be made.
    pub fn value_at_mut(&mut self, row: u32, col: u16) -> Option<&mut CellValue> {
        let cell = self.rows.get_mut(&row).and_then(|r| r.get_mut(&col))?;
        self.edited.insert((row, col));
        Some(&mut cell.value)
    }

    /// Set a value by address string, marking the cell edited
    pub fn set_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_value_at(addr.row, addr.col, value)
    }

    /// Set a value by 0-based position, keeping any existing style.
    pub fn set_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) -> Result<()> {
        Self::check_bounds(row, col)?;
        self.rows
            .entry(row)
            .or_default()
            .entry(col)
            .or_default()
            .value = value.into();
        self.edited.insert((row, col));
        Ok(())
    }

    /// Store a cell exactly as read from a file, without marking it edited.
    pub fn load_cell(&mut self, row: u32, col: u16, cell: CellData) -> Result<()> {
        Self::check_bounds(row, col)?;
        self.rows.entry(row).or_default().insert(col, cell);
        Ok(())
    }

    fn check_bounds(row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(u32::from(col), MAX_COLS - 1));
        }
        Ok(())
    }

    // === Iteration ===

    /// 0-based indices of rows that hold at least one cell, ascending
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows
            .iter()
            .filter(|(_, cells)| !cells.is_empty())
            .map(|(row, _)| *row)
    }

    /// Cells of one row, ascending by column
    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|cells| cells.iter().map(|(col, cell)| (*col, cell)))
    }

    /// All stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(row, cells)| cells.iter().map(move |(col, cell)| (*row, *col, cell)))
    }

    /// Stored cells inside `range` in row-major order. Only the rows and
    /// columns the range spans are visited.
    pub fn cells_in_range(&self, range: &CellRange) -> impl Iterator<Item = (u32, u16, &CellData)> {
        let cols = range.start.col..=range.end.col;
        self.rows
            .range(range.start.row..=range.end.row)
            .flat_map(move |(row, cells)| {
                cells
                    .range(cols.clone())
                    .map(move |(col, cell)| (*row, *col, cell))
            })
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    // === Edit tracking ===

    /// Cells written since load, in row-major order
    pub fn edited_cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        self.edited
            .iter()
            .map(|(row, col)| CellAddress::new(*row, *col))
    }

    pub fn is_edited(&self, row: u32, col: u16) -> bool {
        self.edited.contains(&(row, col))
    }

    pub fn has_edits(&self) -> bool {
        !self.edited.is_empty()
    }

    /// Forget edit history, e.g. after the sheet has been saved
    pub fn clear_edits(&mut self) {
        self.edited.clear();
    }
}
