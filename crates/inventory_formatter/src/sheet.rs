//! In-memory workbook model: sparse 1-based cell grid plus sheet-level layout.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use crate::conf::{C_CREATOR, derive_default_page_setup};
use crate::spec::{EnumCellValue, SpecCellFormat, SpecPageSetup};

static VALUE_NONE: EnumCellValue = EnumCellValue::None;

////////////////////////////////////////////////////////////////////////////////
// #region Cell

/// One grid cell: value plus format.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecCell {
    /// Cell value.
    pub value: EnumCellValue,
    /// Cell format.
    pub format: SpecCellFormat,
}

impl SpecCell {
    /// A cell with no value is empty regardless of format.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Worksheet

/// Sparse worksheet grid indexed by 1-based `(row, col)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecWorksheet {
    /// Sheet name.
    pub name: String,
    /// Page/view settings.
    pub page: SpecPageSetup,
    cells: BTreeMap<(usize, usize), SpecCell>,
    widths_by_col: BTreeMap<usize, f64>,
}

impl SpecWorksheet {
    /// Empty worksheet with default page setup.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page: derive_default_page_setup(),
            cells: BTreeMap::new(),
            widths_by_col: BTreeMap::new(),
        }
    }

    /// Build a worksheet from row-major values; `grid[0]` lands on row 1.
    ///
    /// Empty strings are not stored.
    pub fn from_rows<R, V>(name: impl Into<String>, grid: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<EnumCellValue>,
    {
        let mut worksheet = Self::new(name);
        for (n_idx_row, row) in grid.into_iter().enumerate() {
            for (n_idx_col, value) in row.into_iter().enumerate() {
                let value = value.into();
                if !value.is_empty() {
                    worksheet.set_value(n_idx_row + 1, n_idx_col + 1, value);
                }
            }
        }
        worksheet
    }

    /// Last used row (0 when the sheet is empty).
    pub fn n_rows(&self) -> usize {
        self.cells.keys().map(|(row, _)| *row).max().unwrap_or(0)
    }

    /// Last used column (0 when the sheet is empty).
    pub fn n_cols(&self) -> usize {
        self.cells.keys().map(|(_, col)| *col).max().unwrap_or(0)
    }

    /// Stored cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<&SpecCell> {
        self.cells.get(&(row, col))
    }

    /// Value at `(row, col)`; missing cells read as [`EnumCellValue::None`].
    pub fn value(&self, row: usize, col: usize) -> &EnumCellValue {
        self.cells
            .get(&(row, col))
            .map_or(&VALUE_NONE, |cell| &cell.value)
    }

    /// Text at `(row, col)` when the cell holds text.
    pub fn text(&self, row: usize, col: usize) -> Option<&str> {
        self.value(row, col).as_str()
    }

    /// Mutable cell at `(row, col)`, created on demand.
    pub fn cell_mut(&mut self, row: usize, col: usize) -> &mut SpecCell {
        debug_assert!(row >= 1 && col >= 1, "cell indices are 1-based");
        self.cells.entry((row, col)).or_default()
    }

    /// Overwrite the value at `(row, col)`, keeping its format.
    pub fn set_value(&mut self, row: usize, col: usize, value: impl Into<EnumCellValue>) {
        self.cell_mut(row, col).value = value.into();
    }

    /// Stored cells of `row` in column order.
    pub fn row_cells(&self, row: usize) -> impl Iterator<Item = (usize, &SpecCell)> {
        self.cells
            .range((row, 0)..=(row, usize::MAX))
            .map(|((_, col), cell)| (*col, cell))
    }

    /// Every stored cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), &SpecCell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    /// Row values as display text, padded with blanks to [`Self::n_cols`].
    pub fn row_texts(&self, row: usize) -> Vec<String> {
        (1..=self.n_cols())
            .map(|col| self.value(row, col).to_display_text())
            .collect()
    }

    /// Remove column `col`, shifting every column to its right one step left.
    pub fn delete_column(&mut self, col: usize) {
        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .filter(|((_, c), _)| *c != col)
            .map(|((r, c), cell)| ((r, if c > col { c - 1 } else { c }), cell))
            .collect();

        let widths = std::mem::take(&mut self.widths_by_col);
        self.widths_by_col = widths
            .into_iter()
            .filter(|(c, _)| *c != col)
            .map(|(c, w)| (if c > col { c - 1 } else { c }, w))
            .collect();
    }

    /// Insert `n` blank rows before `row`, pushing `row..` down by `n`.
    pub fn insert_rows(&mut self, row: usize, n: usize) {
        if n == 0 {
            return;
        }
        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .map(|((r, c), cell)| ((if r >= row { r + n } else { r }, c), cell))
            .collect();
    }

    /// Record display width of column `col`.
    pub fn set_column_width(&mut self, col: usize, width: f64) {
        self.widths_by_col.insert(col, width);
    }

    /// Recorded display width of column `col`.
    pub fn column_width(&self, col: usize) -> Option<f64> {
        self.widths_by_col.get(&col).copied()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderIndex

/// Header text -> 1-based column positions, built once from one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecHeaderIndex {
    dict_pos: BTreeMap<String, Vec<usize>>,
}

impl SpecHeaderIndex {
    /// Index the text cells of `row`.
    pub fn from_row(worksheet: &SpecWorksheet, row: usize) -> Self {
        let mut dict_pos: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (col, cell) in worksheet.row_cells(row) {
            if let Some(text) = cell.value.as_str()
                && !text.is_empty()
            {
                dict_pos.entry(text.to_string()).or_default().push(col);
            }
        }
        Self { dict_pos }
    }

    /// Columns whose header equals `header` exactly.
    pub fn positions(&self, header: &str) -> &[usize] {
        self.dict_pos.get(header).map_or(&[], Vec::as_slice)
    }

    /// First column whose header equals `header` exactly.
    pub fn first(&self, header: &str) -> Option<usize> {
        self.positions(header).first().copied()
    }

    /// Headers that appear in more than one column.
    pub fn duplicates(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.dict_pos
            .iter()
            .filter(|(_, l_pos)| l_pos.len() > 1)
            .map(|(header, l_pos)| (header.as_str(), l_pos.as_slice()))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workbook

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecWorkbookMeta {
    /// Author written to document properties.
    pub creator: String,
    /// Timestamp of this transformation; also the inventory date.
    pub created: DateTime<Local>,
}

impl Default for SpecWorkbookMeta {
    fn default() -> Self {
        Self {
            creator: C_CREATOR.to_string(),
            created: Local::now(),
        }
    }
}

/// Ordered worksheets plus metadata. Only the first sheet is processed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecWorkbook {
    /// Document metadata.
    pub meta: SpecWorkbookMeta,
    /// Worksheets in source order.
    pub worksheets: Vec<SpecWorksheet>,
}

impl SpecWorkbook {
    /// Workbook wrapping `worksheets`.
    pub fn new(worksheets: Vec<SpecWorksheet>) -> Self {
        Self {
            meta: SpecWorkbookMeta::default(),
            worksheets,
        }
    }

    /// Mutable access to the worksheet operated on.
    pub fn primary_mut(&mut self) -> Option<&mut SpecWorksheet> {
        self.worksheets.first_mut()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn create_sheet(grid: &[&[&str]]) -> SpecWorksheet {
        SpecWorksheet::from_rows("Sheet1", grid.iter().map(|row| row.iter().copied()))
    }

    #[test]
    fn test_used_range_tracks_sparse_cells() {
        let mut ws = SpecWorksheet::new("Sheet1");
        assert_eq!((ws.n_rows(), ws.n_cols()), (0, 0));

        ws.set_value(4, 2, "x");
        ws.cell_mut(1, 6).format.bold = Some(true);
        assert_eq!((ws.n_rows(), ws.n_cols()), (4, 6));
        assert!(ws.get(1, 6).is_some_and(SpecCell::is_empty));
    }

    #[test]
    fn test_delete_column_shifts_cells_and_widths_left() {
        let mut ws = create_sheet(&[&["A", "B", "C", "D"], &["a", "b", "c", "d"]]);
        ws.set_column_width(3, 12.0);
        ws.set_column_width(4, 20.0);

        ws.delete_column(2);

        assert_eq!(ws.row_texts(1), vec!["A", "C", "D"]);
        assert_eq!(ws.row_texts(2), vec!["a", "c", "d"]);
        assert_eq!(ws.column_width(2), Some(12.0));
        assert_eq!(ws.column_width(3), Some(20.0));
        assert_eq!(ws.column_width(4), None);
    }

    #[test]
    fn test_insert_rows_pushes_rows_down() {
        let mut ws = create_sheet(&[&["H1", "H2"], &["v1", "v2"]]);
        ws.insert_rows(1, 2);

        assert_eq!(ws.n_rows(), 4);
        assert!(ws.value(1, 1).is_empty());
        assert!(ws.value(2, 2).is_empty());
        assert_eq!(ws.text(3, 1), Some("H1"));
        assert_eq!(ws.text(4, 2), Some("v2"));
    }

    #[test]
    fn test_header_index_reports_duplicates() {
        let ws = create_sheet(&[&["Title", "Author", "Title", ""]]);
        let index = SpecHeaderIndex::from_row(&ws, 1);

        assert_eq!(index.positions("Title"), &[1, 3]);
        assert_eq!(index.first("Author"), Some(2));
        assert!(index.positions("Edition").is_empty());
        assert_eq!(index.duplicates().collect::<Vec<_>>(), vec![("Title", &[1, 3][..])]);
    }
}
