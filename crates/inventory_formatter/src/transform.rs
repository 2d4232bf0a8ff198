//! Structural edits applied to the processed worksheet, one function per stage.
//!
//! Every stage mutates the grid in place. Their relative order matters and is
//! enforced by [`crate::pipeline::Checklist`]; calling them directly is meant
//! for tests and custom pipelines.

use tracing::debug;

use crate::sheet::{SpecHeaderIndex, SpecWorkbook, SpecWorkbookMeta, SpecWorksheet};
use crate::spec::{
    ChecklistError, EnumCellValue, SpecAuditContext, SpecChecklistOptions, SpecChecklistReport,
    SpecChecklistStyle, SpecColumnWidthPolicy, SpecPaddingPolicy, SpecPruneConfig,
};
use crate::util::{
    derive_descending_indices, estimate_display_width, format_end_date_annotation,
    format_inventory_date,
};

/// Header row index before the header block is inserted.
pub const N_ROW_HEADER: usize = 1;
/// First data row, which receives the populated audit values.
pub const N_ROW_AUDIT_FIRST: usize = 2;

/// Column positions of the three injected audit columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecAuditColumns {
    /// Inventory date column.
    pub col_date: usize,
    /// Checkmark column.
    pub col_checkmark: usize,
    /// Initials column.
    pub col_initials: usize,
}

impl SpecAuditColumns {
    /// Three consecutive columns starting at `col_start`.
    pub fn starting_at(col_start: usize) -> Self {
        Self {
            col_date: col_start,
            col_checkmark: col_start + 1,
            col_initials: col_start + 2,
        }
    }

    /// Columns in left-to-right order.
    pub fn to_array(self) -> [usize; 3] {
        [self.col_date, self.col_checkmark, self.col_initials]
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region WorkbookNormalizer

/// Stamp metadata and page defaults; fail when there is nothing to process.
pub fn normalize_workbook(
    workbook: &mut SpecWorkbook,
    options: &SpecChecklistOptions,
) -> Result<(), ChecklistError> {
    workbook.meta.creator = options.creator.clone();

    let worksheet = workbook
        .primary_mut()
        .ok_or(ChecklistError::NoWorksheet)?;
    worksheet.page = options.page.clone();

    if worksheet
        .row_cells(N_ROW_HEADER)
        .all(|(_, cell)| cell.is_empty())
    {
        return Err(ChecklistError::MissingHeaderRow(worksheet.name.clone()));
    }

    debug!(
        sheet = %worksheet.name,
        n_rows = worksheet.n_rows(),
        n_cols = worksheet.n_cols(),
        "normalized workbook"
    );
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region AuditColumnInjector

/// Append date/checkmark/initials columns after the last used column.
///
/// Row 1 gets the headers, row 2 the inventory date, the checkmark and the
/// initials (or the placeholder when none were supplied).
pub fn inject_audit_columns(
    worksheet: &mut SpecWorksheet,
    audit_ctx: &SpecAuditContext,
    inventory_date: &str,
    options: &SpecChecklistOptions,
) -> SpecAuditColumns {
    let audit_cols = SpecAuditColumns::starting_at(worksheet.n_cols() + 1);
    let headers = &options.audit_headers;

    worksheet.set_value(N_ROW_HEADER, audit_cols.col_date, headers.date.as_str());
    worksheet.set_value(
        N_ROW_HEADER,
        audit_cols.col_checkmark,
        headers.checkmark.as_str(),
    );
    worksheet.set_value(
        N_ROW_HEADER,
        audit_cols.col_initials,
        headers.initials.as_str(),
    );

    worksheet.set_value(N_ROW_AUDIT_FIRST, audit_cols.col_date, inventory_date);
    worksheet.set_value(
        N_ROW_AUDIT_FIRST,
        audit_cols.col_checkmark,
        headers.checkmark.as_str(),
    );
    worksheet.set_value(
        N_ROW_AUDIT_FIRST,
        audit_cols.col_initials,
        audit_ctx
            .initials_trimmed()
            .unwrap_or(options.placeholder.as_str()),
    );

    debug!(col_start = audit_cols.col_date, "injected audit columns");
    audit_cols
}

/// Inventory date text, taken from the workbook creation timestamp.
pub fn derive_inventory_date(meta: &SpecWorkbookMeta) -> String {
    format_inventory_date(&meta.created)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowPaddingEngine

/// Fill the audit columns of the policy rows with the placeholder.
///
/// Returns the number of padded rows.
pub fn pad_audit_rows(
    worksheet: &mut SpecWorksheet,
    audit_cols: SpecAuditColumns,
    policy: &SpecPaddingPolicy,
    placeholder: &str,
) -> usize {
    for row in policy.row_first..=policy.row_last {
        for col in audit_cols.to_array() {
            worksheet.set_value(row, col, placeholder);
        }
    }

    debug!(
        row_first = policy.row_first,
        row_last = policy.row_last,
        "padded audit rows"
    );
    policy.n_rows()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnPruningEngine

/// Delete every column whose row-1 header is in `prune_config`.
///
/// Columns are removed from the highest index down so pending indices stay
/// valid. Configured names missing from the sheet are ignored. Returns the
/// removed headers in original column order.
pub fn prune_columns(
    worksheet: &mut SpecWorksheet,
    prune_config: &SpecPruneConfig,
    report: &mut SpecChecklistReport,
) -> Vec<String> {
    let header_index = SpecHeaderIndex::from_row(worksheet, N_ROW_HEADER);

    for (c_header, l_pos) in header_index.duplicates() {
        if prune_config.contains(c_header) {
            report.warn(format!(
                "Header {c_header:?} appears in {} columns {l_pos:?}; all were removed.",
                l_pos.len()
            ));
        }
    }

    let mut l_matched: Vec<(usize, String)> = Vec::new();
    for c_header in &prune_config.headers {
        let l_pos = header_index.positions(c_header);
        l_matched.extend(l_pos.iter().map(|col| (*col, c_header.clone())));
    }

    let l_cols_idx: Vec<usize> = l_matched.iter().map(|(col, _)| *col).collect();
    for col in derive_descending_indices(&l_cols_idx) {
        worksheet.delete_column(col);
    }

    l_matched.sort_unstable_by_key(|(col, _)| *col);
    let l_removed: Vec<String> = l_matched.into_iter().map(|(_, name)| name).collect();

    debug!(removed = ?l_removed, "pruned columns");
    l_removed
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderBlockInserter

/// Insert `n_rows_block` blank rows on top and embolden the block plus header.
///
/// The blank rows also wrap text so long notes stay readable.
pub fn insert_header_block(
    worksheet: &mut SpecWorksheet,
    n_rows_block: usize,
    style: &SpecChecklistStyle,
) {
    worksheet.insert_rows(1, n_rows_block);

    let n_cols = worksheet.n_cols();
    for row in 1..=n_rows_block + 1 {
        for col in 1..=n_cols {
            let cell = worksheet.cell_mut(row, col);
            cell.format.apply(&style.fmt_header);
            if row <= n_rows_block {
                cell.format.apply(&style.fmt_header_block);
            }
        }
    }

    debug!(n_rows_block, "inserted header block");
}

/// Write the end-date note into row 1 above the initials header.
///
/// Returns the annotated column, or `None` when no end date was given or the
/// initials header is gone.
pub fn stamp_end_date_annotation(
    worksheet: &mut SpecWorksheet,
    audit_ctx: &SpecAuditContext,
    row_header: usize,
    options: &SpecChecklistOptions,
) -> Option<usize> {
    let end_date = audit_ctx.end_date_trimmed()?;
    let col = SpecHeaderIndex::from_row(worksheet, row_header)
        .first(&options.audit_headers.initials)?;

    let c_annotation = format_end_date_annotation(
        end_date,
        audit_ctx.initials_trimmed(),
        &options.annotation_initials_missing,
    );
    let cell = worksheet.cell_mut(1, col);
    cell.value = EnumCellValue::String(c_annotation);
    cell.format.apply(&options.style.fmt_annotation);

    debug!(col, "stamped end-date annotation");
    Some(col)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleAndLayoutEngine

/// Set fonts on the whole used range, border non-empty cells, clear sentinels.
///
/// The border is decided before the placeholder is cleared, so padding cells
/// end up empty but bordered.
pub fn apply_checklist_styles(
    worksheet: &mut SpecWorksheet,
    style: &SpecChecklistStyle,
    placeholder: &str,
) {
    let n_rows = worksheet.n_rows();
    let n_cols = worksheet.n_cols();

    let mut n_cleared = 0usize;
    for row in 1..=n_rows {
        for col in 1..=n_cols {
            let cell = worksheet.cell_mut(row, col);
            cell.format.apply(&style.fmt_base);
            if cell.is_empty() {
                continue;
            }
            cell.format.apply(&style.fmt_border);
            if cell.value.as_str() == Some(placeholder) {
                cell.value = EnumCellValue::None;
                n_cleared += 1;
            }
        }
    }

    debug!(n_rows, n_cols, n_cleared, "applied checklist styles");
}

/// Set each column's width to its longest rendered value, at least the floor.
pub fn estimate_column_widths(worksheet: &mut SpecWorksheet, policy: &SpecColumnWidthPolicy) {
    let n_cols = worksheet.n_cols();
    let mut l_width_by_col = vec![policy.width_floor; n_cols + 1];

    for ((_, col), cell) in worksheet.cells() {
        l_width_by_col[col] =
            usize::max(l_width_by_col[col], estimate_display_width(&cell.value));
    }

    for (col, n_width) in l_width_by_col.into_iter().enumerate().skip(1) {
        worksheet.set_column_width(col, n_width as f64);
    }

    debug!(n_cols, "estimated column widths");
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::conf::C_CHECKMARK;

    fn create_sheet(grid: &[&[&str]]) -> SpecWorksheet {
        SpecWorksheet::from_rows("Sheet1", grid.iter().map(|row| row.iter().copied()))
    }

    fn create_prune_config(headers: &[&str]) -> SpecPruneConfig {
        headers.iter().copied().collect()
    }

    #[test]
    fn test_normalize_rejects_missing_header_row() {
        let options = SpecChecklistOptions::default();

        let mut workbook = SpecWorkbook::new(vec![]);
        assert!(matches!(
            normalize_workbook(&mut workbook, &options),
            Err(ChecklistError::NoWorksheet)
        ));

        let mut ws = SpecWorksheet::new("Sheet1");
        ws.set_value(2, 1, "orphan");
        let mut workbook = SpecWorkbook::new(vec![ws]);
        assert!(matches!(
            normalize_workbook(&mut workbook, &options),
            Err(ChecklistError::MissingHeaderRow(_))
        ));
    }

    #[test]
    fn test_normalize_sets_creator_and_page_setup() {
        let mut options = SpecChecklistOptions::default();
        options.creator = "Library".to_string();
        options.page.footer_text = Some("&P".to_string());

        let mut workbook = SpecWorkbook::new(vec![create_sheet(&[&["Title"]])]);
        normalize_workbook(&mut workbook, &options).expect("normalize");

        assert_eq!(workbook.meta.creator, "Library");
        let page = &workbook.worksheets[0].page;
        assert!(page.if_landscape);
        assert_eq!((page.fit_to_width, page.fit_to_height), (1, 0));
        assert_eq!(page.footer_text.as_deref(), Some("&P"));
    }

    #[test]
    fn test_inject_audit_columns_follow_last_column_for_any_width() {
        let options = SpecChecklistOptions::default();
        for n_width in 1..=6 {
            let header: Vec<String> = (0..n_width).map(|i| format!("H{i}")).collect();
            let mut ws = SpecWorksheet::from_rows("Sheet1", [header]);

            let audit_cols =
                inject_audit_columns(&mut ws, &SpecAuditContext::default(), "1/2/2025", &options);

            assert_eq!(audit_cols.col_date, n_width + 1);
            assert_eq!(ws.n_cols(), n_width + 3);
            assert_eq!(ws.text(1, n_width + 1), Some("Inventory Date"));
            assert_eq!(ws.text(1, n_width + 2), Some(C_CHECKMARK));
            assert_eq!(ws.text(1, n_width + 3), Some("Initials"));
            assert_eq!(ws.text(2, n_width + 1), Some("1/2/2025"));
            assert_eq!(ws.text(2, n_width + 2), Some(C_CHECKMARK));
            assert_eq!(ws.text(2, n_width + 3), Some("tempValue"));
        }
    }

    #[test]
    fn test_inject_audit_columns_uses_supplied_initials() {
        let options = SpecChecklistOptions::default();
        let mut ws = create_sheet(&[&["Title"], &["Dune"]]);
        let ctx = SpecAuditContext {
            initials: Some(" EP ".to_string()),
            end_date: None,
        };

        let audit_cols = inject_audit_columns(&mut ws, &ctx, "1/2/2025", &options);
        assert_eq!(ws.text(2, audit_cols.col_initials), Some("EP"));
    }

    #[test]
    fn test_pad_audit_rows_fills_rows_3_to_15() {
        let options = SpecChecklistOptions::default();
        let mut ws = create_sheet(&[&["Title"], &["Dune"], &["Emma"]]);
        let audit_cols =
            inject_audit_columns(&mut ws, &SpecAuditContext::default(), "1/2/2025", &options);

        let n_padded = pad_audit_rows(&mut ws, audit_cols, &options.padding, "tempValue");

        assert_eq!(n_padded, 13);
        assert_eq!(ws.n_rows(), 15);
        for row in 3..=15 {
            for col in audit_cols.to_array() {
                assert_eq!(ws.text(row, col), Some("tempValue"), "row {row} col {col}");
            }
            assert!(ws.value(row, 1).is_empty() || row == 3);
        }
        assert_eq!(ws.text(3, 1), Some("Emma"));
        assert!(ws.value(16, audit_cols.col_date).is_empty());
    }

    #[test]
    fn test_prune_columns_removes_matches_and_ignores_absent_names() {
        let mut ws = create_sheet(&[
            &["Title", "Author", "Location", "Imprint"],
            &["Dune", "Herbert", "A1", "Ace"],
        ]);
        let mut report = SpecChecklistReport::default();

        let removed = prune_columns(
            &mut ws,
            &create_prune_config(&["Imprint", "Author", "Digital Availability"]),
            &mut report,
        );

        assert_eq!(removed, vec!["Author", "Imprint"]);
        assert_eq!(ws.row_texts(1), vec!["Title", "Location"]);
        assert_eq!(ws.row_texts(2), vec!["Dune", "A1"]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_prune_columns_with_no_match_keeps_sheet() {
        let mut ws = create_sheet(&[&["Title", "Location"]]);
        let mut report = SpecChecklistReport::default();

        let removed = prune_columns(&mut ws, &create_prune_config(&["Imprint"]), &mut report);

        assert!(removed.is_empty());
        assert_eq!(ws.row_texts(1), vec!["Title", "Location"]);
    }

    #[test]
    fn test_prune_columns_ignores_duplicates_outside_prune_list() {
        let mut ws = create_sheet(&[&["Title", "Notes", "Notes", "Imprint"]]);
        let mut report = SpecChecklistReport::default();

        let removed = prune_columns(&mut ws, &create_prune_config(&["Imprint"]), &mut report);

        assert_eq!(removed, vec!["Imprint"]);
        assert_eq!(ws.row_texts(1), vec!["Title", "Notes", "Notes"]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_prune_columns_adjacent_and_non_adjacent_pairs() {
        let grid: &[&[&str]] = &[&["A", "B", "C", "D", "E"], &["a", "b", "c", "d", "e"]];

        let mut ws_adjacent = create_sheet(grid);
        prune_columns(
            &mut ws_adjacent,
            &create_prune_config(&["B", "C"]),
            &mut SpecChecklistReport::default(),
        );
        assert_eq!(ws_adjacent.row_texts(1), vec!["A", "D", "E"]);
        assert_eq!(ws_adjacent.row_texts(2), vec!["a", "d", "e"]);

        let mut ws_apart = create_sheet(grid);
        prune_columns(
            &mut ws_apart,
            &create_prune_config(&["D", "A"]),
            &mut SpecChecklistReport::default(),
        );
        assert_eq!(ws_apart.row_texts(1), vec!["B", "C", "E"]);
        assert_eq!(ws_apart.row_texts(2), vec!["b", "c", "e"]);
    }

    #[test]
    fn test_prune_columns_removes_all_duplicates_with_warning() {
        let mut ws = create_sheet(&[&["Imprint", "Title", "Imprint"]]);
        let mut report = SpecChecklistReport::default();

        let removed = prune_columns(&mut ws, &create_prune_config(&["Imprint"]), &mut report);

        assert_eq!(removed, vec!["Imprint", "Imprint"]);
        assert_eq!(ws.row_texts(1), vec!["Title"]);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_insert_header_block_bolds_block_and_header() {
        let options = SpecChecklistOptions::default();
        let mut ws = create_sheet(&[&["Title", "Initials"], &["Dune", ""]]);

        insert_header_block(&mut ws, 2, &options.style);

        assert_eq!(ws.text(3, 1), Some("Title"));
        for row in 1..=3 {
            for col in 1..=2 {
                let cell = ws.get(row, col).expect("cell");
                assert_eq!(cell.format.bold, Some(true));
                assert_eq!(cell.format.text_wrap, (row <= 2).then_some(true));
            }
        }
        assert!(ws.get(4, 1).is_some_and(|cell| cell.format.bold.is_none()));
    }

    #[test]
    fn test_stamp_end_date_annotation_above_initials() {
        let options = SpecChecklistOptions::default();
        let mut ws = create_sheet(&[&["", "", ""], &["", "", ""], &["Title", "✓", "Initials"]]);
        let ctx = SpecAuditContext {
            initials: None,
            end_date: Some("6/30/2025".to_string()),
        };

        let col = stamp_end_date_annotation(&mut ws, &ctx, 3, &options);

        assert_eq!(col, Some(3));
        assert_eq!(ws.text(1, 3), Some("End date updated to 6/30/2025 - N/A"));
        let cell = ws.get(1, 3).expect("annotation cell");
        assert_eq!(cell.format.align.as_deref(), Some("right"));
    }

    #[test]
    fn test_stamp_end_date_annotation_skips_without_end_date_or_header() {
        let options = SpecChecklistOptions::default();
        let mut ws = create_sheet(&[&[""], &[""], &["Initials"]]);
        assert_eq!(
            stamp_end_date_annotation(&mut ws, &SpecAuditContext::default(), 3, &options),
            None
        );

        let mut ws = create_sheet(&[&[""], &[""], &["Title"]]);
        let ctx = SpecAuditContext {
            initials: Some("EP".to_string()),
            end_date: Some("6/30/2025".to_string()),
        };
        assert_eq!(stamp_end_date_annotation(&mut ws, &ctx, 3, &options), None);
        assert!(ws.value(1, 1).is_empty());
    }

    #[test]
    fn test_apply_styles_borders_then_clears_placeholders() {
        let options = SpecChecklistOptions::default();
        let mut ws = create_sheet(&[&["Title", "Initials"], &["Dune", "tempValue"]]);
        ws.set_value(3, 2, "tempValue");

        apply_checklist_styles(&mut ws, &options.style, "tempValue");

        for (row, col) in [(2, 2), (3, 2)] {
            let cell = ws.get(row, col).expect("padding cell");
            assert!(cell.is_empty(), "({row}, {col}) must be cleared");
            assert!(cell.format.has_full_border());
        }
        let cell_title = ws.get(1, 1).expect("title");
        assert_eq!(cell_title.value, EnumCellValue::from("Title"));
        assert!(cell_title.format.has_full_border());

        let cell_blank = ws.get(3, 1).expect("blank cell is formatted");
        assert_eq!(cell_blank.format.font_name.as_deref(), Some("Arial"));
        assert_eq!(cell_blank.format.font_size, Some(12));
        assert!(!cell_blank.format.has_full_border());
    }

    #[test]
    fn test_apply_styles_keeps_header_bold() {
        let options = SpecChecklistOptions::default();
        let mut ws = create_sheet(&[&["Title"], &["Dune"]]);
        insert_header_block(&mut ws, 2, &options.style);

        apply_checklist_styles(&mut ws, &options.style, "tempValue");

        let cell = ws.get(3, 1).expect("header");
        assert_eq!(cell.format.bold, Some(true));
        assert_eq!(cell.format.font_name.as_deref(), Some("Arial"));
        assert!(ws.get(4, 1).is_some_and(|cell| cell.format.bold.is_none()));
    }

    #[test]
    fn test_estimate_column_widths_respects_floor() {
        let mut ws = create_sheet(&[&["abc", "Inventory Date", ""], &["", "", ""]]);
        ws.set_value(2, 3, "");
        ws.cell_mut(5, 3).format.bold = Some(true);

        estimate_column_widths(&mut ws, &SpecColumnWidthPolicy { width_floor: 10 });

        assert_eq!(ws.column_width(1), Some(10.0));
        assert_eq!(ws.column_width(2), Some(14.0));
        assert_eq!(ws.column_width(3), Some(10.0));
    }
}
