//! Stateless helper utilities used by the checklist pipeline.

use chrono::{DateTime, Datelike, TimeZone};

use crate::conf::{
    C_HEADER_AUTHOR, C_HEADER_AVAILABILITY, C_HEADER_EDITION, C_HEADER_ISBN, C_HEADER_LOCATION,
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{
    ChecklistError, EnumCellValue, SpecChecklistOptions, SpecChecklistRequest, SpecPruneConfig,
};

////////////////////////////////////////////////////////////////////////////////
// #region AuditText

/// Format a timestamp as `M/D/YYYY` without zero padding.
pub fn format_inventory_date<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    format!(
        "{}/{}/{}",
        timestamp.month(),
        timestamp.day(),
        timestamp.year()
    )
}

/// Build the out-of-band end-date note written above the initials header.
pub fn format_end_date_annotation(
    end_date: &str,
    initials: Option<&str>,
    missing: &str,
) -> String {
    format!(
        "End date updated to {end_date} - {}",
        initials.unwrap_or(missing)
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnPruning

/// Resolve request toggles plus `baseline` into the set of headers to remove.
pub fn derive_prune_config(
    request: &SpecChecklistRequest,
    baseline: &[String],
) -> SpecPruneConfig {
    let mut prune_config: SpecPruneConfig = baseline.iter().cloned().collect();

    for (if_selected, c_header) in [
        (request.remove_author, C_HEADER_AUTHOR),
        (request.remove_location, C_HEADER_LOCATION),
        (request.remove_isbn, C_HEADER_ISBN),
        (request.remove_edition, C_HEADER_EDITION),
        (request.remove_availability, C_HEADER_AVAILABILITY),
    ] {
        if if_selected {
            prune_config.headers.insert(c_header.to_string());
        }
    }

    prune_config
}

/// Sort column indices from highest to lowest, dropping repeats.
///
/// Deleting in this order keeps every pending index valid.
pub fn derive_descending_indices(indices: &[usize]) -> Vec<usize> {
    let mut l_indices = indices.to_vec();
    l_indices.sort_unstable_by(|a, b| b.cmp(a));
    l_indices.dedup();
    l_indices
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Layout

/// Rendered character length of one cell value; empty cells count as zero.
pub fn estimate_display_width(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => s.chars().count(),
        EnumCellValue::Number(n) => n.to_string().chars().count(),
    }
}

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Convert a 1-based row to the writer's 0-based row number.
pub fn cast_row_num(row: usize) -> Result<u32, String> {
    if row == 0 || row > N_NROWS_EXCEL_MAX {
        return Err(format!("row index out of range: {row}"));
    }
    u32::try_from(row - 1).map_err(|_| format!("row index overflow: {row}"))
}

/// Convert a 1-based column to the writer's 0-based column number.
pub fn cast_col_num(col: usize) -> Result<u16, String> {
    if col == 0 || col > N_NCOLS_EXCEL_MAX {
        return Err(format!("column index out of range: {col}"));
    }
    u16::try_from(col - 1).map_err(|_| format!("column index overflow: {col}"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region OptionValidation

/// Reject options the pipeline cannot apply.
pub fn validate_checklist_options(options: &SpecChecklistOptions) -> Result<(), ChecklistError> {
    if options.width.width_floor == 0 {
        return Err(ChecklistError::InvalidOptions(
            "width.width_floor must be >= 1.".to_string(),
        ));
    }
    if options.padding.row_first < 2 {
        return Err(ChecklistError::InvalidOptions(
            "padding.row_first must be >= 2 (row 1 is the header).".to_string(),
        ));
    }
    if options.padding.row_last < options.padding.row_first {
        return Err(ChecklistError::InvalidOptions(
            "padding.row_last must be >= padding.row_first.".to_string(),
        ));
    }
    if options.n_rows_header_block == 0 {
        return Err(ChecklistError::InvalidOptions(
            "n_rows_header_block must be >= 1.".to_string(),
        ));
    }
    if options.placeholder.is_empty() {
        return Err(ChecklistError::InvalidOptions(
            "placeholder must not be empty.".to_string(),
        ));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;

    #[test]
    fn test_format_inventory_date_has_no_zero_padding() {
        let tz = FixedOffset::east_opt(0).expect("offset");
        let ts = tz.with_ymd_and_hms(2024, 3, 7, 9, 0, 0).single().expect("ts");
        assert_eq!(format_inventory_date(&ts), "3/7/2024");

        let ts = tz.with_ymd_and_hms(2025, 11, 21, 0, 0, 0).single().expect("ts");
        assert_eq!(format_inventory_date(&ts), "11/21/2025");
    }

    #[test]
    fn test_end_date_annotation_falls_back_to_missing_text() {
        assert_eq!(
            format_end_date_annotation("6/30/2025", Some("JD"), "N/A"),
            "End date updated to 6/30/2025 - JD"
        );
        assert_eq!(
            format_end_date_annotation("6/30/2025", None, "N/A"),
            "End date updated to 6/30/2025 - N/A"
        );
    }

    #[test]
    fn test_derive_prune_config_adds_selected_headers_to_baseline() {
        let baseline = vec!["Imprint".to_string()];
        let request = SpecChecklistRequest {
            remove_author: true,
            remove_isbn: true,
            ..Default::default()
        };

        let prune_config = derive_prune_config(&request, &baseline);
        assert_eq!(
            prune_config.headers.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Author", "ISBN/ISSN", "Imprint"]
        );

        let prune_config = derive_prune_config(&SpecChecklistRequest::default(), &baseline);
        assert!(prune_config.contains("Imprint"));
        assert!(!prune_config.contains("Author"));
    }

    #[test]
    fn test_derive_descending_indices() {
        assert_eq!(derive_descending_indices(&[2, 7, 3, 7]), vec![7, 3, 2]);
        assert!(derive_descending_indices(&[]).is_empty());
    }

    #[test]
    fn test_estimate_display_width_counts_chars() {
        assert_eq!(estimate_display_width(&EnumCellValue::None), 0);
        assert_eq!(estimate_display_width(&EnumCellValue::from("✓")), 1);
        assert_eq!(estimate_display_width(&EnumCellValue::from("Inventory Date")), 14);
        assert_eq!(estimate_display_width(&EnumCellValue::from(1024.0)), 4);
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Q1/Q2 [draft]", "_"), "Q1_Q2 _draft_");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_cast_indices_are_one_based() {
        assert_eq!(cast_row_num(1), Ok(0));
        assert_eq!(cast_col_num(3), Ok(2));
        assert!(cast_row_num(0).is_err());
        assert!(cast_col_num(N_NCOLS_EXCEL_MAX + 1).is_err());
    }

    #[test]
    fn test_validate_checklist_options() {
        let options = SpecChecklistOptions::default();
        assert!(validate_checklist_options(&options).is_ok());

        let mut options_bad = options.clone();
        options_bad.width.width_floor = 0;
        assert!(matches!(
            validate_checklist_options(&options_bad),
            Err(ChecklistError::InvalidOptions(_))
        ));

        let mut options_bad = options;
        options_bad.padding.row_first = 1;
        assert!(validate_checklist_options(&options_bad).is_err());
    }
}
