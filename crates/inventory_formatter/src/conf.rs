//! Checklist constants and default preset factories.

use crate::spec::{
    SpecAuditHeaders, SpecCellFormat, SpecChecklistOptions, SpecChecklistStyle,
    SpecColumnWidthPolicy, SpecPaddingPolicy, SpecPageSetup,
};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Sentinel written into audit cells that must be bordered but left blank.
pub const C_PLACEHOLDER: &str = "tempValue";
/// Audit date column header.
pub const C_HEADER_INVENTORY_DATE: &str = "Inventory Date";
/// Checkmark glyph (header and first-row value).
pub const C_CHECKMARK: &str = "✓";
/// Audit initials column header.
pub const C_HEADER_INITIALS: &str = "Initials";
/// Initials shown in the end-date annotation when none were supplied.
pub const C_ANNOTATION_INITIALS_MISSING: &str = "N/A";

/// Header names removed on every request.
pub const TUP_PRUNE_BASELINE: [&str; 3] =
    ["Imprint", "Digital Availability", "Electronic Availability"];
/// Header removed by `remove_author`.
pub const C_HEADER_AUTHOR: &str = "Author";
/// Header removed by `remove_location`.
pub const C_HEADER_LOCATION: &str = "Location";
/// Header removed by `remove_isbn`.
pub const C_HEADER_ISBN: &str = "ISBN/ISSN";
/// Header removed by `remove_edition`.
pub const C_HEADER_EDITION: &str = "Edition";
/// Header removed by `remove_availability`.
pub const C_HEADER_AVAILABILITY: &str = "Availability";

/// First padded row; row 2 holds the populated audit values.
pub const N_ROW_PADDING_FIRST: usize = 3;
/// Last padded row, closing a 15-row audit block under the header.
pub const N_ROW_PADDING_LAST: usize = 15;
/// Blank rows inserted above the data header.
pub const N_ROWS_HEADER_BLOCK: usize = 2;
/// Minimum column display width.
pub const N_WIDTH_COLUMN_FLOOR: usize = 10;

/// Font family applied to every cell.
pub const C_FONT_NAME: &str = "Arial";
/// Font size applied to every cell.
pub const N_FONT_SIZE: i64 = 12;
/// Thin border style code.
pub const N_BORDER_THIN: i64 = 1;

/// Number format for decoded date cells.
pub const C_NUM_FORMAT_DATE: &str = "m/d/yyyy";
/// Number format for decoded date-time cells.
pub const C_NUM_FORMAT_DATETIME: &str = "m/d/yyyy h:mm";
/// Number format for decoded time-of-day cells.
pub const C_NUM_FORMAT_TIME: &str = "h:mm:ss";
/// Text written for boolean cells, `[false, true]`.
pub const TUP_BOOL_TEXT: [&str; 2] = ["FALSE", "TRUE"];

/// Default row height in points.
pub const N_DEFAULT_ROW_HEIGHT: f64 = 15.0;
/// Default column width in characters.
pub const N_DEFAULT_COL_WIDTH: f64 = 10.0;

/// Workbook author stamped by the normalizer.
pub const C_CREATOR: &str = "RBR Inventory Formatter";
/// Download file name.
pub const C_FILE_NAME_OUT: &str = "ProcessedFile.xlsx";
/// MIME type of the emitted document.
pub const C_MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Build default style presets used by the header block and style pass.
pub fn derive_default_checklist_style() -> SpecChecklistStyle {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some(C_FONT_NAME.to_string()),
        font_size: Some(N_FONT_SIZE),
        ..Default::default()
    };

    SpecChecklistStyle {
        fmt_header: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        }),
        fmt_header_block: SpecCellFormat {
            text_wrap: Some(true),
            ..Default::default()
        },
        fmt_border: SpecCellFormat {
            border: Some(N_BORDER_THIN),
            ..Default::default()
        },
        fmt_annotation: SpecCellFormat {
            align: Some("right".to_string()),
            ..Default::default()
        },
        fmt_base: cfg_base_fmt_spec,
    }
}

/// Build default page setup: landscape, one page wide.
pub fn derive_default_page_setup() -> SpecPageSetup {
    SpecPageSetup {
        if_landscape: true,
        fit_to_width: 1,
        fit_to_height: 0,
        default_row_height: N_DEFAULT_ROW_HEIGHT,
        default_col_width: N_DEFAULT_COL_WIDTH,
        header_text: None,
        footer_text: None,
    }
}

/// Build default pipeline options.
pub fn derive_default_checklist_options() -> SpecChecklistOptions {
    SpecChecklistOptions {
        creator: C_CREATOR.to_string(),
        placeholder: C_PLACEHOLDER.to_string(),
        audit_headers: SpecAuditHeaders {
            date: C_HEADER_INVENTORY_DATE.to_string(),
            checkmark: C_CHECKMARK.to_string(),
            initials: C_HEADER_INITIALS.to_string(),
        },
        annotation_initials_missing: C_ANNOTATION_INITIALS_MISSING.to_string(),
        prune_baseline: TUP_PRUNE_BASELINE.iter().map(ToString::to_string).collect(),
        padding: SpecPaddingPolicy {
            row_first: N_ROW_PADDING_FIRST,
            row_last: N_ROW_PADDING_LAST,
        },
        n_rows_header_block: N_ROWS_HEADER_BLOCK,
        style: derive_default_checklist_style(),
        width: SpecColumnWidthPolicy {
            width_floor: N_WIDTH_COLUMN_FLOOR,
        },
        page: derive_default_page_setup(),
        file_name_out: C_FILE_NAME_OUT.to_string(),
    }
}

impl Default for SpecChecklistOptions {
    fn default() -> Self {
        derive_default_checklist_options()
    }
}
