//! Checklist models: cell formats, options, request, report and errors.

use std::collections::BTreeSet;
use std::fmt;

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification. `None` fields are left to the next layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Top border override.
    pub top: Option<i64>,
    /// Bottom border override.
    pub bottom: Option<i64>,
    /// Left border override.
    pub left: Option<i64>,
    /// Right border override.
    pub right: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
        }
    }

    /// In-place variant of [`Self::merge`].
    pub fn apply(&mut self, patch: &SpecCellFormat) {
        *self = self.merge(patch);
    }

    /// Whether every side carries a visible border.
    pub fn has_full_border(&self) -> bool {
        let n_all = self.border.unwrap_or(0);
        [self.top, self.bottom, self.left, self.right]
            .iter()
            .all(|side| side.unwrap_or(n_all) > 0)
    }

    /// True when no property is set.
    pub fn is_empty(&self) -> bool {
        *self == SpecCellFormat::default()
    }
}

/// Normalized cell value held by the worksheet grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Blank values and empty strings both count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            EnumCellValue::None => true,
            EnumCellValue::String(s) => s.is_empty(),
            EnumCellValue::Number(_) => false,
        }
    }

    /// Text view of the value, if it holds text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EnumCellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text as it is rendered in a cell (`3.0` renders as `3`).
    pub fn to_display_text(&self) -> String {
        match self {
            EnumCellValue::None => String::new(),
            EnumCellValue::String(s) => s.clone(),
            EnumCellValue::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        EnumCellValue::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        EnumCellValue::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        EnumCellValue::Number(value)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ChecklistOptions

/// Fonts and alignment applied by the style pass and the header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecChecklistStyle {
    /// Font patch applied to every cell in the used range.
    pub fmt_base: SpecCellFormat,
    /// Patch applied to the header block rows (blank rows + data header).
    pub fmt_header: SpecCellFormat,
    /// Patch applied to the blank rows above the data header.
    pub fmt_header_block: SpecCellFormat,
    /// Patch applied to every non-empty cell (and sentinel) in the used range.
    pub fmt_border: SpecCellFormat,
    /// Patch applied to the end-date annotation cell.
    pub fmt_annotation: SpecCellFormat,
}

/// Rows whose audit cells receive the sentinel placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecPaddingPolicy {
    /// First padded row (1-based, inclusive).
    pub row_first: usize,
    /// Last padded row (1-based, inclusive).
    pub row_last: usize,
}

impl SpecPaddingPolicy {
    /// Number of rows covered by the policy.
    pub fn n_rows(&self) -> usize {
        (self.row_last + 1).saturating_sub(self.row_first)
    }
}

/// Column width estimation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecColumnWidthPolicy {
    /// Minimum final width.
    pub width_floor: usize,
}

/// Page/view defaults set on the processed worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPageSetup {
    /// Landscape orientation.
    pub if_landscape: bool,
    /// Pages wide when fitting to page.
    pub fit_to_width: u16,
    /// Pages tall when fitting to page (`0` means as many as needed).
    pub fit_to_height: u16,
    /// Default row height in points.
    pub default_row_height: f64,
    /// Default column width in characters.
    pub default_col_width: f64,
    /// Print header text.
    pub header_text: Option<String>,
    /// Print footer text.
    pub footer_text: Option<String>,
}

/// Audit column labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAuditHeaders {
    /// Date column header.
    pub date: String,
    /// Checkmark glyph used both as header and first-row value.
    pub checkmark: String,
    /// Initials column header.
    pub initials: String,
}

/// Pipeline-wide configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecChecklistOptions {
    /// Workbook author.
    pub creator: String,
    /// Transient marker written into cells that must be bordered.
    pub placeholder: String,
    /// Audit column labels.
    pub audit_headers: SpecAuditHeaders,
    /// Initials fallback in the end-date annotation.
    pub annotation_initials_missing: String,
    /// Header names always removed.
    pub prune_baseline: Vec<String>,
    /// Padding rows.
    pub padding: SpecPaddingPolicy,
    /// Blank rows inserted above the data header.
    pub n_rows_header_block: usize,
    /// Fonts, borders and alignment.
    pub style: SpecChecklistStyle,
    /// Column width policy.
    pub width: SpecColumnWidthPolicy,
    /// Page setup.
    pub page: SpecPageSetup,
    /// File name reported with the output bytes.
    pub file_name_out: String,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RequestSpecification

/// Caller-selected removals and audit values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecChecklistRequest {
    /// Remove the `Author` column.
    pub remove_author: bool,
    /// Remove the `Location` column.
    pub remove_location: bool,
    /// Remove the `ISBN/ISSN` column.
    pub remove_isbn: bool,
    /// Remove the `Edition` column.
    pub remove_edition: bool,
    /// Remove the `Availability` column.
    pub remove_availability: bool,
    /// Initials written into the first audit row.
    pub initials: Option<String>,
    /// Pre-formatted end date; presence triggers the annotation.
    pub end_date: Option<String>,
}

impl SpecChecklistRequest {
    /// Audit values carried by the request.
    pub fn audit_context(&self) -> SpecAuditContext {
        SpecAuditContext {
            initials: self.initials.clone(),
            end_date: self.end_date.clone(),
        }
    }
}

/// Optional audit values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecAuditContext {
    /// Initials of the person taking inventory.
    pub initials: Option<String>,
    /// Pre-formatted end date.
    pub end_date: Option<String>,
}

impl SpecAuditContext {
    /// Initials after trimming; blank input counts as missing.
    pub fn initials_trimmed(&self) -> Option<&str> {
        self.initials
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// End date after trimming; blank input counts as missing.
    pub fn end_date_trimmed(&self) -> Option<&str> {
        self.end_date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Header names to delete. Order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecPruneConfig {
    /// Exact header texts.
    pub headers: BTreeSet<String>,
}

impl SpecPruneConfig {
    /// Whether `header` is configured for removal.
    pub fn contains(&self, header: &str) -> bool {
        self.headers.contains(header)
    }
}

impl<S: Into<String>> FromIterator<S> for SpecPruneConfig {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            headers: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Finished document ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecChecklistOutput {
    /// Encoded `.xlsx` bytes.
    pub bytes: Vec<u8>,
    /// Download file name.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime_type: String,
}

/// Per-request pipeline report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecChecklistReport {
    /// Name of the processed worksheet.
    pub sheet_name: String,
    /// Removed headers, in original column order.
    pub cols_removed: Vec<String>,
    /// First audit column (1-based) at injection time.
    pub col_audit_start: usize,
    /// Rows that received sentinel padding.
    pub n_rows_padded: usize,
    /// Final used row count.
    pub n_rows: usize,
    /// Final used column count.
    pub n_cols: usize,
    /// End-date annotation was written.
    pub if_annotated: bool,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecChecklistReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        tracing::warn!("{}", msg.as_ref());
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} sheet={:?} rows={} cols={} removed={} padded={} annotated={} warnings={}",
            self.sheet_name,
            self.n_rows,
            self.n_cols,
            self.cols_removed.len(),
            self.n_rows_padded,
            self.if_annotated,
            self.warnings.len()
        )
    }
}

impl fmt::Display for SpecChecklistReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[CHECKLIST]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Top-level failure of one checklist request.
#[derive(Debug, Error)]
pub enum ChecklistError {
    /// No input bytes were provided.
    #[error("No file uploaded")]
    MissingInput,
    /// The input could not be decoded into a cell grid.
    #[error("Failed to decode input workbook: {0}")]
    Decode(String),
    /// The decoded workbook has no worksheet.
    #[error("Input workbook contains no worksheet")]
    NoWorksheet,
    /// The processed worksheet has nothing in its header row.
    #[error("Worksheet {0:?} has no header row")]
    MissingHeaderRow(String),
    /// Options that cannot be applied.
    #[error("{0}")]
    InvalidOptions(String),
    /// A cell position beyond Excel limits.
    #[error("{0}")]
    OutOfBounds(String),
    /// Serializer failure.
    #[error("xlsx write error: {0}")]
    Write(#[from] XlsxError),
}

impl ChecklistError {
    /// Whether the failure is the caller's to fix (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingInput | Self::InvalidOptions(_))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_left_values_where_right_is_unset() {
        let fmt_bold = SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        };
        let fmt_font = SpecCellFormat {
            font_name: Some("Arial".to_string()),
            font_size: Some(12),
            ..Default::default()
        };

        let fmt = fmt_bold.merge(&fmt_font);
        assert_eq!(fmt.bold, Some(true));
        assert_eq!(fmt.font_name.as_deref(), Some("Arial"));
        assert_eq!(fmt.font_size, Some(12));
    }

    #[test]
    fn full_border_accepts_side_overrides() {
        let fmt_all = SpecCellFormat {
            border: Some(1),
            ..Default::default()
        };
        assert!(fmt_all.has_full_border());

        let fmt_missing_top = fmt_all.with_(SpecCellFormat {
            top: Some(0),
            ..Default::default()
        });
        assert!(!fmt_missing_top.has_full_border());
        assert!(!SpecCellFormat::default().has_full_border());
    }

    #[test]
    fn cell_value_emptiness_and_display() {
        assert!(EnumCellValue::None.is_empty());
        assert!(EnumCellValue::from("").is_empty());
        assert!(!EnumCellValue::from(0.0).is_empty());
        assert_eq!(EnumCellValue::from(3.0).to_display_text(), "3");
        assert_eq!(EnumCellValue::from(2.5).to_display_text(), "2.5");
    }

    #[test]
    fn audit_context_treats_blank_as_missing() {
        let ctx = SpecAuditContext {
            initials: Some("  ".to_string()),
            end_date: Some(" 5/1/2025 ".to_string()),
        };
        assert_eq!(ctx.initials_trimmed(), None);
        assert_eq!(ctx.end_date_trimmed(), Some("5/1/2025"));
    }

    #[test]
    fn error_classification() {
        assert!(ChecklistError::MissingInput.is_client_error());
        assert!(!ChecklistError::Decode("bad".to_string()).is_client_error());
        assert!(!ChecklistError::MissingHeaderRow("Sheet1".to_string()).is_client_error());
    }

    #[test]
    fn report_format_is_one_line() {
        let report = SpecChecklistReport {
            sheet_name: "Sheet1".to_string(),
            cols_removed: vec!["Author".to_string(), "Imprint".to_string()],
            col_audit_start: 7,
            n_rows_padded: 13,
            n_rows: 17,
            n_cols: 7,
            if_annotated: false,
            warnings: vec![],
        };
        assert_eq!(
            report.to_string(),
            "[CHECKLIST] sheet=\"Sheet1\" rows=17 cols=7 removed=2 padded=13 annotated=false warnings=0"
        );
    }
}
