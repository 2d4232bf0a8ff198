//! `inventory_formatter` v1:
//! Turns an uploaded inventory spreadsheet into a printable audit checklist.
//!
//! Modules:
//! - `conf`      : constants and default presets
//! - `spec`      : specs/models/options, report and errors
//! - `sheet`     : in-memory workbook model
//! - `util`      : pure helper functions
//! - `transform` : one structural edit per pipeline stage
//! - `pipeline`  : ordered stage runner and request entry points
//! - `reader`    : spreadsheet / Arrow IPC decoding
//! - `writer`    : pure-Rust xlsx writer kernel
pub mod conf;
pub mod pipeline;
pub mod reader;
pub mod sheet;
pub mod spec;
pub mod transform;
pub mod util;
pub mod writer;

pub use conf::{
    C_FILE_NAME_OUT, C_MIME_XLSX, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL, derive_default_checklist_options,
};
pub use pipeline::{Checklist, process_checklist_bytes, run_checklist_pipeline};
pub use reader::{read_workbook_from_bytes, read_workbook_from_ipc_bytes, read_workbook_from_path};
pub use sheet::{SpecCell, SpecHeaderIndex, SpecWorkbook, SpecWorkbookMeta, SpecWorksheet};
pub use spec::{
    ChecklistError, EnumCellValue, SpecAuditContext, SpecCellFormat, SpecChecklistOptions,
    SpecChecklistOutput, SpecChecklistReport, SpecChecklistRequest, SpecChecklistStyle,
    SpecColumnWidthPolicy, SpecPaddingPolicy, SpecPageSetup, SpecPruneConfig,
};
pub use util::{derive_prune_config, sanitize_sheet_name};
pub use writer::{ChecklistXlsxWriter, serialize_workbook};
