//! Ordered checklist pipeline.
//!
//! [`Checklist`] carries the processed worksheet through the stages as a
//! typestate: each stage consumes the checklist in one state and returns it in
//! the next, so stages cannot be skipped or reordered.
//!
//! ```text
//! Normalized -> Audited -> Padded -> Pruned -> Framed -> Styled -> Measured
//! ```

use std::marker::PhantomData;

use tracing::{error, info};

use crate::reader::read_workbook_from_bytes;
use crate::sheet::{SpecWorkbook, SpecWorkbookMeta, SpecWorksheet};
use crate::spec::{
    ChecklistError, SpecAuditContext, SpecChecklistOptions, SpecChecklistOutput,
    SpecChecklistReport, SpecChecklistRequest, SpecPruneConfig,
};
use crate::transform::{
    N_ROW_HEADER, SpecAuditColumns, apply_checklist_styles, derive_inventory_date,
    estimate_column_widths, inject_audit_columns, insert_header_block, normalize_workbook,
    pad_audit_rows, prune_columns, stamp_end_date_annotation,
};
use crate::util::{derive_prune_config, validate_checklist_options};
use crate::writer::serialize_workbook;

/// Pipeline stage markers.
pub mod stage {
    /// Metadata stamped, primary worksheet located.
    #[derive(Debug)]
    pub struct Normalized;
    /// Audit columns appended.
    #[derive(Debug)]
    pub struct Audited;
    /// Audit rows padded with the placeholder.
    #[derive(Debug)]
    pub struct Padded;
    /// Unwanted columns removed.
    #[derive(Debug)]
    pub struct Pruned;
    /// Header block inserted, annotation stamped.
    #[derive(Debug)]
    pub struct Framed;
    /// Fonts and borders applied, placeholders cleared.
    #[derive(Debug)]
    pub struct Styled;
    /// Column widths estimated; ready to serialize.
    #[derive(Debug)]
    pub struct Measured;
}

use stage::{Audited, Framed, Measured, Normalized, Padded, Pruned, Styled};

/// Workbook in the middle of checklist processing.
#[derive(Debug)]
pub struct Checklist<S> {
    meta: SpecWorkbookMeta,
    worksheet: SpecWorksheet,
    worksheets_other: Vec<SpecWorksheet>,
    options: SpecChecklistOptions,
    audit_ctx: SpecAuditContext,
    audit_cols: SpecAuditColumns,
    report: SpecChecklistReport,
    _stage: PhantomData<S>,
}

impl<S> Checklist<S> {
    /// The worksheet being processed.
    pub fn worksheet(&self) -> &SpecWorksheet {
        &self.worksheet
    }

    /// Report collected so far.
    pub fn report(&self) -> &SpecChecklistReport {
        &self.report
    }

    /// Options in effect.
    pub fn options(&self) -> &SpecChecklistOptions {
        &self.options
    }

    fn advance<T>(self) -> Checklist<T> {
        Checklist {
            meta: self.meta,
            worksheet: self.worksheet,
            worksheets_other: self.worksheets_other,
            options: self.options,
            audit_ctx: self.audit_ctx,
            audit_cols: self.audit_cols,
            report: self.report,
            _stage: PhantomData,
        }
    }
}

impl Checklist<Normalized> {
    /// Validate `options`, stamp workbook metadata and take the first sheet.
    pub fn normalize(
        mut workbook: SpecWorkbook,
        options: SpecChecklistOptions,
    ) -> Result<Self, ChecklistError> {
        validate_checklist_options(&options)?;
        normalize_workbook(&mut workbook, &options)?;

        let mut it_sheets = workbook.worksheets.into_iter();
        let worksheet = it_sheets.next().ok_or(ChecklistError::NoWorksheet)?;

        let report = SpecChecklistReport {
            sheet_name: worksheet.name.clone(),
            ..Default::default()
        };

        Ok(Self {
            meta: workbook.meta,
            worksheet,
            worksheets_other: it_sheets.collect(),
            options,
            audit_ctx: SpecAuditContext::default(),
            audit_cols: SpecAuditColumns::default(),
            report,
            _stage: PhantomData,
        })
    }

    /// Append the audit columns, filled from `audit_ctx`.
    pub fn inject_audit_columns(mut self, audit_ctx: SpecAuditContext) -> Checklist<Audited> {
        let inventory_date = derive_inventory_date(&self.meta);
        self.audit_cols =
            inject_audit_columns(&mut self.worksheet, &audit_ctx, &inventory_date, &self.options);
        self.audit_ctx = audit_ctx;
        self.report.col_audit_start = self.audit_cols.col_date;
        self.advance()
    }
}

impl Checklist<Audited> {
    /// Columns the audit fields were written to.
    pub fn audit_columns(&self) -> SpecAuditColumns {
        self.audit_cols
    }

    /// Pad the audit columns of the configured rows.
    pub fn pad_audit_rows(mut self) -> Checklist<Padded> {
        self.report.n_rows_padded = pad_audit_rows(
            &mut self.worksheet,
            self.audit_cols,
            &self.options.padding,
            &self.options.placeholder,
        );
        self.advance()
    }
}

impl Checklist<Padded> {
    /// Remove the columns named in `prune_config`.
    pub fn prune_columns(mut self, prune_config: &SpecPruneConfig) -> Checklist<Pruned> {
        let l_removed = prune_columns(&mut self.worksheet, prune_config, &mut self.report);
        self.report.cols_removed = l_removed;
        self.advance()
    }
}

impl Checklist<Pruned> {
    /// Insert the header block and stamp the end-date note when requested.
    pub fn insert_header_block(mut self) -> Checklist<Framed> {
        let n_rows_block = self.options.n_rows_header_block;
        insert_header_block(&mut self.worksheet, n_rows_block, &self.options.style);

        let row_header = N_ROW_HEADER + n_rows_block;
        let col_annotated = stamp_end_date_annotation(
            &mut self.worksheet,
            &self.audit_ctx,
            row_header,
            &self.options,
        );
        self.report.if_annotated = col_annotated.is_some();

        if col_annotated.is_none() && self.audit_ctx.end_date_trimmed().is_some() {
            let c_header = self.options.audit_headers.initials.clone();
            self.report.warn(format!(
                "End date given but header {c_header:?} is missing; annotation skipped."
            ));
        }
        self.advance()
    }
}

impl Checklist<Framed> {
    /// Apply fonts and borders, then clear placeholder values.
    pub fn apply_styles(mut self) -> Checklist<Styled> {
        apply_checklist_styles(
            &mut self.worksheet,
            &self.options.style,
            &self.options.placeholder,
        );
        self.advance()
    }
}

impl Checklist<Styled> {
    /// Size every column to its longest value.
    pub fn estimate_column_widths(mut self) -> Checklist<Measured> {
        estimate_column_widths(&mut self.worksheet, &self.options.width);
        self.advance()
    }
}

impl Checklist<Measured> {
    /// Reassemble the workbook, primary sheet first.
    pub fn finish(mut self) -> (SpecWorkbook, SpecChecklistReport) {
        self.report.n_rows = self.worksheet.n_rows();
        self.report.n_cols = self.worksheet.n_cols();

        let mut worksheets = Vec::with_capacity(1 + self.worksheets_other.len());
        worksheets.push(self.worksheet);
        worksheets.extend(self.worksheets_other);

        let workbook = SpecWorkbook {
            meta: self.meta,
            worksheets,
        };
        (workbook, self.report)
    }
}

/// Run every stage on `workbook` for one request.
pub fn run_checklist_pipeline(
    workbook: SpecWorkbook,
    request: &SpecChecklistRequest,
    options: SpecChecklistOptions,
) -> Result<(SpecWorkbook, SpecChecklistReport), ChecklistError> {
    let prune_config = derive_prune_config(request, &options.prune_baseline);

    let checklist = Checklist::normalize(workbook, options)?
        .inject_audit_columns(request.audit_context())
        .pad_audit_rows()
        .prune_columns(&prune_config)
        .insert_header_block()
        .apply_styles()
        .estimate_column_widths();

    Ok(checklist.finish())
}

/// Decode, transform and re-encode one uploaded workbook.
pub fn process_checklist_bytes(
    bytes: &[u8],
    request: &SpecChecklistRequest,
    options: SpecChecklistOptions,
) -> Result<(SpecChecklistOutput, SpecChecklistReport), ChecklistError> {
    let result = derive_checklist_output(bytes, request, options);
    match &result {
        Ok((_, report)) => info!("{report}"),
        Err(err) => error!("Error processing file: {err}"),
    }
    result
}

fn derive_checklist_output(
    bytes: &[u8],
    request: &SpecChecklistRequest,
    options: SpecChecklistOptions,
) -> Result<(SpecChecklistOutput, SpecChecklistReport), ChecklistError> {
    let file_name_out = options.file_name_out.clone();
    let workbook = read_workbook_from_bytes(bytes)?;
    let (workbook, report) = run_checklist_pipeline(workbook, request, options)?;
    let output = serialize_workbook(&workbook, &file_name_out)?;
    Ok((output, report))
}
